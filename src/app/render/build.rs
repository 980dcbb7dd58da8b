use std::collections::HashMap;

use eframe::egui::{Vec2, vec2};

use crate::config::VizConfig;
use crate::model::{Analysis, CallGraph, EdgeKind, NodeKind, TreeNode};

use super::super::highlight::ViewKind;
use super::super::layout::{HeuristicSpacing, TreeLayoutEngine};
use super::super::physics::Simulation;
use super::{EdgeMark, LayoutTicket, NodeMark, RenderEdge, RenderNode, RenderedView};

fn tree_radius(kind: &NodeKind) -> f32 {
    match kind {
        NodeKind::Root => 13.0,
        NodeKind::Class(meta) => (11.0 + meta.method_count as f32 * 0.8).min(20.0),
        NodeKind::Method(_) | NodeKind::Function(_) => 8.0,
        NodeKind::Call(_) => 9.0,
        NodeKind::Syntax(_) => 6.5,
    }
}

fn call_radius(kind: &NodeKind) -> f32 {
    match kind {
        NodeKind::Call(meta) if meta.external => 7.0,
        NodeKind::Call(meta) => {
            let degree = (meta.calls.len() + meta.called_by.len()) as f32;
            (10.0 + degree.sqrt() * 2.5).min(24.0)
        }
        other => tree_radius(other),
    }
}

fn index_nodes(nodes: &[RenderNode]) -> (HashMap<String, Vec<usize>>, HashMap<String, Vec<usize>>) {
    let mut by_id: HashMap<String, Vec<usize>> = HashMap::new();
    let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();
    for (index, node) in nodes.iter().enumerate() {
        if let Some(source) = &node.source_ref {
            by_id.entry(source.node_id.clone()).or_default().push(index);
        }
        by_name.entry(node.label.clone()).or_default().push(index);
    }
    (by_id, by_name)
}

fn assemble(
    view: ViewKind,
    ticket: LayoutTicket,
    nodes: Vec<RenderNode>,
    edges: Vec<RenderEdge>,
    size: Vec2,
    simulation: Option<Simulation>,
) -> RenderedView {
    let (index_by_id, index_by_name) = index_nodes(&nodes);
    let draw_order = (0..nodes.len()).collect();
    RenderedView {
        view,
        ticket,
        nodes,
        edges,
        index_by_id,
        index_by_name,
        size,
        simulation,
        draw_order,
        highlight_active: false,
        path_active: false,
    }
}

fn tree_view(view: ViewKind, ticket: LayoutTicket, root: &TreeNode, config: &VizConfig) -> RenderedView {
    let layout = TreeLayoutEngine::new(HeuristicSpacing, config.tree).layout(root);

    let nodes = layout
        .nodes
        .iter()
        .map(|placed| RenderNode {
            label: placed.node.name.clone(),
            kind: placed.node.kind.clone(),
            source_ref: placed.node.source_ref.clone(),
            world_pos: placed.position,
            radius: tree_radius(&placed.node.kind),
            depth: placed.depth,
            mark: NodeMark::default(),
        })
        .collect::<Vec<_>>();

    let edges = layout
        .nodes
        .iter()
        .enumerate()
        .filter_map(|(index, placed)| {
            let parent = placed.parent?;
            let kind = if layout.nodes[parent].node.is_class() && placed.node.is_class() {
                EdgeKind::Inheritance
            } else {
                EdgeKind::Contains
            };
            Some(RenderEdge {
                from: parent,
                to: index,
                kind,
                mark: EdgeMark::default(),
            })
        })
        .collect();

    assemble(view, ticket, nodes, edges, layout.size, None)
}

fn call_graph_view(ticket: LayoutTicket, graph: &CallGraph, config: &VizConfig) -> RenderedView {
    let names = graph
        .nodes
        .iter()
        .map(|node| node.name.as_str())
        .collect::<Vec<_>>();
    let radii = graph
        .nodes
        .iter()
        .map(|node| call_radius(&node.kind))
        .collect::<Vec<_>>();
    let edges = graph
        .edges
        .iter()
        .filter_map(|edge| {
            Some(RenderEdge {
                from: graph.index_of(&edge.from)?,
                to: graph.index_of(&edge.to)?,
                kind: edge.kind,
                mark: EdgeMark::default(),
            })
        })
        .collect::<Vec<_>>();
    let links = edges.iter().map(|edge| (edge.from, edge.to)).collect();

    let simulation = Simulation::new(&names, &radii, links, config.physics);
    let nodes = graph
        .nodes
        .iter()
        .zip(&radii)
        .enumerate()
        .map(|(index, (node, &radius))| RenderNode {
            label: node.name.clone(),
            kind: node.kind.clone(),
            source_ref: node.source_ref.clone(),
            world_pos: simulation.position(index).unwrap_or(Vec2::ZERO),
            radius,
            depth: 0,
            mark: NodeMark::default(),
        })
        .collect();

    let size = vec2(config.tree.min_width, config.tree.min_height);
    assemble(ViewKind::CallGraph, ticket, nodes, edges, size, Some(simulation))
}

/// Lays out one view from scratch. Missing data gives an empty view.
pub(super) fn build_view(
    view: ViewKind,
    ticket: LayoutTicket,
    analysis: &Analysis,
    config: &VizConfig,
) -> RenderedView {
    let empty = || {
        assemble(
            view,
            ticket,
            Vec::new(),
            Vec::new(),
            vec2(config.tree.min_width, config.tree.min_height),
            None,
        )
    };

    match view {
        ViewKind::Ast => analysis
            .ast
            .as_ref()
            .map_or_else(empty, |root| tree_view(view, ticket, root, config)),
        ViewKind::Inheritance => analysis
            .hierarchy
            .as_ref()
            .map_or_else(empty, |root| tree_view(view, ticket, root, config)),
        ViewKind::CallGraph => analysis
            .call_graph
            .as_ref()
            .filter(|graph| !graph.is_empty())
            .map_or_else(empty, |graph| call_graph_view(ticket, graph, config)),
    }
}
