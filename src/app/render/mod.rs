use std::collections::HashMap;

use eframe::egui::Vec2;
use tracing::{debug, info};

use crate::config::VizConfig;
use crate::model::{Analysis, EdgeKind, NodeKind, SourceRef};

use super::highlight::{HighlightSink, HighlightTarget, RetrievalPath, ViewKind};
use super::physics::Simulation;

mod build;
mod marks;
mod paint;
mod viewport;

pub(in crate::app) use marks::{EdgeMark, NodeMark};
pub(in crate::app) use paint::paint_view;
pub(in crate::app) use viewport::Viewport;

/// Identifies one requested render. Completion of a layout is reported with
/// the ticket it was requested under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayoutTicket(pub(in crate::app) u64);

pub(in crate::app) struct RenderNode {
    pub label: String,
    pub kind: NodeKind,
    pub source_ref: Option<SourceRef>,
    pub world_pos: Vec2,
    pub radius: f32,
    pub depth: usize,
    pub mark: NodeMark,
}

impl RenderNode {
    pub fn is_external(&self) -> bool {
        matches!(&self.kind, NodeKind::Call(meta) if meta.external)
    }
}

pub(in crate::app) struct RenderEdge {
    pub from: usize,
    pub to: usize,
    pub kind: EdgeKind,
    pub mark: EdgeMark,
}

/// One laid-out graph on screen. Rebuilt wholesale on every render.
pub(in crate::app) struct RenderedView {
    pub view: ViewKind,
    pub ticket: LayoutTicket,
    pub nodes: Vec<RenderNode>,
    pub edges: Vec<RenderEdge>,
    /// `node_id` to render indices. Diamond inheritance puts one id at several indices.
    pub index_by_id: HashMap<String, Vec<usize>>,
    pub index_by_name: HashMap<String, Vec<usize>>,
    pub size: Vec2,
    simulation: Option<Simulation>,
    draw_order: Vec<usize>,
    highlight_active: bool,
    path_active: bool,
}

impl RenderedView {
    pub fn simulation(&self) -> Option<&Simulation> {
        self.simulation.as_ref()
    }

    pub fn simulation_mut(&mut self) -> Option<&mut Simulation> {
        self.simulation.as_mut()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn draw_order(&self) -> &[usize] {
        &self.draw_order
    }

    pub fn highlighted_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| node.mark.tier.is_some() || node.mark.secondary)
            .count()
    }

    /// Advances the force layout one frame and copies positions back.
    fn tick(&mut self, delta_seconds: f32) -> bool {
        let Some(simulation) = self.simulation.as_mut() else {
            return false;
        };
        if !simulation.tick(delta_seconds) {
            return false;
        }
        for (node, body) in self.nodes.iter_mut().zip(simulation.bodies()) {
            node.world_pos = body.position;
        }
        true
    }
}

/// Owns the rendered view and everything needed to rebuild it.
pub(in crate::app) struct RenderAdapter {
    config: VizConfig,
    next_ticket: u64,
    pending: Option<(ViewKind, LayoutTicket)>,
    current: Option<RenderedView>,
}

impl RenderAdapter {
    pub fn new(config: VizConfig) -> Self {
        Self {
            config,
            next_ticket: 0,
            pending: None,
            current: None,
        }
    }

    pub fn view(&self) -> Option<&RenderedView> {
        self.current.as_ref()
    }

    pub fn view_mut(&mut self) -> Option<&mut RenderedView> {
        self.current.as_mut()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Queues a full relayout of `view`. A newer request supersedes an older one.
    pub fn request_render(&mut self, view: ViewKind) -> LayoutTicket {
        self.next_ticket += 1;
        let ticket = LayoutTicket(self.next_ticket);
        if let Some((_, superseded)) = self.pending.replace((view, ticket)) {
            debug!(?superseded, ?ticket, "render request superseded");
        }
        ticket
    }

    /// Builds the queued render, if any, and reports its ticket as completed.
    pub fn flush(&mut self, analysis: &Analysis) -> Option<LayoutTicket> {
        let (view, ticket) = self.pending.take()?;
        let rendered = build::build_view(view, ticket, analysis, &self.config);
        info!(
            view = view.label(),
            ?ticket,
            nodes = rendered.nodes.len(),
            edges = rendered.edges.len(),
            "layout completed"
        );
        self.current = Some(rendered);
        Some(ticket)
    }

    pub fn set_config(&mut self, config: VizConfig) {
        self.config = config;
        if let Some(simulation) = self
            .current
            .as_mut()
            .and_then(RenderedView::simulation_mut)
        {
            simulation.set_config(config.physics);
        }
    }

    pub fn tick(&mut self, delta_seconds: f32) -> bool {
        self.current
            .as_mut()
            .is_some_and(|view| view.tick(delta_seconds))
    }

    /// Marks a retrieval path on the call graph. Returns how many nodes it touched.
    pub fn apply_path(&mut self, path: &RetrievalPath) -> usize {
        match self.current.as_mut() {
            Some(view) if view.view == ViewKind::CallGraph => view.apply_path(path),
            _ => 0,
        }
    }

    pub fn clear_path(&mut self) {
        if let Some(view) = self.current.as_mut() {
            view.clear_path();
        }
    }

    fn reheat_if_settled(&mut self) {
        let highlight = self.config.highlight;
        if let Some(simulation) = self
            .current
            .as_mut()
            .and_then(RenderedView::simulation_mut)
            && simulation.nudge(highlight.settled_alpha, highlight.reheat_alpha)
        {
            debug!(alpha = highlight.reheat_alpha, "call graph reheated for highlight");
        }
    }
}

impl HighlightSink for RenderAdapter {
    fn active_view(&self) -> Option<ViewKind> {
        self.current.as_ref().map(|view| view.view)
    }

    fn apply_highlights(&mut self, targets: &[HighlightTarget]) -> usize {
        let Some(view) = self.current.as_mut() else {
            return 0;
        };
        let Some(kind) = view.view.highlight_kind() else {
            return 0;
        };

        let visible = targets
            .iter()
            .filter(|target| target.kind == kind)
            .collect::<Vec<_>>();
        let matched = view.apply_highlights(&visible);
        if matched > 0 && view.view == ViewKind::CallGraph {
            self.reheat_if_settled();
        }
        matched
    }

    fn clear_highlights(&mut self) {
        if let Some(view) = self.current.as_mut() {
            view.clear_highlights();
        }
    }
}
