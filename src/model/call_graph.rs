use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::graph::{CallMeta, EdgeKind, GraphEdge, GraphNode, NodeKind};
use super::input::CallGraphInput;

#[derive(Clone, Debug, Default)]
pub struct CallGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    index_by_name: HashMap<String, usize>,
}

impl CallGraph {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, name: &str) -> Option<&GraphNode> {
        self.index_by_name.get(name).map(|&index| &self.nodes[index])
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index_by_name.get(name).copied()
    }

    fn meta(&self, name: &str) -> Option<&CallMeta> {
        match &self.node(name)?.kind {
            NodeKind::Call(meta) => Some(meta),
            _ => None,
        }
    }

    pub fn calls(&self, name: &str) -> &[String] {
        self.meta(name).map(|meta| meta.calls.as_slice()).unwrap_or(&[])
    }

    pub fn called_by(&self, name: &str) -> &[String] {
        self.meta(name)
            .map(|meta| meta.called_by.as_slice())
            .unwrap_or(&[])
    }
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|existing| existing == value) {
        list.push(value.to_owned());
    }
}

/// Rebuilds the whole call graph. `called_by` is the inversion of every node's
/// `calls` list and is never patched incrementally.
pub fn build_call_graph(input: &CallGraphInput) -> CallGraph {
    let mut nodes = Vec::with_capacity(input.functions.len());
    let mut index_by_name = HashMap::with_capacity(input.functions.len());

    for function in &input.functions {
        if index_by_name.contains_key(&function.name) {
            continue;
        }

        let mut calls = Vec::new();
        for callee in &function.calls {
            push_unique(&mut calls, callee);
        }

        index_by_name.insert(function.name.clone(), nodes.len());
        nodes.push(GraphNode {
            name: function.name.clone(),
            source_ref: function.source_ref.clone(),
            kind: NodeKind::Call(CallMeta {
                param_count: function.params.len(),
                calls,
                called_by: Vec::new(),
                external: false,
            }),
        });
    }

    for call in &input.calls {
        let Some(&caller) = index_by_name.get(&call.caller) else {
            continue;
        };
        if let NodeKind::Call(meta) = &mut nodes[caller].kind {
            push_unique(&mut meta.calls, &call.callee);
        }
    }

    let known = index_by_name.keys().cloned().collect::<HashSet<_>>();
    let mut edges = Vec::new();
    let mut external = Vec::new();
    let mut inverted: HashMap<String, Vec<String>> = HashMap::new();

    for node in &nodes {
        let NodeKind::Call(meta) = &node.kind else {
            continue;
        };

        for callee in &meta.calls {
            push_unique(inverted.entry(callee.clone()).or_default(), &node.name);
            if known.contains(callee) {
                edges.push(GraphEdge {
                    from: node.name.clone(),
                    to: callee.clone(),
                    kind: EdgeKind::Call,
                });
            } else {
                push_unique(&mut external, callee);
            }
        }
    }

    for name in external {
        index_by_name.insert(name.clone(), nodes.len());
        nodes.push(GraphNode {
            name,
            source_ref: None,
            kind: NodeKind::Call(CallMeta {
                external: true,
                ..CallMeta::default()
            }),
        });
    }

    for node in &mut nodes {
        if let NodeKind::Call(meta) = &mut node.kind
            && let Some(callers) = inverted.remove(&node.name)
        {
            meta.called_by = callers;
        }
    }

    debug!(
        nodes = nodes.len(),
        edges = edges.len(),
        "built call graph"
    );

    CallGraph {
        nodes,
        edges,
        index_by_name,
    }
}
