use tracing::debug;

use super::super::highlight::{HighlightStyle, HighlightTarget, PathRole, RetrievalPath, mark_path};
use super::RenderedView;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NodeMark {
    /// Strongest persistent style that landed on this node.
    pub tier: Option<HighlightStyle>,
    pub secondary: bool,
    pub path_role: Option<PathRole>,
    pub dimmed: bool,
}

impl NodeMark {
    pub fn is_raised(&self) -> bool {
        self.tier.is_some() || self.secondary || self.path_role.is_some()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EdgeMark {
    pub emphasized: bool,
    pub on_path: bool,
    pub dimmed: bool,
}

impl RenderedView {
    /// Nodes a target lands on: the id index first, then any node sharing the
    /// target's line and node type.
    fn resolve(&self, target: &HighlightTarget) -> Vec<usize> {
        if let Some(indices) = self.index_by_id.get(&target.node_id) {
            return indices.clone();
        }
        let Some(anchor) = &target.anchor else {
            return Vec::new();
        };

        let fallback = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| {
                node.source_ref.as_ref().is_some_and(|source| {
                    source.line == anchor.line && source.node_type == anchor.node_type
                })
            })
            .map(|(index, _)| index)
            .collect::<Vec<_>>();
        if !fallback.is_empty() {
            debug!(
                node_id = target.node_id.as_str(),
                line = anchor.line,
                hits = fallback.len(),
                "highlight resolved by line fallback"
            );
        }
        fallback
    }

    /// Resets every highlight mark, then marks `targets`. Returns the number of
    /// distinct nodes that matched.
    pub(in crate::app) fn apply_highlights(&mut self, targets: &[&HighlightTarget]) -> usize {
        self.reset_highlight_marks();

        for target in targets {
            for index in self.resolve(target) {
                let mark = &mut self.nodes[index].mark;
                if target.style == HighlightStyle::Secondary {
                    mark.secondary = true;
                } else {
                    mark.tier = mark.tier.max(Some(target.style));
                }
            }
        }

        let matched = self.highlighted_count();
        self.highlight_active = matched > 0;
        self.refresh();
        matched
    }

    pub(in crate::app) fn clear_highlights(&mut self) {
        self.reset_highlight_marks();
        self.highlight_active = false;
        self.refresh();
    }

    pub(in crate::app) fn apply_path(&mut self, path: &RetrievalPath) -> usize {
        self.reset_path_marks();

        let pairs = self
            .edges
            .iter()
            .map(|edge| (edge.from, edge.to))
            .collect::<Vec<_>>();
        let marks = mark_path(path, &self.index_by_name, &pairs, self.nodes.len());
        for (&index, &role) in &marks.roles {
            self.nodes[index].mark.path_role = Some(role);
        }
        for &index in &marks.edges {
            self.edges[index].mark.on_path = true;
        }

        self.path_active = !marks.roles.is_empty();
        self.refresh();
        marks.roles.len()
    }

    pub(in crate::app) fn clear_path(&mut self) {
        self.reset_path_marks();
        self.path_active = false;
        self.refresh();
    }

    fn reset_highlight_marks(&mut self) {
        for node in &mut self.nodes {
            node.mark.tier = None;
            node.mark.secondary = false;
        }
    }

    fn reset_path_marks(&mut self) {
        for node in &mut self.nodes {
            node.mark.path_role = None;
        }
        for edge in &mut self.edges {
            edge.mark.on_path = false;
        }
    }

    /// Derives dimming, edge emphasis and paint order from the raw marks.
    fn refresh(&mut self) {
        let focus = self.highlight_active || self.path_active;
        for node in &mut self.nodes {
            node.mark.dimmed = focus && !node.mark.is_raised();
        }
        for edge in &mut self.edges {
            // Any highlight emphasizes every edge, not only those touching a match.
            edge.mark.emphasized = self.highlight_active;
            edge.mark.dimmed = focus && !edge.mark.emphasized && !edge.mark.on_path;
        }

        let nodes = &self.nodes;
        self.draw_order.clear();
        self.draw_order.extend(0..nodes.len());
        self.draw_order
            .sort_by_key(|&index| (nodes[index].mark.is_raised(), nodes[index].mark.tier));
    }
}
