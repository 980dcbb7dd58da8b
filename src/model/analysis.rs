use serde_json::Value;
use tracing::info;

use super::ast::build_ast_tree;
use super::call_graph::{CallGraph, build_call_graph};
use super::graph::TreeNode;
use super::inheritance::build_hierarchy;
use super::input::VisualizationData;

/// Everything one analysis run produced, built into renderable graphs.
///
/// Rebuilt wholesale whenever new analyzer output is loaded.
#[derive(Clone, Debug, Default)]
pub struct Analysis {
    pub ast: Option<TreeNode>,
    pub hierarchy: Option<TreeNode>,
    pub call_graph: Option<CallGraph>,
    /// Raw inputs, kept for matching search results.
    pub visualization: VisualizationData,
}

impl Analysis {
    pub fn build(ast: Option<&Value>, visualization: VisualizationData) -> Self {
        let ast = ast.map(build_ast_tree);
        let hierarchy = visualization.inheritance.as_ref().map(build_hierarchy);
        let call_graph = visualization.call_graph.as_ref().map(build_call_graph);

        info!(
            ast_nodes = ast.as_ref().map_or(0, TreeNode::count),
            hierarchy_nodes = hierarchy.as_ref().map_or(0, TreeNode::count),
            call_graph_nodes = call_graph.as_ref().map_or(0, CallGraph::node_count),
            "analysis built"
        );

        Self {
            ast,
            hierarchy,
            call_graph,
            visualization,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ast.is_none() && self.hierarchy.is_none() && self.call_graph.is_none()
    }
}
