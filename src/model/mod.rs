mod analysis;
mod ast;
mod call_graph;
mod error;
mod graph;
mod inheritance;
mod input;
mod source_ref;

pub use analysis::Analysis;
pub use ast::build_ast_tree;
pub use call_graph::{CallGraph, build_call_graph};
pub use error::{ModelError, Result};
pub use graph::{
    CallMeta, ClassMeta, EdgeKind, FunctionMeta, GraphEdge, GraphNode, MethodMeta, NodeKind,
    SyntaxMeta, TreeNode,
};
pub use inheritance::build_hierarchy;
pub use input::{
    CallGraphInput, CallInput, ClassInput, FunctionInput, InheritanceInput, MethodInput,
    PathEdgeInput, RetrievalPathInput, SearchResponse, SearchResult, VisualizationData,
    parse_ast_document, parse_call_graph, parse_inheritance, parse_search_response,
};
pub use source_ref::SourceRef;
