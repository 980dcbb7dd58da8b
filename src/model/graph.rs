use super::source_ref::SourceRef;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    Inheritance,
    Contains,
    Call,
}

/// Edges are derived from the node set and never stored on their own.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClassMeta {
    pub bases: Vec<String>,
    pub method_count: usize,
    pub attribute_count: usize,
    pub docstring: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MethodMeta {
    pub class_name: String,
    pub param_count: usize,
    pub docstring: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FunctionMeta {
    pub param_count: usize,
    pub docstring: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CallMeta {
    pub param_count: usize,
    pub calls: Vec<String>,
    pub called_by: Vec<String>,
    /// Callee referenced by some function but never defined in the analyzed scope.
    pub external: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SyntaxMeta {
    pub node_type: String,
    pub value: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Root,
    Class(ClassMeta),
    Method(MethodMeta),
    Function(FunctionMeta),
    Call(CallMeta),
    Syntax(SyntaxMeta),
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Class(_) => "class",
            Self::Method(_) => "method",
            Self::Function(_) => "function",
            Self::Call(_) => "call",
            Self::Syntax(_) => "syntax",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
    pub name: String,
    pub source_ref: Option<SourceRef>,
    pub kind: NodeKind,
}

impl GraphNode {
    pub fn root(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            source_ref: None,
            kind: NodeKind::Root,
        }
    }

    pub fn node_id(&self) -> Option<&str> {
        self.source_ref.as_ref().map(|source| source.node_id.as_str())
    }

    pub fn is_class(&self) -> bool {
        matches!(self.kind, NodeKind::Class(_))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TreeNode {
    pub node: GraphNode,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn leaf(node: GraphNode) -> Self {
        Self {
            node,
            children: Vec::new(),
        }
    }

    pub fn count(&self) -> usize {
        let mut total = 0usize;
        let mut stack = vec![self];
        while let Some(current) = stack.pop() {
            total += 1;
            stack.extend(current.children.iter());
        }
        total
    }

    #[cfg(test)]
    pub fn find_child(&self, name: &str) -> Option<&TreeNode> {
        self.children.iter().find(|child| child.node.name == name)
    }
}
