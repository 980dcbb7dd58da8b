mod coordinator;
mod mapper;
mod paths;

pub(in crate::app) use coordinator::{Coordinator, HighlightSink, Phase};
pub(in crate::app) use paths::{PathRole, RetrievalPath, mark_path};

/// Which graph the central panel is showing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ViewKind {
    Ast,
    #[default]
    Inheritance,
    CallGraph,
}

impl ViewKind {
    pub const ALL: [Self; 3] = [Self::Ast, Self::Inheritance, Self::CallGraph];

    pub fn label(self) -> &'static str {
        match self {
            Self::Ast => "AST",
            Self::Inheritance => "Inheritance",
            Self::CallGraph => "Call graph",
        }
    }

    /// Views that can carry search highlights. The AST view never does.
    pub fn highlight_kind(self) -> Option<VisualizationKind> {
        match self {
            Self::Ast => None,
            Self::Inheritance => Some(VisualizationKind::Inheritance),
            Self::CallGraph => Some(VisualizationKind::CallGraph),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VisualizationKind {
    Inheritance,
    CallGraph,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HighlightStyle {
    Secondary,
    Hierarchical,
    Direct,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LineAnchor {
    pub line: u32,
    pub node_type: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct HighlightTarget {
    pub node_id: String,
    pub kind: VisualizationKind,
    pub style: HighlightStyle,
    /// Line and type of the originating result, for the render-side fallback.
    pub anchor: Option<LineAnchor>,
}

impl HighlightTarget {
    pub fn restyled(&self, style: HighlightStyle) -> Self {
        Self {
            style,
            ..self.clone()
        }
    }
}
