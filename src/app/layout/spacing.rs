use crate::model::{GraphNode, NodeKind};

/// What the spacing comparator knows about one node of an adjacent pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeDescriptor {
    pub parent: Option<usize>,
    pub variant: &'static str,
    pub is_class: bool,
    pub child_count: usize,
}

impl NodeDescriptor {
    pub fn of(node: &GraphNode, parent: Option<usize>, child_count: usize) -> Self {
        Self {
            parent,
            variant: node.kind.label(),
            is_class: matches!(node.kind, NodeKind::Class(_)),
            child_count,
        }
    }
}

/// Relative spacing between two horizontally adjacent nodes on the same level.
/// `1.0` is the tightest separation the tree layout uses.
pub trait SiblingSpacing {
    fn separation(&self, left: &NodeDescriptor, right: &NodeDescriptor) -> f32;
}

impl<F> SiblingSpacing for F
where
    F: Fn(&NodeDescriptor, &NodeDescriptor) -> f32,
{
    fn separation(&self, left: &NodeDescriptor, right: &NodeDescriptor) -> f32 {
        self(left, right)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct HeuristicSpacing;

impl HeuristicSpacing {
    const SAME_PARENT: f32 = 1.0;
    const OTHER_PARENT: f32 = 2.0;
    const CLASS_EXTRA: f32 = 0.6;
    const MIXED_VARIANT_EXTRA: f32 = 0.3;
    const BUSY_NODE_EXTRA: f32 = 0.5;
    const BUSY_CHILD_COUNT: usize = 3;
}

impl SiblingSpacing for HeuristicSpacing {
    fn separation(&self, left: &NodeDescriptor, right: &NodeDescriptor) -> f32 {
        let mut spacing = if left.parent == right.parent {
            Self::SAME_PARENT
        } else {
            Self::OTHER_PARENT
        };

        if left.is_class || right.is_class {
            spacing += Self::CLASS_EXTRA;
        }
        if left.variant != right.variant {
            spacing += Self::MIXED_VARIANT_EXTRA;
        }
        if left.child_count > Self::BUSY_CHILD_COUNT || right.child_count > Self::BUSY_CHILD_COUNT {
            spacing += Self::BUSY_NODE_EXTRA;
        }

        spacing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(parent: usize, variant: &'static str, child_count: usize) -> NodeDescriptor {
        NodeDescriptor {
            parent: Some(parent),
            variant,
            is_class: variant == "class",
            child_count,
        }
    }

    #[test]
    fn cousins_are_wider_than_siblings() {
        let spacing = HeuristicSpacing;
        let siblings = spacing.separation(&descriptor(0, "method", 0), &descriptor(0, "method", 0));
        let cousins = spacing.separation(&descriptor(0, "method", 0), &descriptor(1, "method", 0));
        assert_eq!(siblings, 1.0);
        assert_eq!(cousins, 2.0);
    }

    #[test]
    fn classes_mixed_variants_and_busy_nodes_widen() {
        let spacing = HeuristicSpacing;
        let value = spacing.separation(&descriptor(0, "class", 5), &descriptor(0, "method", 0));
        assert!((value - (1.0 + 0.6 + 0.3 + 0.5)).abs() < f32::EPSILON);
    }

    #[test]
    fn closures_plug_in_as_comparators() {
        let fixed = |_: &NodeDescriptor, _: &NodeDescriptor| 3.0_f32;
        assert_eq!(
            fixed.separation(&descriptor(0, "call", 0), &descriptor(1, "call", 0)),
            3.0
        );
    }
}
