use eframe::egui::{Vec2, vec2};
use tracing::debug;

use crate::config::TreeConfig;
use crate::model::{GraphNode, TreeNode};

use super::spacing::{NodeDescriptor, SiblingSpacing};

const CANVAS_MARGIN: f32 = 48.0;

pub struct PlacedNode<'a> {
    pub node: &'a GraphNode,
    pub parent: Option<usize>,
    pub depth: usize,
    pub child_count: usize,
    pub position: Vec2,
}

pub struct TreeLayout<'a> {
    /// Preorder; a node's parent always precedes it.
    pub nodes: Vec<PlacedNode<'a>>,
    pub size: Vec2,
}

struct WalkNode {
    parent: usize,
    children: Vec<usize>,
    number: usize,
    prelim: f32,
    modifier: f32,
    change: f32,
    shift: f32,
    thread: Option<usize>,
    ancestor: usize,
    default_ancestor: Option<usize>,
}

/// Tidy layered tree layout with a pluggable sibling separation.
pub struct TreeLayoutEngine<S> {
    spacing: S,
    config: TreeConfig,
}

impl<S: SiblingSpacing> TreeLayoutEngine<S> {
    pub fn new(spacing: S, config: TreeConfig) -> Self {
        Self { spacing, config }
    }

    pub fn layout<'a>(&self, root: &'a TreeNode) -> TreeLayout<'a> {
        let mut placed = Vec::new();
        let mut stack = vec![(root, None, 0usize)];
        let mut children_of: Vec<Vec<usize>> = Vec::new();
        while let Some((tree, parent, depth)) = stack.pop() {
            let index = placed.len();
            placed.push(PlacedNode {
                node: &tree.node,
                parent,
                depth,
                child_count: tree.children.len(),
                position: Vec2::ZERO,
            });
            children_of.push(Vec::with_capacity(tree.children.len()));
            if let Some(parent) = parent {
                children_of[parent].push(index);
            }
            for child in tree.children.iter().rev() {
                stack.push((child, Some(index), depth + 1));
            }
        }

        let descriptors = placed
            .iter()
            .map(|entry| NodeDescriptor::of(entry.node, entry.parent, entry.child_count))
            .collect::<Vec<_>>();

        let offsets = self.walk(&descriptors, &children_of);
        let size = self.place(&mut placed, &offsets);
        debug!(
            nodes = placed.len(),
            width = size.x,
            height = size.y,
            "tree layout finished"
        );

        TreeLayout {
            nodes: placed,
            size,
        }
    }

    fn separation(&self, descriptors: &[NodeDescriptor], left: usize, right: usize) -> f32 {
        self.spacing
            .separation(&descriptors[left], &descriptors[right])
            .max(0.1)
    }

    /// Returns horizontal offsets in separation units.
    fn walk(&self, descriptors: &[NodeDescriptor], children_of: &[Vec<usize>]) -> Vec<f32> {
        let count = children_of.len();
        let virtual_root = count;
        let mut nodes = (0..=count)
            .map(|index| WalkNode {
                parent: virtual_root,
                children: Vec::new(),
                number: 0,
                prelim: 0.0,
                modifier: 0.0,
                change: 0.0,
                shift: 0.0,
                thread: None,
                ancestor: index,
                default_ancestor: None,
            })
            .collect::<Vec<_>>();

        for (parent, children) in children_of.iter().enumerate() {
            for (number, &child) in children.iter().enumerate() {
                nodes[child].parent = parent;
                nodes[child].number = number;
            }
            nodes[parent].children = children.clone();
        }
        if count > 0 {
            nodes[virtual_root].children = vec![0];
        }

        // Reverse of a right-to-left preorder is a left-to-right postorder.
        let mut order = Vec::with_capacity(count);
        let mut stack = if count > 0 { vec![0usize] } else { Vec::new() };
        while let Some(index) = stack.pop() {
            order.push(index);
            stack.extend(nodes[index].children.iter().copied());
        }
        order.reverse();

        for &index in &order {
            self.first_walk(&mut nodes, descriptors, index);
        }

        let mut offsets = vec![0.0; count];
        if count == 0 {
            return offsets;
        }

        nodes[virtual_root].modifier = -nodes[0].prelim;
        for index in 0..count {
            // Preorder indices: the parent is always finalized first.
            let parent = nodes[index].parent;
            let parent_modifier = nodes[parent].modifier;
            offsets[index] = nodes[index].prelim + parent_modifier;
            nodes[index].modifier += parent_modifier;
        }

        offsets
    }

    fn first_walk(&self, nodes: &mut [WalkNode], descriptors: &[NodeDescriptor], v: usize) {
        let parent = nodes[v].parent;
        let number = nodes[v].number;
        let left_sibling = (number > 0).then(|| nodes[parent].children[number - 1]);

        let bounds = nodes[v]
            .children
            .first()
            .copied()
            .zip(nodes[v].children.last().copied());
        if let Some((first, last)) = bounds {
            execute_shifts(nodes, v);
            let midpoint = (nodes[first].prelim + nodes[last].prelim) / 2.0;
            if let Some(w) = left_sibling {
                nodes[v].prelim = nodes[w].prelim + self.separation(descriptors, w, v);
                nodes[v].modifier = nodes[v].prelim - midpoint;
            } else {
                nodes[v].prelim = midpoint;
            }
        } else if let Some(w) = left_sibling {
            nodes[v].prelim = nodes[w].prelim + self.separation(descriptors, w, v);
        }

        let fallback = nodes[parent].children.first().copied().unwrap_or(v);
        let default_ancestor = nodes[parent].default_ancestor.unwrap_or(fallback);
        let next = self.apportion(nodes, descriptors, v, left_sibling, default_ancestor);
        nodes[parent].default_ancestor = Some(next);
    }

    fn apportion(
        &self,
        nodes: &mut [WalkNode],
        descriptors: &[NodeDescriptor],
        v: usize,
        left_sibling: Option<usize>,
        mut ancestor: usize,
    ) -> usize {
        let Some(w) = left_sibling else {
            return ancestor;
        };

        let parent = nodes[v].parent;
        let mut inner_right = v;
        let mut outer_right = v;
        let mut inner_left = w;
        let mut outer_left = nodes[parent].children[0];
        let mut sum_inner_right = nodes[inner_right].modifier;
        let mut sum_outer_right = nodes[outer_right].modifier;
        let mut sum_inner_left = nodes[inner_left].modifier;
        let mut sum_outer_left = nodes[outer_left].modifier;

        let (pending_left, pending_right) = loop {
            let next_inner_left = next_right(nodes, inner_left);
            let next_inner_right = next_left(nodes, inner_right);
            let (Some(left), Some(right)) = (next_inner_left, next_inner_right) else {
                break (next_inner_left, next_inner_right);
            };
            let (Some(outer_l), Some(outer_r)) =
                (next_left(nodes, outer_left), next_right(nodes, outer_right))
            else {
                break (None, None);
            };

            inner_left = left;
            inner_right = right;
            outer_left = outer_l;
            outer_right = outer_r;
            nodes[outer_right].ancestor = v;

            let shift = nodes[inner_left].prelim + sum_inner_left
                - nodes[inner_right].prelim
                - sum_inner_right
                + self.separation(descriptors, inner_left, inner_right);
            if shift > 0.0 {
                let from = next_ancestor(nodes, inner_left, v, ancestor);
                move_subtree(nodes, from, v, shift);
                sum_inner_right += shift;
                sum_outer_right += shift;
            }

            sum_inner_left += nodes[inner_left].modifier;
            sum_inner_right += nodes[inner_right].modifier;
            sum_outer_left += nodes[outer_left].modifier;
            sum_outer_right += nodes[outer_right].modifier;
        };

        if let Some(left) = pending_left
            && next_right(nodes, outer_right).is_none()
        {
            nodes[outer_right].thread = Some(left);
            nodes[outer_right].modifier += sum_inner_left - sum_outer_right;
        }

        if let Some(right) = pending_right
            && next_left(nodes, outer_left).is_none()
        {
            nodes[outer_left].thread = Some(right);
            nodes[outer_left].modifier += sum_inner_right - sum_outer_left;
            ancestor = v;
        }

        ancestor
    }

    fn place(&self, placed: &mut [PlacedNode<'_>], offsets: &[f32]) -> Vec2 {
        let min_x = offsets.iter().copied().fold(f32::INFINITY, f32::min);
        let max_x = offsets.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let max_depth = placed.iter().map(|entry| entry.depth).max().unwrap_or(0);
        let leaf_count = placed.iter().filter(|entry| entry.child_count == 0).count();

        let extent = if min_x.is_finite() && max_x.is_finite() {
            max_x - min_x
        } else {
            0.0
        };
        let per_node = self.config.per_node_px.max(4.0);
        let width = self
            .config
            .min_width
            .max(extent * per_node + CANVAS_MARGIN * 2.0)
            .max(leaf_count as f32 * per_node);
        let height = self
            .config
            .min_height
            .max((max_depth as f32 + 1.0) * self.config.level_height + CANVAS_MARGIN * 2.0);

        let usable = width - CANVAS_MARGIN * 2.0;
        for (entry, &offset) in placed.iter_mut().zip(offsets) {
            let x = if extent > f32::EPSILON {
                ((offset - min_x) / extent) * usable - usable / 2.0
            } else {
                0.0
            };
            let y = -height / 2.0 + CANVAS_MARGIN + entry.depth as f32 * self.config.level_height;
            entry.position = vec2(x, y);
        }

        vec2(width, height)
    }
}

fn next_left(nodes: &[WalkNode], v: usize) -> Option<usize> {
    nodes[v].children.first().copied().or(nodes[v].thread)
}

fn next_right(nodes: &[WalkNode], v: usize) -> Option<usize> {
    nodes[v].children.last().copied().or(nodes[v].thread)
}

fn move_subtree(nodes: &mut [WalkNode], from: usize, to: usize, shift: f32) {
    let distance = nodes[to].number.saturating_sub(nodes[from].number).max(1) as f32;
    let change = shift / distance;
    nodes[to].change -= change;
    nodes[to].shift += shift;
    nodes[from].change += change;
    nodes[to].prelim += shift;
    nodes[to].modifier += shift;
}

fn execute_shifts(nodes: &mut [WalkNode], v: usize) {
    let mut shift = 0.0;
    let mut change = 0.0;
    let children = nodes[v].children.clone();
    for &child in children.iter().rev() {
        nodes[child].prelim += shift;
        nodes[child].modifier += shift;
        change += nodes[child].change;
        shift += nodes[child].shift + change;
    }
}

fn next_ancestor(nodes: &[WalkNode], inner_left: usize, v: usize, ancestor: usize) -> usize {
    let candidate = nodes[inner_left].ancestor;
    if nodes[candidate].parent == nodes[v].parent {
        candidate
    } else {
        ancestor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::layout::spacing::HeuristicSpacing;
    use crate::model::{ClassMeta, GraphNode, MethodMeta, NodeKind};

    fn named(name: &str, kind: NodeKind) -> GraphNode {
        GraphNode {
            name: name.to_owned(),
            source_ref: None,
            kind,
        }
    }

    fn class(name: &str, children: Vec<TreeNode>) -> TreeNode {
        TreeNode {
            node: named(name, NodeKind::Class(ClassMeta::default())),
            children,
        }
    }

    fn method(name: &str) -> TreeNode {
        TreeNode::leaf(named(name, NodeKind::Method(MethodMeta::default())))
    }

    fn engine() -> TreeLayoutEngine<HeuristicSpacing> {
        TreeLayoutEngine::new(HeuristicSpacing, TreeConfig::default())
    }

    #[test]
    fn parents_sit_above_and_centered_over_children() {
        let tree = class("Animal", vec![method("a"), method("b"), method("c")]);
        let layout = engine().layout(&tree);

        assert_eq!(layout.nodes.len(), 4);
        let root = &layout.nodes[0];
        let children = &layout.nodes[1..];
        assert!(children.iter().all(|child| child.position.y > root.position.y));

        let first = children.first().unwrap().position.x;
        let last = children.last().unwrap().position.x;
        assert!((root.position.x - (first + last) / 2.0).abs() < 0.01);
        assert!(children.windows(2).all(|pair| pair[0].position.x < pair[1].position.x));
    }

    #[test]
    fn subtrees_never_overlap_on_a_level() {
        let tree = TreeNode {
            node: GraphNode::root("root"),
            children: vec![
                class("A", vec![method("a1"), method("a2"), method("a3"), method("a4")]),
                class("B", vec![]),
                class("C", vec![method("c1"), class("D", vec![method("d1"), method("d2")])]),
            ],
        };
        let layout = engine().layout(&tree);

        let max_depth = layout.nodes.iter().map(|node| node.depth).max().unwrap();
        for depth in 0..=max_depth {
            let mut xs = layout
                .nodes
                .iter()
                .filter(|node| node.depth == depth)
                .map(|node| node.position.x)
                .collect::<Vec<_>>();
            xs.sort_by(f32::total_cmp);
            assert!(xs.windows(2).all(|pair| pair[1] - pair[0] > 1.0));
        }
    }

    #[test]
    fn wider_comparator_widens_the_canvas() {
        let tree = class("Wide", (0..40).map(|i| method(&format!("m{i}"))).collect());
        let narrow = engine().layout(&tree).size.x;
        let wide = TreeLayoutEngine::new(
            |_: &NodeDescriptor, _: &NodeDescriptor| 4.0_f32,
            TreeConfig::default(),
        )
        .layout(&tree)
        .size
        .x;
        assert!(wide > narrow);
    }

    #[test]
    fn canvas_grows_with_node_count() {
        let small = class("S", (0..3).map(|i| method(&format!("m{i}"))).collect());
        let large = class("L", (0..200).map(|i| method(&format!("m{i}"))).collect());
        let config = TreeConfig::default();
        let small_size = engine().layout(&small).size;
        let large_size = engine().layout(&large).size;
        assert_eq!(small_size.x, config.min_width);
        assert!(large_size.x >= 200.0 * config.per_node_px);
    }

    #[test]
    fn single_node_is_centered() {
        let tree = TreeNode::leaf(GraphNode::root("only"));
        let layout = engine().layout(&tree);
        assert_eq!(layout.nodes[0].position.x, 0.0);
    }
}
