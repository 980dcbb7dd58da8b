use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use super::graph::{ClassMeta, FunctionMeta, GraphNode, MethodMeta, NodeKind, TreeNode};
use super::input::{ClassInput, FunctionInput, InheritanceInput};

pub const ROOT_NAME: &str = "Classes";

/// Upper bound on class and method nodes. Repeated diamonds duplicate whole
/// subtrees, so ladders of them grow exponentially.
pub const MAX_HIERARCHY_NODES: usize = 20_000;

fn class_node(class: &ClassInput) -> GraphNode {
    GraphNode {
        name: class.name.clone(),
        source_ref: class.source_ref.clone(),
        kind: NodeKind::Class(ClassMeta {
            bases: class.bases.clone(),
            method_count: class.methods.len(),
            attribute_count: class.attributes.len(),
            docstring: class.docstring.clone(),
        }),
    }
}

fn function_node(function: &FunctionInput) -> GraphNode {
    GraphNode {
        name: function.name.clone(),
        source_ref: function.source_ref.clone(),
        kind: NodeKind::Function(FunctionMeta {
            param_count: function.params.len(),
            docstring: function.docstring.clone(),
        }),
    }
}

fn with_methods(class: &ClassInput) -> TreeNode {
    let mut node = TreeNode::leaf(class_node(class));
    node.children.extend(class.methods.iter().map(|method| {
        TreeNode::leaf(GraphNode {
            name: method.name.clone(),
            source_ref: method.source_ref.clone(),
            kind: NodeKind::Method(MethodMeta {
                class_name: class.name.clone(),
                param_count: method.params.len(),
                docstring: method.docstring.clone(),
            }),
        })
    }));
    node
}

struct HierarchyBuilder<'a> {
    classes: &'a [ClassInput],
    subclasses: HashMap<&'a str, Vec<usize>>,
    emitted: usize,
    cycle_skips: usize,
    budget_skips: usize,
}

impl<'a> HierarchyBuilder<'a> {
    fn new(classes: &'a [ClassInput]) -> Self {
        let mut subclasses: HashMap<&str, Vec<usize>> = HashMap::new();
        for (index, class) in classes.iter().enumerate() {
            for base in &class.bases {
                let entry = subclasses.entry(base.as_str()).or_default();
                if !entry.contains(&index) {
                    entry.push(index);
                }
            }
        }

        Self {
            classes,
            subclasses,
            emitted: 0,
            cycle_skips: 0,
            budget_skips: 0,
        }
    }

    fn build(&mut self, index: usize, ancestors: &mut Vec<usize>) -> TreeNode {
        let classes = self.classes;
        let class = &classes[index];
        let mut node = with_methods(class);
        self.emitted += 1 + class.methods.len();

        ancestors.push(index);
        let children = self
            .subclasses
            .get(class.name.as_str())
            .cloned()
            .unwrap_or_default();
        for child in children {
            if ancestors.contains(&child) {
                self.cycle_skips += 1;
                continue;
            }
            if self.emitted >= MAX_HIERARCHY_NODES {
                self.budget_skips += 1;
                continue;
            }
            let subtree = self.build(child, ancestors);
            node.children.push(subtree);
        }
        ancestors.pop();

        node
    }
}

/// Builds the class hierarchy under one synthetic root.
///
/// Classes whose bases are all unknown are the roots. When there is no such class
/// (every class sits on a base cycle), all classes are attached flatly instead.
///
/// Class names need not be unique (nested `Meta` or `Config` classes). Every
/// definition is kept, and a base name resolves to all classes carrying it.
pub fn build_hierarchy(input: &InheritanceInput) -> TreeNode {
    let mut root = TreeNode::leaf(GraphNode::root(ROOT_NAME));
    let classes = input.classes.as_slice();

    let known = classes
        .iter()
        .map(|class| class.name.as_str())
        .collect::<HashSet<_>>();
    let root_candidates = classes
        .iter()
        .enumerate()
        .filter(|(_, class)| class.bases.iter().all(|base| !known.contains(base.as_str())))
        .map(|(index, _)| index)
        .collect::<Vec<_>>();

    if root_candidates.is_empty() && !classes.is_empty() {
        warn!(
            classes = classes.len(),
            "no root classes found, attaching every class to the synthetic root"
        );
        root.children.extend(classes.iter().map(with_methods));
    } else {
        let mut builder = HierarchyBuilder::new(classes);
        let mut ancestors = Vec::new();
        for index in root_candidates {
            let subtree = builder.build(index, &mut ancestors);
            root.children.push(subtree);
        }
        if builder.cycle_skips > 0 {
            warn!(
                skipped = builder.cycle_skips,
                "skipped cyclic subclass edges while building hierarchy"
            );
        }
        if builder.budget_skips > 0 {
            warn!(
                skipped = builder.budget_skips,
                limit = MAX_HIERARCHY_NODES,
                "hierarchy node budget exhausted, subclass subtrees omitted"
            );
        }
    }

    root.children
        .extend(input.functions.iter().map(|function| TreeNode::leaf(function_node(function))));

    debug!(nodes = root.count(), "built inheritance hierarchy");
    root
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::model::input::MethodInput;

    fn class(name: &str, bases: &[&str]) -> ClassInput {
        ClassInput {
            name: name.to_owned(),
            bases: bases.iter().map(|base| (*base).to_owned()).collect(),
            ..ClassInput::default()
        }
    }

    #[test]
    fn animal_dog_scenario() {
        let tree = build_hierarchy(&InheritanceInput {
            classes: vec![class("Animal", &[]), class("Dog", &["Animal"])],
            functions: Vec::new(),
        });

        assert_eq!(tree.node.kind, NodeKind::Root);
        assert_eq!(tree.children.len(), 1);
        let animal = &tree.children[0];
        assert_eq!(animal.node.name, "Animal");
        assert_eq!(animal.children.len(), 1);
        assert_eq!(animal.children[0].node.name, "Dog");
        assert!(animal.children[0].children.is_empty());
    }

    #[test]
    fn methods_precede_subclasses_and_functions_hang_off_root() {
        let mut animal = class("Animal", &["object"]);
        animal.methods.push(MethodInput {
            name: "speak".to_owned(),
            params: vec!["self".to_owned()],
            ..MethodInput::default()
        });
        let tree = build_hierarchy(&InheritanceInput {
            classes: vec![animal, class("Cat", &["Animal"])],
            functions: vec![FunctionInput {
                name: "main".to_owned(),
                ..FunctionInput::default()
            }],
        });

        let animal = tree.find_child("Animal").unwrap();
        assert!(matches!(
            &animal.children[0].node.kind,
            NodeKind::Method(meta) if meta.class_name == "Animal" && meta.param_count == 1
        ));
        assert_eq!(animal.children[1].node.name, "Cat");
        assert!(matches!(
            tree.find_child("main").unwrap().node.kind,
            NodeKind::Function(_)
        ));
    }

    #[test]
    fn diamond_duplicates_shared_subclass() {
        let tree = build_hierarchy(&InheritanceInput {
            classes: vec![
                class("Base", &[]),
                class("Left", &["Base"]),
                class("Right", &["Base"]),
                class("Both", &["Left", "Right"]),
            ],
            functions: Vec::new(),
        });

        let base = tree.find_child("Base").unwrap();
        assert!(base.find_child("Left").unwrap().find_child("Both").is_some());
        assert!(base.find_child("Right").unwrap().find_child("Both").is_some());
    }

    #[test]
    fn full_cycle_attaches_all_classes_flatly() {
        let tree = build_hierarchy(&InheritanceInput {
            classes: vec![class("A", &["B"]), class("B", &["A"])],
            functions: Vec::new(),
        });

        assert_eq!(tree.children.len(), 2);
        assert!(tree.children.iter().all(|child| child.children.is_empty()));
    }

    #[test]
    fn cycle_below_valid_root_terminates() {
        let tree = build_hierarchy(&InheritanceInput {
            classes: vec![class("A", &[]), class("B", &["A", "C"]), class("C", &["B"])],
            functions: Vec::new(),
        });

        let b = tree.find_child("A").unwrap().find_child("B").unwrap();
        let c = b.find_child("C").unwrap();
        assert!(c.find_child("B").is_none());
    }

    #[test]
    fn repeated_class_names_are_all_kept() {
        let mut inner = class("Meta", &[]);
        inner.methods.push(MethodInput {
            name: "b".to_owned(),
            ..MethodInput::default()
        });
        let tree = build_hierarchy(&InheritanceInput {
            classes: vec![class("User", &[]), class("Meta", &[]), class("Order", &[]), inner],
            functions: Vec::new(),
        });

        let metas = tree
            .children
            .iter()
            .filter(|child| child.node.name == "Meta")
            .collect::<Vec<_>>();
        assert_eq!(metas.len(), 2);
        assert!(metas[0].children.is_empty());
        assert_eq!(metas[1].children[0].node.name, "b");
    }

    #[test]
    fn base_name_resolves_to_every_same_named_class() {
        let tree = build_hierarchy(&InheritanceInput {
            classes: vec![class("Config", &[]), class("Config", &[]), class("Child", &["Config"])],
            functions: Vec::new(),
        });

        assert_eq!(tree.children.len(), 2);
        assert!(tree.children.iter().all(|config| config.find_child("Child").is_some()));
    }

    #[test]
    fn diamond_ladder_stops_at_node_budget() {
        let mut classes = vec![class("L0a", &[]), class("L0b", &[])];
        for level in 1..30 {
            let bases = [format!("L{}a", level - 1), format!("L{}b", level - 1)];
            let bases = [bases[0].as_str(), bases[1].as_str()];
            classes.push(class(&format!("L{level}a"), &bases));
            classes.push(class(&format!("L{level}b"), &bases));
        }

        let tree = build_hierarchy(&InheritanceInput {
            classes,
            functions: Vec::new(),
        });

        assert!(tree.count() <= MAX_HIERARCHY_NODES + 2);
        assert!(tree.count() > MAX_HIERARCHY_NODES / 2);
    }

    #[test]
    fn empty_input_yields_bare_root() {
        let tree = build_hierarchy(&InheritanceInput::default());
        assert_eq!(tree.count(), 1);
    }

    proptest! {
        #[test]
        fn prop_hierarchy_build_terminates(
            edges in proptest::collection::vec(
                proptest::collection::vec(0usize..8, 0..4),
                1..8
            ),
            external in proptest::bool::ANY
        ) {
            let classes = edges
                .iter()
                .enumerate()
                .map(|(index, bases)| ClassInput {
                    name: format!("C{index}"),
                    bases: if external {
                        vec![format!("ext.Base{index}")]
                    } else {
                        bases.iter().map(|base| format!("C{base}")).collect()
                    },
                    ..ClassInput::default()
                })
                .collect::<Vec<_>>();
            let count = classes.len();

            let tree = build_hierarchy(&InheritanceInput { classes, functions: Vec::new() });

            prop_assert_eq!(tree.node.kind.clone(), NodeKind::Root);
            prop_assert!(tree.children.len() <= count);
            prop_assert!(!tree.children.is_empty());
            if external {
                prop_assert_eq!(tree.children.len(), count);
            }
        }
    }
}
