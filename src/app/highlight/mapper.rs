use tracing::debug;

use crate::model::{SearchResult, SourceRef, VisualizationData};

use super::{HighlightStyle, HighlightTarget, LineAnchor, VisualizationKind};

fn shares_id(source_ref: Option<&SourceRef>, node_id: &str) -> bool {
    source_ref.is_some_and(|source| source.node_id == node_id)
}

fn push_unique(targets: &mut Vec<HighlightTarget>, target: HighlightTarget) {
    if !targets.contains(&target) {
        targets.push(target);
    }
}

/// Resolves one search result to the graph locations it names.
///
/// Only exact `node_id` matches count here. A method inside a class also lights
/// up the class that owns it. Results without a reference, or with one nothing
/// in `data` carries, resolve to nothing.
pub(in crate::app) fn map_result(result: &SearchResult, data: &VisualizationData) -> Vec<HighlightTarget> {
    let Some(source) = result.source_ref.as_ref() else {
        return Vec::new();
    };
    let node_id = source.node_id.as_str();
    if node_id.is_empty() {
        return Vec::new();
    }

    let anchor = LineAnchor {
        line: source.line,
        node_type: source.node_type.clone(),
    };
    let direct = |kind| HighlightTarget {
        node_id: node_id.to_owned(),
        kind,
        style: HighlightStyle::Direct,
        anchor: Some(anchor.clone()),
    };

    let mut targets = Vec::new();

    if let Some(inheritance) = &data.inheritance {
        for class in &inheritance.classes {
            if shares_id(class.source_ref.as_ref(), node_id) {
                push_unique(&mut targets, direct(VisualizationKind::Inheritance));
            }
            if class
                .methods
                .iter()
                .any(|method| shares_id(method.source_ref.as_ref(), node_id))
            {
                push_unique(&mut targets, direct(VisualizationKind::Inheritance));
            }
        }

        if inheritance
            .functions
            .iter()
            .any(|function| shares_id(function.source_ref.as_ref(), node_id))
        {
            push_unique(&mut targets, direct(VisualizationKind::Inheritance));
        }

        if source.is_inside_class() && source.is_function_like() {
            for class in &inheritance.classes {
                let owns_method = class
                    .methods
                    .iter()
                    .any(|method| shares_id(method.source_ref.as_ref(), node_id));
                let Some(class_ref) = class.source_ref.as_ref().filter(|_| owns_method) else {
                    continue;
                };
                push_unique(
                    &mut targets,
                    HighlightTarget {
                        node_id: class_ref.node_id.clone(),
                        kind: VisualizationKind::Inheritance,
                        style: HighlightStyle::Hierarchical,
                        anchor: None,
                    },
                );
            }
        }
    }

    if let Some(call_graph) = &data.call_graph
        && call_graph
            .functions
            .iter()
            .any(|function| shares_id(function.source_ref.as_ref(), node_id))
    {
        push_unique(&mut targets, direct(VisualizationKind::CallGraph));
    }

    targets
}

/// Maps every result, keeping one target list per result in input order.
pub(in crate::app) fn map_results(
    results: &[SearchResult],
    data: &VisualizationData,
) -> Vec<Vec<HighlightTarget>> {
    let mapped = results
        .iter()
        .map(|result| map_result(result, data))
        .collect::<Vec<_>>();

    debug!(
        results = results.len(),
        resolved = mapped.iter().filter(|targets| !targets.is_empty()).count(),
        targets = mapped.iter().map(Vec::len).sum::<usize>(),
        "mapped search results to graph targets"
    );
    mapped
}

/// Flattens per-result lists into one deduplicated set, first occurrence wins.
pub(in crate::app) fn merge_targets<'a>(
    lists: impl IntoIterator<Item = &'a Vec<HighlightTarget>>,
) -> Vec<HighlightTarget> {
    let mut merged = Vec::new();
    for target in lists.into_iter().flatten() {
        push_unique(&mut merged, target.clone());
    }
    merged
}

#[cfg(test)]
pub(in crate::app) mod fixtures {
    use serde_json::json;

    use crate::model::{SearchResult, VisualizationData};

    pub(in crate::app) fn animal_data() -> VisualizationData {
        serde_json::from_value(json!({
            "inheritance": {
                "classes": [
                    {
                        "name": "Animal",
                        "bases": [],
                        "methods": [{
                            "name": "speak",
                            "sourceRef": {"nodeId": "FunctionDef_2_4", "nodeType": "FunctionDef", "line": 2, "path": ["Module", "ClassDef", "FunctionDef"]}
                        }],
                        "sourceRef": {"nodeId": "ClassDef_1_0", "nodeType": "ClassDef", "line": 1, "path": ["Module", "ClassDef"]}
                    },
                    {
                        "name": "Dog",
                        "bases": ["Animal"],
                        "methods": [{
                            "name": "bark",
                            "sourceRef": {"nodeId": "FunctionDef_6_4", "nodeType": "FunctionDef", "line": 6, "path": ["Module", "ClassDef", "FunctionDef"]}
                        }],
                        "sourceRef": {"nodeId": "ClassDef_5_0", "nodeType": "ClassDef", "line": 5, "path": ["Module", "ClassDef"]}
                    }
                ],
                "functions": [{
                    "name": "main",
                    "sourceRef": {"nodeId": "FunctionDef_9_0", "nodeType": "FunctionDef", "line": 9, "path": ["Module", "FunctionDef"]}
                }]
            },
            "call_graph": {
                "functions": [
                    {"name": "main", "calls": ["bark"], "sourceRef": {"nodeId": "FunctionDef_9_0", "nodeType": "FunctionDef", "line": 9}},
                    {"name": "bark", "sourceRef": {"nodeId": "FunctionDef_6_4", "nodeType": "FunctionDef", "line": 6}}
                ]
            }
        }))
        .expect("fixture parses")
    }

    pub(in crate::app) fn result(name: &str, source_ref: Option<serde_json::Value>) -> SearchResult {
        let mut value = json!({"type": "function", "name": name, "snippet": "", "score": 0.9});
        if let Some(source_ref) = source_ref {
            value["sourceRef"] = source_ref;
        }
        serde_json::from_value(value).expect("result parses")
    }

    pub(in crate::app) fn bark() -> SearchResult {
        result(
            "bark",
            Some(json!({"nodeId": "FunctionDef_6_4", "nodeType": "FunctionDef", "line": 6, "path": ["Module", "ClassDef", "FunctionDef"]})),
        )
    }

    pub(in crate::app) fn main_fn() -> SearchResult {
        result(
            "main",
            Some(json!({"nodeId": "FunctionDef_9_0", "nodeType": "FunctionDef", "line": 9, "path": ["Module", "FunctionDef"]})),
        )
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::fixtures::{animal_data, bark, main_fn, result};
    use super::*;

    fn count(targets: &[HighlightTarget], style: HighlightStyle, kind: VisualizationKind) -> usize {
        targets
            .iter()
            .filter(|target| target.style == style && target.kind == kind)
            .count()
    }

    #[test]
    fn method_match_lights_the_method_and_exactly_its_class() {
        let targets = map_result(&bark(), &animal_data());

        assert!(count(&targets, HighlightStyle::Direct, VisualizationKind::Inheritance) >= 1);
        assert_eq!(count(&targets, HighlightStyle::Hierarchical, VisualizationKind::Inheritance), 1);
        let class = targets
            .iter()
            .find(|target| target.style == HighlightStyle::Hierarchical)
            .expect("class target");
        assert_eq!(class.node_id, "ClassDef_5_0");
        assert_eq!(count(&targets, HighlightStyle::Direct, VisualizationKind::CallGraph), 1);
    }

    #[test]
    fn free_function_is_not_promoted() {
        let targets = map_result(&main_fn(), &animal_data());
        assert_eq!(count(&targets, HighlightStyle::Hierarchical, VisualizationKind::Inheritance), 0);
        assert_eq!(targets.len(), 2);
    }

    #[test]
    fn missing_or_unknown_reference_resolves_to_nothing() {
        let data = animal_data();
        assert!(map_result(&result("loose", None), &data).is_empty());

        let unknown = result("ghost", Some(json!({"nodeId": "FunctionDef_99_0", "nodeType": "FunctionDef", "line": 99})));
        assert!(map_result(&unknown, &data).is_empty());

        assert!(map_result(&bark(), &VisualizationData::default()).is_empty());
    }

    #[test]
    fn direct_targets_carry_the_line_anchor() {
        let targets = map_result(&bark(), &animal_data());
        let direct = targets
            .iter()
            .find(|target| target.style == HighlightStyle::Direct)
            .expect("direct target");
        assert_eq!(
            direct.anchor,
            Some(LineAnchor {
                line: 6,
                node_type: "FunctionDef".to_owned()
            })
        );
    }

    #[test]
    fn merged_targets_are_deduplicated() {
        let data = animal_data();
        let mapped = map_results(&[bark(), bark(), main_fn()], &data);
        assert_eq!(mapped.len(), 3);

        let merged = merge_targets(&mapped);
        let once = merge_targets(&map_results(&[bark(), main_fn()], &data));
        assert_eq!(merged, once);
    }
}
