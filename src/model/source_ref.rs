use serde::{Deserialize, Serialize};

/// Marker the analyzer puts in `path` for every enclosing class definition.
pub const CLASS_DEF_MARKER: &str = "ClassDef";

const FUNCTION_LIKE_TYPES: [&str; 4] = ["FunctionDef", "AsyncFunctionDef", "function", "method"];

/// Identity of one syntactic entity, as produced by the analyzer.
///
/// `node_id` is the matching key. `(line, node_type)` is not unique and is only
/// used by the render adapter as a last-resort fallback.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRef {
    #[serde(rename = "nodeId", alias = "node_id")]
    pub node_id: String,
    #[serde(default, rename = "nodeType", alias = "node_type")]
    pub node_type: String,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub col: Option<u32>,
    #[serde(default, rename = "endLine", alias = "end_line")]
    pub end_line: Option<u32>,
    #[serde(default, rename = "endCol", alias = "end_col")]
    pub end_col: Option<u32>,
    #[serde(default, alias = "node_path")]
    pub path: Vec<String>,
}

impl SourceRef {
    pub fn new(node_type: &str, line: u32, col: Option<u32>) -> Self {
        Self {
            node_id: format!("{node_type}_{line}_{}", col.unwrap_or(0)),
            node_type: node_type.to_owned(),
            line,
            col,
            end_line: Some(line),
            end_col: None,
            path: Vec::new(),
        }
    }

    pub fn end_line(&self) -> u32 {
        self.end_line.unwrap_or(self.line).max(self.line)
    }

    pub fn is_function_like(&self) -> bool {
        FUNCTION_LIKE_TYPES
            .iter()
            .any(|kind| kind.eq_ignore_ascii_case(&self.node_type))
    }

    pub fn is_inside_class(&self) -> bool {
        self.path.iter().any(|segment| segment == CLASS_DEF_MARKER)
    }

    pub fn span_label(&self) -> String {
        let end = self.end_line();
        if end == self.line {
            format!("L{}", self.line)
        } else {
            format!("L{}-{end}", self.line)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_analyzer_snake_case_fields() {
        let parsed: SourceRef = serde_json::from_value(serde_json::json!({
            "node_id": "FunctionDef_12_4",
            "node_type": "FunctionDef",
            "line": 12,
            "col": 4,
            "end_line": 20,
            "end_col": null,
            "node_path": ["Module", "ClassDef"]
        }))
        .unwrap();

        assert_eq!(parsed.node_id, "FunctionDef_12_4");
        assert_eq!(parsed.end_line(), 20);
        assert!(parsed.is_function_like());
        assert!(parsed.is_inside_class());
        assert_eq!(parsed.span_label(), "L12-20");
    }

    #[test]
    fn end_line_defaults_to_start_line() {
        let parsed: SourceRef = serde_json::from_value(serde_json::json!({
            "nodeId": "ClassDef_3_0",
            "nodeType": "ClassDef",
            "line": 3
        }))
        .unwrap();

        assert_eq!(parsed.end_line(), 3);
        assert!(!parsed.is_function_like());
        assert_eq!(parsed.span_label(), "L3");
    }

    #[test]
    fn synthesized_id_follows_type_line_col() {
        let source_ref = SourceRef::new("Assign", 7, Some(2));
        assert_eq!(source_ref.node_id, "Assign_7_2");
    }
}
