use serde_json::{Map, Value};
use tracing::warn;

use super::graph::{GraphNode, NodeKind, SyntaxMeta, TreeNode};
use super::source_ref::SourceRef;

const MAX_AST_DEPTH: usize = 256;
const UNKNOWN_TYPE: &str = "Unknown";
const NAME_FIELDS: [&str; 5] = ["name", "id", "attr", "arg", "module"];
const POSITION_FIELDS: [&str; 5] = ["type", "lineno", "col_offset", "end_lineno", "end_col_offset"];
const STRUCTURAL_TYPES: [&str; 3] = ["ClassDef", "FunctionDef", "AsyncFunctionDef"];

pub fn build_ast_tree(document: &Value) -> TreeNode {
    transform(document, &["Module".to_owned()], 0)
}

fn primitive_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null => Some("None".to_owned()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn unknown_leaf(value: &Value) -> TreeNode {
    let name = primitive_text(value).unwrap_or_else(|| value.to_string());
    TreeNode::leaf(GraphNode {
        name,
        source_ref: None,
        kind: NodeKind::Syntax(SyntaxMeta {
            node_type: UNKNOWN_TYPE.to_owned(),
            value: None,
        }),
    })
}

fn as_line(value: Option<&Value>) -> Option<u32> {
    value
        .and_then(Value::as_u64)
        .and_then(|line| u32::try_from(line).ok())
}

fn node_source_ref(node_type: &str, object: &Map<String, Value>, path: &[String]) -> Option<SourceRef> {
    let line = as_line(object.get("lineno"))?;
    let col = as_line(object.get("col_offset"));
    let mut source_ref = SourceRef::new(node_type, line, col);
    source_ref.end_line = as_line(object.get("end_lineno")).or(Some(line));
    source_ref.end_col = as_line(object.get("end_col_offset"));
    source_ref.path = path.to_vec();
    Some(source_ref)
}

fn transform(value: &Value, path: &[String], depth: usize) -> TreeNode {
    let Value::Object(object) = value else {
        return unknown_leaf(value);
    };

    let node_type = object
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN_TYPE)
        .to_owned();

    let name = NAME_FIELDS
        .iter()
        .find_map(|field| object.get(*field).and_then(Value::as_str))
        .map(str::to_owned)
        .unwrap_or_else(|| node_type.clone());

    let literal = object.get("value").and_then(primitive_text);
    let source_ref = node_source_ref(&node_type, object, path);

    let mut node = TreeNode::leaf(GraphNode {
        name,
        source_ref,
        kind: NodeKind::Syntax(SyntaxMeta {
            node_type: node_type.clone(),
            value: literal,
        }),
    });

    if depth >= MAX_AST_DEPTH {
        warn!(depth, node_type = %node_type, "AST depth limit reached, truncating subtree");
        return node;
    }

    let mut child_path = path.to_vec();
    if STRUCTURAL_TYPES.contains(&node_type.as_str()) {
        child_path.push(node_type.clone());
    }

    for (field, child) in object {
        if POSITION_FIELDS.contains(&field.as_str()) {
            continue;
        }

        match child {
            Value::Object(_) => node.children.push(transform(child, &child_path, depth + 1)),
            Value::Array(items) => {
                for item in items {
                    node.children.push(transform(item, &child_path, depth + 1));
                }
            }
            _ => {}
        }
    }

    node
}
