use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{ModelError, Result};
use super::source_ref::SourceRef;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InheritanceInput {
    #[serde(default)]
    pub classes: Vec<ClassInput>,
    #[serde(default)]
    pub functions: Vec<FunctionInput>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ClassInput {
    pub name: String,
    #[serde(default)]
    pub bases: Vec<String>,
    #[serde(default)]
    pub methods: Vec<MethodInput>,
    #[serde(default)]
    pub attributes: Vec<String>,
    #[serde(default)]
    pub docstring: Option<String>,
    #[serde(default)]
    pub lineno: Option<u32>,
    #[serde(default, rename = "sourceRef", alias = "source_ref", alias = "ast_ref")]
    pub source_ref: Option<SourceRef>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MethodInput {
    pub name: String,
    #[serde(default, alias = "args")]
    pub params: Vec<String>,
    #[serde(default)]
    pub docstring: Option<String>,
    #[serde(default)]
    pub lineno: Option<u32>,
    #[serde(default, rename = "sourceRef", alias = "source_ref", alias = "ast_ref")]
    pub source_ref: Option<SourceRef>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FunctionInput {
    pub name: String,
    #[serde(default, alias = "args")]
    pub params: Vec<String>,
    #[serde(default)]
    pub calls: Vec<String>,
    #[serde(default)]
    pub docstring: Option<String>,
    #[serde(default)]
    pub lineno: Option<u32>,
    #[serde(default, rename = "sourceRef", alias = "source_ref", alias = "ast_ref")]
    pub source_ref: Option<SourceRef>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CallGraphInput {
    #[serde(default)]
    pub functions: Vec<FunctionInput>,
    #[serde(default)]
    pub calls: Vec<CallInput>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CallInput {
    pub caller: String,
    pub callee: String,
    #[serde(default)]
    pub lineno: Option<u32>,
}

/// One ranked hit from the search backend.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default, rename = "type")]
    pub result_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub score: f32,
    #[serde(default)]
    pub line_start: Option<u32>,
    #[serde(default)]
    pub line_end: Option<u32>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default, rename = "sourceRef", alias = "source_ref", alias = "ast_ref")]
    pub source_ref: Option<SourceRef>,
}

/// Inheritance and call-graph data for the scope a search ran against.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VisualizationData {
    #[serde(default)]
    pub inheritance: Option<InheritanceInput>,
    #[serde(default, alias = "callgraph", alias = "callGraph")]
    pub call_graph: Option<CallGraphInput>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PathEdgeInput {
    #[serde(alias = "source")]
    pub from: String,
    #[serde(alias = "target")]
    pub to: String,
}

/// Call-graph hops the backend considers relevant to a query.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RetrievalPathInput {
    #[serde(default)]
    pub nodes: Vec<String>,
    #[serde(default)]
    pub edges: Vec<PathEdgeInput>,
    #[serde(default)]
    pub matched: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub results: Vec<SearchResult>,
    #[serde(default)]
    pub visualization_data: Option<VisualizationData>,
    #[serde(default)]
    pub retrieval_path: Option<RetrievalPathInput>,
}

fn check_envelope(value: &Value) -> Result<()> {
    let Some(object) = value.as_object() else {
        return Ok(());
    };

    if object.get("success").and_then(Value::as_bool) == Some(false) {
        let message = object
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("no error message")
            .to_owned();
        return Err(ModelError::Envelope(message));
    }

    Ok(())
}

pub fn parse_ast_document(raw: &str) -> Result<Value> {
    let mut parsed: Value = serde_json::from_str(raw)?;
    check_envelope(&parsed)?;

    if let Some(object) = parsed.as_object_mut()
        && let Some(ast) = object.remove("ast")
    {
        return Ok(ast);
    }

    Ok(parsed)
}

pub fn parse_inheritance(raw: &str) -> Result<InheritanceInput> {
    let parsed: Value = serde_json::from_str(raw)?;
    check_envelope(&parsed)?;
    if !parsed.is_object() {
        return Err(ModelError::Shape(
            "inheritance document must be an object".to_owned(),
        ));
    }
    Ok(InheritanceInput::deserialize(parsed)?)
}

pub fn parse_call_graph(raw: &str) -> Result<CallGraphInput> {
    let parsed: Value = serde_json::from_str(raw)?;
    check_envelope(&parsed)?;
    if !parsed.is_object() {
        return Err(ModelError::Shape(
            "call graph document must be an object".to_owned(),
        ));
    }
    Ok(CallGraphInput::deserialize(parsed)?)
}

pub fn parse_search_response(raw: &str) -> Result<SearchResponse> {
    let parsed: Value = serde_json::from_str(raw)?;
    check_envelope(&parsed)?;

    let mut response = match parsed {
        Value::Array(_) => SearchResponse {
            results: Vec::<SearchResult>::deserialize(parsed)?,
            ..SearchResponse::default()
        },
        Value::Object(_) => SearchResponse::deserialize(parsed)?,
        _ => {
            return Err(ModelError::Shape(
                "search response must be an object or an array".to_owned(),
            ));
        }
    };

    for result in &mut response.results {
        result.score = if result.score.is_finite() {
            result.score.clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_envelope_surfaces_error_message() {
        let error = parse_inheritance(r#"{"success": false, "error": "Syntax error: line 3"}"#)
            .unwrap_err();
        assert!(matches!(error, ModelError::Envelope(message) if message.contains("line 3")));
    }

    #[test]
    fn ast_envelope_is_unwrapped() {
        let ast = parse_ast_document(r#"{"success": true, "ast": {"type": "Module", "body": []}}"#)
            .unwrap();
        assert_eq!(ast["type"], "Module");
    }

    #[test]
    fn call_graph_accepts_args_and_calls() {
        let graph = parse_call_graph(
            r#"{"functions": [{"name": "a", "args": ["x"], "calls": ["b"]}],
                "calls": [{"caller": "a", "callee": "c", "lineno": 4}]}"#,
        )
        .unwrap();

        assert_eq!(graph.functions[0].params, vec!["x"]);
        assert_eq!(graph.functions[0].calls, vec!["b"]);
        assert_eq!(graph.calls[0].callee, "c");
    }

    #[test]
    fn search_scores_are_clamped_and_arrays_accepted() {
        let response = parse_search_response(
            r#"[{"type": "function", "name": "load", "snippet": "def load()", "score": 1.7},
                {"type": "class", "name": "Store", "snippet": "class Store", "score": -0.2}]"#,
        )
        .unwrap();

        assert_eq!(response.results.len(), 2);
        assert_eq!(response.results[0].score, 1.0);
        assert_eq!(response.results[1].score, 0.0);
        assert!(response.visualization_data.is_none());
    }

    #[test]
    fn search_response_reads_ast_ref_alias() {
        let response = parse_search_response(
            r#"{"results": [{"type": "function", "name": "bark", "snippet": "", "score": 0.5,
                "ast_ref": {"node_id": "FunctionDef_4_4", "node_type": "FunctionDef", "line": 4}}],
                "visualization_data": {"callgraph": {"functions": [{"name": "bark"}]}}}"#,
        )
        .unwrap();

        let source_ref = response.results[0].source_ref.as_ref().unwrap();
        assert_eq!(source_ref.node_id, "FunctionDef_4_4");
        let data = response.visualization_data.unwrap();
        assert_eq!(data.call_graph.unwrap().functions[0].name, "bark");
    }

    #[test]
    fn non_object_inheritance_is_rejected() {
        assert!(matches!(
            parse_inheritance("[1, 2]"),
            Err(ModelError::Shape(_))
        ));
    }
}
