use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::model::{
    Analysis, SearchResponse, VisualizationData, parse_ast_document, parse_call_graph,
    parse_inheritance, parse_search_response,
};

/// Analyzer and search-backend output files to load.
#[derive(Clone, Debug, Default)]
pub struct Sources {
    pub ast: Option<PathBuf>,
    pub inheritance: Option<PathBuf>,
    pub call_graph: Option<PathBuf>,
    pub results: Option<PathBuf>,
}

impl Sources {
    pub fn is_empty(&self) -> bool {
        self.ast.is_none()
            && self.inheritance.is_none()
            && self.call_graph.is_none()
            && self.results.is_none()
    }
}

pub struct Loaded {
    pub analysis: Analysis,
    pub search: Option<SearchResponse>,
}

fn read(path: &Path, what: &str) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {what} file {}", path.display()))
}

/// Reads and builds everything `sources` names. Any unreadable or malformed file
/// fails the whole load.
pub fn load_sources(sources: &Sources) -> Result<Loaded> {
    let ast = sources
        .ast
        .as_deref()
        .map(|path| {
            parse_ast_document(&read(path, "AST")?)
                .with_context(|| format!("invalid AST document {}", path.display()))
        })
        .transpose()?;

    let inheritance = sources
        .inheritance
        .as_deref()
        .map(|path| {
            parse_inheritance(&read(path, "inheritance")?)
                .with_context(|| format!("invalid inheritance document {}", path.display()))
        })
        .transpose()?;

    let call_graph = sources
        .call_graph
        .as_deref()
        .map(|path| {
            parse_call_graph(&read(path, "call graph")?)
                .with_context(|| format!("invalid call graph document {}", path.display()))
        })
        .transpose()?;

    let search = sources
        .results
        .as_deref()
        .map(|path| {
            parse_search_response(&read(path, "search results")?)
                .with_context(|| format!("invalid search response {}", path.display()))
        })
        .transpose()?;

    // Files win over whatever the search response carried along.
    let carried = search
        .as_ref()
        .and_then(|response| response.visualization_data.clone())
        .unwrap_or_default();
    let visualization = VisualizationData {
        inheritance: inheritance.or(carried.inheritance),
        call_graph: call_graph.or(carried.call_graph),
    };

    let analysis = Analysis::build(ast.as_ref(), visualization);
    if analysis.is_empty() {
        warn!("no graph data loaded, views will show placeholders");
    }
    info!(
        results = search.as_ref().map_or(0, |response| response.results.len()),
        "sources loaded"
    );

    Ok(Loaded { analysis, search })
}
