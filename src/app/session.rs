use tracing::{debug, info};

use crate::config::VizConfig;
use crate::model::{Analysis, SearchResult, VisualizationData};

use super::highlight::{Coordinator, Phase, RetrievalPath, ViewKind};
use super::render::{LayoutTicket, RenderAdapter, RenderedView};

/// Result of pumping one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(in crate::app) struct FrameStatus {
    pub completed: Option<LayoutTicket>,
    pub moving: bool,
}

/// Single owner of everything the graph views share: the rendered view, the
/// highlight state machine, the current search results and retrieval path.
pub(in crate::app) struct VizSession {
    adapter: RenderAdapter,
    coordinator: Coordinator,
    view: ViewKind,
    results: Vec<SearchResult>,
    /// Data the current results were matched against.
    result_data: VisualizationData,
    path: Option<RetrievalPath>,
}

impl VizSession {
    pub fn new(config: VizConfig, view: ViewKind) -> Self {
        Self {
            adapter: RenderAdapter::new(config),
            coordinator: Coordinator::new(config.highlight),
            view,
            results: Vec::new(),
            result_data: VisualizationData::default(),
            path: None,
        }
    }

    pub fn view_kind(&self) -> ViewKind {
        self.view
    }

    pub fn rendered(&self) -> Option<&RenderedView> {
        self.adapter.view()
    }

    pub fn rendered_mut(&mut self) -> Option<&mut RenderedView> {
        self.adapter.view_mut()
    }

    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    pub fn retrieval_path(&self) -> Option<&RetrievalPath> {
        self.path.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.coordinator.phase()
    }

    pub fn toast(&self) -> Option<&str> {
        self.coordinator.toast()
    }

    pub fn is_layout_pending(&self) -> bool {
        self.adapter.is_pending()
    }

    pub fn set_config(&mut self, config: VizConfig) {
        self.adapter.set_config(config);
    }

    /// Lays out `view` right away. Highlights are not replayed; use
    /// [`Self::notify_view_switch`] when they should follow.
    pub fn render(&mut self, view: ViewKind, analysis: &Analysis) -> LayoutTicket {
        self.view = view;
        let ticket = self.adapter.request_render(view);
        self.complete_layout(analysis);
        ticket
    }

    pub fn highlight_from_results(
        &mut self,
        results: Vec<SearchResult>,
        data: VisualizationData,
        now: f64,
    ) -> usize {
        self.results = results;
        self.result_data = data;
        self.coordinator
            .results_displayed(&self.results, &self.result_data, &mut self.adapter, now)
    }

    pub fn clear_highlights(&mut self) {
        self.results.clear();
        self.coordinator.results_cleared(&mut self.adapter);
    }

    /// Re-highlights the current results, e.g. after the user cleared marks by hand.
    pub fn rehighlight(&mut self, now: f64) -> usize {
        self.coordinator
            .results_displayed(&self.results, &self.result_data, &mut self.adapter, now)
    }

    /// Switches to `view`. The layout happens on the next [`Self::frame`] and the
    /// persistent highlights are replayed when it completes.
    pub fn notify_view_switch(&mut self, view: ViewKind) -> LayoutTicket {
        self.view = view;
        let ticket = self.adapter.request_render(view);
        self.coordinator.view_switched(ticket);
        debug!(view = view.label(), ?ticket, "view switch requested");
        ticket
    }

    /// New analysis for the same view. Same replay rules as a view switch.
    pub fn notify_data_update(&mut self) -> LayoutTicket {
        let ticket = self.adapter.request_render(self.view);
        self.coordinator.data_updated(ticket);
        debug!(view = self.view.label(), ?ticket, "data update requested");
        ticket
    }

    pub fn hover_enter(&mut self, result_index: usize, now: f64) {
        let Some(result) = self.results.get(result_index) else {
            return;
        };
        self.coordinator
            .hover_enter(result, &self.result_data, &mut self.adapter, now);
    }

    pub fn hover_leave(&mut self) {
        self.coordinator.hover_leave(&mut self.adapter);
    }

    pub fn apply_retrieval_path(&mut self, path: RetrievalPath) -> usize {
        let touched = self.adapter.apply_path(&path);
        info!(
            hops = path.nodes.len(),
            matched = path.matched.len(),
            touched,
            "retrieval path applied"
        );
        self.path = Some(path);
        touched
    }

    pub fn clear_retrieval_path(&mut self) {
        self.path = None;
        self.adapter.clear_path();
    }

    /// Per-frame pump: finishes a queued layout, expires timers, steps physics.
    pub fn frame(&mut self, now: f64, delta_seconds: f32, analysis: &Analysis) -> FrameStatus {
        let completed = self.complete_layout(analysis);
        self.coordinator.poll(now, &mut self.adapter);
        let moving = self.adapter.tick(delta_seconds);
        FrameStatus { completed, moving }
    }

    fn complete_layout(&mut self, analysis: &Analysis) -> Option<LayoutTicket> {
        let ticket = self.adapter.flush(analysis)?;
        if let Some(path) = &self.path {
            self.adapter.apply_path(path);
        }
        self.coordinator.layout_completed(ticket, &mut self.adapter);
        Some(ticket)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::app::highlight::HighlightStyle;

    fn data() -> VisualizationData {
        serde_json::from_value(json!({
            "inheritance": {
                "classes": [
                    {"name": "Animal", "sourceRef": {"nodeId": "ClassDef_1_0", "nodeType": "ClassDef", "line": 1, "path": ["Module", "ClassDef"]},
                     "methods": [{"name": "speak", "sourceRef": {"nodeId": "FunctionDef_2_4", "nodeType": "FunctionDef", "line": 2, "path": ["Module", "ClassDef", "FunctionDef"]}}]},
                    {"name": "Dog", "bases": ["Animal"], "sourceRef": {"nodeId": "ClassDef_5_0", "nodeType": "ClassDef", "line": 5, "path": ["Module", "ClassDef"]}}
                ]
            },
            "call_graph": {
                "functions": [
                    {"name": "main", "calls": ["speak"], "sourceRef": {"nodeId": "FunctionDef_9_0", "nodeType": "FunctionDef", "line": 9}},
                    {"name": "speak", "sourceRef": {"nodeId": "FunctionDef_2_4", "nodeType": "FunctionDef", "line": 2}}
                ]
            }
        }))
        .unwrap()
    }

    fn speak() -> SearchResult {
        serde_json::from_value(json!({
            "type": "method", "name": "speak", "snippet": "def speak(self): ...", "score": 0.8,
            "sourceRef": {"nodeId": "FunctionDef_2_4", "nodeType": "FunctionDef", "line": 2, "path": ["Module", "ClassDef", "FunctionDef"]}
        }))
        .unwrap()
    }

    fn session() -> (VizSession, Analysis) {
        let analysis = Analysis::build(None, data());
        let mut session = VizSession::new(VizConfig::default(), ViewKind::Inheritance);
        session.render(ViewKind::Inheritance, &analysis);
        (session, analysis)
    }

    fn styles(session: &VizSession) -> Vec<Option<HighlightStyle>> {
        session
            .rendered()
            .unwrap()
            .nodes
            .iter()
            .map(|node| node.mark.tier)
            .collect()
    }

    #[test]
    fn method_result_lights_method_and_class() {
        let (mut session, analysis) = session();
        let matched = session.highlight_from_results(vec![speak()], analysis.visualization.clone(), 0.0);
        assert_eq!(matched, 2);

        let view = session.rendered().unwrap();
        let method = view.index_by_id["FunctionDef_2_4"][0];
        let class = view.index_by_id["ClassDef_1_0"][0];
        assert_eq!(view.nodes[method].mark.tier, Some(HighlightStyle::Direct));
        assert_eq!(view.nodes[class].mark.tier, Some(HighlightStyle::Hierarchical));
    }

    #[test]
    fn method_of_repeated_class_name_is_highlighted() {
        let data: VisualizationData = serde_json::from_value(json!({
            "inheritance": {
                "classes": [
                    {"name": "User", "sourceRef": {"nodeId": "ClassDef_1_0", "nodeType": "ClassDef", "line": 1, "path": ["Module", "ClassDef"]}},
                    {"name": "Meta", "sourceRef": {"nodeId": "ClassDef_2_4", "nodeType": "ClassDef", "line": 2, "path": ["Module", "ClassDef", "ClassDef"]}},
                    {"name": "Order", "sourceRef": {"nodeId": "ClassDef_10_0", "nodeType": "ClassDef", "line": 10, "path": ["Module", "ClassDef"]}},
                    {"name": "Meta", "sourceRef": {"nodeId": "ClassDef_11_4", "nodeType": "ClassDef", "line": 11, "path": ["Module", "ClassDef", "ClassDef"]},
                     "methods": [{"name": "b", "sourceRef": {"nodeId": "FunctionDef_12_8", "nodeType": "FunctionDef", "line": 12, "path": ["Module", "ClassDef", "ClassDef", "FunctionDef"]}}]}
                ]
            }
        }))
        .unwrap();
        let result: SearchResult = serde_json::from_value(json!({
            "type": "method", "name": "b", "snippet": "def b(self): ...", "score": 0.7,
            "sourceRef": {"nodeId": "FunctionDef_12_8", "nodeType": "FunctionDef", "line": 12, "path": ["Module", "ClassDef", "ClassDef", "FunctionDef"]}
        }))
        .unwrap();
        let analysis = Analysis::build(None, data.clone());
        let mut session = VizSession::new(VizConfig::default(), ViewKind::Inheritance);
        session.render(ViewKind::Inheritance, &analysis);

        let view = session.rendered().unwrap();
        assert!(view.index_by_id.contains_key("ClassDef_2_4"));
        assert!(view.index_by_id.contains_key("ClassDef_11_4"));

        let matched = session.highlight_from_results(vec![result], data, 0.0);
        assert_eq!(matched, 2);
        let view = session.rendered().unwrap();
        let method = view.index_by_id["FunctionDef_12_8"][0];
        let inner = view.index_by_id["ClassDef_11_4"][0];
        let outer = view.index_by_id["ClassDef_2_4"][0];
        assert_eq!(view.nodes[method].mark.tier, Some(HighlightStyle::Direct));
        assert_eq!(view.nodes[inner].mark.tier, Some(HighlightStyle::Hierarchical));
        assert_eq!(view.nodes[outer].mark.tier, None);
    }

    #[test]
    fn view_switch_replays_after_the_next_frame() {
        let (mut session, analysis) = session();
        session.highlight_from_results(vec![speak()], analysis.visualization.clone(), 0.0);

        let ticket = session.notify_view_switch(ViewKind::CallGraph);
        assert!(session.is_layout_pending());
        assert_eq!(session.rendered().map(|view| view.view), Some(ViewKind::Inheritance));

        let status = session.frame(0.1, 1.0 / 60.0, &analysis);
        assert_eq!(status.completed, Some(ticket));
        let view = session.rendered().unwrap();
        assert_eq!(view.view, ViewKind::CallGraph);
        let speak = view.index_by_id["FunctionDef_2_4"][0];
        assert_eq!(view.nodes[speak].mark.tier, Some(HighlightStyle::Direct));
        assert_eq!(view.highlighted_count(), 1);
    }

    #[test]
    fn data_update_keeps_highlights() {
        let (mut session, analysis) = session();
        session.highlight_from_results(vec![speak()], analysis.visualization.clone(), 0.0);
        let before = styles(&session);

        session.notify_data_update();
        session.frame(0.2, 1.0 / 60.0, &analysis);
        assert_eq!(styles(&session), before);
    }

    #[test]
    fn plain_render_does_not_replay() {
        let (mut session, analysis) = session();
        session.highlight_from_results(vec![speak()], analysis.visualization.clone(), 0.0);
        session.render(ViewKind::Inheritance, &analysis);
        assert!(styles(&session).iter().all(Option::is_none));
    }

    #[test]
    fn clearing_returns_to_idle() {
        let (mut session, analysis) = session();
        session.highlight_from_results(vec![speak()], analysis.visualization.clone(), 0.0);
        session.clear_highlights();
        assert_eq!(session.phase(), Phase::Idle);
        assert!(session.results().is_empty());
        assert!(styles(&session).iter().all(Option::is_none));
    }

    #[test]
    fn hover_on_missing_row_is_ignored() {
        let (mut session, analysis) = session();
        session.highlight_from_results(vec![speak()], analysis.visualization.clone(), 0.0);
        session.hover_enter(5, 1.0);
        assert_eq!(session.phase(), Phase::Active);
    }

    #[test]
    fn retrieval_path_is_reapplied_after_relayout() {
        let analysis = Analysis::build(None, data());
        let mut session = VizSession::new(VizConfig::default(), ViewKind::CallGraph);
        session.render(ViewKind::CallGraph, &analysis);

        let touched = session.apply_retrieval_path(RetrievalPath {
            nodes: vec!["main".into(), "speak".into()],
            edges: vec![("main".into(), "speak".into())],
            matched: vec!["speak".into()],
        });
        assert_eq!(touched, 2);

        session.notify_data_update();
        session.frame(0.0, 1.0 / 60.0, &analysis);
        let view = session.rendered().unwrap();
        assert!(view.edges.iter().all(|edge| edge.mark.on_path));

        session.clear_retrieval_path();
        assert!(session.retrieval_path().is_none());
    }
}
