use tracing::{debug, info};

use crate::config::HighlightConfig;
use crate::model::{SearchResult, VisualizationData};

use super::super::render::LayoutTicket;
use super::mapper::{map_result, map_results, merge_targets};
use super::{HighlightStyle, HighlightTarget, ViewKind};

/// What the coordinator drives. Implemented by the render adapter.
pub(in crate::app) trait HighlightSink {
    /// View currently on screen, `None` while nothing is rendered.
    fn active_view(&self) -> Option<ViewKind>;

    /// Resets every mark, then marks `targets`. Returns how many render nodes matched.
    fn apply_highlights(&mut self, targets: &[HighlightTarget]) -> usize;

    fn clear_highlights(&mut self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Active,
    Hovering,
}

/// Point on the egui frame clock, in seconds.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
struct Deadline(f64);

impl Deadline {
    fn after(now: f64, seconds: f64) -> Self {
        Self(now + seconds.max(0.0))
    }

    fn is_due(self, now: f64) -> bool {
        now >= self.0
    }
}

#[derive(Debug, Default)]
struct HighlightState {
    persistent: Vec<HighlightTarget>,
    secondary: Vec<HighlightTarget>,
    secondary_timer: Option<Deadline>,
}

#[derive(Debug)]
struct Toast {
    message: String,
    expires_at: Deadline,
}

/// Owns the persistent and transient highlight sets and reapplies them whenever
/// the rendered nodes change underneath.
pub(in crate::app) struct Coordinator {
    state: HighlightState,
    showing_results: bool,
    pending_replay: Option<LayoutTicket>,
    toast: Option<Toast>,
    config: HighlightConfig,
}

impl Coordinator {
    pub fn new(config: HighlightConfig) -> Self {
        Self {
            state: HighlightState::default(),
            showing_results: false,
            pending_replay: None,
            toast: None,
            config,
        }
    }

    pub fn phase(&self) -> Phase {
        if self.state.secondary_timer.is_some() {
            Phase::Hovering
        } else if self.showing_results {
            Phase::Active
        } else {
            Phase::Idle
        }
    }

    pub fn persistent(&self) -> &[HighlightTarget] {
        &self.state.persistent
    }

    pub fn secondary(&self) -> &[HighlightTarget] {
        &self.state.secondary
    }

    pub fn toast(&self) -> Option<&str> {
        self.toast.as_ref().map(|toast| toast.message.as_str())
    }

    pub fn results_displayed(
        &mut self,
        results: &[SearchResult],
        data: &VisualizationData,
        sink: &mut dyn HighlightSink,
        now: f64,
    ) -> usize {
        if results.is_empty() {
            self.results_cleared(sink);
            return 0;
        }

        let mapped = map_results(results, data);
        self.state.persistent = merge_targets(&mapped);
        self.state.secondary.clear();
        self.state.secondary_timer = None;
        self.showing_results = true;

        sink.clear_highlights();
        let matched = apply_for_view(sink, &self.state.persistent);
        let resolved = mapped.iter().filter(|targets| !targets.is_empty()).count();
        info!(
            results = results.len(),
            resolved,
            targets = self.state.persistent.len(),
            matched,
            "search results highlighted"
        );

        let message = match sink.active_view() {
            Some(view) if matched > 0 => format!(
                "Highlighted {matched} node(s) in the {} view for {} result(s)",
                view.label(),
                results.len()
            ),
            Some(view) => format!(
                "{} result(s), none located in the {} view",
                results.len(),
                view.label()
            ),
            None => format!("{} result(s), no graph rendered", results.len()),
        };
        self.show_toast(message, now);
        matched
    }

    pub fn results_cleared(&mut self, sink: &mut dyn HighlightSink) {
        self.state = HighlightState::default();
        self.showing_results = false;
        self.pending_replay = None;
        sink.clear_highlights();
        debug!("highlights cleared");
    }

    /// Layers one result's targets over the persistent set until the pointer
    /// leaves or the safety timer fires.
    pub fn hover_enter(
        &mut self,
        result: &SearchResult,
        data: &VisualizationData,
        sink: &mut dyn HighlightSink,
        now: f64,
    ) {
        self.state.secondary = map_result(result, data)
            .iter()
            .map(|target| target.restyled(HighlightStyle::Secondary))
            .collect();
        self.state.secondary_timer = Some(Deadline::after(now, self.config.secondary_timeout_secs));

        let layered = merge_targets([&self.state.persistent, &self.state.secondary]);
        apply_for_view(sink, &layered);
        debug!(secondary = self.state.secondary.len(), "hover highlight applied");
    }

    pub fn hover_leave(&mut self, sink: &mut dyn HighlightSink) {
        if self.state.secondary_timer.is_none() && self.state.secondary.is_empty() {
            return;
        }
        self.state.secondary.clear();
        self.state.secondary_timer = None;
        self.reapply(sink);
    }

    /// The rendered nodes are about to be rebuilt for `ticket`; hover state dies
    /// with them and the persistent set is replayed once the layout lands.
    pub fn view_switched(&mut self, ticket: LayoutTicket) {
        self.state.secondary.clear();
        self.state.secondary_timer = None;
        self.pending_replay = Some(ticket);
    }

    pub fn data_updated(&mut self, ticket: LayoutTicket) {
        self.view_switched(ticket);
    }

    pub fn layout_completed(&mut self, ticket: LayoutTicket, sink: &mut dyn HighlightSink) {
        if self.pending_replay != Some(ticket) {
            return;
        }
        self.pending_replay = None;
        if !self.showing_results && self.state.secondary.is_empty() {
            return;
        }

        // A hover that began while the layout was pending is still armed.
        let layered = merge_targets([&self.state.persistent, &self.state.secondary]);
        sink.clear_highlights();
        let matched = apply_for_view(sink, &layered);
        debug!(
            ?ticket,
            matched,
            secondary = self.state.secondary.len(),
            "highlights replayed after layout"
        );
    }

    /// Expires the hover timer and the toast. Call once per frame.
    pub fn poll(&mut self, now: f64, sink: &mut dyn HighlightSink) {
        if self
            .state
            .secondary_timer
            .is_some_and(|deadline| deadline.is_due(now))
        {
            debug!("hover highlight timed out");
            self.hover_leave(sink);
        }

        if self
            .toast
            .as_ref()
            .is_some_and(|toast| toast.expires_at.is_due(now))
        {
            self.toast = None;
        }
    }

    fn reapply(&mut self, sink: &mut dyn HighlightSink) -> usize {
        sink.clear_highlights();
        apply_for_view(sink, &self.state.persistent)
    }

    fn show_toast(&mut self, message: String, now: f64) {
        self.toast = Some(Toast {
            message,
            expires_at: Deadline::after(now, self.config.toast_secs),
        });
    }
}

fn apply_for_view(sink: &mut dyn HighlightSink, targets: &[HighlightTarget]) -> usize {
    let Some(kind) = sink.active_view().and_then(ViewKind::highlight_kind) else {
        return 0;
    };
    let visible = targets
        .iter()
        .filter(|target| target.kind == kind)
        .cloned()
        .collect::<Vec<_>>();
    if visible.is_empty() {
        return 0;
    }
    sink.apply_highlights(&visible)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::super::mapper::fixtures::{animal_data, bark, main_fn, result};
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        view: Option<ViewKind>,
        applied: Vec<HighlightTarget>,
        clears: usize,
    }

    impl RecordingSink {
        fn showing(view: ViewKind) -> Self {
            Self {
                view: Some(view),
                ..Self::default()
            }
        }
    }

    impl HighlightSink for RecordingSink {
        fn active_view(&self) -> Option<ViewKind> {
            self.view
        }

        fn apply_highlights(&mut self, targets: &[HighlightTarget]) -> usize {
            self.applied = targets.to_vec();
            targets.len()
        }

        fn clear_highlights(&mut self) {
            self.applied.clear();
            self.clears += 1;
        }
    }

    fn coordinator() -> Coordinator {
        Coordinator::new(HighlightConfig::default())
    }

    #[test]
    fn displaying_results_goes_active_and_marks_the_view() {
        let mut coordinator = coordinator();
        let mut sink = RecordingSink::showing(ViewKind::Inheritance);

        let matched = coordinator.results_displayed(&[bark()], &animal_data(), &mut sink, 0.0);

        assert_eq!(coordinator.phase(), Phase::Active);
        assert_eq!(matched, 2);
        assert!(
            sink.applied
                .iter()
                .all(|target| target.kind == crate::app::highlight::VisualizationKind::Inheritance)
        );
        assert!(coordinator.toast().is_some());
    }

    #[test]
    fn empty_result_set_takes_the_cleared_path() {
        let mut coordinator = coordinator();
        let mut sink = RecordingSink::showing(ViewKind::Inheritance);
        coordinator.results_displayed(&[bark()], &animal_data(), &mut sink, 0.0);

        coordinator.results_displayed(&[], &animal_data(), &mut sink, 1.0);

        assert_eq!(coordinator.phase(), Phase::Idle);
        assert!(coordinator.persistent().is_empty());
        assert!(sink.applied.is_empty());
    }

    #[test]
    fn unmatched_results_still_count_as_displayed() {
        let mut coordinator = coordinator();
        let mut sink = RecordingSink::showing(ViewKind::CallGraph);
        coordinator.results_displayed(&[result("ghost", None)], &animal_data(), &mut sink, 0.0);
        assert_eq!(coordinator.phase(), Phase::Active);
        assert!(coordinator.persistent().is_empty());
    }

    #[test]
    fn displaying_the_same_results_twice_is_idempotent() {
        let data = animal_data();
        let mut once = RecordingSink::showing(ViewKind::Inheritance);
        let mut first = coordinator();
        first.results_displayed(&[bark(), main_fn()], &data, &mut once, 0.0);

        let mut twice = RecordingSink::showing(ViewKind::Inheritance);
        let mut second = coordinator();
        second.results_displayed(&[bark(), main_fn()], &data, &mut twice, 0.0);
        second.results_displayed(&[bark(), main_fn()], &data, &mut twice, 0.5);

        assert_eq!(first.persistent(), second.persistent());
        assert_eq!(once.applied, twice.applied);
    }

    #[test]
    fn hover_layers_secondary_and_leave_restores_persistent() {
        let data = animal_data();
        let mut coordinator = coordinator();
        let mut sink = RecordingSink::showing(ViewKind::Inheritance);
        coordinator.results_displayed(&[main_fn()], &data, &mut sink, 0.0);
        let before = sink.applied.clone();

        coordinator.hover_enter(&bark(), &data, &mut sink, 1.0);
        assert_eq!(coordinator.phase(), Phase::Hovering);
        assert!(
            sink.applied
                .iter()
                .any(|target| target.style == HighlightStyle::Secondary)
        );
        assert!(before.iter().all(|target| sink.applied.contains(target)));

        coordinator.hover_leave(&mut sink);
        assert_eq!(coordinator.phase(), Phase::Active);
        assert_eq!(sink.applied, before);
    }

    #[test]
    fn hover_timer_expires_into_a_full_reset() {
        let data = animal_data();
        let mut coordinator = coordinator();
        let mut sink = RecordingSink::showing(ViewKind::Inheritance);
        coordinator.results_displayed(&[main_fn()], &data, &mut sink, 0.0);
        let before = sink.applied.clone();

        coordinator.hover_enter(&bark(), &data, &mut sink, 10.0);
        coordinator.poll(11.0, &mut sink);
        assert_eq!(coordinator.phase(), Phase::Hovering);

        coordinator.poll(11.6, &mut sink);
        assert_eq!(coordinator.phase(), Phase::Active);
        assert!(coordinator.secondary().is_empty());
        assert_eq!(sink.applied, before);
    }

    #[test]
    fn rearming_the_timer_replaces_the_previous_deadline() {
        let data = animal_data();
        let mut coordinator = coordinator();
        let mut sink = RecordingSink::showing(ViewKind::Inheritance);

        coordinator.hover_enter(&bark(), &data, &mut sink, 0.0);
        coordinator.hover_enter(&main_fn(), &data, &mut sink, 1.0);
        coordinator.poll(1.6, &mut sink);
        assert_eq!(coordinator.phase(), Phase::Hovering);
        coordinator.poll(2.6, &mut sink);
        assert_eq!(coordinator.phase(), Phase::Idle);
    }

    #[test]
    fn view_switch_replays_only_after_its_layout_completes() {
        let data = animal_data();
        let mut coordinator = coordinator();
        let mut sink = RecordingSink::showing(ViewKind::Inheritance);
        coordinator.results_displayed(&[bark()], &data, &mut sink, 0.0);

        coordinator.view_switched(LayoutTicket(7));
        sink.view = Some(ViewKind::CallGraph);
        sink.applied.clear();

        coordinator.layout_completed(LayoutTicket(6), &mut sink);
        assert!(sink.applied.is_empty());

        coordinator.layout_completed(LayoutTicket(7), &mut sink);
        assert_eq!(sink.applied.len(), 1);
        assert_eq!(sink.applied[0].node_id, "FunctionDef_6_4");

        sink.applied.clear();
        coordinator.layout_completed(LayoutTicket(7), &mut sink);
        assert!(sink.applied.is_empty());
    }

    #[test]
    fn hover_during_pending_layout_is_replayed_with_it() {
        let data = animal_data();
        let mut coordinator = coordinator();
        let mut sink = RecordingSink::showing(ViewKind::Inheritance);
        coordinator.results_displayed(&[bark()], &data, &mut sink, 0.0);

        coordinator.view_switched(LayoutTicket(8));
        coordinator.hover_enter(&main_fn(), &data, &mut sink, 0.2);
        sink.view = Some(ViewKind::CallGraph);
        sink.applied.clear();

        coordinator.layout_completed(LayoutTicket(8), &mut sink);
        assert_eq!(coordinator.phase(), Phase::Hovering);
        assert!(sink.applied.iter().any(|target| target.node_id == "FunctionDef_6_4"
            && target.style == HighlightStyle::Direct));
        assert!(sink.applied.iter().any(|target| target.node_id == "FunctionDef_9_0"
            && target.style == HighlightStyle::Secondary));

        coordinator.hover_leave(&mut sink);
        assert_eq!(sink.applied.len(), 1);
    }

    #[test]
    fn ast_view_never_receives_highlights() {
        let mut coordinator = coordinator();
        let mut sink = RecordingSink::showing(ViewKind::Ast);
        let matched = coordinator.results_displayed(&[bark()], &animal_data(), &mut sink, 0.0);
        assert_eq!(matched, 0);
        assert!(sink.applied.is_empty());
        assert!(!coordinator.persistent().is_empty());
    }

    #[test]
    fn toast_expires() {
        let mut coordinator = coordinator();
        let mut sink = RecordingSink::showing(ViewKind::Inheritance);
        coordinator.results_displayed(&[bark()], &animal_data(), &mut sink, 0.0);
        coordinator.poll(1.0, &mut sink);
        assert!(coordinator.toast().is_some());
        coordinator.poll(3.0, &mut sink);
        assert!(coordinator.toast().is_none());
    }

    proptest! {
        #[test]
        fn hover_round_trip_restores_the_persistent_set(
            persistent_picks in proptest::collection::vec(0usize..3, 0..4),
            hovered in 0usize..3,
            on_call_graph in any::<bool>(),
        ) {
            let data = animal_data();
            let pool = [bark(), main_fn(), result("ghost", None)];
            let results = persistent_picks.iter().map(|&i| pool[i].clone()).collect::<Vec<_>>();
            let view = if on_call_graph { ViewKind::CallGraph } else { ViewKind::Inheritance };

            let mut coordinator = coordinator();
            let mut sink = RecordingSink::showing(view);
            coordinator.results_displayed(&results, &data, &mut sink, 0.0);
            let persistent = coordinator.persistent().to_vec();
            let applied = sink.applied.clone();
            let phase = coordinator.phase();

            coordinator.hover_enter(&pool[hovered], &data, &mut sink, 0.5);
            coordinator.hover_leave(&mut sink);

            prop_assert_eq!(coordinator.persistent(), persistent.as_slice());
            prop_assert_eq!(&sink.applied, &applied);
            prop_assert_eq!(coordinator.phase(), phase);
        }
    }
}
