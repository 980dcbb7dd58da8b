use eframe::egui::{self, Align, Align2, Color32, Context, FontId, Layout, vec2};
use tracing::debug;

use crate::config::VizConfig;
use crate::loader::Loaded;
use crate::model::SearchResponse;

use super::super::highlight::{Phase, RetrievalPath, ViewKind};
use super::super::render::{Viewport, paint_view};
use super::super::session::VizSession;
use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn new(loaded: Loaded, config: VizConfig, view: ViewKind, now: f64) -> Self {
        let mut model = Self {
            session: VizSession::new(config, view),
            analysis: loaded.analysis,
            config,
            viewport: Viewport::default(),
            query: None,
            offered_path: None,
            filter: String::new(),
            selected: None,
            hovered_row: None,
            fit_pending: true,
            status: None,
        };
        model.session.render(view, &model.analysis);
        if let Some(search) = loaded.search {
            model.show_search(search, now);
        }
        model
    }

    /// Swaps in a fresh analysis and re-renders the current view with the
    /// persistent highlights replayed on top.
    pub(in crate::app) fn replace_analysis(&mut self, loaded: Loaded, now: f64) {
        self.analysis = loaded.analysis;
        self.selected = None;
        self.hovered_row = None;
        self.status = None;
        self.session.notify_data_update();
        if let Some(search) = loaded.search {
            self.show_search(search, now);
        }
    }

    fn show_search(&mut self, search: SearchResponse, now: f64) {
        let data = search
            .visualization_data
            .unwrap_or_else(|| self.analysis.visualization.clone());
        self.query = search.query;
        self.offered_path = search.retrieval_path.as_ref().map(RetrievalPath::from);
        self.session.clear_retrieval_path();
        self.session.highlight_from_results(search.results, data, now);
    }

    pub(in crate::app) fn switch_view(&mut self, view: ViewKind) {
        if view == self.session.view_kind() && !self.session.is_layout_pending() {
            return;
        }
        self.selected = None;
        self.session.notify_view_switch(view);
    }

    pub(in crate::app) fn apply_config(&mut self) {
        self.session.set_config(self.config);
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        now: f64,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("prism-viz");
                    ui.separator();
                    let mut view = self.session.view_kind();
                    for kind in ViewKind::ALL {
                        ui.selectable_value(&mut view, kind, kind.label());
                    }
                    if view != self.session.view_kind() {
                        self.switch_view(view);
                    }
                    ui.separator();
                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload analysis"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    if ui.button("Fit").clicked() {
                        self.fit_pending = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        let phase = match self.session.phase() {
                            Phase::Idle => "idle",
                            Phase::Active => "highlighting",
                            Phase::Hovering => "hover",
                        };
                        ui.label(phase);
                        if let Some(view) = self.session.rendered() {
                            ui.label(format!(
                                "layout #{}  nodes: {}  edges: {}",
                                view.ticket.0,
                                view.nodes.len(),
                                view.edges.len()
                            ));
                        }
                        if let Some(status) = &self.status {
                            ui.colored_label(Color32::from_rgb(232, 120, 100), status);
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(360.0)
            .show(ctx, |ui| {
                self.draw_controls(ui);
                ui.separator();
                self.draw_results(ui, now);
            });

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| self.draw_graph(ui, now));
    }

    fn draw_graph(&mut self, ui: &mut egui::Ui, now: f64) {
        let delta_seconds = ui
            .ctx()
            .input(|input| input.stable_dt)
            .clamp(1.0 / 240.0, 1.0 / 20.0);
        let status = self.session.frame(now, delta_seconds, &self.analysis);
        if let Some(ticket) = status.completed {
            debug!(?ticket, "new layout on screen");
            self.fit_pending = true;
            self.selected = None;
        }

        let rect = ui.available_rect_before_wrap();
        let Some(view) = self.session.rendered_mut() else {
            ui.label("Nothing rendered yet.");
            return;
        };
        if self.fit_pending {
            self.viewport.fit(rect, view.size);
            self.fit_pending = false;
        }

        let outcome = paint_view(ui, view, &mut self.viewport, self.selected);
        if let Some(clicked) = outcome.clicked {
            self.selected = clicked;
        }

        if let Some(toast) = self.session.toast() {
            ui.painter().text(
                rect.center_bottom() - vec2(0.0, 24.0),
                Align2::CENTER_BOTTOM,
                toast,
                FontId::proportional(14.0),
                Color32::from_gray(235),
            );
        }

        let animating = status.moving
            || outcome.interacting
            || self.session.is_layout_pending()
            || self.session.toast().is_some()
            || self.session.phase() == Phase::Hovering;
        if animating {
            ui.ctx().request_repaint();
        }
    }
}
