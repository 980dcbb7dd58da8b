use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use eframe::egui::{self, Context};
use tracing::{debug, info, warn};

use crate::config::VizConfig;
use crate::loader::{Loaded, Sources, load_sources};
use crate::model::Analysis;

mod highlight;
mod layout;
mod physics;
mod render;
mod session;
mod ui;

pub use highlight::ViewKind;

use highlight::RetrievalPath;
use render::Viewport;
use session::VizSession;

pub struct PrismVizApp {
    sources: Sources,
    config: VizConfig,
    initial_view: ViewKind,
    state: AppState,
    load_tx: Sender<LoadResponse>,
    load_rx: Receiver<LoadResponse>,
    /// Ticket of the newest load request. Older responses are dropped.
    latest_request: u64,
    reloading: bool,
}

enum AppState {
    Loading,
    Ready(Box<ViewModel>),
    Error(String),
}

struct LoadResponse {
    request: u64,
    result: Result<Loaded, String>,
}

struct ViewModel {
    analysis: Analysis,
    session: VizSession,
    config: VizConfig,
    viewport: Viewport,
    query: Option<String>,
    /// Path the search backend sent along with the current results.
    offered_path: Option<RetrievalPath>,
    filter: String,
    selected: Option<usize>,
    hovered_row: Option<usize>,
    fit_pending: bool,
    status: Option<String>,
}

impl PrismVizApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        sources: Sources,
        config: VizConfig,
        initial_view: ViewKind,
    ) -> Self {
        let (load_tx, load_rx) = mpsc::channel();
        let mut app = Self {
            sources,
            config,
            initial_view,
            state: AppState::Loading,
            load_tx,
            load_rx,
            latest_request: 0,
            reloading: false,
        };
        app.spawn_load();
        app
    }

    fn spawn_load(&mut self) {
        self.latest_request += 1;
        let request = self.latest_request;
        let sources = self.sources.clone();
        let tx = self.load_tx.clone();
        debug!(request, "spawning background load");

        thread::spawn(move || {
            let result = load_sources(&sources).map_err(|error| format!("{error:#}"));
            let _ = tx.send(LoadResponse { request, result });
        });
    }

    fn poll_load(&mut self) -> Option<Result<Loaded, String>> {
        drain_latest(&self.load_rx, self.latest_request)
    }
}

/// Newest response for request `latest`, if it has arrived. Responses to older
/// requests are dropped.
fn drain_latest(rx: &Receiver<LoadResponse>, latest: u64) -> Option<Result<Loaded, String>> {
    let mut current = None;
    while let Ok(response) = rx.try_recv() {
        if response.request != latest {
            debug!(request = response.request, latest, "discarding stale load response");
            continue;
        }
        current = Some(response.result);
    }
    current
}

impl eframe::App for PrismVizApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let now = ctx.input(|input| input.time);

        if let Some(result) = self.poll_load() {
            self.reloading = false;
            let previous = std::mem::replace(&mut self.state, AppState::Loading);
            self.state = match (previous, result) {
                (AppState::Ready(mut model), Ok(loaded)) => {
                    model.replace_analysis(loaded, now);
                    AppState::Ready(model)
                }
                (AppState::Ready(mut model), Err(error)) => {
                    warn!(%error, "reload failed, keeping the last good analysis");
                    model.status = Some(format!("Reload failed: {error}"));
                    AppState::Ready(model)
                }
                (_, Ok(loaded)) => {
                    info!("initial load complete");
                    AppState::Ready(Box::new(ViewModel::new(
                        loaded,
                        self.config,
                        self.initial_view,
                        now,
                    )))
                }
                (_, Err(error)) => {
                    warn!(%error, "initial load failed");
                    AppState::Error(error)
                }
            };
        }

        let mut reload_requested = false;
        match &mut self.state {
            AppState::Loading => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading analysis...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
                ctx.request_repaint();
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load analysis");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        reload_requested = true;
                    }
                });
            }
            AppState::Ready(model) => {
                model.show(ctx, now, &mut reload_requested, self.reloading);
                if self.reloading {
                    ctx.request_repaint();
                }
            }
        }

        if reload_requested {
            if matches!(self.state, AppState::Error(_)) {
                self.state = AppState::Loading;
            }
            self.reloading = true;
            self.spawn_load();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(request: u64, result: Result<Loaded, String>) -> LoadResponse {
        LoadResponse { request, result }
    }

    fn empty() -> Loaded {
        Loaded {
            analysis: Analysis::default(),
            search: None,
        }
    }

    #[test]
    fn stale_responses_are_discarded() {
        let (tx, rx) = mpsc::channel();
        tx.send(response(2, Ok(empty()))).unwrap();
        tx.send(response(1, Err("old failure".to_owned()))).unwrap();

        assert!(matches!(drain_latest(&rx, 2), Some(Ok(_))));
        assert!(drain_latest(&rx, 2).is_none());
    }

    #[test]
    fn only_stale_responses_yield_nothing() {
        let (tx, rx) = mpsc::channel();
        tx.send(response(1, Ok(empty()))).unwrap();
        assert!(drain_latest(&rx, 3).is_none());
    }
}
