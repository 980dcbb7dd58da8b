mod app;
mod config;
mod loader;
mod logging;
mod model;
mod util;

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing::{error, info};

use crate::app::ViewKind;
use crate::config::VizConfig;
use crate::loader::Sources;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ViewArg {
    Ast,
    Inheritance,
    CallGraph,
}

impl From<ViewArg> for ViewKind {
    fn from(view: ViewArg) -> Self {
        match view {
            ViewArg::Ast => ViewKind::Ast,
            ViewArg::Inheritance => ViewKind::Inheritance,
            ViewArg::CallGraph => ViewKind::CallGraph,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// AST document (JSON).
    #[arg(long)]
    ast: Option<PathBuf>,
    /// Class and function listing (JSON).
    #[arg(long)]
    inheritance: Option<PathBuf>,
    /// Function and call listing (JSON).
    #[arg(long)]
    call_graph: Option<PathBuf>,
    /// Search response whose results are highlighted.
    #[arg(long)]
    results: Option<PathBuf>,
    /// Physics, layout and highlight tuning (JSON).
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = ViewArg::Inheritance)]
    view: ViewArg,
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> eframe::Result<()> {
    let args = Args::parse();
    logging::init_logging(args.verbose);

    let config = match VizConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            error!("failed to load config, using defaults: {err:#}");
            VizConfig::default()
        }
    };

    let sources = Sources {
        ast: args.ast,
        inheritance: args.inheritance,
        call_graph: args.call_graph,
        results: args.results,
    };
    if sources.is_empty() {
        info!("no input files given, starting with an empty workspace");
    }

    let view = ViewKind::from(args.view);
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "prism-viz",
        options,
        Box::new(move |cc| Ok(Box::new(app::PrismVizApp::new(cc, sources, config, view)))),
    )
}
