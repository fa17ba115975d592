mod app;

use std::path::PathBuf;

use clap::Parser;
use topology_canvas::ViewOptions;
use topology_canvas::layout::LayoutKind;
use topology_canvas::physics::PerformanceMode;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Topology snapshot JSON (`nodes` and `edges`).
    snapshot: PathBuf,
    /// Saved node positions; read on load and rewritten after every drag.
    #[arg(long)]
    layout_file: Option<PathBuf>,
    /// View options JSON.
    #[arg(long)]
    options: Option<PathBuf>,
    #[arg(long, value_enum)]
    layout: Option<LayoutKind>,
    #[arg(long, value_enum)]
    performance: Option<PerformanceMode>,
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut options = match args.options.as_deref().map(ViewOptions::load).transpose() {
        Ok(options) => options.unwrap_or_default(),
        Err(error) => {
            tracing::error!("{error:#}");
            ViewOptions::default()
        }
    };
    if let Some(layout) = args.layout {
        options.layout = layout;
    }
    if let Some(performance) = args.performance {
        options.performance_mode = performance;
    }

    let native_options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "topology-canvas",
        native_options,
        Box::new(move |cc| {
            Ok(Box::new(app::TopologyApp::new(
                cc,
                app::Sources {
                    snapshot: args.snapshot.clone(),
                    layout_file: args.layout_file.clone(),
                },
                options.clone(),
            )))
        }),
    )
}
