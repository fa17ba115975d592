use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use anyhow::Result;
use eframe::egui::{self, Context, Pos2, vec2};
use topology_canvas::view::Frame;
use topology_canvas::{SavedLayout, TopologySnapshot, TopologyView, ViewOptions};

mod canvas;
mod highlight;
mod panels;

/// Where the viewer reads its topology and keeps its layout.
#[derive(Clone, Debug)]
pub struct Sources {
    pub snapshot: PathBuf,
    pub layout_file: Option<PathBuf>,
}

pub struct TopologyApp {
    sources: Sources,
    options: ViewOptions,
    state: AppState,
    reload_rx: Option<Receiver<Result<LoadedTopology, String>>>,
}

enum AppState {
    Loading {
        rx: Receiver<Result<LoadedTopology, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct LoadedTopology {
    snapshot: TopologySnapshot,
    saved: SavedLayout,
}

struct ViewModel {
    view: TopologyView,
    sources: Sources,
    saved: SavedLayout,
    /// Snapshot waiting for the first canvas pass, when the viewport size
    /// is known.
    pending: Option<TopologySnapshot>,
    load_error: Option<String>,
    frame: Option<Frame>,
    tooltip: Option<Tooltip>,
    pointer_inside: bool,
    last_pointer: Option<Pos2>,
    search: String,
    status: Option<String>,
}

struct Tooltip {
    screen_pos: Pos2,
    text: String,
}

impl TopologyApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, sources: Sources, options: ViewOptions) -> Self {
        let state = Self::start_load(sources.clone());
        Self {
            sources,
            options,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(sources: Sources) -> Receiver<Result<LoadedTopology, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_sources(&sources).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(sources: Sources) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(sources),
        }
    }

    fn ready(&self, loaded: LoadedTopology, previous: Option<TopologyView>) -> AppState {
        AppState::Ready(Box::new(ViewModel::new(
            loaded,
            self.sources.clone(),
            self.options.clone(),
            previous,
        )))
    }
}

fn load_sources(sources: &Sources) -> Result<LoadedTopology> {
    let snapshot = TopologySnapshot::load(&sources.snapshot)?;
    let saved = match sources.layout_file.as_deref() {
        Some(path) if path.exists() => SavedLayout::load(path)?,
        _ => SavedLayout::default(),
    };
    tracing::info!(
        snapshot = %sources.snapshot.display(),
        nodes = snapshot.nodes.len(),
        edges = snapshot.edges.len(),
        saved_positions = saved.positions.len(),
        "snapshot read"
    );
    Ok(LoadedTopology { snapshot, saved })
}

impl ViewModel {
    fn new(
        loaded: LoadedTopology,
        sources: Sources,
        options: ViewOptions,
        previous: Option<TopologyView>,
    ) -> Self {
        // A reload reuses the live view so pan and zoom survive.
        let view = previous.unwrap_or_else(|| TopologyView::new(options, vec2(0.0, 0.0)));
        Self {
            view,
            sources,
            saved: loaded.saved,
            pending: Some(loaded.snapshot),
            load_error: None,
            frame: None,
            tooltip: None,
            pointer_inside: false,
            last_pointer: None,
            search: String::new(),
            status: None,
        }
    }

    fn snapshot_label(&self) -> String {
        file_label(&self.sources.snapshot)
    }

    /// Hand the live view to the next load; `load` replaces its simulation.
    fn into_view(self) -> TopologyView {
        self.view
    }
}

fn file_label(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl eframe::App for TopologyApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(Ok(loaded)) => transition = Some(Ok(loaded)),
                    Ok(Err(error)) => transition = Some(Err(error)),
                    Err(TryRecvError::Empty) => {}
                    Err(TryRecvError::Disconnected) => {
                        transition = Some(Err("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading topology snapshot...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
                ctx.request_repaint();
            }
            AppState::Error(error) => {
                let mut retry = false;
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load topology");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    retry = ui.button("Retry").clicked();
                });
                if retry {
                    self.state = Self::start_load(self.sources.clone());
                }
                return;
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &mut reload_requested, is_reloading);

                if let Some(error) = model.load_error.take() {
                    self.state = AppState::Error(error);
                    return;
                }

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(self.sources.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(result) => transition = Some(result),
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition =
                                Some(Err("Background load worker disconnected".to_owned()));
                        }
                    }
                }
            }
        }

        if let Some(result) = transition {
            self.reload_rx = None;
            let previous = match std::mem::replace(&mut self.state, AppState::Error(String::new())) {
                AppState::Ready(model) => Some((*model).into_view()),
                _ => None,
            };
            self.state = match result {
                Ok(loaded) => self.ready(loaded, previous),
                Err(error) => AppState::Error(error),
            };
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let AppState::Ready(model) = &mut self.state {
            model.view.shutdown();
        }
    }
}
