use std::collections::HashSet;

use eframe::egui::{self, Align, Context, Layout, Ui};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use topology_canvas::layout::LayoutKind;

use super::ViewModel;

const SEARCH_RESULT_LIMIT: usize = 40;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

impl ViewModel {
    pub(in crate::app) fn show(&mut self, ctx: &Context, reload_requested: &mut bool, is_loading: bool) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("topology-canvas");
                    ui.separator();
                    ui.label(self.snapshot_label());
                    let graph = self.view.graph();
                    ui.label(format!("nodes: {}", graph.nodes.len()));
                    ui.label(format!("edges: {}", graph.edges.len()));
                    if graph.dropped_edges > 0 {
                        ui.label(format!("dropped: {}", graph.dropped_edges));
                    }
                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload snapshot"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    if ui.button("Fit").clicked() {
                        self.view.fit_to_view();
                    }
                    if ui.button("Re-layout").clicked() {
                        self.view.relayout();
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(self.frame_stats_text());
                        if let Some(status) = &self.status {
                            ui.label(status.as_str());
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_canvas(ui));
    }

    fn frame_stats_text(&self) -> String {
        let mode = if self.view.is_performance_mode() {
            "performance"
        } else {
            "quality"
        };
        let running = self
            .view
            .simulation()
            .is_some_and(|simulation| simulation.is_running());
        let Some(frame) = &self.frame else {
            return mode.to_owned();
        };
        format!(
            "{mode}{} | zoom {:.2} | drawn {}/{} nodes, {}/{} edges",
            if running { " | simulating" } else { "" },
            self.view.transform().k,
            frame.stats.nodes_drawn,
            frame.stats.nodes_drawn + frame.stats.nodes_culled,
            frame.stats.edges_drawn,
            frame.stats.edges_drawn + frame.stats.edges_culled,
        )
    }

    fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Layout");
        let current = self.view.options().layout;
        let mut selected_layout = current;
        egui::ComboBox::from_id_salt("layout_kind")
            .selected_text(current.label())
            .show_ui(ui, |ui| {
                for kind in LayoutKind::ALL {
                    ui.selectable_value(&mut selected_layout, kind, kind.label());
                }
            });
        if selected_layout != current {
            self.view.set_layout(selected_layout);
        }

        let mut edit_mode = self.view.options().edit_mode;
        if ui
            .checkbox(&mut edit_mode, "Keep dragged nodes pinned")
            .changed()
        {
            self.view.set_edit_mode(edit_mode);
        }
        match &self.sources.layout_file {
            Some(path) => ui.small(format!("Positions saved to {}", path.display())),
            None => ui.small("Positions are not persisted (no --layout-file)"),
        };

        ui.separator();
        ui.heading("Search");
        ui.text_edit_singleline(&mut self.search);
        self.draw_search_results(ui);

        ui.separator();
        if self.view.highlight().is_active() && ui.button("Clear path highlight").clicked() {
            self.view.set_highlight(Default::default());
            self.status = None;
        }
        ui.small("Double-click a node to trace its upstream and downstream paths.");
    }

    fn draw_search_results(&mut self, ui: &mut Ui) {
        let query = self.search.trim();
        if query.is_empty() {
            return;
        }

        let matcher = SkimMatcherV2::default();
        let mut matches = self
            .view
            .graph()
            .nodes
            .iter()
            .filter_map(|node| {
                let score = fuzzy_match_score(&matcher, node.label(), query)
                    .or_else(|| fuzzy_match_score(&matcher, &node.id, query))?;
                Some((score, node.id.clone(), node.label().to_owned()))
            })
            .collect::<Vec<_>>();
        matches.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

        if matches.is_empty() {
            ui.label("No matching nodes.");
            return;
        }

        let mut picked = None;
        egui::ScrollArea::vertical()
            .max_height(320.0)
            .show(ui, |ui| {
                for (_, id, label) in matches.iter().take(SEARCH_RESULT_LIMIT) {
                    let selected = self.view.selected().contains(id);
                    if ui.selectable_label(selected, label).clicked() {
                        picked = Some(id.clone());
                    }
                }
            });
        if matches.len() > SEARCH_RESULT_LIMIT {
            ui.small(format!("{} more", matches.len() - SEARCH_RESULT_LIMIT));
        }

        if let Some(id) = picked {
            self.view.focus_node(&id);
            self.view.set_selection(HashSet::from([id]));
        }
    }
}
