use anyhow::Result;
use eframe::egui::{Pos2, Rect, Vec2, pos2};

use super::{HoverTarget, TopologyKey, TopologyView};
use crate::geometry::ViewTransform;
use crate::layout::{LayoutKind, LayoutNode, apply_layout};
use crate::physics::{DRAG_ALPHA_TARGET, Simulation};
use crate::topology::{SavedLayout, TopologySnapshot, build_render_graph};

impl TopologyView {
    /// Replace the whole graph with `snapshot`.
    ///
    /// Positions come from `saved` where it has an entry and from the
    /// configured layout otherwise. The previous simulation is dropped before
    /// the new node arena exists. The view transform is refit only when `key`
    /// differs from the topology currently shown.
    pub fn load(
        &mut self,
        snapshot: &TopologySnapshot,
        saved: Option<&SavedLayout>,
        key: TopologyKey,
    ) -> Result<()> {
        let graph = build_render_graph(snapshot, &self.options.ingest)?;

        if let Some(simulation) = self.simulation.as_mut() {
            simulation.stop();
        }
        self.simulation = None;
        self.graph = graph;
        self.hover = HoverTarget::None;
        self.gesture = None;
        self.last_click = None;
        self.performance = self
            .options
            .performance_mode
            .is_active(self.graph.nodes.len(), self.graph.edges.len());

        let restored = self.place_nodes(self.options.layout, saved);
        if self.options.layout.is_force() {
            self.start_simulation(restored > 0);
        }
        self.rebuild_index();

        let reset_transform = self.topology_key.as_ref() != Some(&key);
        if reset_transform {
            self.fit_to_view();
            tracing::debug!(?key, k = self.transform.k, "view transform reset");
        }
        self.topology_key = Some(key);

        tracing::info!(
            nodes = self.graph.nodes.len(),
            edges = self.graph.edges.len(),
            dropped_edges = self.graph.dropped_edges,
            restored,
            layout = self.options.layout.label(),
            performance = self.performance,
            "topology loaded"
        );
        self.request_render();
        Ok(())
    }

    pub fn set_layout(&mut self, kind: LayoutKind) {
        if let Some(simulation) = self.simulation.as_mut() {
            simulation.stop();
        }
        self.simulation = None;
        self.options.layout = kind;
        self.gesture = None;

        self.place_nodes(kind, None);
        if kind.is_force() {
            self.start_simulation(false);
        }
        self.rebuild_index();
        self.fit_to_view();

        tracing::info!(layout = kind.label(), "layout applied");
        self.request_render();
    }

    pub fn relayout(&mut self) {
        self.set_layout(self.options.layout);
    }

    pub fn fit_to_view(&mut self) {
        if let Some(bounds) = self.node_bounds() {
            self.transform =
                ViewTransform::fit(bounds, self.viewport, self.options.layout_options.padding);
        } else {
            self.transform = ViewTransform::IDENTITY;
        }
        self.request_render();
    }

    pub fn focus_node(&mut self, id: &str) -> bool {
        let Some(node) = self.graph.node(id) else {
            return false;
        };
        let screen = self.transform.apply(node.pos);
        let centre = pos2(self.viewport.x * 0.5, self.viewport.y * 0.5);
        self.transform = self.transform.translate(centre - screen);
        self.request_render();
        true
    }

    pub fn node_bounds(&self) -> Option<Rect> {
        if self.graph.nodes.is_empty() {
            return None;
        }
        let points: Vec<Pos2> = self.graph.nodes.iter().map(|node| node.pos).collect();
        Some(Rect::from_points(&points))
    }

    fn place_nodes(&mut self, kind: LayoutKind, saved: Option<&SavedLayout>) -> usize {
        let layout_nodes: Vec<LayoutNode<'_>> = self
            .graph
            .nodes
            .iter()
            .map(|node| LayoutNode {
                id: &node.id,
                is_internal: node.is_internal,
                group_key: node.group_key.as_deref(),
            })
            .collect();
        let result = apply_layout(
            kind,
            &layout_nodes,
            &self.graph.link_pairs(),
            self.viewport.x,
            self.viewport.y,
            &self.options.layout_options,
        );

        let mut restored = 0;
        for node in &mut self.graph.nodes {
            let seeded = result.positions.get(&node.id).copied().unwrap_or(Pos2::ZERO);
            node.pos = match saved.and_then(|layout| layout.get(&node.id)) {
                Some(position) => {
                    restored += 1;
                    position
                }
                None => seeded,
            };
            node.velocity = Vec2::ZERO;
            node.pin = node.is_entry_point.then_some(node.pos);
        }
        restored
    }

    fn start_simulation(&mut self, warm_start: bool) {
        let center = pos2(self.viewport.x * 0.5, self.viewport.y * 0.5);
        let params = self.options.simulation_params(
            self.graph.nodes.len(),
            self.graph.edges.len(),
            center,
        );
        let mut simulation =
            Simulation::new(params, &self.graph.link_pairs(), self.graph.nodes.len());
        if warm_start {
            // Restored positions only need settling, not a full relaxation.
            simulation.set_alpha(DRAG_ALPHA_TARGET);
        }
        self.simulation = Some(simulation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewOptions;
    use crate::topology::{SnapshotEdge, SnapshotNode};
    use eframe::egui::vec2;

    fn snapshot() -> TopologySnapshot {
        let node = |id: &str, entry: bool| SnapshotNode {
            id: id.into(),
            name: id.into(),
            is_internal: true,
            is_entry_point: entry,
            ..SnapshotNode::default()
        };
        let edge = |id: &str, source: &str, target: &str| SnapshotEdge {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            ..SnapshotEdge::default()
        };
        TopologySnapshot {
            nodes: vec![node("gw", true), node("web", false), node("db", false)],
            edges: vec![edge("e1", "gw", "web"), edge("e2", "web", "db")],
        }
    }

    fn key(hops: u32) -> TopologyKey {
        TopologyKey {
            application_id: Some("shop".into()),
            hop_depth: hops,
            include_external: false,
        }
    }

    #[test]
    fn force_load_pins_entry_points_and_starts_simulation() {
        let mut view = TopologyView::new(ViewOptions::default(), vec2(800.0, 600.0));
        view.load(&snapshot(), None, key(1)).expect("loads");

        let gw = view.graph().node("gw").expect("gw");
        assert_eq!(gw.pin, Some(gw.pos));
        assert!(view.graph().node("web").expect("web").pin.is_none());
        let simulation = view.simulation().expect("force layout simulates");
        assert_eq!(simulation.alpha(), 1.0);
        assert!(view.has_pending_render());
    }

    #[test]
    fn saved_positions_override_seeds_and_warm_start() {
        let mut saved = SavedLayout::default();
        saved.insert("db", pos2(-40.0, 12.0));
        let mut view = TopologyView::new(ViewOptions::default(), vec2(800.0, 600.0));
        view.load(&snapshot(), Some(&saved), key(1)).expect("loads");

        assert_eq!(view.graph().node("db").expect("db").pos, pos2(-40.0, 12.0));
        let simulation = view.simulation().expect("simulation");
        assert!((simulation.alpha() - DRAG_ALPHA_TARGET).abs() < 1e-6);
    }

    #[test]
    fn static_layouts_do_not_simulate() {
        let options = ViewOptions {
            layout: LayoutKind::Hierarchical,
            ..ViewOptions::default()
        };
        let mut view = TopologyView::new(options, vec2(800.0, 600.0));
        view.load(&snapshot(), None, key(1)).expect("loads");
        assert!(view.simulation().is_none());
        assert!(!view.tick());
    }

    #[test]
    fn transform_survives_reload_of_the_same_topology() {
        let mut view = TopologyView::new(ViewOptions::default(), vec2(800.0, 600.0));
        view.load(&snapshot(), None, key(1)).expect("loads");
        let panned = view.transform().translate(vec2(120.0, -30.0));
        view.set_transform(panned);

        view.load(&snapshot(), None, key(1)).expect("reloads");
        assert_eq!(view.transform(), panned);

        view.load(&snapshot(), None, key(2)).expect("new topology");
        assert_ne!(view.transform(), panned);
    }

    #[test]
    fn failed_load_keeps_the_previous_graph() {
        let mut view = TopologyView::new(ViewOptions::default(), vec2(800.0, 600.0));
        view.load(&snapshot(), None, key(1)).expect("loads");

        let mut broken = snapshot();
        broken.nodes.push(broken.nodes[0].clone());
        assert!(view.load(&broken, None, key(1)).is_err());
        assert_eq!(view.graph().nodes.len(), 3);
        assert!(view.simulation().is_some());
    }

    #[test]
    fn focus_centres_the_node() {
        let mut view = TopologyView::new(ViewOptions::default(), vec2(800.0, 600.0));
        view.load(&snapshot(), None, key(1)).expect("loads");
        assert!(view.focus_node("db"));
        let db = view.graph().node("db").expect("db").pos;
        let screen = view.transform().apply(db);
        assert!((screen.x - 400.0).abs() < 1e-3 && (screen.y - 300.0).abs() < 1e-3);
        assert!(!view.focus_node("missing"));
    }

    #[test]
    fn switching_layout_replaces_the_simulation() {
        let mut view = TopologyView::new(ViewOptions::default(), vec2(800.0, 600.0));
        view.load(&snapshot(), None, key(1)).expect("loads");
        view.set_layout(LayoutKind::Grid);
        assert!(view.simulation().is_none());
        assert_eq!(view.options().layout, LayoutKind::Grid);

        view.set_layout(LayoutKind::Force);
        assert!(view.simulation().is_some_and(|simulation| simulation.is_running()));
    }
}
