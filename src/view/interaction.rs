use std::time::Duration;

use eframe::egui::{Pos2, Vec2};

use super::{GraphEvent, HoverTarget, TopologyView};
use crate::geometry::ViewTransform;
use crate::physics::DRAG_ALPHA_TARGET;

pub const DRAG_THRESHOLD: f32 = 5.0;
pub const DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(300);
pub const EDGE_HOVER_THRESHOLD: f32 = 8.0;

const WHEEL_ZOOM_RATE: f32 = 0.002;
const DOUBLE_CLICK_ZOOM: f32 = 2.0;

#[derive(Clone, Debug)]
pub(super) struct PointerGesture {
    down_screen: Pos2,
    down_graph: Pos2,
    dragging: bool,
    kind: GestureKind,
}

#[derive(Clone, Debug)]
enum GestureKind {
    Node {
        anchor: usize,
        prior_pin: Option<Pos2>,
        /// Every node the drag moves, with its position at press time.
        starts: Vec<(usize, Pos2)>,
    },
    Pan {
        start: ViewTransform,
    },
}

#[derive(Clone, Copy, Debug)]
pub(super) struct LastClick {
    node: usize,
    at: Duration,
}

impl TopologyView {
    pub fn pointer_down(&mut self, screen: Pos2, _time: Duration) {
        let graph = self.transform.invert(screen);
        let kind = match self.index.find_nearest(graph) {
            Some(anchor) => {
                let node = &mut self.graph.nodes[anchor];
                let prior_pin = node.pin;
                // Pin right away so the simulation does not pull the node
                // while the gesture is still undecided.
                node.pin = Some(node.pos);

                let anchor_pos = node.pos;
                let multi = self.selected.len() > 1 && self.selected.contains(&node.id);
                let starts = if multi {
                    self.graph
                        .nodes
                        .iter()
                        .enumerate()
                        .filter(|(_, node)| self.selected.contains(&node.id))
                        .map(|(index, node)| (index, node.pos))
                        .collect()
                } else {
                    vec![(anchor, anchor_pos)]
                };
                GestureKind::Node {
                    anchor,
                    prior_pin,
                    starts,
                }
            }
            None => GestureKind::Pan {
                start: self.transform,
            },
        };

        self.gesture = Some(PointerGesture {
            down_screen: screen,
            down_graph: graph,
            dragging: false,
            kind,
        });
    }

    pub fn pointer_move(&mut self, screen: Pos2, _time: Duration) {
        let Some(gesture) = self.gesture.as_mut() else {
            self.update_hover(screen);
            return;
        };

        if !gesture.dragging {
            if screen.distance(gesture.down_screen) <= DRAG_THRESHOLD {
                return;
            }
            gesture.dragging = true;
            if let GestureKind::Node { anchor, .. } = gesture.kind {
                tracing::trace!(node = %self.graph.nodes[anchor].id, "drag started");
                if let Some(simulation) = self.simulation.as_mut() {
                    simulation.set_alpha_target(DRAG_ALPHA_TARGET);
                    simulation.restart();
                }
            }
        }

        match &gesture.kind {
            GestureKind::Node { anchor, starts, .. } => {
                // The anchor lands under the pointer; companions keep their
                // offset from it.
                let anchor_start = starts
                    .iter()
                    .find(|(index, _)| index == anchor)
                    .map_or(gesture.down_graph, |&(_, start)| start);
                let delta = self.transform.invert(screen) - anchor_start;
                for &(index, start) in starts {
                    let node = &mut self.graph.nodes[index];
                    let position = start + delta;
                    node.pos = position;
                    node.pin = Some(position);
                    node.velocity = Vec2::ZERO;
                }
                self.rebuild_index();
            }
            GestureKind::Pan { start } => {
                self.transform = start.translate(screen - gesture.down_screen);
            }
        }
        self.request_render();
    }

    pub fn pointer_up(&mut self, screen: Pos2, time: Duration) {
        let Some(gesture) = self.gesture.take() else {
            return;
        };

        match gesture.kind {
            GestureKind::Node {
                anchor,
                prior_pin,
                starts,
            } => {
                if gesture.dragging {
                    self.finish_drag(anchor, &starts);
                } else {
                    self.graph.nodes[anchor].pin = prior_pin;
                    self.resolve_click(anchor, time);
                }
            }
            GestureKind::Pan { .. } => {
                if !gesture.dragging {
                    self.last_click = None;
                    self.push_event(GraphEvent::BackgroundClick);
                }
            }
        }

        self.update_hover(screen);
        self.request_render();
    }

    pub fn pointer_leave(&mut self) {
        if let Some(PointerGesture {
            kind: GestureKind::Node { starts, .. },
            ..
        }) = self.gesture.take()
        {
            for (index, _) in starts {
                let node = &mut self.graph.nodes[index];
                node.pin = node.is_entry_point.then_some(node.pos);
            }
            self.release_simulation();
            self.rebuild_index();
        }
        self.hover = HoverTarget::None;
        self.push_event(GraphEvent::HoverCleared);
        self.request_render();
    }

    pub fn wheel(&mut self, screen: Pos2, delta_y: f32) {
        if delta_y == 0.0 {
            return;
        }
        let factor = 2f32.powf(-delta_y * WHEEL_ZOOM_RATE);
        self.transform = self.transform.zoom_around(screen, factor);
        self.request_render();
    }

    pub fn double_click(&mut self, screen: Pos2) {
        if !self.options.double_click_zoom {
            return;
        }
        self.transform = self.transform.zoom_around(screen, DOUBLE_CLICK_ZOOM);
        self.request_render();
    }

    fn finish_drag(&mut self, anchor: usize, starts: &[(usize, Pos2)]) {
        let keep_pins = self.options.edit_mode;
        let mut moved = Vec::with_capacity(starts.len());
        for &(index, _) in starts {
            let node = &mut self.graph.nodes[index];
            if !keep_pins && !node.is_entry_point {
                node.pin = None;
            }
            moved.push((node.id.clone(), node.pos));
        }
        self.release_simulation();
        self.last_click = None;

        let node = &self.graph.nodes[anchor];
        let event = GraphEvent::DragEnd {
            node_id: node.id.clone(),
            position: node.pos,
            moved,
        };
        self.push_event(event);
    }

    fn resolve_click(&mut self, node: usize, time: Duration) {
        let node_id = self.graph.nodes[node].id.clone();
        let is_double = self.last_click.is_some_and(|last| {
            last.node == node && time.saturating_sub(last.at) <= DOUBLE_CLICK_WINDOW
        });

        if is_double {
            self.last_click = None;
            self.push_event(GraphEvent::NodeDoubleClick { node_id });
        } else {
            self.last_click = Some(LastClick { node, at: time });
            self.push_event(GraphEvent::NodeClick { node_id });
        }
    }

    fn release_simulation(&mut self) {
        if let Some(simulation) = self.simulation.as_mut() {
            simulation.set_alpha_target(0.0);
        }
    }

    fn update_hover(&mut self, screen: Pos2) {
        let target = self.hit_test(screen);
        if target == self.hover {
            return;
        }
        self.hover = target;

        let event = match target {
            HoverTarget::Node(index) => GraphEvent::NodeHover {
                node_id: self.graph.nodes[index].id.clone(),
                screen_pos: screen,
            },
            HoverTarget::Edge(index) => GraphEvent::EdgeHover {
                edge_id: self.graph.edges[index].id.clone(),
                screen_pos: screen,
            },
            HoverTarget::None => GraphEvent::HoverCleared,
        };
        self.push_event(event);
        self.request_render();
    }

    pub fn hit_test(&self, screen: Pos2) -> HoverTarget {
        let graph = self.transform.invert(screen);
        if let Some(node) = self.index.find_nearest(graph) {
            return HoverTarget::Node(node);
        }

        let threshold = EDGE_HOVER_THRESHOLD / self.transform.k;
        self.graph
            .edges
            .iter()
            .enumerate()
            .map(|(index, edge)| (index, self.edge_shape(edge).distance_to(graph)))
            .filter(|&(_, distance)| distance <= threshold)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map_or(HoverTarget::None, |(index, _)| HoverTarget::Edge(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewOptions;
    use crate::layout::LayoutKind;
    use crate::topology::{SnapshotEdge, SnapshotNode, TopologySnapshot};
    use crate::view::TopologyKey;
    use approx::assert_relative_eq;
    use eframe::egui::{pos2, vec2};

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn view() -> TopologyView {
        let options = ViewOptions {
            layout: LayoutKind::Grid,
            ..ViewOptions::default()
        };
        let mut view = TopologyView::new(options, vec2(800.0, 600.0));
        let node = |id: &str| SnapshotNode {
            id: id.into(),
            name: id.into(),
            is_internal: true,
            ..SnapshotNode::default()
        };
        let snapshot = TopologySnapshot {
            nodes: vec![node("a"), node("b")],
            edges: vec![SnapshotEdge {
                id: "a-b".into(),
                source: "a".into(),
                target: "b".into(),
                ..SnapshotEdge::default()
            }],
        };
        view.load(&snapshot, None, TopologyKey::default())
            .expect("loads");
        view.set_transform(ViewTransform::IDENTITY);
        view.drain_events();
        view
    }

    fn screen_of(view: &TopologyView, id: &str) -> Pos2 {
        let node = view.graph().node(id).expect("node");
        view.transform().apply(node.pos)
    }

    #[test]
    fn small_movement_is_a_click() {
        let mut view = view();
        let at = screen_of(&view, "a");
        view.pointer_down(at, ms(0));
        view.pointer_move(at + vec2(3.0, 3.0), ms(10));
        view.pointer_up(at + vec2(3.0, 3.0), ms(20));

        let events = view.drain_events();
        assert!(events.contains(&GraphEvent::NodeClick {
            node_id: "a".into()
        }));
        assert!(!events.iter().any(|event| matches!(event, GraphEvent::DragEnd { .. })));
        assert_eq!(view.graph().node("a").expect("a").pin, None);
    }

    #[test]
    fn drag_past_threshold_suppresses_click() {
        let mut view = view();
        let start = screen_of(&view, "a");
        view.pointer_down(start, ms(0));
        view.pointer_move(start + vec2(30.0, 0.0), ms(10));
        view.pointer_up(start + vec2(30.0, 0.0), ms(20));

        let events = view.drain_events();
        assert!(!events.iter().any(|event| matches!(event, GraphEvent::NodeClick { .. })));
        let Some(GraphEvent::DragEnd { node_id, position, moved }) = events
            .into_iter()
            .find(|event| matches!(event, GraphEvent::DragEnd { .. }))
        else {
            panic!("expected a drag end");
        };
        assert_eq!(node_id, "a");
        assert_eq!(moved, vec![("a".to_owned(), position)]);
        assert_relative_eq!(position.x, start.x + 30.0, epsilon = 1e-3);
        assert_relative_eq!(position.y, start.y, epsilon = 1e-3);
    }

    #[test]
    fn off_centre_grab_puts_the_node_under_the_pointer() {
        let mut view = view();
        let grab = screen_of(&view, "a") + vec2(6.0, 0.0);
        let target = pos2(50.0, 50.0);
        view.pointer_down(grab, ms(0));
        view.pointer_move(target, ms(10));

        let a = view.graph().node("a").expect("a");
        assert_eq!(a.pos, target);
        assert_eq!(a.pin, Some(target));

        view.pointer_up(target, ms(20));
        assert!(view.drain_events().iter().any(|event| matches!(
            event,
            GraphEvent::DragEnd { position, .. } if *position == target
        )));
    }

    #[test]
    fn background_press_pans_and_click_reports_background() {
        let mut view = view();
        let empty = pos2(5.0, 5.0);
        view.pointer_down(empty, ms(0));
        view.pointer_up(empty, ms(10));
        assert!(view.drain_events().contains(&GraphEvent::BackgroundClick));

        view.pointer_down(empty, ms(100));
        view.pointer_move(empty + vec2(40.0, 10.0), ms(110));
        view.pointer_up(empty + vec2(40.0, 10.0), ms(120));
        assert_eq!(view.transform().x, 40.0);
        assert_eq!(view.transform().y, 10.0);
        assert!(!view.drain_events().contains(&GraphEvent::BackgroundClick));
    }

    #[test]
    fn double_click_needs_the_same_node() {
        let mut view = view();
        let a = screen_of(&view, "a");
        let b = screen_of(&view, "b");
        view.pointer_down(a, ms(0));
        view.pointer_up(a, ms(10));
        view.pointer_down(b, ms(100));
        view.pointer_up(b, ms(110));

        let clicks = view
            .drain_events()
            .into_iter()
            .filter(|event| matches!(event, GraphEvent::NodeClick { .. }))
            .count();
        assert_eq!(clicks, 2);
    }

    #[test]
    fn leave_cancels_drag_and_clears_hover() {
        let mut view = view();
        let at = screen_of(&view, "a");
        view.pointer_move(at, ms(0));
        assert_eq!(view.hover(), HoverTarget::Node(0));
        view.pointer_down(at, ms(5));
        view.pointer_move(at + vec2(50.0, 0.0), ms(10));
        view.pointer_leave();

        let events = view.drain_events();
        assert_eq!(events.last(), Some(&GraphEvent::HoverCleared));
        assert!(!events.iter().any(|event| matches!(event, GraphEvent::DragEnd { .. })));
        assert_eq!(view.hover(), HoverTarget::None);
        assert_eq!(view.graph().node("a").expect("a").pin, None);

        // The gesture is gone: a release afterwards does nothing.
        view.pointer_up(at, ms(20));
        assert!(!view.drain_events().iter().any(|event| matches!(event, GraphEvent::NodeClick { .. })));
    }

    #[test]
    fn hovering_an_edge_reports_it() {
        let mut view = view();
        let a = screen_of(&view, "a");
        let b = screen_of(&view, "b");
        // Grid edges are curved at k = 1; sample the drawn curve itself.
        let shape = view
            .edge_shape(&view.graph().edges[0])
            .transformed(view.transform());
        let on_curve = shape.midpoint();
        assert!(on_curve.distance(a) > 30.0 && on_curve.distance(b) > 30.0);

        view.pointer_move(on_curve, ms(0));
        assert_eq!(view.hover(), HoverTarget::Edge(0));
        assert!(matches!(
            view.drain_events().as_slice(),
            [GraphEvent::EdgeHover { edge_id, .. }] if edge_id == "a-b"
        ));
    }

    #[test]
    fn wheel_zoom_is_clamped() {
        let mut view = view();
        for _ in 0..100 {
            view.wheel(pos2(400.0, 300.0), -500.0);
        }
        assert_eq!(view.transform().k, crate::geometry::MAX_ZOOM);
        view.double_click(pos2(400.0, 300.0));
        assert_eq!(view.transform().k, crate::geometry::MAX_ZOOM);
    }
}
