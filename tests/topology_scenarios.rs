//! End-to-end scenarios driven through the public `TopologyView` API.

use std::time::Duration;

use approx::assert_relative_eq;
use eframe::egui::{Pos2, pos2, vec2};
use topology_canvas::geometry::ViewTransform;
use topology_canvas::layout::{HierarchyDirection, LayoutKind, LayoutNode, compute_levels};
use topology_canvas::topology::{SnapshotEdge, SnapshotNode};
use topology_canvas::{
    GraphEvent, SavedLayout, TopologyKey, TopologySnapshot, TopologyView, ViewOptions,
};

fn node(id: &str) -> SnapshotNode {
    SnapshotNode {
        id: id.into(),
        name: id.into(),
        is_internal: true,
        ..SnapshotNode::default()
    }
}

fn edge(source: &str, target: &str) -> SnapshotEdge {
    SnapshotEdge {
        id: format!("{source}->{target}"),
        source: source.into(),
        target: target.into(),
        ..SnapshotEdge::default()
    }
}

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

fn key() -> TopologyKey {
    TopologyKey {
        application_id: Some("checkout".into()),
        hop_depth: 2,
        include_external: true,
    }
}

fn count<F: Fn(&GraphEvent) -> bool>(events: &[GraphEvent], predicate: F) -> usize {
    events.iter().filter(|event| predicate(event)).count()
}

/// Three nodes fixed at known graph positions with an identity transform.
fn pinned_view(entry_point: bool, edit_mode: bool) -> TopologyView {
    let mut a = node("A");
    a.is_entry_point = entry_point;
    let snapshot = TopologySnapshot {
        nodes: vec![a, node("B"), node("C")],
        edges: vec![edge("A", "B"), edge("B", "C")],
    };
    let mut saved = SavedLayout::default();
    saved.insert("A", pos2(0.0, 0.0));
    saved.insert("B", pos2(300.0, 300.0));
    saved.insert("C", pos2(300.0, 0.0));

    let options = ViewOptions {
        edit_mode,
        ..ViewOptions::default()
    };
    let mut view = TopologyView::new(options, vec2(800.0, 600.0));
    view.load(&snapshot, Some(&saved), key()).expect("loads");
    view.set_transform(ViewTransform::IDENTITY);
    view.drain_events();
    view
}

fn drag(view: &mut TopologyView, from: Pos2, to: Pos2) {
    view.pointer_down(from, ms(0));
    view.pointer_move(to, ms(16));
    view.pointer_up(to, ms(32));
}

#[test]
fn triangle_chain_descends_one_level_per_hop() {
    let snapshot = TopologySnapshot {
        nodes: vec![node("A"), node("B"), node("C")],
        edges: vec![edge("A", "B"), edge("B", "C")],
    };
    let mut options = ViewOptions {
        layout: LayoutKind::Hierarchical,
        ..ViewOptions::default()
    };
    options.layout_options.direction = HierarchyDirection::TopDown;
    let mut view = TopologyView::new(options, vec2(800.0, 600.0));
    view.load(&snapshot, None, key()).expect("loads");

    let y = |id: &str| view.graph().node(id).expect("node").pos.y;
    assert!(y("A") < y("B"));
    assert!(y("B") < y("C"));
    assert_relative_eq!(y("B") - y("A"), 150.0);
    assert_relative_eq!(y("C") - y("B"), 150.0);

    let nodes = ["A", "B", "C"].map(|id| LayoutNode {
        id,
        is_internal: true,
        group_key: None,
    });
    let levels = compute_levels(&nodes, &[(0, 1), (1, 2)]);
    assert_eq!(levels.level, vec![0, 1, 2]);
}

#[test]
fn orphan_edge_is_dropped_without_error() {
    let snapshot = TopologySnapshot {
        nodes: vec![node("A"), node("B")],
        edges: vec![edge("A", "B"), edge("A", "ghost")],
    };
    let mut view = TopologyView::new(ViewOptions::default(), vec2(800.0, 600.0));
    view.load(&snapshot, None, key()).expect("orphans are not errors");

    assert_eq!(view.graph().edges.len(), 1);
    assert_eq!(view.graph().dropped_edges, 1);
    let frame = view.compose_frame().expect("frame");
    let shapes: usize = frame.edge_batches.iter().map(|batch| batch.shapes.len()).sum();
    assert_eq!(shapes, 1);
}

#[test]
fn dragged_node_is_released_after_drop() {
    let mut view = pinned_view(false, false);
    drag(&mut view, pos2(0.0, 0.0), pos2(50.0, 50.0));

    let a = view.graph().node("A").expect("A");
    assert_eq!(a.pos, pos2(50.0, 50.0));
    assert_eq!(a.pin, None);

    let events = view.drain_events();
    assert!(events.contains(&GraphEvent::DragEnd {
        node_id: "A".into(),
        position: pos2(50.0, 50.0),
        moved: vec![("A".into(), pos2(50.0, 50.0))],
    }));
    assert_eq!(count(&events, |event| matches!(event, GraphEvent::NodeClick { .. })), 0);
}

#[test]
fn dragged_entry_point_stays_pinned() {
    let mut view = pinned_view(true, false);
    drag(&mut view, pos2(0.0, 0.0), pos2(50.0, 50.0));
    assert_eq!(view.graph().node("A").expect("A").pin, Some(pos2(50.0, 50.0)));

    for _ in 0..20 {
        view.tick();
    }
    assert_eq!(view.graph().node("A").expect("A").pos, pos2(50.0, 50.0));
}

#[test]
fn entry_point_grabbed_off_centre_is_pinned_at_release_point() {
    let mut view = pinned_view(true, false);
    drag(&mut view, pos2(6.0, 0.0), pos2(50.0, 50.0));

    let a = view.graph().node("A").expect("A");
    assert_eq!(a.pin, Some(pos2(50.0, 50.0)));
    assert_eq!(a.pos, pos2(50.0, 50.0));
}

#[test]
fn edit_mode_keeps_every_dragged_node_pinned() {
    let mut view = pinned_view(false, true);
    drag(&mut view, pos2(0.0, 0.0), pos2(50.0, 50.0));
    assert_eq!(view.graph().node("A").expect("A").pin, Some(pos2(50.0, 50.0)));
}

#[test]
fn multi_selection_drags_together() {
    let mut view = pinned_view(false, false);
    view.set_selection(["A".to_owned(), "C".to_owned()].into());
    drag(&mut view, pos2(0.0, 0.0), pos2(20.0, 10.0));

    assert_eq!(view.graph().node("A").expect("A").pos, pos2(20.0, 10.0));
    assert_eq!(view.graph().node("C").expect("C").pos, pos2(320.0, 10.0));
    assert_eq!(view.graph().node("B").expect("B").pos, pos2(300.0, 300.0));

    let events = view.drain_events();
    let moved = events.iter().find_map(|event| match event {
        GraphEvent::DragEnd { moved, .. } => Some(moved.len()),
        _ => None,
    });
    assert_eq!(moved, Some(2));
}

#[test]
fn five_pixels_is_still_a_click() {
    let mut view = pinned_view(false, false);
    drag(&mut view, pos2(0.0, 0.0), pos2(3.0, 4.0));
    let events = view.drain_events();
    assert_eq!(count(&events, |event| matches!(event, GraphEvent::NodeClick { .. })), 1);
    assert_eq!(count(&events, |event| matches!(event, GraphEvent::DragEnd { .. })), 0);
    assert_eq!(view.graph().node("A").expect("A").pos, pos2(0.0, 0.0));

    drag(&mut view, pos2(0.0, 0.0), pos2(4.0, 4.0));
    let events = view.drain_events();
    assert_eq!(count(&events, |event| matches!(event, GraphEvent::NodeClick { .. })), 0);
    assert_eq!(count(&events, |event| matches!(event, GraphEvent::DragEnd { .. })), 1);
}

#[test]
fn clicks_inside_the_window_become_one_double_click() {
    let mut view = pinned_view(false, false);
    let at = pos2(0.0, 0.0);
    view.pointer_down(at, ms(1_000));
    view.pointer_up(at, ms(1_050));
    view.pointer_down(at, ms(1_200));
    view.pointer_up(at, ms(1_300));

    let events = view.drain_events();
    assert_eq!(count(&events, |event| matches!(event, GraphEvent::NodeClick { .. })), 1);
    assert_eq!(
        count(&events, |event| matches!(event, GraphEvent::NodeDoubleClick { .. })),
        1
    );
}

#[test]
fn clicks_outside_the_window_stay_single() {
    let mut view = pinned_view(false, false);
    let at = pos2(0.0, 0.0);
    view.pointer_down(at, ms(1_000));
    view.pointer_up(at, ms(1_050));
    view.pointer_down(at, ms(1_300));
    view.pointer_up(at, ms(1_351));

    let events = view.drain_events();
    assert_eq!(count(&events, |event| matches!(event, GraphEvent::NodeClick { .. })), 2);
    assert_eq!(
        count(&events, |event| matches!(event, GraphEvent::NodeDoubleClick { .. })),
        0
    );
}

#[test]
fn shutdown_stops_ticking_and_painting() {
    let mut view = pinned_view(false, false);
    view.shutdown();
    assert!(!view.tick());
    view.set_transform(ViewTransform::IDENTITY.translate(vec2(5.0, 5.0)));
    assert!(view.render_if_pending().is_none());
}

#[test]
fn reload_with_new_graph_never_ticks_stale_nodes() {
    let mut view = pinned_view(false, false);
    for _ in 0..5 {
        view.tick();
    }
    let smaller = TopologySnapshot {
        nodes: vec![node("X")],
        edges: Vec::new(),
    };
    view.load(&smaller, None, key()).expect("loads");
    assert_eq!(view.graph().nodes.len(), 1);
    assert!(!view.tick());
    assert!(view.graph().node("A").is_none());
}
