use std::collections::{HashMap, HashSet};

use eframe::egui::{Color32, Pos2, Vec2, vec2};
use serde::{Deserialize, Serialize};

use crate::config::ViewOptions;
use crate::geometry::{EdgeShape, ViewTransform};
use crate::physics::Simulation;
use crate::spatial::SpatialIndex;
use crate::topology::{RenderEdge, RenderGraph};

mod interaction;
mod load;
mod render;
mod style;

pub use interaction::{DOUBLE_CLICK_WINDOW, DRAG_THRESHOLD, EDGE_HOVER_THRESHOLD};
pub use render::{
    ArrowHead, EDGE_CULL_MARGIN, EdgeBatch, Frame, FrameStats, ICON_SIZE, Label, NODE_CULL_MARGIN,
    NodeSprite, lod,
};

/// Which topology a view shows. A reload with a different key resets the
/// view transform; the same key keeps the user's pan and zoom.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TopologyKey {
    pub application_id: Option<String>,
    pub hop_depth: u32,
    pub include_external: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HighlightSelection {
    pub upstream: HashSet<String>,
    pub downstream: HashSet<String>,
    pub edges: HashSet<String>,
}

impl HighlightSelection {
    pub fn is_active(&self) -> bool {
        !self.upstream.is_empty() || !self.downstream.is_empty() || !self.edges.is_empty()
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.upstream.contains(id) || self.downstream.contains(id)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum GraphEvent {
    NodeClick {
        node_id: String,
    },
    NodeDoubleClick {
        node_id: String,
    },
    BackgroundClick,
    NodeHover {
        node_id: String,
        screen_pos: Pos2,
    },
    EdgeHover {
        edge_id: String,
        screen_pos: Pos2,
    },
    HoverCleared,
    /// A drag finished; `moved` lists every node the drag translated.
    DragEnd {
        node_id: String,
        position: Pos2,
        moved: Vec<(String, Pos2)>,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HoverTarget {
    #[default]
    None,
    Node(usize),
    Edge(usize),
}

#[derive(Debug, Default)]
pub struct FrameScheduler {
    pending: bool,
    cancelled: bool,
}

impl FrameScheduler {
    pub fn request(&mut self) -> bool {
        if self.pending || self.cancelled {
            return false;
        }
        self.pending = true;
        true
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    pub fn cancel(&mut self) {
        self.pending = false;
        self.cancelled = true;
    }
}

pub struct TopologyView {
    options: ViewOptions,
    group_colors: HashMap<String, Color32>,
    graph: RenderGraph,
    simulation: Option<Simulation>,
    index: SpatialIndex,
    transform: ViewTransform,
    viewport: Vec2,
    topology_key: Option<TopologyKey>,
    performance: bool,
    highlight: HighlightSelection,
    selected: HashSet<String>,
    hover: HoverTarget,
    gesture: Option<interaction::PointerGesture>,
    last_click: Option<interaction::LastClick>,
    scheduler: FrameScheduler,
    events: Vec<GraphEvent>,
}

impl TopologyView {
    pub fn new(options: ViewOptions, viewport: Vec2) -> Self {
        let group_colors = options.parsed_group_colors();
        Self {
            options,
            group_colors,
            graph: RenderGraph::default(),
            simulation: None,
            index: SpatialIndex::default(),
            transform: ViewTransform::IDENTITY,
            viewport,
            topology_key: None,
            performance: false,
            highlight: HighlightSelection::default(),
            selected: HashSet::new(),
            hover: HoverTarget::None,
            gesture: None,
            last_click: None,
            scheduler: FrameScheduler::default(),
            events: Vec::new(),
        }
    }

    pub fn options(&self) -> &ViewOptions {
        &self.options
    }

    pub fn graph(&self) -> &RenderGraph {
        &self.graph
    }

    pub fn transform(&self) -> ViewTransform {
        self.transform
    }

    pub fn set_transform(&mut self, transform: ViewTransform) {
        self.transform = transform;
        self.request_render();
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        let viewport = vec2(width, height);
        if viewport != self.viewport {
            self.viewport = viewport;
            self.request_render();
        }
    }

    pub fn simulation(&self) -> Option<&Simulation> {
        self.simulation.as_ref()
    }

    pub fn is_performance_mode(&self) -> bool {
        self.performance
    }

    pub fn hover(&self) -> HoverTarget {
        self.hover
    }

    pub fn selected(&self) -> &HashSet<String> {
        &self.selected
    }

    pub fn set_selection(&mut self, selected: HashSet<String>) {
        if selected != self.selected {
            self.selected = selected;
            self.request_render();
        }
    }

    pub fn highlight(&self) -> &HighlightSelection {
        &self.highlight
    }

    pub fn set_highlight(&mut self, highlight: HighlightSelection) {
        if highlight != self.highlight {
            self.highlight = highlight;
            self.request_render();
        }
    }

    pub fn set_edit_mode(&mut self, edit_mode: bool) {
        self.options.edit_mode = edit_mode;
    }

    pub fn set_group_colors(&mut self, colors: HashMap<String, String>) {
        self.options.group_colors = colors;
        self.group_colors = self.options.parsed_group_colors();
        self.request_render();
    }

    pub fn drain_events(&mut self) -> Vec<GraphEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn request_render(&mut self) -> bool {
        self.scheduler.request()
    }

    pub fn has_pending_render(&self) -> bool {
        self.scheduler.is_pending()
    }

    pub fn render_if_pending(&mut self) -> Option<Frame> {
        if !self.scheduler.take() {
            return None;
        }
        self.compose_frame()
    }

    pub fn tick(&mut self) -> bool {
        let Some(simulation) = self.simulation.as_mut() else {
            return false;
        };
        if !simulation.is_running() {
            return false;
        }

        let running = simulation.step(&mut self.graph.nodes);
        self.rebuild_index();
        self.request_render();
        running
    }

    pub fn shutdown(&mut self) {
        if let Some(simulation) = self.simulation.as_mut() {
            simulation.stop();
        }
        self.simulation = None;
        self.scheduler.cancel();
        self.gesture = None;
    }

    pub(crate) fn rebuild_index(&mut self) {
        let positions = self.graph.nodes.iter().map(|node| node.pos).collect();
        let radii = self.graph.nodes.iter().map(|node| node.hit_radius()).collect();
        self.index = SpatialIndex::build(positions, radii);
    }

    pub(crate) fn edge_shape(&self, edge: &RenderEdge) -> EdgeShape {
        let source = &self.graph.nodes[edge.source];
        if edge.is_self_loop() {
            return EdgeShape::self_loop(source.pos, source.radius());
        }
        let target = &self.graph.nodes[edge.target];
        EdgeShape::between(
            source.pos,
            target.pos,
            self.transform.k < lod::CURVED_EDGES,
        )
    }

    fn push_event(&mut self, event: GraphEvent) {
        tracing::trace!(?event, "graph event");
        self.events.push(event);
    }
}
