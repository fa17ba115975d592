use std::collections::HashMap;

use eframe::egui::{Color32, Pos2, Rect, Stroke, Vec2, vec2};

use super::style;
use super::{HoverTarget, TopologyView};
use crate::geometry::EdgeShape;
use crate::topology::{RenderEdge, RenderNode};

pub mod lod {
    pub const NODE_LABELS: f32 = 0.4;
    pub const EDGE_LABELS: f32 = 0.6;
    pub const NODE_ICONS: f32 = 0.3;
    pub const CURVED_EDGES: f32 = 0.2;
    pub const ARROWS: f32 = 0.35;
}

pub const NODE_CULL_MARGIN: f32 = 50.0;
pub const EDGE_CULL_MARGIN: f32 = 200.0;

const ARROW_LENGTH: f32 = 8.0;
const NODE_LABEL_SIZE: f32 = 12.0;
const EDGE_LABEL_SIZE: f32 = 10.0;
pub const ICON_SIZE: f32 = 10.0;
const LABEL_GAP: f32 = 4.0;

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeBatch {
    pub color: Color32,
    pub width: f32,
    pub shapes: Vec<EdgeShape>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArrowHead {
    pub points: [Pos2; 3],
    pub color: Color32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeSprite {
    pub id: String,
    pub center: Pos2,
    pub radius: f32,
    pub fill: Color32,
    pub stroke: Stroke,
    pub icon: Option<String>,
    pub icon_color: Color32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub pos: Pos2,
    pub text: String,
    pub color: Color32,
    pub size: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub nodes_drawn: usize,
    pub nodes_culled: usize,
    pub edges_drawn: usize,
    pub edges_culled: usize,
}

/// Everything needed to paint one frame, in screen space relative to the
/// canvas origin. Batches are ordered for painting: highlighted edges last.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    pub size: Vec2,
    pub edge_batches: Vec<EdgeBatch>,
    pub arrows: Vec<ArrowHead>,
    pub nodes: Vec<NodeSprite>,
    pub labels: Vec<Label>,
    pub stats: FrameStats,
}

#[derive(Default)]
struct Batcher {
    batches: Vec<EdgeBatch>,
    slots: HashMap<(Color32, u32), usize>,
}

impl Batcher {
    fn push(&mut self, color: Color32, width: f32, shape: EdgeShape) {
        let key = (color, width.to_bits());
        let slot = match self.slots.get(&key) {
            Some(&slot) => slot,
            None => {
                self.batches.push(EdgeBatch {
                    color,
                    width,
                    shapes: Vec::new(),
                });
                self.slots.insert(key, self.batches.len() - 1);
                self.batches.len() - 1
            }
        };
        self.batches[slot].shapes.push(shape);
    }
}

impl TopologyView {
    pub fn compose_frame(&self) -> Option<Frame> {
        if self.viewport.x <= 0.0 || self.viewport.y <= 0.0 {
            return None;
        }

        let screen = Rect::from_min_size(Pos2::ZERO, self.viewport);
        let node_area = screen.expand(NODE_CULL_MARGIN);
        let edge_area = screen.expand(EDGE_CULL_MARGIN);
        let k = self.transform.k;

        let mut frame = Frame {
            size: self.viewport,
            ..Frame::default()
        };
        let mut plain = Batcher::default();
        let mut emphasised = Batcher::default();

        for (index, edge) in self.graph.edges.iter().enumerate() {
            let shape = self.edge_shape(edge).transformed(self.transform);
            if self.performance && !edge_area.contains(shape.midpoint()) {
                frame.stats.edges_culled += 1;
                continue;
            }
            frame.stats.edges_drawn += 1;

            let hovered = self.hover == HoverTarget::Edge(index);
            let (color, width, on_path) = self.edge_style(edge);
            let width = if hovered { width + 1.5 } else { width };
            if on_path || hovered {
                emphasised.push(color, width, shape);
            } else {
                plain.push(color, width, shape);
            }

            if k >= lod::ARROWS
                && let (Some(direction), Some(end)) = (shape.end_direction(), shape.end())
            {
                let target_radius = self.graph.nodes[edge.target].radius() * k;
                let tip = end - direction * target_radius;
                let back = tip - direction * ARROW_LENGTH;
                let side = direction.rot90() * (ARROW_LENGTH * 0.5);
                frame.arrows.push(ArrowHead {
                    points: [tip, back + side, back - side],
                    color,
                });
            }

            if k >= lod::EDGE_LABELS {
                let text = edge.label();
                if !text.is_empty() {
                    let dimmed = self.highlight.is_active() && !on_path;
                    frame.labels.push(Label {
                        pos: shape.midpoint(),
                        text,
                        color: dim(style::EDGE_LABEL, dimmed, style::DIMMED_EDGE_OPACITY),
                        size: EDGE_LABEL_SIZE,
                    });
                }
            }
        }
        frame.edge_batches = plain.batches;
        frame.edge_batches.extend(emphasised.batches);

        for (index, node) in self.graph.nodes.iter().enumerate() {
            let center = self.transform.apply(node.pos);
            if self.performance && !node_area.contains(center) {
                frame.stats.nodes_culled += 1;
                continue;
            }
            frame.stats.nodes_drawn += 1;

            let selected = self.selected.contains(&node.id);
            let on_path = self.highlight.contains_node(&node.id);
            let dimmed = self.highlight.is_active() && !on_path && !selected;
            let radius = node.radius() * k;

            let icon = (k >= lod::NODE_ICONS)
                .then(|| node_icon(node))
                .flatten();
            frame.nodes.push(NodeSprite {
                id: node.id.clone(),
                center,
                radius,
                fill: dim(self.node_fill(node), dimmed, style::DIMMED_NODE_OPACITY),
                stroke: self.node_stroke(index, node, selected, on_path, dimmed),
                icon,
                icon_color: dim(style::ICON, dimmed, style::DIMMED_NODE_OPACITY),
            });

            if k >= lod::NODE_LABELS {
                frame.labels.push(Label {
                    pos: center + vec2(0.0, radius + LABEL_GAP),
                    text: node.label().to_owned(),
                    color: dim(style::NODE_LABEL, dimmed, style::DIMMED_NODE_OPACITY),
                    size: NODE_LABEL_SIZE,
                });
            }
        }

        Some(frame)
    }

    fn edge_style(&self, edge: &RenderEdge) -> (Color32, f32, bool) {
        let source = &self.graph.nodes[edge.source];
        let target = &self.graph.nodes[edge.target];

        if self.highlight.edges.contains(&edge.id) {
            let color = if self.highlight.upstream.contains(&source.id) {
                style::UPSTREAM_PATH
            } else {
                style::DOWNSTREAM_PATH
            };
            return (color, 3.0, true);
        }

        let (color, width) = if edge.is_gateway_edge {
            (style::GATEWAY_EDGE, 2.0)
        } else if edge.is_critical {
            (style::CRITICAL_EDGE, 2.0)
        } else if !source.is_internal || !target.is_internal {
            (style::EXTERNAL_EDGE, 1.5)
        } else {
            (style::INTERNAL_EDGE, 1.0)
        };
        let width = if edge.is_aggregated() { width + 1.0 } else { width };
        let dimmed = self.highlight.is_active();
        (dim(color, dimmed, style::DIMMED_EDGE_OPACITY), width, false)
    }

    fn node_fill(&self, node: &RenderNode) -> Color32 {
        if let Some(color) = node
            .group
            .as_ref()
            .and_then(|group| self.group_colors.get(&group.key))
        {
            return *color;
        }
        if let Some(color) = node.asset_type.as_deref().and_then(style::asset_type_color) {
            return color;
        }
        if node.is_group_node() {
            style::GROUP_NODE
        } else if node.is_internal {
            style::INTERNAL_NODE
        } else {
            style::EXTERNAL_NODE
        }
    }

    fn node_stroke(
        &self,
        index: usize,
        node: &RenderNode,
        selected: bool,
        on_path: bool,
        dimmed: bool,
    ) -> Stroke {
        if selected {
            return Stroke::new(3.0, style::SELECTED_STROKE);
        }
        if self.hover == HoverTarget::Node(index) {
            return Stroke::new(2.0, style::HOVER_STROKE);
        }
        if on_path {
            let color = if self.highlight.upstream.contains(&node.id) {
                style::UPSTREAM_PATH
            } else {
                style::DOWNSTREAM_PATH
            };
            return Stroke::new(2.0, color);
        }
        Stroke::new(
            1.0,
            dim(style::DEFAULT_STROKE, dimmed, style::DIMMED_NODE_OPACITY),
        )
    }
}

fn node_icon(node: &RenderNode) -> Option<String> {
    if let Some(group) = &node.group {
        return Some(group.node_count.to_string());
    }
    node.asset_type
        .as_deref()
        .and_then(style::asset_type_icon)
        .map(str::to_owned)
}

fn dim(color: Color32, dimmed: bool, opacity: f32) -> Color32 {
    if dimmed {
        color.gamma_multiply(opacity)
    } else {
        color
    }
}
