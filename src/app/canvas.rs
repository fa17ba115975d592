use std::collections::HashSet;
use std::time::Duration;

use eframe::egui::{
    self, Align2, Color32, FontId, Painter, PointerButton, Pos2, Rect, Sense, Shape, Stroke, Ui,
    Vec2,
};
use eframe::egui::epaint::QuadraticBezierShape;
use topology_canvas::geometry::{EdgeShape, ViewTransform};
use topology_canvas::view::{Frame, ICON_SIZE};
use topology_canvas::{GraphEvent, TopologyKey};

use super::highlight::path_highlight;
use super::{Tooltip, ViewModel};

const BACKGROUND: Color32 = Color32::from_rgb(19, 23, 29);
const GRID_LINE: Color32 = Color32::from_rgba_premultiplied(24, 28, 32, 70);

struct PointerInput {
    hover: Option<Pos2>,
    pressed: bool,
    released: bool,
    double_clicked: bool,
    scroll: f32,
    time: Duration,
}

impl ViewModel {
    pub(in crate::app) fn draw_canvas(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        self.view.set_viewport(rect.width(), rect.height());

        if let Some(snapshot) = self.pending.take() {
            let key = TopologyKey {
                application_id: Some(self.snapshot_label()),
                hop_depth: 0,
                include_external: true,
            };
            let saved = (!self.saved.positions.is_empty()).then_some(&self.saved);
            if let Err(error) = self.view.load(&snapshot, saved, key) {
                self.load_error = Some(format!("{error:#}"));
                return;
            }
            self.frame = None;
        }

        self.handle_pointer(ui, rect, &response);

        if self.view.tick() {
            ui.ctx().request_repaint();
        }
        self.handle_events();

        if let Some(frame) = self.view.render_if_pending() {
            self.frame = Some(frame);
        }

        let painter = ui.painter_at(rect);
        draw_background(&painter, rect, self.view.transform());
        if let Some(frame) = &self.frame {
            paint_frame(&painter, rect.min.to_vec2(), frame, self.view.transform().k);
        }
        self.show_tooltip(ui.ctx(), rect);
    }

    fn handle_pointer(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) {
        let input = ui.input(|input| PointerInput {
            hover: input.pointer.hover_pos(),
            pressed: input.pointer.primary_pressed(),
            released: input.pointer.primary_released(),
            double_clicked: input.pointer.button_double_clicked(PointerButton::Primary),
            scroll: input.raw_scroll_delta.y,
            time: Duration::from_secs_f64(input.time.max(0.0)),
        });

        let Some(pointer) = input.hover.filter(|pointer| rect.contains(*pointer)) else {
            if self.pointer_inside {
                self.pointer_inside = false;
                self.last_pointer = None;
                self.view.pointer_leave();
            }
            return;
        };
        self.pointer_inside = true;
        let local = pointer - rect.min.to_vec2();

        if input.pressed {
            self.view.pointer_down(local, input.time);
        }
        if self.last_pointer != Some(local) {
            self.last_pointer = Some(local);
            self.view.pointer_move(local, input.time);
        }
        if input.released {
            self.view.pointer_up(local, input.time);
        }
        if response.hovered() && input.scroll.abs() > f32::EPSILON {
            // egui scrolls up with positive y; the view follows wheel deltaY.
            self.view.wheel(local, -input.scroll);
        }
        if input.double_clicked {
            self.view.double_click(local);
        }

        if self.view.has_pending_render() {
            ui.ctx().request_repaint();
        }
    }

    fn handle_events(&mut self) {
        for event in self.view.drain_events() {
            match event {
                GraphEvent::NodeClick { node_id } => {
                    self.view.set_selection(HashSet::from([node_id]));
                }
                GraphEvent::NodeDoubleClick { node_id } => {
                    if let Some(index) = self.view.graph().index_of(&node_id) {
                        let highlight = path_highlight(self.view.graph(), index);
                        self.status = Some(format!(
                            "{node_id}: {} upstream, {} downstream",
                            highlight.upstream.len(),
                            highlight.downstream.len()
                        ));
                        self.view.set_highlight(highlight);
                    }
                }
                GraphEvent::BackgroundClick => {
                    self.view.set_selection(HashSet::new());
                    self.view.set_highlight(Default::default());
                    self.status = None;
                }
                GraphEvent::NodeHover {
                    node_id,
                    screen_pos,
                } => {
                    self.tooltip = self.view.graph().node(&node_id).map(|node| Tooltip {
                        screen_pos,
                        text: node_tooltip(node),
                    });
                }
                GraphEvent::EdgeHover {
                    edge_id,
                    screen_pos,
                } => {
                    let graph = self.view.graph();
                    self.tooltip = graph.edges.iter().find(|edge| edge.id == edge_id).map(|edge| {
                        Tooltip {
                            screen_pos,
                            text: format!(
                                "{} -> {}\n{}\n{} bytes{}",
                                graph.nodes[edge.source].label(),
                                graph.nodes[edge.target].label(),
                                edge.label(),
                                edge.bytes_total,
                                if edge.is_aggregated() {
                                    format!("\n{} flows", edge.aggregated_count)
                                } else {
                                    String::new()
                                }
                            ),
                        }
                    });
                }
                GraphEvent::HoverCleared => self.tooltip = None,
                GraphEvent::DragEnd { moved, .. } => self.persist_positions(&moved),
            }
        }
    }

    fn persist_positions(&mut self, moved: &[(String, Pos2)]) {
        let Some(path) = self.sources.layout_file.clone() else {
            return;
        };
        for (id, position) in moved {
            self.saved.insert(id.clone(), *position);
        }
        match self.saved.save(&path) {
            Ok(()) => tracing::debug!(nodes = moved.len(), path = %path.display(), "layout saved"),
            Err(error) => {
                tracing::warn!("{error:#}");
                self.status = Some(format!("{error:#}"));
            }
        }
    }

    fn show_tooltip(&self, ctx: &egui::Context, rect: Rect) {
        let Some(tooltip) = &self.tooltip else {
            return;
        };
        egui::Area::new(egui::Id::new("topology_tooltip"))
            .order(egui::Order::Tooltip)
            .fixed_pos(rect.min + tooltip.screen_pos.to_vec2() + Vec2::splat(14.0))
            .interactable(false)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.label(tooltip.text.as_str());
                });
            });
    }
}

fn node_tooltip(node: &topology_canvas::topology::RenderNode) -> String {
    let mut lines = vec![node.label().to_owned()];
    if node.label() != node.id {
        lines.push(node.id.clone());
    }
    lines.push(if node.is_internal { "internal" } else { "external" }.to_owned());
    if let Some(asset_type) = &node.asset_type {
        lines.push(asset_type.clone());
    }
    if let Some(group) = &node.group {
        lines.push(format!("group {} ({} nodes)", group.key, group.node_count));
    }
    if node.is_critical {
        lines.push("critical".to_owned());
    }
    if node.is_entry_point {
        lines.push("entry point".to_owned());
    }
    lines.join("\n")
}

fn draw_background(painter: &Painter, rect: Rect, transform: ViewTransform) {
    painter.rect_filled(rect, 0.0, BACKGROUND);

    let step = (56.0 * transform.k.clamp(0.6, 1.8)).max(20.0);
    let stroke = Stroke::new(1.0, GRID_LINE);

    let mut x = rect.left() + transform.x.rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + transform.y.rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

fn paint_frame(painter: &Painter, offset: Vec2, frame: &Frame, zoom: f32) {
    for batch in &frame.edge_batches {
        let stroke = Stroke::new(batch.width, batch.color);
        for shape in &batch.shapes {
            match *shape {
                EdgeShape::Line { start, end } => {
                    painter.line_segment([start + offset, end + offset], stroke);
                }
                EdgeShape::Curve {
                    start,
                    control,
                    end,
                } => {
                    painter.add(QuadraticBezierShape::from_points_stroke(
                        [start + offset, control + offset, end + offset],
                        false,
                        Color32::TRANSPARENT,
                        stroke,
                    ));
                }
                EdgeShape::Loop { center, radius } => {
                    painter.circle_stroke(center + offset, radius, stroke);
                }
            }
        }
    }

    for arrow in &frame.arrows {
        painter.add(Shape::convex_polygon(
            arrow.points.iter().map(|point| *point + offset).collect(),
            arrow.color,
            Stroke::NONE,
        ));
    }

    for node in &frame.nodes {
        let center = node.center + offset;
        painter.circle_filled(center, node.radius, node.fill);
        painter.circle_stroke(center, node.radius, node.stroke);
        if let Some(icon) = &node.icon {
            painter.text(
                center,
                Align2::CENTER_CENTER,
                icon,
                FontId::proportional(ICON_SIZE * zoom.min(1.5)),
                node.icon_color,
            );
        }
    }

    for label in &frame.labels {
        painter.text(
            label.pos + offset,
            Align2::CENTER_TOP,
            &label.text,
            FontId::proportional(label.size),
            label.color,
        );
    }
}
