use eframe::egui::{Pos2, Rect, Vec2, pos2, vec2};

pub const EDGE_CURVATURE: f32 = 0.15;
pub const SELF_LOOP_RADIUS: f32 = 14.0;
const CURVE_SAMPLES: usize = 24;

pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 4.0;

pub fn point_to_segment_distance(point: Pos2, start: Pos2, end: Pos2) -> f32 {
    let segment = end - start;
    let length_sq = segment.length_sq();
    if length_sq <= f32::EPSILON {
        return point.distance(start);
    }

    let t = ((point - start).dot(segment) / length_sq).clamp(0.0, 1.0);
    point.distance(start + segment * t)
}

pub fn quadratic_point(start: Pos2, control: Pos2, end: Pos2, t: f32) -> Pos2 {
    let inverse = 1.0 - t;
    let x = inverse * inverse * start.x + 2.0 * inverse * t * control.x + t * t * end.x;
    let y = inverse * inverse * start.y + 2.0 * inverse * t * control.y + t * t * end.y;
    pos2(x, y)
}

pub fn point_to_quadratic_distance(point: Pos2, start: Pos2, control: Pos2, end: Pos2) -> f32 {
    let mut best = f32::INFINITY;
    let mut previous = start;
    for step in 1..=CURVE_SAMPLES {
        let t = step as f32 / CURVE_SAMPLES as f32;
        let next = quadratic_point(start, control, end, t);
        best = best.min(point_to_segment_distance(point, previous, next));
        previous = next;
    }
    best
}

pub fn curve_control_point(start: Pos2, end: Pos2) -> Pos2 {
    let delta = end - start;
    let midpoint = start + delta * 0.5;
    midpoint + delta.rot90() * EDGE_CURVATURE
}

pub fn curve_midpoint(start: Pos2, end: Pos2) -> Pos2 {
    quadratic_point(start, curve_control_point(start, end), end, 0.5)
}

pub fn self_loop_center(node: Pos2, node_radius: f32) -> Pos2 {
    let offset = (node_radius + SELF_LOOP_RADIUS) * std::f32::consts::FRAC_1_SQRT_2;
    node + vec2(offset, -offset)
}

pub fn point_to_ring_distance(point: Pos2, center: Pos2, radius: f32) -> f32 {
    (point.distance(center) - radius).abs()
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EdgeShape {
    Line { start: Pos2, end: Pos2 },
    Curve { start: Pos2, control: Pos2, end: Pos2 },
    Loop { center: Pos2, radius: f32 },
}

impl EdgeShape {
    pub fn between(start: Pos2, end: Pos2, straight: bool) -> Self {
        if straight {
            Self::Line { start, end }
        } else {
            Self::Curve {
                start,
                control: curve_control_point(start, end),
                end,
            }
        }
    }

    pub fn self_loop(node: Pos2, node_radius: f32) -> Self {
        Self::Loop {
            center: self_loop_center(node, node_radius),
            radius: SELF_LOOP_RADIUS,
        }
    }

    pub fn distance_to(self, point: Pos2) -> f32 {
        match self {
            Self::Line { start, end } => point_to_segment_distance(point, start, end),
            Self::Curve {
                start,
                control,
                end,
            } => point_to_quadratic_distance(point, start, control, end),
            Self::Loop { center, radius } => point_to_ring_distance(point, center, radius),
        }
    }

    pub fn midpoint(self) -> Pos2 {
        match self {
            Self::Line { start, end } => start + (end - start) * 0.5,
            Self::Curve {
                start,
                control,
                end,
            } => quadratic_point(start, control, end, 0.5),
            Self::Loop { center, radius } => center - vec2(0.0, radius),
        }
    }

    pub fn end_direction(self) -> Option<Vec2> {
        let tangent = match self {
            Self::Line { start, end } => end - start,
            Self::Curve { control, end, .. } => end - control,
            Self::Loop { .. } => return None,
        };
        (tangent.length_sq() > f32::EPSILON).then(|| tangent.normalized())
    }

    pub fn end(self) -> Option<Pos2> {
        match self {
            Self::Line { end, .. } | Self::Curve { end, .. } => Some(end),
            Self::Loop { .. } => None,
        }
    }

    pub fn transformed(self, transform: ViewTransform) -> Self {
        match self {
            Self::Line { start, end } => Self::Line {
                start: transform.apply(start),
                end: transform.apply(end),
            },
            Self::Curve {
                start,
                control,
                end,
            } => Self::Curve {
                start: transform.apply(start),
                control: transform.apply(control),
                end: transform.apply(end),
            },
            Self::Loop { center, radius } => Self::Loop {
                center: transform.apply(center),
                radius: radius * transform.k,
            },
        }
    }
}

/// Affine map `screen = graph * k + (x, y)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub x: f32,
    pub y: f32,
    pub k: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewTransform {
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        k: 1.0,
    };

    pub fn apply(self, graph: Pos2) -> Pos2 {
        pos2(graph.x * self.k + self.x, graph.y * self.k + self.y)
    }

    pub fn invert(self, screen: Pos2) -> Pos2 {
        pos2((screen.x - self.x) / self.k, (screen.y - self.y) / self.k)
    }

    pub fn translate(self, delta: Vec2) -> Self {
        Self {
            x: self.x + delta.x,
            y: self.y + delta.y,
            k: self.k,
        }
    }

    pub fn zoom_around(self, focus: Pos2, factor: f32) -> Self {
        let k = (self.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        let anchor = self.invert(focus);
        Self {
            x: focus.x - anchor.x * k,
            y: focus.y - anchor.y * k,
            k,
        }
    }

    /// Transform that fits `bounds` into a `viewport` sized canvas, never
    /// zooming in past 1:1.
    pub fn fit(bounds: Rect, viewport: Vec2, padding: f32) -> Self {
        if !bounds.is_finite() || viewport.x <= 0.0 || viewport.y <= 0.0 {
            return Self::IDENTITY;
        }

        let available = vec2(
            (viewport.x - padding * 2.0).max(1.0),
            (viewport.y - padding * 2.0).max(1.0),
        );
        let span = vec2(bounds.width().max(1.0), bounds.height().max(1.0));
        let k = (available.x / span.x)
            .min(available.y / span.y)
            .clamp(MIN_ZOOM, 1.0);
        let center = bounds.center();
        Self {
            x: viewport.x * 0.5 - center.x * k,
            y: viewport.y * 0.5 - center.y * k,
            k,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn segment_distance_projects_onto_interior() {
        let distance = point_to_segment_distance(pos2(5.0, 3.0), pos2(0.0, 0.0), pos2(10.0, 0.0));
        assert_relative_eq!(distance, 3.0);
    }

    #[test]
    fn segment_distance_clamps_to_endpoints() {
        let distance = point_to_segment_distance(pos2(-3.0, 4.0), pos2(0.0, 0.0), pos2(10.0, 0.0));
        assert_relative_eq!(distance, 5.0);
    }

    #[test]
    fn degenerate_segment_is_a_point() {
        let distance = point_to_segment_distance(pos2(3.0, 4.0), pos2(0.0, 0.0), pos2(0.0, 0.0));
        assert_relative_eq!(distance, 5.0);
    }

    #[test]
    fn curve_passes_near_its_bowed_midpoint() {
        let start = pos2(0.0, 0.0);
        let end = pos2(100.0, 0.0);
        let control = curve_control_point(start, end);
        let mid = curve_midpoint(start, end);
        assert!(point_to_quadratic_distance(mid, start, control, end) < 0.5);
        // The straight midpoint is off the bowed curve.
        assert!(point_to_quadratic_distance(pos2(50.0, 0.0), start, control, end) > 5.0);
    }

    #[test]
    fn loop_distance_is_to_the_ring() {
        let shape = EdgeShape::self_loop(pos2(0.0, 0.0), 10.0);
        let EdgeShape::Loop { center, radius } = shape else {
            panic!("expected a loop");
        };
        assert_relative_eq!(shape.distance_to(center), radius);
        assert!(shape.distance_to(center + vec2(radius, 0.0)) < 1e-4);
        assert_eq!(shape.end_direction(), None);
    }

    #[test]
    fn transformed_curve_keeps_its_shape() {
        let transform = ViewTransform {
            x: 10.0,
            y: 20.0,
            k: 2.0,
        };
        let graph = EdgeShape::between(pos2(0.0, 0.0), pos2(100.0, 0.0), false);
        let screen = graph.transformed(transform);
        let expected = transform.apply(graph.midpoint());
        assert_relative_eq!(screen.midpoint().x, expected.x, epsilon = 1e-3);
        assert_relative_eq!(screen.midpoint().y, expected.y, epsilon = 1e-3);
    }

    #[test]
    fn transform_round_trips() {
        let transform = ViewTransform {
            x: 40.0,
            y: -12.0,
            k: 2.5,
        };
        let graph = pos2(13.0, 7.0);
        let back = transform.invert(transform.apply(graph));
        assert_relative_eq!(back.x, graph.x, epsilon = 1e-4);
        assert_relative_eq!(back.y, graph.y, epsilon = 1e-4);
    }

    #[test]
    fn zoom_keeps_focus_fixed_and_clamps() {
        let transform = ViewTransform::IDENTITY;
        let focus = pos2(200.0, 100.0);
        let zoomed = transform.zoom_around(focus, 2.0);
        let focus_after = zoomed.apply(transform.invert(focus));
        assert_relative_eq!(focus_after.x, focus.x, epsilon = 1e-3);
        assert_relative_eq!(focus_after.y, focus.y, epsilon = 1e-3);

        assert_relative_eq!(transform.zoom_around(focus, 100.0).k, MAX_ZOOM);
        assert_relative_eq!(transform.zoom_around(focus, 0.0001).k, MIN_ZOOM);
    }

    #[test]
    fn fit_centres_bounds() {
        let bounds = Rect::from_min_max(pos2(0.0, 0.0), pos2(2000.0, 1000.0));
        let transform = ViewTransform::fit(bounds, vec2(1000.0, 500.0), 0.0);
        assert_relative_eq!(transform.k, 0.5);
        let centre = transform.apply(bounds.center());
        assert_relative_eq!(centre.x, 500.0);
        assert_relative_eq!(centre.y, 250.0);
    }
}
