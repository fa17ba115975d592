use eframe::egui::{Pos2, Vec2, vec2};

use crate::quadtree::QuadNode;

const CHARGE_DISTANCE_MIN_SQ: f32 = 1.0;
const JIGGLE: f32 = 1e-3;

pub(super) fn jiggle(from: usize, to: usize) -> Vec2 {
    let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin()) * JIGGLE
}

#[derive(Clone, Copy, Debug)]
pub(super) struct Link {
    pub(super) source: usize,
    pub(super) target: usize,
    pub(super) strength: f32,
    pub(super) bias: f32,
}

impl Link {
    pub(super) fn build(pairs: &[(usize, usize)], node_count: usize) -> Vec<Self> {
        let mut degree = vec![0usize; node_count];
        for &(source, target) in pairs {
            degree[source] += 1;
            degree[target] += 1;
        }

        pairs
            .iter()
            .map(|&(source, target)| {
                let (source_degree, target_degree) = (degree[source] as f32, degree[target] as f32);
                Self {
                    source,
                    target,
                    strength: 1.0 / source_degree.min(target_degree),
                    bias: source_degree / (source_degree + target_degree),
                }
            })
            .collect()
    }
}

/// Spring every link toward `distance`, reading velocities as they are
/// updated so earlier links influence later ones within a tick.
pub(super) fn apply_links(
    links: &[Link],
    positions: &[Pos2],
    velocities: &mut [Vec2],
    distance: f32,
    alpha: f32,
) {
    for link in links {
        let (source, target) = (link.source, link.target);
        let mut delta = (positions[target] + velocities[target])
            - (positions[source] + velocities[source]);
        if delta.length_sq() <= f32::EPSILON {
            delta = jiggle(source, target);
        }

        let length = delta.length();
        let correction = delta * ((length - distance) / length * alpha * link.strength);
        velocities[target] -= correction * link.bias;
        velocities[source] += correction * (1.0 - link.bias);
    }
}

#[derive(Clone, Copy, Debug)]
pub(super) struct ChargeParams {
    pub(super) strength: f32,
    pub(super) theta_sq: f32,
    pub(super) distance_max_sq: f32,
    pub(super) alpha: f32,
}

pub(super) fn accumulate_charge_for_node(
    node: &QuadNode,
    index: usize,
    positions: &[Pos2],
    params: ChargeParams,
    velocity: &mut Vec2,
) {
    if node.count <= 0.0 {
        return;
    }

    let point = positions[index];
    let delta = node.centroid - point;
    let distance_sq = delta.length_sq();
    let width = node.cell.side();

    if !node.cell.contains(point) && (width * width / params.theta_sq) < distance_sq {
        if distance_sq < params.distance_max_sq {
            let softened = soften(distance_sq);
            *velocity += delta * (params.strength * node.count * params.alpha / softened);
        }
        return;
    }

    if node.is_leaf() {
        for &other in &node.points {
            if other == index {
                continue;
            }
            let mut delta = positions[other] - point;
            let mut distance_sq = delta.length_sq();
            if distance_sq >= params.distance_max_sq {
                continue;
            }
            if distance_sq <= f32::EPSILON {
                delta = jiggle(index, other);
                distance_sq = delta.length_sq();
            }
            *velocity += delta * (params.strength * params.alpha / soften(distance_sq));
        }
        return;
    }

    for child in node.children.iter().flatten() {
        accumulate_charge_for_node(child, index, positions, params, velocity);
    }
}

fn soften(distance_sq: f32) -> f32 {
    if distance_sq < CHARGE_DISTANCE_MIN_SQ {
        (CHARGE_DISTANCE_MIN_SQ * distance_sq).sqrt()
    } else {
        distance_sq
    }
}

#[derive(Clone, Copy)]
pub(super) struct CollisionParams {
    pub(super) strength: f32,
    pub(super) max_collision_distance_sq: f32,
}

/// `predicted` are positions advanced by the current velocity; the
/// corrections land in `deltas`.
pub(super) fn accumulate_collision_pairs(
    node_a: &QuadNode,
    node_b: &QuadNode,
    same_node: bool,
    predicted: &[Pos2],
    radii: &[f32],
    params: CollisionParams,
    deltas: &mut [Vec2],
) {
    if node_a.cell.gap_sq(node_b.cell) > params.max_collision_distance_sq {
        return;
    }

    if node_a.is_leaf() && node_b.is_leaf() {
        if same_node {
            for (slot, &from) in node_a.points.iter().enumerate() {
                for &to in &node_a.points[slot + 1..] {
                    resolve_overlap(from, to, predicted, radii, params.strength, deltas);
                }
            }
        } else {
            for &from in &node_a.points {
                for &to in &node_b.points {
                    resolve_overlap(from, to, predicted, radii, params.strength, deltas);
                }
            }
        }
        return;
    }

    if same_node {
        for first in 0..4 {
            let Some(child_a) = node_a.children[first].as_ref() else {
                continue;
            };

            accumulate_collision_pairs(child_a, child_a, true, predicted, radii, params, deltas);

            for second in (first + 1)..4 {
                let Some(child_b) = node_a.children[second].as_ref() else {
                    continue;
                };
                accumulate_collision_pairs(
                    child_a, child_b, false, predicted, radii, params, deltas,
                );
            }
        }
        return;
    }

    let split_a = if node_a.is_leaf() {
        false
    } else if node_b.is_leaf() {
        true
    } else {
        node_a.cell.half >= node_b.cell.half
    };

    if split_a {
        for child in node_a.children.iter().flatten() {
            accumulate_collision_pairs(child, node_b, false, predicted, radii, params, deltas);
        }
    } else {
        for child in node_b.children.iter().flatten() {
            accumulate_collision_pairs(node_a, child, false, predicted, radii, params, deltas);
        }
    }
}

fn resolve_overlap(
    from: usize,
    to: usize,
    predicted: &[Pos2],
    radii: &[f32],
    strength: f32,
    deltas: &mut [Vec2],
) {
    let min_distance = radii[from] + radii[to];
    let mut delta = predicted[from] - predicted[to];
    let mut distance_sq = delta.length_sq();
    if distance_sq >= min_distance * min_distance {
        return;
    }
    if distance_sq <= f32::EPSILON {
        delta = jiggle(from, to);
        distance_sq = delta.length_sq();
    }

    let distance = distance_sq.sqrt();
    let push = delta * ((min_distance - distance) / distance * strength);
    let from_sq = radii[from] * radii[from];
    let to_sq = radii[to] * radii[to];
    let share = to_sq / (from_sq + to_sq);
    deltas[from] += push * share;
    deltas[to] -= push * (1.0 - share);
}

pub(super) fn apply_centering(positions: &mut [Pos2], center: Pos2) {
    if positions.is_empty() {
        return;
    }

    let mut sum = Vec2::ZERO;
    for position in positions.iter() {
        sum += position.to_vec2();
    }
    let shift = sum / positions.len() as f32 - center.to_vec2();
    for position in positions.iter_mut() {
        *position -= shift;
    }
}

pub(super) fn apply_positioning(
    positions: &[Pos2],
    velocities: &mut [Vec2],
    target: Pos2,
    strength: f32,
    alpha: f32,
) {
    for (position, velocity) in positions.iter().zip(velocities.iter_mut()) {
        *velocity += (target - *position) * (strength * alpha);
    }
}
