use std::collections::BTreeMap;
use std::f32::consts::{FRAC_PI_2, PI, TAU};

use eframe::egui::{Pos2, pos2, vec2};

use super::{CircularSort, LayoutNode, LayoutOptions, max_radius};

const SPIRAL_RADIUS: f32 = 10.0;

/// Angle of the first slot on every ring (twelve o'clock).
const REFERENCE_ANGLE: f32 = -FRAC_PI_2;

fn on_ring(center: Pos2, radius: f32, angle: f32) -> Pos2 {
    center + vec2(angle.cos(), angle.sin()) * radius
}

pub(super) fn ring_slots(center: Pos2, radius: f32, count: usize) -> Vec<Pos2> {
    let step = TAU / count.max(1) as f32;
    (0..count)
        .map(|slot| on_ring(center, radius, REFERENCE_ANGLE + step * slot as f32))
        .collect()
}

pub(super) fn spiral(count: usize, width: f32, height: f32) -> Vec<Pos2> {
    let center = pos2(width * 0.5, height * 0.5);
    let golden_angle = PI * (3.0 - 5.0_f32.sqrt());
    (0..count)
        .map(|index| {
            let radius = SPIRAL_RADIUS * (0.5 + index as f32).sqrt();
            on_ring(center, radius, index as f32 * golden_angle)
        })
        .collect()
}

pub(super) fn circular(
    nodes: &[LayoutNode<'_>],
    edges: &[(usize, usize)],
    width: f32,
    height: f32,
    options: &LayoutOptions,
) -> Vec<Pos2> {
    let mut order = (0..nodes.len()).collect::<Vec<_>>();
    match options.circular_sort {
        CircularSort::None => {}
        CircularSort::Group => order.sort_by(|&a, &b| nodes[a].group().cmp(nodes[b].group())),
        CircularSort::Degree => {
            let mut degree = vec![0usize; nodes.len()];
            for &(source, target) in edges {
                if source < nodes.len() && target < nodes.len() {
                    degree[source] += 1;
                    degree[target] += 1;
                }
            }
            order.sort_by(|&a, &b| degree[b].cmp(&degree[a]));
        }
    }

    let center = pos2(width * 0.5, height * 0.5);
    let slots = ring_slots(center, max_radius(width, height, options.padding), nodes.len());
    let mut placed = vec![center; nodes.len()];
    for (slot, index) in order.into_iter().enumerate() {
        placed[index] = slots[slot];
    }
    placed
}

pub(super) fn grouped_circular(
    nodes: &[LayoutNode<'_>],
    width: f32,
    height: f32,
    options: &LayoutOptions,
) -> Vec<Pos2> {
    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (index, node) in nodes.iter().enumerate() {
        groups.entry(node.group()).or_default().push(index);
    }

    let center = pos2(width * 0.5, height * 0.5);
    let radius = max_radius(width, height, options.padding);
    let arc = TAU / groups.len().max(1) as f32;
    let gap = arc * options.group_spacing.clamp(0.0, 0.9);
    let usable = arc - gap;

    let mut placed = vec![center; nodes.len()];
    for (group_index, members) in groups.values().enumerate() {
        let start = REFERENCE_ANGLE + group_index as f32 * arc + gap * 0.5;
        if let [only] = members.as_slice() {
            placed[*only] = on_ring(center, radius, start + usable * 0.5);
            continue;
        }

        let step = usable / (members.len() - 1) as f32;
        for (slot, &index) in members.iter().enumerate() {
            placed[index] = on_ring(center, radius, start + step * slot as f32);
        }
    }
    placed
}

pub(super) fn internal_external(
    nodes: &[LayoutNode<'_>],
    width: f32,
    height: f32,
    options: &LayoutOptions,
) -> Vec<Pos2> {
    let center = pos2(width * 0.5, height * 0.5);
    let outer = max_radius(width, height, options.padding);
    let (internal, external): (Vec<usize>, Vec<usize>) =
        (0..nodes.len()).partition(|&index| nodes[index].is_internal);

    let mut placed = vec![center; nodes.len()];
    for (members, radius) in [(internal, outer * 0.4), (external, outer)] {
        let slots = ring_slots(center, radius, members.len());
        for (index, slot) in members.into_iter().zip(slots) {
            placed[index] = slot;
        }
    }
    placed
}
