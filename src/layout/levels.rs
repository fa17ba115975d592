use std::collections::VecDeque;

use eframe::egui::{Pos2, pos2};

use super::ring::ring_slots;
use super::{HierarchyDirection, LayoutNode, LayoutOptions};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Levels {
    pub level: Vec<usize>,
    pub discovered_by: Vec<Option<usize>>,
    pub roots: Vec<usize>,
    pub order: Vec<usize>,
}

impl Levels {
    pub fn bands(&self) -> Vec<Vec<usize>> {
        let depth = self.level.iter().copied().max().map_or(0, |max| max + 1);
        let mut bands = vec![Vec::new(); depth];
        for &index in &self.order {
            bands[self.level[index]].push(index);
        }
        bands
    }
}

/// Roots are nodes without incoming edges. A graph where every node has an
/// incoming edge falls back to the node with the most outgoing edges, ties
/// going to the lowest id. Self loops count toward neither degree.
pub fn compute_levels(nodes: &[LayoutNode<'_>], edges: &[(usize, usize)]) -> Levels {
    let count = nodes.len();
    let mut outgoing = vec![Vec::new(); count];
    let mut in_degree = vec![0usize; count];
    for &(source, target) in edges {
        if source >= count || target >= count || source == target {
            continue;
        }
        outgoing[source].push(target);
        in_degree[target] += 1;
    }

    let mut roots = (0..count)
        .filter(|&index| in_degree[index] == 0)
        .collect::<Vec<_>>();
    if roots.is_empty()
        && let Some(busiest) = (0..count).min_by(|&a, &b| {
            outgoing[b]
                .len()
                .cmp(&outgoing[a].len())
                .then_with(|| nodes[a].id.cmp(nodes[b].id))
        })
    {
        roots.push(busiest);
    }

    let mut level = vec![0usize; count];
    let mut discovered_by = vec![None; count];
    let mut visited = vec![false; count];
    let mut order = Vec::with_capacity(count);
    let mut queue = VecDeque::new();
    for &root in &roots {
        visited[root] = true;
        queue.push_back(root);
    }

    while let Some(current) = queue.pop_front() {
        order.push(current);
        for &next in &outgoing[current] {
            if visited[next] {
                continue;
            }
            visited[next] = true;
            level[next] = level[current] + 1;
            discovered_by[next] = Some(current);
            queue.push_back(next);
        }
    }

    order.extend((0..count).filter(|&index| !visited[index]));

    Levels {
        level,
        discovered_by,
        roots,
        order,
    }
}

fn centred_offset(slot: usize, size: usize, spacing: f32) -> f32 {
    (slot as f32 - (size.saturating_sub(1)) as f32 * 0.5) * spacing
}

pub(super) fn hierarchical(
    nodes: &[LayoutNode<'_>],
    edges: &[(usize, usize)],
    width: f32,
    height: f32,
    options: &LayoutOptions,
) -> Vec<Pos2> {
    let levels = compute_levels(nodes, edges);
    let mut placed = vec![pos2(width * 0.5, height * 0.5); nodes.len()];

    for (depth, band) in levels.bands().into_iter().enumerate() {
        let along = options.padding + depth as f32 * options.level_spacing;
        for (slot, &index) in band.iter().enumerate() {
            let across = centred_offset(slot, band.len(), options.node_spacing);
            placed[index] = match options.direction {
                HierarchyDirection::TopDown => pos2(width * 0.5 + across, along),
                HierarchyDirection::LeftRight => pos2(along, height * 0.5 + across),
            };
        }
    }
    placed
}

pub(super) fn radial(
    nodes: &[LayoutNode<'_>],
    edges: &[(usize, usize)],
    width: f32,
    height: f32,
    options: &LayoutOptions,
) -> Vec<Pos2> {
    let levels = compute_levels(nodes, edges);
    let center = pos2(width * 0.5, height * 0.5);
    let mut placed = vec![center; nodes.len()];

    for (depth, mut band) in levels.bands().into_iter().enumerate() {
        let radius = if depth == 0 {
            // A sole root owns the centre; unreached nodes share level 0
            // and go on the offset ring around it.
            if let [root] = levels.roots.as_slice() {
                band.retain(|index| index != root);
                placed[*root] = center;
            }
            options.root_offset
        } else {
            depth as f32 * options.level_spacing
        };
        let slots = ring_slots(center, radius, band.len());
        for (index, slot) in band.into_iter().zip(slots) {
            placed[index] = slot;
        }
    }
    placed
}
