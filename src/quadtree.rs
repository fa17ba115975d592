use eframe::egui::{Pos2, Rect, Vec2, vec2};

const LEAF_CAPACITY: usize = 8;
const MAX_DEPTH: usize = 12;

#[derive(Clone, Copy, Debug)]
pub(crate) struct Square {
    pub(crate) center: Pos2,
    pub(crate) half: f32,
}

impl Square {
    fn enclosing(points: &[Pos2]) -> Option<Self> {
        let rect = Rect::from_points(points);
        if points.is_empty() || !rect.min.is_finite() || !rect.max.is_finite() {
            return None;
        }
        // One unit of slack keeps points on the far edge strictly inside.
        let half = rect.size().max_elem().max(1.0) * 0.5 + 1.0;
        Some(Self {
            center: rect.center(),
            half,
        })
    }

    pub(crate) fn side(self) -> f32 {
        self.half * 2.0
    }

    pub(crate) fn contains(self, point: Pos2) -> bool {
        let offset = point - self.center;
        offset.x.abs() <= self.half && offset.y.abs() <= self.half
    }

    /// Quadrants are numbered row-major from the top-left: bit 0 is east,
    /// bit 1 is south.
    fn quadrant_of(self, point: Pos2) -> usize {
        usize::from(point.x >= self.center.x) | (usize::from(point.y >= self.center.y) << 1)
    }

    fn quadrant(self, quadrant: usize) -> Self {
        let half = self.half * 0.5;
        let sign = |bit: usize| if quadrant & bit == 0 { -half } else { half };
        Self {
            center: self.center + vec2(sign(1), sign(2)),
            half,
        }
    }

    pub(crate) fn gap_sq(self, other: Self) -> f32 {
        let reach = self.half + other.half;
        let offset = (self.center - other.center).abs() - Vec2::splat(reach);
        offset.max(Vec2::ZERO).length_sq()
    }

    fn gap_sq_to_point(self, point: Pos2) -> f32 {
        let offset = (point - self.center).abs() - Vec2::splat(self.half);
        offset.max(Vec2::ZERO).length_sq()
    }
}

pub(crate) struct QuadNode {
    pub(crate) cell: Square,
    pub(crate) centroid: Pos2,
    pub(crate) count: f32,
    pub(crate) points: Vec<usize>,
    pub(crate) children: [Option<Box<QuadNode>>; 4],
}

impl QuadNode {
    pub(crate) fn build(positions: &[Pos2]) -> Option<Self> {
        let cell = Square::enclosing(positions)?;
        Some(Self::split(cell, (0..positions.len()).collect(), positions, 0))
    }

    fn split(cell: Square, points: Vec<usize>, positions: &[Pos2], depth: usize) -> Self {
        let sum = points
            .iter()
            .fold(Vec2::ZERO, |sum, &index| sum + positions[index].to_vec2());
        let count = points.len() as f32;
        let centroid = if points.is_empty() {
            cell.center
        } else {
            (sum / count).to_pos2()
        };

        let mut node = Self {
            cell,
            centroid,
            count,
            points,
            children: Default::default(),
        };
        if depth == MAX_DEPTH || node.points.len() <= LEAF_CAPACITY {
            return node;
        }

        let mut quarters: [Vec<usize>; 4] = Default::default();
        for &index in &node.points {
            quarters[cell.quadrant_of(positions[index])].push(index);
        }
        // Everything in one quadrant means coincident or tightly packed
        // points; splitting further would not separate them.
        if quarters.iter().any(|quarter| quarter.len() == node.points.len()) {
            return node;
        }

        node.children = std::array::from_fn(|quadrant| {
            let members = std::mem::take(&mut quarters[quadrant]);
            (!members.is_empty()).then(|| {
                Box::new(Self::split(cell.quadrant(quadrant), members, positions, depth + 1))
            })
        });
        node.points = Vec::new();
        node
    }

    pub(crate) fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }

    /// Nearest point to `query` that lies within its own hit radius.
    pub(crate) fn nearest_within(
        &self,
        query: Pos2,
        positions: &[Pos2],
        radii: &[f32],
        max_radius: f32,
    ) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;
        self.visit_nearest(query, positions, radii, max_radius * max_radius, &mut best);
        best.map(|(index, _)| index)
    }

    fn visit_nearest(
        &self,
        query: Pos2,
        positions: &[Pos2],
        radii: &[f32],
        max_radius_sq: f32,
        best: &mut Option<(usize, f32)>,
    ) {
        let cell_distance_sq = self.cell.gap_sq_to_point(query);
        if cell_distance_sq > max_radius_sq {
            return;
        }
        if let Some((_, best_distance_sq)) = *best
            && cell_distance_sq > best_distance_sq
        {
            return;
        }

        if self.is_leaf() {
            for &index in &self.points {
                let distance_sq = positions[index].distance_sq(query);
                let radius = radii[index];
                if distance_sq > radius * radius {
                    continue;
                }
                let closer = best.is_none_or(|(_, best_distance_sq)| distance_sq < best_distance_sq);
                if closer {
                    *best = Some((index, distance_sq));
                }
            }
            return;
        }

        // Visit the quadrant holding the query first so the best distance
        // tightens early.
        let first = self.cell.quadrant_of(query);
        if let Some(child) = self.children[first].as_ref() {
            child.visit_nearest(query, positions, radii, max_radius_sq, best);
        }
        for (quadrant, child) in self.children.iter().enumerate() {
            if quadrant == first {
                continue;
            }
            if let Some(child) = child.as_ref() {
                child.visit_nearest(query, positions, radii, max_radius_sq, best);
            }
        }
    }
}
