use eframe::egui::Pos2;

use crate::quadtree::QuadNode;

pub const NODE_HIT_RADIUS: f32 = 14.0;
pub const GROUP_NODE_HIT_RADIUS: f32 = 24.0;

#[derive(Default)]
pub struct SpatialIndex {
    tree: Option<QuadNode>,
    positions: Vec<Pos2>,
    radii: Vec<f32>,
    max_radius: f32,
}

impl SpatialIndex {
    /// `radii[i]` is the hit radius of the point at `positions[i]`.
    pub fn build(positions: Vec<Pos2>, radii: Vec<f32>) -> Self {
        debug_assert_eq!(positions.len(), radii.len());
        let max_radius = radii.iter().copied().fold(0.0_f32, f32::max);
        Self {
            tree: QuadNode::build(&positions),
            positions,
            radii,
            max_radius,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn find_nearest(&self, point: Pos2) -> Option<usize> {
        self.tree
            .as_ref()?
            .nearest_within(point, &self.positions, &self.radii, self.max_radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::pos2;

    #[test]
    fn query_at_node_returns_it() {
        let index = SpatialIndex::build(
            vec![pos2(0.0, 0.0), pos2(100.0, 0.0), pos2(0.0, 100.0)],
            vec![NODE_HIT_RADIUS; 3],
        );
        assert_eq!(index.find_nearest(pos2(100.0, 0.0)), Some(1));
        assert_eq!(index.find_nearest(pos2(3.0, 98.0)), Some(2));
    }

    #[test]
    fn misses_outside_every_radius() {
        let index = SpatialIndex::build(
            vec![pos2(0.0, 0.0), pos2(100.0, 0.0)],
            vec![NODE_HIT_RADIUS; 2],
        );
        assert_eq!(index.find_nearest(pos2(50.0, 0.0)), None);
    }

    #[test]
    fn group_nodes_have_a_wider_reach() {
        let index = SpatialIndex::build(
            vec![pos2(0.0, 0.0), pos2(100.0, 0.0)],
            vec![NODE_HIT_RADIUS, GROUP_NODE_HIT_RADIUS],
        );
        assert_eq!(index.find_nearest(pos2(20.0, 0.0)), None);
        assert_eq!(index.find_nearest(pos2(80.0, 0.0)), Some(1));
    }

    #[test]
    fn empty_index_finds_nothing() {
        let index = SpatialIndex::default();
        assert!(index.is_empty());
        assert_eq!(index.find_nearest(pos2(0.0, 0.0)), None);
    }
}
