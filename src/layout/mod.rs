use std::collections::HashMap;

use eframe::egui::{Pos2, Rect, pos2};
use serde::{Deserialize, Serialize};

mod grid;
mod levels;
mod ring;

pub use grid::grid_cell;
pub use levels::compute_levels;

pub const DEFAULT_GROUP: &str = "default";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum LayoutKind {
    #[default]
    Force,
    Grid,
    Circular,
    GroupedCircular,
    Hierarchical,
    Radial,
    InternalExternal,
}

impl LayoutKind {
    pub const ALL: [Self; 7] = [
        Self::Force,
        Self::Grid,
        Self::Circular,
        Self::GroupedCircular,
        Self::Hierarchical,
        Self::Radial,
        Self::InternalExternal,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Force => "Force",
            Self::Grid => "Grid",
            Self::Circular => "Circular",
            Self::GroupedCircular => "Grouped circular",
            Self::Hierarchical => "Hierarchical",
            Self::Radial => "Radial",
            Self::InternalExternal => "Internal / external",
        }
    }

    pub fn is_force(self) -> bool {
        matches!(self, Self::Force)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HierarchyDirection {
    #[default]
    TopDown,
    LeftRight,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircularSort {
    #[default]
    None,
    Group,
    Degree,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    pub padding: f32,
    pub node_spacing: f32,
    pub level_spacing: f32,
    pub group_spacing: f32,
    /// Ring radius for level 0 in the radial layout when there are several roots.
    pub root_offset: f32,
    pub direction: HierarchyDirection,
    pub circular_sort: CircularSort,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            padding: 50.0,
            node_spacing: 80.0,
            level_spacing: 150.0,
            group_spacing: 0.1,
            root_offset: 30.0,
            direction: HierarchyDirection::TopDown,
            circular_sort: CircularSort::None,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct LayoutNode<'a> {
    pub id: &'a str,
    pub is_internal: bool,
    pub group_key: Option<&'a str>,
}

impl LayoutNode<'_> {
    pub fn group(&self) -> &str {
        self.group_key.unwrap_or(DEFAULT_GROUP)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LayoutResult {
    pub positions: HashMap<String, Pos2>,
    pub bounds: Rect,
}

/// `edges` are `(source, target)` indices into `nodes`.
pub fn apply_layout(
    kind: LayoutKind,
    nodes: &[LayoutNode<'_>],
    edges: &[(usize, usize)],
    width: f32,
    height: f32,
    options: &LayoutOptions,
) -> LayoutResult {
    let placed = match kind {
        LayoutKind::Force => ring::spiral(nodes.len(), width, height),
        LayoutKind::Grid => grid::grid(nodes.len(), width, height, options),
        LayoutKind::Circular => ring::circular(nodes, edges, width, height, options),
        LayoutKind::GroupedCircular => ring::grouped_circular(nodes, width, height, options),
        LayoutKind::Hierarchical => levels::hierarchical(nodes, edges, width, height, options),
        LayoutKind::Radial => levels::radial(nodes, edges, width, height, options),
        LayoutKind::InternalExternal => ring::internal_external(nodes, width, height, options),
    };

    finish(nodes, placed, options.padding)
}

fn finish(nodes: &[LayoutNode<'_>], placed: Vec<Pos2>, padding: f32) -> LayoutResult {
    debug_assert_eq!(nodes.len(), placed.len());
    let bounds = if placed.is_empty() {
        Rect::from_min_max(pos2(padding, padding), pos2(padding, padding))
    } else {
        Rect::from_points(&placed)
    };

    let positions = nodes
        .iter()
        .zip(placed)
        .map(|(node, position)| (node.id.to_owned(), position))
        .collect();

    LayoutResult { positions, bounds }
}

fn max_radius(width: f32, height: f32, padding: f32) -> f32 {
    ((width.min(height) * 0.5) - padding).max(10.0)
}
