use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use eframe::egui::{Color32, Pos2};
use serde::{Deserialize, Serialize};

use crate::layout::{LayoutKind, LayoutOptions};
use crate::physics::{PerformanceMode, SimulationParams};
use crate::topology::IngestOptions;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewOptions {
    pub layout: LayoutKind,
    pub layout_options: LayoutOptions,
    pub performance_mode: PerformanceMode,
    pub link_distance: Option<f32>,
    pub charge_strength: Option<f32>,
    pub collision_radius: Option<f32>,
    #[serde(flatten)]
    pub ingest: IngestOptions,
    /// Fill colours for group nodes, keyed by group key, as `#rrggbb`.
    pub group_colors: HashMap<String, String>,
    pub edit_mode: bool,
    pub double_click_zoom: bool,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            layout: LayoutKind::Force,
            layout_options: LayoutOptions::default(),
            performance_mode: PerformanceMode::Auto,
            link_distance: None,
            charge_strength: None,
            collision_radius: None,
            ingest: IngestOptions::default(),
            group_colors: HashMap::new(),
            edit_mode: false,
            double_click_zoom: true,
        }
    }
}

impl ViewOptions {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("view options are not valid JSON")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read view options {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("while parsing {}", path.display()))
    }

    pub fn simulation_params(
        &self,
        node_count: usize,
        edge_count: usize,
        center: Pos2,
    ) -> SimulationParams {
        let mut params =
            SimulationParams::tuned(node_count, edge_count, center, self.performance_mode);
        if let Some(distance) = self.link_distance {
            params.link_distance = distance;
        }
        if let Some(strength) = self.charge_strength {
            params.charge_strength = strength;
        }
        if let Some(radius) = self.collision_radius {
            params.collision_radius = radius;
        }
        params
    }

    pub fn parsed_group_colors(&self) -> HashMap<String, Color32> {
        self.group_colors
            .iter()
            .filter_map(|(key, hex)| match Color32::from_hex(hex) {
                Ok(color) => Some((key.clone(), color)),
                Err(error) => {
                    tracing::warn!(group = %key, color = %hex, ?error, "ignoring invalid group colour");
                    None
                }
            })
            .collect()
    }
}
