use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use eframe::egui::{Pos2, Vec2, pos2};
use serde::{Deserialize, Deserializer, Serialize};

mod ingest;

pub use ingest::{EdgeAggregation, GroupBy, IngestOptions, build_render_graph};

use crate::spatial::{GROUP_NODE_HIT_RADIUS, NODE_HIT_RADIUS};

pub const NODE_RADIUS: f32 = 10.0;
pub const GROUP_NODE_RADIUS: f32 = 18.0;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TopologySnapshot {
    #[serde(default, deserialize_with = "null_as_default")]
    pub nodes: Vec<SnapshotNode>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub edges: Vec<SnapshotEdge>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotNode {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub is_internal: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub is_critical: bool,
    pub asset_type: Option<String>,
    pub group_key: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub is_group_node: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub group_node_count: usize,
    #[serde(deserialize_with = "null_as_default")]
    pub is_entry_point: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotEdge {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub source: String,
    #[serde(deserialize_with = "null_as_default")]
    pub target: String,
    pub target_port: Option<u16>,
    #[serde(deserialize_with = "null_as_default")]
    pub protocol: u8,
    #[serde(deserialize_with = "null_as_default")]
    pub bytes_total: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub is_critical: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub is_gateway_edge: bool,
}

/// Reads an explicit JSON `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl TopologySnapshot {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("topology snapshot is not valid JSON")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read topology snapshot {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("while parsing {}", path.display()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SavedPosition {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SavedLayout {
    pub positions: BTreeMap<String, SavedPosition>,
}

impl SavedLayout {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read saved layout {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("saved layout {} is not valid JSON", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self).context("failed to encode saved layout")?;
        fs::write(path, text)
            .with_context(|| format!("failed to write saved layout {}", path.display()))
    }

    pub fn get(&self, id: &str) -> Option<Pos2> {
        self.positions
            .get(id)
            .map(|position| pos2(position.x, position.y))
    }

    pub fn insert(&mut self, id: impl Into<String>, position: Pos2) {
        self.positions.insert(
            id.into(),
            SavedPosition {
                x: position.x,
                y: position.y,
            },
        );
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupInfo {
    pub key: String,
    pub node_count: usize,
}

#[derive(Clone, Debug)]
pub struct RenderNode {
    pub id: String,
    pub name: String,
    pub is_internal: bool,
    pub is_critical: bool,
    pub is_entry_point: bool,
    pub asset_type: Option<String>,
    pub group_key: Option<String>,
    pub group: Option<GroupInfo>,
    pub pos: Pos2,
    pub velocity: Vec2,
    pub pin: Option<Pos2>,
}

impl RenderNode {
    pub fn new(id: &str, name: &str, is_internal: bool, pos: Pos2) -> Self {
        Self {
            id: id.to_owned(),
            name: name.to_owned(),
            is_internal,
            is_critical: false,
            is_entry_point: false,
            asset_type: None,
            group_key: None,
            group: None,
            pos,
            velocity: Vec2::ZERO,
            pin: None,
        }
    }

    pub fn is_group_node(&self) -> bool {
        self.group.is_some()
    }

    pub fn radius(&self) -> f32 {
        if self.is_group_node() {
            GROUP_NODE_RADIUS
        } else {
            NODE_RADIUS
        }
    }

    pub fn hit_radius(&self) -> f32 {
        if self.is_group_node() {
            GROUP_NODE_HIT_RADIUS
        } else {
            NODE_HIT_RADIUS
        }
    }

    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderEdge {
    pub id: String,
    pub source: usize,
    pub target: usize,
    pub target_ports: BTreeSet<u16>,
    pub protocol: u8,
    pub bytes_total: u64,
    pub is_critical: bool,
    pub is_gateway_edge: bool,
    pub aggregated_count: usize,
}

impl RenderEdge {
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }

    pub fn is_aggregated(&self) -> bool {
        self.aggregated_count > 1
    }

    pub fn label(&self) -> String {
        let protocol = protocol_name(self.protocol);
        match self.target_ports.len() {
            0 => protocol.map(str::to_owned).unwrap_or_default(),
            1 => {
                let port = self.target_ports.iter().next().copied().unwrap_or_default();
                match protocol {
                    Some(protocol) => format!("{port}/{protocol}"),
                    None => port.to_string(),
                }
            }
            count => format!("{count} ports"),
        }
    }
}

pub fn protocol_name(protocol: u8) -> Option<&'static str> {
    match protocol {
        1 => Some("ICMP"),
        6 => Some("TCP"),
        17 => Some("UDP"),
        47 => Some("GRE"),
        50 => Some("ESP"),
        58 => Some("ICMPv6"),
        132 => Some("SCTP"),
        _ => None,
    }
}

#[derive(Clone, Debug, Default)]
pub struct RenderGraph {
    pub nodes: Vec<RenderNode>,
    pub edges: Vec<RenderEdge>,
    pub index_by_id: HashMap<String, usize>,
    /// Raw edges discarded because an endpoint was not in the node set.
    pub dropped_edges: usize,
}

impl RenderGraph {
    pub fn node(&self, id: &str) -> Option<&RenderNode> {
        self.index_by_id.get(id).map(|&index| &self.nodes[index])
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn link_pairs(&self) -> Vec<(usize, usize)> {
        self.edges
            .iter()
            .map(|edge| (edge.source, edge.target))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_fields_default_when_missing() {
        let snapshot = TopologySnapshot::from_json(
            r#"{
                "nodes": [{ "id": "a", "name": "web-1", "is_internal": true }],
                "edges": [{ "id": "e1", "source": "a", "target": "a" }]
            }"#,
        )
        .expect("valid snapshot");
        let edge = &snapshot.edges[0];
        assert_eq!(edge.target_port, None);
        assert_eq!(edge.bytes_total, 0);
        assert_eq!(edge.protocol, 0);
        assert!(!snapshot.nodes[0].is_critical);
    }

    #[test]
    fn malformed_snapshot_is_an_error() {
        let error = TopologySnapshot::from_json("{ nodes: ").expect_err("invalid json");
        assert!(error.to_string().contains("not valid JSON"));
    }

    #[test]
    fn saved_layout_is_a_plain_map() {
        let layout: SavedLayout =
            serde_json::from_str(r#"{ "a": { "x": 1.5, "y": -2.0 } }"#).expect("valid layout");
        assert_eq!(layout.get("a"), Some(pos2(1.5, -2.0)));
        assert_eq!(layout.get("b"), None);
    }

    #[test]
    fn edge_labels_describe_ports() {
        let mut edge = RenderEdge {
            id: "e".into(),
            source: 0,
            target: 1,
            target_ports: BTreeSet::from([443]),
            protocol: 6,
            bytes_total: 0,
            is_critical: false,
            is_gateway_edge: false,
            aggregated_count: 1,
        };
        assert_eq!(edge.label(), "443/TCP");
        edge.target_ports.insert(80);
        assert_eq!(edge.label(), "2 ports");
        edge.target_ports.clear();
        edge.protocol = 0;
        assert_eq!(edge.label(), "");
    }
}
