use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};

use anyhow::{Result, bail};
use eframe::egui::Pos2;
use serde::{Deserialize, Serialize};

use super::{GroupInfo, RenderEdge, RenderGraph, RenderNode, TopologySnapshot};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeAggregation {
    #[default]
    None,
    ByEndpoints,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    #[default]
    Explicit,
    AssetType,
    Zone,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestOptions {
    pub edge_aggregation: EdgeAggregation,
    pub grouping: GroupBy,
}

/// Duplicate node ids are rejected. Edges whose source or target is not in
/// the node set are dropped and counted, never reported as errors. All
/// positions start at the origin; seeding happens when the view loads.
pub fn build_render_graph(
    snapshot: &TopologySnapshot,
    options: &IngestOptions,
) -> Result<RenderGraph> {
    let mut index_by_id = HashMap::with_capacity(snapshot.nodes.len());
    let mut nodes = Vec::with_capacity(snapshot.nodes.len());

    for (index, record) in snapshot.nodes.iter().enumerate() {
        if index_by_id.insert(record.id.clone(), index).is_some() {
            bail!("duplicate node id `{}` in topology snapshot", record.id);
        }

        let group_key = match options.grouping {
            GroupBy::Explicit => record.group_key.clone(),
            GroupBy::AssetType => record.asset_type.clone(),
            GroupBy::Zone => Some(if record.is_internal { "internal" } else { "external" }.to_owned()),
        };
        let group = record.is_group_node.then(|| GroupInfo {
            key: record.group_key.clone().unwrap_or_else(|| record.id.clone()),
            node_count: record.group_node_count.max(1),
        });

        nodes.push(RenderNode {
            id: record.id.clone(),
            name: record.name.clone(),
            is_internal: record.is_internal,
            is_critical: record.is_critical,
            is_entry_point: record.is_entry_point,
            asset_type: record.asset_type.clone(),
            group_key,
            group,
            ..RenderNode::new(&record.id, &record.name, record.is_internal, Pos2::ZERO)
        });
    }

    let mut edges: Vec<RenderEdge> = Vec::with_capacity(snapshot.edges.len());
    let mut by_endpoints: HashMap<(usize, usize), usize> = HashMap::new();
    let mut dropped_edges = 0usize;

    for record in &snapshot.edges {
        let (Some(&source), Some(&target)) = (
            index_by_id.get(&record.source),
            index_by_id.get(&record.target),
        ) else {
            dropped_edges += 1;
            continue;
        };

        if options.edge_aggregation == EdgeAggregation::ByEndpoints {
            match by_endpoints.entry((source, target)) {
                Entry::Occupied(slot) => {
                    let edge = &mut edges[*slot.get()];
                    edge.target_ports.extend(record.target_port);
                    edge.bytes_total = edge.bytes_total.saturating_add(record.bytes_total);
                    edge.is_critical |= record.is_critical;
                    edge.is_gateway_edge |= record.is_gateway_edge;
                    edge.aggregated_count += 1;
                    continue;
                }
                Entry::Vacant(slot) => {
                    slot.insert(edges.len());
                }
            }
        }

        edges.push(RenderEdge {
            id: record.id.clone(),
            source,
            target,
            target_ports: record.target_port.into_iter().collect::<BTreeSet<_>>(),
            protocol: record.protocol,
            bytes_total: record.bytes_total,
            is_critical: record.is_critical,
            is_gateway_edge: record.is_gateway_edge,
            aggregated_count: 1,
        });
    }

    if dropped_edges > 0 {
        tracing::debug!(
            dropped_edges,
            "dropped edges referencing nodes outside the snapshot"
        );
    }

    Ok(RenderGraph {
        nodes,
        edges,
        index_by_id,
        dropped_edges,
    })
}
