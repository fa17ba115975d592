use std::collections::{HashSet, VecDeque};

use topology_canvas::HighlightSelection;
use topology_canvas::topology::RenderGraph;

/// Everything that can reach `selected` (upstream) and everything it can
/// reach (downstream), with the edges that carry those paths.
pub(super) fn path_highlight(graph: &RenderGraph, selected: usize) -> HighlightSelection {
    if selected >= graph.nodes.len() {
        return HighlightSelection::default();
    }

    let mut outgoing = vec![Vec::new(); graph.nodes.len()];
    let mut incoming = vec![Vec::new(); graph.nodes.len()];
    for (index, edge) in graph.edges.iter().enumerate() {
        outgoing[edge.source].push((index, edge.target));
        incoming[edge.target].push((index, edge.source));
    }

    let (downstream, down_edges) = reach(&outgoing, selected);
    let (upstream, up_edges) = reach(&incoming, selected);

    let ids = |nodes: HashSet<usize>| {
        nodes
            .into_iter()
            .filter(|&node| node != selected)
            .map(|node| graph.nodes[node].id.clone())
            .collect::<HashSet<_>>()
    };
    let edges = down_edges
        .into_iter()
        .chain(up_edges)
        .map(|edge| graph.edges[edge].id.clone())
        .collect();

    HighlightSelection {
        upstream: ids(upstream),
        downstream: ids(downstream),
        edges,
    }
}

fn reach(adjacency: &[Vec<(usize, usize)>], start: usize) -> (HashSet<usize>, HashSet<usize>) {
    let mut nodes = HashSet::from([start]);
    let mut edges = HashSet::new();
    let mut queue = VecDeque::from([start]);

    while let Some(node) = queue.pop_front() {
        for &(edge, next) in &adjacency[node] {
            edges.insert(edge);
            if nodes.insert(next) {
                queue.push_back(next);
            }
        }
    }

    (nodes, edges)
}
