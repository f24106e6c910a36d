//! Minimum-weight edge cut between two heroes
//!
//! Edge weights are used as capacities of an undirected flow network and the maximum flow is found
//! with breadth-first augmenting paths (Edmonds-Karp). Once no augmenting path is left, the nodes
//! still reachable from the source in the residual network form one side of a minimum cut.

use std::collections::{BTreeSet, VecDeque};

use crate::cluster::Cut;
use crate::error::{AnalysisError, Result};
use crate::graph::algorithms::{bfs_distances, IndexedGraph};
use crate::graph::{Edge, Graph};

/// Residual capacities below this are treated as saturated.
const EPSILON: f64 = 1e-12;

/// Residual network. Undirected edge `e` becomes arcs `2e` (a to b) and `2e + 1` (b to a), each
/// with the edge weight as capacity and each acting as the other's reverse arc.
struct FlowNetwork {
    arcs: Vec<Vec<usize>>,
    heads: Vec<usize>,
    residual: Vec<f64>,
}

impl FlowNetwork {
    fn new(graph: &IndexedGraph) -> Self {
        let mut arcs = vec![Vec::new(); graph.node_count()];
        let mut heads = Vec::with_capacity(graph.edge_slots() * 2);
        let mut residual = Vec::with_capacity(graph.edge_slots() * 2);

        for id in 0..graph.edge_slots() {
            let edge = graph.edge(id);
            arcs[edge.a].push(2 * id);
            heads.push(edge.b);
            residual.push(edge.weight);

            arcs[edge.b].push(2 * id + 1);
            heads.push(edge.a);
            residual.push(edge.weight);
        }

        Self {
            arcs,
            heads,
            residual,
        }
    }

    /// Push flow along one shortest augmenting path, returning the amount pushed.
    fn augment(&mut self, source: usize, sink: usize) -> Option<f64> {
        let mut parent_arc: Vec<Option<usize>> = vec![None; self.arcs.len()];
        let mut visited = vec![false; self.arcs.len()];
        let mut queue = VecDeque::from([source]);
        visited[source] = true;

        while let Some(v) = queue.pop_front() {
            if v == sink {
                break;
            }
            for &arc in &self.arcs[v] {
                let w = self.heads[arc];
                if !visited[w] && self.residual[arc] > EPSILON {
                    visited[w] = true;
                    parent_arc[w] = Some(arc);
                    queue.push_back(w);
                }
            }
        }

        if !visited[sink] {
            return None;
        }

        // Walk back from the sink to find the bottleneck, then apply it.
        let mut path = Vec::new();
        let mut current = sink;
        while let Some(arc) = parent_arc[current] {
            path.push(arc);
            current = self.heads[arc ^ 1];
        }

        let bottleneck = path
            .iter()
            .map(|&arc| self.residual[arc])
            .fold(f64::INFINITY, f64::min);

        for &arc in &path {
            self.residual[arc] -= bottleneck;
            self.residual[arc ^ 1] += bottleneck;
        }

        Some(bottleneck)
    }

    /// Nodes reachable from `source` through arcs with spare capacity.
    fn reachable(&self, source: usize) -> Vec<bool> {
        let mut visited = vec![false; self.arcs.len()];
        let mut queue = VecDeque::from([source]);
        visited[source] = true;

        while let Some(v) = queue.pop_front() {
            for &arc in &self.arcs[v] {
                let w = self.heads[arc];
                if !visited[w] && self.residual[arc] > EPSILON {
                    visited[w] = true;
                    queue.push_back(w);
                }
            }
        }

        visited
    }
}

/// Find the minimum-weight set of edges whose removal separates `source` from `sink`.
///
/// Low weights are cheap to cut. Zero-weight edges cost nothing but may still cross the cut. The
/// caller's graph is never modified; bounding the graph (e.g. to the top-N heroes) beforehand is
/// the caller's responsibility.
pub fn disconnect(graph: &Graph, source: &str, sink: &str) -> Result<Cut> {
    let working = IndexedGraph::from_graph(graph);
    let s = working
        .index_of(source)
        .ok_or_else(|| AnalysisError::UnknownNode(source.to_string()))?;
    let t = working
        .index_of(sink)
        .ok_or_else(|| AnalysisError::UnknownNode(sink.to_string()))?;
    if s == t {
        return Err(AnalysisError::InvalidParameter(format!(
            "cannot disconnect `{source}` from itself"
        )));
    }

    log::info!(
        "Disconnecting {} from {} in a graph with {} nodes and {} edges",
        source,
        sink,
        working.node_count(),
        working.edge_slots()
    );

    let distances = bfs_distances(&working, s);
    if distances[t].is_none() {
        log::info!("{} and {} are already disconnected", source, sink);
        let side_a: Vec<bool> = distances.iter().map(Option::is_some).collect();
        return Ok(build_cut(graph, &working, source, sink, &side_a, Vec::new(), 0.0));
    }

    let mut network = FlowNetwork::new(&working);
    let mut flow_value = 0.0;
    let mut augmentations = 0usize;
    while let Some(pushed) = network.augment(s, t) {
        flow_value += pushed;
        augmentations += 1;
    }

    log::debug!(
        "Max flow {} reached after {} augmenting paths",
        flow_value,
        augmentations
    );

    let side_a = network.reachable(s);
    let removed_edges: Vec<Edge> = (0..working.edge_slots())
        .filter(|&id| {
            let edge = working.edge(id);
            side_a[edge.a] != side_a[edge.b]
        })
        .map(|id| working.to_edge(id, graph))
        .collect();

    let cut = build_cut(graph, &working, source, sink, &side_a, removed_edges, flow_value);

    log::info!(
        "Removed {} edges with total weight {}",
        cut.removed_edges.len(),
        cut.cut_weight
    );

    Ok(cut)
}

fn build_cut(
    graph: &Graph,
    working: &IndexedGraph,
    source: &str,
    sink: &str,
    side_a: &[bool],
    removed_edges: Vec<Edge>,
    flow_value: f64,
) -> Cut {
    let (a, b): (BTreeSet<_>, BTreeSet<_>) = graph.nodes().cloned().partition(|node| {
        working
            .index_of(node)
            .map_or(false, |index| side_a[index])
    });

    Cut {
        source: source.to_string(),
        sink: sink.to_string(),
        cut_weight: removed_edges.iter().map(Edge::weight).sum(),
        flow_value,
        removed_edges,
        side_a: a,
        side_b: b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::source::CollaborationRecord;
    use crate::graph::{build_collaboration_graph, GraphType, NodeKind, Reciprocal};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn weighted(edges: &[(&str, &str, f64)]) -> Graph {
        let mut graph = Graph::new(GraphType::Collaborative);
        for (a, b, w) in edges {
            graph.add_edge(*a, *b, *w, 1).unwrap();
        }
        graph
    }

    fn assert_valid(graph: &Graph, cut: &Cut) {
        assert!(cut.side_a.is_disjoint(&cut.side_b));
        assert_eq!(cut.side_a.len() + cut.side_b.len(), graph.node_count());
        assert!(cut.side_a.contains(&cut.source));
        assert!(cut.side_b.contains(&cut.sink));

        let removed_weight: f64 = cut.removed_edges.iter().map(Edge::weight).sum();
        assert!(close(cut.cut_weight, removed_weight));

        for edge in graph.edges() {
            let crosses = cut.side_a.contains(edge.source()) != cut.side_a.contains(edge.target());
            assert_eq!(crosses, cut.removed_edges.contains(edge));
        }
    }

    #[test]
    fn cuts_the_cheapest_edge_of_a_path() {
        let records = vec![
            CollaborationRecord::new("A", "B"),
            CollaborationRecord::new("A", "B"),
            CollaborationRecord::new("B", "C"),
        ];
        let graph = build_collaboration_graph(records, &Reciprocal).unwrap();

        let cut = disconnect(&graph, "A", "C").unwrap();

        assert_valid(&graph, &cut);
        assert_eq!(cut.num_links(), 1);
        assert_eq!(cut.removed_edges[0].source(), "A");
        assert_eq!(cut.removed_edges[0].target(), "B");
        assert!(close(cut.cut_weight, 0.5));
        assert!(close(cut.flow_value, 0.5));
        assert_eq!(cut.side_a, BTreeSet::from(["A".to_string()]));
        assert_eq!(
            cut.side_b,
            BTreeSet::from(["B".to_string(), "C".to_string()])
        );
    }

    #[test]
    fn cuts_parallel_routes() {
        // Two routes from s to t; the cheapest cut takes the weakest link of each.
        let graph = weighted(&[
            ("s", "a", 3.0),
            ("a", "t", 1.0),
            ("s", "b", 0.5),
            ("b", "t", 2.0),
            ("a", "b", 4.0),
        ]);

        let cut = disconnect(&graph, "s", "t").unwrap();

        assert_valid(&graph, &cut);
        assert!(close(cut.cut_weight, 3.0));
        assert!(close(cut.flow_value, cut.cut_weight));
    }

    #[test]
    fn max_flow_matches_cut_weight_on_denser_graph() {
        let graph = weighted(&[
            ("a", "b", 0.2),
            ("a", "c", 0.7),
            ("b", "c", 0.1),
            ("b", "d", 0.9),
            ("c", "d", 0.3),
            ("c", "e", 0.6),
            ("d", "e", 0.4),
        ]);

        let cut = disconnect(&graph, "a", "e").unwrap();

        assert_valid(&graph, &cut);
        assert!(close(cut.flow_value, cut.cut_weight));
        // Isolating `a` costs 0.9 and the network can carry that much.
        assert!(close(cut.cut_weight, 0.9));
        assert_eq!(cut.side_a, BTreeSet::from(["a".to_string()]));
    }

    #[test]
    fn zero_weight_edges_are_free_to_cut() {
        let graph = weighted(&[("a", "b", 0.0), ("b", "c", 1.0)]);

        let cut = disconnect(&graph, "a", "c").unwrap();

        assert_valid(&graph, &cut);
        assert_eq!(cut.cut_weight, 0.0);
        assert_eq!(cut.num_links(), 1);
        assert_eq!(cut.removed_edges[0].weight(), 0.0);
    }

    #[test]
    fn already_disconnected_nodes() {
        let mut graph = weighted(&[("a", "b", 1.0), ("c", "d", 1.0)]);
        graph.add_node("e", NodeKind::Hero);

        let cut = disconnect(&graph, "a", "d").unwrap();

        assert_eq!(cut.cut_weight, 0.0);
        assert!(cut.removed_edges.is_empty());
        assert_eq!(
            cut.side_a,
            BTreeSet::from(["a".to_string(), "b".to_string()])
        );
        assert_eq!(cut.side_b.len(), 3);
    }

    #[test]
    fn unknown_and_identical_nodes_are_rejected() {
        let graph = weighted(&[("a", "b", 1.0)]);

        assert!(matches!(
            disconnect(&graph, "a", "z"),
            Err(AnalysisError::UnknownNode(node)) if node == "z"
        ));
        assert!(matches!(
            disconnect(&graph, "a", "a"),
            Err(AnalysisError::InvalidParameter(_))
        ));
    }

    #[test]
    fn caller_graph_is_untouched() {
        let graph = weighted(&[("a", "b", 1.0), ("b", "c", 1.0)]);

        let cut = disconnect(&graph, "a", "c").unwrap();
        let (graph_a, graph_b) = cut.graphs(&graph);

        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph_a.node_count() + graph_b.node_count(), 3);
    }
}
