//! Graph algorithms for analysis
//!
//! The analysis passes run on [`IndexedGraph`], a dense index-based working copy of a [`Graph`].
//! Nodes are numbered in ascending name order and edges in ascending endpoint-pair order, so every
//! traversal visits things in the same order on every run.

use std::collections::{HashMap, VecDeque};

use rayon::prelude::*;

use crate::graph::{Edge, Graph, Node};

/// An edge of the working copy, endpoints as node indices with `a < b`.
#[derive(Debug, Clone)]
pub struct IndexedEdge {
    pub a: usize,
    pub b: usize,
    pub weight: f64,
}

/// Index-based private copy of a graph. Edges can be removed without touching the source graph.
#[derive(Debug, Clone)]
pub struct IndexedGraph {
    nodes: Vec<Node>,
    index: HashMap<Node, usize>,
    edges: Vec<IndexedEdge>,
    /// `(neighbour, edge id)` pairs sorted by neighbour index
    adjacency: Vec<Vec<(usize, usize)>>,
    removed: Vec<bool>,
    live_edges: usize,
}

impl IndexedGraph {
    pub fn from_graph(graph: &Graph) -> Self {
        let nodes: Vec<Node> = graph.nodes().cloned().collect();
        let index: HashMap<Node, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.clone(), i))
            .collect();

        let mut adjacency = vec![Vec::new(); nodes.len()];
        let mut edges = Vec::with_capacity(graph.edge_count());
        for (id, edge) in graph.edges().enumerate() {
            let a = index[edge.source()];
            let b = index[edge.target()];
            adjacency[a].push((b, id));
            adjacency[b].push((a, id));
            edges.push(IndexedEdge {
                a,
                b,
                weight: edge.weight(),
            });
        }

        for list in &mut adjacency {
            list.sort_unstable();
        }

        let live_edges = edges.len();
        Self {
            removed: vec![false; edges.len()],
            nodes,
            index,
            edges,
            adjacency,
            live_edges,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn index_of(&self, node: &str) -> Option<usize> {
        self.index.get(node).copied()
    }

    pub fn edge(&self, id: usize) -> &IndexedEdge {
        &self.edges[id]
    }

    /// Total edges, including removed ones. Edge ids range over `0..edge_slots()`.
    pub fn edge_slots(&self) -> usize {
        self.edges.len()
    }

    pub fn live_edge_count(&self) -> usize {
        self.live_edges
    }

    pub fn is_removed(&self, id: usize) -> bool {
        self.removed[id]
    }

    /// Removes an edge from the working copy. Returns `false` if it was already gone.
    pub fn remove_edge(&mut self, id: usize) -> bool {
        if self.removed[id] {
            return false;
        }
        self.removed[id] = true;
        self.live_edges -= 1;
        true
    }

    /// Live `(neighbour, edge id)` pairs of `v`.
    pub fn neighbors(&self, v: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.adjacency[v]
            .iter()
            .copied()
            .filter(move |&(_, id)| !self.removed[id])
    }

    /// Converts a working-copy edge back to a graph edge, taking the raw count from `graph`.
    pub fn to_edge(&self, id: usize, graph: &Graph) -> Edge {
        let edge = &self.edges[id];
        let (a, b) = (&self.nodes[edge.a], &self.nodes[edge.b]);
        let raw_count = graph.edge(a, b).map_or(0, Edge::raw_count);
        Edge::new(a.clone(), b.clone(), edge.weight, raw_count)
    }

    /// Connected components over live edges, each sorted, ordered by smallest member.
    pub fn components(&self) -> Vec<Vec<usize>> {
        let mut sets = DisjointSets::new(self.node_count());
        for (id, edge) in self.edges.iter().enumerate() {
            if !self.removed[id] {
                sets.union(edge.a, edge.b);
            }
        }

        let mut by_root: HashMap<usize, usize> = HashMap::new();
        let mut components: Vec<Vec<usize>> = Vec::new();
        // Nodes are visited in index order, so components come out ordered by smallest member.
        for v in 0..self.node_count() {
            let root = sets.find(v);
            let slot = *by_root.entry(root).or_insert_with(|| {
                components.push(Vec::new());
                components.len() - 1
            });
            components[slot].push(v);
        }

        components
    }

    pub fn component_count(&self) -> usize {
        let mut sets = DisjointSets::new(self.node_count());
        for (id, edge) in self.edges.iter().enumerate() {
            if !self.removed[id] {
                sets.union(edge.a, edge.b);
            }
        }
        sets.count()
    }
}

/// Union-Find data structure for connected component analysis
pub struct DisjointSets {
    /// Parent pointers (parent[i] = parent of node i)
    parent: Vec<usize>,

    /// Size of each set (for union by size)
    size: Vec<usize>,

    /// Number of disjoint sets
    sets: usize,
}

impl DisjointSets {
    /// Create a new DisjointSets data structure
    pub fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
            size: vec![1; size],
            sets: size,
        }
    }

    /// Find the root of the set containing x with path compression
    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }

        // Path compression: point everything on the way at the root
        let mut current = x;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }

        root
    }

    /// Union the sets containing x and y
    pub fn union(&mut self, x: usize, y: usize) {
        let root_x = self.find(x);
        let root_y = self.find(y);

        if root_x == root_y {
            return;
        }

        // Attach smaller tree under root of larger tree
        if self.size[root_x] >= self.size[root_y] {
            self.parent[root_y] = root_x;
            self.size[root_x] += self.size[root_y];
        } else {
            self.parent[root_x] = root_y;
            self.size[root_y] += self.size[root_x];
        }
        self.sets -= 1;
    }

    pub fn count(&self) -> usize {
        self.sets
    }
}

/// Unweighted shortest-path DAG rooted at one source, as used by Brandes' accumulation.
pub struct ShortestPaths {
    /// Nodes in non-decreasing distance from the source
    pub order: Vec<usize>,
    /// Number of shortest paths from the source to each node
    pub sigma: Vec<f64>,
    /// `(predecessor, edge id)` pairs on shortest paths into each node
    pub predecessors: Vec<Vec<(usize, usize)>>,
    pub distance: Vec<Option<usize>>,
}

/// Breadth-first search counting shortest paths from `source` over live edges.
pub fn shortest_paths(graph: &IndexedGraph, source: usize) -> ShortestPaths {
    let n = graph.node_count();
    let mut order = Vec::with_capacity(n);
    let mut sigma = vec![0.0; n];
    let mut predecessors = vec![Vec::new(); n];
    let mut distance: Vec<Option<usize>> = vec![None; n];
    let mut queue = VecDeque::new();

    sigma[source] = 1.0;
    distance[source] = Some(0);
    queue.push_back(source);

    while let Some(v) = queue.pop_front() {
        order.push(v);
        let next_distance = distance[v].map(|d| d + 1);
        for (w, id) in graph.neighbors(v) {
            if distance[w].is_none() {
                distance[w] = next_distance;
                queue.push_back(w);
            }
            if distance[w] == next_distance {
                sigma[w] += sigma[v];
                predecessors[w].push((v, id));
            }
        }
    }

    ShortestPaths {
        order,
        sigma,
        predecessors,
        distance,
    }
}

/// Hop distances from `source`; `None` for unreachable nodes.
pub fn bfs_distances(graph: &IndexedGraph, source: usize) -> Vec<Option<usize>> {
    let mut distance = vec![None; graph.node_count()];
    let mut queue = VecDeque::from([source]);
    distance[source] = Some(0);

    while let Some(v) = queue.pop_front() {
        let next = distance[v].map(|d| d + 1);
        for (w, _) in graph.neighbors(v) {
            if distance[w].is_none() {
                distance[w] = next;
                queue.push_back(w);
            }
        }
    }

    distance
}

/// Per-source dependency contributions: `(node scores, edge scores)`.
fn dependencies(graph: &IndexedGraph, source: usize) -> (Vec<f64>, Vec<f64>) {
    let paths = shortest_paths(graph, source);
    let mut delta = vec![0.0; graph.node_count()];
    let mut edge_scores = vec![0.0; graph.edge_slots()];

    for &w in paths.order.iter().rev() {
        for &(v, id) in &paths.predecessors[w] {
            let share = paths.sigma[v] / paths.sigma[w] * (1.0 + delta[w]);
            edge_scores[id] += share;
            delta[v] += share;
        }
    }
    delta[source] = 0.0;

    (delta, edge_scores)
}

/// Runs [`dependencies`] for every source in parallel and sums the results in source order, so
/// the floating-point result does not depend on thread scheduling.
fn accumulate(graph: &IndexedGraph) -> (Vec<f64>, Vec<f64>) {
    let contributions: Vec<(Vec<f64>, Vec<f64>)> = (0..graph.node_count())
        .into_par_iter()
        .map(|source| dependencies(graph, source))
        .collect();

    let mut node_scores = vec![0.0; graph.node_count()];
    let mut edge_scores = vec![0.0; graph.edge_slots()];
    for (nodes, edges) in contributions {
        for (total, value) in node_scores.iter_mut().zip(nodes) {
            *total += value;
        }
        for (total, value) in edge_scores.iter_mut().zip(edges) {
            *total += value;
        }
    }

    (node_scores, edge_scores)
}

/// Edge betweenness of every live edge, indexed by edge id (removed edges score `0`).
///
/// Each unordered pair of endpoints is counted once. With `normalize` the scores are divided by
/// the number of node pairs, `n (n - 1) / 2`.
pub fn edge_betweenness(graph: &IndexedGraph, normalize: bool) -> Vec<f64> {
    let (_, mut scores) = accumulate(graph);
    let n = graph.node_count() as f64;
    let divisor = if normalize && n > 1.0 {
        n * (n - 1.0)
    } else {
        // Every path was counted from both ends.
        2.0
    };

    for score in &mut scores {
        *score /= divisor;
    }
    scores
}

/// Node betweenness indexed by node. With `normalize` the scores are divided by the number of
/// pairs not involving the node, `(n - 1) (n - 2) / 2`.
pub fn node_betweenness(graph: &IndexedGraph, normalize: bool) -> Vec<f64> {
    let (mut scores, _) = accumulate(graph);
    let n = graph.node_count() as f64;
    let divisor = if normalize && n > 2.0 {
        (n - 1.0) * (n - 2.0)
    } else {
        2.0
    };

    for score in &mut scores {
        *score /= divisor;
    }
    scores
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphType;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn graph_from(edges: &[(&str, &str)]) -> Graph {
        let mut graph = Graph::new(GraphType::Collaborative);
        for (a, b) in edges {
            graph.add_edge(*a, *b, 1.0, 1).unwrap();
        }
        graph
    }

    fn edge_id(graph: &IndexedGraph, a: &str, b: &str) -> usize {
        let (a, b) = (graph.index_of(a).unwrap(), graph.index_of(b).unwrap());
        graph
            .neighbors(a)
            .find(|&(w, _)| w == b)
            .map(|(_, id)| id)
            .unwrap()
    }

    #[test]
    fn disjoint_sets() {
        let mut sets = DisjointSets::new(4);
        sets.union(0, 1);
        sets.union(2, 3);
        sets.union(1, 0);

        assert_eq!(sets.count(), 2);
        assert_eq!(sets.find(0), sets.find(1));
        assert_ne!(sets.find(1), sets.find(2));
    }

    #[test]
    fn indexed_copy_follows_graph_order() {
        let graph = graph_from(&[("c", "a"), ("b", "a")]);
        let indexed = IndexedGraph::from_graph(&graph);

        assert_eq!(indexed.nodes(), &["a", "b", "c"]);
        assert_eq!(indexed.edge(0).a, 0);
        assert_eq!(indexed.edge(0).b, 1);
        assert_eq!(indexed.live_edge_count(), 2);
    }

    #[test]
    fn removing_edges_splits_components() {
        let graph = graph_from(&[("a", "b"), ("b", "c")]);
        let mut indexed = IndexedGraph::from_graph(&graph);
        assert_eq!(indexed.component_count(), 1);

        let id = edge_id(&indexed, "b", "c");
        assert!(indexed.remove_edge(id));
        assert!(!indexed.remove_edge(id));

        assert_eq!(indexed.component_count(), 2);
        assert_eq!(indexed.components(), vec![vec![0, 1], vec![2]]);
        // The source graph keeps its edge.
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn shortest_path_counts_on_square() {
        let graph = graph_from(&[("a", "b"), ("b", "d"), ("a", "c"), ("c", "d")]);
        let indexed = IndexedGraph::from_graph(&graph);

        let paths = shortest_paths(&indexed, 0);

        assert_eq!(paths.sigma[3], 2.0);
        assert_eq!(paths.distance[3], Some(2));
        assert_eq!(paths.predecessors[3].len(), 2);
    }

    #[test]
    fn bfs_distances_mark_unreachable() {
        let mut graph = graph_from(&[("a", "b")]);
        graph.add_node("z", crate::graph::NodeKind::Hero);
        let indexed = IndexedGraph::from_graph(&graph);

        assert_eq!(bfs_distances(&indexed, 0), vec![Some(0), Some(1), None]);
    }

    #[test]
    fn path_betweenness() {
        // a - b - c
        let graph = graph_from(&[("a", "b"), ("b", "c")]);
        let indexed = IndexedGraph::from_graph(&graph);

        let nodes = node_betweenness(&indexed, false);
        assert!(close(nodes[0], 0.0));
        assert!(close(nodes[1], 1.0));
        assert!(close(nodes[2], 0.0));

        // Each edge carries the pair of its endpoints and the a-c pair.
        let edges = edge_betweenness(&indexed, false);
        assert!(close(edges[0], 2.0));
        assert!(close(edges[1], 2.0));

        let normalized = node_betweenness(&indexed, true);
        assert!(close(normalized[1], 1.0));
    }

    #[test]
    fn betweenness_ignores_thread_count() {
        let graph = graph_from(&[
            ("a", "b"),
            ("a", "c"),
            ("b", "c"),
            ("b", "d"),
            ("c", "e"),
            ("d", "e"),
            ("d", "f"),
            ("e", "g"),
            ("f", "g"),
            ("f", "h"),
            ("g", "h"),
        ]);
        let indexed = IndexedGraph::from_graph(&graph);

        let run = |threads: usize| {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .unwrap();
            pool.install(|| {
                (
                    edge_betweenness(&indexed, false),
                    node_betweenness(&indexed, true),
                )
            })
        };

        let (single_edges, single_nodes) = run(1);
        let (many_edges, many_nodes) = run(4);

        let bits = |scores: &[f64]| scores.iter().map(|s| s.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&single_edges), bits(&many_edges));
        assert_eq!(bits(&single_nodes), bits(&many_nodes));
    }

    #[test]
    fn bridge_has_highest_edge_betweenness() {
        let graph = graph_from(&[
            ("a1", "a2"),
            ("a2", "m"),
            ("m", "a1"),
            ("m", "n"),
            ("n", "b1"),
            ("b1", "b2"),
            ("b2", "n"),
        ]);
        let indexed = IndexedGraph::from_graph(&graph);

        let scores = edge_betweenness(&indexed, false);
        let bridge = edge_id(&indexed, "m", "n");

        // Three nodes on each side: nine pairs cross the bridge.
        assert!(close(scores[bridge], 9.0));
        for (id, score) in scores.iter().enumerate() {
            if id != bridge {
                assert!(*score < scores[bridge]);
            }
        }
    }
}
