//! Weighted undirected graph of heroes (and comics)

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Canonicalized node name.
pub type Node = String;

/// Which construction mode produced a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraphType {
    /// Heroes are nodes, edges are weighted by how often two heroes share a comic.
    Collaborative,
    /// Heroes and comics are nodes, an edge means a hero appeared in a comic.
    HeroComic,
}

/// Node attribute distinguishing heroes from comics in the membership graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Hero,
    Comic,
}

impl FromStr for NodeKind {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hero" => Ok(NodeKind::Hero),
            "comic" => Ok(NodeKind::Comic),
            other => Err(AnalysisError::MalformedInput(format!(
                "unknown node type `{other}`, expected `hero` or `comic`"
            ))),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Hero => f.write_str("hero"),
            NodeKind::Comic => f.write_str("comic"),
        }
    }
}

/// An undirected edge. The endpoints are stored in ascending order so `(a, b)` and `(b, a)`
/// produce the same edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    source: Node,
    target: Node,
    weight: f64,
    raw_count: u32,
}

impl Edge {
    /// Creates an edge between two nodes.
    ///
    /// # Examples
    ///
    /// ```
    /// use hero_network_analyzer::graph::Edge;
    ///
    /// let edge = Edge::new("THOR", "CAPTAIN AMERICA", 0.5, 2);
    /// assert_eq!(edge.source(), "CAPTAIN AMERICA");
    /// assert_eq!(edge, Edge::new("CAPTAIN AMERICA", "THOR", 0.5, 2));
    /// ```
    pub fn new(a: impl Into<Node>, b: impl Into<Node>, weight: f64, raw_count: u32) -> Self {
        let (a, b) = (a.into(), b.into());
        let (source, target) = if a <= b { (a, b) } else { (b, a) };
        Self {
            source,
            target,
            weight,
            raw_count,
        }
    }

    /// The smaller endpoint.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The larger endpoint.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Number of source co-occurrences collapsed into this edge.
    pub fn raw_count(&self) -> u32 {
        self.raw_count
    }

    pub fn contains(&self, node: &str) -> bool {
        self.source == node || self.target == node
    }

    /// Returns the endpoint opposite `node`, or `None` if `node` is not on this edge.
    pub fn other(&self, node: &str) -> Option<&str> {
        if self.source == node {
            Some(&self.target)
        } else if self.target == node {
            Some(&self.source)
        } else {
            None
        }
    }

    fn key(&self) -> (Node, Node) {
        (self.source.clone(), self.target.clone())
    }
}

/// A pair of heroes and how many comics they share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collaboration {
    pub hero1: Node,
    pub hero2: Node,
    pub n_collabs: u32,
}

/// A comic and the number of heroes appearing in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComicAppearances {
    pub name: Node,
    pub n_heroes: usize,
}

/// A weighted, undirected simple graph.
///
/// Nodes, edges and adjacency are kept in ordered maps so every enumeration (and therefore every
/// algorithm built on top) is deterministic.
#[derive(Debug, Clone)]
pub struct Graph {
    graph_type: GraphType,
    nodes: BTreeMap<Node, NodeKind>,
    edges: BTreeMap<(Node, Node), Edge>,
    adjacency: BTreeMap<Node, BTreeSet<Node>>,
}

impl Graph {
    /// Creates an empty graph.
    pub fn new(graph_type: GraphType) -> Self {
        Self {
            graph_type,
            nodes: BTreeMap::new(),
            edges: BTreeMap::new(),
            adjacency: BTreeMap::new(),
        }
    }

    pub fn graph_type(&self) -> GraphType {
        self.graph_type
    }

    /// Inserts a node, returning `false` if it was already present. The kind of an existing node
    /// is left untouched.
    pub fn add_node(&mut self, node: impl Into<Node>, kind: NodeKind) -> bool {
        let node = node.into();
        if self.nodes.contains_key(&node) {
            return false;
        }
        self.adjacency.insert(node.clone(), BTreeSet::new());
        self.nodes.insert(node, kind);
        true
    }

    /// Inserts (or replaces) the edge between `a` and `b`. Missing endpoints are added as heroes.
    ///
    /// Self-loops are dropped and reported as `Ok(false)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use hero_network_analyzer::graph::{Graph, GraphType};
    ///
    /// let mut graph = Graph::new(GraphType::Collaborative);
    /// assert!(graph.add_edge("IRON MAN", "THOR", 1.0, 1).unwrap());
    /// assert!(!graph.add_edge("THOR", "THOR", 1.0, 1).unwrap());
    /// assert_eq!(graph.edge_count(), 1);
    /// ```
    pub fn add_edge(
        &mut self,
        a: impl Into<Node>,
        b: impl Into<Node>,
        weight: f64,
        raw_count: u32,
    ) -> Result<bool> {
        if weight.is_nan() || weight.is_infinite() || weight < 0.0 {
            return Err(AnalysisError::InvalidParameter(format!(
                "edge weight must be a finite non-negative number, got {weight}"
            )));
        }

        let edge = Edge::new(a, b, weight, raw_count);
        if edge.source == edge.target {
            return Ok(false);
        }

        self.add_node(edge.source.clone(), NodeKind::Hero);
        self.add_node(edge.target.clone(), NodeKind::Hero);
        self.link(&edge.source, &edge.target);
        self.edges.insert(edge.key(), edge);

        Ok(true)
    }

    /// Removes the edge between `a` and `b`, returning it if it existed.
    pub fn remove_edge(&mut self, a: &str, b: &str) -> Option<Edge> {
        let key = ordered_key(a, b);
        let removed = self.edges.remove(&key)?;
        if let Some(neighbours) = self.adjacency.get_mut(a) {
            neighbours.remove(b);
        }
        if let Some(neighbours) = self.adjacency.get_mut(b) {
            neighbours.remove(a);
        }
        Some(removed)
    }

    pub fn contains_node(&self, node: &str) -> bool {
        self.nodes.contains_key(node)
    }

    pub fn node_kind(&self, node: &str) -> Option<NodeKind> {
        self.nodes.get(node).copied()
    }

    /// Nodes in ascending order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.keys()
    }

    /// Nodes of the given kind, in ascending order.
    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &Node> {
        self.nodes
            .iter()
            .filter(move |(_, k)| **k == kind)
            .map(|(node, _)| node)
    }

    /// Edges sorted by endpoint pair.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Looks up an edge by either endpoint order.
    pub fn edge(&self, a: &str, b: &str) -> Option<&Edge> {
        self.edges.get(&ordered_key(a, b))
    }

    /// Neighbours of `node` in ascending order, empty if the node is unknown.
    pub fn neighbors<'a>(&'a self, node: &str) -> impl Iterator<Item = &'a Node> + 'a {
        self.adjacency.get(node).into_iter().flatten()
    }

    pub fn degree(&self, node: &str) -> Option<usize> {
        self.adjacency.get(node).map(BTreeSet::len)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// The induced subgraph on `nodes`. Nodes absent from this graph are ignored.
    pub fn subgraph<'a, I>(&self, nodes: I) -> Graph
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut subgraph = Graph::new(self.graph_type);
        for node in nodes {
            if let Some(kind) = self.node_kind(node) {
                subgraph.add_node(node, kind);
            }
        }

        for edge in self.edges.values() {
            if subgraph.contains_node(&edge.source) && subgraph.contains_node(&edge.target) {
                subgraph.link(&edge.source, &edge.target);
                subgraph.edges.insert(edge.key(), edge.clone());
            }
        }

        subgraph
    }

    /// One collaboration per edge, in edge order.
    pub fn collaborations(&self) -> Vec<Collaboration> {
        self.edges
            .values()
            .map(|edge| Collaboration {
                hero1: edge.source.clone(),
                hero2: edge.target.clone(),
                n_collabs: edge.raw_count,
            })
            .collect()
    }

    /// Every comic node together with the number of heroes appearing in it.
    pub fn heroes_per_comic(&self) -> Vec<ComicAppearances> {
        self.nodes_of_kind(NodeKind::Comic)
            .map(|comic| ComicAppearances {
                name: comic.clone(),
                n_heroes: self.degree(comic).unwrap_or(0),
            })
            .collect()
    }

    /// Connected components ordered by their smallest member.
    pub fn connected_components(&self) -> Vec<BTreeSet<Node>> {
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let mut components = Vec::new();

        for start in self.nodes.keys() {
            if !seen.insert(start.as_str()) {
                continue;
            }

            let mut component = BTreeSet::new();
            let mut queue = VecDeque::from([start.as_str()]);
            while let Some(current) = queue.pop_front() {
                component.insert(current.to_string());
                for next in self.neighbors(current) {
                    if seen.insert(next.as_str()) {
                        queue.push_back(next.as_str());
                    }
                }
            }
            components.push(component);
        }

        components
    }

    fn link(&mut self, a: &str, b: &str) {
        if let Some(neighbours) = self.adjacency.get_mut(a) {
            neighbours.insert(b.to_string());
        }
        if let Some(neighbours) = self.adjacency.get_mut(b) {
            neighbours.insert(a.to_string());
        }
    }
}

fn ordered_key(a: &str, b: &str) -> (Node, Node) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}
