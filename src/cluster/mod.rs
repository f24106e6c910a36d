//! Cut, community and centrality analysis

pub mod centrality;
pub mod cut;
pub mod detection;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::graph::{Edge, Graph, Node};

pub use centrality::{
    centrality, centrality_by_name, CentralityKind, CentralityScores, PageRankConfig,
};
pub use cut::disconnect;
pub use detection::{community_report, partition, partition_within, same_community};

/// Result of disconnecting two nodes with a minimum-weight edge cut
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cut {
    pub source: Node,
    pub sink: Node,

    /// Edges crossing the two sides, in endpoint-pair order
    pub removed_edges: Vec<Edge>,

    /// Sum of the removed edges' weights
    pub cut_weight: f64,

    /// Value of the maximum flow from source to sink
    pub flow_value: f64,

    /// Nodes still connected to the source after the cut
    pub side_a: BTreeSet<Node>,

    /// Every other node, including the sink
    pub side_b: BTreeSet<Node>,
}

impl Cut {
    /// Number of removed links
    pub fn num_links(&self) -> usize {
        self.removed_edges.len()
    }

    /// The subgraphs induced by each side of the cut.
    pub fn graphs(&self, graph: &Graph) -> (Graph, Graph) {
        (
            graph.subgraph(self.side_a.iter().map(String::as_str)),
            graph.subgraph(self.side_b.iter().map(String::as_str)),
        )
    }
}

/// Components of a graph at the moment it first splits apart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Partition {
    /// Connected components, ordered by their smallest member
    pub components: Vec<BTreeSet<Node>>,

    /// Edges removed before the split, in removal order
    pub removed_edges: Vec<Edge>,

    /// Number of betweenness passes it took
    pub passes: usize,
}

impl Partition {
    /// Index of the component holding `node`.
    pub fn component_of(&self, node: &str) -> Option<usize> {
        self.components
            .iter()
            .position(|component| component.contains(node))
    }
}

/// Community split of a graph as seen from two heroes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityReport {
    pub hero_x: Node,
    pub hero_y: Node,
    pub partition: Partition,
    pub community_x: usize,
    pub community_y: usize,
    pub same_community: bool,
}

impl CommunityReport {
    pub fn num_links(&self) -> usize {
        self.partition.removed_edges.len()
    }
}
