//! Node centrality measures
//!
//! Degree, closeness, betweenness and PageRank over a (usually top-N bounded) graph. Shortest
//! paths are counted in hops; only PageRank can optionally follow edge weights.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use itertools::Itertools;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::graph::algorithms::{bfs_distances, node_betweenness, IndexedGraph};
use crate::graph::{Graph, Node};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CentralityKind {
    Degree,
    Closeness,
    Betweenness,
    #[value(name = "pagerank")]
    PageRank,
}

impl CentralityKind {
    pub const ALL: [CentralityKind; 4] = [
        CentralityKind::Degree,
        CentralityKind::Closeness,
        CentralityKind::Betweenness,
        CentralityKind::PageRank,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CentralityKind::Degree => "degree",
            CentralityKind::Closeness => "closeness",
            CentralityKind::Betweenness => "betweenness",
            CentralityKind::PageRank => "pagerank",
        }
    }
}

impl fmt::Display for CentralityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CentralityKind {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| AnalysisError::UnknownMetric(s.to_string()))
    }
}

/// PageRank power-iteration settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRankConfig {
    /// Probability of following an edge rather than restarting
    pub damping: f64,

    /// Convergence threshold on the L1 change between iterates
    pub tolerance: f64,

    pub max_iterations: usize,

    /// Split rank over neighbours in proportion to edge weight instead of evenly
    pub weighted: bool,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            damping: 0.85,
            tolerance: 1e-6,
            max_iterations: 100,
            weighted: false,
        }
    }
}

impl PageRankConfig {
    fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.damping) {
            return Err(AnalysisError::InvalidParameter(format!(
                "damping must be within [0, 1), got {}",
                self.damping
            )));
        }
        if self.tolerance.is_nan() || self.tolerance <= 0.0 {
            return Err(AnalysisError::InvalidParameter(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if self.max_iterations == 0 {
            return Err(AnalysisError::InvalidParameter(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Scores of one centrality measure, keyed by node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CentralityScores {
    pub kind: CentralityKind,
    pub scores: BTreeMap<Node, f64>,
}

impl CentralityScores {
    pub fn get(&self, node: &str) -> Result<f64> {
        self.scores
            .get(node)
            .copied()
            .ok_or_else(|| AnalysisError::UnknownNode(node.to_string()))
    }

    /// The `n` highest-scoring nodes. Equal scores keep node order.
    pub fn top(&self, n: usize) -> Vec<(Node, f64)> {
        self.scores
            .iter()
            .sorted_by(|(_, a), (_, b)| b.total_cmp(a))
            .take(n)
            .map(|(node, score)| (node.clone(), *score))
            .collect()
    }
}

/// Compute `kind` over `graph`, using the default PageRank settings.
///
/// # Examples
///
/// ```
/// use hero_network_analyzer::cluster::{centrality, CentralityKind};
/// use hero_network_analyzer::graph::{Graph, GraphType};
///
/// let mut graph = Graph::new(GraphType::Collaborative);
/// for leaf in ["P", "Q", "R"] {
///     graph.add_edge("X", leaf, 1.0, 1).unwrap();
/// }
///
/// let degree = centrality(&graph, CentralityKind::Degree).unwrap();
/// assert_eq!(degree.get("X").unwrap(), 1.0);
/// assert!((degree.get("P").unwrap() - 1.0 / 3.0).abs() < 1e-9);
/// ```
pub fn centrality(graph: &Graph, kind: CentralityKind) -> Result<CentralityScores> {
    centrality_with(graph, kind, &PageRankConfig::default())
}

pub fn centrality_with(
    graph: &Graph,
    kind: CentralityKind,
    pagerank_config: &PageRankConfig,
) -> Result<CentralityScores> {
    log::debug!(
        "Computing {} centrality over {} nodes",
        kind,
        graph.node_count()
    );

    let scores = match kind {
        CentralityKind::Degree => degree_centrality(graph),
        CentralityKind::Closeness => closeness_centrality(graph),
        CentralityKind::Betweenness => betweenness_centrality(graph),
        CentralityKind::PageRank => pagerank(graph, pagerank_config)?,
    };

    Ok(CentralityScores { kind, scores })
}

/// Like [`centrality`], with the measure given by name. Unknown names fail with `UnknownMetric`.
pub fn centrality_by_name(graph: &Graph, name: &str) -> Result<CentralityScores> {
    centrality(graph, name.parse()?)
}

/// `degree(v) / (n - 1)`. A graph with a single node scores it `1`.
pub fn degree_centrality(graph: &Graph) -> BTreeMap<Node, f64> {
    let n = graph.node_count();
    if n <= 1 {
        return graph.nodes().map(|node| (node.clone(), 1.0)).collect();
    }

    let others = (n - 1) as f64;
    graph
        .nodes()
        .map(|node| {
            let degree = graph.degree(node).unwrap_or(0) as f64;
            (node.clone(), degree / others)
        })
        .collect()
}

/// Inverse mean hop distance to the reachable nodes, scaled by the reachable share of the graph
/// so that nodes in small components do not score artificially high.
pub fn closeness_centrality(graph: &Graph) -> BTreeMap<Node, f64> {
    let working = IndexedGraph::from_graph(graph);
    let n = working.node_count();

    let scores: Vec<f64> = (0..n)
        .into_par_iter()
        .map(|v| {
            let (reachable, total) = bfs_distances(&working, v)
                .into_iter()
                .flatten()
                .fold((0usize, 0usize), |(count, sum), d| (count + 1, sum + d));

            if total == 0 || n <= 1 {
                return 0.0;
            }
            let others = (reachable - 1) as f64;
            (others / total as f64) * (others / (n - 1) as f64)
        })
        .collect();

    working.nodes().iter().cloned().zip(scores).collect()
}

/// Normalized node betweenness over hop-count shortest paths.
pub fn betweenness_centrality(graph: &Graph) -> BTreeMap<Node, f64> {
    let working = IndexedGraph::from_graph(graph);
    let scores = node_betweenness(&working, true);
    working.nodes().iter().cloned().zip(scores).collect()
}

/// PageRank by power iteration with a uniform restart distribution.
///
/// Rank held by nodes without outgoing weight is spread evenly over every node. Fails with
/// `NoConvergence`, carrying the last iterate, when `max_iterations` is reached first.
pub fn pagerank(graph: &Graph, config: &PageRankConfig) -> Result<BTreeMap<Node, f64>> {
    config.validate()?;

    let working = IndexedGraph::from_graph(graph);
    let n = working.node_count();
    if n == 0 {
        return Ok(BTreeMap::new());
    }

    let link_weight = |id: usize| {
        if config.weighted {
            working.edge(id).weight
        } else {
            1.0
        }
    };
    let out_weight: Vec<f64> = (0..n)
        .map(|v| working.neighbors(v).map(|(_, id)| link_weight(id)).sum())
        .collect();

    let uniform = 1.0 / n as f64;
    let restart = (1.0 - config.damping) * uniform;
    let mut rank = vec![uniform; n];
    let mut delta = f64::INFINITY;

    for iteration in 1..=config.max_iterations {
        let dangling: f64 = (0..n)
            .filter(|&v| out_weight[v] <= 0.0)
            .map(|v| rank[v])
            .sum();

        let next: Vec<f64> = (0..n)
            .map(|u| {
                let inflow: f64 = working
                    .neighbors(u)
                    .filter(|&(v, _)| out_weight[v] > 0.0)
                    .map(|(v, id)| rank[v] * link_weight(id) / out_weight[v])
                    .sum();
                restart + config.damping * (inflow + dangling * uniform)
            })
            .collect();

        delta = next.iter().zip(&rank).map(|(a, b)| (a - b).abs()).sum();
        rank = next;

        if delta < config.tolerance {
            log::debug!("PageRank converged after {} iterations", iteration);
            return Ok(working.nodes().iter().cloned().zip(rank).collect());
        }
    }

    log::warn!(
        "PageRank did not converge within {} iterations (delta {:e})",
        config.max_iterations,
        delta
    );

    Err(AnalysisError::NoConvergence {
        iterations: config.max_iterations,
        delta,
        last: working.nodes().iter().cloned().zip(rank).collect(),
    })
}
