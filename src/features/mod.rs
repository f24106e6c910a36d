//! Structural graph features: density, degree distribution and hubs

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::graph::{Collaboration, ComicAppearances, Graph, GraphType, Node};

/// Density threshold above which a graph counts as dense.
pub const DENSE_THRESHOLD: f64 = 0.5;

/// Whether a graph is sparse or dense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraphMode {
    Sparse,
    Dense,
}

/// Summary of a graph's structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphFeatures {
    pub graph_type: GraphType,
    pub n_nodes: usize,
    pub n_edges: usize,
    pub density: f64,
    pub degree_dist: Vec<(Node, usize)>,
    pub avg_degree: f64,
    pub hub_percentile: f64,
    pub hubs: BTreeSet<Node>,
    pub mode: GraphMode,
    /// Per-pair collaboration counts of the bounded graph, only for collaborative graphs
    pub collaborations: Vec<Collaboration>,
    /// Heroes per comic of the bounded graph, only for hero/comic graphs
    pub heroes_per_comic: Vec<ComicAppearances>,
}

/// Ratio of edges to the maximum possible number of edges, `0` for fewer than two nodes.
pub fn density(graph: &Graph) -> f64 {
    let vc = graph.node_count() as f64;
    if vc < 2.0 {
        return 0.0;
    }

    // Calculate the total number of possible edges given a vertex count.
    let pec = vc * (vc - 1.0) / 2.0;
    graph.edge_count() as f64 / pec
}

/// `(node, degree)` for every node, in node order.
pub fn degree_distribution(graph: &Graph) -> Vec<(Node, usize)> {
    graph
        .nodes()
        .map(|node| (node.clone(), graph.degree(node).unwrap_or(0)))
        .collect()
}

pub fn average_degree(graph: &Graph) -> f64 {
    if graph.node_count() == 0 {
        return 0.0;
    }

    let total: usize = graph
        .nodes()
        .map(|node| graph.degree(node).unwrap_or(0))
        .sum();
    total as f64 / graph.node_count() as f64
}

pub fn mode(graph: &Graph) -> GraphMode {
    if density(graph) > DENSE_THRESHOLD {
        GraphMode::Dense
    } else {
        GraphMode::Sparse
    }
}

/// The `p`-th percentile of `values`, interpolating linearly between the two nearest order
/// statistics. Returns `None` for an empty slice.
pub fn percentile(values: &[f64], p: f64) -> Result<Option<f64>> {
    check_percentile(p)?;
    if values.is_empty() {
        return Ok(None);
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;

    Ok(Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction))
}

/// Nodes whose degree is at least the `p`-th percentile of the degree distribution.
pub fn hubs(graph: &Graph, p: f64) -> Result<BTreeSet<Node>> {
    let distribution = degree_distribution(graph);
    let degrees: Vec<f64> = distribution.iter().map(|(_, d)| *d as f64).collect();

    let Some(threshold) = percentile(&degrees, p)? else {
        return Ok(BTreeSet::new());
    };

    Ok(distribution
        .into_iter()
        .filter(|(_, degree)| *degree as f64 >= threshold)
        .map(|(node, _)| node)
        .collect())
}

/// Compute every feature of `graph`, using `hub_percentile` for hub detection.
pub fn extract_features(graph: &Graph, hub_percentile: f64) -> Result<GraphFeatures> {
    extract_features_bounded(graph, graph, hub_percentile)
}

/// Like [`extract_features`], but the per-pair and per-comic lists come from `bounded`, usually
/// the top-N subgraph of `graph`. Structural metrics still cover the whole of `graph`.
pub fn extract_features_bounded(
    graph: &Graph,
    bounded: &Graph,
    hub_percentile: f64,
) -> Result<GraphFeatures> {
    log::info!(
        "Extracting features from a graph with {} nodes and {} edges",
        graph.node_count(),
        graph.edge_count()
    );

    let (collaborations, heroes_per_comic) = match graph.graph_type() {
        GraphType::Collaborative => (bounded.collaborations(), Vec::new()),
        GraphType::HeroComic => (Vec::new(), bounded.heroes_per_comic()),
    };

    let features = GraphFeatures {
        graph_type: graph.graph_type(),
        n_nodes: graph.node_count(),
        n_edges: graph.edge_count(),
        density: density(graph),
        degree_dist: degree_distribution(graph),
        avg_degree: average_degree(graph),
        hub_percentile,
        hubs: hubs(graph, hub_percentile)?,
        mode: mode(graph),
        collaborations,
        heroes_per_comic,
    };

    log::info!(
        "Density {:.4} ({:?}), average degree {:.2}, {} hubs at the {}th percentile",
        features.density,
        features.mode,
        features.avg_degree,
        features.hubs.len(),
        hub_percentile
    );

    Ok(features)
}

fn check_percentile(p: f64) -> Result<()> {
    if !(0.0..=100.0).contains(&p) {
        return Err(AnalysisError::InvalidParameter(format!(
            "percentile must be within [0, 100], got {p}"
        )));
    }
    Ok(())
}
