//! Community detection by iterative edge-betweenness removal
//!
//! The highest-betweenness edge of a private working copy is removed, betweenness is recomputed,
//! and the loop stops the first time the copy falls apart into two or more components.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use crate::cluster::{CommunityReport, Partition};
use crate::error::{AnalysisError, Result};
use crate::graph::algorithms::{edge_betweenness, IndexedGraph};
use crate::graph::{Graph, Node};

/// Relative tolerance under which two betweenness scores count as tied.
const TIE_TOLERANCE: f64 = 1e-9;

/// Split `graph` into communities, without a time limit.
///
/// The graph must be connected and have at least two nodes. Each pass recomputes betweenness
/// over the whole graph, so callers should bound the input (e.g. to the top-N heroes) first.
pub fn partition(graph: &Graph) -> Result<Partition> {
    partition_within(graph, None)
}

/// Like [`partition`], failing with `Timeout` once `timeout` has elapsed.
pub fn partition_within(graph: &Graph, timeout: Option<Duration>) -> Result<Partition> {
    if graph.node_count() < 2 {
        return Err(AnalysisError::InvalidParameter(format!(
            "community detection needs at least two nodes, got {}",
            graph.node_count()
        )));
    }

    let mut working = IndexedGraph::from_graph(graph);
    let components = working.component_count();
    if components >= 2 {
        return Err(AnalysisError::AlreadyDisconnected { components });
    }

    log::info!(
        "Detecting communities in a graph with {} nodes and {} edges",
        working.node_count(),
        working.live_edge_count()
    );

    let start = Instant::now();
    let mut removed_edges = Vec::new();
    let mut passes = 0usize;

    while working.component_count() == 1 {
        if let Some(limit) = timeout {
            let elapsed = start.elapsed();
            if elapsed >= limit {
                log::warn!("Community detection stopped after {} passes", passes);
                return Err(AnalysisError::Timeout { passes, elapsed });
            }
        }

        let scores = edge_betweenness(&working, false);
        passes += 1;

        let Some((id, score)) = highest_scoring_edge(&working, &scores) else {
            break;
        };

        working.remove_edge(id);
        let edge = working.to_edge(id, graph);
        log::debug!(
            "Pass {}: removed {} - {} (betweenness {:.3})",
            passes,
            edge.source(),
            edge.target(),
            score
        );
        removed_edges.push(edge);
    }

    let components: Vec<BTreeSet<Node>> = working
        .components()
        .into_iter()
        .map(|members| {
            members
                .into_iter()
                .map(|v| working.node(v).clone())
                .collect()
        })
        .collect();

    log::info!(
        "Graph split into {} communities after removing {} edges in {:?}",
        components.len(),
        removed_edges.len(),
        start.elapsed()
    );

    Ok(Partition {
        components,
        removed_edges,
        passes,
    })
}

/// The live edge with the strictly highest score; the lowest edge id wins ties.
fn highest_scoring_edge(graph: &IndexedGraph, scores: &[f64]) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (id, &score) in scores.iter().enumerate() {
        if graph.is_removed(id) {
            continue;
        }
        match best {
            Some((_, top)) if score <= top + TIE_TOLERANCE * top.abs().max(1.0) => {}
            _ => best = Some((id, score)),
        }
    }
    best
}

/// Whether `x` and `y` ended up in the same component of `partition`.
pub fn same_community(partition: &Partition, x: &str, y: &str) -> Result<bool> {
    let cx = partition
        .component_of(x)
        .ok_or_else(|| AnalysisError::UnknownNode(x.to_string()))?;
    let cy = partition
        .component_of(y)
        .ok_or_else(|| AnalysisError::UnknownNode(y.to_string()))?;
    Ok(cx == cy)
}

/// Partition `graph` and report where `hero_x` and `hero_y` landed.
pub fn community_report(
    graph: &Graph,
    hero_x: &str,
    hero_y: &str,
    timeout: Option<Duration>,
) -> Result<CommunityReport> {
    for hero in [hero_x, hero_y] {
        if !graph.contains_node(hero) {
            return Err(AnalysisError::UnknownNode(hero.to_string()));
        }
    }

    let partition = partition_within(graph, timeout)?;
    let community_x = partition
        .component_of(hero_x)
        .ok_or_else(|| AnalysisError::UnknownNode(hero_x.to_string()))?;
    let community_y = partition
        .component_of(hero_y)
        .ok_or_else(|| AnalysisError::UnknownNode(hero_y.to_string()))?;

    Ok(CommunityReport {
        hero_x: hero_x.to_string(),
        hero_y: hero_y.to_string(),
        same_community: community_x == community_y,
        community_x,
        community_y,
        partition,
    })
}
