//! Graph construction module

use std::collections::{BTreeMap, HashMap};

use crate::data::preprocessing::Canonicalizer;
use crate::data::source::{CollaborationRecord, MembershipRecord, NodeRecord};
use crate::error::{AnalysisError, Result};
use crate::graph::weight::{WeightContext, WeightPolicy};
use crate::graph::{Graph, GraphType, Node, NodeKind};

/// Builder for incrementally constructing a collaboration graph from co-occurrence pairs
pub struct GraphBuilder {
    canonicalizer: Canonicalizer,

    /// Raw co-occurrence count per unordered pair (smaller name first)
    pair_counts: BTreeMap<(Node, Node), u32>,

    /// Total co-occurrences incident to each node, i.e. its degree in the multigraph
    multi_degrees: HashMap<Node, usize>,

    /// Records dropped because both endpoints were the same hero
    self_loops: usize,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new(Canonicalizer::default())
    }
}

impl GraphBuilder {
    pub fn new(canonicalizer: Canonicalizer) -> Self {
        Self {
            canonicalizer,
            pair_counts: BTreeMap::new(),
            multi_degrees: HashMap::new(),
            self_loops: 0,
        }
    }

    /// Record one co-occurrence of `a` and `b`. Returns `false` if the pair was dropped as a
    /// self-loop.
    pub fn add_collaboration(&mut self, a: &str, b: &str) -> Result<bool> {
        let a = canonical_name(&self.canonicalizer, a)?;
        let b = canonical_name(&self.canonicalizer, b)?;

        if a == b {
            self.self_loops += 1;
            return Ok(false);
        }

        *self.multi_degrees.entry(a.clone()).or_insert(0) += 1;
        *self.multi_degrees.entry(b.clone()).or_insert(0) += 1;

        let key = if a < b { (a, b) } else { (b, a) };
        *self.pair_counts.entry(key).or_insert(0) += 1;

        Ok(true)
    }

    /// Collapse the recorded pairs into a weighted graph.
    pub fn build(self, policy: &dyn WeightPolicy) -> Result<Graph> {
        let context = WeightContext {
            max_degree: self.multi_degrees.values().copied().max().unwrap_or(0),
        };

        log::info!(
            "Weighting {} hero pairs with the {} policy (max degree {}, {} self-loops dropped)",
            self.pair_counts.len(),
            policy.name(),
            context.max_degree,
            self.self_loops
        );

        let mut graph = Graph::new(GraphType::Collaborative);
        for ((a, b), n) in self.pair_counts {
            let weight = policy.weight(n, &context);
            graph.add_edge(a, b, weight, n)?;
        }

        Ok(graph)
    }
}

fn canonical_name(canonicalizer: &Canonicalizer, raw: &str) -> Result<Node> {
    let name = canonicalizer.canonicalize(raw);
    if name.trim().is_empty() {
        return Err(AnalysisError::MalformedInput(format!(
            "node name `{raw}` is empty after canonicalization"
        )));
    }
    Ok(name)
}

/// Build a weighted collaboration graph from co-occurrence records, canonicalizing names with the
/// default alias table.
pub fn build_collaboration_graph<I>(records: I, policy: &dyn WeightPolicy) -> Result<Graph>
where
    I: IntoIterator<Item = CollaborationRecord>,
{
    build_collaboration_graph_with(records, policy, Canonicalizer::default())
}

pub fn build_collaboration_graph_with<I>(
    records: I,
    policy: &dyn WeightPolicy,
    canonicalizer: Canonicalizer,
) -> Result<Graph>
where
    I: IntoIterator<Item = CollaborationRecord>,
{
    let mut builder = GraphBuilder::new(canonicalizer);
    let mut count = 0usize;
    for record in records {
        builder.add_collaboration(&record.hero1, &record.hero2)?;
        count += 1;
    }

    log::info!("Building collaboration graph from {} records", count);

    let graph = builder.build(policy)?;

    log::info!(
        "Built collaboration graph with {} nodes and {} edges",
        graph.node_count(),
        graph.edge_count()
    );

    Ok(graph)
}

/// Build the unweighted hero/comic membership graph.
///
/// Every membership record becomes one edge of weight `1.0`; repeated memberships only bump the
/// edge's raw count. Endpoints missing from `nodes` are added with the kind implied by their role.
pub fn build_bipartite_graph<N, E>(nodes: N, edges: E, canonicalizer: &Canonicalizer) -> Result<Graph>
where
    N: IntoIterator<Item = NodeRecord>,
    E: IntoIterator<Item = MembershipRecord>,
{
    let mut graph = Graph::new(GraphType::HeroComic);

    for record in nodes {
        let kind: NodeKind = record.kind.parse()?;
        let name = canonical_name(canonicalizer, &record.node)?;
        graph.add_node(name, kind);
    }

    let mut memberships = 0usize;
    for record in edges {
        let hero = canonical_name(canonicalizer, &record.hero)?;
        let comic = canonical_name(canonicalizer, &record.comic)?;
        if hero == comic {
            continue;
        }

        graph.add_node(hero.as_str(), NodeKind::Hero);
        graph.add_node(comic.as_str(), NodeKind::Comic);

        let raw_count = graph.edge(&hero, &comic).map_or(0, |edge| edge.raw_count()) + 1;
        graph.add_edge(hero, comic, 1.0, raw_count)?;
        memberships += 1;
    }

    log::info!(
        "Built hero/comic graph with {} nodes and {} edges from {} memberships",
        graph.node_count(),
        graph.edge_count(),
        memberships
    );

    Ok(graph)
}
