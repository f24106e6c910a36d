//! Name canonicalization and graph bounding helpers

use std::collections::{BTreeSet, HashMap};

use crate::data::source::CollaborationRecord;
use crate::graph::{Graph, Node};

/// Hero name variants that refer to the same character.
pub const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("SPIDER-MAN/PETER PAR", "SPIDER-MAN/PETER PARKER"),
    ("SPIDER-MAN/PETER PARKERKER", "SPIDER-MAN/PETER PARKER"),
];

/// Normalizes raw node names to a single reference spelling.
#[derive(Debug, Clone)]
pub struct Canonicalizer {
    aliases: HashMap<String, String>,
}

impl Default for Canonicalizer {
    fn default() -> Self {
        Self::new(
            DEFAULT_ALIASES
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string())),
        )
    }
}

impl Canonicalizer {
    /// Creates a canonicalizer from `(variant, canonical)` pairs.
    pub fn new<I>(aliases: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            aliases: aliases.into_iter().collect(),
        }
    }

    /// Strips any run of trailing whitespace and `/`, then resolves aliases. Canonical names are
    /// fixed points: canonicalizing one again returns it unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use hero_network_analyzer::data::preprocessing::Canonicalizer;
    ///
    /// let canonicalizer = Canonicalizer::default();
    /// assert_eq!(canonicalizer.canonicalize("IRON MAN/ "), "IRON MAN");
    /// assert_eq!(
    ///     canonicalizer.canonicalize("SPIDER-MAN/PETER PAR "),
    ///     "SPIDER-MAN/PETER PARKER"
    /// );
    /// ```
    pub fn canonicalize(&self, raw: &str) -> Node {
        let trimmed = raw.trim_end_matches(|c: char| c.is_whitespace() || c == '/');
        match self.aliases.get(trimmed) {
            Some(canonical) => canonical.clone(),
            None => trimmed.to_string(),
        }
    }
}

/// Canonicalizes both endpoints and drops records whose endpoints are then equal.
pub fn remove_self_loops(
    records: Vec<CollaborationRecord>,
    canonicalizer: &Canonicalizer,
) -> Vec<CollaborationRecord> {
    let before = records.len();
    let kept: Vec<CollaborationRecord> = records
        .into_iter()
        .map(|record| CollaborationRecord {
            hero1: canonicalizer.canonicalize(&record.hero1),
            hero2: canonicalizer.canonicalize(&record.hero2),
        })
        .filter(|record| record.hero1 != record.hero2)
        .collect();

    log::debug!("Dropped {} self-loop records", before - kept.len());
    kept
}

/// Extract the induced subgraph on `nodes`, ignoring names the graph does not contain.
pub fn extract_subgraph<S: AsRef<str>>(graph: &Graph, nodes: &[S]) -> Graph {
    graph.subgraph(nodes.iter().map(|node| node.as_ref()))
}

/// Extract the induced subgraph on `heroes` plus every neighbour of those heroes.
///
/// On a hero/comic graph this yields the heroes together with all comics they appear in.
pub fn subgraph_with_neighbours<S: AsRef<str>>(graph: &Graph, heroes: &[S]) -> Graph {
    let mut members: BTreeSet<&str> = BTreeSet::new();
    for hero in heroes {
        let hero = hero.as_ref();
        if !graph.contains_node(hero) {
            continue;
        }
        members.insert(hero);
        members.extend(graph.neighbors(hero).map(Node::as_str));
    }

    graph.subgraph(members)
}

/// Filter a graph to only include nodes with a minimum degree
pub fn filter_by_degree(graph: &Graph, min_degree: usize) -> Graph {
    let passing: Vec<&str> = graph
        .nodes()
        .filter(|node| graph.degree(node).unwrap_or(0) >= min_degree)
        .map(Node::as_str)
        .collect();

    graph.subgraph(passing)
}
