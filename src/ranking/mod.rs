//! Frequency ranking of heroes
//!
//! A top hero is one that occurs most often in the source stream, e.g. the hero column of the
//! hero/comic membership table, where each occurrence is one comic appearance.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::data::preprocessing::Canonicalizer;
use crate::data::source::MembershipRecord;
use crate::error::{AnalysisError, Result};
use crate::graph::Node;

/// Nodes with their occurrence counts, most frequent first. Ties keep first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ranking {
    entries: Vec<(Node, usize)>,
}

impl Ranking {
    pub fn entries(&self) -> &[(Node, usize)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The first `n` nodes, or all of them if fewer than `n` are ranked.
    pub fn top_n(&self, n: usize) -> Vec<Node> {
        self.entries
            .iter()
            .take(n)
            .map(|(node, _)| node.clone())
            .collect()
    }
}

/// Count occurrences and rank them.
///
/// # Examples
///
/// ```
/// use hero_network_analyzer::ranking::rank_by_frequency;
///
/// let ranking = rank_by_frequency(["THOR", "LOKI", "LOKI", "HULK", "THOR"]).unwrap();
/// assert_eq!(ranking.top_n(2), vec!["THOR", "LOKI"]);
/// ```
pub fn rank_by_frequency<I, S>(occurrences: I) -> Result<Ranking>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    // First-seen position and count per node.
    let mut counts: HashMap<Node, (usize, usize)> = HashMap::new();
    let mut total = 0usize;
    for occurrence in occurrences {
        let seen = counts.len();
        counts
            .entry(occurrence.as_ref().to_string())
            .or_insert((seen, 0))
            .1 += 1;
        total += 1;
    }

    if total == 0 {
        return Err(AnalysisError::EmptyInput(
            "cannot rank an empty occurrence stream".to_string(),
        ));
    }

    let mut ranked: Vec<(Node, (usize, usize))> = counts.into_iter().collect();
    ranked.sort_by(|(_, (first_a, count_a)), (_, (first_b, count_b))| {
        count_b.cmp(count_a).then(first_a.cmp(first_b))
    });

    Ok(Ranking {
        entries: ranked
            .into_iter()
            .map(|(node, (_, count))| (node, count))
            .collect(),
    })
}

/// Owns an occurrence stream and memoizes its ranking.
///
/// The ranking is computed on the first request and reused until the source is replaced.
#[derive(Debug, Clone)]
pub struct TopNodeService {
    occurrences: Vec<Node>,
    ranking: Option<Ranking>,
}

impl TopNodeService {
    /// Fails with `EmptyInput` if there are no occurrences.
    pub fn new(occurrences: Vec<Node>) -> Result<Self> {
        if occurrences.is_empty() {
            return Err(AnalysisError::EmptyInput(
                "top node service needs at least one occurrence".to_string(),
            ));
        }

        Ok(Self {
            occurrences,
            ranking: None,
        })
    }

    /// One occurrence per membership record: heroes are ranked by comic appearances.
    pub fn from_memberships(
        records: &[MembershipRecord],
        canonicalizer: &Canonicalizer,
    ) -> Result<Self> {
        Self::new(
            records
                .iter()
                .map(|record| canonicalizer.canonicalize(&record.hero))
                .collect(),
        )
    }

    pub fn ranking(&mut self) -> Result<&Ranking> {
        let ranking = match self.ranking.take() {
            Some(ranking) => ranking,
            None => {
                log::debug!("Ranking {} occurrences", self.occurrences.len());
                rank_by_frequency(&self.occurrences)?
            }
        };

        Ok(self.ranking.insert(ranking))
    }

    pub fn top_n(&mut self, n: usize) -> Result<Vec<Node>> {
        Ok(self.ranking()?.top_n(n))
    }

    pub fn is_cached(&self) -> bool {
        self.ranking.is_some()
    }

    /// Swap in a new occurrence stream, invalidating the cached ranking.
    pub fn replace_source(&mut self, occurrences: Vec<Node>) -> Result<()> {
        *self = Self::new(occurrences)?;
        Ok(())
    }
}
