//! Error types shared by every analysis stage

use std::collections::BTreeMap;
use std::time::Duration;

use thiserror::Error;

use crate::graph::Node;

/// Failures surfaced by graph construction and analysis.
///
/// All of these are local and recoverable; nothing is retried internally.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A source record or table is missing a required field.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Both a path and an in-memory table were supplied for the same source.
    #[error("ambiguous source: supply either a path or an in-memory table, not both")]
    AmbiguousSource,

    /// An operation that needs at least one record received none.
    #[error("empty input: {0}")]
    EmptyInput(String),

    #[error("unknown node `{0}`")]
    UnknownNode(Node),

    /// Community detection was asked to split a graph that is already split.
    #[error("graph is already disconnected into {components} components")]
    AlreadyDisconnected { components: usize },

    /// PageRank hit its iteration cap. `last` holds the final iterate.
    #[error("pagerank did not converge after {iterations} iterations (last L1 delta {delta:e})")]
    NoConvergence {
        iterations: usize,
        delta: f64,
        last: BTreeMap<Node, f64>,
    },

    #[error("unknown metric `{0}`")]
    UnknownMetric(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("community detection timed out after {passes} betweenness passes ({elapsed:?})")]
    Timeout { passes: usize, elapsed: Duration },

    #[error(transparent)]
    Table(#[from] polars::error::PolarsError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
