//! Edge weighting policies for the collaboration graph
//!
//! Every policy is strictly decreasing in the raw co-occurrence count: heroes that appear together
//! often get a low weight, which makes their bond cheap to traverse and cheap to cut.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Graph-wide facts a policy may depend on. Computed fresh for every build.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightContext {
    /// Largest number of raw co-occurrences incident to any single node.
    pub max_degree: usize,
}

/// Maps the number of co-occurrences between two nodes to an edge weight.
pub trait WeightPolicy: Send + Sync {
    fn weight(&self, raw_count: u32, context: &WeightContext) -> f64;

    fn name(&self) -> &'static str;
}

/// `1 / n`
#[derive(Debug, Clone, Copy, Default)]
pub struct Reciprocal;

impl WeightPolicy for Reciprocal {
    fn weight(&self, raw_count: u32, _context: &WeightContext) -> f64 {
        1.0 / raw_count.max(1) as f64
    }

    fn name(&self) -> &'static str {
        "reciprocal"
    }
}

/// `1 - n / (max_degree + 1)`
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxProportion;

impl WeightPolicy for MaxProportion {
    fn weight(&self, raw_count: u32, context: &WeightContext) -> f64 {
        1.0 - raw_count as f64 / (context.max_degree as f64 + 1.0)
    }

    fn name(&self) -> &'static str {
        "max-proportion"
    }
}

/// Selectable weighting scheme, used by the configuration and the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum WeightScheme {
    Reciprocal,
    #[default]
    MaxProportion,
}

impl WeightScheme {
    pub fn policy(self) -> Box<dyn WeightPolicy> {
        match self {
            WeightScheme::Reciprocal => Box::new(Reciprocal),
            WeightScheme::MaxProportion => Box::new(MaxProportion),
        }
    }
}
