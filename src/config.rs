//! Configuration management for the hero network analyzer

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cluster::PageRankConfig;
use crate::data::preprocessing::DEFAULT_ALIASES;
use crate::data::Canonicalizer;
use crate::graph::WeightScheme;

/// Analysis settings, loadable from JSON. Missing fields take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of top heroes kept for the centrality, cut and community passes
    pub top_n: usize,

    /// Degree percentile a node must reach to count as a hub
    pub hub_percentile: f64,

    /// How co-occurrence counts become edge weights
    pub weight_scheme: WeightScheme,

    /// Wall-clock limit for community detection, in seconds (`None` = no limit)
    pub community_timeout_secs: Option<u64>,

    pub pagerank: PageRankConfig,

    /// `(variant, canonical)` hero name aliases
    pub aliases: Vec<(String, String)>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            top_n: 20,
            hub_percentile: 95.0,
            weight_scheme: WeightScheme::default(),
            community_timeout_secs: Some(300),
            pagerank: PageRankConfig::default(),
            aliases: DEFAULT_ALIASES
                .iter()
                .map(|(variant, canonical)| (variant.to_string(), canonical.to_string()))
                .collect(),
        }
    }
}

impl Config {
    /// Load a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    pub fn community_timeout(&self) -> Option<Duration> {
        self.community_timeout_secs.map(Duration::from_secs)
    }

    pub fn canonicalizer(&self) -> Canonicalizer {
        Canonicalizer::new(self.aliases.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = Config::default();

        assert_eq!(config.top_n, 20);
        assert_eq!(config.hub_percentile, 95.0);
        assert_eq!(config.weight_scheme, WeightScheme::MaxProportion);
        assert_eq!(config.community_timeout(), Some(Duration::from_secs(300)));
        assert_eq!(config.pagerank.damping, 0.85);
        assert_eq!(
            config.canonicalizer().canonicalize("SPIDER-MAN/PETER PAR"),
            "SPIDER-MAN/PETER PARKER"
        );
    }

    #[test]
    fn load_partial_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "top_n": 5, "weight_scheme": "reciprocal", "pagerank": {{ "weighted": true }} }}"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.top_n, 5);
        assert_eq!(config.weight_scheme, WeightScheme::Reciprocal);
        assert!(config.pagerank.weighted);
        assert_eq!(config.pagerank.max_iterations, 100);
        assert_eq!(config.hub_percentile, 95.0);
    }

    #[test]
    fn load_reports_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        assert!(Config::load(file.path()).is_err());
    }
}
