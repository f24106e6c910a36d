//! Results persistence module

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::Result;
use itertools::Itertools;
use serde_json::{json, to_string_pretty};

use crate::cluster::{CentralityScores, CommunityReport, Cut};
use crate::features::GraphFeatures;
use crate::graph::Node;

/// Everything one analysis run produced
pub struct AnalysisReport<'a> {
    pub features: &'a GraphFeatures,

    /// Top heroes with their appearance counts
    pub top_heroes: &'a [(Node, usize)],

    pub centrality: &'a [CentralityScores],

    pub disconnection: Option<&'a Cut>,

    pub communities: Option<&'a CommunityReport>,
}

/// Save analysis results to the specified directory
pub fn save_results(report: &AnalysisReport<'_>, output_dir: impl AsRef<Path>) -> Result<()> {
    let output_dir = output_dir.as_ref();
    log::info!("Saving results to {}", output_dir.display());

    // Ensure output directory exists
    fs::create_dir_all(output_dir)?;

    save_summary(report, output_dir)?;
    save_centrality(report.centrality, output_dir)?;

    if let Some(cut) = report.disconnection {
        save_disconnection(cut, output_dir)?;
    }
    if let Some(communities) = report.communities {
        save_communities(communities, output_dir)?;
    }

    log::info!("Results saved successfully");

    Ok(())
}

fn write_json(path: &Path, value: &serde_json::Value) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(to_string_pretty(value)?.as_bytes())?;
    Ok(())
}

/// Save graph features and the hero ranking
fn save_summary(report: &AnalysisReport<'_>, output_dir: &Path) -> Result<()> {
    log::info!("Saving summary information");

    let features = report.features;
    let summary = json!({
        "graph_stats": {
            "graph_type": features.graph_type,
            "node_count": features.n_nodes,
            "edge_count": features.n_edges,
            "density": features.density,
            "mode": features.mode,
            "avg_degree": features.avg_degree,
            "hub_percentile": features.hub_percentile,
            "hubs": features.hubs,
        },
        "top_heroes": report.top_heroes.iter().map(|(hero, appearances)| {
            json!({ "hero": hero, "appearances": appearances })
        }).collect::<Vec<_>>(),
        "features": features,
    });

    write_json(&output_dir.join("summary.json"), &summary)
}

fn save_centrality(centrality: &[CentralityScores], output_dir: &Path) -> Result<()> {
    log::info!(
        "Saving {} centrality measures ({})",
        centrality.len(),
        centrality.iter().map(|scores| scores.kind).join(", ")
    );

    let measures: serde_json::Map<String, serde_json::Value> = centrality
        .iter()
        .map(|scores| {
            (
                scores.kind.to_string(),
                json!({
                    "scores": scores.scores,
                    "ranking": scores.top(scores.scores.len()),
                }),
            )
        })
        .collect();

    write_json(
        &output_dir.join("centrality.json"),
        &serde_json::Value::Object(measures),
    )
}

fn save_disconnection(cut: &Cut, output_dir: &Path) -> Result<()> {
    log::info!(
        "Saving disconnection of {} and {} ({} links)",
        cut.source,
        cut.sink,
        cut.num_links()
    );

    let value = json!({
        "num_links": cut.num_links(),
        "cut": cut,
    });

    write_json(&output_dir.join("disconnection.json"), &value)
}

fn save_communities(report: &CommunityReport, output_dir: &Path) -> Result<()> {
    log::info!(
        "Saving {} communities",
        report.partition.components.len()
    );

    let value = json!({
        "num_links": report.num_links(),
        "num_communities": report.partition.components.len(),
        "report": report,
    });

    write_json(&output_dir.join("communities.json"), &value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{centrality, disconnect, CentralityKind};
    use crate::features::extract_features;
    use crate::graph::{Graph, GraphType};

    #[test]
    fn writes_requested_reports() {
        let mut graph = Graph::new(GraphType::Collaborative);
        graph.add_edge("A", "B", 0.5, 2).unwrap();
        graph.add_edge("B", "C", 1.0, 1).unwrap();

        let features = extract_features(&graph, 95.0).unwrap();
        let degree = centrality(&graph, CentralityKind::Degree).unwrap();
        let cut = disconnect(&graph, "A", "C").unwrap();
        let top_heroes = vec![("B".to_string(), 3)];

        let dir = tempfile::tempdir().unwrap();
        let report = AnalysisReport {
            features: &features,
            top_heroes: &top_heroes,
            centrality: std::slice::from_ref(&degree),
            disconnection: Some(&cut),
            communities: None,
        };

        save_results(&report, dir.path()).unwrap();

        assert!(dir.path().join("summary.json").exists());
        assert!(dir.path().join("disconnection.json").exists());
        assert!(!dir.path().join("communities.json").exists());

        let text = fs::read_to_string(dir.path().join("centrality.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["degree"]["scores"]["B"], 1.0);

        let text = fs::read_to_string(dir.path().join("summary.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["graph_stats"]["node_count"], 3);
        assert_eq!(value["top_heroes"][0]["hero"], "B");
    }
}
