use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::Parser;

use hero_network_analyzer::cluster::{
    centrality::centrality_with, community_report, disconnect, CentralityKind, CentralityScores,
};
use hero_network_analyzer::config::Config;
use hero_network_analyzer::data::preprocessing::{
    extract_subgraph, remove_self_loops, subgraph_with_neighbours,
};
use hero_network_analyzer::data::{
    CollaborationRecord, MembershipRecord, NodeRecord, Record, RecordSource,
};
use hero_network_analyzer::features::extract_features_bounded;
use hero_network_analyzer::graph::{
    build_bipartite_graph, builder::build_collaboration_graph_with, Graph, GraphType, WeightScheme,
};
use hero_network_analyzer::ranking::TopNodeService;
use hero_network_analyzer::storage::{self, AnalysisReport};
use hero_network_analyzer::AnalysisError;

#[derive(Parser, Debug)]
#[clap(
    name = "hero-network-analyzer",
    about = "Collaboration network analysis of comic book heroes"
)]
struct Cli {
    /// Hero co-occurrence table (CSV or Parquet with `hero1`, `hero2` columns)
    #[clap(long)]
    collaborations: Option<PathBuf>,

    /// Hero/comic membership table (`hero`, `comic` columns), used for ranking
    #[clap(long)]
    memberships: Option<PathBuf>,

    /// Node table (`node`, `type` columns); builds the hero/comic graph instead
    #[clap(long)]
    nodes: Option<PathBuf>,

    /// JSON configuration file
    #[clap(long)]
    config: Option<PathBuf>,

    /// Output directory for results
    #[clap(long, default_value = "hero_results")]
    output_dir: PathBuf,

    /// Number of top heroes to analyze
    #[clap(long)]
    top_n: Option<usize>,

    /// Degree percentile for hub detection
    #[clap(long)]
    hub_percentile: Option<f64>,

    /// Edge weighting scheme
    #[clap(long, value_enum)]
    weight: Option<WeightScheme>,

    /// First hero for the disconnection and community analysis
    #[clap(long, requires = "hero_b")]
    hero_a: Option<String>,

    /// Second hero for the disconnection and community analysis
    #[clap(long, requires = "hero_a")]
    hero_b: Option<String>,

    /// Centrality measures to compute (default: all)
    #[clap(long, value_enum)]
    centrality: Vec<CentralityKind>,

    /// Skip writing the JSON report
    #[clap(long)]
    skip_report: bool,

    /// Number of worker threads (0 = use all available cores)
    #[clap(long, default_value = "0")]
    threads: usize,

    /// Verbose logging
    #[clap(long, short)]
    verbose: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Cli::parse();

    // Configure logging
    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_millis()
        .init();

    // Set number of threads
    let num_threads = if args.threads > 0 {
        args.threads
    } else {
        // If threads = 0, use all available cores
        num_cpus::get()
    };

    log::info!("Using {} worker threads", num_threads);
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()?;

    let config = load_config(&args)?;
    let canonicalizer = config.canonicalizer();

    log::info!("Starting hero network analysis");

    // 1. Load records and build the graph
    let memberships = match &args.memberships {
        Some(path) => Some(load_records::<MembershipRecord>(path)?),
        None => None,
    };

    let (graph, collaborations) = match (&args.nodes, &args.collaborations) {
        (Some(nodes_path), _) => {
            let Some(memberships) = &memberships else {
                bail!("--nodes requires --memberships");
            };
            let nodes = load_records::<NodeRecord>(nodes_path)?;
            let graph = build_bipartite_graph(nodes, memberships.iter().cloned(), &canonicalizer)?;
            (graph, Vec::new())
        }
        (None, Some(path)) => {
            let records = load_records::<CollaborationRecord>(path)?;
            let records = remove_self_loops(records, &canonicalizer);
            let policy = config.weight_scheme.policy();
            let graph = build_collaboration_graph_with(
                records.iter().cloned(),
                &*policy,
                canonicalizer.clone(),
            )?;
            (graph, records)
        }
        (None, None) => bail!("either --collaborations or --nodes must be given"),
    };

    // 2. Rank heroes by appearances
    let mut ranking = match &memberships {
        Some(records) => TopNodeService::from_memberships(records, &canonicalizer)?,
        None => TopNodeService::new(
            collaborations
                .iter()
                .flat_map(|record| [record.hero1.clone(), record.hero2.clone()])
                .collect(),
        )?,
    };
    let top_heroes: Vec<_> = ranking
        .ranking()?
        .entries()
        .iter()
        .take(config.top_n)
        .cloned()
        .collect();
    let top_names: Vec<&str> = top_heroes.iter().map(|(hero, _)| hero.as_str()).collect();

    log::info!("Top {} heroes: {}", top_names.len(), top_names.join(", "));

    // 3. Bound the analysis to the top heroes
    let subgraph = match graph.graph_type() {
        GraphType::Collaborative => extract_subgraph(&graph, &top_names),
        GraphType::HeroComic => subgraph_with_neighbours(&graph, &top_names),
    };

    log::info!(
        "Analyzing top-hero subgraph with {} nodes and {} edges",
        subgraph.node_count(),
        subgraph.edge_count()
    );

    // 4. Structural features of the full graph, pair lists of the top heroes
    let features = extract_features_bounded(&graph, &subgraph, config.hub_percentile)?;

    // 5. Centrality
    let kinds = if args.centrality.is_empty() {
        CentralityKind::ALL.to_vec()
    } else {
        args.centrality.clone()
    };
    let centrality = kinds
        .into_iter()
        .map(|kind| compute_centrality(&subgraph, kind, &config))
        .collect::<Result<Vec<_>>>()?;

    // 6. Disconnection and communities for a pair of heroes
    let (disconnection, communities) = match (&args.hero_a, &args.hero_b) {
        (Some(a), Some(b)) => {
            let a = canonicalizer.canonicalize(a);
            let b = canonicalizer.canonicalize(b);

            let cut = disconnect(&subgraph, &a, &b)?;
            log::info!(
                "Disconnecting {} from {} takes {} links with total weight {:.4}",
                a,
                b,
                cut.num_links(),
                cut.cut_weight
            );

            let communities = match community_report(&subgraph, &a, &b, config.community_timeout()) {
                Ok(report) => {
                    log::info!(
                        "{} and {} are {}in the same community ({} links removed)",
                        a,
                        b,
                        if report.same_community { "" } else { "not " },
                        report.num_links()
                    );
                    Some(report)
                }
                Err(err @ (AnalysisError::AlreadyDisconnected { .. } | AnalysisError::Timeout { .. })) => {
                    log::warn!("Skipping community detection: {}", err);
                    None
                }
                Err(err) => return Err(err.into()),
            };

            (Some(cut), communities)
        }
        _ => (None, None),
    };

    // 7. Save results
    if !args.skip_report {
        let report = AnalysisReport {
            features: &features,
            top_heroes: &top_heroes,
            centrality: &centrality,
            disconnection: disconnection.as_ref(),
            communities: communities.as_ref(),
        };
        storage::save_results(&report, &args.output_dir)?;
        log::info!("Analysis complete. Results saved to {}", args.output_dir.display());
    } else {
        log::info!("Analysis complete");
    }

    Ok(())
}

fn load_records<R: Record>(path: &Path) -> Result<Vec<R>> {
    let records = RecordSource::<R>::resolve(Some(path), None)?.into_records()?;
    log::info!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Load the configuration file, if any, and apply command line overrides.
fn load_config(args: &Cli) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if let Some(top_n) = args.top_n {
        config.top_n = top_n;
    }
    if let Some(hub_percentile) = args.hub_percentile {
        config.hub_percentile = hub_percentile;
    }
    if let Some(weight) = args.weight {
        config.weight_scheme = weight;
    }

    Ok(config)
}

/// PageRank that runs out of iterations still yields its last iterate.
fn compute_centrality(graph: &Graph, kind: CentralityKind, config: &Config) -> Result<CentralityScores> {
    match centrality_with(graph, kind, &config.pagerank) {
        Ok(scores) => Ok(scores),
        Err(AnalysisError::NoConvergence {
            iterations,
            delta,
            last,
        }) => {
            log::warn!(
                "PageRank stopped after {} iterations (delta {:e}); using the last iterate",
                iterations,
                delta
            );
            Ok(CentralityScores { kind, scores: last })
        }
        Err(err) => Err(err.into()),
    }
}
