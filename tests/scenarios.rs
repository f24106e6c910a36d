use std::collections::BTreeSet;
use std::io::Write;

use hero_network_analyzer::cluster::{
    centrality, centrality_by_name, community_report, disconnect, partition, same_community,
    CentralityKind,
};
use hero_network_analyzer::data::preprocessing::{extract_subgraph, remove_self_loops, Canonicalizer};
use hero_network_analyzer::data::{CollaborationRecord, MembershipRecord, NodeRecord, RecordSource};
use hero_network_analyzer::features::{extract_features, GraphMode};
use hero_network_analyzer::graph::{
    build_bipartite_graph, build_collaboration_graph, GraphType, NodeKind, Reciprocal,
};
use hero_network_analyzer::ranking::{rank_by_frequency, TopNodeService};
use hero_network_analyzer::AnalysisError;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn records(pairs: &[(&str, &str)]) -> Vec<CollaborationRecord> {
    pairs
        .iter()
        .map(|(a, b)| CollaborationRecord::new(*a, *b))
        .collect()
}

#[test]
fn reciprocal_path_scenario() {
    let graph = build_collaboration_graph(records(&[("A", "B"), ("A", "B"), ("B", "C")]), &Reciprocal)
        .unwrap();

    assert_eq!(graph.edge("A", "B").unwrap().weight(), 0.5);
    assert_eq!(graph.edge("B", "C").unwrap().weight(), 1.0);

    let cut = disconnect(&graph, "A", "C").unwrap();

    // Max-flow min-cut picks A-B (0.5), not B-C (1.0): the cheaper edge is the minimum cut even
    // though B-C is the edge adjacent to the sink.
    assert!(close(cut.cut_weight, 0.5));
    assert_eq!(cut.num_links(), 1);
    let removed: f64 = cut.removed_edges.iter().map(|edge| edge.weight()).sum();
    assert!(close(cut.cut_weight, removed));
    assert!(cut.side_a.is_disjoint(&cut.side_b));
    let all: BTreeSet<_> = cut.side_a.union(&cut.side_b).cloned().collect();
    assert_eq!(all, graph.nodes().cloned().collect());
}

#[test]
fn star_degree_scenario() {
    let graph = build_collaboration_graph(
        records(&[("X", "P"), ("X", "Q"), ("X", "R")]),
        &Reciprocal,
    )
    .unwrap();

    let degree = centrality(&graph, CentralityKind::Degree).unwrap();

    assert!(close(degree.get("X").unwrap(), 1.0));
    for leaf in ["P", "Q", "R"] {
        assert!(close(degree.get(leaf).unwrap(), 1.0 / 3.0));
        assert!(close(
            degree.get(leaf).unwrap(),
            graph.degree(leaf).unwrap() as f64 / 3.0
        ));
    }

    assert!(matches!(
        centrality_by_name(&graph, "katz"),
        Err(AnalysisError::UnknownMetric(_))
    ));
}

#[test]
fn top_heroes_bound_the_analysis() {
    let memberships = vec![
        MembershipRecord::new("CAPTAIN AMERICA", "AA2 35"),
        MembershipRecord::new("IRON MAN", "AA2 35"),
        MembershipRecord::new("CAPTAIN AMERICA", "M/PRM 35"),
        MembershipRecord::new("THOR", "M/PRM 35"),
        MembershipRecord::new("CAPTAIN AMERICA", "M/PRM 36"),
        MembershipRecord::new("IRON MAN", "M/PRM 36"),
    ];
    let mut service = TopNodeService::from_memberships(&memberships, &Canonicalizer::default()).unwrap();
    let top = service.top_n(2).unwrap();
    assert_eq!(top, vec!["CAPTAIN AMERICA", "IRON MAN"]);

    let graph = build_collaboration_graph(
        records(&[
            ("CAPTAIN AMERICA", "IRON MAN"),
            ("CAPTAIN AMERICA", "THOR"),
            ("IRON MAN", "CAPTAIN AMERICA"),
        ]),
        &Reciprocal,
    )
    .unwrap();
    let subgraph = extract_subgraph(&graph, &top);

    assert_eq!(subgraph.node_count(), 2);
    assert_eq!(subgraph.edge_count(), 1);
}

#[test]
fn ranked_names_match_graph_nodes() {
    let canonicalizer = Canonicalizer::default();
    let cleaned = remove_self_loops(
        records(&[("X /", "Y"), ("X /", "Z"), ("Y ", "Y/")]),
        &canonicalizer,
    );
    let graph = build_collaboration_graph(cleaned.clone(), &Reciprocal).unwrap();

    let ranking = rank_by_frequency(
        cleaned
            .iter()
            .flat_map(|record| [record.hero1.as_str(), record.hero2.as_str()]),
    )
    .unwrap();
    let top = ranking.top_n(3);

    assert_eq!(top[0], "X");
    assert!(top.iter().all(|hero| graph.contains_node(hero)));
    assert_eq!(extract_subgraph(&graph, &top).node_count(), 3);
}

#[test]
fn communities_of_two_cliques() {
    let graph = build_collaboration_graph(
        records(&[
            ("a", "b"),
            ("b", "c"),
            ("c", "a"),
            ("c", "d"),
            ("d", "e"),
            ("e", "f"),
            ("f", "d"),
        ]),
        &Reciprocal,
    )
    .unwrap();

    let split = partition(&graph).unwrap();

    assert_eq!(split.components.len(), 2);
    let covered: usize = split.components.iter().map(BTreeSet::len).sum();
    assert_eq!(covered, graph.node_count());
    assert!(same_community(&split, "a", "c").unwrap());
    assert!(!same_community(&split, "a", "f").unwrap());
    assert_eq!(graph.edge_count(), 7);

    let report = community_report(&graph, "b", "e", None).unwrap();
    assert!(!report.same_community);
}

#[test]
fn bipartite_graph_features() {
    let nodes = vec![
        NodeRecord::new("AA2 35", "comic"),
        NodeRecord::new("M/PRM 35", "comic"),
        NodeRecord::new("CAPTAIN AMERICA", "hero"),
    ];
    let edges = vec![
        MembershipRecord::new("CAPTAIN AMERICA", "AA2 35"),
        MembershipRecord::new("IRON MAN/", "AA2 35"),
        MembershipRecord::new("CAPTAIN AMERICA", "M/PRM 35"),
    ];

    let graph = build_bipartite_graph(nodes, edges, &Canonicalizer::default()).unwrap();
    let features = extract_features(&graph, 50.0).unwrap();

    assert_eq!(graph.graph_type(), GraphType::HeroComic);
    assert_eq!(graph.node_kind("IRON MAN"), Some(NodeKind::Hero));
    assert_eq!(features.n_nodes, 4);
    assert_eq!(features.n_edges, 3);
    assert_eq!(features.mode, GraphMode::Sparse);
    assert_eq!(features.heroes_per_comic.len(), 2);
}

#[test]
fn collaborations_from_csv() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(file, "hero1,hero2").unwrap();
    writeln!(file, "THOR,LOKI").unwrap();
    writeln!(file, "LOKI,THOR").unwrap();
    writeln!(file, "THOR,ODIN").unwrap();
    file.flush().unwrap();

    let source = RecordSource::<CollaborationRecord>::resolve(Some(file.path()), None).unwrap();
    let loaded = source.into_records().unwrap();
    let graph = build_collaboration_graph(loaded.clone(), &Reciprocal).unwrap();

    assert_eq!(graph.edge("LOKI", "THOR").unwrap().raw_count(), 2);

    let ranking =
        rank_by_frequency(loaded.iter().flat_map(|r| [r.hero1.as_str(), r.hero2.as_str()])).unwrap();
    assert_eq!(ranking.top_n(1), vec!["THOR"]);

    assert!(matches!(
        RecordSource::resolve(Some(file.path()), Some(loaded)),
        Err(AnalysisError::AmbiguousSource)
    ));
}
