//! Graph representation, construction and traversal

pub mod algorithms;
pub mod builder;
pub mod network;
pub mod weight;

pub use builder::{build_bipartite_graph, build_collaboration_graph, GraphBuilder};
pub use network::{Collaboration, ComicAppearances, Edge, Graph, GraphType, Node, NodeKind};
pub use weight::{MaxProportion, Reciprocal, WeightPolicy, WeightScheme};
