//! Core library functions for the hero network analyzer
//!
//! Builds weighted hero collaboration graphs from comic appearance records and analyzes them:
//! hero ranking, structural features, minimum cuts, communities and centrality.

pub mod cluster;
pub mod config;
pub mod data;
pub mod error;
pub mod features;
pub mod graph;
pub mod ranking;
pub mod storage;

pub use error::{AnalysisError, Result};
