//! Record sources and preprocessing ahead of graph construction

pub mod preprocessing;
pub mod source;
pub mod table;

pub use preprocessing::Canonicalizer;
pub use source::{CollaborationRecord, MembershipRecord, NodeRecord, Record, RecordSource};
