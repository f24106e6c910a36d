//! Record types and the path-or-table source abstraction

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::data::table;
use crate::error::{AnalysisError, Result};

/// A row type that can be read from a record table.
pub trait Record: Sized {
    /// Column names this record requires, in field order.
    const COLUMNS: &'static [&'static str];

    /// Builds the record from one value per entry of [`Record::COLUMNS`].
    fn from_fields(fields: Vec<String>) -> Result<Self>;
}

/// Two heroes appearing in the same comic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollaborationRecord {
    pub hero1: String,
    pub hero2: String,
}

impl CollaborationRecord {
    pub fn new(hero1: impl Into<String>, hero2: impl Into<String>) -> Self {
        Self {
            hero1: hero1.into(),
            hero2: hero2.into(),
        }
    }
}

/// A hero appearing in a comic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipRecord {
    pub hero: String,
    pub comic: String,
}

impl MembershipRecord {
    pub fn new(hero: impl Into<String>, comic: impl Into<String>) -> Self {
        Self {
            hero: hero.into(),
            comic: comic.into(),
        }
    }
}

/// A typed node of the hero/comic graph. `kind` is `"hero"` or `"comic"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub node: String,
    pub kind: String,
}

impl NodeRecord {
    pub fn new(node: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            kind: kind.into(),
        }
    }
}

fn take_pair(fields: Vec<String>, columns: &[&str]) -> Result<(String, String)> {
    let mut fields = fields.into_iter();
    match (fields.next(), fields.next()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(AnalysisError::MalformedInput(format!(
            "expected fields {columns:?}"
        ))),
    }
}

impl Record for CollaborationRecord {
    const COLUMNS: &'static [&'static str] = &["hero1", "hero2"];

    fn from_fields(fields: Vec<String>) -> Result<Self> {
        let (hero1, hero2) = take_pair(fields, Self::COLUMNS)?;
        Ok(Self { hero1, hero2 })
    }
}

impl Record for MembershipRecord {
    const COLUMNS: &'static [&'static str] = &["hero", "comic"];

    fn from_fields(fields: Vec<String>) -> Result<Self> {
        let (hero, comic) = take_pair(fields, Self::COLUMNS)?;
        Ok(Self { hero, comic })
    }
}

impl Record for NodeRecord {
    const COLUMNS: &'static [&'static str] = &["node", "type"];

    fn from_fields(fields: Vec<String>) -> Result<Self> {
        let (node, kind) = take_pair(fields, Self::COLUMNS)?;
        Ok(Self { node, kind })
    }
}

/// Where records come from: a table file on disk or rows already in memory.
#[derive(Debug, Clone)]
pub enum RecordSource<R> {
    Path(PathBuf),
    Table(Vec<R>),
}

impl<R: Record> RecordSource<R> {
    /// Picks the single source that was supplied.
    ///
    /// Fails with `AmbiguousSource` when both are given and `MalformedInput` when neither is.
    pub fn resolve(path: Option<&Path>, table: Option<Vec<R>>) -> Result<Self> {
        match (path, table) {
            (Some(_), Some(_)) => Err(AnalysisError::AmbiguousSource),
            (Some(path), None) => Ok(RecordSource::Path(path.to_path_buf())),
            (None, Some(rows)) => Ok(RecordSource::Table(rows)),
            (None, None) => Err(AnalysisError::MalformedInput(
                "no record source supplied".to_string(),
            )),
        }
    }

    /// Materializes the records, reading the file for path sources.
    pub fn into_records(self) -> Result<Vec<R>> {
        match self {
            RecordSource::Path(path) => table::read_records(&path),
            RecordSource::Table(rows) => Ok(rows),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_rejects_both_sources() {
        let result = RecordSource::resolve(
            Some(Path::new("edges.csv")),
            Some(vec![MembershipRecord::new("THOR", "AA2 35")]),
        );

        assert!(matches!(result, Err(AnalysisError::AmbiguousSource)));
    }

    #[test]
    fn resolve_rejects_no_source() {
        let result = RecordSource::<MembershipRecord>::resolve(None, None);

        assert!(matches!(result, Err(AnalysisError::MalformedInput(_))));
    }

    #[test]
    fn table_source_passes_rows_through() {
        let rows = vec![CollaborationRecord::new("A", "B")];
        let source = RecordSource::resolve(None, Some(rows.clone())).unwrap();

        assert_eq!(source.into_records().unwrap(), rows);
    }

    #[test]
    fn from_fields_requires_every_column() {
        let result = NodeRecord::from_fields(vec!["THOR".to_string()]);

        assert!(matches!(result, Err(AnalysisError::MalformedInput(_))));
        assert_eq!(
            NodeRecord::from_fields(vec!["THOR".into(), "hero".into()]).unwrap(),
            NodeRecord::new("THOR", "hero")
        );
    }
}
