//! Record table loading (CSV or Parquet) through polars

use std::io;
use std::path::Path;

use polars::prelude::*;

use crate::data::source::Record;
use crate::error::{AnalysisError, Result};

/// Load a table, choosing the reader by file extension. Anything that is not `.parquet` is read
/// as CSV with a header row.
pub fn read_frame(path: &Path) -> Result<DataFrame> {
    log::info!("Reading record table: {}", path.display());

    // Check if the file exists
    if !path.exists() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("file not found: {}", path.display()),
        )
        .into());
    }

    let frame = match path.extension().and_then(|ext| ext.to_str()) {
        Some("parquet") => LazyFrame::scan_parquet(path, Default::default())?.collect()?,
        _ => LazyCsvReader::new(path)
            .with_has_header(true)
            .finish()?
            .collect()?,
    };

    log::debug!("File schema: {:?}", frame.schema());
    log::info!("Loaded {} rows", frame.height());

    Ok(frame)
}

/// Read every row of the table at `path` into `R`, failing with `MalformedInput` when a required
/// column is absent or a cell is null.
pub fn read_records<R: Record>(path: &Path) -> Result<Vec<R>> {
    let frame = read_frame(path)?;
    records_from_frame(&frame)
}

/// Convert the required columns of an in-memory frame into records.
pub fn records_from_frame<R: Record>(frame: &DataFrame) -> Result<Vec<R>> {
    let mut columns = Vec::with_capacity(R::COLUMNS.len());
    for name in R::COLUMNS {
        let column = frame.column(name).map_err(|_| {
            AnalysisError::MalformedInput(format!("missing required column `{name}`"))
        })?;
        columns.push(column.cast(&DataType::String)?);
    }

    let values = columns
        .iter()
        .map(|column| column.str())
        .collect::<PolarsResult<Vec<_>>>()?;

    let mut records = Vec::with_capacity(frame.height());
    for row in 0..frame.height() {
        let mut fields = Vec::with_capacity(values.len());
        for (chunked, name) in values.iter().zip(R::COLUMNS) {
            let value = chunked.get(row).ok_or_else(|| {
                AnalysisError::MalformedInput(format!("row {row} has no value for `{name}`"))
            })?;
            fields.push(value.to_string());
        }
        records.push(R::from_fields(fields)?);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::data::source::{CollaborationRecord, MembershipRecord};

    fn csv_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn reads_collaboration_records() {
        let file = csv_file("hero1,hero2\nIRON MAN,THOR\nTHOR,LOKI\n");

        let records: Vec<CollaborationRecord> = read_records(file.path()).unwrap();

        assert_eq!(
            records,
            vec![
                CollaborationRecord::new("IRON MAN", "THOR"),
                CollaborationRecord::new("THOR", "LOKI"),
            ]
        );
    }

    #[test]
    fn missing_column_is_malformed() {
        let file = csv_file("hero,issue\nTHOR,AA2 35\n");

        let result = read_records::<MembershipRecord>(file.path());

        assert!(matches!(result, Err(AnalysisError::MalformedInput(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = read_records::<MembershipRecord>(Path::new("/nonexistent/edges.csv"));

        assert!(matches!(result, Err(AnalysisError::Io(_))));
    }
}
