use crate::error::DatasetError;
use core_types::{RawRecord, Transaction};
use std::path::Path;

/// Reads a delimited transaction table from disk.
///
/// Columns the engine does not know are ignored; known columns with blank
/// cells deserialize to `None` and are handled by the Cleaning Stage.
/// A missing or unreadable file is an input error and is surfaced to the
/// caller, never defaulted.
pub fn load_csv(path: &Path) -> Result<Vec<RawRecord>, DatasetError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut records = Vec::new();
    for row in reader.deserialize::<RawRecord>() {
        records.push(row?);
    }

    if records.is_empty() {
        return Err(DatasetError::EmptyTable(path.display().to_string()));
    }

    tracing::info!(rows = records.len(), path = %path.display(), "Loaded transaction table");
    Ok(records)
}

/// Writes a cleaned table back out as CSV (used by the `clean` command).
pub fn write_csv(path: &Path, table: &[Transaction]) -> Result<(), DatasetError> {
    let mut writer = csv::Writer::from_path(path).map_err(DatasetError::Write)?;
    for row in table {
        writer.serialize(row).map_err(DatasetError::Write)?;
    }
    writer
        .flush()
        .map_err(|e| DatasetError::Write(csv::Error::from(e)))?;
    Ok(())
}
