//! CSV file-reader collaborator. Materializes headers and rows up front so
//! the pipeline stays synchronous and I/O-free.

use crate::domain::model::{CellValue, RawRow};
use crate::utils::error::Result;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Read a delimited file, picking the delimiter from its extension:
/// `.tsv` parses tab-separated, anything else comma-separated.
pub fn read_path(path: impl AsRef<Path>) -> Result<(Vec<String>, Vec<RawRow>)> {
    let path = path.as_ref();
    let file = File::open(path)?;
    tracing::debug!("reading {}", path.display());
    read_with_delimiter(file, delimiter_for(path))
}

fn delimiter_for(path: &Path) -> u8 {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
        _ => b',',
    }
}

/// Read headers and rows from any byte stream of CSV data.
pub fn read_from<R: Read>(reader: R) -> Result<(Vec<String>, Vec<RawRow>)> {
    read_with_delimiter(reader, b',')
}

/// Cells are coerced to the closest scalar shape; short records pad with
/// nulls via the flexible reader so ragged rows do not abort the file.
pub fn read_with_delimiter<R: Read>(
    reader: R,
    delimiter: u8,
) -> Result<(Vec<String>, Vec<RawRow>)> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let mut row = RawRow::new();
        for (index, header) in headers.iter().enumerate() {
            let value = record
                .get(index)
                .map(CellValue::from_csv_field)
                .unwrap_or(CellValue::Null);
            row.push(header.clone(), value);
        }
        rows.push(row);
    }

    tracing::debug!("read {} rows with {} columns", rows.len(), headers.len());
    Ok((headers, rows))
}
