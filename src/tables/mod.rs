//! Lookup tables loaded from CSV.
//!
//! Both tables are read once per run with the `csv` crate and are
//! read-only afterwards.

pub mod lookup;
pub mod protocol;

pub use lookup::LookupTable;
pub use protocol::ProtocolTable;

use crate::error::{ClassifyError, Result};
use csv::{Reader, ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Open an input file, mapping a missing file to `FileNotFound`.
pub fn open_input(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| ClassifyError::from_open(path, e))
}

/// CSV reader with a header row, trimmed header names and rows that may
/// carry more columns than the header.
fn csv_reader<R: Read>(reader: R) -> Reader<R> {
    ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::Headers)
        .flexible(true)
        .from_reader(reader)
}

/// Positions of the `required` columns in `headers`, in the order given.
///
/// Header names are matched case-sensitively. A repeated header name
/// resolves to its last occurrence.
fn require_columns(
    table: &'static str,
    headers: &StringRecord,
    required: &[&str],
) -> Result<Vec<usize>> {
    if headers.is_empty() || headers.iter().all(str::is_empty) {
        return Err(ClassifyError::MalformedInput {
            table,
            reason: "missing header row".to_string(),
        });
    }

    let mut indices = Vec::with_capacity(required.len());
    let mut missing = Vec::new();
    for &col in required {
        match headers.iter().collect::<Vec<_>>().iter().rposition(|h| *h == col) {
            Some(index) => indices.push(index),
            None => missing.push(col),
        }
    }

    if missing.is_empty() {
        Ok(indices)
    } else {
        Err(ClassifyError::MalformedInput {
            table,
            reason: format!("missing column(s): {}", missing.join(", ")),
        })
    }
}

/// Value of `column` (at `index`) in `record`.
///
/// Rows may be shorter than the header; only a missing required value is
/// an error.
fn field<'r>(
    table: &'static str,
    record: &'r StringRecord,
    index: usize,
    column: &str,
) -> Result<&'r str> {
    record.get(index).ok_or_else(|| {
        let reason = match record.position() {
            Some(pos) => format!("row at line {} has no {} value", pos.line(), column),
            None => format!("row has no {} value", column),
        };
        ClassifyError::MalformedInput { table, reason }
    })
}

/// Map a `csv` error into our error type, keeping I/O errors as such.
fn csv_error(table: &'static str, err: csv::Error) -> ClassifyError {
    // csv's Display already carries the record position
    let reason = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(e) => ClassifyError::Io(e),
        _ => ClassifyError::MalformedInput { table, reason },
    }
}
