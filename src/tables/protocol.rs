//! Protocol-number table.
//!
//! Maps IANA protocol numbers (kept as strings, exactly as they appear in
//! flow logs) to lowercase protocol keywords.

use super::{csv_error, csv_reader, field, open_input, require_columns};
use crate::error::Result;
use crate::models::UNKNOWN_PROTOCOL;
use std::collections::HashMap;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info};

const TABLE: &str = "protocol-number";

/// Protocol number → lowercase protocol name.
#[derive(Debug, Clone, Default)]
pub struct ProtocolTable {
    names: HashMap<String, String>,
}

impl ProtocolTable {
    /// Load from a CSV stream with at least `Decimal` and `Keyword` columns.
    ///
    /// Rows with an empty or absent `Decimal` are skipped. A repeated
    /// number keeps the last row's keyword. Other columns are ignored,
    /// even when a row stops short of them.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv_reader(reader);
        let headers = rdr.headers().map_err(|e| csv_error(TABLE, e))?.clone();
        let columns = require_columns(TABLE, &headers, &["Decimal", "Keyword"])?;
        let (decimal, keyword) = (columns[0], columns[1]);

        let mut table = Self::default();
        for record in rdr.records() {
            let record = record.map_err(|e| csv_error(TABLE, e))?;
            let number = record.get(decimal).unwrap_or_default().trim();
            if number.is_empty() {
                debug!("Skipping protocol row with empty Decimal");
                continue;
            }
            let name = field(TABLE, &record, keyword, "Keyword")?;
            table.insert(number, name);
        }

        Ok(table)
    }

    /// Load from a CSV file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let reader = BufReader::new(open_input(path)?);
        let table = Self::from_reader(reader).map_err(|e| e.with_path(path))?;
        info!(
            "Loaded {} protocol numbers from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    /// Add or replace a mapping. The name is lowercased.
    pub fn insert(&mut self, number: &str, name: &str) {
        self.names
            .insert(number.trim().to_string(), name.trim().to_lowercase());
    }

    /// Protocol name for `number`, if known.
    pub fn get(&self, number: &str) -> Option<&str> {
        self.names.get(number).map(String::as_str)
    }

    /// Protocol name for `number`, or `"unknown"`.
    pub fn name_for(&self, number: &str) -> &str {
        self.get(number).unwrap_or(UNKNOWN_PROTOCOL)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
