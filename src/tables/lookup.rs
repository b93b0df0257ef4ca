//! Port/protocol → tag lookup table.

use super::{csv_error, csv_reader, field, open_input, require_columns};
use crate::error::Result;
use crate::models::{PortProtocol, UNTAGGED};
use std::collections::HashMap;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info};

const TABLE: &str = "lookup";

/// (port, protocol) → tag. Keys are lowercased, tags keep their case.
#[derive(Debug, Clone, Default)]
pub struct LookupTable {
    tags: HashMap<PortProtocol, String>,
}

impl LookupTable {
    /// Load from a CSV stream with `dstport`, `protocol` and `tag` columns.
    ///
    /// A later row with the same key replaces the earlier tag, so overrides
    /// can be appended to the end of the file. Other columns are ignored,
    /// even when a row stops short of them.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv_reader(reader);
        let headers = rdr.headers().map_err(|e| csv_error(TABLE, e))?.clone();
        let columns = require_columns(TABLE, &headers, &["dstport", "protocol", "tag"])?;
        let (port_col, protocol_col, tag_col) = (columns[0], columns[1], columns[2]);

        let mut table = Self::default();
        for record in rdr.records() {
            let record = record.map_err(|e| csv_error(TABLE, e))?;
            let key = PortProtocol::new(
                field(TABLE, &record, port_col, "dstport")?,
                field(TABLE, &record, protocol_col, "protocol")?,
            );
            let tag = field(TABLE, &record, tag_col, "tag")?.trim().to_string();
            if let Some(previous) = table.tags.get(&key) {
                debug!("Lookup entry {} overrides tag {}", key, previous);
            }
            table.tags.insert(key, tag);
        }

        Ok(table)
    }

    /// Load from a CSV file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let reader = BufReader::new(open_input(path)?);
        let table = Self::from_reader(reader).map_err(|e| e.with_path(path))?;
        info!(
            "Loaded {} lookup entries from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    /// Add or replace an entry.
    #[cfg(test)]
    pub fn insert(&mut self, port: &str, protocol: &str, tag: &str) {
        self.tags
            .insert(PortProtocol::new(port, protocol), tag.trim().to_string());
    }

    /// Tag for `key`, if any.
    pub fn get(&self, key: &PortProtocol) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Tag for `key`, or `"Untagged"`.
    pub fn tag_for(&self, key: &PortProtocol) -> &str {
        self.get(key).unwrap_or(UNTAGGED)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClassifyError;

    fn key(port: &str, protocol: &str) -> PortProtocol {
        PortProtocol::new(port, protocol)
    }

    #[test]
    fn test_parse_lookup_table() {
        let csv = "dstport,protocol,tag\n\
                   25,tcp,sv_P1 \n\
                   68,udp,sv_P2\n\
                   31,udp,SV_P3\n\
                   0,icmp,sv_P5\n\
                   110,tcp,email\n";
        let table = LookupTable::from_reader(csv.as_bytes()).unwrap();

        assert_eq!(table.len(), 5);
        assert_eq!(table.get(&key("25", "tcp")), Some("sv_P1"));
        assert_eq!(table.get(&key("31", "udp")), Some("SV_P3"));
        assert_eq!(table.get(&key("0", "icmp")), Some("sv_P5"));
        assert_eq!(table.get(&key("110", "tcp")), Some("email"));
    }

    #[test]
    fn test_keys_are_normalized_tags_are_not() {
        let csv = "dstport,protocol,tag\n 443 , TCP ,  Web_Secure \n";
        let table = LookupTable::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.get(&key("443", "tcp")), Some("Web_Secure"));
    }

    #[test]
    fn test_duplicate_key_last_write_wins() {
        let csv = "dstport,protocol,tag\n443,tcp,sv_P2\n22,tcp,sv_P4\n443,TCP,override\n";
        let table = LookupTable::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(&key("443", "tcp")), Some("override"));
    }

    #[test]
    fn test_missing_key_is_untagged() {
        let table = LookupTable::from_reader("dstport,protocol,tag\n443,tcp,sv_P2\n".as_bytes())
            .unwrap();
        assert_eq!(table.tag_for(&key("443", "udp")), "Untagged");
        assert_eq!(table.tag_for(&key("443", "tcp")), "sv_P2");
    }

    #[test]
    fn test_extra_columns_and_header_padding() {
        let csv = " dstport , protocol , tag ,note\n80,tcp,web,plain http\n";
        let table = LookupTable::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.get(&key("80", "tcp")), Some("web"));
    }

    #[test]
    fn test_row_may_stop_before_unused_columns() {
        let csv = "dstport,protocol,tag,note\n80,tcp,web\n";
        let table = LookupTable::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.get(&key("80", "tcp")), Some("web"));
    }

    #[test]
    fn test_row_without_tag_value_is_malformed() {
        let csv = "dstport,protocol,tag\n80,tcp,web\n443,tcp\n";
        let err = LookupTable::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, ClassifyError::MalformedInput { .. }));
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_missing_tag_column() {
        let err = LookupTable::from_reader("dstport,protocol\n80,tcp\n".as_bytes()).unwrap_err();
        match err {
            ClassifyError::MalformedInput { table, reason } => {
                assert_eq!(table, "lookup");
                assert!(reason.contains("tag"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_header_only_is_empty_table() {
        let table = LookupTable::from_reader("dstport,protocol,tag\n".as_bytes()).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_from_path_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = LookupTable::from_path(&dir.path().join("lookup_table.csv")).unwrap_err();
        assert!(matches!(err, ClassifyError::FileNotFound { .. }));
    }
}
