//! Data models for the flow-log classifier.
//!
//! This module contains the key and counter types shared by the table
//! loaders, the classifier and the report writers.

use indexmap::IndexMap;
use std::fmt;
use std::hash::Hash;

/// Protocol name used when a flow-log protocol number is not in the
/// protocol table.
pub const UNKNOWN_PROTOCOL: &str = "unknown";

/// Tag used when no lookup-table entry matches a (port, protocol) pair.
pub const UNTAGGED: &str = "Untagged";

/// A destination port paired with a protocol name.
///
/// Both components are stored lowercased. This is the key of the lookup
/// table and of the port/protocol counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PortProtocol {
    /// Destination port as it appears in the source (not parsed).
    pub port: String,
    /// Lowercased protocol name, or [`UNKNOWN_PROTOCOL`].
    pub protocol: String,
}

impl PortProtocol {
    /// Build a key, trimming and lowercasing both components.
    pub fn new(port: &str, protocol: &str) -> Self {
        Self {
            port: port.trim().to_lowercase(),
            protocol: protocol.trim().to_lowercase(),
        }
    }
}

impl fmt::Display for PortProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.port, self.protocol)
    }
}

/// Frequency counter that iterates in first-insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedCounter<K: Hash + Eq> {
    counts: IndexMap<K, u64>,
}

impl<K: Hash + Eq> Default for OrderedCounter<K> {
    fn default() -> Self {
        Self {
            counts: IndexMap::new(),
        }
    }
}

impl<K: Hash + Eq> OrderedCounter<K> {
    /// Add one occurrence of `key`. A new key is appended at the end.
    pub fn increment(&mut self, key: K) {
        *self.counts.entry(key).or_insert(0) += 1;
    }

    /// Count for `key`, zero if never seen.
    #[cfg(test)]
    pub fn get(&self, key: &K) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Entries in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, u64)> {
        self.counts.iter().map(|(k, v)| (k, *v))
    }
}

impl OrderedCounter<String> {
    /// Count for a string key without allocating.
    pub fn count_of(&self, key: &str) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }
}

/// Tag → count, in order of first appearance.
pub type TagCounts = OrderedCounter<String>;

/// (port, protocol) → count, in order of first appearance.
pub type PortProtocolCounts = OrderedCounter<PortProtocol>;

/// Result of one pass over a flow log.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    /// Records per tag.
    pub tag_counts: TagCounts,
    /// Records per (port, protocol) pair.
    pub port_protocol_counts: PortProtocolCounts,
    /// Total lines read, including blank and skipped ones.
    pub lines_read: u64,
    /// Lines that were classified.
    pub records: u64,
    /// Lines skipped for having too few fields.
    pub skipped: u64,
}

impl Classification {
    /// Number of records that fell back to [`UNTAGGED`].
    pub fn untagged(&self) -> u64 {
        self.tag_counts.count_of(UNTAGGED)
    }
}
