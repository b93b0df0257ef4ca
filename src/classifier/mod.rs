//! Flow-log classification.
//!
//! Streams a version-2 VPC flow log line by line, resolves each record's
//! protocol name and tag, and accumulates the two ordered counters.

use crate::error::{ClassifyError, Result};
use crate::models::{Classification, PortProtocol};
use crate::tables::{LookupTable, ProtocolTable};
use std::io::BufRead;
use tracing::{debug, warn};

/// 0-based field index of the destination port.
const DSTPORT_FIELD: usize = 6;
/// 0-based field index of the protocol number.
const PROTOCOL_FIELD: usize = 7;
const MIN_FIELDS: usize = PROTOCOL_FIELD + 1;

/// Classifies flow-log records against a protocol table and a lookup table.
pub struct FlowClassifier<'a> {
    protocols: &'a ProtocolTable,
    lookup: &'a LookupTable,
    strict: bool,
}

impl<'a> FlowClassifier<'a> {
    pub fn new(protocols: &'a ProtocolTable, lookup: &'a LookupTable) -> Self {
        Self {
            protocols,
            lookup,
            strict: false,
        }
    }

    /// Fail on the first short line instead of skipping it.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Classify every record in `reader`.
    ///
    /// Blank lines are ignored. Lines with fewer than 8 fields are skipped
    /// with a warning, or abort the pass in strict mode.
    pub fn classify<R: BufRead>(&self, mut reader: R) -> Result<Classification> {
        let mut result = Classification::default();
        let mut line = String::new();

        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                break;
            }
            result.lines_read += 1;

            if line.trim().is_empty() {
                continue;
            }

            let mut fields = line.split_whitespace();
            let dstport = fields.nth(DSTPORT_FIELD);
            let protocol_number = fields.next();

            let (dstport, protocol_number) = match (dstport, protocol_number) {
                (Some(port), Some(number)) => (port, number),
                _ => {
                    let found = line.split_whitespace().count();
                    if self.strict {
                        return Err(ClassifyError::MalformedRecord {
                            line: result.lines_read,
                            found,
                        });
                    }
                    warn!(
                        "Skipping flow-log line {}: expected at least {} fields, found {}",
                        result.lines_read, MIN_FIELDS, found
                    );
                    result.skipped += 1;
                    continue;
                }
            };

            self.record(&mut result, dstport, protocol_number);
        }

        debug_assert_eq!(result.tag_counts.total(), result.records);
        debug_assert_eq!(result.port_protocol_counts.total(), result.records);
        debug!(
            "Classified {} records ({} skipped, {} lines read)",
            result.records, result.skipped, result.lines_read
        );

        Ok(result)
    }

    fn record(&self, result: &mut Classification, dstport: &str, protocol_number: &str) {
        let protocol = self.protocols.name_for(protocol_number.trim());
        let key = PortProtocol::new(dstport, protocol);
        let tag = self.lookup.tag_for(&key).to_string();

        result.port_protocol_counts.increment(key);
        result.tag_counts.increment(tag);
        result.records += 1;
    }
}
