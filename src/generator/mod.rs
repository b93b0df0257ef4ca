//! Synthetic test data.
//!
//! Produces random version-2 flow-log records and a matching lookup table
//! for exercising the classifier on large inputs.

use crate::error::Result;
use crate::models::UNKNOWN_PROTOCOL;
use crate::tables::ProtocolTable;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::io::Write;
use tracing::debug;

/// Tags assigned to generated lookup rows.
pub const GENERATED_TAGS: [&str; 6] = ["sv_P1", "sv_P2", "sv_P3", "sv_P4", "sv_P5", "email"];

/// Characters of the suffix in generated `eni-` interface ids.
const INTERFACE_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Highest assigned protocol number; 146-255 are unassigned or reserved.
const MAX_PROTOCOL: u8 = 145;

/// Random flow-log and lookup-table writer.
pub struct Generator {
    rng: StdRng,
    start: i64,
}

impl Generator {
    /// Seeded generator for reproducible output, otherwise from entropy.
    ///
    /// `start` is the capture start time (Unix seconds) stamped on every
    /// record.
    pub fn new(seed: Option<u64>, start: i64) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng, start }
    }

    /// One 14-field version-2 flow-log record, without line terminator.
    pub fn flow_log_entry(&mut self) -> String {
        let rng = &mut self.rng;

        let account_id: u64 = rng.gen_range(100_000_000_000..=999_999_999_999);
        let interface_id: String = (0..8)
            .map(|_| INTERFACE_CHARSET[rng.gen_range(0..INTERFACE_CHARSET.len())] as char)
            .collect();
        let srcaddr = random_ipv4(rng);
        let dstaddr = random_ipv4(rng);
        let srcport: u16 = rng.gen_range(1..=65535);
        let dstport: u16 = rng.gen_range(1..=65535);
        let protocol: u8 = rng.gen_range(0..=MAX_PROTOCOL);
        let packets: u64 = rng.gen_range(1..=10_000);
        let bytes = packets * rng.gen_range(100..=1500u64);
        let end = self.start + rng.gen_range(1..=60i64);
        let action = if rng.gen_bool(0.5) { "ACCEPT" } else { "REJECT" };

        format!(
            "2 {} eni-{} {} {} {} {} {} {} {} {} {} {} OK",
            account_id,
            interface_id,
            srcaddr,
            dstaddr,
            srcport,
            dstport,
            protocol,
            packets,
            bytes,
            self.start,
            end,
            action
        )
    }

    /// Write `count` flow-log records, one per line.
    pub fn write_flow_logs<W: Write>(&mut self, mut writer: W, count: usize) -> Result<()> {
        for _ in 0..count {
            writeln!(writer, "{}", self.flow_log_entry())?;
        }
        writer.flush()?;
        debug!("Generated {} flow-log records", count);
        Ok(())
    }

    /// Write a lookup table of `count` random rows with a header.
    ///
    /// Protocol names come from `protocols`; numbers it lacks become
    /// `unknown`.
    pub fn write_lookup_table<W: Write>(
        &mut self,
        mut writer: W,
        protocols: &ProtocolTable,
        count: usize,
    ) -> Result<()> {
        writeln!(writer, "dstport,protocol,tag")?;
        for _ in 0..count {
            let port: u16 = self.rng.gen_range(1..=65535);
            let number: u8 = self.rng.gen_range(0..=MAX_PROTOCOL);
            let protocol = protocols
                .get(&number.to_string())
                .filter(|name| !name.is_empty())
                .unwrap_or(UNKNOWN_PROTOCOL)
                .to_string();
            let tag = GENERATED_TAGS
                .choose(&mut self.rng)
                .copied()
                .unwrap_or(GENERATED_TAGS[0]);
            writeln!(writer, "{},{},{}", port, protocol, tag)?;
        }
        writer.flush()?;
        debug!("Generated {} lookup rows", count);
        Ok(())
    }
}

fn random_ipv4(rng: &mut StdRng) -> String {
    let octets: [u8; 4] = rng.gen();
    format!("{}.{}.{}.{}", octets[0], octets[1], octets[2], octets[3])
}
