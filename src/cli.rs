//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// FlowTag - tag and count VPC flow-log records
///
/// Matches each flow-log record's destination port and protocol against a
/// lookup table and writes per-tag and per-port/protocol count reports.
///
/// Examples:
///   flowtag
///   flowtag --flow-logs flows.txt --lookup lookup_table.csv
///   flowtag --combined-output output.txt --strict
///   flowtag --generate --flow-logs flow_logs_big.txt --lookup lookup_table_big.csv
///   flowtag --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Protocol-number table (CSV with Decimal and Keyword columns)
    ///
    /// Default: protocol_numbers.csv
    #[arg(long, value_name = "FILE")]
    pub protocols: Option<PathBuf>,

    /// Lookup table (CSV with dstport, protocol and tag columns)
    ///
    /// Default: lookup_table.csv. In --generate mode this is written.
    #[arg(short, long, value_name = "FILE")]
    pub lookup: Option<PathBuf>,

    /// Flow log to classify (version-2, space separated)
    ///
    /// Default: flow_logs.txt. In --generate mode this is written.
    #[arg(short, long, value_name = "FILE")]
    pub flow_logs: Option<PathBuf>,

    /// Output file for tag counts
    #[arg(long, value_name = "FILE")]
    pub tag_output: Option<PathBuf>,

    /// Output file for port/protocol counts
    #[arg(long, value_name = "FILE")]
    pub port_protocol_output: Option<PathBuf>,

    /// Also write both reports into a single file
    #[arg(long, value_name = "FILE")]
    pub combined_output: Option<PathBuf>,

    /// Abort on flow-log lines with fewer than 8 fields instead of skipping them
    #[arg(long)]
    pub strict: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .flowtag.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a synthetic flow log and lookup table instead of classifying
    #[arg(long)]
    pub generate: bool,

    /// Number of flow-log records to generate
    #[arg(long, value_name = "COUNT", requires = "generate")]
    pub flow_log_entries: Option<usize>,

    /// Number of lookup-table rows to generate
    #[arg(long, value_name = "COUNT", requires = "generate")]
    pub lookup_entries: Option<usize>,

    /// Seed for reproducible generation
    #[arg(long, value_name = "SEED", requires = "generate")]
    pub seed: Option<u64>,

    /// Generate a default .flowtag.toml configuration file
    #[arg(long, conflicts_with = "generate")]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.flow_log_entries == Some(0) {
            return Err("Flow-log entries must be at least 1".to_string());
        }

        if self.lookup_entries == Some(0) {
            return Err("Lookup entries must be at least 1".to_string());
        }

        // Reports must not clobber each other
        if let (Some(tag), Some(port)) = (&self.tag_output, &self.port_protocol_output) {
            if tag == port {
                return Err("Tag and port/protocol reports must go to different files".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
