//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.flowtag.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".flowtag.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Input file locations.
    #[serde(default)]
    pub inputs: InputConfig,

    /// Report file locations.
    #[serde(default)]
    pub outputs: OutputConfig,

    /// Classifier behaviour.
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Synthetic data settings.
    #[serde(default)]
    pub generator: GeneratorConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Input files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Protocol-number table (`Decimal,Keyword,...`).
    #[serde(default = "default_protocol_numbers")]
    pub protocol_numbers: PathBuf,

    /// Lookup table (`dstport,protocol,tag`).
    #[serde(default = "default_lookup_table")]
    pub lookup_table: PathBuf,

    /// Flow log to classify.
    #[serde(default = "default_flow_logs")]
    pub flow_logs: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            protocol_numbers: default_protocol_numbers(),
            lookup_table: default_lookup_table(),
            flow_logs: default_flow_logs(),
        }
    }
}

fn default_protocol_numbers() -> PathBuf {
    PathBuf::from("protocol_numbers.csv")
}

fn default_lookup_table() -> PathBuf {
    PathBuf::from("lookup_table.csv")
}

fn default_flow_logs() -> PathBuf {
    PathBuf::from("flow_logs.txt")
}

/// Report files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Tag count report.
    #[serde(default = "default_tag_counts")]
    pub tag_counts: PathBuf,

    /// Port/protocol count report.
    #[serde(default = "default_port_protocol_counts")]
    pub port_protocol_counts: PathBuf,

    /// Optional single file holding both reports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combined: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            tag_counts: default_tag_counts(),
            port_protocol_counts: default_port_protocol_counts(),
            combined: None,
        }
    }
}

fn default_tag_counts() -> PathBuf {
    PathBuf::from("tag_counts.csv")
}

fn default_port_protocol_counts() -> PathBuf {
    PathBuf::from("port_protocols_counts.csv")
}

/// Classifier settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Abort on malformed flow-log lines instead of skipping them.
    #[serde(default)]
    pub strict: bool,
}

/// Synthetic data generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Number of flow-log records to generate.
    #[serde(default = "default_flow_log_entries")]
    pub flow_log_entries: usize,

    /// Number of lookup-table rows to generate.
    #[serde(default = "default_lookup_entries")]
    pub lookup_entries: usize,

    /// RNG seed for reproducible output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            flow_log_entries: default_flow_log_entries(),
            lookup_entries: default_lookup_entries(),
            seed: None,
        }
    }
}

fn default_flow_log_entries() -> usize {
    100_000
}

fn default_lookup_entries() -> usize {
    15_000
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Only values given explicitly on the command line override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref path) = args.protocols {
            self.inputs.protocol_numbers = path.clone();
        }
        if let Some(ref path) = args.lookup {
            self.inputs.lookup_table = path.clone();
        }
        if let Some(ref path) = args.flow_logs {
            self.inputs.flow_logs = path.clone();
        }

        if let Some(ref path) = args.tag_output {
            self.outputs.tag_counts = path.clone();
        }
        if let Some(ref path) = args.port_protocol_output {
            self.outputs.port_protocol_counts = path.clone();
        }
        if args.combined_output.is_some() {
            self.outputs.combined = args.combined_output.clone();
        }

        if let Some(n) = args.flow_log_entries {
            self.generator.flow_log_entries = n;
        }
        if let Some(n) = args.lookup_entries {
            self.generator.lookup_entries = n;
        }
        if args.seed.is_some() {
            self.generator.seed = args.seed;
        }

        // Flags only ever switch behaviour on
        if args.strict {
            self.classifier.strict = true;
        }
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::tests::make_args;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(
            config.inputs.protocol_numbers,
            PathBuf::from("protocol_numbers.csv")
        );
        assert_eq!(config.inputs.flow_logs, PathBuf::from("flow_logs.txt"));
        assert_eq!(
            config.outputs.port_protocol_counts,
            PathBuf::from("port_protocols_counts.csv")
        );
        assert!(config.outputs.combined.is_none());
        assert!(!config.classifier.strict);
        assert_eq!(config.generator.flow_log_entries, 100_000);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
verbose = true

[inputs]
flow_logs = "/var/log/vpc/flows.txt"

[outputs]
combined = "output.txt"

[classifier]
strict = true

[generator]
seed = 9
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert!(config.general.verbose);
        assert_eq!(config.inputs.flow_logs, PathBuf::from("/var/log/vpc/flows.txt"));
        assert_eq!(config.inputs.lookup_table, PathBuf::from("lookup_table.csv"));
        assert_eq!(config.outputs.combined, Some(PathBuf::from("output.txt")));
        assert!(config.classifier.strict);
        assert_eq!(config.generator.seed, Some(9));
        assert_eq!(config.generator.lookup_entries, 15_000);
    }

    #[test]
    fn test_merge_with_args_prefers_cli() {
        let mut config: Config = toml::from_str(
            "[inputs]\nlookup_table = \"from_file.csv\"\nflow_logs = \"file_flows.txt\"\n",
        )
        .unwrap();

        let mut args = make_args();
        args.lookup = Some(PathBuf::from("from_cli.csv"));
        args.strict = true;
        args.seed = Some(5);

        config.merge_with_args(&args);

        assert_eq!(config.inputs.lookup_table, PathBuf::from("from_cli.csv"));
        assert_eq!(config.inputs.flow_logs, PathBuf::from("file_flows.txt"));
        assert!(config.classifier.strict);
        assert_eq!(config.generator.seed, Some(5));
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[inputs]"));
        assert!(toml_str.contains("[outputs]"));
        assert!(toml_str.contains("[classifier]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.outputs.tag_counts, PathBuf::from("tag_counts.csv"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(Config::load(&dir.path().join(CONFIG_FILE_NAME)).is_err());
    }
}
