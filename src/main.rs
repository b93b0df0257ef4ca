//! FlowTag - VPC flow-log tagger
//!
//! A batch CLI that classifies flow-log records by destination port and
//! protocol against a lookup table and writes two count reports.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (missing file, malformed table, write failure, etc.)

mod classifier;
mod cli;
mod config;
mod error;
mod generator;
mod models;
mod report;
mod tables;

use anyhow::{Context, Result};
use chrono::Utc;
use classifier::FlowClassifier;
use cli::Args;
use config::{Config, CONFIG_FILE_NAME};
use generator::Generator;
use indicatif::{ProgressBar, ProgressStyle};
use models::Classification;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::time::Instant;
use tables::{LookupTable, ProtocolTable};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(&args, &config);

    info!("FlowTag v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    let outcome = if args.generate {
        run_generate(&config)
    } else {
        run_classify(&config, args.quiet)
    };

    if let Err(e) = outcome {
        error!("Run failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .flowtag.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE_NAME);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to change input files, report files and classifier options.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config: &Config) {
    let level = if config.general.verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load configuration from file or use defaults, then apply CLI overrides.
fn load_config(args: &Args) -> Result<Config> {
    let mut config = if let Some(ref config_path) = args.config {
        Config::load(config_path)?
    } else {
        Config::load_default()?.unwrap_or_default()
    };

    config.merge_with_args(args);
    Ok(config)
}

/// Load both tables, classify the flow log and write the reports.
fn run_classify(config: &Config, quiet: bool) -> Result<()> {
    let start_time = Instant::now();
    let inputs = &config.inputs;

    println!("📥 Loading tables...");
    let protocols = ProtocolTable::from_path(&inputs.protocol_numbers).with_context(|| {
        format!(
            "Failed to load protocol numbers from {}",
            inputs.protocol_numbers.display()
        )
    })?;
    let lookup = LookupTable::from_path(&inputs.lookup_table).with_context(|| {
        format!(
            "Failed to load lookup table from {}",
            inputs.lookup_table.display()
        )
    })?;

    if protocols.is_empty() {
        warn!("Protocol table is empty; every record will resolve to protocol 'unknown'");
    }
    if lookup.is_empty() {
        warn!("Lookup table is empty; every record will be Untagged");
    }

    println!("🔬 Classifying {}...", inputs.flow_logs.display());
    let classification = classify_file(
        &inputs.flow_logs,
        &protocols,
        &lookup,
        config.classifier.strict,
        quiet,
    )
    .with_context(|| format!("Failed to classify {}", inputs.flow_logs.display()))?;

    if classification.tag_counts.is_empty() {
        warn!("No flow-log records were classified; reports will contain headers only");
    }

    println!("📝 Writing reports...");
    write_reports(config, &classification)?;

    let duration = start_time.elapsed().as_secs_f64();

    println!("\n📊 Classification Summary:");
    println!("   Records: {}", classification.records);
    if classification.skipped > 0 {
        println!("   Skipped (malformed): {}", classification.skipped);
    }
    println!("   Distinct tags: {}", classification.tag_counts.len());
    println!(
        "   Distinct port/protocol pairs: {}",
        classification.port_protocol_counts.len()
    );
    println!("   Untagged: {}", classification.untagged());
    println!("   Duration: {:.1}s", duration);
    println!(
        "\n✅ Done! Reports saved to: {} and {}",
        config.outputs.tag_counts.display(),
        config.outputs.port_protocol_counts.display()
    );

    Ok(())
}

/// Stream the flow log through the classifier with a byte progress bar.
fn classify_file(
    path: &Path,
    protocols: &ProtocolTable,
    lookup: &LookupTable,
    strict: bool,
    quiet: bool,
) -> Result<Classification> {
    let file = tables::open_input(path)?;
    let classifier = FlowClassifier::new(protocols, lookup).strict(strict);

    let result = if quiet {
        classifier.classify(BufReader::new(file))
    } else {
        let len = file.metadata().map(|m| m.len()).unwrap_or(0);
        let pb = ProgressBar::new(len);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
                )?
                .progress_chars("#>-"),
        );
        let result = classifier.classify(BufReader::new(pb.wrap_read(file)));
        pb.finish_and_clear();
        result
    };
    let classification = result.map_err(|e| e.with_path(path))?;

    info!(
        "Classified {} records from {}",
        classification.records,
        path.display()
    );
    Ok(classification)
}

/// Write the configured reports.
fn write_reports(config: &Config, classification: &Classification) -> Result<()> {
    let outputs = &config.outputs;

    report::save_to_path(&outputs.tag_counts, |file| {
        report::write_tag_report(&classification.tag_counts, BufWriter::new(file))
    })
    .with_context(|| {
        format!(
            "Failed to write tag report to {}",
            outputs.tag_counts.display()
        )
    })?;

    report::save_to_path(&outputs.port_protocol_counts, |file| {
        report::write_port_protocol_report(
            &classification.port_protocol_counts,
            BufWriter::new(file),
        )
    })
    .with_context(|| {
        format!(
            "Failed to write port/protocol report to {}",
            outputs.port_protocol_counts.display()
        )
    })?;

    if let Some(ref combined) = outputs.combined {
        report::save_to_path(combined, |file| {
            report::write_combined_report(
                &classification.tag_counts,
                &classification.port_protocol_counts,
                BufWriter::new(file),
            )
        })
        .with_context(|| format!("Failed to write combined report to {}", combined.display()))?;
        info!("Combined report saved to {}", combined.display());
    }

    Ok(())
}

/// Handle --generate: write a synthetic flow log and lookup table.
fn run_generate(config: &Config) -> Result<()> {
    let inputs = &config.inputs;
    let settings = &config.generator;

    let protocols = ProtocolTable::from_path(&inputs.protocol_numbers).with_context(|| {
        format!(
            "Failed to load protocol numbers from {}",
            inputs.protocol_numbers.display()
        )
    })?;

    let mut generator = Generator::new(settings.seed, Utc::now().timestamp());

    println!(
        "🎲 Generating {} flow-log records into {}",
        settings.flow_log_entries,
        inputs.flow_logs.display()
    );
    report::save_to_path(&inputs.flow_logs, |file| {
        generator.write_flow_logs(BufWriter::new(file), settings.flow_log_entries)
    })
    .with_context(|| format!("Failed to write {}", inputs.flow_logs.display()))?;

    println!(
        "🎲 Generating {} lookup rows into {}",
        settings.lookup_entries,
        inputs.lookup_table.display()
    );
    report::save_to_path(&inputs.lookup_table, |file| {
        generator.write_lookup_table(BufWriter::new(file), &protocols, settings.lookup_entries)
    })
    .with_context(|| format!("Failed to write {}", inputs.lookup_table.display()))?;

    println!("\n✅ Generation complete.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_inputs(dir: &Path) -> Config {
        let mut config = Config::default();
        config.inputs.protocol_numbers = dir.join("protocol_numbers.csv");
        config.inputs.lookup_table = dir.join("lookup_table.csv");
        config.inputs.flow_logs = dir.join("flow_logs.txt");
        config.outputs.tag_counts = dir.join("tag_counts.csv");
        config.outputs.port_protocol_counts = dir.join("port_protocols_counts.csv");

        fs::write(
            &config.inputs.protocol_numbers,
            "Decimal,Keyword,Protocol\n6,TCP,Transmission Control\n17,UDP,User Datagram\n",
        )
        .unwrap();
        fs::write(
            &config.inputs.lookup_table,
            "dstport,protocol,tag\n443,tcp,sv_P2\n23,tcp,sv_P1\n",
        )
        .unwrap();
        fs::write(
            &config.inputs.flow_logs,
            "2 123456789012 eni-0a1b2c3d 10.0.1.201 198.51.100.2 49153 443 6 25 20000 1620140761 1620140821 ACCEPT OK\n\
             2 123456789012 eni-4d3c2b1a 192.168.1.100 203.0.113.101 49154 23 6 15 12000 1620140761 1620140821 REJECT OK\n\
             2 123456789012 eni-5e6f7g8h 192.168.1.101 198.51.100.3 49155 443 6 10 8000 1620140761 1620140821 ACCEPT OK\n",
        )
        .unwrap();

        config
    }

    fn read_lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_run_classify_end_to_end() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = write_inputs(dir.path());
        config.outputs.combined = Some(dir.path().join("output.txt"));

        run_classify(&config, true).unwrap();

        assert_eq!(
            read_lines(&config.outputs.tag_counts),
            vec!["Tag,Count", "sv_P2,2", "sv_P1,1"]
        );
        assert_eq!(
            read_lines(&config.outputs.port_protocol_counts),
            vec!["Port,Protocol,Count", "443,tcp,2", "23,tcp,1"]
        );
        assert_eq!(
            read_lines(&dir.path().join("output.txt")),
            vec![
                "Tag,Count",
                "sv_P2,2",
                "sv_P1,1",
                "Port,Protocol,Count",
                "443,tcp,2",
                "23,tcp,1",
            ]
        );
    }

    #[test]
    fn test_rerun_produces_identical_reports() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = write_inputs(dir.path());

        run_classify(&config, true).unwrap();
        let first = fs::read(&config.outputs.port_protocol_counts).unwrap();
        run_classify(&config, true).unwrap();
        let second = fs::read(&config.outputs.port_protocol_counts).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_flow_log_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = write_inputs(dir.path());
        config.inputs.flow_logs = dir.path().join("absent.txt");

        let err = run_classify(&config, true).unwrap_err();
        assert!(format!("{:#}", err).contains("absent.txt"));
        assert!(matches!(
            err.downcast_ref::<error::ClassifyError>(),
            Some(error::ClassifyError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_generate_then_classify() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = write_inputs(dir.path());
        config.generator.flow_log_entries = 300;
        config.generator.lookup_entries = 40;
        config.generator.seed = Some(11);

        run_generate(&config).unwrap();
        assert_eq!(read_lines(&config.inputs.flow_logs).len(), 300);
        assert_eq!(read_lines(&config.inputs.lookup_table).len(), 41);

        config.classifier.strict = true;
        run_classify(&config, true).unwrap();

        let tag_total: u64 = read_lines(&config.outputs.tag_counts)
            .iter()
            .skip(1)
            .map(|line| line.rsplit(',').next().unwrap().parse::<u64>().unwrap())
            .sum();
        assert_eq!(tag_total, 300);
    }
}
