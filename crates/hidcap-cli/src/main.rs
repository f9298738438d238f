//! `hidcap` — turn text into a USB keyboard capture and back.
//!
//! # Usage
//!
//! ```text
//! hidcap [--config <PATH>] encode (--text <TEXT> | --input <FILE>) --output <PCAP> [--start-micros <US>]
//! hidcap [--config <PATH>] decode <PCAP> [--json] [--prefix <P>]...
//! hidcap [--config <PATH>] scan <TEXTFILE> [--prefix <P>]...
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable         | Description                                   |
//! |------------------|-----------------------------------------------|
//! | `HIDCAP_CONFIG`  | Path of the TOML config file                  |
//! | `RUST_LOG`       | Log filter; overrides `log_level` from config |
//!
//! Logs go to stderr.  Stdout carries only command output.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use hidcap_cli::commands::{run_decode, run_encode, run_scan};
use hidcap_cli::config::{load_config, AppConfig, ConfigError};
use hidcap_core::CaptureTimestamp;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// USB keyboard capture encoder/decoder.
#[derive(Debug, Parser)]
#[command(
    name = "hidcap",
    about = "Encode text as USB HID keyboard traffic in a pcap file, and decode it back",
    version
)]
struct Cli {
    /// TOML configuration file.  Defaults to ./hidcap.toml when present.
    #[arg(long, global = true, env = "HIDCAP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Type text into a new capture file.
    Encode {
        /// Text to encode.
        #[arg(long, conflicts_with = "input", required_unless_present = "input")]
        text: Option<String>,

        /// File whose contents are encoded.
        #[arg(long)]
        input: Option<PathBuf>,

        /// Capture file to create.
        #[arg(long, short)]
        output: PathBuf,

        /// Start time in microseconds since the Unix epoch.
        #[arg(long)]
        start_micros: Option<u64>,
    },

    /// Recover the typed text from a capture file.
    Decode {
        /// Capture file to read.
        input: PathBuf,

        /// Print a JSON report instead of plain text.
        #[arg(long)]
        json: bool,

        /// Marker prefix to search for (repeatable).  Replaces the configured list.
        #[arg(long = "prefix")]
        prefixes: Vec<String>,
    },

    /// Search a plain text file for markers.
    Scan {
        /// Text file to scan.
        input: PathBuf,

        /// Marker prefix to search for (repeatable).  Replaces the configured list.
        #[arg(long = "prefix")]
        prefixes: Vec<String>,
    },
}

/// Replaces the configured marker prefixes with those given on the command
/// line, then re-checks the result.
fn override_prefixes(config: &mut AppConfig, prefixes: Vec<String>) -> Result<(), ConfigError> {
    if !prefixes.is_empty() {
        config.scan.marker_prefixes = prefixes;
    }
    config.validate()
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref()).context("failed to load configuration")?;

    // `RUST_LOG` wins; otherwise the configured level applies.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Encode {
            text,
            input,
            output,
            start_micros,
        } => {
            let text = match (text, input) {
                (Some(text), _) => text,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read text from {}", path.display()))?,
                (None, None) => anyhow::bail!("either --text or --input is required"),
            };
            let summary = run_encode(
                &text,
                &output,
                &config,
                start_micros.map(CaptureTimestamp::from_micros),
            )?;
            println!("records:  {}", summary.records);
            println!("encoded:  {}", summary.encoded);
            println!("dropped:  {}", summary.dropped);
        }

        Command::Decode {
            input,
            json,
            prefixes,
        } => {
            override_prefixes(&mut config, prefixes).context("invalid --prefix")?;
            let report = run_decode(&input, &config)?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&report).context("failed to serialize report")?
                );
            } else {
                println!("records: {}", report.records);
                println!("{}", report.text);
                for marker in &report.markers {
                    println!("marker: {marker}");
                }
                if !report.timing_anomalies.is_empty() {
                    println!("timing anomalies at records: {:?}", report.timing_anomalies);
                }
            }
        }

        Command::Scan { input, prefixes } => {
            override_prefixes(&mut config, prefixes).context("invalid --prefix")?;
            let text = std::fs::read_to_string(&input)
                .with_context(|| format!("failed to read text from {}", input.display()))?;
            for marker in run_scan(&text, &config)? {
                println!("{marker}");
            }
        }
    }

    info!("done");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_encode_requires_text_or_input() {
        let result = Cli::try_parse_from(["hidcap", "encode", "--output", "out.pcap"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_encode_rejects_both_text_and_input() {
        let result = Cli::try_parse_from([
            "hidcap", "encode", "--text", "a", "--input", "a.txt", "--output", "out.pcap",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_collects_repeated_prefixes() {
        let cli = Cli::try_parse_from([
            "hidcap", "decode", "cap.pcap", "--json", "--prefix", "TAG", "--prefix", "KEY",
        ])
        .expect("parse");
        match cli.command {
            Command::Decode { json, prefixes, .. } => {
                assert!(json);
                assert_eq!(prefixes, vec!["TAG", "KEY"]);
            }
            other => panic!("expected decode, got {other:?}"),
        }
    }

    #[test]
    fn test_override_prefixes_keeps_config_when_none_given() {
        let mut config = AppConfig::default();
        override_prefixes(&mut config, Vec::new()).expect("defaults are valid");
        assert_eq!(config.scan.marker_prefixes, vec!["CTF", "flag"]);
        override_prefixes(&mut config, vec!["TAG".to_string()]).expect("TAG is valid");
        assert_eq!(config.scan.marker_prefixes, vec!["TAG"]);
    }

    #[test]
    fn test_override_prefixes_rejects_blank_prefix() {
        let mut config = AppConfig::default();
        let result = override_prefixes(&mut config, vec!["CTF".to_string(), " ".to_string()]);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_blank_prefix_flag_parses_but_fails_validation() {
        let cli = Cli::try_parse_from(["hidcap", "scan", "notes.txt", "--prefix", " "])
            .expect("parse");
        let Command::Scan { prefixes, .. } = cli.command else {
            panic!("expected scan");
        };
        let mut config = AppConfig::default();
        assert!(override_prefixes(&mut config, prefixes).is_err());
    }
}
