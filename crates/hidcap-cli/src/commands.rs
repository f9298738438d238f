//! Command implementations behind the `hidcap` subcommands.
//!
//! Each function does the work and returns a value for `main.rs` to print,
//! so the same paths are exercised by the integration tests.

use std::path::Path;

use anyhow::Context;
use hidcap_core::capture::{read_capture_file, write_capture_file};
use hidcap_core::{
    CaptureReader, CaptureTimestamp, CaptureWriter, EncodeSummary, Keystroke, MarkerScanner,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::AppConfig;

/// Everything `hidcap decode` learns from a capture.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodeReport {
    /// Complete records found in the file.
    pub records: usize,
    pub keystrokes: Vec<Keystroke>,
    pub text: String,
    pub markers: Vec<String>,
    /// Indices of records preceded by an unusually long gap.
    pub timing_anomalies: Vec<usize>,
}

fn marker_scanner(config: &AppConfig) -> anyhow::Result<MarkerScanner> {
    MarkerScanner::new(&config.scan.marker_prefixes).with_context(|| {
        format!(
            "failed to build marker pattern from prefixes {:?}",
            config.scan.marker_prefixes
        )
    })
}

/// Encodes `text` and writes the capture to `output`.
///
/// `start` overrides `encode.start_micros`; with neither set the current time
/// is used.
///
/// # Errors
///
/// Returns an error if the capture cannot be written.
pub fn run_encode(
    text: &str,
    output: &Path,
    config: &AppConfig,
    start: Option<CaptureTimestamp>,
) -> anyhow::Result<EncodeSummary> {
    let start = start
        .or_else(|| config.encode.start_micros.map(CaptureTimestamp::from_micros))
        .unwrap_or_else(CaptureTimestamp::now);

    let writer = CaptureWriter::new(config.encode.timing_profile());
    let (capture, summary) = writer.encode_with_summary(text, start);

    write_capture_file(output, &capture)
        .with_context(|| format!("failed to write capture to {}", output.display()))?;

    if summary.dropped > 0 {
        warn!(
            "{} of {} characters have no key and were left out",
            summary.dropped, summary.characters
        );
    }
    info!(
        "wrote {} records ({} bytes) to {}",
        summary.records,
        capture.byte_len(),
        output.display()
    );
    Ok(summary)
}

/// Reads the capture at `input` and recovers its text, markers and timing gaps.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not a pcap capture, or
/// the configured marker prefixes do not compile.
pub fn run_decode(input: &Path, config: &AppConfig) -> anyhow::Result<DecodeReport> {
    let bytes = read_capture_file(input)
        .with_context(|| format!("failed to read capture from {}", input.display()))?;
    let reader = CaptureReader::new(&bytes)
        .with_context(|| format!("{} is not a keyboard capture", input.display()))?;

    if let Some(header) = reader.header() {
        debug!(
            "pcap v{}.{} linktype {} snaplen {}",
            header.version_major, header.version_minor, header.linktype, header.snaplen
        );
    }

    let records = reader.records().count();
    let keystrokes: Vec<Keystroke> = reader.keystrokes().collect();
    let mut text = String::new();
    for keystroke in &keystrokes {
        keystroke.symbol.push_to(&mut text);
    }

    let markers = marker_scanner(config)?
        .find_markers(&text)
        .into_iter()
        .map(str::to_string)
        .collect();
    let timing_anomalies = reader.timing_anomalies(config.scan.anomaly_threshold_us);

    info!(
        "decoded {} keystrokes from {} records in {}",
        keystrokes.len(),
        records,
        input.display()
    );
    Ok(DecodeReport {
        records,
        keystrokes,
        text,
        markers,
        timing_anomalies,
    })
}

/// Scans plain text for markers.
///
/// # Errors
///
/// Returns an error if the configured marker prefixes do not compile.
pub fn run_scan(text: &str, config: &AppConfig) -> anyhow::Result<Vec<String>> {
    Ok(marker_scanner(config)?
        .find_markers(text)
        .into_iter()
        .map(str::to_string)
        .collect())
}
