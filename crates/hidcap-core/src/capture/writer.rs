//! Text → capture encoder.
//!
//! Every typeable character becomes two records: a press report carrying its
//! key (with left Shift when the shifted slot was used) and an all-zero
//! release report.  Characters the keymap cannot type are dropped.
//!
//! Record timestamps advance from the start time by a fixed step before each
//! record.  Every `anomaly_interval`-th record (by 0-based index, so record 0
//! included) gets an extra jump on top, which shows up as a gap in timing
//! views of the capture.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::capture::error::CaptureError;
use crate::capture::frame::{
    encode_release, encode_report, wrap_in_urb, HidReport, ModifierFlags,
};
use crate::capture::pcap::{CaptureFile, CaptureRecord, CaptureTimestamp, GlobalHeader};
use crate::capture::sequence::SequenceCounter;
use crate::keymap::KeyMap;

/// Timing policy for record timestamps, in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingProfile {
    /// Added before every record.
    pub base_increment_us: u64,
    /// Records whose index is a multiple of this get the extra jump.
    /// 0 disables the jump.
    pub anomaly_interval: u64,
    /// Extra delay added before anomalous records.
    pub anomaly_increment_us: u64,
}

impl Default for TimingProfile {
    /// 10 ms per record, plus 50 ms before every 20th record.
    fn default() -> Self {
        Self {
            base_increment_us: 10_000,
            anomaly_interval: 20,
            anomaly_increment_us: 50_000,
        }
    }
}

impl TimingProfile {
    /// Delay between the previous record (or the start time) and record `index`.
    pub fn delay_before(&self, index: u64) -> u64 {
        if self.is_anomalous(index) {
            self.base_increment_us + self.anomaly_increment_us
        } else {
            self.base_increment_us
        }
    }

    pub fn is_anomalous(&self, index: u64) -> bool {
        self.anomaly_interval != 0 && index % self.anomaly_interval == 0
    }
}

/// Counts reported alongside an encoded capture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeSummary {
    /// Characters in the input text.
    pub characters: usize,
    /// Characters that were typed into the capture.
    pub encoded: usize,
    /// Characters dropped because no key types them.
    pub dropped: usize,
    /// Records written (always `2 * encoded`).
    pub records: usize,
}

/// Builds captures from text.
#[derive(Debug, Clone, Default)]
pub struct CaptureWriter {
    timing: TimingProfile,
}

impl CaptureWriter {
    pub fn new(timing: TimingProfile) -> Self {
        Self { timing }
    }

    pub fn timing(&self) -> &TimingProfile {
        &self.timing
    }

    /// Encodes `text` as keystrokes starting at `start`.
    ///
    /// Never fails: characters without a key are skipped.
    pub fn encode(&self, text: &str, start: CaptureTimestamp) -> CaptureFile {
        self.encode_with_summary(text, start).0
    }

    /// Like [`CaptureWriter::encode`], also returning what was kept and dropped.
    pub fn encode_with_summary(
        &self,
        text: &str,
        start: CaptureTimestamp,
    ) -> (CaptureFile, EncodeSummary) {
        let mut summary = EncodeSummary::default();
        let mut reports: Vec<HidReport> = Vec::with_capacity(text.len() * 2);

        for c in text.chars() {
            summary.characters += 1;
            match KeyMap::scan_code_for(c) {
                Ok((code, shifted)) => {
                    reports.push(encode_report(ModifierFlags::shift_if(shifted), code.as_u8()));
                    reports.push(encode_release());
                    summary.encoded += 1;
                }
                Err(e) => {
                    debug!("dropping character during encode: {e}");
                    summary.dropped += 1;
                }
            }
        }

        let records = self.stamp(reports, start);
        summary.records = records.len();

        let file = CaptureFile {
            header: GlobalHeader::default(),
            records,
        };
        (file, summary)
    }

    /// Assigns URB ids and timestamps to `reports` in order.
    fn stamp(&self, reports: Vec<HidReport>, start: CaptureTimestamp) -> Vec<CaptureRecord> {
        let mut urb_ids = SequenceCounter::new();
        let mut elapsed = start.as_micros();

        reports
            .into_iter()
            .enumerate()
            .map(|(index, report)| {
                elapsed = elapsed.saturating_add(self.timing.delay_before(index as u64));
                CaptureRecord {
                    timestamp: CaptureTimestamp::from_micros(elapsed),
                    envelope: wrap_in_urb(urb_ids.next(), report),
                }
            })
            .collect()
    }
}

/// Encodes `text` with the default timing profile.
///
/// # Examples
///
/// ```rust
/// use hidcap_core::{decode_capture, encode_text, CaptureTimestamp};
///
/// let capture = encode_text("Hi!", CaptureTimestamp::from_micros(0));
/// assert_eq!(capture.records.len(), 6);
/// assert_eq!(decode_capture(&capture.to_bytes()).unwrap(), "Hi!");
/// ```
pub fn encode_text(text: &str, start: CaptureTimestamp) -> CaptureFile {
    CaptureWriter::default().encode(text, start)
}

/// Writes `capture` to `path`, replacing any existing file.
///
/// # Errors
///
/// Returns [`CaptureError::Io`] if the file cannot be created or written.
pub fn write_capture_file(
    path: impl AsRef<Path>,
    capture: &CaptureFile,
) -> Result<(), CaptureError> {
    let file = File::create(path.as_ref())?;
    let mut sink = BufWriter::new(file);
    capture.write_to(&mut sink)?;
    sink.flush()?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
