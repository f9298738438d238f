//! Capture → text decoder.
//!
//! The reader is a best-effort reconstruction, not a validator.  Only a bad
//! magic number is an error.  After that:
//!
//! - a trailing record cut short (header or payload) ends the stream quietly;
//! - records too short to hold a URB envelope are skipped;
//! - release frames (key slot 0) are skipped;
//! - keys the keymap does not know are skipped.
//!
//! Record lengths are not checked against each other or against the
//! snapshot length; an oversized `captured_len` simply runs past the end of
//! the data and is handled as truncation.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, trace};

use crate::capture::error::CaptureError;
use crate::capture::frame::{unwrap_urb, ModifierFlags};
use crate::capture::pcap::{
    CaptureTimestamp, GlobalHeader, RecordHeader, GLOBAL_HEADER_SIZE, PCAP_MAGIC,
    RECORD_HEADER_SIZE,
};
use crate::keymap::{KeyMap, KeySymbol};

/// One complete record as found in the byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawRecord<'a> {
    /// 0-based position in the capture.
    pub index: usize,
    pub header: RecordHeader,
    /// Exactly `header.captured_len` bytes.
    pub payload: &'a [u8],
}

/// A key press recovered from the capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Keystroke {
    /// Index of the record the press came from.
    pub index: usize,
    pub timestamp: CaptureTimestamp,
    pub scan_code: u8,
    pub modifier: ModifierFlags,
    pub symbol: KeySymbol,
}

/// Parses a capture held in memory.
#[derive(Debug, Clone, Copy)]
pub struct CaptureReader<'a> {
    header: Option<GlobalHeader>,
    body: &'a [u8],
}

impl<'a> CaptureReader<'a> {
    /// Validates the magic number and positions the reader on the first record.
    ///
    /// A stream with a correct magic but a short global header is accepted
    /// and yields no records.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::InvalidMagic`] if the first four bytes are not
    /// `0xA1B2C3D4` in little-endian order (or there are fewer than four).
    pub fn new(bytes: &'a [u8]) -> Result<Self, CaptureError> {
        let magic_ok = bytes.len() >= 4
            && u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) == PCAP_MAGIC;
        if !magic_ok {
            return Err(CaptureError::InvalidMagic {
                found: bytes[..bytes.len().min(4)].to_vec(),
            });
        }

        Ok(Self {
            header: GlobalHeader::from_bytes(bytes),
            body: bytes.get(GLOBAL_HEADER_SIZE..).unwrap_or(&[]),
        })
    }

    /// The global header, if all 24 bytes were present.
    pub fn header(&self) -> Option<&GlobalHeader> {
        self.header.as_ref()
    }

    /// Iterates over every complete record, in file order.
    pub fn records(&self) -> Records<'a> {
        Records {
            rest: self.body,
            index: 0,
        }
    }

    /// Iterates over the key presses that resolve through the keymap.
    pub fn keystrokes(&self) -> impl Iterator<Item = Keystroke> + 'a {
        self.records().filter_map(|record| {
            let report = match unwrap_urb(record.payload) {
                Ok(report) => report,
                Err(e) => {
                    trace!(index = record.index, "skipping record: {e}");
                    return None;
                }
            };
            if report.is_release() {
                return None;
            }
            let scan_code = report.scan_code();
            match KeyMap::char_for(scan_code, report.modifier.left_shift()) {
                Ok(symbol) => Some(Keystroke {
                    index: record.index,
                    timestamp: record.header.timestamp,
                    scan_code,
                    modifier: report.modifier,
                    symbol,
                }),
                Err(e) => {
                    trace!(index = record.index, "skipping record: {e}");
                    None
                }
            }
        })
    }

    /// Concatenates every recovered keystroke into text.
    pub fn decode(&self) -> String {
        let mut text = String::new();
        for keystroke in self.keystrokes() {
            keystroke.symbol.push_to(&mut text);
        }
        text
    }

    /// Returns the indices of records that follow their predecessor by more
    /// than `threshold_us` microseconds.
    ///
    /// The first record has no predecessor and is never reported.
    pub fn timing_anomalies(&self, threshold_us: u64) -> Vec<usize> {
        let mut anomalies = Vec::new();
        let mut previous: Option<u64> = None;
        for record in self.records() {
            let now = record.header.timestamp.as_micros();
            if let Some(prev) = previous {
                if now.saturating_sub(prev) > threshold_us {
                    anomalies.push(record.index);
                }
            }
            previous = Some(now);
        }
        anomalies
    }
}

/// Iterator returned by [`CaptureReader::records`].
#[derive(Debug, Clone)]
pub struct Records<'a> {
    rest: &'a [u8],
    index: usize,
}

impl<'a> Iterator for Records<'a> {
    type Item = RawRecord<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }

        let Some(header) = RecordHeader::from_bytes(self.rest) else {
            debug!(
                index = self.index,
                remaining = self.rest.len(),
                "partial record header at end of capture"
            );
            self.rest = &[];
            return None;
        };

        let body = &self.rest[RECORD_HEADER_SIZE..];
        let captured_len = header.captured_len as usize;
        if body.len() < captured_len {
            debug!(
                index = self.index,
                captured_len,
                remaining = body.len(),
                "partial record payload at end of capture"
            );
            self.rest = &[];
            return None;
        }

        let record = RawRecord {
            index: self.index,
            header,
            payload: &body[..captured_len],
        };
        self.rest = &body[captured_len..];
        self.index += 1;
        Some(record)
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Decodes a whole capture held in memory back into text.
///
/// # Errors
///
/// Returns [`CaptureError::InvalidMagic`] if `bytes` is not a little-endian,
/// microsecond pcap stream.  Nothing else is an error.
pub fn decode_capture(bytes: &[u8]) -> Result<String, CaptureError> {
    Ok(CaptureReader::new(bytes)?.decode())
}

/// Reads a capture file fully into memory.
///
/// # Errors
///
/// Returns [`CaptureError::Io`] if the file cannot be read.
pub fn read_capture_file(path: impl AsRef<Path>) -> Result<Vec<u8>, CaptureError> {
    Ok(std::fs::read(path.as_ref())?)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::frame::{encode_report, wrap_in_urb};
    use crate::capture::pcap::{CaptureFile, CaptureRecord};
    use crate::capture::writer::encode_text;

    fn start() -> CaptureTimestamp {
        CaptureTimestamp::from_micros(1_000_000)
    }

    /// Builds a capture whose press frames carry the given raw scan codes.
    fn capture_with_codes(codes: &[(u8, u8)]) -> Vec<u8> {
        let records = codes
            .iter()
            .enumerate()
            .map(|(i, &(modifier, code))| CaptureRecord {
                timestamp: CaptureTimestamp::from_micros(i as u64),
                envelope: wrap_in_urb(i as u64, encode_report(ModifierFlags(modifier), code)),
            })
            .collect();
        CaptureFile {
            records,
            ..CaptureFile::default()
        }
        .to_bytes()
    }

    #[test]
    fn test_decode_round_trips_mixed_shift_text() {
        let bytes = encode_text("Ab1!", start()).to_bytes();
        assert_eq!(decode_capture(&bytes).expect("decode"), "Ab1!");
    }

    #[test]
    fn test_decode_rejects_wrong_magic() {
        let mut bytes = encode_text("abc", start()).to_bytes();
        bytes[0..4].copy_from_slice(&0xD4C3_B2A1u32.to_le_bytes());
        let result = decode_capture(&bytes);
        assert!(matches!(
            result,
            Err(CaptureError::InvalidMagic { ref found }) if found == &vec![0xA1u8, 0xB2, 0xC3, 0xD4]
        ));
    }

    #[test]
    fn test_decode_rejects_empty_and_short_input() {
        assert!(matches!(
            decode_capture(&[]),
            Err(CaptureError::InvalidMagic { ref found }) if found.is_empty()
        ));
        assert!(matches!(
            decode_capture(&[0xD4, 0xC3]),
            Err(CaptureError::InvalidMagic { .. })
        ));
    }

    #[test]
    fn test_magic_with_short_global_header_yields_empty_text() {
        let text = decode_capture(&[0xD4, 0xC3, 0xB2, 0xA1, 0x02, 0x00]).expect("decode");
        assert_eq!(text, "");
    }

    #[test]
    fn test_header_only_capture_decodes_to_empty_text() {
        let bytes = CaptureFile::default().to_bytes();
        let reader = CaptureReader::new(&bytes).expect("reader");
        assert_eq!(reader.records().count(), 0);
        assert_eq!(reader.decode(), "");
        assert_eq!(reader.header(), Some(&GlobalHeader::default()));
    }

    #[test]
    fn test_truncated_payload_stops_before_partial_record() {
        // "abc" → 6 records; cut the final release record in half.
        let bytes = encode_text("abc", start()).to_bytes();
        let cut = &bytes[..bytes.len() - 40];
        let reader = CaptureReader::new(cut).expect("reader");
        assert_eq!(reader.records().count(), 5);
        assert_eq!(reader.decode(), "abc");
    }

    #[test]
    fn test_truncated_record_header_stops_cleanly() {
        // Keep the first press and release, plus 10 bytes of the next header.
        let bytes = encode_text("ab", start()).to_bytes();
        let cut = &bytes[..24 + 2 * 88 + 10];
        assert_eq!(decode_capture(cut).expect("decode"), "a");
    }

    #[test]
    fn test_oversized_captured_len_is_treated_as_end_of_stream() {
        let mut bytes = encode_text("ab", start()).to_bytes();
        // Second record header: captured_len at offset 24 + 88 + 8.
        let off = 24 + 88 + 8;
        bytes[off..off + 4].copy_from_slice(&u32::MAX.to_le_bytes());
        assert_eq!(decode_capture(&bytes).expect("decode"), "a");
    }

    #[test]
    fn test_short_records_are_skipped_not_fatal() {
        // Arrange: a 4-byte record between two real ones.
        let full = encode_text("ab", start()).to_bytes();
        let mut bytes = full[..24 + 88].to_vec();
        bytes.extend_from_slice(
            &RecordHeader {
                timestamp: start(),
                captured_len: 4,
                original_len: 4,
            }
            .to_bytes(),
        );
        bytes.extend_from_slice(&[1, 2, 3, 4]);
        bytes.extend_from_slice(&full[24 + 88..]);

        // Act
        let reader = CaptureReader::new(&bytes).expect("reader");

        // Assert
        assert_eq!(reader.records().count(), 5);
        assert_eq!(reader.decode(), "ab");
    }

    #[test]
    fn test_unknown_scan_codes_are_dropped() {
        // 0x29 is Escape and has no typing entry; 0xFF is unassigned.
        let bytes = capture_with_codes(&[(0, 0x04), (0, 0x29), (0, 0xFF), (0, 0x05)]);
        assert_eq!(decode_capture(&bytes).expect("decode"), "ab");
    }

    #[test]
    fn test_only_left_shift_bit_selects_shifted_slot() {
        let bytes = capture_with_codes(&[(0x02, 0x04), (0x20, 0x04), (0x22, 0x1E)]);
        assert_eq!(decode_capture(&bytes).expect("decode"), "Aa!");
    }

    #[test]
    fn test_caps_lock_press_decodes_as_caps_text() {
        let bytes = capture_with_codes(&[(0, 0x39), (0, 0x04)]);
        assert_eq!(decode_capture(&bytes).expect("decode"), "CAPSa");
    }

    #[test]
    fn test_keystrokes_carry_record_index_and_timestamp() {
        let bytes = encode_text("Hi", start()).to_bytes();
        let reader = CaptureReader::new(&bytes).expect("reader");
        let strokes: Vec<Keystroke> = reader.keystrokes().collect();

        assert_eq!(strokes.len(), 2);
        assert_eq!(strokes[0].index, 0);
        assert_eq!(strokes[0].symbol, KeySymbol::Char('H'));
        assert!(strokes[0].modifier.left_shift());
        assert_eq!(strokes[1].index, 2);
        assert_eq!(strokes[1].scan_code, 0x0C);
        assert!(strokes[0].timestamp < strokes[1].timestamp);
    }

    #[test]
    fn test_timing_anomalies_find_injected_jumps() {
        // 25 characters → 50 records; jumps before records 20 and 40.
        let bytes = encode_text(&"k".repeat(25), start()).to_bytes();
        let reader = CaptureReader::new(&bytes).expect("reader");
        assert_eq!(reader.timing_anomalies(10_000), vec![20, 40]);
        assert!(reader.timing_anomalies(60_000).is_empty());
    }

    #[test]
    fn test_read_capture_file_reports_missing_file() {
        let path = std::env::temp_dir().join("hidcap-reader-test-does-not-exist.pcap");
        assert!(matches!(read_capture_file(&path), Err(CaptureError::Io(_))));
    }
}
