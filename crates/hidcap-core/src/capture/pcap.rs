//! Classic pcap container: global header, per-record header, record list.
//!
//! File layout (all integers little-endian):
//! ```text
//! global header (24):  magic:u32 | ver_major:u16 | ver_minor:u16 | tz_offset:i32
//!                      | ts_accuracy:u32 | snaplen:u32 | linktype:u32
//! record header (16):  ts_sec:u32 | ts_usec:u32 | captured_len:u32 | original_len:u32
//! record payload:      captured_len bytes (a URB envelope, see `frame`)
//! ```

use std::io::{self, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::capture::frame::{read_u16_le, read_u32_le, UrbEnvelope, URB_ENVELOPE_SIZE};

/// Microsecond-resolution, little-endian pcap magic.
pub const PCAP_MAGIC: u32 = 0xA1B2_C3D4;
pub const VERSION_MAJOR: u16 = 2;
pub const VERSION_MINOR: u16 = 4;
pub const DEFAULT_SNAPLEN: u32 = 65_535;
/// `LINKTYPE_USB_LINUX`.
pub const LINKTYPE_USB_LINUX: u32 = 189;

pub const GLOBAL_HEADER_SIZE: usize = 24;
pub const RECORD_HEADER_SIZE: usize = 16;

const MICROS_PER_SEC: u64 = 1_000_000;

/// A record timestamp split the way pcap stores it.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct CaptureTimestamp {
    pub secs: u32,
    pub micros: u32,
}

impl CaptureTimestamp {
    /// The latest instant a pcap record header can hold.
    pub const MAX: Self = Self {
        secs: u32::MAX,
        micros: 999_999,
    };

    /// Splits a microsecond count since the Unix epoch.
    ///
    /// Counts past the last representable instant saturate to
    /// [`CaptureTimestamp::MAX`], so the mapping never decreases.
    pub fn from_micros(total: u64) -> Self {
        match u32::try_from(total / MICROS_PER_SEC) {
            Ok(secs) => Self {
                secs,
                micros: (total % MICROS_PER_SEC) as u32,
            },
            Err(_) => Self::MAX,
        }
    }

    pub fn as_micros(&self) -> u64 {
        u64::from(self.secs) * MICROS_PER_SEC + u64::from(self.micros)
    }

    /// The current wall-clock time.
    pub fn now() -> Self {
        Self::from(SystemTime::now())
    }
}

impl From<SystemTime> for CaptureTimestamp {
    fn from(t: SystemTime) -> Self {
        let micros = t
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_micros() as u64;
        Self::from_micros(micros)
    }
}

/// The 24-byte file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalHeader {
    pub magic: u32,
    pub version_major: u16,
    pub version_minor: u16,
    pub tz_offset: i32,
    pub ts_accuracy: u32,
    pub snaplen: u32,
    pub linktype: u32,
}

impl Default for GlobalHeader {
    fn default() -> Self {
        Self {
            magic: PCAP_MAGIC,
            version_major: VERSION_MAJOR,
            version_minor: VERSION_MINOR,
            tz_offset: 0,
            ts_accuracy: 0,
            snaplen: DEFAULT_SNAPLEN,
            linktype: LINKTYPE_USB_LINUX,
        }
    }
}

impl GlobalHeader {
    pub fn to_bytes(&self) -> [u8; GLOBAL_HEADER_SIZE] {
        let mut buf = [0u8; GLOBAL_HEADER_SIZE];
        buf[0..4].copy_from_slice(&self.magic.to_le_bytes());
        buf[4..6].copy_from_slice(&self.version_major.to_le_bytes());
        buf[6..8].copy_from_slice(&self.version_minor.to_le_bytes());
        buf[8..12].copy_from_slice(&self.tz_offset.to_le_bytes());
        buf[12..16].copy_from_slice(&self.ts_accuracy.to_le_bytes());
        buf[16..20].copy_from_slice(&self.snaplen.to_le_bytes());
        buf[20..24].copy_from_slice(&self.linktype.to_le_bytes());
        buf
    }

    /// Parses a header from the first 24 bytes of `bytes`.
    ///
    /// Returns `None` if fewer than 24 bytes are available.  The magic is not
    /// checked here.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < GLOBAL_HEADER_SIZE {
            return None;
        }
        Some(Self {
            magic: read_u32_le(bytes, 0),
            version_major: read_u16_le(bytes, 4),
            version_minor: read_u16_le(bytes, 6),
            tz_offset: read_u32_le(bytes, 8) as i32,
            ts_accuracy: read_u32_le(bytes, 12),
            snaplen: read_u32_le(bytes, 16),
            linktype: read_u32_le(bytes, 20),
        })
    }
}

/// The 16-byte header in front of every record payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub timestamp: CaptureTimestamp,
    pub captured_len: u32,
    pub original_len: u32,
}

impl RecordHeader {
    pub fn to_bytes(&self) -> [u8; RECORD_HEADER_SIZE] {
        let mut buf = [0u8; RECORD_HEADER_SIZE];
        buf[0..4].copy_from_slice(&self.timestamp.secs.to_le_bytes());
        buf[4..8].copy_from_slice(&self.timestamp.micros.to_le_bytes());
        buf[8..12].copy_from_slice(&self.captured_len.to_le_bytes());
        buf[12..16].copy_from_slice(&self.original_len.to_le_bytes());
        buf
    }

    /// Parses a header from the first 16 bytes of `bytes`, or `None` if
    /// fewer are available.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < RECORD_HEADER_SIZE {
            return None;
        }
        Some(Self {
            timestamp: CaptureTimestamp {
                secs: read_u32_le(bytes, 0),
                micros: read_u32_le(bytes, 4),
            },
            captured_len: read_u32_le(bytes, 8),
            original_len: read_u32_le(bytes, 12),
        })
    }
}

/// One timestamped URB envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureRecord {
    pub timestamp: CaptureTimestamp,
    pub envelope: UrbEnvelope,
}

impl CaptureRecord {
    /// The record header, with both lengths equal to the envelope size.
    pub fn header(&self) -> RecordHeader {
        RecordHeader {
            timestamp: self.timestamp,
            captured_len: URB_ENVELOPE_SIZE as u32,
            original_len: URB_ENVELOPE_SIZE as u32,
        }
    }
}

/// A complete in-memory capture.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureFile {
    pub header: GlobalHeader,
    pub records: Vec<CaptureRecord>,
}

impl CaptureFile {
    /// Total serialized size in bytes.
    pub fn byte_len(&self) -> usize {
        GLOBAL_HEADER_SIZE + self.records.len() * (RECORD_HEADER_SIZE + URB_ENVELOPE_SIZE)
    }

    /// Serializes the global header followed by every record, in order.
    ///
    /// # Errors
    ///
    /// Propagates any error from `sink`.
    pub fn write_to<W: Write>(&self, sink: &mut W) -> io::Result<()> {
        sink.write_all(&self.header.to_bytes())?;
        for record in &self.records {
            sink.write_all(&record.header().to_bytes())?;
            sink.write_all(&record.envelope.to_bytes())?;
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.byte_len());
        buf.extend_from_slice(&self.header.to_bytes());
        for record in &self.records {
            buf.extend_from_slice(&record.header().to_bytes());
            buf.extend_from_slice(&record.envelope.to_bytes());
        }
        buf
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::frame::{encode_release, wrap_in_urb};

    #[test]
    fn test_global_header_bytes_match_pcap_layout() {
        let bytes = GlobalHeader::default().to_bytes();
        assert_eq!(
            bytes,
            [
                0xD4, 0xC3, 0xB2, 0xA1, // magic
                0x02, 0x00, 0x04, 0x00, // version 2.4
                0, 0, 0, 0, // tz offset
                0, 0, 0, 0, // accuracy
                0xFF, 0xFF, 0x00, 0x00, // snaplen 65535
                0xBD, 0x00, 0x00, 0x00, // linktype 189
            ]
        );
    }

    #[test]
    fn test_global_header_parses_back() {
        let header = GlobalHeader::default();
        assert_eq!(GlobalHeader::from_bytes(&header.to_bytes()), Some(header));
        assert_eq!(GlobalHeader::from_bytes(&[0xD4, 0xC3, 0xB2, 0xA1]), None);
    }

    #[test]
    fn test_record_header_layout() {
        let header = RecordHeader {
            timestamp: CaptureTimestamp {
                secs: 0x0102_0304,
                micros: 999_999,
            },
            captured_len: 72,
            original_len: 72,
        };
        let bytes = header.to_bytes();
        assert_eq!(&bytes[0..4], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), 999_999);
        assert_eq!(u32::from_le_bytes(bytes[8..12].try_into().unwrap()), 72);
        assert_eq!(u32::from_le_bytes(bytes[12..16].try_into().unwrap()), 72);
        assert_eq!(RecordHeader::from_bytes(&bytes), Some(header));
        assert_eq!(RecordHeader::from_bytes(&bytes[..15]), None);
    }

    #[test]
    fn test_timestamp_splits_and_joins_micros() {
        let ts = CaptureTimestamp::from_micros(1_700_000_000_123_456);
        assert_eq!(ts.secs, 1_700_000_000);
        assert_eq!(ts.micros, 123_456);
        assert_eq!(ts.as_micros(), 1_700_000_000_123_456);
    }

    #[test]
    fn test_timestamp_ordering_follows_time() {
        let a = CaptureTimestamp::from_micros(1_999_999);
        let b = CaptureTimestamp::from_micros(2_000_000);
        assert!(a < b);
    }

    #[test]
    fn test_timestamp_past_u32_seconds_saturates_whole_value() {
        let last = CaptureTimestamp::MAX.as_micros();
        assert_eq!(CaptureTimestamp::from_micros(last), CaptureTimestamp::MAX);
        assert_eq!(CaptureTimestamp::from_micros(last + 1), CaptureTimestamp::MAX);
        assert_eq!(CaptureTimestamp::from_micros(u64::MAX), CaptureTimestamp::MAX);
        assert!(CaptureTimestamp::from_micros(last - 1) < CaptureTimestamp::MAX);
    }

    #[test]
    fn test_record_header_lengths_equal_envelope_size() {
        let record = CaptureRecord {
            timestamp: CaptureTimestamp::default(),
            envelope: wrap_in_urb(0, encode_release()),
        };
        let header = record.header();
        assert_eq!(header.captured_len as usize, record.envelope.to_bytes().len());
        assert_eq!(header.captured_len, header.original_len);
    }

    #[test]
    fn test_capture_file_serializes_every_record() {
        let file = CaptureFile {
            header: GlobalHeader::default(),
            records: (0..3)
                .map(|i| CaptureRecord {
                    timestamp: CaptureTimestamp::from_micros(i * 10_000),
                    envelope: wrap_in_urb(i, encode_release()),
                })
                .collect(),
        };
        let bytes = file.to_bytes();
        assert_eq!(bytes.len(), 24 + 3 * 88);
        assert_eq!(bytes.len(), file.byte_len());
        // Second record's URB id sits after the global header, one full record,
        // and the second record header.
        let off = 24 + 88 + 16;
        assert_eq!(u64::from_le_bytes(bytes[off..off + 8].try_into().unwrap()), 1);
    }

    #[test]
    fn test_empty_capture_is_header_only() {
        assert_eq!(CaptureFile::default().to_bytes().len(), GLOBAL_HEADER_SIZE);
    }
}
