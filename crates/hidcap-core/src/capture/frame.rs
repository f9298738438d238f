//! HID keyboard reports and the URB envelope that carries them.
//!
//! Record payload layout (72 bytes, all multi-byte integers little-endian):
//! ```text
//! offset  size  field
//!      0     8  urb_id          (sequence id of the record)
//!      8     1  urb_type        0x43 'C' = complete
//!      9     1  transfer_type   0x01 = interrupt
//!     10     1  endpoint        0x81 = IN, endpoint 1
//!     11     1  device          0x00
//!     12     2  bus_id          0x0001
//!     14     2  setup_flag      0
//!     16     1  data_flag       0
//!     17     8  urb_timestamp   0
//!     25     4  urb_status      0 (signed)
//!     29     4  urb_length      8
//!     33     4  data_length     8
//!     37    27  zero padding
//!     64     8  HID report      [modifier][reserved][key0..key5]
//! ```
//! The report is always taken from offset 64.  The two length fields are
//! written for realism but never trusted when reading.

use serde::{Deserialize, Serialize};

use crate::capture::error::CaptureError;

/// Size of a boot-protocol keyboard report.
pub const HID_REPORT_SIZE: usize = 8;
/// Size of the URB header that precedes the report.
pub const URB_HEADER_SIZE: usize = 64;
/// Size of a full record payload: URB header plus report.
pub const URB_ENVELOPE_SIZE: usize = URB_HEADER_SIZE + HID_REPORT_SIZE;

/// `urb_type` value for a completed transfer (`'C'`).
pub const URB_TYPE_COMPLETE: u8 = 0x43;
/// `transfer_type` value for an interrupt transfer.
pub const TRANSFER_TYPE_INTERRUPT: u8 = 0x01;
/// Interrupt IN endpoint 1.
pub const ENDPOINT_IN_1: u8 = 0x81;
/// Bus the synthetic keyboard sits on.
pub const DEFAULT_BUS_ID: u16 = 0x0001;

/// Modifier byte of a boot-protocol keyboard report.
///
/// Bit layout follows the HID usages 0xE0–0xE7 in order.  Only
/// [`ModifierFlags::LEFT_SHIFT`] is ever set by the writer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModifierFlags(pub u8);

impl ModifierFlags {
    pub const LEFT_CTRL: u8 = 1 << 0;
    pub const LEFT_SHIFT: u8 = 1 << 1;
    pub const LEFT_ALT: u8 = 1 << 2;
    pub const LEFT_META: u8 = 1 << 3;
    pub const RIGHT_CTRL: u8 = 1 << 4;
    pub const RIGHT_SHIFT: u8 = 1 << 5;
    pub const RIGHT_ALT: u8 = 1 << 6;
    pub const RIGHT_META: u8 = 1 << 7;

    /// No modifiers held.
    pub const NONE: ModifierFlags = ModifierFlags(0);

    /// Returns the modifier byte for a key typed with or without Shift.
    pub fn shift_if(shifted: bool) -> Self {
        if shifted {
            ModifierFlags(Self::LEFT_SHIFT)
        } else {
            Self::NONE
        }
    }

    /// Returns `true` if left Shift is held.
    ///
    /// Right Shift is deliberately not considered: the reader only ever
    /// looks at bit 1.
    pub fn left_shift(&self) -> bool {
        self.0 & Self::LEFT_SHIFT != 0
    }
}

/// An 8-byte boot-protocol keyboard report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HidReport {
    pub modifier: ModifierFlags,
    /// Always 0 on the wire.
    pub reserved: u8,
    /// Pressed keys.  Only `keys[0]` is used; 0 means "no key".
    pub keys: [u8; 6],
}

impl HidReport {
    /// The key in the first slot, or 0 for an idle/release report.
    pub fn scan_code(&self) -> u8 {
        self.keys[0]
    }

    /// Returns `true` if no key is held in the first slot.
    pub fn is_release(&self) -> bool {
        self.keys[0] == 0
    }

    pub fn to_bytes(&self) -> [u8; HID_REPORT_SIZE] {
        let mut out = [0u8; HID_REPORT_SIZE];
        out[0] = self.modifier.0;
        out[1] = self.reserved;
        out[2..].copy_from_slice(&self.keys);
        out
    }

    pub fn from_bytes(bytes: [u8; HID_REPORT_SIZE]) -> Self {
        let mut keys = [0u8; 6];
        keys.copy_from_slice(&bytes[2..]);
        Self {
            modifier: ModifierFlags(bytes[0]),
            reserved: bytes[1],
            keys,
        }
    }
}

/// A parsed URB envelope: the fixed 64-byte header plus its HID report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UrbEnvelope {
    pub urb_id: u64,
    pub urb_type: u8,
    pub transfer_type: u8,
    pub endpoint: u8,
    pub device: u8,
    pub bus_id: u16,
    pub setup_flag: [u8; 2],
    pub data_flag: u8,
    pub urb_timestamp: u64,
    pub urb_status: i32,
    pub urb_length: u32,
    pub data_length: u32,
    pub report: HidReport,
}

impl UrbEnvelope {
    /// Serializes the envelope into its 72-byte wire form.
    pub fn to_bytes(&self) -> [u8; URB_ENVELOPE_SIZE] {
        let mut buf = [0u8; URB_ENVELOPE_SIZE];
        buf[0..8].copy_from_slice(&self.urb_id.to_le_bytes());
        buf[8] = self.urb_type;
        buf[9] = self.transfer_type;
        buf[10] = self.endpoint;
        buf[11] = self.device;
        buf[12..14].copy_from_slice(&self.bus_id.to_le_bytes());
        buf[14..16].copy_from_slice(&self.setup_flag);
        buf[16] = self.data_flag;
        buf[17..25].copy_from_slice(&self.urb_timestamp.to_le_bytes());
        buf[25..29].copy_from_slice(&self.urb_status.to_le_bytes());
        buf[29..33].copy_from_slice(&self.urb_length.to_le_bytes());
        buf[33..37].copy_from_slice(&self.data_length.to_le_bytes());
        // bytes 37..64 stay zero
        buf[URB_HEADER_SIZE..].copy_from_slice(&self.report.to_bytes());
        buf
    }

    /// Parses every header field plus the report.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::TruncatedEnvelope`] if `bytes` is shorter than
    /// [`URB_ENVELOPE_SIZE`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CaptureError> {
        let report = unwrap_urb(bytes)?;
        Ok(Self {
            urb_id: read_u64_le(bytes, 0),
            urb_type: bytes[8],
            transfer_type: bytes[9],
            endpoint: bytes[10],
            device: bytes[11],
            bus_id: read_u16_le(bytes, 12),
            setup_flag: [bytes[14], bytes[15]],
            data_flag: bytes[16],
            urb_timestamp: read_u64_le(bytes, 17),
            urb_status: read_u32_le(bytes, 25) as i32,
            urb_length: read_u32_le(bytes, 29),
            data_length: read_u32_le(bytes, 33),
            report,
        })
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Builds a key-press report with `scan_code` in the first key slot.
pub fn encode_report(modifier: ModifierFlags, scan_code: u8) -> HidReport {
    HidReport {
        modifier,
        reserved: 0,
        keys: [scan_code, 0, 0, 0, 0, 0],
    }
}

/// Builds the all-zero report a keyboard sends once every key is up.
pub fn encode_release() -> HidReport {
    HidReport::default()
}

/// Wraps `report` in a URB header with the fixed interrupt-IN field values.
pub fn wrap_in_urb(sequence_id: u64, report: HidReport) -> UrbEnvelope {
    UrbEnvelope {
        urb_id: sequence_id,
        urb_type: URB_TYPE_COMPLETE,
        transfer_type: TRANSFER_TYPE_INTERRUPT,
        endpoint: ENDPOINT_IN_1,
        device: 0,
        bus_id: DEFAULT_BUS_ID,
        setup_flag: [0, 0],
        data_flag: 0,
        urb_timestamp: 0,
        urb_status: 0,
        urb_length: HID_REPORT_SIZE as u32,
        data_length: HID_REPORT_SIZE as u32,
        report,
    }
}

/// Extracts the HID report at offset 64 of a record payload.
///
/// Only the payload size is checked; the URB header fields are ignored.
///
/// # Errors
///
/// Returns [`CaptureError::TruncatedEnvelope`] if `bytes` is shorter than
/// [`URB_ENVELOPE_SIZE`].
pub fn unwrap_urb(bytes: &[u8]) -> Result<HidReport, CaptureError> {
    if bytes.len() < URB_ENVELOPE_SIZE {
        return Err(CaptureError::TruncatedEnvelope {
            needed: URB_ENVELOPE_SIZE,
            available: bytes.len(),
        });
    }
    let mut report = [0u8; HID_REPORT_SIZE];
    report.copy_from_slice(&bytes[URB_HEADER_SIZE..URB_ENVELOPE_SIZE]);
    Ok(HidReport::from_bytes(report))
}

// ── Utility helpers ───────────────────────────────────────────────────────────
//
// Callers guarantee `offset + size <= buf.len()`.

pub(crate) fn read_u16_le(buf: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([buf[offset], buf[offset + 1]])
}

pub(crate) fn read_u32_le(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ])
}

pub(crate) fn read_u64_le(buf: &[u8], offset: usize) -> u64 {
    u64::from_le_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
        buf[offset + 4],
        buf[offset + 5],
        buf[offset + 6],
        buf[offset + 7],
    ])
}

// ── Tests ─────────────────────────────────────────────────────────────────────
