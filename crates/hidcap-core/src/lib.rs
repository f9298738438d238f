//! # hidcap-core
//!
//! Codec between plain text and a synthetic USB keyboard packet capture.
//!
//! Text is typed, one key press and one key release per character, as HID
//! boot-protocol reports.  Each report is wrapped in a 64-byte URB header and
//! stored as one record of a classic little-endian pcap file with link type
//! 189 (`LINKTYPE_USB_LINUX`).  The reader walks such a file, pulls the HID
//! report out of every record and types the text back out.
//!
//! # Architecture overview
//!
//! - **`keymap`** – The US-layout table between HID usage IDs and the
//!   `(plain, shifted)` characters each key produces.
//!
//! - **`capture`** – The binary side: HID reports and URB envelopes
//!   (`frame`), pcap global/record headers (`pcap`), and the
//!   [`CaptureWriter`] / [`CaptureReader`] pair built on top of them.
//!
//! - **`markers`** – Finds `PREFIX{...}` markers in recovered text.
//!
//! ```text
//! text ─► CaptureWriter ─► CaptureFile bytes ─► CaptureReader ─► text ─► MarkerScanner
//! ```
//!
//! This crate has no OS dependencies beyond `std::fs` in the file helpers.

pub mod capture;
pub mod keymap;
pub mod markers;

// Re-export the most-used types at the crate root so callers can write
// `hidcap_core::CaptureWriter` instead of `hidcap_core::capture::writer::CaptureWriter`.
pub use capture::error::CaptureError;
pub use capture::pcap::{CaptureFile, CaptureRecord, CaptureTimestamp};
pub use capture::reader::{decode_capture, CaptureReader, Keystroke};
pub use capture::writer::{encode_text, CaptureWriter, EncodeSummary, TimingProfile};
pub use keymap::hid::HidKeyCode;
pub use keymap::{KeyMap, KeySymbol, KeymapError};
pub use markers::{find_markers, MarkerScanner};
