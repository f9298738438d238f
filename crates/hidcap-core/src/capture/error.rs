//! Error type shared by the capture writer, reader and frame codec.

use thiserror::Error;

/// Errors that can occur while building, persisting or parsing a capture.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The stream does not start with the pcap magic `0xA1B2C3D4`.
    ///
    /// `found` holds the leading bytes that were present (at most 4).
    #[error("invalid capture magic: {found:02X?}")]
    InvalidMagic { found: Vec<u8> },

    /// A record payload is too short to hold a URB header and HID report.
    #[error("truncated URB envelope: need {needed} bytes, got {available}")]
    TruncatedEnvelope { needed: usize, available: usize },

    /// Reading or writing the underlying byte sink/source failed.
    #[error("capture I/O error: {0}")]
    Io(#[from] std::io::Error),
}
