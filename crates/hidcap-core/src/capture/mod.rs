//! Capture file codec: HID frames, pcap container, writer and reader.

pub mod error;
pub mod frame;
pub mod pcap;
pub mod reader;
pub mod sequence;
pub mod writer;

pub use error::CaptureError;
pub use frame::{
    encode_release, encode_report, unwrap_urb, wrap_in_urb, HidReport, ModifierFlags, UrbEnvelope,
};
pub use pcap::{CaptureFile, CaptureRecord, CaptureTimestamp, GlobalHeader, RecordHeader};
pub use reader::{decode_capture, read_capture_file, CaptureReader, Keystroke, RawRecord};
pub use sequence::SequenceCounter;
pub use writer::{
    encode_text, write_capture_file, CaptureWriter, EncodeSummary, TimingProfile,
};
