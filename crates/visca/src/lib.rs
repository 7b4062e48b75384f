//! VISCA pan-tilt-zoom camera protocol.
//!
//! Commands are built as uppercase hexadecimal strings (the form in which the
//! protocol is documented) and converted to raw bytes only when they are
//! framed onto the serial link by [ViscaCodec].

mod camera;
mod codec;
mod command;
mod inquiry;
mod params;

pub use camera::*;
pub use codec::*;
pub use command::*;
pub use inquiry::*;
pub use params::{
    SignedOffsetValue, ABSOLUTE_MODULUS, RELATIVE_PAN_MODULUS, RELATIVE_TILT_MODULUS,
};

/// First byte of every command sent to camera address 1.
pub const HEADER: u8 = 0x81;
/// Last byte of every message in either direction.
pub const TERMINATOR: u8 = 0xFF;

#[derive(thiserror::Error, Debug)]
pub enum ViscaError {
    #[error("io error {0}")]
    Io(#[from] std::io::Error),
    #[error("timeout writing command {command}")]
    WriteTimeout { command: String },
    #[error("no inquiry response within {millis} ms")]
    InquiryTimeout { millis: u128 },
    #[error("short inquiry response, expected {expected} hex characters, got {actual}")]
    ShortResponse { expected: usize, actual: usize },
    #[error("no terminator within {len} bytes of reply")]
    FrameTooLong { len: usize },
    #[error("serial link closed")]
    Disconnected,
    #[error("invalid hex command string \"{0}\"")]
    InvalidHex(String),
}
