use crate::{Inquiry, ViscaError, TERMINATOR};

/// Position of the first payload nibble of each field, counted in hex
/// characters of the reply. The following nibbles sit every second character.
const PAN_OFFSET: usize = 5;
const TILT_OFFSET: usize = 13;
const ZOOM_OFFSET: usize = 5;

/// Completion header of an inquiry reply from camera address 1.
const REPLY_HEADER: [u8; 2] = [0x90, 0x50];

fn hex_chars(resp: &[u8]) -> Vec<u8> {
    const DIGITS: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = Vec::with_capacity(resp.len() * 2);
    for b in resp {
        out.push(DIGITS[usize::from(b >> 4)]);
        out.push(DIGITS[usize::from(b & 0xF)]);
    }
    out
}

fn field(resp: &[u8], inquiry: Inquiry, offset: usize) -> Result<u16, ViscaError> {
    let chars = hex_chars(resp);
    let expected = inquiry.expected_len();
    if chars.len() < expected {
        return Err(ViscaError::ShortResponse {
            expected,
            actual: chars.len(),
        });
    }
    let digits: String = (0..4)
        .map(|i| char::from(chars[offset + 2 * i]))
        .collect();
    u16::from_str_radix(&digits, 16).map_err(|_| ViscaError::InvalidHex(digits))
}

/// Absolute pan from a pan/tilt inquiry reply.
pub fn decode_pan(resp: &[u8]) -> Result<u16, ViscaError> {
    field(resp, Inquiry::PanTilt, PAN_OFFSET)
}

/// Absolute tilt from a pan/tilt inquiry reply.
pub fn decode_tilt(resp: &[u8]) -> Result<u16, ViscaError> {
    field(resp, Inquiry::PanTilt, TILT_OFFSET)
}

/// Absolute zoom from a zoom inquiry reply.
pub fn decode_zoom(resp: &[u8]) -> Result<u16, ViscaError> {
    field(resp, Inquiry::Zoom, ZOOM_OFFSET)
}

fn push_nibbles(out: &mut Vec<u8>, value: u16) {
    for shift in [12, 8, 4, 0] {
        out.push(((value >> shift) & 0xF) as u8);
    }
}

/// The reply a camera sends to a pan/tilt inquiry.
pub fn pan_tilt_reply(pan: u16, tilt: u16) -> Vec<u8> {
    let mut out = REPLY_HEADER.to_vec();
    push_nibbles(&mut out, pan);
    push_nibbles(&mut out, tilt);
    out.push(TERMINATOR);
    out
}

/// The reply a camera sends to a zoom inquiry.
pub fn zoom_reply(zoom: u16) -> Vec<u8> {
    let mut out = REPLY_HEADER.to_vec();
    push_nibbles(&mut out, zoom);
    out.push(TERMINATOR);
    out
}
