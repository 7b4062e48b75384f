use std::fmt::Write;

/// Offset applied to negative absolute (and single-axis relative) positions.
pub const ABSOLUTE_MODULUS: u16 = 65535;
/// Offset applied to leftward amounts in a combined relative move.
pub const RELATIVE_PAN_MODULUS: u16 = 65532;
/// Offset applied to downward amounts in a combined relative move.
pub const RELATIVE_TILT_MODULUS: u16 = 65500;

/// Range of a signed position quantity.
const SIGNED_LIMIT: i32 = 32767;

/// Clamp `value` into `min..=max`, logging an advisory if it was outside.
pub(crate) fn clamp_param(name: &str, value: i32, min: i32, max: i32) -> i32 {
    let clamped = value.clamp(min, max);
    if clamped != value {
        tracing::warn!("{name} {value} outside {min}..={max}, clamped to {clamped}");
    }
    clamped
}

/// Uppercase hex, left-zero-padded to `width` digits, after clamping.
pub(crate) fn hex_field(name: &str, value: i32, max: i32, width: usize) -> String {
    let v = clamp_param(name, value, 0, max);
    format!("{v:0width$X}")
}

/// Split a 16-bit quantity into four nibbles, one per byte with a zero high
/// nibble: `0x1234` becomes `"01020304"`.
pub(crate) fn nibble_pack(value: u16) -> String {
    let mut out = String::with_capacity(8);
    for shift in [12, 8, 4, 0] {
        // infallible for String
        let _ = write!(out, "0{:X}", (value >> shift) & 0xF);
    }
    out
}

/// A signed position, -32767..=32767, carried on the wire as an unsigned 16-bit
/// field. Negative values are remapped by adding a protocol-defined modulus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignedOffsetValue(i32);

impl SignedOffsetValue {
    pub fn new(value: i32) -> Self {
        Self(clamp_param("signed position", value, -SIGNED_LIMIT, SIGNED_LIMIT))
    }

    /// Build from a magnitude and direction flag, as the combined relative
    /// move takes its arguments.
    pub fn from_amount(amount: i32, positive: bool) -> Self {
        let amount = clamp_param("relative amount", amount, 0, SIGNED_LIMIT);
        Self(if positive { amount } else { -amount })
    }

    pub fn value(&self) -> i32 {
        self.0
    }

    /// Remap into the unsigned wire domain.
    pub fn to_wire(self, modulus: u16) -> u16 {
        if self.0 < 0 {
            (i32::from(modulus) + self.0) as u16
        } else {
            self.0 as u16
        }
    }
}
