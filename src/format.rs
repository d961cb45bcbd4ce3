//! Numeric formats used by PMBus data words.
//!
//! Three encodings matter here:
//!
//! * **LINEAR11** - a self-contained 16-bit float: signed 11-bit mantissa, signed
//!   5-bit exponent. The default for word-sized values.
//! * **DIRECT** - a linear transform `x = (raw * 10^-R - b) / m`, with the
//!   coefficients m, b and R supplied by the device per command and direction.
//! * **VOUT mode** - `x = raw * 2^N` where the signed 5-bit exponent N comes from
//!   one device-wide VOUT_MODE byte shared by every output-voltage command.
//!
//! Scaling is done by repeated multiply/divide by 2 or 10 so results do not depend
//! on a platform `pow`, and every decode is total over its 16-bit input domain.

use modular_bitfield::prelude::*;
use strum_macros::Display;

/// Which coefficient set a DIRECT conversion uses. Doubles as the wire byte in
/// the COEFFICIENTS process call and as the index into a coefficient pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Write = 0,
    Read = 1,
}

/// A LINEAR11 word, split into its two's-complement fields.
///
/// `from_bits`/`to_bits` are exact inverses over the full 16-bit domain; the
/// split is lossless even for redundant encodings of the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Linear11 {
    /// Signed 11-bit mantissa (bits 0-10, sign bit 10).
    pub mantissa: i16,
    /// Signed 5-bit exponent (bits 11-15, sign bit 15).
    pub exponent: i8,
}

impl Linear11 {
    pub fn from_bits(raw: u16) -> Self {
        let mut mantissa = (raw & 0x07ff) as i16;
        if mantissa & 0x0400 != 0 {
            mantissa -= 0x0800;
        }
        let mut exponent = ((raw >> 11) & 0x1f) as i8;
        if exponent & 0x10 != 0 {
            exponent -= 0x20;
        }
        Self { mantissa, exponent }
    }

    pub fn to_bits(self) -> u16 {
        ((self.mantissa as u16) & 0x07ff) | (((self.exponent as u16) & 0x1f) << 11)
    }

    /// The physical value, mantissa * 2^exponent.
    pub fn value(self) -> f64 {
        scale_pow2(self.mantissa as f64, self.exponent as i32)
    }
}

/// Decode a LINEAR11 word to its physical value.
pub fn decode_linear11(raw: u16) -> f64 {
    Linear11::from_bits(raw).value()
}

/// One DIRECT-format coefficient triple, as delivered by the COEFFICIENTS
/// process call.
///
/// The PMBus spec is silent on signedness except to say output voltages are
/// positive; all three fields are treated as signed here.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Coefficients {
    /// Slope.
    pub m: i16,
    /// Offset (intercept).
    pub b: i16,
    /// Decimal scale exponent.
    pub r: i8,
    /// Whether the device actually delivered this triple.
    pub valid: bool,
}

/// Decode a DIRECT-format word: `(raw * 10^-R - b) / m`.
///
/// Callers pass the read-direction triple. Returns `None` rather than guessing
/// when the triple was never fetched or the slope is zero.
pub fn decode_direct(raw: u16, coefficients: &Coefficients) -> Option<f64> {
    if !coefficients.valid || coefficients.m == 0 {
        return None;
    }
    let scaled = scale_pow10(raw as i16 as f64, -(coefficients.r as i32));
    Some((scaled - coefficients.b as f64) / coefficients.m as f64)
}

/// Encode a physical value into a DIRECT-format word: `(x * m + b) * 10^R`,
/// rounded to the nearest representable word. Exact inverse of
/// [`decode_direct`] for words that came from a prior decode.
///
/// Callers pass the write-direction triple.
pub fn encode_direct(value: f64, coefficients: &Coefficients) -> Option<u16> {
    if !coefficients.valid || coefficients.m == 0 {
        return None;
    }
    let scaled = scale_pow10(
        value * coefficients.m as f64 + coefficients.b as f64,
        coefficients.r as i32,
    );
    Some(scaled.round() as i16 as u16)
}

/// The VOUT_MODE register, selecting the output-voltage numeric format.
#[bitfield]
#[derive(Debug, Clone, Copy)]
pub struct VoutMode {
    /// Format parameter. For the linear selector this is the signed 5-bit
    /// exponent (sign bit 4).
    pub parameter: B5,
    /// Format selector: 0 = linear, 1 = VID, 2 = DIRECT.
    pub selector: B3,
}

/// Whether a VOUT_MODE byte selects the shared-exponent linear format.
pub fn vout_mode_is_linear(mode: u8) -> bool {
    VoutMode::from_bytes([mode]).selector() == 0
}

/// The signed 5-bit exponent carried in a linear VOUT_MODE byte.
pub fn vout_exponent(mode: u8) -> i8 {
    let bits = VoutMode::from_bytes([mode]).parameter();
    if bits & 0x10 != 0 {
        bits as i8 - 0x20
    } else {
        bits as i8
    }
}

/// Decode an output-voltage word using the device-wide VOUT_MODE exponent:
/// `raw * 2^N`.
pub fn decode_vout(raw: u16, mode: u8) -> f64 {
    scale_pow2(raw as i16 as f64, vout_exponent(mode) as i32)
}

/// The numeric format field a QUERY response advertises for a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ValueFormat {
    #[strum(serialize = "s16 (LINEAR)")]
    Linear = 0,
    #[strum(serialize = "u16")]
    UnsignedWord = 1,
    #[strum(serialize = "s16 (DIRECT)")]
    Direct = 3,
    #[strum(serialize = "u8")]
    UnsignedByte = 4,
    #[strum(serialize = "u16 (VID)")]
    Vid = 5,
    #[strum(serialize = "x16 (MFR)")]
    Manufacturer = 6,
}

impl ValueFormat {
    /// Interpret the 3-bit format field of a QUERY response byte.
    pub fn from_query(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::Linear),
            1 => Some(Self::UnsignedWord),
            3 => Some(Self::Direct),
            4 => Some(Self::UnsignedByte),
            5 => Some(Self::Vid),
            6 => Some(Self::Manufacturer),
            _ => None,
        }
    }
}

fn scale_pow2(value: f64, exponent: i32) -> f64 {
    let mut result = value;
    if exponent >= 0 {
        for _ in 0..exponent {
            result *= 2.0;
        }
    } else {
        for _ in 0..-exponent {
            result /= 2.0;
        }
    }
    result
}

fn scale_pow10(value: f64, exponent: i32) -> f64 {
    let mut result = value;
    if exponent >= 0 {
        for _ in 0..exponent {
            result *= 10.0;
        }
    } else {
        for _ in 0..-exponent {
            result /= 10.0;
        }
    }
    result
}
