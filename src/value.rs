//! Value codec: raw IEEE-754 storage or fixed-width linear quantization.
//!
//! # Format
//!
//! ```text
//! raw:        [32: u8][f32 LE] * n
//! quantized:  [p: u8][0: u8][min: f32 LE][max: f32 LE][q_0 .. q_{n-1}: p bits each, MSB-first]
//! degenerate: [p: u8][1: u8][value: f32 LE]
//! empty:      [p: u8]
//! ```
//!
//! Quantization maps `[min, max]` linearly onto `[0, 2^p - 1]`:
//!
//! ```text
//! scale = (2^p - 1) / (max - min)
//! q     = clamp(round((v - min) * scale), 0, 2^p - 1)
//! v'    = min + q / scale
//! ```
//!
//! so every decoded value lies within `(max - min) / (2^p - 1)` of its source.
//!
//! When the quantized form would not be smaller than the raw form, the raw
//! form is written instead. Lowering the precision therefore never grows the
//! payload, and small inputs decode exactly.

use crate::bits::{BitReader, BitWriter};
use crate::error::CompressionError;

/// Header tag for raw 32-bit storage.
pub const LOSSLESS_TAG: u8 = 32;

/// Smallest quantized width.
pub const MIN_QUANTIZED_BITS: u8 = 2;

const FLAG_SPREAD: u8 = 0;
const FLAG_DEGENERATE: u8 = 1;

/// Bits per stored value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Precision {
    /// Raw IEEE-754 single precision, bit-exact.
    #[default]
    Lossless,
    /// Linear quantization to this many bits, `2..=31`.
    Quantized(u8),
}

impl Precision {
    /// Validate a caller-supplied precision.
    ///
    /// `0` and `32` both select [`Precision::Lossless`]; `2..=31` select
    /// quantization. Anything else is rejected rather than clamped.
    pub fn new(bits: u32) -> Result<Self, CompressionError> {
        match bits {
            0 | 32 => Ok(Self::Lossless),
            2..=31 => Ok(Self::Quantized(bits as u8)),
            _ => Err(CompressionError::InvalidValue(format!(
                "precision {bits} outside {{0}} ∪ [2, 32]"
            ))),
        }
    }

    /// Header tag written for this precision.
    pub fn bits(self) -> u32 {
        match self {
            Self::Lossless => u32::from(LOSSLESS_TAG),
            Self::Quantized(bits) => u32::from(bits),
        }
    }

    /// Whether decoding reproduces the input bit-for-bit.
    pub fn is_lossless(self) -> bool {
        self == Self::Lossless
    }

    /// Largest per-element error allowed for values spanning `[min, max]`.
    pub fn error_bound(self, min: f32, max: f32) -> f64 {
        match self {
            Self::Lossless => 0.0,
            Self::Quantized(bits) => {
                (f64::from(max) - f64::from(min)) / f64::from(max_code(u32::from(bits)))
            }
        }
    }
}

impl TryFrom<u32> for Precision {
    type Error = CompressionError;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        Self::new(bits)
    }
}

#[inline]
fn max_code(bits: u32) -> u32 {
    ((1u64 << bits) - 1) as u32
}

fn raw_len(count: usize) -> usize {
    1 + 4 * count
}

fn quantized_len(count: usize, bits: u32) -> usize {
    2 + 8 + (count * bits as usize).div_ceil(8)
}

const DEGENERATE_LEN: usize = 2 + 4;

fn read_f32(bytes: &[u8], at: usize) -> Result<f32, CompressionError> {
    bytes
        .get(at..at + 4)
        .and_then(|s| s.try_into().ok())
        .map(f32::from_le_bytes)
        .ok_or_else(|| CompressionError::corrupt("value header truncated"))
}

/// Smallest and largest of `values`, rejecting NaN and infinities.
fn finite_range(values: &[f32]) -> Result<Option<(f32, f32)>, CompressionError> {
    let mut range: Option<(f32, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        if !v.is_finite() {
            return Err(CompressionError::InvalidValue(format!(
                "value {v} at position {i} is not finite"
            )));
        }
        range = Some(match range {
            None => (v, v),
            Some((lo, hi)) => (lo.min(v), hi.max(v)),
        });
    }
    Ok(range)
}

fn encode_raw(values: &[f32], out: &mut Vec<u8>) {
    out.reserve(raw_len(values.len()));
    out.push(LOSSLESS_TAG);
    for v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
}

/// Encode `values` at `precision` and append the payload to `out`.
///
/// Returns the number of bytes written.
pub fn encode(
    values: &[f32],
    precision: Precision,
    out: &mut Vec<u8>,
) -> Result<usize, CompressionError> {
    let range = finite_range(values)?;
    let start = out.len();

    let bits = match precision {
        Precision::Lossless => {
            encode_raw(values, out);
            return Ok(out.len() - start);
        }
        Precision::Quantized(bits) if (MIN_QUANTIZED_BITS..LOSSLESS_TAG).contains(&bits) => {
            u32::from(bits)
        }
        Precision::Quantized(bits) => {
            return Err(CompressionError::InvalidValue(format!(
                "quantized precision {bits} outside [2, 31]"
            )))
        }
    };

    let Some((min, max)) = range else {
        out.push(bits as u8);
        return Ok(out.len() - start);
    };

    let quantized = if min == max {
        DEGENERATE_LEN
    } else {
        quantized_len(values.len(), bits)
    };
    if quantized >= raw_len(values.len()) {
        tracing::trace!(
            count = values.len(),
            bits,
            quantized,
            "quantized form not smaller, storing raw"
        );
        encode_raw(values, out);
        return Ok(out.len() - start);
    }

    out.push(bits as u8);
    // -0.0 and 0.0 compare equal; the degenerate form keeps only one sign.
    if min == max {
        out.push(FLAG_DEGENERATE);
        out.extend_from_slice(&min.to_le_bytes());
        return Ok(out.len() - start);
    }

    out.push(FLAG_SPREAD);
    out.extend_from_slice(&min.to_le_bytes());
    out.extend_from_slice(&max.to_le_bytes());

    let top = max_code(bits);
    let scale = f64::from(top) / (f64::from(max) - f64::from(min));
    let mut writer = BitWriter::from_vec(std::mem::take(out));
    writer.reserve_bits(values.len() * bits as usize);
    for &v in values {
        let q = ((f64::from(v) - f64::from(min)) * scale).round();
        let q = q.clamp(0.0, f64::from(top)) as u32;
        writer.write_bits(q, bits);
    }
    *out = writer.into_bytes();

    Ok(out.len() - start)
}

/// Decode exactly `count` values from `payload`.
pub fn decode(payload: &[u8], count: usize) -> Result<Vec<f32>, CompressionError> {
    let (&tag, body) = payload
        .split_first()
        .ok_or_else(|| CompressionError::corrupt("value payload is missing its header"))?;

    if tag != LOSSLESS_TAG && !(MIN_QUANTIZED_BITS..LOSSLESS_TAG).contains(&tag) {
        return Err(CompressionError::corrupt(format!(
            "unknown precision tag {tag}"
        )));
    }
    if count == 0 {
        if !body.is_empty() {
            return Err(CompressionError::corrupt(format!(
                "extra data after empty value stream: {} bytes",
                body.len()
            )));
        }
        return Ok(Vec::new());
    }

    if tag == LOSSLESS_TAG {
        return decode_raw(body, count);
    }

    let (&flag, rest) = body
        .split_first()
        .ok_or_else(|| CompressionError::corrupt("value payload is missing its flag"))?;
    match flag {
        FLAG_DEGENERATE => {
            if rest.len() != 4 {
                return Err(CompressionError::corrupt(format!(
                    "degenerate value block holds {} bytes, expected 4",
                    rest.len()
                )));
            }
            let value = read_f32(rest, 0)?;
            if !value.is_finite() {
                return Err(CompressionError::corrupt("degenerate value is not finite"));
            }
            Ok(vec![value; count])
        }
        FLAG_SPREAD => decode_quantized(rest, count, u32::from(tag)),
        other => Err(CompressionError::corrupt(format!(
            "unknown value flag {other}"
        ))),
    }
}

fn decode_raw(body: &[u8], count: usize) -> Result<Vec<f32>, CompressionError> {
    let needed = count
        .checked_mul(4)
        .ok_or_else(|| CompressionError::corrupt(format!("{count} raw values overflow")))?;
    if body.len() != needed {
        return Err(CompressionError::corrupt(format!(
            "raw value block holds {} bytes, {} values need {}",
            body.len(),
            count,
            needed
        )));
    }
    Ok(body
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

fn decode_quantized(rest: &[u8], count: usize, bits: u32) -> Result<Vec<f32>, CompressionError> {
    let min = read_f32(rest, 0)?;
    let max = read_f32(rest, 4)?;
    if !(min.is_finite() && max.is_finite()) || min >= max {
        return Err(CompressionError::corrupt(format!(
            "invalid quantization range [{min}, {max}]"
        )));
    }

    let codes = &rest[8..];
    let needed = count
        .checked_mul(bits as usize)
        .ok_or_else(|| {
            CompressionError::corrupt(format!("{count} codes of {bits} bits overflow"))
        })?
        .div_ceil(8);
    if codes.len() != needed {
        return Err(CompressionError::corrupt(format!(
            "quantized block holds {} bytes, {} codes of {} bits need {}",
            codes.len(),
            count,
            bits,
            needed
        )));
    }

    let scale = f64::from(max_code(bits)) / (f64::from(max) - f64::from(min));
    let mut reader = BitReader::new(codes);
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        let q = reader.read_bits(bits)?;
        let v = (f64::from(min) + f64::from(q) / scale) as f32;
        values.push(v.clamp(min, max));
    }
    Ok(values)
}
