//! Position codec for strictly increasing nonzero indexes.
//!
//! # Format
//!
//! ```text
//! [bits: u8][d_0 .. d_{n-1}: bits wide, MSB-first, zero-padded to a byte]
//! ```
//!
//! with `d_0 = index_0` and `d_i = index_i - index_{i-1} - 1`. Strict
//! monotonicity means every gap is at least one, so the `- 1` shaves a unit
//! off each delta: a dense run of consecutive positions costs zero bits per
//! entry.
//!
//! The count is not stored here; it travels as `nonzero` in the archive.
//!
//! # Theory
//!
//! A sorted set of `n` positions drawn from `[N]` needs about
//! `log2(C(N, n)) ≈ n * log2(N / n)` bits. A fixed width sized to the largest
//! gap matches that bound when gaps are roughly uniform and degrades when one
//! outlier gap dominates.

use crate::bits::{BitReader, BitWriter};
use crate::error::CompressionError;

/// Header bytes preceding the bit-packed deltas.
pub const HEADER_LEN: usize = 1;

/// Check that indexes are strictly increasing.
fn validate_indexes(indexes: &[u32]) -> Result<(), CompressionError> {
    for pair in indexes.windows(2) {
        if pair[1] <= pair[0] {
            return Err(CompressionError::InvalidInput(format!(
                "indexes must be strictly increasing, found {} after {}",
                pair[1], pair[0]
            )));
        }
    }
    Ok(())
}

#[inline]
fn deltas(indexes: &[u32]) -> impl Iterator<Item = u32> + '_ {
    let first = indexes.first().copied();
    first
        .into_iter()
        .chain(indexes.windows(2).map(|w| w[1] - w[0] - 1))
}

/// Width in bits of the widest delta, 0 when every delta is zero.
///
/// Indexes must already be strictly increasing.
pub fn bit_width(indexes: &[u32]) -> u32 {
    let max_delta = deltas(indexes).max().unwrap_or(0);
    u32::BITS - max_delta.leading_zeros()
}

/// Payload length in bytes for `count` deltas at `bits` each.
///
/// `None` if the length does not fit in `usize`.
pub fn encoded_len(count: usize, bits: u32) -> Option<usize> {
    count
        .checked_mul(bits as usize)
        .map(|total| HEADER_LEN + total.div_ceil(8))
}

/// Theoretical lower bound in bits for a set of `count` positions in `[0, dimension)`.
///
/// Uses Stirling's approximation: log(C(N, n)) ≈ n * log(N/n).
pub fn theoretical_bits(count: usize, dimension: u64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    let n = count as f64;
    let ratio = dimension as f64 / n;
    if ratio <= 1.0 {
        return 0.0;
    }
    n * ratio.log2()
}

/// Encode `indexes` and append the payload to `out`.
///
/// Returns the number of bytes written.
pub fn encode(indexes: &[u32], out: &mut Vec<u8>) -> Result<usize, CompressionError> {
    validate_indexes(indexes)?;

    let bits = bit_width(indexes);
    let start = out.len();
    out.push(bits as u8);

    if bits > 0 {
        let mut writer = BitWriter::from_vec(std::mem::take(out));
        writer.reserve_bits(indexes.len() * bits as usize);
        for delta in deltas(indexes) {
            writer.write_bits(delta, bits);
        }
        *out = writer.into_bytes();
    }

    Ok(out.len() - start)
}

/// Decode exactly `count` indexes from `payload`, each below `dimension`.
pub fn decode(payload: &[u8], count: usize, dimension: u64) -> Result<Vec<u32>, CompressionError> {
    let (&bits, body) = payload
        .split_first()
        .ok_or_else(|| CompressionError::corrupt("index payload is missing its header"))?;
    let bits = u32::from(bits);

    if bits > 32 {
        return Err(CompressionError::corrupt(format!(
            "index width {bits} exceeds 32 bits"
        )));
    }
    if count == 0 {
        if !body.is_empty() {
            return Err(CompressionError::corrupt(format!(
                "extra data after empty index stream: {} bytes",
                body.len()
            )));
        }
        return Ok(Vec::new());
    }

    let needed = encoded_len(count, bits)
        .ok_or_else(|| {
            CompressionError::corrupt(format!("{count} deltas of {bits} bits overflow"))
        })?
        - HEADER_LEN;
    if body.len() < needed {
        return Err(CompressionError::corrupt(format!(
            "index stream holds {} bytes, {} deltas of {} bits need {}",
            body.len(),
            count,
            bits,
            needed
        )));
    }
    if body.len() > needed {
        return Err(CompressionError::corrupt(format!(
            "extra data after index stream: {} bytes",
            body.len() - needed
        )));
    }

    let mut reader = BitReader::new(body);
    let mut indexes = Vec::with_capacity(count);
    // Position of the previous index plus one; starts at 0 (index[-1] = -1).
    let mut next: u64 = 0;

    for _ in 0..count {
        let delta = reader.read_bits(bits)?;
        let index = next + u64::from(delta);
        if index >= dimension {
            return Err(CompressionError::corrupt(format!(
                "decoded index {index} exceeds dimension {dimension}"
            )));
        }
        // dimension <= 2^32, so index fits in u32 here.
        indexes.push(index as u32);
        next = index + 1;
    }

    Ok(indexes)
}
