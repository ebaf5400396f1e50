//! Fixed-width bit packing.
//!
//! Fields are written MSB-first: the first bit written lands in the highest
//! bit of the first byte. Both the index and the value codec go through these
//! two types, so the bit order is consistent across the whole format.

use crate::error::CompressionError;

/// Packs integers of 1 to 32 bits into a growable byte buffer.
#[derive(Debug, Default)]
pub struct BitWriter {
    buf: Vec<u8>,
    /// Pending bits not yet forming a full byte, right-aligned.
    acc: u64,
    /// Number of valid bits in `acc` (always < 8 between calls).
    acc_bits: u32,
}

impl BitWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue writing after an already byte-aligned prefix, such as a header.
    pub fn from_vec(prefix: Vec<u8>) -> Self {
        Self {
            buf: prefix,
            acc: 0,
            acc_bits: 0,
        }
    }

    /// Reserve room for roughly `bits` more bits.
    pub fn reserve_bits(&mut self, bits: usize) {
        self.buf.reserve(bits.div_ceil(8));
    }

    /// Append the low `width` bits of `value`.
    ///
    /// # Panics
    ///
    /// Panics if `width` is not in `1..=32`. Callers compute widths from
    /// validated headers, so an out-of-range width is a programming error.
    #[inline]
    pub fn write_bits(&mut self, value: u32, width: u32) {
        assert!(
            (1..=32).contains(&width),
            "bit width {width} outside 1..=32"
        );
        let masked = u64::from(value) & ((1u64 << width) - 1);
        self.acc = (self.acc << width) | masked;
        self.acc_bits += width;

        while self.acc_bits >= 8 {
            self.acc_bits -= 8;
            self.buf.push((self.acc >> self.acc_bits) as u8);
        }
        self.acc &= (1u64 << self.acc_bits) - 1;
    }

    /// Zero-pad the trailing partial byte and return the buffer length in bytes.
    pub fn flush(&mut self) -> usize {
        if self.acc_bits > 0 {
            self.buf.push((self.acc << (8 - self.acc_bits)) as u8);
            self.acc = 0;
            self.acc_bits = 0;
        }
        self.buf.len()
    }

    /// Flush and hand back the buffer.
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.flush();
        self.buf
    }
}

/// Reads fixed-width fields back out of a byte slice.
#[derive(Debug)]
pub struct BitReader<'a> {
    data: &'a [u8],
    /// Bit cursor from the start of `data`.
    pos: usize,
}

impl<'a> BitReader<'a> {
    /// Start reading at the first bit of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bits left before the end of the slice.
    #[inline]
    pub fn remaining_bits(&self) -> usize {
        self.data.len() * 8 - self.pos
    }

    /// Bytes touched so far, counting a partially read byte as consumed.
    pub fn consumed_bytes(&self) -> usize {
        self.pos.div_ceil(8)
    }

    /// Read a `width`-bit field (`0..=32`). A zero width reads nothing and
    /// yields 0.
    #[inline]
    pub fn read_bits(&mut self, width: u32) -> Result<u32, CompressionError> {
        if width > 32 {
            return Err(CompressionError::corrupt(format!(
                "bit width {width} exceeds 32"
            )));
        }
        let width = width as usize;
        if width > self.remaining_bits() {
            return Err(CompressionError::corrupt(format!(
                "needed {width} bits, only {} remain",
                self.remaining_bits()
            )));
        }

        let mut out = 0u64;
        let mut need = width;
        while need > 0 {
            let byte = self.data[self.pos / 8];
            let avail = 8 - self.pos % 8;
            let take = avail.min(need);
            let chunk = (u64::from(byte) >> (avail - take)) & ((1u64 << take) - 1);
            out = (out << take) | chunk;
            need -= take;
            self.pos += take;
        }

        Ok(out as u32)
    }
}
