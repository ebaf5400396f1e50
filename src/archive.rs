//! Self-describing compressed records.
//!
//! An archive is a plain value: built once by a compress call, optionally
//! persisted by the caller, consumed by the matching decompress call.

use crate::error::CompressionError;

/// Bytes an uncompressed `(u32 index, f32 value)` pair would take.
const RAW_PAIR_LEN: usize = 8;

fn ratio(raw: usize, compressed: usize) -> f64 {
    if compressed == 0 {
        return 1.0;
    }
    raw as f64 / compressed as f64
}

/// A compressed sparse vector.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArchivedVector {
    /// `false` for a default-constructed record or a failed compression.
    pub is_valid: bool,
    /// Number of stored elements.
    pub nonzero: usize,
    /// Logical vector length.
    pub size: usize,
    /// Encoded positions.
    pub indexes: Vec<u8>,
    /// Encoded values.
    pub values: Vec<u8>,
}

impl ArchivedVector {
    /// Index plus value payload bytes.
    pub fn compressed_len(&self) -> usize {
        self.indexes.len() + self.values.len()
    }

    /// Bytes the stored pairs would take as raw `u32`/`f32`.
    pub fn raw_len(&self) -> usize {
        self.nonzero * RAW_PAIR_LEN
    }

    /// Compression ratio (raw / compressed).
    pub fn ratio(&self) -> f64 {
        ratio(self.raw_len(), self.compressed_len())
    }
}

impl From<Result<ArchivedVector, CompressionError>> for ArchivedVector {
    /// Collapse a failed compression into an invalid record.
    fn from(result: Result<ArchivedVector, CompressionError>) -> Self {
        result.unwrap_or_default()
    }
}

/// A compressed sparse matrix.
///
/// Positions are flattened row-major into `[0, rows_number * cols_number)`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArchivedMatrix {
    /// `false` for a default-constructed record or a failed compression.
    pub is_valid: bool,
    /// Number of stored elements.
    pub nonzero: usize,
    /// Matrix rows.
    pub rows_number: usize,
    /// Matrix columns.
    pub cols_number: usize,
    /// Encoded flattened positions.
    pub indexes: Vec<u8>,
    /// Encoded values.
    pub values: Vec<u8>,
}

impl ArchivedMatrix {
    /// Size of the flattened position space, `rows × cols`.
    ///
    /// `None` if the product overflows `u64`.
    pub fn size(&self) -> Option<u64> {
        (self.rows_number as u64).checked_mul(self.cols_number as u64)
    }

    /// Index plus value payload bytes.
    pub fn compressed_len(&self) -> usize {
        self.indexes.len() + self.values.len()
    }

    /// Bytes the stored triplets would take as a raw `u32` position and `f32` value.
    pub fn raw_len(&self) -> usize {
        self.nonzero * RAW_PAIR_LEN
    }

    /// Compression ratio (raw / compressed).
    pub fn ratio(&self) -> f64 {
        ratio(self.raw_len(), self.compressed_len())
    }
}

impl From<Result<ArchivedMatrix, CompressionError>> for ArchivedMatrix {
    /// Collapse a failed compression into an invalid record.
    fn from(result: Result<ArchivedMatrix, CompressionError>) -> Self {
        result.unwrap_or_default()
    }
}
