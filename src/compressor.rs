//! Vector and matrix compression on top of the index and value codecs.

use tracing::debug;

use crate::archive::{ArchivedMatrix, ArchivedVector};
use crate::error::CompressionError;
use crate::index;
use crate::traits::{SparseMatrix, SparseVector};
use crate::value::{self, Precision};

/// Largest addressable position space: positions are stored as `u32`.
pub const MAX_DIMENSION: u64 = 1 << 32;

/// Compressor for sparse vectors and matrices.
///
/// Holds no state; every call allocates its own buffers, so one instance can
/// be shared freely across threads.
///
/// # Example
///
/// ```rust
/// use sparsepack::{CompressedVector, SparseCompressor};
///
/// let compressor = SparseCompressor::new();
/// let vector = CompressedVector::from_pairs(8, [(0, 1.0), (3, -2.5), (7, 4.0)]).unwrap();
///
/// let archive = compressor.compress_vector(&vector, 0).unwrap();
/// let restored: CompressedVector = compressor.decompress_vector(&archive).unwrap();
/// assert_eq!(restored, vector);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct SparseCompressor;

impl SparseCompressor {
    /// Create a compressor.
    pub fn new() -> Self {
        Self
    }

    /// Compress a sparse vector.
    ///
    /// `precision` is `0` or `32` for lossless storage, or `2..=31` bits per
    /// value.
    pub fn compress_vector<V: SparseVector>(
        &self,
        vector: &V,
        precision: u32,
    ) -> Result<ArchivedVector, CompressionError> {
        let precision = Precision::new(precision)?;
        let size = vector.len();
        check_dimension(size as u64)?;

        let nonzero = vector.nonzero();
        let mut positions = Vec::with_capacity(nonzero);
        let mut values = Vec::with_capacity(nonzero);
        for (index, value) in vector.nonzeros() {
            if index >= size {
                return Err(CompressionError::InvalidInput(format!(
                    "index {index} out of bounds for length {size}"
                )));
            }
            positions.push(index as u32);
            values.push(value);
        }
        if positions.len() != nonzero {
            return Err(CompressionError::InvalidInput(format!(
                "vector reports {nonzero} nonzeros but yielded {}",
                positions.len()
            )));
        }

        let (indexes, values) = encode_streams(&positions, &values, precision)?;
        debug!(
            nonzero,
            size,
            precision = precision.bits(),
            lossless = precision.is_lossless(),
            index_bytes = indexes.len(),
            value_bytes = values.len(),
            "compressed sparse vector"
        );

        Ok(ArchivedVector {
            is_valid: true,
            nonzero,
            size,
            indexes,
            values,
        })
    }

    /// Rebuild a sparse vector from its archive.
    pub fn decompress_vector<V: SparseVector>(
        &self,
        archived: &ArchivedVector,
    ) -> Result<V, CompressionError> {
        if !archived.is_valid {
            return Err(CompressionError::InvalidArchive);
        }
        let size = archived.size;
        check_dimension(size as u64).map_err(|e| {
            CompressionError::corrupt(format!("archived size {size} unusable: {e}"))
        })?;
        let (positions, values) = decode_streams(
            &archived.indexes,
            &archived.values,
            archived.nonzero,
            size as u64,
        )?;

        let mut vector = V::with_capacity(size, archived.nonzero);
        for (&index, &value) in positions.iter().zip(&values) {
            vector.append(index as usize, value);
        }

        debug!(nonzero = archived.nonzero, size, "decompressed sparse vector");
        Ok(vector)
    }

    /// Compress a sparse matrix.
    ///
    /// Positions are flattened row-major to `row * cols + col`, then encoded
    /// exactly like a vector of length `rows * cols`.
    pub fn compress_matrix<M: SparseMatrix>(
        &self,
        matrix: &M,
        precision: u32,
    ) -> Result<ArchivedMatrix, CompressionError> {
        let precision = Precision::new(precision)?;
        let (rows, cols) = (matrix.rows(), matrix.cols());
        let size = flattened_size(rows, cols)?;

        let nonzero = matrix.nonzero();
        let mut positions = Vec::with_capacity(nonzero);
        let mut values = Vec::with_capacity(nonzero);
        for (row, col, value) in matrix.nonzeros() {
            if row >= rows || col >= cols {
                return Err(CompressionError::InvalidInput(format!(
                    "position ({row}, {col}) out of bounds for {rows}x{cols}"
                )));
            }
            // row < rows and col < cols, so the position is below size <= 2^32.
            positions.push((row as u64 * cols as u64 + col as u64) as u32);
            values.push(value);
        }
        if positions.len() != nonzero {
            return Err(CompressionError::InvalidInput(format!(
                "matrix reports {nonzero} nonzeros but yielded {}",
                positions.len()
            )));
        }

        let (indexes, values) = encode_streams(&positions, &values, precision)?;
        debug!(
            nonzero,
            rows,
            cols,
            size,
            precision = precision.bits(),
            lossless = precision.is_lossless(),
            index_bytes = indexes.len(),
            value_bytes = values.len(),
            "compressed sparse matrix"
        );

        Ok(ArchivedMatrix {
            is_valid: true,
            nonzero,
            rows_number: rows,
            cols_number: cols,
            indexes,
            values,
        })
    }

    /// Rebuild a sparse matrix from its archive.
    pub fn decompress_matrix<M: SparseMatrix>(
        &self,
        archived: &ArchivedMatrix,
    ) -> Result<M, CompressionError> {
        if !archived.is_valid {
            return Err(CompressionError::InvalidArchive);
        }
        let (rows, cols) = (archived.rows_number, archived.cols_number);
        let size = flattened_size(rows, cols).map_err(|e| {
            CompressionError::corrupt(format!("archived shape {rows}x{cols} unusable: {e}"))
        })?;
        let (positions, values) = decode_streams(
            &archived.indexes,
            &archived.values,
            archived.nonzero,
            size,
        )?;

        let mut matrix = M::with_capacity(rows, cols, archived.nonzero);
        for (&pos, &value) in positions.iter().zip(&values) {
            let pos = pos as usize;
            // size > 0 whenever any position decoded, so cols > 0.
            matrix.append(pos / cols, pos % cols, value);
        }
        matrix.finalize();

        debug!(nonzero = archived.nonzero, rows, cols, "decompressed sparse matrix");
        Ok(matrix)
    }
}

fn check_dimension(size: u64) -> Result<(), CompressionError> {
    if size > MAX_DIMENSION {
        return Err(CompressionError::InvalidInput(format!(
            "dimension {size} exceeds the 32-bit position space"
        )));
    }
    Ok(())
}

fn flattened_size(rows: usize, cols: usize) -> Result<u64, CompressionError> {
    let size = (rows as u64).checked_mul(cols as u64).ok_or_else(|| {
        CompressionError::InvalidInput(format!("shape {rows}x{cols} overflows"))
    })?;
    check_dimension(size)?;
    Ok(size)
}

fn encode_streams(
    positions: &[u32],
    values: &[f32],
    precision: Precision,
) -> Result<(Vec<u8>, Vec<u8>), CompressionError> {
    let mut index_buf = Vec::new();
    index::encode(positions, &mut index_buf)?;
    let mut value_buf = Vec::new();
    value::encode(values, precision, &mut value_buf)?;
    Ok((index_buf, value_buf))
}

fn decode_streams(
    index_payload: &[u8],
    value_payload: &[u8],
    nonzero: usize,
    size: u64,
) -> Result<(Vec<u32>, Vec<f32>), CompressionError> {
    if nonzero as u64 > size {
        return Err(CompressionError::corrupt(format!(
            "{nonzero} nonzeros cannot fit in dimension {size}"
        )));
    }
    let positions = index::decode(index_payload, nonzero, size)?;
    let values = value::decode(value_payload, nonzero)?;
    Ok((positions, values))
}
