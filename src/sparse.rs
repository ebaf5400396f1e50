//! Reference sparse containers.
//!
//! Minimal sorted-pair and CSR storage implementing [`SparseVector`] and
//! [`SparseMatrix`]. Callers with their own containers implement the traits
//! instead.

use crate::error::CompressionError;
use crate::traits::{SparseMatrix, SparseVector};

/// Sparse vector stored as parallel sorted index and value arrays.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompressedVector {
    len: usize,
    indexes: Vec<usize>,
    values: Vec<f32>,
}

impl CompressedVector {
    /// An empty vector of length `len`.
    pub fn new(len: usize) -> Self {
        Self {
            len,
            indexes: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Build from `(index, value)` pairs, which must be strictly increasing
    /// and below `len`.
    pub fn from_pairs(
        len: usize,
        pairs: impl IntoIterator<Item = (usize, f32)>,
    ) -> Result<Self, CompressionError> {
        let mut vector = Self::new(len);
        for (index, value) in pairs {
            if index >= len {
                return Err(CompressionError::InvalidInput(format!(
                    "index {index} out of bounds for length {len}"
                )));
            }
            if let Some(&last) = vector.indexes.last() {
                if index <= last {
                    return Err(CompressionError::InvalidInput(format!(
                        "indexes must be strictly increasing, found {index} after {last}"
                    )));
                }
            }
            vector.indexes.push(index);
            vector.values.push(value);
        }
        Ok(vector)
    }

    /// Value at `index`, zero when not stored.
    pub fn get(&self, index: usize) -> f32 {
        match self.indexes.binary_search(&index) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    /// Stored indexes.
    pub fn indexes(&self) -> &[usize] {
        &self.indexes
    }

    /// Stored values, parallel to [`indexes`](Self::indexes).
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Iterate stored pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.indexes.iter().copied().zip(self.values.iter().copied())
    }
}

impl SparseVector for CompressedVector {
    fn len(&self) -> usize {
        self.len
    }

    fn nonzero(&self) -> usize {
        self.indexes.len()
    }

    fn nonzeros(&self) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.iter()
    }

    fn with_capacity(len: usize, nonzero: usize) -> Self {
        Self {
            len,
            indexes: Vec::with_capacity(nonzero),
            values: Vec::with_capacity(nonzero),
        }
    }

    fn append(&mut self, index: usize, value: f32) {
        debug_assert!(index < self.len);
        debug_assert!(self.indexes.last().map_or(true, |&last| index > last));
        self.indexes.push(index);
        self.values.push(value);
    }
}

/// Sparse matrix in compressed sparse row (CSR) layout.
///
/// Equality compares shape and stored entries only; append state is ignored.
#[derive(Clone, Debug, Default)]
pub struct CompressedMatrix {
    rows: usize,
    cols: usize,
    /// `row_offsets[r]..row_offsets[r + 1]` spans row `r`; length `rows + 1`.
    row_offsets: Vec<usize>,
    col_indexes: Vec<usize>,
    values: Vec<f32>,
    /// Row receiving appends; rows after it have stale offsets until `finalize`.
    open_row: usize,
}

impl CompressedMatrix {
    /// An empty `rows × cols` matrix.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::with_capacity(rows, cols, 0)
    }

    /// Build from `(row, col, value)` triplets in strictly increasing
    /// row-major order.
    pub fn from_triplets(
        rows: usize,
        cols: usize,
        triplets: impl IntoIterator<Item = (usize, usize, f32)>,
    ) -> Result<Self, CompressionError> {
        let mut matrix = Self::new(rows, cols);
        let mut last: Option<(usize, usize)> = None;
        for (row, col, value) in triplets {
            if row >= rows || col >= cols {
                return Err(CompressionError::InvalidInput(format!(
                    "position ({row}, {col}) out of bounds for {rows}x{cols}"
                )));
            }
            if let Some(prev) = last {
                if (row, col) <= prev {
                    return Err(CompressionError::InvalidInput(format!(
                        "positions must be row-major and unique, \
                         found ({row}, {col}) after {prev:?}"
                    )));
                }
            }
            last = Some((row, col));
            matrix.append(row, col, value);
        }
        matrix.finalize();
        Ok(matrix)
    }

    /// Value at `(row, col)`, zero when not stored.
    pub fn get(&self, row: usize, col: usize) -> f32 {
        if row >= self.rows {
            return 0.0;
        }
        let span = self.row_offsets[row]..self.row_offsets[row + 1];
        match self.col_indexes[span.clone()].binary_search(&col) {
            Ok(pos) => self.values[span.start + pos],
            Err(_) => 0.0,
        }
    }

    /// Stored `(col, value)` pairs of one row.
    pub fn row(&self, row: usize) -> impl Iterator<Item = (usize, f32)> + '_ {
        let span = self.row_offsets[row]..self.row_offsets[row + 1];
        self.col_indexes[span.clone()]
            .iter()
            .copied()
            .zip(self.values[span].iter().copied())
    }

    /// Iterate stored triplets in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f32)> + '_ {
        (0..self.rows).flat_map(move |r| self.row(r).map(move |(c, v)| (r, c, v)))
    }
}

impl PartialEq for CompressedMatrix {
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows
            && self.cols == other.cols
            && self.row_offsets == other.row_offsets
            && self.col_indexes == other.col_indexes
            && self.values == other.values
    }
}

impl SparseMatrix for CompressedMatrix {
    fn rows(&self) -> usize {
        self.rows
    }

    fn cols(&self) -> usize {
        self.cols
    }

    fn nonzero(&self) -> usize {
        self.values.len()
    }

    fn nonzeros(&self) -> impl Iterator<Item = (usize, usize, f32)> + '_ {
        self.iter()
    }

    fn with_capacity(rows: usize, cols: usize, nonzero: usize) -> Self {
        Self {
            rows,
            cols,
            row_offsets: vec![0; rows + 1],
            col_indexes: Vec::with_capacity(nonzero),
            values: Vec::with_capacity(nonzero),
            open_row: 0,
        }
    }

    fn append(&mut self, row: usize, col: usize, value: f32) {
        debug_assert!(row < self.rows && col < self.cols);
        debug_assert!(row >= self.open_row);
        let filled = self.values.len();
        // Close every row between the open row and the new one.
        for r in self.open_row + 1..=row {
            self.row_offsets[r] = filled;
        }
        self.open_row = row;
        self.col_indexes.push(col);
        self.values.push(value);
        self.row_offsets[row + 1] = self.values.len();
    }

    fn finalize(&mut self) {
        let filled = self.values.len();
        for r in self.open_row + 1..=self.rows {
            self.row_offsets[r] = filled;
        }
        self.open_row = self.rows;
    }
}
