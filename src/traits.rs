//! Capabilities the codec needs from a host sparse container.
//!
//! The compressor never looks inside a concrete storage type. It walks the
//! nonzeros in order while compressing and appends them in order while
//! decompressing, so any CSR/COO/sorted-pair backing store can plug in.

/// A sparse vector of `f32`.
pub trait SparseVector {
    /// Logical length, including implicit zeros.
    fn len(&self) -> usize;

    /// Whether the logical length is zero.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of explicitly stored elements.
    fn nonzero(&self) -> usize;

    /// Stored `(index, value)` pairs in strictly increasing index order.
    fn nonzeros(&self) -> impl Iterator<Item = (usize, f32)> + '_;

    /// An empty vector of length `len` with room for `nonzero` elements.
    fn with_capacity(len: usize, nonzero: usize) -> Self
    where
        Self: Sized;

    /// Store `value` at `index`. Indexes arrive strictly increasing.
    fn append(&mut self, index: usize, value: f32);
}

/// A sparse `rows × cols` matrix of `f32`.
pub trait SparseMatrix {
    /// Number of rows.
    fn rows(&self) -> usize;

    /// Number of columns.
    fn cols(&self) -> usize;

    /// Number of explicitly stored elements.
    fn nonzero(&self) -> usize;

    /// Stored `(row, col, value)` triplets in row-major order.
    fn nonzeros(&self) -> impl Iterator<Item = (usize, usize, f32)> + '_;

    /// An empty `rows × cols` matrix with room for `nonzero` elements.
    fn with_capacity(rows: usize, cols: usize, nonzero: usize) -> Self
    where
        Self: Sized;

    /// Store `value` at `(row, col)`. Positions arrive in row-major order.
    fn append(&mut self, row: usize, col: usize, value: f32);

    /// Called once after the last `append`.
    fn finalize(&mut self) {}
}
