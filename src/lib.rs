//! Sparse vector and matrix compression.
//!
//! `sparsepack` turns a sparse `f32` container (nonzero values plus their
//! positions) into two compact byte payloads and back:
//!
//! - **Positions** are strictly increasing, so they are stored as gaps minus
//!   one, bit-packed at the width of the widest gap.
//! - **Values** are stored raw (lossless) or linearly quantized to between 2
//!   and 31 bits over their `[min, max]` range.
//!
//! Matrices are flattened row-major (`row * cols + col`) and go through the
//! same two codecs as vectors.
//!
//! # Precision
//!
//! | precision | storage per value | decoded error                    |
//! |-----------|-------------------|----------------------------------|
//! | `0`, `32` | 32 bits, raw      | none, bit-exact                  |
//! | `2..=31`  | `precision` bits  | at most `(max - min) / (2^p - 1)` |
//!
//! Any other precision is rejected with [`CompressionError::InvalidValue`].
//!
//! # Historical Context
//!
//! Gap coding of sorted positions is as old as inverted indexes: Elias (1974)
//! and Fano (1971) exploited monotonicity to store sorted integers near their
//! information-theoretic size, and frame-of-reference packing (Goldstein et
//! al., 1998) fixed the width per block to the largest gap for fast decoding.
//! Uniform scalar quantization of weights became the default knob for model
//! compression once networks outgrew their memory budgets (Han et al., 2016).
//!
//! # Example
//!
//! ```rust
//! use sparsepack::{CompressedMatrix, SparseCompressor};
//!
//! let compressor = SparseCompressor::new();
//! let matrix = CompressedMatrix::from_triplets(
//!     3,
//!     4,
//!     [(0, 1, 0.5), (1, 3, -1.25), (2, 0, 8.0)],
//! )
//! .unwrap();
//!
//! // Lossless
//! let archive = compressor.compress_matrix(&matrix, 0).unwrap();
//! let restored: CompressedMatrix = compressor.decompress_matrix(&archive).unwrap();
//! assert_eq!(restored, matrix);
//! ```
//!
//! # References
//!
//! - Elias, P. (1974). "Efficient storage and retrieval by content and address of static files"
//! - Fano, R. (1971). "On the number of bits required to implement an associative memory"
//! - Goldstein, J., Ramakrishnan, R., Shaft, U. (1998). "Compressing relations and indexes"
//! - Han, S., Mao, H., Dally, W. (2016). "Deep Compression"

#![warn(missing_docs)]
#![warn(clippy::all)]

mod archive;
pub mod bits;
mod compressor;
mod error;
pub mod index;
mod sparse;
mod traits;
pub mod value;

pub use archive::{ArchivedMatrix, ArchivedVector};
pub use compressor::{SparseCompressor, MAX_DIMENSION};
pub use error::CompressionError;
pub use sparse::{CompressedMatrix, CompressedVector};
pub use traits::{SparseMatrix, SparseVector};
pub use value::Precision;
