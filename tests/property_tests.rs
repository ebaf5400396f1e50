//! Property-based tests for sparse compression.
//!
//! These tests verify invariants that must hold for all inputs, using
//! proptest to generate random sparse vectors and matrices.

use proptest::prelude::*;
use sparsepack::{
    CompressedMatrix, CompressedVector, CompressionError, SparseCompressor, SparseMatrix,
    SparseVector, MAX_DIMENSION,
};

fn finite_value() -> impl Strategy<Value = f32> {
    -1.0e6f32..1.0e6f32
}

/// Generate a sparse vector with sorted, unique positions.
fn sparse_vector(max_len: usize, max_size: usize) -> impl Strategy<Value = CompressedVector> {
    (1..=max_size).prop_flat_map(move |size| {
        let len = max_len.min(size);
        proptest::collection::btree_map(0..size, finite_value(), 0..=len).prop_map(move |map| {
            CompressedVector::from_pairs(size, map).expect("btree keys are sorted and in range")
        })
    })
}

/// Generate dense runs (consecutive positions, the zero-bit index case).
fn dense_vector(max_len: usize) -> impl Strategy<Value = CompressedVector> {
    (0..10_000usize, 1..=max_len, proptest::collection::vec(finite_value(), 1..=max_len))
        .prop_map(|(start, len, values)| {
            let len = len.min(values.len());
            let size = start + len + 1000;
            let pairs = (start..start + len).zip(values);
            CompressedVector::from_pairs(size, pairs).expect("consecutive positions")
        })
}

/// Generate a sparse matrix with row-major unique positions.
fn sparse_matrix(max_dim: usize, max_len: usize) -> impl Strategy<Value = CompressedMatrix> {
    (1..=max_dim, 1..=max_dim).prop_flat_map(move |(rows, cols)| {
        let len = max_len.min(rows * cols);
        proptest::collection::btree_map((0..rows, 0..cols), finite_value(), 0..=len).prop_map(
            move |map| {
                let triplets = map.into_iter().map(|((r, c), v)| (r, c, v));
                CompressedMatrix::from_triplets(rows, cols, triplets)
                    .expect("btree keys are row-major and in range")
            },
        )
    })
}

fn precision() -> impl Strategy<Value = u32> {
    prop_oneof![Just(0u32), Just(32u32), 2u32..32]
}

fn value_range(values: &[f32]) -> (f32, f32) {
    values
        .iter()
        .fold((f32::MAX, f32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

fn assert_within_bound(
    decoded: &[f32],
    original: &[f32],
    precision: u32,
) -> Result<(), TestCaseError> {
    prop_assert_eq!(decoded.len(), original.len());
    if precision == 0 || precision == 32 {
        for (d, o) in decoded.iter().zip(original) {
            prop_assert_eq!(d.to_bits(), o.to_bits());
        }
        return Ok(());
    }

    let (min, max) = value_range(original);
    let step = (f64::from(max) - f64::from(min)) / ((1u64 << precision) - 1) as f64;
    // f32 rounding of the reconstructed value on top of the quantization step.
    let slack = f64::from(max.abs().max(min.abs())) * 1e-6 + 1e-6;
    for (d, o) in decoded.iter().zip(original) {
        let err = (f64::from(*d) - f64::from(*o)).abs();
        prop_assert!(
            err <= step + slack,
            "error {} exceeds bound {} at precision {}",
            err,
            step + slack,
            precision
        );
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    // =======================================================================
    // ROUNDTRIP: positions always exact, values within the precision bound
    // =======================================================================

    #[test]
    fn roundtrip_random_vectors(vector in sparse_vector(200, 5000), p in precision()) {
        let compressor = SparseCompressor::new();

        let archive = compressor.compress_vector(&vector, p)
            .expect("compression should succeed for valid input");
        prop_assert!(archive.is_valid);
        prop_assert_eq!(archive.nonzero, vector.nonzero());
        prop_assert_eq!(archive.size, vector.len());

        let restored: CompressedVector = compressor.decompress_vector(&archive)
            .expect("decompression should succeed for valid archive");

        prop_assert_eq!(restored.len(), vector.len());
        prop_assert_eq!(restored.indexes(), vector.indexes());
        assert_within_bound(restored.values(), vector.values(), p)?;
    }

    #[test]
    fn roundtrip_dense_vectors(vector in dense_vector(300), p in precision()) {
        let compressor = SparseCompressor::new();

        let archive = compressor.compress_vector(&vector, p)?;
        // A run starting at 0 has all-zero deltas and no bit body.
        prop_assert_eq!(archive.indexes[0] == 0, vector.indexes()[0] == 0);
        let restored: CompressedVector = compressor.decompress_vector(&archive)?;

        prop_assert_eq!(restored.indexes(), vector.indexes());
        assert_within_bound(restored.values(), vector.values(), p)?;
    }

    #[test]
    fn roundtrip_matrices(matrix in sparse_matrix(60, 300), p in precision()) {
        let compressor = SparseCompressor::new();

        let archive = compressor.compress_matrix(&matrix, p)?;
        let restored: CompressedMatrix = compressor.decompress_matrix(&archive)?;

        let original: Vec<_> = matrix.iter().collect();
        let decoded: Vec<_> = restored.iter().collect();
        let positions = |t: &[(usize, usize, f32)]| {
            t.iter().map(|&(r, c, _)| (r, c)).collect::<Vec<_>>()
        };
        let values = |t: &[(usize, usize, f32)]| {
            t.iter().map(|&(_, _, v)| v).collect::<Vec<_>>()
        };

        prop_assert_eq!(positions(&decoded), positions(&original));
        assert_within_bound(&values(&decoded), &values(&original), p)?;
    }

    // =======================================================================
    // SIZE: lowering precision never grows the value payload
    // =======================================================================

    #[test]
    fn value_size_monotone_in_precision(vector in sparse_vector(200, 2000)) {
        let compressor = SparseCompressor::new();

        let mut previous = usize::MAX;
        for p in (2u32..=32).rev() {
            let archive = compressor.compress_vector(&vector, p)?;
            prop_assert!(
                archive.values.len() <= previous,
                "precision {} produced {} bytes, more than {} at precision {}",
                p, archive.values.len(), previous, p + 1
            );
            previous = archive.values.len();
        }
    }

    #[test]
    fn index_payload_independent_of_precision(
        vector in sparse_vector(100, 2000),
        p in precision(),
    ) {
        let compressor = SparseCompressor::new();
        let lossless = compressor.compress_vector(&vector, 0)?;
        let other = compressor.compress_vector(&vector, p)?;
        prop_assert_eq!(lossless.indexes, other.indexes);
    }

    // =======================================================================
    // EDGE CASES
    // =======================================================================

    #[test]
    fn empty_vector_roundtrip(size in 0usize..1_000_000, p in precision()) {
        let compressor = SparseCompressor::new();
        let vector = CompressedVector::new(size);

        let archive = compressor.compress_vector(&vector, p)?;
        prop_assert!(archive.is_valid);
        prop_assert_eq!(archive.indexes.len(), 1);
        prop_assert_eq!(archive.values.len(), 1);

        let restored: CompressedVector = compressor.decompress_vector(&archive)?;
        prop_assert_eq!(restored.len(), size);
        prop_assert_eq!(restored.nonzero(), 0);
    }

    #[test]
    fn uniform_values_roundtrip_exactly(
        positions in proptest::collection::btree_set(0usize..10_000, 1..100),
        value in finite_value(),
        p in 2u32..32,
    ) {
        let compressor = SparseCompressor::new();
        let vector = CompressedVector::from_pairs(10_000, positions.into_iter().map(|i| (i, value)))
            .expect("sorted positions");

        let archive = compressor.compress_vector(&vector, p)?;
        let restored: CompressedVector = compressor.decompress_vector(&archive)?;

        prop_assert_eq!(restored, vector);
    }

    // =======================================================================
    // CORRUPTION
    // =======================================================================

    #[test]
    fn truncated_values_detected(vector in sparse_vector(200, 5000), p in precision()) {
        prop_assume!(vector.nonzero() > 0);
        let compressor = SparseCompressor::new();

        let mut archive = compressor.compress_vector(&vector, p)?;
        archive.values.pop();

        let result: Result<CompressedVector, _> = compressor.decompress_vector(&archive);
        prop_assert!(
            matches!(result, Err(CompressionError::CorruptStream(_))),
            "truncated payload must not decode"
        );
    }

    #[test]
    fn truncated_indexes_detected(vector in sparse_vector(200, 5000)) {
        prop_assume!(vector.nonzero() > 0);
        let compressor = SparseCompressor::new();

        let mut archive = compressor.compress_vector(&vector, 0)?;
        archive.indexes.pop();

        let result: Result<CompressedVector, _> = compressor.decompress_vector(&archive);
        prop_assert!(matches!(result, Err(CompressionError::CorruptStream(_))));
    }

    #[test]
    fn inflated_nonzero_detected(vector in sparse_vector(200, 5000), extra in 1usize..1000) {
        let compressor = SparseCompressor::new();

        let mut archive = compressor.compress_vector(&vector, 0)?;
        archive.nonzero = archive.size + extra;

        let result: Result<CompressedVector, _> = compressor.decompress_vector(&archive);
        prop_assert!(matches!(result, Err(CompressionError::CorruptStream(_))));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn oversized_vector_archive_detected(
        vector in sparse_vector(200, 5000),
        extra in 1u64..(1 << 40),
    ) {
        let compressor = SparseCompressor::new();

        let mut archive = compressor.compress_vector(&vector, 0)?;
        archive.size = (MAX_DIMENSION + extra) as usize;

        let result: Result<CompressedVector, _> = compressor.decompress_vector(&archive);
        prop_assert!(matches!(result, Err(CompressionError::CorruptStream(_))));
    }

    #[test]
    fn truncated_matrix_payloads_detected(matrix in sparse_matrix(60, 300), p in precision()) {
        prop_assume!(matrix.nonzero() > 0);
        let compressor = SparseCompressor::new();
        let archive = compressor.compress_matrix(&matrix, p)?;

        let mut short_values = archive.clone();
        short_values.values.pop();
        let result: Result<CompressedMatrix, _> = compressor.decompress_matrix(&short_values);
        prop_assert!(matches!(result, Err(CompressionError::CorruptStream(_))));

        let mut short_indexes = archive;
        short_indexes.indexes.pop();
        let result: Result<CompressedMatrix, _> = compressor.decompress_matrix(&short_indexes);
        prop_assert!(matches!(result, Err(CompressionError::CorruptStream(_))));
    }

    #[test]
    fn zero_width_matrix_with_nonzeros_detected(matrix in sparse_matrix(60, 300)) {
        prop_assume!(matrix.nonzero() > 0);
        let compressor = SparseCompressor::new();

        let mut archive = compressor.compress_matrix(&matrix, 0)?;
        archive.cols_number = 0;

        let result: Result<CompressedMatrix, _> = compressor.decompress_matrix(&archive);
        prop_assert!(matches!(result, Err(CompressionError::CorruptStream(_))));
    }

    // =======================================================================
    // ERROR CASES
    // =======================================================================

    #[test]
    fn rejects_out_of_domain_precision(p in 33u32..1000, vector in sparse_vector(20, 100)) {
        let compressor = SparseCompressor::new();
        prop_assert!(matches!(
            compressor.compress_vector(&vector, p),
            Err(CompressionError::InvalidValue(_))
        ));
        prop_assert!(matches!(
            compressor.compress_vector(&vector, 1),
            Err(CompressionError::InvalidValue(_))
        ));
    }

    // =======================================================================
    // DETERMINISM
    // =======================================================================

    #[test]
    fn compression_is_deterministic(vector in sparse_vector(100, 5000), p in precision()) {
        let compressor = SparseCompressor::new();

        let first = compressor.compress_vector(&vector, p)?;
        let second = compressor.compress_vector(&vector, p)?;

        prop_assert_eq!(first, second, "compression must be deterministic");
    }
}

// =======================================================================
// CONCRETE SCENARIOS
// =======================================================================

#[test]
fn example_vector_precision_8_and_0() {
    let compressor = SparseCompressor::new();
    let vector = CompressedVector::from_pairs(8, [(0, 1.0), (3, -2.5), (7, 4.0)]).unwrap();

    let archive = compressor.compress_vector(&vector, 8).unwrap();
    assert_eq!(archive.nonzero, 3);
    assert_eq!(archive.indexes[0], 2, "deltas [0, 2, 3] need 2 bits");
    let restored: CompressedVector = compressor.decompress_vector(&archive).unwrap();
    assert_eq!(restored.indexes(), &[0, 3, 7]);
    for (d, o) in restored.values().iter().zip(vector.values()) {
        assert!((d - o).abs() <= 6.5 / 255.0);
    }

    let archive = compressor.compress_vector(&vector, 0).unwrap();
    let restored: CompressedVector = compressor.decompress_vector(&archive).unwrap();
    assert_eq!(restored.values(), &[1.0, -2.5, 4.0]);
}

#[test]
fn compression_ratio_improves_with_density() {
    let compressor = SparseCompressor::new();
    let values = |n: usize| (0..n).map(|i| (i % 17) as f32);

    // Very sparse: gaps of 1000 need 10 bits per position
    let positions = (0..1000).map(|i| i * 1000);
    let sparse = CompressedVector::from_pairs(1_000_000, positions.zip(values(1000))).unwrap();
    // Dense: consecutive positions need 0 bits per position
    let dense = CompressedVector::from_pairs(1_000_000, (0..1000).zip(values(1000))).unwrap();

    let sparse_archive = compressor.compress_vector(&sparse, 8).unwrap();
    let dense_archive = compressor.compress_vector(&dense, 8).unwrap();

    assert!(
        dense_archive.ratio() > sparse_archive.ratio(),
        "dense {} should beat sparse {}",
        dense_archive.ratio(),
        sparse_archive.ratio()
    );
    assert_eq!(dense_archive.indexes.len(), 1);

    println!("Dense: {:.2}x", dense_archive.ratio());
    println!("Sparse (gap=1000): {:.2}x", sparse_archive.ratio());
}

#[test]
fn compressor_is_shareable_across_threads() {
    let compressor = SparseCompressor::new();
    let handles: Vec<_> = (0..4)
        .map(|t| {
            std::thread::spawn(move || {
                let pairs = (0..500).map(|i| (i * (t + 2), i as f32 / (t + 1) as f32));
                let vector = CompressedVector::from_pairs(5000, pairs).unwrap();
                let archive = compressor.compress_vector(&vector, 12).unwrap();
                let restored: CompressedVector = compressor.decompress_vector(&archive).unwrap();
                assert_eq!(restored.indexes(), vector.indexes());
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}
