//! Property-based tests for the noise model and operator cache.

use grani_noise::channels::{amplitude_damping, bit_flip, dephasing};
use grani_noise::{default_model, rz_matrix, RotationCache, SquareMatrix};
use proptest::prelude::*;

/// Σ K†K = I for a trace-preserving channel.
fn is_trace_preserving(kraus: &[SquareMatrix]) -> bool {
    let dim = kraus[0].dim().0;
    let mut sum = SquareMatrix::zeros((dim, dim));
    for k in kraus {
        let k_dag = k.t().mapv(|v| v.conj());
        sum = sum + k_dag.dot(k);
    }
    let eye = SquareMatrix::eye(dim);
    sum.iter().zip(eye.iter()).all(|(a, b)| (a - b).norm() < 1e-12)
}

proptest! {
    /// Standard channels are trace preserving across their whole
    /// parameter range.
    #[test]
    fn test_channels_are_trace_preserving(p in 0.0..=1.0_f64) {
        prop_assert!(is_trace_preserving(&amplitude_damping(p).unwrap()));
        prop_assert!(is_trace_preserving(&bit_flip(p).unwrap()));
        prop_assert!(is_trace_preserving(&dephasing(p).unwrap()));
    }

    /// The z-rotation is unitary: Rz(θ)·Rz(−θ) = I.
    #[test]
    fn test_rotation_is_unitary(theta in -100.0..100.0_f64) {
        let product = rz_matrix(theta).dot(&rz_matrix(-theta));
        let eye = SquareMatrix::eye(2);
        for (a, b) in product.iter().zip(eye.iter()) {
            prop_assert!((a - b).norm() < 1e-12);
        }
    }

    /// The revision counter advances exactly once per successful
    /// mutating call, whatever the call sequence.
    #[test]
    fn test_revision_counts_mutations(losses in prop::collection::vec(0.0..=1.0_f64, 1..20)) {
        let mut model = default_model();
        let before = model.revision();
        for &loss in &losses {
            model.update_gate_loss("h", loss).unwrap();
        }
        prop_assert_eq!(model.revision(), before + losses.len() as u64);
    }

    /// The rotation cache never exceeds its capacity and repeated
    /// lookups of the same angle return the same operators.
    #[test]
    fn test_rotation_cache_bounded_and_consistent(
        capacity in 1_usize..=16,
        angles in prop::collection::vec(-10.0..10.0_f64, 1..64),
    ) {
        let model = default_model();
        let mut cache = RotationCache::new(capacity);

        for &angle in &angles {
            let first = cache.operators(&model, angle).unwrap().to_vec();
            let second = cache.operators(&model, angle).unwrap().to_vec();
            prop_assert_eq!(first, second);
            prop_assert!(cache.len() <= capacity);
        }
    }
}
