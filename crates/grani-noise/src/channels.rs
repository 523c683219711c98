//! Standard noise-channel constructors.
//!
//! Each function returns the noise-only Kraus operators of a common
//! channel, suitable for registration via
//! [`NoiseModel::add_kraus_set`](crate::NoiseModel::add_kraus_set).
//! Channel parameters are probabilities and must lie in [0, 1].

use ndarray::array;
use ndarray::linalg::kron;
use num_complex::Complex64;

use crate::error::{NoiseError, NoiseResult};
use crate::model::SquareMatrix;

fn c(re: f64, im: f64) -> Complex64 {
    Complex64::new(re, im)
}

fn check_probability(p: f64) -> NoiseResult<()> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(NoiseError::InvalidProbability(p))
    }
}

/// Amplitude damping: energy relaxation to |0⟩ with probability `gamma`.
pub fn amplitude_damping(gamma: f64) -> NoiseResult<Vec<SquareMatrix>> {
    check_probability(gamma)?;
    Ok(vec![
        array![
            [c(1.0, 0.0), c(0.0, 0.0)],
            [c(0.0, 0.0), c((1.0 - gamma).sqrt(), 0.0)],
        ],
        array![
            [c(0.0, 0.0), c(gamma.sqrt(), 0.0)],
            [c(0.0, 0.0), c(0.0, 0.0)],
        ],
    ])
}

/// Amplitude excitation: spontaneous |0⟩ → |1⟩ with probability `gamma`.
pub fn amplitude_excitation(gamma: f64) -> NoiseResult<Vec<SquareMatrix>> {
    check_probability(gamma)?;
    Ok(vec![
        array![
            [c((1.0 - gamma).sqrt(), 0.0), c(0.0, 0.0)],
            [c(0.0, 0.0), c(1.0, 0.0)],
        ],
        array![
            [c(0.0, 0.0), c(0.0, 0.0)],
            [c(gamma.sqrt(), 0.0), c(0.0, 0.0)],
        ],
    ])
}

/// Bit flip: |0⟩ ↔ |1⟩ with probability `p`.
pub fn bit_flip(p: f64) -> NoiseResult<Vec<SquareMatrix>> {
    check_probability(p)?;
    let keep = (1.0 - p).sqrt();
    let flip = p.sqrt();
    Ok(vec![
        array![[c(keep, 0.0), c(0.0, 0.0)], [c(0.0, 0.0), c(keep, 0.0)]],
        array![[c(0.0, 0.0), c(flip, 0.0)], [c(flip, 0.0), c(0.0, 0.0)]],
    ])
}

/// Dephasing (phase damping): coherence loss without population change.
pub fn dephasing(gamma: f64) -> NoiseResult<Vec<SquareMatrix>> {
    check_probability(gamma)?;
    Ok(vec![
        array![
            [c(1.0, 0.0), c(0.0, 0.0)],
            [c(0.0, 0.0), c((1.0 - gamma).sqrt(), 0.0)],
        ],
        array![
            [c(0.0, 0.0), c(0.0, 0.0)],
            [c(0.0, 0.0), c(gamma.sqrt(), 0.0)],
        ],
    ])
}

/// Two-qubit dephasing acting on the target (second) qubit only, as in
/// a CZ gate whose target dephases while the control is unaffected.
pub fn dephasing_2q_target(gamma: f64) -> NoiseResult<Vec<SquareMatrix>> {
    lift_to_2q(&dephasing(gamma)?, 1)
}

/// Lift single-qubit Kraus operators into a two-qubit system where only
/// `target_qubit` (0 or 1) experiences the noise.
pub fn lift_to_2q(
    single_qubit_kraus: &[SquareMatrix],
    target_qubit: usize,
) -> NoiseResult<Vec<SquareMatrix>> {
    if target_qubit > 1 {
        return Err(NoiseError::InvalidConfig(format!(
            "target_qubit must be 0 or 1, got {target_qubit}"
        )));
    }
    if single_qubit_kraus.is_empty() {
        return Err(NoiseError::InvalidConfig(
            "cannot lift an empty Kraus set".into(),
        ));
    }
    for op in single_qubit_kraus {
        if op.dim() != (2, 2) {
            return Err(NoiseError::InvalidConfig(format!(
                "expected 2x2 Kraus operators, got {:?}",
                op.dim()
            )));
        }
    }

    let eye = SquareMatrix::eye(2);
    Ok(single_qubit_kraus
        .iter()
        .map(|op| {
            if target_qubit == 0 {
                kron(op, &eye)
            } else {
                kron(&eye, op)
            }
        })
        .collect())
}
