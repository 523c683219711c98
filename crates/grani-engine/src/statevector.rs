//! Reference dense state-vector backend.
//!
//! Holds the full 2^n amplitude vector and implements the
//! [`StateBackend`] capability directly: operator application gathers
//! and scatters amplitudes over the target qubits, stochastic Kraus
//! channels and instruments are sampled by comparing each candidate's
//! squared norm against a uniform draw, and the state is renormalized
//! after every collapse.

use ndarray::Array1;
use num_complex::Complex64;
use rand::{rngs::StdRng, Rng, SeedableRng};

use grani_noise::{CompiledChoice, SquareMatrix};

use crate::backend::StateBackend;
use crate::error::BackendError;

/// Numerical floor below which a probability is treated as zero.
const TOLERANCE: f64 = 1e-12;

/// A dense state-vector simulation of `qubit_count` qubits.
pub struct StateVector {
    qubit_count: u32,
    data: Array1<Complex64>,
    rng: StdRng,
}

impl StateVector {
    /// Allocate the all-zeros state |0...0⟩ with a seeded RNG.
    pub fn new(qubit_count: u32, seed: u64) -> Self {
        let dimension = 1_usize << qubit_count;
        let mut data = Array1::zeros(dimension);
        data[0] = Complex64::new(1.0, 0.0);
        Self {
            qubit_count,
            data,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Number of qubits in the system.
    pub fn qubit_count(&self) -> u32 {
        self.qubit_count
    }

    /// The raw amplitude vector.
    pub fn data(&self) -> &Array1<Complex64> {
        &self.data
    }

    /// Probability of observing `qubit` in |1⟩.
    pub fn probability_of_one(&self, qubit: u32) -> f64 {
        let mask = 1_usize << qubit;
        self.data
            .iter()
            .enumerate()
            .filter(|(index, _)| index & mask != 0)
            .map(|(_, amp)| amp.norm_sqr())
            .sum()
    }

    fn norm_squared(&self) -> f64 {
        self.data.iter().map(Complex64::norm_sqr).sum()
    }

    fn check_qubits(&self, qubits: &[u32]) -> Result<(), BackendError> {
        let mut seen = 0_usize;
        for &q in qubits {
            if q >= self.qubit_count {
                return Err(BackendError::QubitOutOfBounds(q));
            }
            let mask = 1_usize << q;
            if seen & mask != 0 {
                return Err(BackendError::DuplicateQubit(q));
            }
            seen |= mask;
        }
        Ok(())
    }

    /// Squared norm of `operator` applied to the current state, i.e.
    /// the unnormalized probability of that operator's effect.
    fn effect_norm_squared(
        &self,
        operator: &SquareMatrix,
        qubits: &[u32],
    ) -> Result<f64, BackendError> {
        let mut copy = self.data.clone();
        apply_kernel(&mut copy, operator, qubits)?;
        Ok(copy.iter().map(Complex64::norm_sqr).sum())
    }

    fn renormalize(&mut self) -> Result<(), BackendError> {
        let norm_squared = self.norm_squared();
        if norm_squared < TOLERANCE {
            return Err(BackendError::ProbabilityZeroEvent);
        }
        let factor = Complex64::new(1.0 / norm_squared.sqrt(), 0.0);
        self.data.mapv_inplace(|amp| amp * factor);
        Ok(())
    }

    /// Select one Kraus operator with probability proportional to its
    /// squared norm on the current state, apply it, and renormalize.
    fn sample_kraus_operators(
        &mut self,
        operators: &[SquareMatrix],
        qubits: &[u32],
    ) -> Result<(), BackendError> {
        let weights = operators
            .iter()
            .map(|op| self.effect_norm_squared(op, qubits))
            .collect::<Result<Vec<_>, _>>()?;
        let total: f64 = weights.iter().sum();
        if total < TOLERANCE {
            return Err(BackendError::ProbabilityZeroEvent);
        }

        let draw = self.rng.gen::<f64>() * total;
        let chosen = select_weighted(&weights, draw).ok_or(BackendError::ProbabilityZeroEvent)?;

        apply_kernel(&mut self.data, &operators[chosen], qubits)?;
        self.renormalize()
    }
}

impl StateBackend for StateVector {
    fn apply_operator(
        &mut self,
        operators: &[SquareMatrix],
        qubits: &[u32],
    ) -> Result<(), BackendError> {
        self.check_qubits(qubits)?;
        match operators {
            [] => Ok(()),
            [unitary] => {
                apply_kernel(&mut self.data, unitary, qubits)?;
                self.renormalize()
            }
            _ => self.sample_kraus_operators(operators, qubits),
        }
    }

    fn sample_and_collapse(
        &mut self,
        choices: &[CompiledChoice],
        qubit: u32,
    ) -> Result<usize, BackendError> {
        let qubits = [qubit];
        self.check_qubits(&qubits)?;

        let mut weights = Vec::with_capacity(choices.len());
        for choice in choices {
            let mut weight = 0.0;
            for operator in &choice.operators {
                weight += self.effect_norm_squared(operator, &qubits)?;
            }
            weights.push(weight);
        }
        let total: f64 = weights.iter().sum();
        if total < TOLERANCE {
            return Err(BackendError::ProbabilityZeroEvent);
        }

        let draw = self.rng.gen::<f64>() * total;
        let chosen = select_weighted(&weights, draw).ok_or(BackendError::ProbabilityZeroEvent)?;

        self.sample_kraus_operators(&choices[chosen].operators, &qubits)?;
        Ok(chosen)
    }
}

/// Walk cumulative `weights` and return the index covering `draw`,
/// skipping numerically-zero entries and falling back to the last
/// non-zero weight when rounding pushes `draw` past the total.
fn select_weighted(weights: &[f64], draw: f64) -> Option<usize> {
    let mut cumulative = 0.0;
    let mut last_non_zero = None;
    for (index, &weight) in weights.iter().enumerate() {
        if weight < TOLERANCE {
            continue;
        }
        last_non_zero = Some(index);
        cumulative += weight;
        if draw < cumulative {
            return Some(index);
        }
    }
    last_non_zero
}

/// Apply a k-qubit operator to the amplitude vector in place.
///
/// `qubits[0]` addresses the most significant bit of the operator's
/// basis index (so a CX matrix with the control first acts with
/// `qubits = [control, target]`); qubit `q` occupies bit `q` of the
/// state index.
fn apply_kernel(
    data: &mut Array1<Complex64>,
    operator: &SquareMatrix,
    qubits: &[u32],
) -> Result<(), BackendError> {
    let k = qubits.len();
    let block = 1_usize << k;
    if operator.dim() != (block, block) {
        return Err(BackendError::DimensionMismatch {
            dimension: operator.dim().0,
            qubits: k,
        });
    }

    let masks: Vec<usize> = qubits.iter().map(|&q| 1_usize << q).collect();
    let combined: usize = masks.iter().sum();
    let mut gathered = vec![Complex64::new(0.0, 0.0); block];

    for base in 0..data.len() {
        if base & combined != 0 {
            continue;
        }
        for (m, slot) in gathered.iter_mut().enumerate() {
            *slot = data[scatter_index(base, &masks, m, k)];
        }
        for row in 0..block {
            let mut acc = Complex64::new(0.0, 0.0);
            for (col, &amp) in gathered.iter().enumerate() {
                acc += operator[(row, col)] * amp;
            }
            data[scatter_index(base, &masks, row, k)] = acc;
        }
    }
    Ok(())
}

/// Expand an operator-basis index into a full state index over `base`.
fn scatter_index(base: usize, masks: &[usize], operator_index: usize, k: usize) -> usize {
    let mut index = base;
    for (j, &mask) in masks.iter().enumerate() {
        if operator_index & (1 << (k - 1 - j)) != 0 {
            index |= mask;
        }
    }
    index
}
