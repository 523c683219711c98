//! State-evolution capability consumed by the engine.
//!
//! The engine never manipulates quantum state directly — it drives an
//! injected backend through this trait. One backend instance is created
//! per shot from a factory `FnMut(qubit_count, seed) -> B`, so shots
//! stay independent and trivially parallelizable by the caller. The
//! seed is derived deterministically from the run's base seed and the
//! shot index, making a run a pure function of its inputs.

use grani_noise::{CompiledChoice, SquareMatrix};

use crate::error::BackendError;

/// A per-shot quantum state that operators can be applied to.
pub trait StateBackend {
    /// Apply an operator to the given qubits, in operand order.
    ///
    /// A single-element set is the deterministic unitary case; a larger
    /// set is a stochastic Kraus channel and the backend selects one
    /// operator with probability proportional to its effect on the
    /// current state.
    fn apply_operator(
        &mut self,
        operators: &[SquareMatrix],
        qubits: &[u32],
    ) -> Result<(), BackendError>;

    /// Sample one instrument choice for `qubit`, weighted by the Born
    /// rule on the current state, collapse the state accordingly, and
    /// return the index of the chosen entry.
    fn sample_and_collapse(
        &mut self,
        choices: &[CompiledChoice],
        qubit: u32,
    ) -> Result<usize, BackendError>;
}
