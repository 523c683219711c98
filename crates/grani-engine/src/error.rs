//! Error types for the execution engine.

use thiserror::Error;

/// Errors raised by a state-evolution backend.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BackendError {
    /// A qubit operand exceeds the allocated register.
    #[error("qubit {0} is out of bounds for the allocated state")]
    QubitOutOfBounds(u32),

    /// Operator dimension does not match the number of target qubits.
    #[error("operator of dimension {dimension} cannot act on {qubits} qubit(s)")]
    DimensionMismatch {
        /// Row count of the supplied operator.
        dimension: usize,
        /// Number of target qubits.
        qubits: usize,
    },

    /// The same qubit appears twice in an operand list.
    #[error("duplicate qubit operand {0}")]
    DuplicateQubit(u32),

    /// Every operator choice has (numerically) zero probability.
    #[error("all operator choices have zero probability")]
    ProbabilityZeroEvent,

    /// An external backend failed for its own reasons.
    #[error("backend failure: {0}")]
    External(String),
}

/// Errors raised while executing a program.
///
/// All variants are fatal for the whole `run` call: a parse-level or
/// configuration mismatch recurs identically on every shot, so nothing
/// is retried and no partial results are returned.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    /// An instruction name resolves to neither a known gate nor a known
    /// instrument.
    #[error("unsupported operation '{0}': not a configured gate or instrument")]
    UnsupportedOperation(String),

    /// A result-record marker read a result index that no measurement
    /// had written.
    #[error("result {0} was recorded for output before any measurement wrote it")]
    UnrecordedResult(u32),

    /// The noise model could not be compiled.
    #[error(transparent)]
    Noise(#[from] grani_noise::NoiseError),

    /// The state-evolution backend failed.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
