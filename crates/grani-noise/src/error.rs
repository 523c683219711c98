//! Error types for the noise model.

use thiserror::Error;

/// Errors produced by noise-model configuration and operator compilation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NoiseError {
    /// A gate or instrument references a Kraus set that is not defined.
    ///
    /// Detected at compile time, not at registration time — the model
    /// is internally inconsistent and cannot be simulated.
    #[error("Kraus set '{set}' referenced by '{referenced_by}' is not defined in the noise model")]
    UnknownKrausSet {
        /// The missing set name.
        set: String,
        /// The gate or instrument that references it.
        referenced_by: String,
    },

    /// An update targets a gate that was never registered.
    #[error("gate '{0}' is not defined in the noise model")]
    UnknownGate(String),

    /// A channel parameter or loss probability is outside [0, 1].
    #[error("probability {0} is outside [0, 1]")]
    InvalidProbability(f64),

    /// A serialized noise model is structurally invalid.
    #[error("invalid noise model config: {0}")]
    InvalidConfig(String),

    /// Failed to read or write a config file.
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to serialize or deserialize a config.
    #[error("config serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for noise-model operations.
pub type NoiseResult<T> = Result<T, NoiseError>;
