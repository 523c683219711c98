//! Noise model registry and compiled operator cache.
//!
//! This crate holds the declarative side of noisy simulation:
//!
//! - [`NoiseModel`] — a mutable, revisioned registry of named Kraus
//!   sets, per-gate (unitary, noise, loss-probability) entries, and
//!   ordered instrument choices. Caller-owned and reused across runs.
//! - [`CompiledOperators`] — the simulation-ready operator table
//!   derived from a model snapshot by post-composing each entry's noise
//!   set onto its ideal operator.
//! - [`RotationCache`] — a bounded LRU for continuously-parameterized
//!   rotations, keyed on `(revision, angle)` so stale entries can never
//!   be matched after the model mutates.
//! - [`channels`] — constructors for common noise channels.
//!
//! Models persist as JSON (see [`NoiseModel::save_config`]); matrices
//! are stored as row-major `[re, im]` pairs.

pub mod channels;
pub mod compiled;
mod config;
pub mod error;
pub mod model;

pub use compiled::{
    CompiledChoice, CompiledOperators, RotationCache, ROTATION_CACHE_CAPACITY, ROTATION_GATE,
};
pub use error::{NoiseError, NoiseResult};
pub use model::{
    apply_unitary_to_kraus, default_model, identity_1q, rz_matrix, GateEntry, InstrumentChoice,
    NoiseModel, SquareMatrix,
};
