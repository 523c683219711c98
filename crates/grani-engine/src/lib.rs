//! Noise-augmented program execution.
//!
//! Ties the other Grani crates together: a parsed
//! [`Program`](grani_qir::program::Program) is executed shot by shot
//! under a [`NoiseModel`](grani_noise::NoiseModel), with quantum state
//! evolved by a pluggable [`StateBackend`] (a dense [`StateVector`]
//! implementation is bundled).
//!
//! ```no_run
//! use grani_noise::default_model;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let source = std::fs::read_to_string("program.ll")?;
//! let program = grani_qir::parser::parse(&source)?;
//! let model = default_model();
//!
//! for outcome in grani_engine::run(&program, &model, 100, 42)? {
//!     println!("{outcome}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod engine;
pub mod error;
pub mod statevector;

pub use backend::StateBackend;
pub use engine::{run, SimulationEngine, LOSS_LABEL};
pub use error::{BackendError, EngineError, EngineResult};
pub use statevector::StateVector;
