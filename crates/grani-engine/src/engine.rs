//! Per-shot stochastic execution of parsed programs.
//!
//! [`SimulationEngine`] drives a [`Program`] against an injected
//! [`StateBackend`], one shot at a time. Each shot gets a fresh backend
//! instance and fresh classical state; the engine itself carries only
//! the compiled operator table (refreshed when the model's revision
//! moves) and the rotation cache, both of which are pure functions of
//! the model and therefore safe to reuse across shots.
//!
//! Qubit loss is rolled per gate operand from the model's per-gate loss
//! probability. A lost qubit is reset to the ground state once, then
//! excluded from every later gate, and measures as [`LOSS_LABEL`].

use ndarray::array;
use num_complex::Complex64;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rustc_hash::FxHashMap;
use tracing::debug;

use grani_noise::{
    CompiledOperators, NoiseError, NoiseModel, RotationCache, SquareMatrix, ROTATION_GATE,
};
use grani_qir::program::{Operand, Operation, Program, RecordKind};

use crate::backend::StateBackend;
use crate::error::{EngineError, EngineResult};

/// Reserved outcome label written when a lost qubit is measured.
///
/// Distinct from any instrument-declared label by convention; models
/// must not declare it as an outcome.
pub const LOSS_LABEL: &str = "LOSS";

/// Seed mixing constant (2^64 / φ, the golden-ratio multiplier).
const SEED_INCREMENT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Derive the per-shot seed from the run seed and the 1-based shot
/// index. Adjacent shots get well-separated RNG streams while the whole
/// run stays a pure function of `base_seed`.
fn shot_seed(base_seed: u64, shot_index: u32) -> u64 {
    base_seed.wrapping_add(u64::from(shot_index).wrapping_mul(SEED_INCREMENT))
}

/// Classical state accumulated during one shot, discarded at shot end.
struct ShotState {
    /// Sticky per-qubit loss flags.
    lost: Vec<bool>,
    /// Results written by measurements (or loss-sentinel writes),
    /// keyed by result identifier.
    results: FxHashMap<u32, String>,
    /// Outcome labels in result-record order.
    reported: Vec<String>,
}

impl ShotState {
    fn new(qubit_count: u32) -> Self {
        Self {
            lost: vec![false; qubit_count as usize],
            results: FxHashMap::default(),
            reported: Vec::new(),
        }
    }
}

/// Executes programs shot by shot against a caller-supplied backend.
///
/// The engine is reusable across programs and models: the compiled
/// operator table is recompiled whenever the supplied model's revision
/// differs from the table's, and rotation operators are memoized under
/// `(revision, angle)` keys so mutation can never serve stale entries.
pub struct SimulationEngine {
    compiled: Option<CompiledOperators>,
    rotations: RotationCache,
    /// Kraus pair forcing a qubit to |0⟩, applied at the moment of loss.
    reset: Vec<SquareMatrix>,
}

impl Default for SimulationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationEngine {
    /// Create an engine with an empty operator table and rotation cache.
    pub fn new() -> Self {
        let zero = Complex64::new(0.0, 0.0);
        let one = Complex64::new(1.0, 0.0);
        Self {
            compiled: None,
            rotations: RotationCache::default(),
            reset: vec![array![[one, zero], [zero, zero]], array![[zero, one], [zero, zero]]],
        }
    }

    /// Execute `shots` independent shots and collect one outcome string
    /// per shot.
    ///
    /// `factory` builds one backend per shot from `(qubit_count, seed)`.
    /// The first error aborts the whole run; no partial results are
    /// returned.
    pub fn run<B, F>(
        &mut self,
        program: &Program,
        model: &NoiseModel,
        shots: u32,
        base_seed: u64,
        mut factory: F,
    ) -> EngineResult<Vec<String>>
    where
        B: StateBackend,
        F: FnMut(u32, u64) -> B,
    {
        let mut outputs = Vec::with_capacity(shots as usize);
        for shot_index in 1..=shots {
            outputs.push(self.run_shot(program, model, base_seed, shot_index, &mut factory)?);
        }
        Ok(outputs)
    }

    /// Execute a single shot at an explicit 1-based `shot_index`.
    ///
    /// Shot `i` of a batched [`run`](Self::run) equals this call with
    /// the same `(base_seed, i)`, so callers may distribute shots
    /// themselves.
    pub fn run_shot<B, F>(
        &mut self,
        program: &Program,
        model: &NoiseModel,
        base_seed: u64,
        shot_index: u32,
        factory: &mut F,
    ) -> EngineResult<String>
    where
        B: StateBackend,
        F: FnMut(u32, u64) -> B,
    {
        let table = match self.compiled.take() {
            Some(table) if !table.is_stale(model) => table,
            _ => CompiledOperators::compile(model)?,
        };

        let outcome = execute(
            &table,
            &mut self.rotations,
            &self.reset,
            model,
            program,
            shot_seed(base_seed, shot_index),
            factory,
        );
        self.compiled = Some(table);

        debug!(shot_index, ok = outcome.is_ok(), "shot finished");
        outcome
    }
}

/// Run one shot against a fresh backend and assemble its outcome string.
fn execute<B, F>(
    table: &CompiledOperators,
    rotations: &mut RotationCache,
    reset: &[SquareMatrix],
    model: &NoiseModel,
    program: &Program,
    seed: u64,
    factory: &mut F,
) -> EngineResult<String>
where
    B: StateBackend,
    F: FnMut(u32, u64) -> B,
{
    let mut rng = StdRng::seed_from_u64(seed);
    let mut backend = factory(program.qubit_count(), rng.gen());
    let mut state = ShotState::new(program.qubit_count());

    for operation in program.operations() {
        match operation {
            Operation::NoOp { .. } => {}

            Operation::Gate { name, args, qubits } if name == ROTATION_GATE => {
                let (&[qubit], &[angle]) = (qubits.as_slice(), args.as_slice()) else {
                    return Err(EngineError::UnsupportedOperation(name.clone()));
                };
                maybe_lose(&mut rng, model, name, qubits, &mut state, &mut backend, reset)?;
                if state.lost[qubit as usize] {
                    continue;
                }
                let operators = rotations.operators(model, angle).map_err(|err| match err {
                    NoiseError::UnknownGate(gate) => EngineError::UnsupportedOperation(gate),
                    other => EngineError::Noise(other),
                })?;
                backend.apply_operator(operators, &[qubit])?;
            }

            Operation::Gate { name, args: _, qubits } => {
                let Some(operators) = table.gate(name) else {
                    return Err(EngineError::UnsupportedOperation(name.clone()));
                };
                maybe_lose(&mut rng, model, name, qubits, &mut state, &mut backend, reset)?;
                // A multi-qubit gate with any lost participant is
                // suppressed entirely.
                if qubits.iter().any(|&q| state.lost[q as usize]) {
                    continue;
                }
                backend.apply_operator(operators, qubits)?;
            }

            Operation::Measurement { name, qubit, result } => {
                if state.lost[*qubit as usize] {
                    state.results.insert(*result, LOSS_LABEL.to_owned());
                    continue;
                }
                let Some(choices) = table.instrument(name) else {
                    return Err(EngineError::UnsupportedOperation(name.clone()));
                };
                let chosen = backend.sample_and_collapse(choices, *qubit)?;
                state.results.insert(*result, choices[chosen].outcome.clone());
            }

            Operation::OutputMarker { kind: RecordKind::Array, .. } => {}

            Operation::OutputMarker { kind: RecordKind::Result, args } => {
                for arg in args {
                    if let Operand::Result(index) = arg {
                        let label = state
                            .results
                            .get(index)
                            .ok_or(EngineError::UnrecordedResult(*index))?;
                        state.reported.push(label.clone());
                    }
                }
            }
        }
    }

    Ok(state.reported.concat())
}

/// Roll the loss model for each operand of a gate.
///
/// Already-lost qubits are never re-rolled; a freshly lost qubit is
/// immediately forced to the ground state through the backend.
fn maybe_lose<B: StateBackend>(
    rng: &mut StdRng,
    model: &NoiseModel,
    gate: &str,
    qubits: &[u32],
    state: &mut ShotState,
    backend: &mut B,
    reset: &[SquareMatrix],
) -> EngineResult<()> {
    let probability = model.loss_probability(gate);
    for &qubit in qubits {
        if state.lost[qubit as usize] {
            continue;
        }
        if rng.gen::<f64>() < probability {
            state.lost[qubit as usize] = true;
            backend.apply_operator(reset, &[qubit])?;
            debug!(gate, qubit, "qubit lost");
        }
    }
    Ok(())
}

/// Execute `program` under `model` with the bundled state-vector
/// backend.
///
/// Convenience wrapper over [`SimulationEngine`] for callers that do
/// not inject their own backend.
pub fn run(
    program: &Program,
    model: &NoiseModel,
    shots: u32,
    base_seed: u64,
) -> EngineResult<Vec<String>> {
    SimulationEngine::new().run(program, model, shots, base_seed, crate::StateVector::new)
}
