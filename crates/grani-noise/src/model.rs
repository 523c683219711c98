//! Mutable, versioned noise-model registry.
//!
//! A [`NoiseModel`] maps names to Kraus sets, gates, and measurement
//! instruments. It is caller-owned and long-lived: one model is reused
//! across many program executions, and every mutating call bumps its
//! [`revision`](NoiseModel::revision) counter so that derived operator
//! tables can detect staleness. There is no dirty-checking — setting a
//! value equal to the old one still bumps the revision.
//!
//! Noise sets are registered WITHOUT the ideal operator folded in
//! (noise-only models), so one set (e.g. "depolarize by 5%") can be
//! shared by several gates. Name references are resolved lazily, when
//! operators are compiled, not when entries are registered.

use ndarray::array;
use num_complex::Complex64;
use rustc_hash::FxHashMap;

use crate::error::{NoiseError, NoiseResult};

/// A square complex matrix (operator on one or more qubits).
pub type SquareMatrix = ndarray::Array2<Complex64>;

/// A gate entry: ideal unitary, noise-set name, and loss probability.
#[derive(Debug, Clone)]
pub struct GateEntry {
    /// The ideal (noiseless) unitary.
    pub unitary: SquareMatrix,
    /// Name of the Kraus set applied after the unitary.
    pub noise: String,
    /// Probability that each operand qubit is lost when this gate is
    /// applied. Must lie in [0, 1].
    pub loss_probability: f64,
}

/// One outcome choice of a measurement instrument.
#[derive(Debug, Clone)]
pub struct InstrumentChoice {
    /// The ideal projector for this outcome.
    pub projector: SquareMatrix,
    /// Name of the Kraus set applied after the projector.
    pub noise: String,
    /// The classical label reported when this outcome is observed.
    pub outcome: String,
}

/// A mutable registry of named noise sets, gates, and instruments.
///
/// Two models are never interchangeable for caching purposes even when
/// structurally equal — they may diverge independently after
/// construction. Consumers key caches on the revision counter alone.
#[derive(Debug, Clone, Default)]
pub struct NoiseModel {
    kraus_sets: FxHashMap<String, Vec<SquareMatrix>>,
    gates: FxHashMap<String, GateEntry>,
    instruments: FxHashMap<String, Vec<InstrumentChoice>>,
    revision: u64,
}

impl NoiseModel {
    /// Create an empty noise model.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current revision. Strictly increases on every mutating call;
    /// never resets.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Register (or replace) a named set of noise-only Kraus matrices.
    pub fn add_kraus_set(&mut self, name: impl Into<String>, matrices: Vec<SquareMatrix>) {
        self.kraus_sets.insert(name.into(), matrices);
        self.revision += 1;
    }

    /// Register (or replace) a gate.
    ///
    /// `loss_probability` must lie in [0, 1]; the referenced noise set
    /// need not exist yet — it is resolved at compile time.
    pub fn add_gate(
        &mut self,
        name: impl Into<String>,
        unitary: SquareMatrix,
        noise: impl Into<String>,
        loss_probability: f64,
    ) -> NoiseResult<()> {
        if !(0.0..=1.0).contains(&loss_probability) {
            return Err(NoiseError::InvalidProbability(loss_probability));
        }
        self.insert_gate(name, unitary, noise, loss_probability);
        Ok(())
    }

    fn insert_gate(
        &mut self,
        name: impl Into<String>,
        unitary: SquareMatrix,
        noise: impl Into<String>,
        loss_probability: f64,
    ) {
        self.gates.insert(
            name.into(),
            GateEntry {
                unitary,
                noise: noise.into(),
                loss_probability,
            },
        );
        self.revision += 1;
    }

    /// Replace the ideal unitary of a registered gate.
    pub fn update_gate_matrix(&mut self, name: &str, unitary: SquareMatrix) -> NoiseResult<()> {
        let entry = self
            .gates
            .get_mut(name)
            .ok_or_else(|| NoiseError::UnknownGate(name.to_owned()))?;
        entry.unitary = unitary;
        self.revision += 1;
        Ok(())
    }

    /// Replace the noise-set name of a registered gate.
    pub fn update_gate_noise(&mut self, name: &str, noise: impl Into<String>) -> NoiseResult<()> {
        let entry = self
            .gates
            .get_mut(name)
            .ok_or_else(|| NoiseError::UnknownGate(name.to_owned()))?;
        entry.noise = noise.into();
        self.revision += 1;
        Ok(())
    }

    /// Replace the loss probability of a registered gate.
    pub fn update_gate_loss(&mut self, name: &str, loss_probability: f64) -> NoiseResult<()> {
        if !(0.0..=1.0).contains(&loss_probability) {
            return Err(NoiseError::InvalidProbability(loss_probability));
        }
        let entry = self
            .gates
            .get_mut(name)
            .ok_or_else(|| NoiseError::UnknownGate(name.to_owned()))?;
        entry.loss_probability = loss_probability;
        self.revision += 1;
        Ok(())
    }

    /// Register (or replace) a measurement instrument. Choice order
    /// defines outcome precedence and is preserved.
    pub fn add_instrument(&mut self, name: impl Into<String>, choices: Vec<InstrumentChoice>) {
        self.instruments.insert(name.into(), choices);
        self.revision += 1;
    }

    /// Look up a gate entry.
    pub fn gate(&self, name: &str) -> Option<&GateEntry> {
        self.gates.get(name)
    }

    /// Look up an instrument's choices.
    pub fn instrument(&self, name: &str) -> Option<&[InstrumentChoice]> {
        self.instruments.get(name).map(Vec::as_slice)
    }

    /// Look up a Kraus set.
    pub fn kraus_set(&self, name: &str) -> Option<&[SquareMatrix]> {
        self.kraus_sets.get(name).map(Vec::as_slice)
    }

    /// Loss probability for a gate; 0.0 when the gate is unregistered.
    pub fn loss_probability(&self, gate: &str) -> f64 {
        self.gates.get(gate).map_or(0.0, |g| g.loss_probability)
    }

    /// Iterate registered Kraus set names.
    pub fn kraus_set_names(&self) -> impl Iterator<Item = &str> {
        self.kraus_sets.keys().map(String::as_str)
    }

    /// Iterate registered gates.
    pub fn gates(&self) -> impl Iterator<Item = (&str, &GateEntry)> {
        self.gates.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    /// Iterate registered instruments.
    pub fn instruments(&self) -> impl Iterator<Item = (&str, &[InstrumentChoice])> {
        self.instruments
            .iter()
            .map(|(name, choices)| (name.as_str(), choices.as_slice()))
    }

    /// Replace the entire registry contents in one mutating call.
    pub(crate) fn replace_contents(
        &mut self,
        kraus_sets: FxHashMap<String, Vec<SquareMatrix>>,
        gates: FxHashMap<String, GateEntry>,
        instruments: FxHashMap<String, Vec<InstrumentChoice>>,
    ) {
        self.kraus_sets = kraus_sets;
        self.gates = gates;
        self.instruments = instruments;
        self.revision += 1;
    }
}

/// Post-compose a set of noise operators onto an ideal operator.
///
/// An empty noise set degenerates to `[U]`; otherwise the result is
/// `[E·U]` for each noise operator `E`, order preserved. This single
/// rule is the whole physical model: an operation is the ideal operator
/// followed by a stochastic noise channel.
pub fn apply_unitary_to_kraus(unitary: &SquareMatrix, noise: &[SquareMatrix]) -> Vec<SquareMatrix> {
    if noise.is_empty() {
        vec![unitary.clone()]
    } else {
        noise.iter().map(|e| e.dot(unitary)).collect()
    }
}

fn c(re: f64, im: f64) -> Complex64 {
    Complex64::new(re, im)
}

/// 2x2 identity.
pub fn identity_1q() -> SquareMatrix {
    array![[c(1.0, 0.0), c(0.0, 0.0)], [c(0.0, 0.0), c(1.0, 0.0)]]
}

/// The z-rotation unitary `diag(e^{-iθ/2}, e^{iθ/2})`.
pub fn rz_matrix(theta: f64) -> SquareMatrix {
    array![
        [Complex64::from_polar(1.0, -theta / 2.0), c(0.0, 0.0)],
        [c(0.0, 0.0), Complex64::from_polar(1.0, theta / 2.0)],
    ]
}

/// Build the default noise model: identity (noiseless) Kraus sets, the
/// standard gate set, a reset channel, and the `mz` instrument with
/// outcomes `"0"` and `"1"`.
pub fn default_model() -> NoiseModel {
    let mut model = NoiseModel::new();

    let eye2 = identity_1q();
    let eye4 = SquareMatrix::eye(4);
    let eye8 = SquareMatrix::eye(8);

    model.add_kraus_set("noise_1q", vec![eye2.clone()]);
    model.add_kraus_set("noise_2q", vec![eye4]);
    model.add_kraus_set("noise_3q", vec![eye8]);

    // 100% amplitude damping: forces the qubit to |0⟩.
    model.add_kraus_set(
        "noise_reset",
        vec![
            array![[c(1.0, 0.0), c(0.0, 0.0)], [c(0.0, 0.0), c(0.0, 0.0)]],
            array![[c(0.0, 0.0), c(1.0, 0.0)], [c(0.0, 0.0), c(0.0, 0.0)]],
        ],
    );

    let x = array![[c(0.0, 0.0), c(1.0, 0.0)], [c(1.0, 0.0), c(0.0, 0.0)]];
    let y = array![[c(0.0, 0.0), c(0.0, -1.0)], [c(0.0, 1.0), c(0.0, 0.0)]];
    let z = array![[c(1.0, 0.0), c(0.0, 0.0)], [c(0.0, 0.0), c(-1.0, 0.0)]];

    let h_scale = 1.0 / 2.0_f64.sqrt();
    let h = array![
        [c(h_scale, 0.0), c(h_scale, 0.0)],
        [c(h_scale, 0.0), c(-h_scale, 0.0)],
    ];

    let s = array![[c(1.0, 0.0), c(0.0, 0.0)], [c(0.0, 0.0), c(0.0, 1.0)]];
    let s_adj = array![[c(1.0, 0.0), c(0.0, 0.0)], [c(0.0, 0.0), c(0.0, -1.0)]];

    let t_phase = Complex64::from_polar(1.0, std::f64::consts::FRAC_PI_4);
    let t = array![[c(1.0, 0.0), c(0.0, 0.0)], [c(0.0, 0.0), t_phase]];
    let t_adj = array![[c(1.0, 0.0), c(0.0, 0.0)], [c(0.0, 0.0), t_phase.conj()]];

    // sx * sx = x (note: not the elementwise square root of x).
    let sx = array![
        [c(0.5, 0.5), c(0.5, -0.5)],
        [c(0.5, -0.5), c(0.5, 0.5)],
    ];

    let mut cx = SquareMatrix::eye(4);
    cx[(2, 2)] = c(0.0, 0.0);
    cx[(3, 3)] = c(0.0, 0.0);
    cx[(2, 3)] = c(1.0, 0.0);
    cx[(3, 2)] = c(1.0, 0.0);

    let mut cz = SquareMatrix::eye(4);
    cz[(3, 3)] = c(-1.0, 0.0);

    let mut ccx = SquareMatrix::eye(8);
    ccx[(6, 6)] = c(0.0, 0.0);
    ccx[(7, 7)] = c(0.0, 0.0);
    ccx[(6, 7)] = c(1.0, 0.0);
    ccx[(7, 6)] = c(1.0, 0.0);

    model.insert_gate("i", eye2.clone(), "noise_1q", 0.0);
    model.insert_gate("move", eye2.clone(), "noise_1q", 0.0);
    model.insert_gate("x", x, "noise_1q", 0.0);
    model.insert_gate("y", y, "noise_1q", 0.0);
    model.insert_gate("z", z, "noise_1q", 0.0);
    model.insert_gate("h", h, "noise_1q", 0.0);
    model.insert_gate("s", s, "noise_1q", 0.0);
    model.insert_gate("t", t, "noise_1q", 0.0);
    model.insert_gate("s_adj", s_adj, "noise_1q", 0.0);
    model.insert_gate("t_adj", t_adj, "noise_1q", 0.0);
    model.insert_gate("sx", sx, "noise_1q", 0.0);
    model.insert_gate("cx", cx, "noise_2q", 0.0);
    model.insert_gate("cz", cz, "noise_2q", 0.0);
    model.insert_gate("ccx", ccx, "noise_3q", 0.0);
    // Reset is a gate with 100% amplitude damping noise.
    model.insert_gate("reset", eye2.clone(), "noise_reset", 0.0);
    // The rz unitary is a function of the call angle; the stored matrix
    // is an identity placeholder and the rotation cache builds the real
    // operator per angle.
    model.insert_gate("rz", eye2, "noise_1q", 0.0);

    let mz0 = array![[c(1.0, 0.0), c(0.0, 0.0)], [c(0.0, 0.0), c(0.0, 0.0)]];
    let mz1 = array![[c(0.0, 0.0), c(0.0, 0.0)], [c(0.0, 0.0), c(1.0, 0.0)]];
    model.add_instrument(
        "mz",
        vec![
            InstrumentChoice {
                projector: mz0,
                noise: "noise_1q".into(),
                outcome: "0".into(),
            },
            InstrumentChoice {
                projector: mz1,
                noise: "noise_1q".into(),
                outcome: "1".into(),
            },
        ],
    );

    model
}
