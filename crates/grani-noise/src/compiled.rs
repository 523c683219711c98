//! Simulation-ready operator tables derived from a noise model.
//!
//! [`CompiledOperators`] resolves every gate and instrument entry of a
//! [`NoiseModel`] snapshot into composed Kraus sets. The table records
//! the model revision it was built from; consumers recompile whenever
//! the observed revision differs, and otherwise treat the table as
//! immutable and freely shareable for read.
//!
//! Continuously-parameterized rotations cannot be pre-enumerated by
//! name, so [`RotationCache`] memoizes per-angle operators under a
//! `(revision, angle)` key with bounded LRU eviction. A lookup under a
//! stale revision is a miss by construction — correctness of
//! invalidation never depends on eviction timing.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::{NoiseError, NoiseResult};
use crate::model::{apply_unitary_to_kraus, rz_matrix, NoiseModel, SquareMatrix};

/// The continuously-parameterized rotation gate handled by the cache.
pub const ROTATION_GATE: &str = "rz";

/// Default capacity of the rotation cache.
pub const ROTATION_CACHE_CAPACITY: usize = 64;

/// One compiled instrument choice: composed operators plus the outcome
/// label reported when this choice is observed.
#[derive(Debug, Clone)]
pub struct CompiledChoice {
    /// Noise-composed Kraus operators for this outcome.
    pub operators: Vec<SquareMatrix>,
    /// The classical outcome label.
    pub outcome: String,
}

/// Composed operator sets for every gate and instrument of a model
/// snapshot.
#[derive(Debug, Clone)]
pub struct CompiledOperators {
    revision: u64,
    gates: FxHashMap<String, Vec<SquareMatrix>>,
    instruments: FxHashMap<String, Vec<CompiledChoice>>,
}

impl CompiledOperators {
    /// Compile every gate and instrument of `model`.
    ///
    /// Fails with [`NoiseError::UnknownKrausSet`] when an entry
    /// references a noise set that does not resolve.
    pub fn compile(model: &NoiseModel) -> NoiseResult<Self> {
        let mut gates = FxHashMap::default();
        for (name, entry) in model.gates() {
            let noise = model
                .kraus_set(&entry.noise)
                .ok_or_else(|| NoiseError::UnknownKrausSet {
                    set: entry.noise.clone(),
                    referenced_by: name.to_owned(),
                })?;
            gates.insert(
                name.to_owned(),
                apply_unitary_to_kraus(&entry.unitary, noise),
            );
        }

        let mut instruments = FxHashMap::default();
        for (name, choices) in model.instruments() {
            let mut compiled = Vec::with_capacity(choices.len());
            for choice in choices {
                let noise = model
                    .kraus_set(&choice.noise)
                    .ok_or_else(|| NoiseError::UnknownKrausSet {
                        set: choice.noise.clone(),
                        referenced_by: name.to_owned(),
                    })?;
                compiled.push(CompiledChoice {
                    operators: apply_unitary_to_kraus(&choice.projector, noise),
                    outcome: choice.outcome.clone(),
                });
            }
            instruments.insert(name.to_owned(), compiled);
        }

        debug!(
            revision = model.revision(),
            gates = gates.len(),
            instruments = instruments.len(),
            "compiled noise model operators"
        );

        Ok(Self {
            revision: model.revision(),
            gates,
            instruments,
        })
    }

    /// The model revision this table was compiled from.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// True when `model` has mutated since this table was compiled.
    pub fn is_stale(&self, model: &NoiseModel) -> bool {
        self.revision != model.revision()
    }

    /// Composed Kraus set for a gate.
    pub fn gate(&self, name: &str) -> Option<&[SquareMatrix]> {
        self.gates.get(name).map(Vec::as_slice)
    }

    /// Compiled choices for an instrument, in outcome-precedence order.
    pub fn instrument(&self, name: &str) -> Option<&[CompiledChoice]> {
        self.instruments.get(name).map(Vec::as_slice)
    }
}

/// Bounded LRU cache of composed rotation operators keyed on
/// `(revision, angle)`.
///
/// Entries built under an old revision can never be matched again (the
/// revision is part of the key); they merely occupy capacity until
/// evicted.
#[derive(Debug)]
pub struct RotationCache {
    capacity: usize,
    /// Most-recently-used first.
    entries: Vec<((u64, u64), Vec<SquareMatrix>)>,
}

impl Default for RotationCache {
    fn default() -> Self {
        Self::new(ROTATION_CACHE_CAPACITY)
    }
}

impl RotationCache {
    /// Create a cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Vec::new(),
        }
    }

    /// Composed Kraus set for the rotation gate at `angle` under the
    /// model's current revision, building and memoizing on miss.
    ///
    /// Fails with [`NoiseError::UnknownGate`] when the rotation gate is
    /// not registered, or [`NoiseError::UnknownKrausSet`] when its
    /// noise set does not resolve.
    pub fn operators(&mut self, model: &NoiseModel, angle: f64) -> NoiseResult<&[SquareMatrix]> {
        let key = (model.revision(), angle.to_bits());

        if let Some(index) = self.entries.iter().position(|(k, _)| *k == key) {
            let entry = self.entries.remove(index);
            self.entries.insert(0, entry);
        } else {
            let entry = model
                .gate(ROTATION_GATE)
                .ok_or_else(|| NoiseError::UnknownGate(ROTATION_GATE.to_owned()))?;
            let noise =
                model
                    .kraus_set(&entry.noise)
                    .ok_or_else(|| NoiseError::UnknownKrausSet {
                        set: entry.noise.clone(),
                        referenced_by: ROTATION_GATE.to_owned(),
                    })?;
            let operators = apply_unitary_to_kraus(&rz_matrix(angle), noise);
            debug!(revision = key.0, angle, "built rotation operators");
            self.entries.insert(0, (key, operators));
            self.entries.truncate(self.capacity);
        }

        Ok(&self.entries[0].1)
    }

    /// Number of cached entries (stale revisions included).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::default_model;
    use num_complex::Complex64;

    #[test]
    fn test_compile_default_model() {
        let model = default_model();
        let compiled = CompiledOperators::compile(&model).unwrap();

        assert_eq!(compiled.revision(), model.revision());
        // Identity noise: the composed set is just the unitary.
        let h = compiled.gate("h").unwrap();
        assert_eq!(h.len(), 1);
        let mz = compiled.instrument("mz").unwrap();
        assert_eq!(mz.len(), 2);
        assert_eq!(mz[0].outcome, "0");
        assert_eq!(mz[1].outcome, "1");
    }

    #[test]
    fn test_unknown_kraus_set_is_compile_failure() {
        let mut model = default_model();
        model.update_gate_noise("h", "does_not_exist").unwrap();

        match CompiledOperators::compile(&model) {
            Err(NoiseError::UnknownKrausSet { set, referenced_by }) => {
                assert_eq!(set, "does_not_exist");
                assert_eq!(referenced_by, "h");
            }
            other => panic!("expected UnknownKrausSet, got {other:?}"),
        }
    }

    #[test]
    fn test_recompile_reflects_mutation() {
        let mut model = default_model();
        let compiled = CompiledOperators::compile(&model).unwrap();
        assert!(!compiled.is_stale(&model));

        model.update_gate_loss("h", 0.25).unwrap();
        assert!(compiled.is_stale(&model));

        let recompiled = CompiledOperators::compile(&model).unwrap();
        assert_eq!(recompiled.revision(), model.revision());
    }

    #[test]
    fn test_rotation_cache_hits_same_revision() {
        let model = default_model();
        let mut cache = RotationCache::new(8);

        let first = cache.operators(&model, 0.5).unwrap().to_vec();
        assert_eq!(cache.len(), 1);
        let second = cache.operators(&model, 0.5).unwrap().to_vec();
        assert_eq!(cache.len(), 1);
        assert_eq!(first, second);
    }

    #[test]
    fn test_rotation_cache_stale_revision_never_matches() {
        let mut model = default_model();
        let mut cache = RotationCache::new(8);

        let before = cache.operators(&model, 0.5).unwrap().to_vec();
        assert_eq!(before.len(), 1);

        // Swap the rz noise to the reset channel and bump the revision.
        model.update_gate_noise(ROTATION_GATE, "noise_reset").unwrap();
        let after = cache.operators(&model, 0.5).unwrap().to_vec();

        // Two noise operators now, so the stale single-operator entry
        // cannot have been returned.
        assert_eq!(after.len(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_rotation_cache_capacity_bound() {
        let model = default_model();
        let mut cache = RotationCache::new(4);

        for i in 0..10 {
            cache.operators(&model, f64::from(i) * 0.1).unwrap();
        }
        assert_eq!(cache.len(), 4);
    }

    #[test]
    fn test_rotation_operator_value() {
        let model = default_model();
        let mut cache = RotationCache::new(4);

        let ops = cache.operators(&model, std::f64::consts::PI).unwrap();
        assert_eq!(ops.len(), 1);
        assert!((ops[0][(0, 0)] - Complex64::new(0.0, -1.0)).norm() < 1e-12);
        assert!((ops[0][(1, 1)] - Complex64::new(0.0, 1.0)).norm() < 1e-12);
    }
}
