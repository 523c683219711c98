//! JSON persistence for noise models.
//!
//! Matrices are encoded row-major, each element as an `[re, im]` pair,
//! since JSON has no native complex numbers. Loading replaces the whole
//! registry and bumps the model revision once.

use std::collections::BTreeMap;
use std::path::Path;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{NoiseError, NoiseResult};
use crate::model::{GateEntry, InstrumentChoice, NoiseModel, SquareMatrix};

/// Row-major complex matrix as `[re, im]` pairs.
type MatrixData = Vec<Vec<[f64; 2]>>;

#[derive(Debug, Serialize, Deserialize)]
struct GateConfig {
    unitary: MatrixData,
    noise: String,
    #[serde(default)]
    loss_probability: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChoiceConfig {
    projector: MatrixData,
    noise: String,
    outcome: String,
}

/// Serialized form of a [`NoiseModel`]. BTreeMaps keep the JSON output
/// deterministic.
#[derive(Debug, Serialize, Deserialize)]
struct ModelConfig {
    kraus_sets: BTreeMap<String, Vec<MatrixData>>,
    gates: BTreeMap<String, GateConfig>,
    instruments: BTreeMap<String, Vec<ChoiceConfig>>,
}

fn encode_matrix(matrix: &SquareMatrix) -> MatrixData {
    matrix
        .rows()
        .into_iter()
        .map(|row| row.iter().map(|v| [v.re, v.im]).collect())
        .collect()
}

fn decode_matrix(name: &str, data: &MatrixData) -> NoiseResult<SquareMatrix> {
    let rows = data.len();
    if rows == 0 || data.iter().any(|row| row.len() != rows) {
        return Err(NoiseError::InvalidConfig(format!(
            "matrix in '{name}' is not square"
        )));
    }
    let flat = data
        .iter()
        .flatten()
        .map(|[re, im]| num_complex::Complex64::new(*re, *im))
        .collect();
    SquareMatrix::from_shape_vec((rows, rows), flat)
        .map_err(|e| NoiseError::InvalidConfig(format!("matrix in '{name}': {e}")))
}

impl NoiseModel {
    /// Serialize the model to a JSON string.
    pub fn to_json(&self) -> NoiseResult<String> {
        let config = ModelConfig {
            kraus_sets: self
                .kraus_set_names()
                .map(|name| {
                    let set = self.kraus_set(name).unwrap_or(&[]);
                    (name.to_owned(), set.iter().map(encode_matrix).collect())
                })
                .collect(),
            gates: self
                .gates()
                .map(|(name, entry)| {
                    (
                        name.to_owned(),
                        GateConfig {
                            unitary: encode_matrix(&entry.unitary),
                            noise: entry.noise.clone(),
                            loss_probability: entry.loss_probability,
                        },
                    )
                })
                .collect(),
            instruments: self
                .instruments()
                .map(|(name, choices)| {
                    (
                        name.to_owned(),
                        choices
                            .iter()
                            .map(|choice| ChoiceConfig {
                                projector: encode_matrix(&choice.projector),
                                noise: choice.noise.clone(),
                                outcome: choice.outcome.clone(),
                            })
                            .collect(),
                    )
                })
                .collect(),
        };
        Ok(serde_json::to_string_pretty(&config)?)
    }

    /// Replace this model's contents from a JSON string, bumping the
    /// revision once.
    pub fn load_json(&mut self, json: &str) -> NoiseResult<()> {
        let config: ModelConfig = serde_json::from_str(json)?;

        let mut kraus_sets = FxHashMap::default();
        for (name, matrices) in &config.kraus_sets {
            let decoded = matrices
                .iter()
                .map(|m| decode_matrix(name, m))
                .collect::<NoiseResult<Vec<_>>>()?;
            kraus_sets.insert(name.clone(), decoded);
        }

        let mut gates = FxHashMap::default();
        for (name, gate) in &config.gates {
            if !(0.0..=1.0).contains(&gate.loss_probability) {
                return Err(NoiseError::InvalidProbability(gate.loss_probability));
            }
            gates.insert(
                name.clone(),
                GateEntry {
                    unitary: decode_matrix(name, &gate.unitary)?,
                    noise: gate.noise.clone(),
                    loss_probability: gate.loss_probability,
                },
            );
        }

        let mut instruments = FxHashMap::default();
        for (name, choices) in &config.instruments {
            let decoded = choices
                .iter()
                .map(|choice| {
                    Ok(InstrumentChoice {
                        projector: decode_matrix(name, &choice.projector)?,
                        noise: choice.noise.clone(),
                        outcome: choice.outcome.clone(),
                    })
                })
                .collect::<NoiseResult<Vec<_>>>()?;
            instruments.insert(name.clone(), decoded);
        }

        self.replace_contents(kraus_sets, gates, instruments);
        Ok(())
    }

    /// Write the model to a JSON file.
    pub fn save_config(&self, path: impl AsRef<Path>) -> NoiseResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Load the model from a JSON file, replacing its contents.
    pub fn load_config(&mut self, path: impl AsRef<Path>) -> NoiseResult<()> {
        let json = std::fs::read_to_string(path)?;
        self.load_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use crate::model::default_model;
    use crate::NoiseModel;

    #[test]
    fn test_json_round_trip() {
        let original = default_model();
        let json = original.to_json().unwrap();

        let mut loaded = NoiseModel::new();
        loaded.load_json(&json).unwrap();

        assert_eq!(loaded.revision(), 1);
        let h = loaded.gate("h").unwrap();
        assert_eq!(h.noise, "noise_1q");
        assert_eq!(h.unitary, original.gate("h").unwrap().unitary);

        let mz = loaded.instrument("mz").unwrap();
        assert_eq!(mz.len(), 2);
        assert_eq!(mz[1].outcome, "1");

        assert_eq!(loaded.kraus_set("noise_reset").unwrap().len(), 2);
    }

    #[test]
    fn test_load_bumps_revision_once() {
        let json = default_model().to_json().unwrap();
        let mut model = default_model();
        let before = model.revision();
        model.load_json(&json).unwrap();
        assert_eq!(model.revision(), before + 1);
    }

    #[test]
    fn test_rejects_non_square_matrix() {
        let json = r#"{
            "kraus_sets": { "bad": [[[ [1.0, 0.0], [0.0, 0.0] ]]] },
            "gates": {},
            "instruments": {}
        }"#;
        let mut model = NoiseModel::new();
        assert!(model.load_json(json).is_err());
        assert_eq!(model.revision(), 0);
    }

    #[test]
    fn test_rejects_invalid_loss_probability() {
        let json = r#"{
            "kraus_sets": {},
            "gates": {
                "g": {
                    "unitary": [[[1.0, 0.0], [0.0, 0.0]], [[0.0, 0.0], [1.0, 0.0]]],
                    "noise": "n",
                    "loss_probability": 2.0
                }
            },
            "instruments": {}
        }"#;
        let mut model = NoiseModel::new();
        assert!(model.load_json(json).is_err());
    }
}
