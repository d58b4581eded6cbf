//! Deterministic bundles for tests, no trained artifacts needed.

use std::collections::HashMap;

use safetensors::tensor::{Dtype, TensorView};
use serde_json::{Value, json};

use crate::{
    BundleMeta, MinMaxScaler, Predictor, WeightBundle,
    arch::{HIDDEN1_DIM, HIDDEN2_DIM, INPUT_DIM, Network, OUTPUT_DIM},
    bundle::{StateDict, Tensor},
};

/// Output bias giving Mn ~ 1e4 and Mw above Mn.
const MOMENT_BIAS: [f32; OUTPUT_DIM] = [0.1, 4.0, 4.3, 4.5, 4.7, 4.2];

/// A bundle under construction, with weights laid out as the training framework exports them.
#[derive(Debug, Clone)]
pub struct Fixture {
    fc1: (Vec<Vec<f32>>, Vec<f32>),
    fc2: (Vec<Vec<f32>>, Vec<f32>),
    fc3: (Vec<Vec<f32>>, Vec<f32>),
    scaler_min: [f64; INPUT_DIM],
    scaler_max: [f64; INPUT_DIM],
    meta: BundleMeta,
}

/// A small deterministic value in `[-0.22, 0.22]`.
fn scramble(i: usize, j: usize, salt: usize) -> f32 {
    ((i * 31 + j * 17 + salt * 7) % 23) as f32 * 0.02 - 0.22
}

fn scrambled_layer(n_out: usize, n_in: usize, salt: usize) -> (Vec<Vec<f32>>, Vec<f32>) {
    let w = (0..n_out)
        .map(|o| (0..n_in).map(|i| scramble(o, i, salt)).collect())
        .collect();
    let b = (0..n_out).map(|o| scramble(o, n_in, salt + 1)).collect();
    (w, b)
}

impl Fixture {
    /// The admissible physical range of each input, used as the fitted scaler range.
    pub const PHYSICAL_MIN: [f64; INPUT_DIM] = [0.5, 5.0, 0.005, 323.0, 1.2];
    pub const PHYSICAL_MAX: [f64; INPUT_DIM] = [5.0, 9.5, 0.1, 363.0, 35854.0];

    /// Arbitrary but fixed parameters everywhere, outputs have no physical meaning.
    pub fn scrambled() -> Self {
        let mut fc3 = scrambled_layer(OUTPUT_DIM, HIDDEN2_DIM, 3);
        fc3.1 = MOMENT_BIAS.to_vec();

        Self {
            fc1: scrambled_layer(HIDDEN1_DIM, INPUT_DIM, 1),
            fc2: scrambled_layer(HIDDEN2_DIM, HIDDEN1_DIM, 2),
            fc3,
            scaler_min: Self::PHYSICAL_MIN,
            scaler_max: Self::PHYSICAL_MAX,
            meta: BundleMeta {
                model_name: "scrambled".into(),
                fold: 8,
                final_test_loss: 0.0123,
                is_best: false,
            },
        }
    }

    /// A network whose outputs only depend on the reaction time, through a single path of
    /// increasing functions: conversion and every moment grow with time and `Mw > Mn`.
    pub fn monotone(name: &str) -> Self {
        let mut fixture = Self::scrambled();

        // Hidden unit 0 of each layer carries the time signal, nothing else reaches the output.
        fixture.fc1.0[0] = vec![0.0, 0.0, 0.0, 0.0, 2.0];
        fixture.fc1.1[0] = 0.0;

        fixture.fc2.0[0] = vec![0.0; HIDDEN1_DIM];
        fixture.fc2.0[0][0] = 1.5;
        fixture.fc2.1[0] = 0.0;

        let gains = [0.6, 0.1, 0.3, 0.35, 0.4, 0.2];
        for (row, gain) in fixture.fc3.0.iter_mut().zip(gains) {
            *row = vec![0.0; HIDDEN2_DIM];
            row[0] = gain;
        }

        fixture.meta = BundleMeta {
            model_name: name.to_string(),
            fold: 8,
            final_test_loss: 0.0042,
            is_best: true,
        };
        fixture
    }

    pub fn with_output_bias(mut self, bias: [f32; OUTPUT_DIM]) -> Self {
        self.fc3.1 = bias.to_vec();
        self
    }

    pub fn with_scaler(mut self, min: [f64; INPUT_DIM], max: [f64; INPUT_DIM]) -> Self {
        self.scaler_min = min;
        self.scaler_max = max;
        self
    }

    pub fn with_loss(mut self, loss: f64) -> Self {
        self.meta.final_test_loss = loss;
        self
    }

    pub fn with_fold(mut self, fold: u32) -> Self {
        self.meta.fold = fold;
        self
    }

    pub fn meta(&self) -> &BundleMeta {
        &self.meta
    }

    fn layers(&self) -> [(&str, &(Vec<Vec<f32>>, Vec<f32>)); 3] {
        [("fc1", &self.fc1), ("fc2", &self.fc2), ("fc3", &self.fc3)]
    }

    pub fn state_dict(&self) -> StateDict {
        let mut dict = StateDict::new();

        for (name, (w, b)) in self.layers() {
            let shape = vec![w.len(), w.first().map(Vec::len).unwrap_or_default()];
            let data = w.iter().flatten().copied().collect();
            dict.insert(format!("{name}.weight"), Tensor::new(shape, data).unwrap());
            dict.insert(format!("{name}.bias"), Tensor::new(vec![b.len()], b.clone()).unwrap());
        }

        dict
    }

    pub fn network(&self) -> Network {
        Network::from_state_dict(&self.state_dict()).unwrap()
    }

    pub fn scaler(&self) -> MinMaxScaler {
        MinMaxScaler::new(self.scaler_min, self.scaler_max).unwrap()
    }

    pub fn bundle(&self) -> WeightBundle {
        WeightBundle::new(self.network(), self.scaler(), self.meta.clone()).unwrap()
    }

    pub fn predictor(&self) -> Predictor {
        Predictor::new(self.bundle())
    }

    /// Encodes the fixture as a JSON bundle.
    pub fn to_json(&self) -> Vec<u8> {
        let state_dict: serde_json::Map<String, Value> = self
            .layers()
            .into_iter()
            .flat_map(|(name, (w, b))| {
                [
                    (format!("{name}.weight"), json!(w)),
                    (format!("{name}.bias"), json!(b)),
                ]
            })
            .collect();

        let value = json!({
            "model_state_dict": state_dict,
            "scalerx_min": self.scaler_min,
            "scalerx_max": self.scaler_max,
            "model_name": self.meta.model_name,
            "fold": self.meta.fold,
            "final_test_loss": self.meta.final_test_loss,
            "is_best": self.meta.is_best,
        });

        serde_json::to_vec(&value).unwrap()
    }

    /// Encodes the fixture as a safetensors bundle.
    pub fn to_safetensors(&self) -> Vec<u8> {
        let tensors: Vec<(String, Vec<usize>, Vec<u8>)> = self
            .state_dict()
            .iter()
            .map(|(name, t)| {
                let bytes = t.data().iter().flat_map(|v| v.to_le_bytes()).collect();
                (name.to_string(), t.shape().to_vec(), bytes)
            })
            .collect();

        let views = tensors.iter().map(|(name, shape, bytes)| {
            (
                name.clone(),
                TensorView::new(Dtype::F32, shape.clone(), bytes).unwrap(),
            )
        });

        let info = HashMap::from([
            ("model_name".to_string(), self.meta.model_name.clone()),
            ("fold".to_string(), self.meta.fold.to_string()),
            (
                "final_test_loss".to_string(),
                self.meta.final_test_loss.to_string(),
            ),
            ("is_best".to_string(), self.meta.is_best.to_string()),
            (
                "scalerx_min".to_string(),
                serde_json::to_string(&self.scaler_min).unwrap(),
            ),
            (
                "scalerx_max".to_string(),
                serde_json::to_string(&self.scaler_max).unwrap(),
            ),
        ]);

        safetensors::serialize(views, &Some(info)).unwrap()
    }
}
