//! JSON bundles: the state dict exported as nested arrays next to the scaler and metadata.

use std::collections::HashMap;

use serde::Deserialize;

use super::{BundleMeta, StateDict, Tensor, WeightBundle};
use crate::error::{InferenceErr, Result};

#[derive(Deserialize)]
struct JsonBundle {
    model_state_dict: HashMap<String, JsonTensor>,
    scalerx_min: Vec<f64>,
    scalerx_max: Vec<f64>,
    model_name: String,
    fold: u32,
    final_test_loss: f64,
    is_best: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonTensor {
    Matrix(Vec<Vec<f32>>),
    Vector(Vec<f32>),
}

impl JsonTensor {
    fn into_tensor(self, name: &str) -> Result<Tensor> {
        match self {
            JsonTensor::Vector(v) => Tensor::new(vec![v.len()], v),
            JsonTensor::Matrix(rows) => {
                let ncols = rows.first().map(Vec::len).unwrap_or_default();
                let nrows = rows.len();
                let mut data = Vec::with_capacity(nrows * ncols);

                for row in rows {
                    if row.len() != ncols {
                        return Err(InferenceErr::ShapeMismatch {
                            tensor: name.to_string(),
                            got: vec![row.len()],
                            expected: vec![ncols],
                        });
                    }
                    data.extend(row);
                }

                Tensor::new(vec![nrows, ncols], data)
            }
        }
    }
}

pub(super) fn decode(bytes: &[u8]) -> Result<WeightBundle> {
    let raw: JsonBundle = serde_json::from_slice(bytes)?;

    let mut state_dict = StateDict::new();
    for (name, tensor) in raw.model_state_dict {
        let tensor = tensor.into_tensor(&name)?;
        state_dict.insert(name, tensor);
    }

    let meta = BundleMeta {
        model_name: raw.model_name,
        fold: raw.fold,
        final_test_loss: raw.final_test_loss,
        is_best: raw.is_best,
    };

    WeightBundle::from_parts(&state_dict, &raw.scalerx_min, &raw.scalerx_max, meta)
}
