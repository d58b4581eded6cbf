//! safetensors bundles: `F32` tensors under the state dict names, with the scalar fields and
//! scaler vectors stored as strings in the `__metadata__` header.

use std::{collections::HashMap, str::FromStr};

use safetensors::{SafeTensors, tensor::Dtype};

use super::{BundleMeta, StateDict, Tensor, WeightBundle};
use crate::error::{InferenceErr, Result};

pub(super) fn decode(bytes: &[u8]) -> Result<WeightBundle> {
    let (_, metadata) = SafeTensors::read_metadata(bytes)?;
    let info = metadata
        .metadata()
        .as_ref()
        .ok_or_else(|| InferenceErr::MissingField("__metadata__".into()))?;

    let tensors = SafeTensors::deserialize(bytes)?;
    let mut state_dict = StateDict::new();

    for (name, view) in tensors.tensors() {
        if view.dtype() != Dtype::F32 {
            return Err(InferenceErr::UnsupportedFormat(format!(
                "tensor {name} is {:?}, only F32 is supported",
                view.dtype()
            )));
        }

        let data = view
            .data()
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        state_dict.insert(name, Tensor::new(view.shape().to_vec(), data)?);
    }

    let meta = BundleMeta {
        model_name: field(info, "model_name")?.to_string(),
        fold: parse_field(info, "fold")?,
        final_test_loss: parse_field(info, "final_test_loss")?,
        is_best: parse_bool(field(info, "is_best")?)?,
    };
    let scaler_min = parse_vec(info, "scalerx_min")?;
    let scaler_max = parse_vec(info, "scalerx_max")?;

    WeightBundle::from_parts(&state_dict, &scaler_min, &scaler_max, meta)
}

fn field<'a>(info: &'a HashMap<String, String>, key: &str) -> Result<&'a str> {
    info.get(key)
        .map(String::as_str)
        .ok_or_else(|| InferenceErr::MissingField(key.to_string()))
}

fn parse_field<T>(info: &HashMap<String, String>, key: &str) -> Result<T>
where
    T: FromStr,
    T::Err: ToString,
{
    field(info, key)?
        .trim()
        .parse()
        .map_err(|e: T::Err| InferenceErr::InvalidField {
            field: key.to_string(),
            reason: e.to_string(),
        })
}

/// Accepts both `true`/`false` and the capitalized spelling some exporters write.
fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(InferenceErr::InvalidField {
            field: "is_best".into(),
            reason: format!("expected a boolean, got {other}"),
        }),
    }
}

fn parse_vec(info: &HashMap<String, String>, key: &str) -> Result<Vec<f64>> {
    serde_json::from_str(field(info, key)?).map_err(|e| InferenceErr::InvalidField {
        field: key.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use safetensors::tensor::TensorView;

    use super::*;
    use crate::testing::Fixture;

    #[test]
    fn decodes_fixture() {
        let bundle = decode(&Fixture::monotone("baseline_nn").to_safetensors()).unwrap();
        assert_eq!(bundle.model_name(), "baseline_nn");
        assert_eq!(bundle.meta().fold, 8);
    }

    #[test]
    fn capitalized_booleans_are_accepted() {
        assert!(parse_bool("True").unwrap());
        assert!(!parse_bool("False").unwrap());
        assert!(parse_bool("maybe").is_err());
    }

    #[test]
    fn missing_header_metadata_is_rejected() {
        let data = vec![0_u8; 4];
        let view = TensorView::new(Dtype::F32, vec![1], &data).unwrap();
        let bytes = safetensors::serialize([("fc1.bias", view)], &None).unwrap();

        let err = decode(&bytes).unwrap_err();
        assert!(matches!(err, InferenceErr::MissingField(ref f) if f == "__metadata__"));
    }

    #[test]
    fn non_f32_tensors_are_rejected() {
        let data = vec![0_u8; 8];
        let view = TensorView::new(Dtype::F64, vec![1], &data).unwrap();
        let info = HashMap::from([("model_name".to_string(), "pcinn".to_string())]);
        let bytes = safetensors::serialize([("fc1.bias", view)], &Some(info)).unwrap();

        assert!(matches!(decode(&bytes), Err(InferenceErr::UnsupportedFormat(_))));
    }

    #[test]
    fn truncated_file_is_rejected() {
        let bytes = Fixture::monotone("pcinn").to_safetensors();
        let err = decode(&bytes[..bytes.len() / 2]).unwrap_err();
        assert!(matches!(err, InferenceErr::SafeTensors(_)));
    }
}
