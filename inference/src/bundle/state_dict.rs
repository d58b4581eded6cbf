use std::collections::HashMap;

use crate::error::{InferenceErr, Result};

/// A dense row-major `f32` buffer together with its shape, as read from an artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl Tensor {
    /// Creates a new `Tensor`.
    ///
    /// # Returns
    /// The tensor, or a shape mismatch if `data` does not hold exactly `shape.product()` values.
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(InferenceErr::ShapeMismatch {
                tensor: format!("{shape:?}"),
                got: vec![data.len()],
                expected: vec![expected],
            });
        }

        Ok(Self { shape, data })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Fails with a `ShapeMismatch` naming `name` unless this tensor has shape `expected`.
    pub fn expect_shape(&self, name: &str, expected: &[usize]) -> Result<()> {
        if self.shape != expected {
            return Err(InferenceErr::ShapeMismatch {
                tensor: name.to_string(),
                got: self.shape.clone(),
                expected: expected.to_vec(),
            });
        }

        Ok(())
    }

    /// Fails with `NonFinite` naming `name` if any value is NaN or infinite.
    pub fn expect_finite(&self, name: &str) -> Result<()> {
        if self.data.iter().any(|v| !v.is_finite()) {
            return Err(InferenceErr::NonFinite {
                tensor: name.to_string(),
            });
        }

        Ok(())
    }
}

/// Named tensors of a trained network, keyed the way the training framework names its
/// parameters (`fc1.weight`, `fc1.bias`, ...).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateDict {
    tensors: HashMap<String, Tensor>,
}

impl StateDict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, tensor: Tensor) {
        self.tensors.insert(name.into(), tensor);
    }

    pub fn remove(&mut self, name: &str) -> Option<Tensor> {
        self.tensors.remove(name)
    }

    /// Looks up a tensor by name, failing with `MissingField` if absent.
    pub fn get(&self, name: &str) -> Result<&Tensor> {
        self.tensors
            .get(name)
            .ok_or_else(|| InferenceErr::MissingField(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tensor)> {
        self.tensors.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tensor_rejects_wrong_element_count() {
        assert!(Tensor::new(vec![2, 3], vec![0.0; 5]).is_err());
        assert!(Tensor::new(vec![2, 3], vec![0.0; 6]).is_ok());
    }

    #[test]
    fn state_dict_get_missing_names_the_tensor() {
        let dict = StateDict::new();
        let err = dict.get("fc3.weight").unwrap_err();
        assert_eq!(err.to_string(), "bundle is missing field fc3.weight");
    }
}
