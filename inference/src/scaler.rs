use crate::{
    arch::INPUT_DIM,
    error::{InferenceErr, Result},
};

/// Per-feature affine normalization `(x - min) / (max - min)`, fitted on the training set.
///
/// Inputs are never clipped: values outside `[min, max]` extrapolate linearly. Rejecting
/// physically out of range inputs is up to the request validation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct MinMaxScaler {
    min: [f64; INPUT_DIM],
    max: [f64; INPUT_DIM],
}

impl MinMaxScaler {
    /// Creates a new `MinMaxScaler`.
    ///
    /// # Returns
    /// The scaler, or an error if any range is not finite or `max[i] <= min[i]`.
    pub fn new(min: [f64; INPUT_DIM], max: [f64; INPUT_DIM]) -> Result<Self> {
        for (feature, (&lo, &hi)) in min.iter().zip(&max).enumerate() {
            if !lo.is_finite() || !hi.is_finite() {
                return Err(InferenceErr::InvalidField {
                    field: format!("scaler range of feature {feature}"),
                    reason: format!("bounds must be finite, got [{lo}, {hi}]"),
                });
            }

            if hi <= lo {
                return Err(InferenceErr::DegenerateScaler {
                    feature,
                    min: lo,
                    max: hi,
                });
            }
        }

        Ok(Self { min, max })
    }

    /// Same as [`MinMaxScaler::new`] but from slices of unknown length, as found in artifacts.
    pub fn from_slices(min: &[f64], max: &[f64]) -> Result<Self> {
        let min: [f64; INPUT_DIM] = min.try_into().map_err(|_| InferenceErr::InvalidField {
            field: "scalerx_min".into(),
            reason: format!("expected {INPUT_DIM} values, got {}", min.len()),
        })?;
        let max: [f64; INPUT_DIM] = max.try_into().map_err(|_| InferenceErr::InvalidField {
            field: "scalerx_max".into(),
            reason: format!("expected {INPUT_DIM} values, got {}", max.len()),
        })?;

        Self::new(min, max)
    }

    pub fn min(&self) -> &[f64; INPUT_DIM] {
        &self.min
    }

    pub fn max(&self) -> &[f64; INPUT_DIM] {
        &self.max
    }

    /// Scales a raw input row, in double precision.
    pub fn transform(&self, row: &[f64; INPUT_DIM]) -> [f64; INPUT_DIM] {
        let mut out = [0.0; INPUT_DIM];
        for i in 0..INPUT_DIM {
            out[i] = (row[i] - self.min[i]) / (self.max[i] - self.min[i]);
        }
        out
    }
}
