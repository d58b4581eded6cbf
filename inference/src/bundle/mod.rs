mod json;
mod st;
mod state_dict;

use std::{fs, path::Path};

use log::debug;
use serde::{Deserialize, Serialize};

pub use state_dict::{StateDict, Tensor};

use crate::{
    MinMaxScaler,
    arch::Network,
    error::{InferenceErr, Result},
};

/// Descriptive fields stored alongside the parameters of a trained variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleMeta {
    pub model_name: String,
    /// The cross validation fold that produced the bundle.
    pub fold: u32,
    pub final_test_loss: f64,
    /// Informational only, it does not affect serving.
    pub is_best: bool,
}

/// The on-disk encodings a bundle can come in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleFormat {
    Json,
    SafeTensors,
}

impl BundleFormat {
    /// All supported formats, in lookup preference order.
    pub const ALL: [BundleFormat; 2] = [BundleFormat::Json, BundleFormat::SafeTensors];

    pub fn extension(self) -> &'static str {
        match self {
            BundleFormat::Json => "json",
            BundleFormat::SafeTensors => "safetensors",
        }
    }

    /// Guesses the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();

        Self::ALL
            .into_iter()
            .find(|f| f.extension() == ext)
            .ok_or_else(|| {
                InferenceErr::UnsupportedFormat(format!(
                    "'{}' has no .json or .safetensors extension",
                    path.display()
                ))
            })
    }
}

/// A trained model variant: network parameters, input normalization and metadata.
///
/// Bundles are validated on construction and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct WeightBundle {
    network: Network,
    scaler: MinMaxScaler,
    meta: BundleMeta,
}

impl WeightBundle {
    /// Creates a new `WeightBundle`.
    ///
    /// # Returns
    /// The bundle, or an error if the metadata is invalid.
    pub fn new(network: Network, scaler: MinMaxScaler, meta: BundleMeta) -> Result<Self> {
        if meta.model_name.trim().is_empty() {
            return Err(InferenceErr::InvalidField {
                field: "model_name".into(),
                reason: "must not be empty".into(),
            });
        }

        if !meta.final_test_loss.is_finite() || meta.final_test_loss < 0.0 {
            return Err(InferenceErr::InvalidField {
                field: "final_test_loss".into(),
                reason: format!("must be finite and non negative, got {}", meta.final_test_loss),
            });
        }

        Ok(Self {
            network,
            scaler,
            meta,
        })
    }

    /// Assembles and validates a bundle from its decoded parts.
    pub fn from_parts(
        state_dict: &StateDict,
        scaler_min: &[f64],
        scaler_max: &[f64],
        meta: BundleMeta,
    ) -> Result<Self> {
        let network = Network::from_state_dict(state_dict)?;
        let scaler = MinMaxScaler::from_slices(scaler_min, scaler_max)?;
        Self::new(network, scaler, meta)
    }

    /// Reads and validates a bundle, the format is chosen by the file extension.
    ///
    /// # Arguments
    /// * `path` - Path to a `.json` or `.safetensors` bundle.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let format = BundleFormat::from_path(path)?;
        let bytes = fs::read(path).map_err(|source| InferenceErr::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let bundle = Self::from_slice(&bytes, format)?;
        debug!(
            path:% = path.display(),
            model = bundle.meta.model_name.as_str(),
            fold = bundle.meta.fold;
            "decoded weight bundle"
        );

        Ok(bundle)
    }

    /// Decodes a bundle held in memory.
    pub fn from_slice(bytes: &[u8], format: BundleFormat) -> Result<Self> {
        match format {
            BundleFormat::Json => json::decode(bytes),
            BundleFormat::SafeTensors => st::decode(bytes),
        }
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn scaler(&self) -> &MinMaxScaler {
        &self.scaler
    }

    pub fn meta(&self) -> &BundleMeta {
        &self.meta
    }

    pub fn model_name(&self) -> &str {
        &self.meta.model_name
    }
}
