use std::{
    error::Error,
    fmt::{self, Display},
    io,
    path::PathBuf,
};

use safetensors::SafeTensorError;

/// The result type used in the entire inference module.
pub type Result<T> = std::result::Result<T, InferenceErr>;

/// The inference module's error type.
///
/// Every variant is a load-time failure: once a `WeightBundle` exists, predicting never fails.
#[derive(Debug)]
pub enum InferenceErr {
    Io {
        path: PathBuf,
        source: io::Error,
    },
    Json(serde_json::Error),
    SafeTensors(SafeTensorError),
    MissingField(String),
    InvalidField {
        field: String,
        reason: String,
    },
    ShapeMismatch {
        tensor: String,
        got: Vec<usize>,
        expected: Vec<usize>,
    },
    NonFinite {
        tensor: String,
    },
    DegenerateScaler {
        feature: usize,
        min: f64,
        max: f64,
    },
    UnsupportedFormat(String),
}

impl Display for InferenceErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InferenceErr::Io { path, source } => {
                write!(f, "cannot read bundle '{}': {source}", path.display())
            }
            InferenceErr::Json(e) => write!(f, "malformed json bundle: {e}"),
            InferenceErr::SafeTensors(e) => write!(f, "malformed safetensors bundle: {e}"),
            InferenceErr::MissingField(field) => write!(f, "bundle is missing field {field}"),
            InferenceErr::InvalidField { field, reason } => {
                write!(f, "bundle field {field} is invalid: {reason}")
            }
            InferenceErr::ShapeMismatch {
                tensor,
                got,
                expected,
            } => write!(
                f,
                "tensor {tensor} has shape {got:?}, the network expects {expected:?}"
            ),
            InferenceErr::NonFinite { tensor } => {
                write!(f, "tensor {tensor} contains non finite values")
            }
            InferenceErr::DegenerateScaler { feature, min, max } => write!(
                f,
                "scaler range of feature {feature} is degenerate, min {min} is not below max {max}"
            ),
            InferenceErr::UnsupportedFormat(what) => write!(f, "unsupported bundle format: {what}"),
        }
    }
}

impl Error for InferenceErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            InferenceErr::Io { source, .. } => Some(source),
            InferenceErr::Json(e) => Some(e),
            InferenceErr::SafeTensors(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for InferenceErr {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<SafeTensorError> for InferenceErr {
    fn from(value: SafeTensorError) -> Self {
        Self::SafeTensors(value)
    }
}
