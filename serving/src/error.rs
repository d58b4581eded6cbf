use std::{error::Error, fmt, io, path::PathBuf};

use inference::InferenceErr;
use serde::Serialize;

/// The serving module's result type.
pub type Result<T> = std::result::Result<T, ServingErr>;

/// A rejected request input, naming the offending field and the violated constraint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationErr {
    pub field: String,
    pub constraint: String,
}

impl ValidationErr {
    pub fn new(field: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            constraint: constraint.into(),
        }
    }

    /// Prefixes the field path, e.g. `m_molar` becomes `inputs[3].m_molar`.
    pub fn within(mut self, parent: &str) -> Self {
        self.field = format!("{parent}.{}", self.field);
        self
    }
}

impl fmt::Display for ValidationErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.constraint)
    }
}

impl Error for ValidationErr {}

/// Serving failures.
#[derive(Debug)]
pub enum ServingErr {
    /// A bundle could not be loaded at startup, the process must not become ready.
    Load {
        model: String,
        path: PathBuf,
        source: InferenceErr,
    },
    UnknownModel {
        requested: String,
        /// Sorted.
        available: Vec<String>,
    },
    Validation(ValidationErr),
    InvalidConfig(String),
    Io(io::Error),
}

impl ServingErr {
    /// The status code reported to clients for this error.
    pub fn status(&self) -> u16 {
        match self {
            ServingErr::Validation(_) => 422,
            ServingErr::UnknownModel { .. } => 400,
            _ => 500,
        }
    }
}

impl fmt::Display for ServingErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServingErr::Load {
                model,
                path,
                source,
            } => write!(f, "failed to load model {model} from '{}': {source}", path.display()),
            ServingErr::UnknownModel {
                requested,
                available,
            } => write!(
                f,
                "Unknown model '{requested}'. Available: {}",
                available.join(", ")
            ),
            ServingErr::Validation(e) => write!(f, "invalid input: {e}"),
            ServingErr::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            ServingErr::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl Error for ServingErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ServingErr::Load { source, .. } => Some(source),
            ServingErr::Validation(e) => Some(e),
            ServingErr::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ValidationErr> for ServingErr {
    fn from(value: ValidationErr) -> Self {
        Self::Validation(value)
    }
}

impl From<io::Error> for ServingErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

/// Boundary conversion for binaries / I/O APIs.
impl From<ServingErr> for io::Error {
    fn from(value: ServingErr) -> Self {
        match value {
            ServingErr::Io(e) => e,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}
