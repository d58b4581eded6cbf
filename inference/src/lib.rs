pub mod arch;
pub mod bundle;
pub mod error;
mod prediction;
mod predictor;
mod scaler;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use bundle::{BundleMeta, WeightBundle};
pub use error::{InferenceErr, Result};
pub use prediction::Prediction;
pub use predictor::{InputRow, Predictor};
pub use scaler::MinMaxScaler;
