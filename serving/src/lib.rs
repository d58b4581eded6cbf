pub mod catalog;
pub mod config;
pub mod error;
pub mod health;
pub mod protocol;
pub mod query;
pub mod registry;
mod service;
pub mod transport;

pub use config::{ModelEntry, ServingConfig};
pub use error::{Result, ServingErr, ValidationErr};
pub use registry::Registry;
pub use service::Service;
