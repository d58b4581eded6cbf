use std::{
    env,
    path::{Path, PathBuf},
};

use inference::bundle::BundleFormat;

use crate::error::{Result, ServingErr};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";
pub const DEFAULT_MODEL: &str = "sa_pcinn";
pub const DEFAULT_FOLD: u32 = 8;

/// A servable model variant and how it is presented to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelEntry {
    pub name: String,
    pub display_name: String,
    pub description: String,
}

impl ModelEntry {
    pub fn new(name: &str, display_name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            display_name: display_name.to_string(),
            description: description.to_string(),
        }
    }

    /// The three variants trained for the paper, in serving order.
    pub fn defaults() -> Vec<ModelEntry> {
        vec![
            Self::new(
                "baseline_nn",
                "Baseline NN",
                "Data-only MSE training, no Jacobian guidance",
            ),
            Self::new("pcinn", "PCINN", "Data + Jacobian matching to kinetic model"),
            Self::new(
                "sa_pcinn",
                "SA-PCINN",
                "Data + Jacobian matching + soft-anchor to theory predictions",
            ),
        ]
    }

    /// Where this variant's bundle lives: `{dir}/{name}_fold{fold}_bundle.{ext}`.
    ///
    /// The first format found on disk wins, JSON before safetensors. If none exists the JSON
    /// path is returned so the load error names it.
    pub fn bundle_path(&self, dir: &Path, fold: u32) -> PathBuf {
        let stem = format!("{}_fold{fold}_bundle", self.name);

        BundleFormat::ALL
            .into_iter()
            .map(|f| dir.join(format!("{stem}.{}", f.extension())))
            .find(|p| p.is_file())
            .unwrap_or_else(|| dir.join(format!("{stem}.{}", BundleFormat::Json.extension())))
    }
}

/// Process wide serving settings.
#[derive(Debug, Clone)]
pub struct ServingConfig {
    host: String,
    port: u16,
    artifacts_dir: PathBuf,
    default_model: String,
    fold: u32,
    models: Vec<ModelEntry>,
}

impl Default for ServingConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            artifacts_dir: PathBuf::from(DEFAULT_ARTIFACTS_DIR),
            default_model: DEFAULT_MODEL.to_string(),
            fold: DEFAULT_FOLD,
            models: ModelEntry::defaults(),
        }
    }
}

impl ServingConfig {
    /// Reads `HOST`, `PORT`, `ARTIFACTS_DIR`, `DEFAULT_MODEL` and `BUNDLE_FOLD` from the
    /// environment, falling back to the defaults for unset variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ServingConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(host) = lookup("HOST") {
            cfg.host = host;
        }
        if let Some(port) = lookup("PORT") {
            cfg.port = port
                .trim()
                .parse()
                .map_err(|e| ServingErr::InvalidConfig(format!("PORT={port}: {e}")))?;
        }
        if let Some(dir) = lookup("ARTIFACTS_DIR") {
            cfg.artifacts_dir = PathBuf::from(dir);
        }
        if let Some(model) = lookup("DEFAULT_MODEL") {
            cfg.default_model = model;
        }
        if let Some(fold) = lookup("BUNDLE_FOLD") {
            cfg.fold = fold
                .trim()
                .parse()
                .map_err(|e| ServingErr::InvalidConfig(format!("BUNDLE_FOLD={fold}: {e}")))?;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn with_artifacts_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.artifacts_dir = dir.into();
        self
    }

    pub fn with_default_model(mut self, name: &str) -> Self {
        self.default_model = name.to_string();
        self
    }

    pub fn with_models(mut self, models: Vec<ModelEntry>) -> Self {
        self.models = models;
        self
    }

    /// Checks the variant table is non-empty, without duplicates, and contains the default.
    pub fn validate(&self) -> Result<()> {
        if self.models.is_empty() {
            return Err(ServingErr::InvalidConfig(
                "at least one model must be configured".into(),
            ));
        }

        for (i, entry) in self.models.iter().enumerate() {
            if self.models[..i].iter().any(|e| e.name == entry.name) {
                return Err(ServingErr::InvalidConfig(format!(
                    "model {} is configured twice",
                    entry.name
                )));
            }
        }

        if !self.models.iter().any(|e| e.name == self.default_model) {
            return Err(ServingErr::InvalidConfig(format!(
                "default model {} is not one of the configured models",
                self.default_model
            )));
        }

        Ok(())
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn artifacts_dir(&self) -> &Path {
        &self.artifacts_dir
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    pub fn fold(&self) -> u32 {
        self.fold
    }

    pub fn models(&self) -> &[ModelEntry] {
        &self.models
    }

    /// The number of variants that must load before the service reports ready.
    pub fn expected_models(&self) -> usize {
        self.models.len()
    }
}
