use std::collections::HashMap;

use inference::{Predictor, WeightBundle};
use log::{info, warn};

use crate::{
    config::{ModelEntry, ServingConfig},
    error::{Result, ServingErr},
};

/// Every servable model variant, keyed by name, plus the default one.
///
/// Built once at startup and only read afterwards, so it can be shared behind an `Arc` without
/// any locking.
#[derive(Debug)]
pub struct Registry {
    entries: Vec<(ModelEntry, Predictor)>,
    index: HashMap<String, usize>,
    default_model: String,
    expected: usize,
}

impl Registry {
    /// Loads every configured variant from the artifacts directory.
    ///
    /// # Returns
    /// The registry, or the first load failure. A registry is never built with a subset of the
    /// configured variants.
    pub fn load(config: &ServingConfig) -> Result<Self> {
        config.validate()?;
        let mut entries = Vec::with_capacity(config.models().len());

        for entry in config.models() {
            let path = entry.bundle_path(config.artifacts_dir(), config.fold());
            let bundle = WeightBundle::load(&path).map_err(|source| ServingErr::Load {
                model: entry.name.clone(),
                path: path.clone(),
                source,
            })?;

            let meta = bundle.meta();
            if meta.model_name != entry.name {
                warn!(
                    "bundle at {} declares model {}, serving it as {}",
                    path.display(),
                    meta.model_name,
                    entry.name
                );
            }

            info!(
                model = entry.name.as_str(),
                fold = meta.fold,
                loss = meta.final_test_loss,
                best = meta.is_best;
                "loaded model bundle"
            );
            entries.push((entry.clone(), Predictor::new(bundle)));
        }

        let registry = Self::from_predictors(
            entries,
            config.default_model(),
            config.expected_models(),
        )?;
        info!("{} model(s) ready, default is {}", registry.len(), registry.default_model);

        Ok(registry)
    }

    /// Builds a registry from already loaded predictors.
    ///
    /// # Arguments
    /// * `entries` - The variants, in serving order.
    /// * `default_model` - Must be one of the entries' names.
    /// * `expected` - How many variants must be present for the registry to count as ready.
    pub fn from_predictors<I>(entries: I, default_model: &str, expected: usize) -> Result<Self>
    where
        I: IntoIterator<Item = (ModelEntry, Predictor)>,
    {
        let entries: Vec<_> = entries.into_iter().collect();
        let mut index = HashMap::with_capacity(entries.len());

        for (i, (entry, _)) in entries.iter().enumerate() {
            if index.insert(entry.name.clone(), i).is_some() {
                return Err(ServingErr::InvalidConfig(format!(
                    "model {} is registered twice",
                    entry.name
                )));
            }
        }

        if !index.contains_key(default_model) {
            return Err(ServingErr::InvalidConfig(format!(
                "default model {default_model} is not registered"
            )));
        }

        Ok(Self {
            entries,
            index,
            default_model: default_model.to_string(),
            expected,
        })
    }

    /// Returns the predictor for `name`, or for the default model if `None`.
    pub fn resolve(&self, name: Option<&str>) -> Result<&Predictor> {
        self.resolve_entry(name).map(|(_, predictor)| predictor)
    }

    /// Same as [`Registry::resolve`] but also returns the variant's description.
    pub fn resolve_entry(&self, name: Option<&str>) -> Result<(&ModelEntry, &Predictor)> {
        let name = name.unwrap_or(&self.default_model);

        let &i = self
            .index
            .get(name)
            .ok_or_else(|| ServingErr::UnknownModel {
                requested: name.to_string(),
                available: self.names_sorted(),
            })?;

        let (entry, predictor) = &self.entries[i];
        Ok((entry, predictor))
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn expected_models(&self) -> usize {
        self.expected
    }

    /// Whether every expected variant is present.
    pub fn is_ready(&self) -> bool {
        self.len() >= self.expected
    }

    /// Registered names, in serving order.
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(e, _)| e.name.clone()).collect()
    }

    pub fn names_sorted(&self) -> Vec<String> {
        let mut names = self.names();
        names.sort();
        names
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ModelEntry, &Predictor)> {
        self.entries.iter().map(|(e, p)| (e, p))
    }
}
