use serde::{Deserialize, Serialize};

use crate::registry::Registry;

pub const RUNTIME_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub models_loaded: usize,
    pub available_models: Vec<String>,
    pub default_model: String,
    pub runtime_version: String,
    /// Fold of the first registered variant.
    pub fold: Option<u32>,
}

pub fn health(registry: &Registry) -> Health {
    Health {
        status: "healthy".into(),
        models_loaded: registry.len(),
        available_models: registry.names(),
        default_model: registry.default_model().to_string(),
        runtime_version: RUNTIME_VERSION.into(),
        fold: registry.iter().next().map(|(_, p)| p.bundle().meta().fold),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Readiness {
    pub status: String,
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        self.status == "ready"
    }

    /// 200 when ready, 503 otherwise.
    pub fn status_code(&self) -> u16 {
        if self.is_ready() { 200 } else { 503 }
    }
}

pub fn readiness(registry: &Registry) -> Readiness {
    let status = if registry.is_ready() {
        "ready"
    } else {
        "not ready"
    };

    Readiness {
        status: status.into(),
    }
}

#[cfg(test)]
mod tests {
    use inference::testing::Fixture;

    use super::*;
    use crate::config::ModelEntry;

    fn registry(n: usize, fold: u32) -> Registry {
        let entries: Vec<_> = ModelEntry::defaults()
            .into_iter()
            .take(n)
            .map(|e| {
                let p = Fixture::monotone(&e.name).with_fold(fold).predictor();
                (e, p)
            })
            .collect();
        let default = entries[0].0.name.clone();

        Registry::from_predictors(entries, &default, 3).unwrap()
    }

    #[test]
    fn health_lists_models_in_order() {
        let h = health(&registry(3, 5));

        assert_eq!(h.status, "healthy");
        assert_eq!(h.models_loaded, 3);
        assert_eq!(h.available_models, ["baseline_nn", "pcinn", "sa_pcinn"]);
        assert_eq!(h.default_model, "baseline_nn");
        assert_eq!(h.fold, Some(5));
        assert!(!h.runtime_version.is_empty());
    }

    #[test]
    fn full_registry_is_ready() {
        let r = readiness(&registry(3, 8));
        assert!(r.is_ready());
        assert_eq!(r.status_code(), 200);
    }

    #[test]
    fn partial_registry_is_not_ready() {
        let r = readiness(&registry(2, 8));
        assert_eq!(r.status, "not ready");
        assert_eq!(r.status_code(), 503);
    }
}
