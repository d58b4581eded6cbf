use inference::{MinMaxScaler, arch::OUTPUT_DIM};
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    query::{FEATURES, FeatureBound},
    registry::Registry,
};

pub const MODEL_CLASS: &str = "NNmodel";

/// Raw network outputs, in order.
pub const OUTPUT_FEATURES: [&str; OUTPUT_DIM] = [
    "X_raw",
    "log10(Mn)",
    "log10(Mw)",
    "log10(Mz)",
    "log10(Mz+1)",
    "log10(Mv)",
];

/// One entry of the model listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub is_default: bool,
    pub final_test_loss: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelList {
    pub models: Vec<ModelSummary>,
}

/// Lists every loaded variant in serving order.
pub fn list_models(registry: &Registry) -> ModelList {
    let models = registry
        .iter()
        .map(|(entry, predictor)| ModelSummary {
            name: entry.name.clone(),
            display_name: entry.display_name.clone(),
            description: entry.description.clone(),
            is_default: entry.name == registry.default_model(),
            final_test_loss: predictor.bundle().meta().final_test_loss,
        })
        .collect();

    ModelList { models }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRange {
    pub min: f64,
    pub max: f64,
    pub unit: String,
}

/// The fitted scaler bounds, keyed by feature symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerRanges {
    #[serde(rename = "M")]
    pub monomer: FeatureRange,
    #[serde(rename = "S")]
    pub solvent: FeatureRange,
    #[serde(rename = "I")]
    pub initiator: FeatureRange,
    #[serde(rename = "T")]
    pub temperature: FeatureRange,
    #[serde(rename = "t")]
    pub time: FeatureRange,
}

impl ScalerRanges {
    fn from_scaler(scaler: &MinMaxScaler) -> Self {
        let range = |i: usize| FeatureRange {
            min: scaler.min()[i],
            max: scaler.max()[i],
            unit: FEATURES[i].unit.to_string(),
        };

        Self {
            monomer: range(0),
            solvent: range(1),
            initiator: range(2),
            temperature: range(3),
            time: range(4),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConstraints {
    pub conversion: String,
    #[serde(rename = "raw_outputs[0]")]
    pub raw_conversion: String,
}

/// Everything known about one loaded variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_name: String,
    pub model_class: String,
    pub fold: u32,
    pub final_test_loss: f64,
    pub is_best: bool,
    pub architecture: String,
    pub input_features: Vec<String>,
    pub output_features: Vec<String>,
    pub served_output_constraints: OutputConstraints,
    pub scaler_ranges: ScalerRanges,
}

/// Describes the variant `name`, or the default one.
pub fn model_info(registry: &Registry, name: Option<&str>) -> Result<ModelInfo> {
    let (entry, predictor) = registry.resolve_entry(name)?;
    let bundle = predictor.bundle();
    let meta = bundle.meta();

    Ok(ModelInfo {
        model_name: entry.name.clone(),
        model_class: MODEL_CLASS.to_string(),
        fold: meta.fold,
        final_test_loss: meta.final_test_loss,
        is_best: meta.is_best,
        architecture: bundle.network().describe(),
        input_features: FEATURES.iter().map(FeatureBound::label).collect(),
        output_features: OUTPUT_FEATURES.iter().map(|s| s.to_string()).collect(),
        served_output_constraints: OutputConstraints {
            conversion: "clipped to [0, 1]".into(),
            raw_conversion: "unclipped X_raw".into(),
        },
        scaler_ranges: ScalerRanges::from_scaler(bundle.scaler()),
    })
}

#[cfg(test)]
mod tests {
    use inference::testing::Fixture;

    use super::*;
    use crate::config::ModelEntry;

    fn registry() -> Registry {
        let losses = [0.0091, 0.0057, 0.0042];
        let entries: Vec<_> = ModelEntry::defaults()
            .into_iter()
            .zip(losses)
            .map(|(e, loss)| {
                let p = Fixture::monotone(&e.name).with_loss(loss).predictor();
                (e, p)
            })
            .collect();

        Registry::from_predictors(entries, "sa_pcinn", 3).unwrap()
    }

    #[test]
    fn listing_marks_exactly_one_default() {
        let list = list_models(&registry());

        let names: Vec<_> = list.models.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["baseline_nn", "pcinn", "sa_pcinn"]);

        let defaults: Vec<_> = list.models.iter().filter(|m| m.is_default).collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].name, "sa_pcinn");
        assert_eq!(defaults[0].display_name, "SA-PCINN");
        assert_eq!(defaults[0].final_test_loss, 0.0042);
    }

    #[test]
    fn info_describes_the_network() {
        let info = model_info(&registry(), Some("pcinn")).unwrap();

        assert_eq!(info.model_name, "pcinn");
        assert_eq!(info.model_class, "NNmodel");
        assert_eq!(info.fold, 8);
        assert_eq!(info.final_test_loss, 0.0057);
        assert_eq!(info.architecture, "5 -> 128 (tanh) -> 64 (tanh) -> 6 (linear)");
        assert_eq!(info.input_features.len(), 5);
        assert_eq!(info.output_features[0], "X_raw");
    }

    #[test]
    fn info_reports_scaler_ranges() {
        let info = model_info(&registry(), None).unwrap();
        assert_eq!(info.model_name, "sa_pcinn");

        let t = &info.scaler_ranges.time;
        assert_eq!(t.min, Fixture::PHYSICAL_MIN[4]);
        assert_eq!(t.max, Fixture::PHYSICAL_MAX[4]);
        assert_eq!(t.unit, "s");

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["scaler_ranges"]["T"]["unit"], "K");
        assert_eq!(json["served_output_constraints"]["raw_outputs[0]"], "unclipped X_raw");
    }

    #[test]
    fn info_for_unknown_model_fails() {
        let err = model_info(&registry(), Some("gpt")).unwrap_err();
        assert_eq!(err.status(), 400);
    }
}
