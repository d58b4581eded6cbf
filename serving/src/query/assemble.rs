use inference::Prediction;
use log::debug;

use super::{
    input::{self, ReactionConditions, TimeSweep},
    series::{BatchPredictions, Comparison, SeriesSet, TimeSeries},
};
use crate::{error::Result, registry::Registry};

/// Predicts one set of conditions.
///
/// # Arguments
/// * `registry` - The loaded variants.
/// * `model` - The variant to use, the default one if `None`.
/// * `input` - The conditions, validated before the model is resolved.
pub fn single(
    registry: &Registry,
    model: Option<&str>,
    input: &ReactionConditions,
) -> Result<Prediction> {
    input.validate()?;
    let predictor = registry.resolve(model)?;

    Ok(predictor.predict_one(&input.to_row()))
}

/// Predicts up to [`input::MAX_BATCH_ROWS`] rows in one forward pass.
///
/// The whole batch is validated before any row is evaluated, a single bad row rejects it.
pub fn batch(
    registry: &Registry,
    model: Option<&str>,
    inputs: &[ReactionConditions],
) -> Result<BatchPredictions> {
    input::validate_batch(inputs)?;
    let predictor = registry.resolve(model)?;

    let rows: Vec<_> = inputs.iter().map(ReactionConditions::to_row).collect();
    debug!(model = predictor.bundle().model_name(), rows = rows.len(); "batch prediction");

    Ok(BatchPredictions {
        predictions: predictor.predict(&rows),
    })
}

/// Sweeps one variant over a uniform time grid.
pub fn timeseries(registry: &Registry, model: Option<&str>, sweep: &TimeSweep) -> Result<TimeSeries> {
    sweep.validate()?;
    let predictor = registry.resolve(model)?;

    let times = sweep.times();
    let series: SeriesSet = predictor.predict(&sweep.rows(&times)).iter().collect();

    Ok(TimeSeries { times, series })
}

/// Sweeps every registered variant over the same grid.
pub fn compare(registry: &Registry, sweep: &TimeSweep) -> Result<Comparison> {
    sweep.validate()?;

    let times = sweep.times();
    let rows = sweep.rows(&times);

    let models = registry
        .iter()
        .map(|(entry, predictor)| {
            let set: SeriesSet = predictor.predict(&rows).iter().collect();
            (entry.name.clone(), set)
        })
        .collect();

    debug!(models = registry.len(), steps = times.len(); "comparison sweep");
    Ok(Comparison { times, models })
}
