mod assemble;
pub mod input;
mod series;

pub use assemble::{batch, compare, single, timeseries};
pub use input::{FEATURES, FeatureBound, ReactionConditions, TimeSweep};
pub use series::{BatchPredictions, Comparison, SeriesSet, TimeSeries};
