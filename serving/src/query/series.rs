use std::collections::BTreeMap;

use inference::Prediction;
use serde::{Deserialize, Serialize};

/// Predictions in columnar form, one vector per output quantity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesSet {
    pub conversion: Vec<f64>,
    pub mn: Vec<f64>,
    pub mw: Vec<f64>,
    pub mz: Vec<f64>,
    pub mz_plus_1: Vec<f64>,
    pub mv: Vec<f64>,
    pub dispersity: Vec<f64>,
}

impl SeriesSet {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            conversion: Vec::with_capacity(n),
            mn: Vec::with_capacity(n),
            mw: Vec::with_capacity(n),
            mz: Vec::with_capacity(n),
            mz_plus_1: Vec::with_capacity(n),
            mv: Vec::with_capacity(n),
            dispersity: Vec::with_capacity(n),
        }
    }

    pub fn push(&mut self, p: &Prediction) {
        self.conversion.push(p.conversion);
        self.mn.push(p.mn);
        self.mw.push(p.mw);
        self.mz.push(p.mz);
        self.mz_plus_1.push(p.mz_plus_1);
        self.mv.push(p.mv);
        self.dispersity.push(p.dispersity);
    }

    pub fn len(&self) -> usize {
        self.conversion.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversion.is_empty()
    }
}

impl<'a> FromIterator<&'a Prediction> for SeriesSet {
    fn from_iter<I: IntoIterator<Item = &'a Prediction>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut set = Self::with_capacity(iter.size_hint().0);
        iter.for_each(|p| set.push(p));
        set
    }
}

/// One model swept over time. Serializes flat: `{"times": [..], "conversion": [..], ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub times: Vec<f64>,
    #[serde(flatten)]
    pub series: SeriesSet,
}

/// Every model swept over the same times, keyed by model name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub times: Vec<f64>,
    #[serde(flatten)]
    pub models: BTreeMap<String, SeriesSet>,
}

/// Batch predictions in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchPredictions {
    pub predictions: Vec<Prediction>,
}
