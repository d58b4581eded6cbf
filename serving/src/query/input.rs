use inference::InputRow;
use serde::{Deserialize, Serialize};

use crate::error::ValidationErr;

pub const MAX_BATCH_ROWS: usize = 1000;
pub const MIN_TIME_STEPS: usize = 2;
pub const MAX_TIME_STEPS: usize = 1000;
pub const DEFAULT_TIME_STEPS: usize = 100;

/// The admissible physical range of one input feature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureBound {
    /// Request field name.
    pub field: &'static str,
    /// Short symbol used in the model metadata.
    pub symbol: &'static str,
    pub unit: &'static str,
    pub min: f64,
    pub max: f64,
}

impl FeatureBound {
    /// Checks `value` lies in `[min, max]`, NaN never does.
    pub fn check(&self, value: f64) -> Result<(), ValidationErr> {
        if value >= self.min && value <= self.max {
            return Ok(());
        }

        Err(ValidationErr::new(
            self.field,
            format!(
                "must be between {} and {} {}, got {value}",
                self.min, self.max, self.unit
            ),
        ))
    }

    /// `[M] mol/L` style label.
    pub fn label(&self) -> String {
        match self.symbol {
            "T" | "t" => format!("{} {}", self.symbol, self.unit),
            s => format!("[{s}] {}", self.unit),
        }
    }
}

/// Input features in network order.
pub const FEATURES: [FeatureBound; 5] = [
    FeatureBound {
        field: "m_molar",
        symbol: "M",
        unit: "mol/L",
        min: 0.5,
        max: 5.0,
    },
    FeatureBound {
        field: "s_molar",
        symbol: "S",
        unit: "mol/L",
        min: 5.0,
        max: 9.5,
    },
    FeatureBound {
        field: "i_molar",
        symbol: "I",
        unit: "mol/L",
        min: 0.005,
        max: 0.1,
    },
    FeatureBound {
        field: "temperature_k",
        symbol: "T",
        unit: "K",
        min: 323.0,
        max: 363.0,
    },
    FeatureBound {
        field: "time_s",
        symbol: "t",
        unit: "s",
        min: 1.2,
        max: 35854.0,
    },
];

const TIME: FeatureBound = FEATURES[4];

/// One set of reaction conditions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReactionConditions {
    pub m_molar: f64,
    pub s_molar: f64,
    pub i_molar: f64,
    pub temperature_k: f64,
    pub time_s: f64,
}

impl ReactionConditions {
    pub fn validate(&self) -> Result<(), ValidationErr> {
        FEATURES
            .iter()
            .zip(self.to_row())
            .try_for_each(|(bound, value)| bound.check(value))
    }

    pub fn to_row(&self) -> InputRow {
        [
            self.m_molar,
            self.s_molar,
            self.i_molar,
            self.temperature_k,
            self.time_s,
        ]
    }
}

/// Validates a batch: the size cap first, then every row.
pub fn validate_batch(inputs: &[ReactionConditions]) -> Result<(), ValidationErr> {
    if inputs.len() > MAX_BATCH_ROWS {
        return Err(ValidationErr::new(
            "inputs",
            format!(
                "at most {MAX_BATCH_ROWS} rows per batch, got {}",
                inputs.len()
            ),
        ));
    }

    inputs.iter().enumerate().try_for_each(|(i, input)| {
        input
            .validate()
            .map_err(|e| e.within(&format!("inputs[{i}]")))
    })
}

fn default_time_steps() -> usize {
    DEFAULT_TIME_STEPS
}

/// Fixed conditions swept over a uniform time grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSweep {
    pub m_molar: f64,
    pub s_molar: f64,
    pub i_molar: f64,
    pub temperature_k: f64,
    #[serde(default)]
    pub time_start_s: f64,
    pub time_end_s: f64,
    #[serde(default = "default_time_steps")]
    pub time_steps: usize,
}

impl TimeSweep {
    pub fn validate(&self) -> Result<(), ValidationErr> {
        let fixed = [self.m_molar, self.s_molar, self.i_molar, self.temperature_k];
        FEATURES
            .iter()
            .zip(fixed)
            .try_for_each(|(bound, value)| bound.check(value))?;

        if !(self.time_start_s >= 0.0 && self.time_start_s.is_finite()) {
            return Err(ValidationErr::new(
                "time_start_s",
                format!("must be a finite value >= 0, got {}", self.time_start_s),
            ));
        }

        TIME.check(self.time_end_s)
            .map_err(|e| ValidationErr::new("time_end_s", e.constraint))?;

        if self.time_end_s < self.time_start_s {
            return Err(ValidationErr::new(
                "time_end_s",
                format!(
                    "must not be before time_start_s ({}), got {}",
                    self.time_start_s, self.time_end_s
                ),
            ));
        }

        if !(MIN_TIME_STEPS..=MAX_TIME_STEPS).contains(&self.time_steps) {
            return Err(ValidationErr::new(
                "time_steps",
                format!(
                    "must be between {MIN_TIME_STEPS} and {MAX_TIME_STEPS}, got {}",
                    self.time_steps
                ),
            ));
        }

        Ok(())
    }

    /// `time_steps` evenly spaced times, the first exactly `time_start_s` and the last exactly
    /// `time_end_s`.
    pub fn times(&self) -> Vec<f64> {
        linspace(self.time_start_s, self.time_end_s, self.time_steps)
    }

    /// One input row per time, every other feature held constant.
    pub fn rows(&self, times: &[f64]) -> Vec<InputRow> {
        times
            .iter()
            .map(|&t| {
                [
                    self.m_molar,
                    self.s_molar,
                    self.i_molar,
                    self.temperature_k,
                    t,
                ]
            })
            .collect()
    }
}

/// `n` evenly spaced values over `[start, end]`, computed as `start + i * step` with the last
/// value pinned to `end`.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            let mut out: Vec<f64> = (0..n).map(|i| start + i as f64 * step).collect();
            out[n - 1] = end;
            out
        }
    }
}
