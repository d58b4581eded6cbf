use serde::{Deserialize, Serialize};

use crate::arch::OUTPUT_DIM;

/// The domain quantities derived from one raw network output row.
///
/// Raw layout: `[conversion, log10(Mn), log10(Mw), log10(Mz), log10(Mz+1), log10(Mv)]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Monomer conversion, clamped to `[0, 1]`.
    pub conversion: f64,
    pub mn: f64,
    pub mw: f64,
    pub mz: f64,
    pub mz_plus_1: f64,
    pub mv: f64,
    /// `mw / mn`, or `0.0` when `mn` underflowed to zero.
    pub dispersity: f64,
    /// The unclamped network output, kept for diagnostics.
    pub raw_outputs: [f64; OUTPUT_DIM],
}

impl Prediction {
    /// Post-processes a raw output row.
    ///
    /// Moments are exponentiated in single precision, like the rest of the network, and
    /// widened afterwards.
    pub fn from_raw(raw: &[f32; OUTPUT_DIM]) -> Self {
        let moment = |log10: f32| f64::from(10.0_f32.powf(log10));

        let mn = moment(raw[1]);
        let mw = moment(raw[2]);
        // NOTE: `mn <= 0` only happens when the log value underflows. Served dispersity is
        // otherwise >= 1 for a sensible model, 0.0 marks the underflow and is never floored.
        let dispersity = if mn > 0.0 { mw / mn } else { 0.0 };

        Self {
            conversion: f64::from(raw[0]).clamp(0.0, 1.0),
            mn,
            mw,
            mz: moment(raw[3]),
            mz_plus_1: moment(raw[4]),
            mv: moment(raw[5]),
            dispersity,
            raw_outputs: raw.map(f64::from),
        }
    }
}
