use log::trace;
use ndarray::Array2;

use crate::{
    Prediction, WeightBundle,
    arch::{INPUT_DIM, OUTPUT_DIM},
};

/// One unscaled input row: `[M] mol/L, [S] mol/L, [I] mol/L, T K, t s`.
pub type InputRow = [f64; INPUT_DIM];

/// Serves predictions for one trained variant.
///
/// A predictor is a pure function of its bundle and the input rows, it can be shared freely
/// between threads.
#[derive(Debug, Clone)]
pub struct Predictor {
    bundle: WeightBundle,
}

impl Predictor {
    pub fn new(bundle: WeightBundle) -> Self {
        Self { bundle }
    }

    pub fn bundle(&self) -> &WeightBundle {
        &self.bundle
    }

    /// Scales the rows and runs the network, without post-processing.
    ///
    /// Scaling happens in double precision, everything after the cast to `f32`.
    ///
    /// # Returns
    /// A `(rows.len(), 6)` matrix of raw outputs.
    pub fn forward_raw(&self, rows: &[InputRow]) -> Array2<f32> {
        let scaler = self.bundle.scaler();
        let scaled: Vec<InputRow> = rows.iter().map(|row| scaler.transform(row)).collect();
        let x = Array2::from_shape_fn((scaled.len(), INPUT_DIM), |(i, j)| scaled[i][j] as f32);

        self.bundle.network().forward(x.view())
    }

    /// Predicts every row independently, preserving the input order.
    pub fn predict(&self, rows: &[InputRow]) -> Vec<Prediction> {
        if rows.is_empty() {
            return Vec::new();
        }

        trace!(model = self.bundle.model_name(), rows = rows.len(); "forward pass");

        self.forward_raw(rows)
            .rows()
            .into_iter()
            .map(|y| {
                let mut raw = [0.0_f32; OUTPUT_DIM];
                raw.iter_mut().zip(y.iter()).for_each(|(r, &v)| *r = v);
                Prediction::from_raw(&raw)
            })
            .collect()
    }

    /// Single row form of [`Predictor::predict`].
    pub fn predict_one(&self, row: &InputRow) -> Prediction {
        let raw = self.forward_raw(std::slice::from_ref(row));

        let mut out = [0.0_f32; OUTPUT_DIM];
        out.iter_mut().zip(raw.iter()).for_each(|(o, &v)| *o = v);
        Prediction::from_raw(&out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;

    const REFERENCE: InputRow = [3.326, 6.674, 0.0246, 333.0, 7200.0];

    #[test]
    fn reference_point_is_physically_sensible() {
        let p = Fixture::monotone("sa_pcinn").predictor().predict_one(&REFERENCE);

        assert!((0.0..=1.0).contains(&p.conversion));
        assert!(p.mn > 0.0);
        assert!(p.mw >= p.mn);
        assert!(p.dispersity >= 1.0);
        assert_eq!(p.raw_outputs.len(), 6);
    }

    #[test]
    fn longer_reaction_converts_more() {
        let predictor = Fixture::monotone("sa_pcinn").predictor();
        let mut later = REFERENCE;
        later[4] = 14400.0;

        let out = predictor.predict(&[REFERENCE, later]);
        assert!(out[1].conversion >= out[0].conversion);
    }

    #[test]
    fn batch_matches_single() {
        let predictor = Fixture::scrambled().predictor();
        let rows = [
            REFERENCE,
            [0.5, 5.0, 0.005, 323.0, 1.2],
            [5.0, 9.5, 0.1, 363.0, 35854.0],
            [2.0, 7.0, 0.05, 340.0, 100.0],
        ];

        let batch = predictor.predict(&rows);
        assert_eq!(batch.len(), rows.len());

        for (row, got) in rows.iter().zip(&batch) {
            let single = predictor.predict_one(row);
            for (a, b) in got.raw_outputs.iter().zip(&single.raw_outputs) {
                assert!((a - b).abs() < 1e-4, "{got:?} vs {single:?}");
            }
        }
    }

    #[test]
    fn conversion_is_clamped_for_out_of_range_network_output() {
        let high = Fixture::monotone("pcinn")
            .with_output_bias([2.5, 4.0, 4.3, 4.5, 4.7, 4.2])
            .predictor()
            .predict_one(&REFERENCE);
        assert_eq!(high.conversion, 1.0);
        assert!(high.raw_outputs[0] > 1.0);

        let low = Fixture::monotone("pcinn")
            .with_output_bias([-3.0, 4.0, 4.3, 4.5, 4.7, 4.2])
            .predictor()
            .predict_one(&REFERENCE);
        assert_eq!(low.conversion, 0.0);
        assert!(low.raw_outputs[0] < 0.0);
    }

    #[test]
    fn inputs_outside_scaler_range_extrapolate() {
        // t = 0 sits below the fitted minimum, the row is still served.
        let predictor = Fixture::monotone("pcinn").predictor();
        let mut early = REFERENCE;
        early[4] = 0.0;

        let p = predictor.predict_one(&early);
        assert!((0.0..=1.0).contains(&p.conversion));
        assert!(p.raw_outputs.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn empty_batch_yields_nothing() {
        assert!(Fixture::scrambled().predictor().predict(&[]).is_empty());
    }
}
