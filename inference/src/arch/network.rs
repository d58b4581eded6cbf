use ndarray::{Array2, ArrayView2};

use super::{activations::ActFn, layers::Dense};
use crate::{
    bundle::StateDict,
    error::{InferenceErr, Result},
};

pub const INPUT_DIM: usize = 5;
pub const HIDDEN1_DIM: usize = 128;
pub const HIDDEN2_DIM: usize = 64;
pub const OUTPUT_DIM: usize = 6;

/// Names of the three linear layers inside an exported state dict, in forward order.
const LAYER_NAMES: [&str; 3] = ["fc1", "fc2", "fc3"];

/// The fixed `5 -> 128 (tanh) -> 64 (tanh) -> 6 (linear)` regression network.
///
/// Every model variant shares this topology, only the parameters differ. The network holds no
/// state besides its parameters, so a shared reference can serve any number of callers.
#[derive(Debug, Clone)]
pub struct Network {
    layers: [Dense; 3],
}

impl Network {
    /// Creates a new `Network` from its three layers.
    ///
    /// # Returns
    /// The network, or a shape mismatch if the layers do not chain into the fixed topology.
    pub fn new(layers: [Dense; 3]) -> Result<Self> {
        let expected = Self::dims();

        for ((layer, dim), name) in layers.iter().zip(expected).zip(LAYER_NAMES) {
            if layer.dim() != dim {
                return Err(InferenceErr::ShapeMismatch {
                    tensor: name.to_string(),
                    got: vec![layer.dim().0, layer.dim().1],
                    expected: vec![dim.0, dim.1],
                });
            }
        }

        Ok(Self { layers })
    }

    /// Builds the network from an exported state dict holding `fc{1,2,3}.{weight,bias}`.
    pub fn from_state_dict(state_dict: &StateDict) -> Result<Self> {
        let acts = [Some(ActFn::tanh()), Some(ActFn::tanh()), None];
        let mut layers = Vec::with_capacity(LAYER_NAMES.len());

        for ((name, dim), act_fn) in LAYER_NAMES.into_iter().zip(Self::dims()).zip(acts) {
            let weight = state_dict.get(&format!("{name}.weight"))?;
            let bias = state_dict.get(&format!("{name}.bias"))?;
            layers.push(Dense::from_exported(name, dim, weight, bias, act_fn)?);
        }

        let [fc1, fc2, fc3]: [Dense; 3] = layers
            .try_into()
            .map_err(|_| InferenceErr::MissingField("layers".into()))?;

        Self::new([fc1, fc2, fc3])
    }

    /// The `(n_in, n_out)` dimensions of each layer.
    pub fn dims() -> [(usize, usize); 3] {
        [
            (INPUT_DIM, HIDDEN1_DIM),
            (HIDDEN1_DIM, HIDDEN2_DIM),
            (HIDDEN2_DIM, OUTPUT_DIM),
        ]
    }

    /// Describes the architecture, e.g. `5 -> 128 (tanh) -> 64 (tanh) -> 6 (linear)`.
    pub fn describe(&self) -> String {
        let mut s = self.layers[0].dim().0.to_string();

        for layer in &self.layers {
            let act = layer.act_fn().map(|a| a.name()).unwrap_or("linear");
            s.push_str(&format!(" -> {} ({act})", layer.dim().1));
        }

        s
    }

    /// Makes a forward pass through the network.
    ///
    /// # Arguments
    /// * `x` - A `(n, 5)` batch of already scaled rows.
    ///
    /// # Returns
    /// The `(n, 6)` raw outputs, one row per input row.
    ///
    /// # Panics
    /// If `x` does not have exactly `INPUT_DIM` columns.
    pub fn forward(&self, x: ArrayView2<f32>) -> Array2<f32> {
        assert_eq!(x.ncols(), INPUT_DIM, "network input must have {INPUT_DIM} columns");

        let [fc1, fc2, fc3] = &self.layers;
        let h1 = fc1.forward(x);
        let h2 = fc2.forward(h1.view());
        fc3.forward(h2.view())
    }

    /// Single row form of [`Network::forward`].
    pub fn forward_one(&self, x: [f32; INPUT_DIM]) -> [f32; OUTPUT_DIM] {
        let x = Array2::from_shape_fn((1, INPUT_DIM), |(_, j)| x[j]);
        let y = self.forward(x.view());

        let mut out = [0.0; OUTPUT_DIM];
        out.iter_mut().zip(y.iter()).for_each(|(o, &v)| *o = v);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;

    /// Straightforward triple loop version of the forward pass, in the same precision.
    fn naive_forward(state_dict: &StateDict, x: &[f32]) -> Vec<f32> {
        let mut a = x.to_vec();

        for (i, name) in LAYER_NAMES.iter().enumerate() {
            let w = state_dict.get(&format!("{name}.weight")).unwrap();
            let b = state_dict.get(&format!("{name}.bias")).unwrap();
            let (n_out, n_in) = (w.shape()[0], w.shape()[1]);

            let mut z = vec![0.0_f32; n_out];
            for o in 0..n_out {
                let mut acc = 0.0_f32;
                for k in 0..n_in {
                    acc += a[k] * w.data()[o * n_in + k];
                }
                z[o] = acc + b.data()[o];
                if i < 2 {
                    z[o] = z[o].tanh();
                }
            }
            a = z;
        }

        a
    }

    #[test]
    fn describe_matches_topology() {
        let net = Fixture::scrambled().network();
        assert_eq!(net.describe(), "5 -> 128 (tanh) -> 64 (tanh) -> 6 (linear)");
    }

    #[test]
    fn forward_matches_naive_reference() {
        let fixture = Fixture::scrambled();
        let net = fixture.network();
        let state_dict = fixture.state_dict();

        let x = [0.1_f32, 0.9, 0.35, 0.5, 0.75];
        let got = net.forward_one(x);
        let want = naive_forward(&state_dict, &x);

        for (g, w) in got.iter().zip(&want) {
            assert!((g - w).abs() < 1e-4, "got {got:?}, want {want:?}");
        }
    }

    #[test]
    fn forward_rows_are_independent() {
        let net = Fixture::scrambled().network();
        let a = [0.2_f32, 0.4, 0.6, 0.8, 1.0];
        let b = [1.5_f32, -0.3, 0.0, 0.25, 0.5];

        let both = ndarray::array![[a[0], a[1], a[2], a[3], a[4]], [b[0], b[1], b[2], b[3], b[4]]];
        let y = net.forward(both.view());

        let ya = net.forward_one(a);
        let yb = net.forward_one(b);
        for j in 0..OUTPUT_DIM {
            assert!((y[[0, j]] - ya[j]).abs() < 1e-4);
            assert!((y[[1, j]] - yb[j]).abs() < 1e-4);
        }
    }

    #[test]
    fn from_state_dict_reports_missing_tensor() {
        let mut state_dict = Fixture::scrambled().state_dict();
        state_dict.remove("fc2.bias");

        let err = Network::from_state_dict(&state_dict).unwrap_err();
        assert!(matches!(err, InferenceErr::MissingField(ref f) if f == "fc2.bias"));
    }

    #[test]
    fn from_state_dict_reports_wrong_hidden_width() {
        let mut state_dict = Fixture::scrambled().state_dict();
        state_dict.insert(
            "fc1.bias",
            crate::bundle::Tensor::new(vec![127], vec![0.0; 127]).unwrap(),
        );

        let err = Network::from_state_dict(&state_dict).unwrap_err();
        assert!(matches!(
            err,
            InferenceErr::ShapeMismatch { ref tensor, .. } if tensor == "fc1.bias"
        ));
    }
}
