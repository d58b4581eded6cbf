use ndarray::{linalg, prelude::*};

use crate::{
    arch::activations::ActFn,
    bundle::Tensor,
    error::{InferenceErr, Result},
};

/// A fully connected layer computing `act_fn(x · w + b)` over a batch of rows.
///
/// The weights are kept as an `(n_in, n_out)` matrix so a row batch multiplies from the left.
#[derive(Debug, Clone)]
pub struct Dense {
    dim: (usize, usize),
    w: Array2<f32>,
    b: Array1<f32>,
    act_fn: Option<ActFn>,
}

impl Dense {
    /// Creates a new `Dense` from already shaped parameters.
    ///
    /// # Arguments
    /// * `w` - The `(n_in, n_out)` weight matrix.
    /// * `b` - The `n_out` bias vector.
    /// * `act_fn` - The activation, `None` for a linear layer.
    ///
    /// # Returns
    /// A new `Dense` or a shape mismatch if `b` does not match the output width of `w`.
    pub fn new(w: Array2<f32>, b: Array1<f32>, act_fn: Option<ActFn>) -> Result<Self> {
        if b.len() != w.ncols() {
            return Err(InferenceErr::ShapeMismatch {
                tensor: "bias".into(),
                got: vec![b.len()],
                expected: vec![w.ncols()],
            });
        }

        Ok(Self {
            dim: w.dim(),
            w,
            b,
            act_fn,
        })
    }

    /// Builds a layer from tensors stored the way the training framework exports them, that is,
    /// weights as an `(n_out, n_in)` row-major matrix.
    ///
    /// # Arguments
    /// * `name` - The layer's name in the state dict, e.g. `fc1`.
    /// * `dim` - The expected `(n_in, n_out)` dimensions.
    /// * `weight` - The exported weight tensor.
    /// * `bias` - The exported bias tensor.
    /// * `act_fn` - The activation, `None` for a linear layer.
    ///
    /// # Returns
    /// The layer, or an error if a shape is off or a value is not finite.
    pub fn from_exported(
        name: &str,
        dim: (usize, usize),
        weight: &Tensor,
        bias: &Tensor,
        act_fn: Option<ActFn>,
    ) -> Result<Self> {
        let (n_in, n_out) = dim;
        let weight_name = format!("{name}.weight");
        let bias_name = format!("{name}.bias");

        weight.expect_shape(&weight_name, &[n_out, n_in])?;
        bias.expect_shape(&bias_name, &[n_out])?;
        weight.expect_finite(&weight_name)?;
        bias.expect_finite(&bias_name)?;

        let w = Array2::from_shape_vec((n_out, n_in), weight.data().to_vec())
            .map_err(|_| InferenceErr::ShapeMismatch {
                tensor: weight_name,
                got: weight.shape().to_vec(),
                expected: vec![n_out, n_in],
            })?
            .reversed_axes();
        let b = Array1::from_vec(bias.data().to_vec());

        Self::new(w, b, act_fn)
    }

    /// Returns the `(n_in, n_out)` dimensions of this layer.
    pub fn dim(&self) -> (usize, usize) {
        self.dim
    }

    pub fn act_fn(&self) -> Option<ActFn> {
        self.act_fn
    }

    /// Makes a forward pass through the layer.
    ///
    /// # Arguments
    /// * `x` - A `(n, n_in)` batch of rows.
    ///
    /// # Returns
    /// The `(n, n_out)` activations.
    ///
    /// # Panics
    /// If `x` does not have `n_in` columns.
    pub fn forward(&self, x: ArrayView2<f32>) -> Array2<f32> {
        let mut z = Array2::zeros((x.nrows(), self.dim.1));
        linalg::general_mat_mul(1.0, &x, &self.w, 0.0, &mut z);
        z += &self.b;

        if let Some(act_fn) = &self.act_fn {
            z.mapv_inplace(|z| act_fn.f(z));
        }

        z
    }
}
