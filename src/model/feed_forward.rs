use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::math::Matrix;
use crate::optim::Sgd;

/// Position-wise feed-forward sublayer: `relu(x W1 + b1) W2 + b2`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedForward {
    pub w1: Matrix,
    pub b1: Vec<f64>,
    pub w2: Matrix,
    pub b2: Vec<f64>,
}

pub struct FfnCache {
    input: Matrix,
    /// Pre-activation `x W1 + b1`, needed for the ReLU derivative.
    pre: Matrix,
    hidden: Matrix,
}

impl FeedForward {
    pub fn new<R: Rng>(d_model: usize, d_ffn: usize, rng: &mut R) -> Self {
        FeedForward {
            w1: Matrix::xavier(d_model, d_ffn, rng),
            b1: vec![0.0; d_ffn],
            w2: Matrix::xavier(d_ffn, d_model, rng),
            b2: vec![0.0; d_model],
        }
    }

    pub fn forward(&self, input: &Matrix) -> (Matrix, FfnCache) {
        let pre = input.matmul(&self.w1).add_row(&self.b1);
        let hidden = pre.map(|x| if x > 0.0 { x } else { 0.0 });
        let output = hidden.matmul(&self.w2).add_row(&self.b2);
        let cache = FfnCache {
            input: input.clone(),
            pre,
            hidden,
        };
        (output, cache)
    }

    /// Backpropagates `d_out`, updates the weights, and returns the gradient
    /// flowing to the input (the caller owns the residual connection).
    pub fn backward(&mut self, cache: &FfnCache, d_out: &Matrix, optimizer: &Sgd) -> Matrix {
        let d_w2 = cache.hidden.transpose().matmul(d_out);
        let d_b2 = d_out.col_sums();

        let d_hidden = d_out.matmul(&self.w2.transpose());
        let relu_grad = cache.pre.map(|x| if x > 0.0 { 1.0 } else { 0.0 });
        let d_pre = d_hidden.hadamard(&relu_grad);

        let d_w1 = cache.input.transpose().matmul(&d_pre);
        let d_b1 = d_pre.col_sums();

        // Input gradient must use the pre-update weights.
        let d_input = d_pre.matmul(&self.w1.transpose());

        optimizer.step(&mut self.w1, &d_w1);
        optimizer.step_bias(&mut self.b1, &d_b1);
        optimizer.step(&mut self.w2, &d_w2);
        optimizer.step_bias(&mut self.b2, &d_b2);

        d_input
    }
}
