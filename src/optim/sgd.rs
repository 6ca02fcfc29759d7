use crate::math::Matrix;

pub struct Sgd {
    pub learning_rate: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Sgd {
        Sgd { learning_rate }
    }

    /// Applies one SGD update to a parameter matrix given its gradient.
    pub fn step(&self, param: &mut Matrix, grad: &Matrix) {
        *param = param.sub(&grad.scale(self.learning_rate));
    }

    /// Same update for a bias vector.
    pub fn step_bias(&self, bias: &mut [f64], grad: &[f64]) {
        for (b, g) in bias.iter_mut().zip(grad.iter()) {
            *b -= self.learning_rate * g;
        }
    }
}
