// ============================================================
// Layer 5 — Adam Optimiser
// ============================================================
// m = β1*m + (1-β1)*g        (mean)
// v = β2*v + (1-β2)*g²       (variance)
// θ = θ - lr * m̂ / (√v̂ + ε)  (update, bias-corrected)
//
// Reference: Kingma & Ba (2015) Adam

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Adam {
    beta1:   f64,
    beta2:   f64,
    epsilon: f64,
    step:    u64,
    m:       Vec<f64>,
    v:       Vec<f64>,
}

impl Adam {
    pub fn new(num_params: usize) -> Self {
        Self {
            beta1:   0.9,
            beta2:   0.999,
            epsilon: 1e-8,
            step:    0,
            m:       vec![0.0; num_params],
            v:       vec![0.0; num_params],
        }
    }

    /// Apply one update to `params` in place.
    pub fn step(&mut self, lr: f64, params: &mut [f64], grads: &[f64]) {
        debug_assert_eq!(params.len(), self.m.len());
        debug_assert_eq!(grads.len(),  self.m.len());

        self.step += 1;
        let bc1 = 1.0 - self.beta1.powi(self.step as i32);
        let bc2 = 1.0 - self.beta2.powi(self.step as i32);

        for i in 0..params.len() {
            self.m[i] = self.beta1 * self.m[i] + (1.0 - self.beta1) * grads[i];
            self.v[i] = self.beta2 * self.v[i] + (1.0 - self.beta2) * grads[i] * grads[i];
            let m_hat = self.m[i] / bc1;
            let v_hat = self.v[i] / bc2;
            params[i] -= lr * m_hat / (v_hat.sqrt() + self.epsilon);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimises_quadratic() {
        // f(x) = (x - 3)², grad = 2(x - 3)
        let mut adam = Adam::new(1);
        let mut x = [0.0];
        for _ in 0..500 {
            let g = [2.0 * (x[0] - 3.0)];
            adam.step(0.1, &mut x, &g);
        }
        assert!((x[0] - 3.0).abs() < 1e-2);
    }

    #[test]
    fn test_first_step_moves_by_lr() {
        let mut adam = Adam::new(2);
        let mut p = [1.0, 1.0];
        adam.step(0.5, &mut p, &[10.0, -0.1]);
        assert!((p[0] - 0.5).abs() < 1e-6);
        assert!((p[1] - 1.5).abs() < 1e-6);
    }
}
