// ============================================================
// Layer 5 — Exact GP Regression Model
// ============================================================
// Batch-independent multi-output exact Gaussian Process:
// every target column gets its own RBF kernel and constant mean.
//
//   k(x, x') = s² · exp(-‖x - x'‖² / (2ℓ²))
//   K        = k(X, X) + σ² I
//
// Hyperparameters are optimised in log space against the
// exact negative marginal log-likelihood (divided by n):
//
//   NLML = ½ rᵀK⁻¹r + ½ log|K| + (n/2) log 2π,   r = y - m
//
// with analytic gradients  ∂NLML/∂θ = ½ tr((K⁻¹ - ααᵀ) ∂K/∂θ).
//
// The model is built from the exact training inputs/targets
// and keeps conditioning on them: predictions are the
// posterior given those rows.

use anyhow::{bail, ensure, Result};
use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::batcher::PairBatch;
use crate::ml::linalg::{cholesky_inverse, cholesky_solve, cholesky_with_jitter, solve_lower};
use crate::ml::optim::Adam;

const LN_2PI: f64 = 1.837_877_066_409_345_3;

/// Parameters per output: log ℓ, log s², raw noise, mean
const PARAMS_PER_OUTPUT: usize = 4;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct GpConfig {
    /// Initial RBF lengthscale
    #[config(default = 0.6931)]
    pub init_lengthscale: f64,

    /// Initial kernel output scale (s²)
    #[config(default = 0.6931)]
    pub init_outputscale: f64,

    /// Initial observation noise variance (σ²)
    #[config(default = 0.6931)]
    pub init_noise: f64,

    /// Lower bound on the noise variance
    #[config(default = 1e-4)]
    pub min_noise: f64,
}

/// Host-side copy of one batch in f64, row-major.
#[derive(Debug, Clone)]
pub struct RegressionBatch {
    pub inputs:     Vec<f64>,
    pub targets:    Vec<f64>,
    pub rows:       usize,
    pub input_dim:  usize,
    pub target_dim: usize,
}

impl RegressionBatch {
    /// Pull a tensor batch off its device.
    pub fn from_pair_batch<B: Backend>(batch: PairBatch<B>) -> Result<Self> {
        let [rows, input_dim] = batch.inputs.dims();
        let [target_rows, target_dim] = batch.targets.dims();
        ensure!(
            rows == target_rows,
            "batch has {rows} input rows but {target_rows} target rows"
        );

        let to_host = |t: Tensor<B, 2>| -> Result<Vec<f64>> {
            let values = t
                .into_data()
                .to_vec::<f32>()
                .map_err(|e| anyhow::anyhow!("Cannot read tensor data: {e:?}"))?;
            Ok(values.into_iter().map(f64::from).collect())
        };

        Ok(Self {
            inputs:  to_host(batch.inputs)?,
            targets: to_host(batch.targets)?,
            rows,
            input_dim,
            target_dim,
        })
    }
}

/// Learned values for one output column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputHyperparameters {
    pub lengthscale: f64,
    pub outputscale: f64,
    pub noise:       f64,
    pub mean:        f64,
}

/// Serialisable snapshot of the model, without its training rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpState {
    pub input_dim:  usize,
    pub target_dim: usize,
    pub min_noise:  f64,
    pub outputs:    Vec<OutputHyperparameters>,
}

/// Posterior predictive at a set of points, row-major [m, target_dim].
#[derive(Debug, Clone)]
pub struct Prediction {
    pub mean:     Vec<f64>,
    pub variance: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvalMetrics {
    /// Mean squared error of the posterior mean
    pub mse: f64,
    /// Mean negative log predictive density
    pub nlpd: f64,
    pub rows: usize,
}

#[derive(Debug, Clone)]
pub struct ExactGpModel {
    train_x:    Vec<f64>,
    train_y:    Vec<f64>,
    rows:       usize,
    input_dim:  usize,
    target_dim: usize,
    min_noise:  f64,
    params:     Vec<f64>,
    optim:      Adam,
}

impl ExactGpModel {
    pub fn new(
        train_inputs:  &[f32],
        train_targets: &[f32],
        input_dim:     usize,
        target_dim:    usize,
        config:        &GpConfig,
    ) -> Result<Self> {
        ensure!(
            config.init_lengthscale > 0.0 && config.init_outputscale > 0.0,
            "initial lengthscale and outputscale must be positive"
        );
        ensure!(
            config.min_noise >= 0.0 && config.init_noise > config.min_noise,
            "init_noise ({}) must exceed min_noise ({})",
            config.init_noise,
            config.min_noise
        );

        let init = OutputHyperparameters {
            lengthscale: config.init_lengthscale,
            outputscale: config.init_outputscale,
            noise:       config.init_noise,
            mean:        0.0,
        };
        let state = GpState {
            input_dim,
            target_dim,
            min_noise: config.min_noise,
            outputs: vec![init; target_dim],
        };
        Self::from_state(state, train_inputs, train_targets)
    }

    /// Rebuild a model from saved hyperparameters and its training rows.
    pub fn from_state(state: GpState, train_inputs: &[f32], train_targets: &[f32]) -> Result<Self> {
        let GpState { input_dim, target_dim, min_noise, outputs } = state;
        ensure!(input_dim > 0 && target_dim > 0, "input_dim and target_dim must be positive");
        ensure!(
            outputs.len() == target_dim,
            "state has {} outputs, expected {}",
            outputs.len(),
            target_dim
        );
        ensure!(
            train_inputs.len() % input_dim == 0,
            "training inputs are not a whole number of rows"
        );
        let rows = train_inputs.len() / input_dim;
        ensure!(
            train_targets.len() == rows * target_dim,
            "{} training inputs but {} target values (target_dim {})",
            rows,
            train_targets.len(),
            target_dim
        );

        let mut params = Vec::with_capacity(PARAMS_PER_OUTPUT * target_dim);
        for h in &outputs {
            if h.lengthscale <= 0.0 || h.outputscale <= 0.0 || h.noise <= min_noise {
                bail!("hyperparameters out of range: {h:?}");
            }
            params.extend_from_slice(&[
                h.lengthscale.ln(),
                h.outputscale.ln(),
                (h.noise - min_noise).ln(),
                h.mean,
            ]);
        }

        tracing::info!(
            "GP initialised on {} training rows ({} -> {})",
            rows,
            input_dim,
            target_dim
        );

        Ok(Self {
            train_x: train_inputs.iter().copied().map(f64::from).collect(),
            train_y: train_targets.iter().copied().map(f64::from).collect(),
            rows,
            input_dim,
            target_dim,
            min_noise,
            optim: Adam::new(params.len()),
            params,
        })
    }

    pub fn state(&self) -> GpState {
        GpState {
            input_dim:  self.input_dim,
            target_dim: self.target_dim,
            min_noise:  self.min_noise,
            outputs:    (0..self.target_dim).map(|j| self.hyper(j)).collect(),
        }
    }

    fn hyper(&self, j: usize) -> OutputHyperparameters {
        let p = &self.params[j * PARAMS_PER_OUTPUT..(j + 1) * PARAMS_PER_OUTPUT];
        OutputHyperparameters {
            lengthscale: p[0].exp(),
            outputscale: p[1].exp(),
            noise:       self.min_noise + p[2].exp(),
            mean:        p[3],
        }
    }

    fn sq_dist(&self, a: &[f64], i: usize, b: &[f64], k: usize) -> f64 {
        let d = self.input_dim;
        a[i * d..(i + 1) * d]
            .iter()
            .zip(&b[k * d..(k + 1) * d])
            .map(|(u, v)| (u - v) * (u - v))
            .sum()
    }

    /// (noise-free kernel, squared distances) over the rows of `x`
    fn kernel(&self, x: &[f64], n: usize, h: &OutputHyperparameters) -> (Vec<f64>, Vec<f64>) {
        let ls2 = h.lengthscale * h.lengthscale;
        let mut kf  = vec![0.0; n * n];
        let mut sqd = vec![0.0; n * n];
        for a in 0..n {
            for b in 0..=a {
                let d = self.sq_dist(x, a, x, b);
                let k = h.outputscale * (-0.5 * d / ls2).exp();
                kf[a * n + b]  = k;
                kf[b * n + a]  = k;
                sqd[a * n + b] = d;
                sqd[b * n + a] = d;
            }
        }
        (kf, sqd)
    }

    fn column(values: &[f64], width: usize, j: usize) -> Vec<f64> {
        values.iter().skip(j).step_by(width).copied().collect()
    }

    fn check_batch(&self, batch: &RegressionBatch) -> Result<()> {
        ensure!(
            batch.input_dim == self.input_dim && batch.target_dim == self.target_dim,
            "batch is {}->{}, model is {}->{}",
            batch.input_dim,
            batch.target_dim,
            self.input_dim,
            self.target_dim
        );
        Ok(())
    }

    /// Scaled NLML for one output and its gradient in parameter order.
    fn output_loss_and_grad(
        &self,
        x: &[f64],
        y: &[f64],
        n: usize,
        j: usize,
    ) -> Result<(f64, [f64; PARAMS_PER_OUTPUT])> {
        let h = self.hyper(j);
        let (kf, sqd) = self.kernel(x, n, &h);

        let mut k = kf.clone();
        for i in 0..n {
            k[i * n + i] += h.noise;
        }
        let l = cholesky_with_jitter(&k, n)?;

        let r: Vec<f64> = y.iter().map(|v| v - h.mean).collect();
        let alpha = cholesky_solve(&l, n, &r);

        let data_fit: f64 = r.iter().zip(&alpha).map(|(a, b)| a * b).sum::<f64>() * 0.5;
        let half_log_det: f64 = (0..n).map(|i| l[i * n + i].ln()).sum();
        let nlml = data_fit + half_log_det + 0.5 * n as f64 * LN_2PI;

        // W = K⁻¹ - ααᵀ
        let k_inv = cholesky_inverse(&l, n);
        let ls2 = h.lengthscale * h.lengthscale;
        let mut g = [0.0; PARAMS_PER_OUTPUT];
        let mut trace_w = 0.0;
        for a in 0..n {
            for b in 0..n {
                let w  = k_inv[a * n + b] - alpha[a] * alpha[b];
                let kk = kf[a * n + b];
                g[0] += w * kk * sqd[a * n + b] / ls2;
                g[1] += w * kk;
            }
            trace_w += k_inv[a * n + a] - alpha[a] * alpha[a];
        }
        g[0] *= 0.5;
        g[1] *= 0.5;
        g[2] = 0.5 * (h.noise - self.min_noise) * trace_w;
        g[3] = -alpha.iter().sum::<f64>();

        let scale = 1.0 / n as f64;
        Ok((nlml * scale, g.map(|v| v * scale)))
    }

    /// Negative marginal log-likelihood per row, averaged over outputs,
    /// with its gradient w.r.t. every parameter.
    pub fn loss_and_grad(&self, batch: &RegressionBatch) -> Result<(f64, Vec<f64>)> {
        self.check_batch(batch)?;
        let n = batch.rows;
        let mut grad = vec![0.0; self.params.len()];
        if n == 0 {
            return Ok((0.0, grad));
        }

        let t = self.target_dim as f64;
        let mut loss = 0.0;
        for j in 0..self.target_dim {
            let y = Self::column(&batch.targets, self.target_dim, j);
            let (l, g) = self.output_loss_and_grad(&batch.inputs, &y, n, j)?;
            loss += l / t;
            for (dst, src) in grad[j * PARAMS_PER_OUTPUT..].iter_mut().zip(g) {
                *dst = src / t;
            }
        }
        Ok((loss, grad))
    }

    /// One Adam step on the batch loss. Returns the loss before the step.
    /// A non-finite loss is returned without touching the parameters.
    pub fn training_step(&mut self, batch: &RegressionBatch, lr: f64) -> Result<f64> {
        let (loss, grad) = self.loss_and_grad(batch)?;
        if loss.is_finite() && grad.iter().all(|g| g.is_finite()) {
            self.optim.step(lr, &mut self.params, &grad);
        }
        Ok(loss)
    }

    /// Posterior predictive mean and variance (noise included).
    pub fn predict(&self, inputs: &[f64]) -> Result<Prediction> {
        ensure!(
            inputs.len() % self.input_dim == 0,
            "prediction inputs are not a whole number of rows"
        );
        let m = inputs.len() / self.input_dim;
        let n = self.rows;
        let t = self.target_dim;

        let mut mean     = vec![0.0; m * t];
        let mut variance = vec![0.0; m * t];

        for j in 0..t {
            let h = self.hyper(j);
            let ls2 = h.lengthscale * h.lengthscale;

            let (mut k, _) = self.kernel(&self.train_x, n, &h);
            for i in 0..n {
                k[i * n + i] += h.noise;
            }
            let l = cholesky_with_jitter(&k, n)?;
            let r: Vec<f64> = Self::column(&self.train_y, t, j)
                .iter()
                .map(|v| v - h.mean)
                .collect();
            let alpha = cholesky_solve(&l, n, &r);

            for q in 0..m {
                let k_star: Vec<f64> = (0..n)
                    .map(|i| h.outputscale * (-0.5 * self.sq_dist(&self.train_x, i, inputs, q) / ls2).exp())
                    .collect();
                let v = solve_lower(&l, n, &k_star);

                let mu  = h.mean + k_star.iter().zip(&alpha).map(|(a, b)| a * b).sum::<f64>();
                let var = h.outputscale - v.iter().map(|x| x * x).sum::<f64>() + h.noise;

                mean[q * t + j]     = mu;
                variance[q * t + j] = var.max(1e-12);
            }
        }

        Ok(Prediction { mean, variance })
    }

    pub fn evaluate(&self, batch: &RegressionBatch) -> Result<EvalMetrics> {
        self.check_batch(batch)?;
        let pred = self.predict(&batch.inputs)?;

        let count = batch.targets.len().max(1) as f64;
        let mut sse  = 0.0;
        let mut nlpd = 0.0;
        for ((y, mu), var) in batch.targets.iter().zip(&pred.mean).zip(&pred.variance) {
            let err = y - mu;
            sse  += err * err;
            nlpd += 0.5 * (LN_2PI + var.ln()) + 0.5 * err * err / var;
        }

        Ok(EvalMetrics {
            mse:  sse / count,
            nlpd: nlpd / count,
            rows: batch.rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy() -> (Vec<f32>, Vec<f32>) {
        let xs: Vec<f32> = (0..8).map(|i| i as f32 / 7.0).collect();
        let ys: Vec<f32> = xs
            .iter()
            .flat_map(|&x| {
                let a = 4.0 * std::f32::consts::PI * x;
                [a.sin(), a.cos()]
            })
            .collect();
        (xs, ys)
    }

    fn batch(xs: &[f32], ys: &[f32]) -> RegressionBatch {
        RegressionBatch {
            inputs:     xs.iter().copied().map(f64::from).collect(),
            targets:    ys.iter().copied().map(f64::from).collect(),
            rows:       xs.len(),
            input_dim:  1,
            target_dim: 2,
        }
    }

    #[test]
    fn test_gradient_matches_finite_difference() {
        let (xs, ys) = toy();
        let mut model = ExactGpModel::new(&xs, &ys, 1, 2, &GpConfig::new()).unwrap();
        model.params[3] = 0.2;
        model.params[4] = -0.5;
        let b = batch(&xs, &ys);

        let (_, grad) = model.loss_and_grad(&b).unwrap();
        let eps = 1e-5;
        for i in 0..model.params.len() {
            let mut plus = model.clone();
            plus.params[i] += eps;
            let mut minus = model.clone();
            minus.params[i] -= eps;
            let numeric = (plus.loss_and_grad(&b).unwrap().0 - minus.loss_and_grad(&b).unwrap().0)
                / (2.0 * eps);
            assert!(
                (numeric - grad[i]).abs() < 1e-4,
                "param {i}: analytic {} vs numeric {}",
                grad[i],
                numeric
            );
        }
    }

    #[test]
    fn test_training_reduces_loss() {
        let (xs, ys) = toy();
        let mut model = ExactGpModel::new(&xs, &ys, 1, 2, &GpConfig::new()).unwrap();
        let b = batch(&xs, &ys);

        let first = model.training_step(&b, 0.1).unwrap();
        let mut last = first;
        for _ in 0..100 {
            last = model.training_step(&b, 0.1).unwrap();
        }
        assert!(last < first, "loss went from {first} to {last}");
    }

    #[test]
    fn test_posterior_mean_tracks_training_points() {
        let (xs, ys) = toy();
        let cfg = GpConfig::new().with_init_lengthscale(0.1).with_init_noise(1e-3);
        let model = ExactGpModel::new(&xs, &ys, 1, 2, &cfg).unwrap();
        let metrics = model.evaluate(&batch(&xs, &ys)).unwrap();
        assert!(metrics.mse < 1e-2, "mse {}", metrics.mse);
        assert_eq!(metrics.rows, 8);
    }

    #[test]
    fn test_empty_training_set_predicts_prior() {
        let model = ExactGpModel::new(&[], &[], 1, 2, &GpConfig::new()).unwrap();
        let pred = model.predict(&[0.3]).unwrap();
        assert_eq!(pred.mean, vec![0.0, 0.0]);
        assert!((pred.variance[0] - (0.6931 + 0.6931)).abs() < 1e-9);

        let (loss, grad) = model.loss_and_grad(&batch(&[], &[])).unwrap();
        assert_eq!(loss, 0.0);
        assert!(grad.iter().all(|g| *g == 0.0));
    }

    #[test]
    fn test_state_roundtrip() {
        let (xs, ys) = toy();
        let mut model = ExactGpModel::new(&xs, &ys, 1, 2, &GpConfig::new()).unwrap();
        model.training_step(&batch(&xs, &ys), 0.05).unwrap();

        let state = model.state();
        let restored = ExactGpModel::from_state(state.clone(), &xs, &ys).unwrap();
        let a = model.predict(&[0.5]).unwrap();
        let b = restored.predict(&[0.5]).unwrap();
        for (u, v) in a.mean.iter().zip(&b.mean) {
            assert!((u - v).abs() < 1e-9);
        }
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        assert!(ExactGpModel::new(&[0.1, 0.2], &[1.0], 1, 2, &GpConfig::new()).is_err());
        let model = ExactGpModel::new(&[0.1], &[1.0, 2.0], 1, 2, &GpConfig::new()).unwrap();
        let mut b = batch(&[0.1], &[1.0, 2.0]);
        b.target_dim = 1;
        assert!(model.evaluate(&b).is_err());
    }
}
