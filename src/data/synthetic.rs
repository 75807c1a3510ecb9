// ============================================================
// Layer 4 — Synthetic Sinusoid Generator
// ============================================================
// Builds the demo dataset the experiment fits:
//
//   x    = linspace(0, x_domain, samples)
//   sin  = sin(freq * x) + N(0, noise_scale)
//   cos  = cos(freq * x) + N(0, noise_scale)
//   rows = [x, sin, cos]
//
// The rows are then shuffled and only the first `subset`
// kept, so the GP sees a handful of scattered points.
// Everything is driven by one seeded StdRng, so the same
// config always yields the same table.
//
// Reference: rand / rand_distr crate documentation

use anyhow::{ensure, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::domain::raw_dataset::RawDataset;
use crate::domain::traits::RawDataSupplier;

/// Number of columns in a generated row: x, sin, cos
pub const SINUSOID_ROW_WIDTH: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinusoidConfig {
    /// Points on the linspace before subsetting
    pub samples: usize,

    /// Std-dev of the Gaussian noise added to both targets
    pub noise_scale: f64,

    /// Angular frequency of the sinusoid
    pub frequency: f64,

    /// Upper end of the x range (lower end is 0)
    pub x_domain: f64,

    /// Rows kept after shuffling; 0 keeps all
    pub subset: usize,

    pub seed: u64,
}

impl Default for SinusoidConfig {
    fn default() -> Self {
        Self {
            samples:     100,
            noise_scale: 0.05,
            frequency:   4.0 * std::f64::consts::PI,
            x_domain:    1.0,
            subset:      10,
            seed:        3,
        }
    }
}

pub struct SinusoidGenerator {
    config: SinusoidConfig,
}

impl SinusoidGenerator {
    pub fn new(config: SinusoidConfig) -> Self {
        Self { config }
    }
}

impl RawDataSupplier for SinusoidGenerator {
    fn supply(&self) -> Result<RawDataset> {
        let cfg = &self.config;
        ensure!(
            cfg.noise_scale.is_finite() && cfg.noise_scale >= 0.0,
            "noise_scale must be a non-negative number, got {}",
            cfg.noise_scale
        );
        ensure!(cfg.x_domain.is_finite(), "x_domain must be finite");

        let mut rng = StdRng::seed_from_u64(cfg.seed);
        let noise   = Normal::new(0.0, cfg.noise_scale)?;

        let step = if cfg.samples > 1 {
            cfg.x_domain / (cfg.samples - 1) as f64
        } else {
            0.0
        };
        let xs: Vec<f64> = (0..cfg.samples).map(|i| i as f64 * step).collect();

        // Draw all sin noise before any cos noise
        let sin: Vec<f64> = xs
            .iter()
            .map(|x| (cfg.frequency * x).sin() + noise.sample(&mut rng))
            .collect();
        let cos: Vec<f64> = xs
            .iter()
            .map(|x| (cfg.frequency * x).cos() + noise.sample(&mut rng))
            .collect();

        let mut rows: Vec<[f32; SINUSOID_ROW_WIDTH]> = xs
            .iter()
            .zip(sin.iter().zip(cos.iter()))
            .map(|(&x, (&s, &c))| [x as f32, s as f32, c as f32])
            .collect();

        rows.shuffle(&mut rng);
        if cfg.subset > 0 {
            rows.truncate(cfg.subset);
        }

        tracing::info!(
            "Generated {} sinusoid rows ({} kept, noise={})",
            cfg.samples,
            rows.len(),
            cfg.noise_scale
        );

        let values = rows.into_iter().flatten().collect();
        Ok(RawDataset::from_flat(values, SINUSOID_ROW_WIDTH)?)
    }
}
