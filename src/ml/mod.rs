// ============================================================
// Layer 5 — ML / Model Layer
// ============================================================
//   model.rs   — batch-independent multi-output exact GP
//                (RBF kernel, constant mean, per-output
//                hyperparameters, analytic NLML gradients)
//
//   trainer.rs — tune / fit / test phases over any DataModule,
//                with per-epoch metrics and checkpoints
//
//   linalg.rs  — Cholesky factorisation and triangular solves
//
//   optim.rs   — Adam over the model's flat parameter vector
//
// Reference: Rasmussen & Williams (2006) Gaussian Processes
//            for Machine Learning, ch. 2 and 5

/// Exact GP regression model
pub mod model;

/// Tune / fit / test loop
pub mod trainer;

pub mod linalg;

pub mod optim;
