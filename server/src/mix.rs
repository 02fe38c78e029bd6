//! Mix requests: JSON types around the solver and the bridge onto tokio's
//! blocking pool
//!
//! Solves are CPU-bound, so they run under `spawn_blocking`. A request that
//! overruns its budget trips the cancel token; the solver stops before its
//! next per-ink gradient estimate.

use std::time::Duration;

use inkmix_core::{CancelToken, MixResult, MixSolver, SolverConfig, SubsetSelector};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

/// Most inks a single request may submit
pub const MAX_REQUEST_INKS: usize = 256;

/// Body of `POST /mix`
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct MixRequest {
    /// Base ink colors (`#RRGGBB` or `#RGB`); result weights follow this order
    #[schema(example = json!(["#D81B1B", "#1B4FD8", "#FFFFFF"]))]
    pub inks: Vec<String>,
    /// Color to reproduce
    #[schema(example = "#8B3A62")]
    pub target: String,
    /// Descent steps; server default when omitted
    #[serde(default)]
    pub iterations: Option<usize>,
    /// Use at most this many inks (greedy selection)
    #[serde(default)]
    pub max_inks: Option<usize>,
}

/// Solver output
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MixResponse {
    /// One weight per requested ink, summing to one
    pub weights: Vec<f64>,
    /// Display color of the predicted mix
    pub predicted_hex: String,
    /// Root-mean-square error in linear reflectance
    pub rmse: f64,
}

impl From<MixResult> for MixResponse {
    fn from(result: MixResult) -> Self {
        Self {
            predicted_hex: result.predicted_hex(),
            weights: result.weights,
            rmse: result.rmse,
        }
    }
}

/// Run the request on the blocking pool, giving up after `timeout`
pub async fn run_mix(
    request: MixRequest,
    default_iterations: usize,
    timeout: Duration,
) -> Result<MixResponse, AppError> {
    if request.inks.len() > MAX_REQUEST_INKS {
        return Err(AppError::BadRequest(format!(
            "Too many inks: {} (max {})",
            request.inks.len(),
            MAX_REQUEST_INKS
        )));
    }

    let cancel = CancelToken::new();
    let worker_cancel = cancel.clone();

    let handle = tokio::task::spawn_blocking(move || {
        solve_blocking(&request, default_iterations, &worker_cancel)
    });

    match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(result)) => Ok(result?.into()),
        Ok(Err(join_error)) => Err(AppError::Internal(format!("Mix task failed: {}", join_error))),
        Err(_) => {
            cancel.cancel();
            Err(AppError::Timeout(timeout))
        }
    }
}

fn solve_blocking(
    request: &MixRequest,
    default_iterations: usize,
    cancel: &CancelToken,
) -> inkmix_core::Result<MixResult> {
    let config = SolverConfig::with_iterations(request.iterations.unwrap_or(default_iterations));
    let solver = MixSolver::new(config);

    match request.max_inks {
        Some(max_inks) => {
            tracing::info!(
                "Limited mix: {} inks (max {}), target {}",
                request.inks.len(),
                max_inks,
                request.target
            );
            SubsetSelector::new(solver).solve_with_cancel(
                &request.inks,
                &request.target,
                max_inks,
                cancel,
            )
        }
        None => {
            tracing::info!(
                "Mix: {} inks, target {}, {} iterations",
                request.inks.len(),
                request.target,
                config.iterations
            );
            solver.solve_with_cancel(&request.inks, &request.target, cancel)
        }
    }
}
