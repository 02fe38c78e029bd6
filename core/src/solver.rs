//! Projected-gradient mixing solver
//!
//! Starts from equal weights and runs a fixed number of descent steps. Each
//! step estimates the gradient by forward finite differences, moves against
//! it with a geometrically decaying step size, and projects back onto the
//! probability simplex. There is no convergence test, so the same inputs
//! always take the same path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::density::{self, Density, Reflectance};
use crate::error::{MixError, Result};
use crate::simplex;

/// Descent steps per solve
pub const DEFAULT_ITERATIONS: usize = 450;
/// Step size at iteration 0
pub const INITIAL_STEP: f64 = 0.18;
/// Per-iteration step size multiplier
pub const STEP_DECAY: f64 = 0.985;
/// Forward finite-difference offset
pub const FD_EPSILON: f64 = 1e-4;

/// Descent schedule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub iterations: usize,
    pub step_size: f64,
    pub step_decay: f64,
    pub fd_epsilon: f64,
}

impl SolverConfig {
    pub fn with_iterations(iterations: usize) -> Self {
        Self {
            iterations,
            ..Self::default()
        }
    }

    /// Step size for iteration `it` (0-based)
    #[inline]
    pub fn step_at(&self, it: usize) -> f64 {
        self.step_size * self.step_decay.powf(it as f64)
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            step_size: INITIAL_STEP,
            step_decay: STEP_DECAY,
            fd_epsilon: FD_EPSILON,
        }
    }
}

/// Cooperative cancellation flag shared between a caller and a running solve
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub(crate) fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(MixError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Outcome of a solve
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MixResult {
    /// One weight per input ink, in input order; sums to one
    pub weights: Vec<f64>,
    /// Display color of the predicted mix
    pub predicted: Rgb,
    /// `sqrt(loss / 3)` in reflectance space
    pub rmse: f64,
}

impl MixResult {
    pub fn predicted_hex(&self) -> String {
        self.predicted.to_hex()
    }

    /// Indices of inks that take part in the mix
    pub fn active_inks(&self) -> Vec<usize> {
        self.weights
            .iter()
            .enumerate()
            .filter(|(_, w)| **w > 0.0)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Inks and target converted once, ahead of any descent
#[derive(Debug, Clone)]
pub(crate) struct Problem {
    pub densities: Vec<Density>,
    pub target: Reflectance,
}

impl Problem {
    pub fn prepare<S: AsRef<str>>(inks: &[S], target: &str) -> Result<Self> {
        if inks.is_empty() {
            return Err(MixError::EmptyPalette);
        }

        let densities = inks
            .iter()
            .map(|hex| Density::from_hex(hex.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        let target = Reflectance::from_hex(target)?;

        Ok(Self { densities, target })
    }

    fn eval(&self, weights: &[f64]) -> f64 {
        density::loss(density::mix(&self.densities, weights), &self.target)
    }
}

/// Fixed-schedule projected gradient descent over ink weights
#[derive(Debug, Clone, Copy, Default)]
pub struct MixSolver {
    config: SolverConfig,
}

impl MixSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Find weights for `inks` that best reproduce `target`
    pub fn solve<S: AsRef<str>>(&self, inks: &[S], target: &str) -> Result<MixResult> {
        self.solve_with_cancel(inks, target, &CancelToken::new())
    }

    /// Like [`MixSolver::solve`], checking `cancel` before every ink's
    /// gradient estimate
    pub fn solve_with_cancel<S: AsRef<str>>(
        &self,
        inks: &[S],
        target: &str,
        cancel: &CancelToken,
    ) -> Result<MixResult> {
        let problem = Problem::prepare(inks, target)?;
        self.solve_problem(&problem, cancel)
    }

    pub(crate) fn solve_problem(&self, problem: &Problem, cancel: &CancelToken) -> Result<MixResult> {
        let n = problem.densities.len();
        if n == 0 {
            return Err(MixError::EmptyPalette);
        }

        tracing::trace!(inks = n, iterations = self.config.iterations, "Starting solve");

        let mut weights = vec![1.0 / n as f64; n];
        for it in 0..self.config.iterations {
            weights = self.descend(problem, weights, it, cancel)?;
        }

        let predicted = density::mix(&problem.densities, &weights);
        let rmse = (density::loss(predicted, &problem.target) / 3.0).sqrt();
        let predicted = predicted.to_rgb();

        tracing::trace!(inks = n, rmse, predicted = %predicted, "Solve finished");

        Ok(MixResult {
            weights,
            predicted,
            rmse,
        })
    }

    /// One descent step: gradient estimate, move, project
    fn descend(
        &self,
        problem: &Problem,
        weights: Vec<f64>,
        it: usize,
        cancel: &CancelToken,
    ) -> Result<Vec<f64>> {
        let eps = self.config.fd_epsilon;
        let fx = problem.eval(&weights);

        let mut weights = weights;
        let mut gradient = Vec::with_capacity(weights.len());
        for i in 0..weights.len() {
            cancel.check()?;
            let (fp, restored) = Self::nudge(problem, weights, i, eps);
            gradient.push((fp - fx) / eps);
            weights = restored;
        }

        let step = self.config.step_at(it);
        let moved: Vec<f64> = weights
            .iter()
            .zip(&gradient)
            .map(|(w, g)| w - step * g)
            .collect();

        Ok(simplex::project(&moved))
    }

    /// Evaluate the loss with weight `i` nudged by `eps` (then projected), and
    /// return it with the weights after putting `i` back and re-projecting.
    ///
    /// Projection shifts every entry, so the returned weights differ slightly
    /// from the input; later estimates in the same step start from them.
    fn nudge(problem: &Problem, weights: Vec<f64>, i: usize, eps: f64) -> (f64, Vec<f64>) {
        let original = weights[i];

        let mut perturbed = weights;
        perturbed[i] = original + eps;
        let mut perturbed = simplex::project(&perturbed);
        let fp = problem.eval(&perturbed);

        perturbed[i] = original;
        (fp, simplex::project(&perturbed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_feasible(weights: &[f64]) {
        assert!(weights.iter().all(|&w| w >= 0.0), "negative weight in {weights:?}");
        let sum: f64 = weights.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6, "weights sum to {sum}");
    }

    #[test]
    fn test_empty_palette() {
        let inks: [&str; 0] = [];
        assert_eq!(
            MixSolver::default().solve(&inks, "#FFFFFF"),
            Err(MixError::EmptyPalette)
        );
    }

    #[test]
    fn test_invalid_hex() {
        let solver = MixSolver::default();
        assert_eq!(
            solver.solve(&["#FF0000", "#12"], "#FFFFFF"),
            Err(MixError::InvalidHexFormat("#12".to_string()))
        );
        assert_eq!(
            solver.solve(&["#FF0000"], "purple"),
            Err(MixError::InvalidHexFormat("purple".to_string()))
        );
    }

    #[test]
    fn test_single_ink_is_exact() {
        for hex in ["#D81B1B", "#1bbe4b", "#101010", "#FFFFFF", "#000000", "#abc"] {
            for iterations in [1, 7, DEFAULT_ITERATIONS] {
                let result = MixSolver::new(SolverConfig::with_iterations(iterations))
                    .solve(&[hex], hex)
                    .unwrap();
                assert_eq!(result.weights.len(), 1);
                assert!((result.weights[0] - 1.0).abs() < 1e-12);
                assert_eq!(result.predicted_hex(), Rgb::from_hex(hex).unwrap().to_hex());
                assert!(result.rmse < 1e-9, "rmse {} for {hex}", result.rmse);
            }
        }
    }

    #[test]
    fn test_zero_iterations_returns_uniform_weights() {
        let result = MixSolver::new(SolverConfig::with_iterations(0))
            .solve(&["#FF0000", "#00FF00", "#0000FF", "#FFFFFF"], "#808080")
            .unwrap();
        assert_eq!(result.weights, vec![0.25; 4]);
    }

    #[test]
    fn test_red_blue_purple() {
        let result = MixSolver::default()
            .solve(&["#FF0000", "#0000FF"], "#800080")
            .unwrap();

        assert_feasible(&result.weights);
        for w in &result.weights {
            assert!((0.45..=0.55).contains(w), "weights {:?}", result.weights);
        }
        // Pure primaries absorb everything outside their own channel, so the
        // density mix is nearly black and the error stays well above zero.
        assert_eq!(result.predicted_hex(), "#000000");
        assert!(result.rmse > 0.1 && result.rmse < 0.2, "rmse {}", result.rmse);
    }

    #[test]
    fn test_weights_stay_feasible() {
        let palette = [
            "#D81B1B", "#1BBE4B", "#1B4FD8", "#101010", "#FFFFFF", "#A40504", "#D81E86", "#0B5834",
        ];
        for target in ["#8B3A62", "#7F7F7F", "#E07070", "#335577", "#000", "#FFF"] {
            let result = MixSolver::default().solve(&palette, target).unwrap();
            assert_eq!(result.weights.len(), palette.len());
            assert_feasible(&result.weights);
            assert!(result.rmse >= 0.0 && result.rmse.is_finite());
        }
    }

    #[test]
    fn test_mix_with_white_lightens() {
        // A light tint of blue needs a large share of white
        let result = MixSolver::default()
            .solve(&["#1B4FD8", "#FFFFFF"], "#8DA7EC")
            .unwrap();
        assert_feasible(&result.weights);
        assert!(result.weights[1] > result.weights[0], "weights {:?}", result.weights);
        assert!(result.rmse < 0.06, "rmse {}", result.rmse);
    }

    #[test]
    fn test_descent_reduces_error() {
        let palette = ["#D81B1B", "#1B4FD8", "#FFFFFF"];
        let start = MixSolver::new(SolverConfig::with_iterations(0))
            .solve(&palette, "#8B3A62")
            .unwrap();
        let end = MixSolver::default().solve(&palette, "#8B3A62").unwrap();
        assert!(end.rmse < start.rmse);
    }

    #[test]
    fn test_deterministic() {
        let palette = ["#D81B1B", "#1BBE4B", "#1B4FD8", "#FFFFFF"];
        let a = MixSolver::default().solve(&palette, "#335577").unwrap();
        let b = MixSolver::default().solve(&palette, "#335577").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_cancelled_before_start() {
        let cancel = CancelToken::new();
        cancel.cancel();
        assert_eq!(
            MixSolver::default().solve_with_cancel(&["#FF0000", "#0000FF"], "#800080", &cancel),
            Err(MixError::Cancelled)
        );
    }

    #[test]
    fn test_cancelled_mid_step() {
        let problem = Problem::prepare(&["#FF0000", "#0000FF", "#FFFFFF"], "#800080").unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        assert_eq!(
            MixSolver::default().descend(&problem, vec![1.0 / 3.0; 3], 0, &cancel),
            Err(MixError::Cancelled)
        );

        let step = MixSolver::default()
            .descend(&problem, vec![1.0 / 3.0; 3], 0, &CancelToken::new())
            .unwrap();
        assert_feasible(&step);
    }

    #[test]
    fn test_step_schedule() {
        let config = SolverConfig::default();
        assert_eq!(config.step_at(0), INITIAL_STEP);
        assert!((config.step_at(2) - 0.18 * 0.985 * 0.985).abs() < 1e-15);
    }

    #[test]
    fn test_step_schedule_past_i32_range() {
        let config = SolverConfig::default();
        let late = config.step_at(1usize << 31);
        assert!(late.is_finite());
        assert!(late >= 0.0 && late <= config.step_at(10_000));
        assert!(config.step_at(usize::MAX) <= late);
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: SolverConfig = serde_json::from_str(r#"{"iterations": 20}"#).unwrap();
        assert_eq!(config, SolverConfig::with_iterations(20));
    }

    #[test]
    fn test_active_inks() {
        let result = MixResult {
            weights: vec![0.0, 0.7, 0.0, 0.3],
            predicted: Rgb::new(0, 0, 0),
            rmse: 0.0,
        };
        assert_eq!(result.active_inks(), vec![1, 3]);
    }

    fn hex_color() -> impl Strategy<Value = String> {
        any::<[u8; 3]>().prop_map(|[r, g, b]| Rgb::new(r, g, b).to_hex())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn solutions_stay_on_simplex(
            inks in proptest::collection::vec(hex_color(), 1..5),
            target in hex_color(),
            iterations in 0usize..40,
        ) {
            let result = MixSolver::new(SolverConfig::with_iterations(iterations))
                .solve(&inks, &target)
                .unwrap();
            prop_assert_eq!(result.weights.len(), inks.len());
            prop_assert!(result.weights.iter().all(|&w| w >= 0.0), "{:?}", result.weights);
            let sum: f64 = result.weights.iter().sum();
            prop_assert!((sum - 1.0).abs() < 1e-6, "weights sum to {}", sum);
            prop_assert!(result.rmse.is_finite() && result.rmse >= 0.0);
        }
    }
}
