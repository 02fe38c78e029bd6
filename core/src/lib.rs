//! Ink mixing solver
//!
//! Given a palette of base ink colors and a target color, find non-negative
//! mixing weights (summing to one) whose subtractive mix best reproduces the
//! target, optionally using at most K of the inks.
//!
//! ```
//! let result = inkmix_core::solve(&["#1B4FD8", "#FFFFFF"], "#8DA7EC", 450)?;
//! assert_eq!(result.weights.len(), 2);
//! # Ok::<(), inkmix_core::MixError>(())
//! ```

pub mod color;
pub mod density;
pub mod error;
pub mod simplex;
pub mod solver;
pub mod subset;

pub use color::{LinearRgb, Rgb};
pub use density::{Density, Reflectance, REFLECTANCE_FLOOR};
pub use error::{MixError, Result};
pub use solver::{
    CancelToken, MixResult, MixSolver, SolverConfig, DEFAULT_ITERATIONS, FD_EPSILON,
    INITIAL_STEP, STEP_DECAY,
};
pub use subset::SubsetSelector;

/// Solve for weights over the whole palette with `iterations` descent steps
pub fn solve<S: AsRef<str>>(inks: &[S], target: &str, iterations: usize) -> Result<MixResult> {
    MixSolver::new(SolverConfig::with_iterations(iterations)).solve(inks, target)
}

/// Solve using at most `max_inks` of the palette, with the default schedule
pub fn solve_with_limit<S: AsRef<str>>(
    inks: &[S],
    target: &str,
    max_inks: usize,
) -> Result<MixResult> {
    SubsetSelector::default().solve(inks, target, max_inks)
}
