//! Greedy "use at most K inks" selection
//!
//! Each round tries every unused ink appended to the inks chosen so far, solves
//! each candidate subset from scratch, and keeps the candidate with the lowest
//! error. Candidates within a round are independent, so with the `parallel`
//! feature they run on the rayon pool.

use std::collections::BTreeSet;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{MixError, Result};
use crate::solver::{CancelToken, MixResult, MixSolver, Problem};

/// Forward selection over a palette, driving a [`MixSolver`] per candidate
#[derive(Debug, Clone, Copy)]
pub struct SubsetSelector {
    solver: MixSolver,
    parallel: bool,
}

/// Best solution seen so far and the subset it was solved over
struct Incumbent {
    subset: Vec<usize>,
    result: MixResult,
}

impl SubsetSelector {
    pub fn new(solver: MixSolver) -> Self {
        Self {
            solver,
            parallel: cfg!(feature = "parallel"),
        }
    }

    /// Evaluate candidates on the calling thread, one after another
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    /// Best mix of `target` using at most `max_inks` of `inks`.
    ///
    /// Weights in the result are aligned to `inks`; unused inks get exactly 0.
    pub fn solve<S: AsRef<str>>(&self, inks: &[S], target: &str, max_inks: usize) -> Result<MixResult> {
        self.solve_with_cancel(inks, target, max_inks, &CancelToken::new())
    }

    /// Like [`SubsetSelector::solve`], checking `cancel` before every candidate
    pub fn solve_with_cancel<S: AsRef<str>>(
        &self,
        inks: &[S],
        target: &str,
        max_inks: usize,
        cancel: &CancelToken,
    ) -> Result<MixResult> {
        if max_inks == 0 {
            return Err(MixError::InvalidLimit(max_inks));
        }

        let problem = Problem::prepare(inks, target)?;
        let max_inks = max_inks.min(problem.densities.len());

        let mut chosen: Vec<usize> = Vec::with_capacity(max_inks);
        let mut remaining: BTreeSet<usize> = (0..problem.densities.len()).collect();
        let mut incumbent: Option<Incumbent> = None;

        for round in 0..max_inks {
            let candidates = self.evaluate_round(&problem, &chosen, &remaining, cancel)?;

            // min_by keeps the first of equal minima, i.e. the lowest index
            let Some((index, result)) = candidates
                .into_iter()
                .min_by(|(_, a), (_, b)| a.rmse.total_cmp(&b.rmse))
            else {
                break;
            };

            chosen.push(index);
            remaining.remove(&index);

            tracing::debug!(
                round = round + 1,
                ink = index,
                rmse = result.rmse,
                "Selected ink"
            );

            // A fresh solve over a larger subset can land in a worse local
            // optimum; never trade the incumbent for a higher error.
            let improves = incumbent
                .as_ref()
                .map_or(true, |best| result.rmse < best.result.rmse);
            if improves {
                incumbent = Some(Incumbent {
                    subset: chosen.clone(),
                    result,
                });
            }
        }

        let Incumbent { subset, result } = incumbent.ok_or(MixError::EmptyPalette)?;

        let mut weights = vec![0.0; problem.densities.len()];
        for (&index, &w) in subset.iter().zip(&result.weights) {
            weights[index] = w;
        }

        tracing::debug!(
            inks = subset.len(),
            rmse = result.rmse,
            predicted = %result.predicted,
            "Limited mix finished"
        );

        Ok(MixResult { weights, ..result })
    }

    /// Solve `chosen + [candidate]` for every remaining candidate, in ascending
    /// candidate order
    fn evaluate_round(
        &self,
        problem: &Problem,
        chosen: &[usize],
        remaining: &BTreeSet<usize>,
        cancel: &CancelToken,
    ) -> Result<Vec<(usize, MixResult)>> {
        let candidates: Vec<usize> = remaining.iter().copied().collect();

        let evaluate = |&index: &usize| -> Result<(usize, MixResult)> {
            cancel.check()?;

            let subset = Problem {
                densities: chosen
                    .iter()
                    .chain(std::iter::once(&index))
                    .map(|&i| problem.densities[i])
                    .collect(),
                target: problem.target,
            };
            let result = self.solver.solve_problem(&subset, cancel)?;

            tracing::trace!(candidate = index, rmse = result.rmse, "Evaluated candidate");
            Ok((index, result))
        };

        #[cfg(feature = "parallel")]
        if self.parallel {
            return candidates.par_iter().map(&evaluate).collect();
        }

        candidates.iter().map(&evaluate).collect()
    }
}

impl Default for SubsetSelector {
    fn default() -> Self {
        Self::new(MixSolver::default())
    }
}
