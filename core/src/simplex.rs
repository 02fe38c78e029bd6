//! Euclidean projection onto the probability simplex `{ w >= 0, sum(w) = 1 }`
//!
//! Exact sort-based algorithm (Duchi et al., 2008): find the threshold
//! `theta` such that `max(v_i - theta, 0)` sums to one.

/// Project `v` onto the probability simplex.
///
/// Returns an empty vector for empty input. Entries must be finite.
pub fn project(v: &[f64]) -> Vec<f64> {
    if v.is_empty() {
        return Vec::new();
    }

    // The projection is invariant under adding a constant to every entry.
    // Working relative to the maximum keeps `cumsum - 1` exact for huge inputs.
    let max = v.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let shifted: Vec<f64> = v.iter().map(|&x| x - max).collect();

    let mut sorted = shifted.clone();
    sorted.sort_by(|a, b| b.total_cmp(a));

    // Largest rho with u[rho] - (cumsum(u, rho) - 1) / (rho + 1) > 0.
    // rho = 0 always qualifies for finite input.
    let mut cumsum = 0.0;
    let mut rho = 0;
    let mut cumsum_at_rho = sorted[0];
    for (i, &u) in sorted.iter().enumerate() {
        cumsum += u;
        let t = (cumsum - 1.0) / (i + 1) as f64;
        if u - t > 0.0 {
            rho = i;
            cumsum_at_rho = cumsum;
        }
    }

    let theta = (cumsum_at_rho - 1.0) / (rho + 1) as f64;

    shifted.iter().map(|&x| (x - theta).max(0.0)).collect()
}
