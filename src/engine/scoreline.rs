//! Joint scoreline distribution for a single match.
//!
//! The model is two independent Poisson goal counts (one per side) with the
//! Dixon-Coles low-score correction applied to the four cells where both
//! sides score at most one goal. The correction redistributes mass between
//! 0-0 / 1-1 and 1-0 / 0-1, which plain product-Poisson is known to misprice,
//! and the whole matrix is renormalized afterwards.

use super::error::EngineError;

/// Default goal cutoff per side. Poisson mass beyond 10 goals is negligible
/// for realistic expected-goals values (cumulative mass through 10 exceeds
/// 0.9999 for λ ≤ ~3).
pub const DEFAULT_MAX_GOALS: usize = 10;

/// Normalized probability grid over final scores, cell (i, j) being the
/// probability the match ends i–j. Built once per analysis request and never
/// mutated afterwards.
#[derive(Debug, Clone)]
pub struct ScorelineMatrix {
    cells: Vec<f64>,
    dim: usize,
}

impl ScorelineMatrix {
    /// Build the adjusted, renormalized scoreline matrix.
    ///
    /// `rho` is the Dixon-Coles correlation parameter; callers keep it small
    /// (≈0.02–0.05) so every adjusted cell stays non-negative. `rho = 0`
    /// reduces to the independent product-Poisson distribution.
    pub fn build(
        lambda_home: f64,
        lambda_away: f64,
        max_goals: usize,
        rho: f64,
    ) -> Result<Self, EngineError> {
        if !(lambda_home > 0.0) {
            return Err(EngineError::InvalidParameter(format!(
                "lambda_home must be positive, got {lambda_home}"
            )));
        }
        if !(lambda_away > 0.0) {
            return Err(EngineError::InvalidParameter(format!(
                "lambda_away must be positive, got {lambda_away}"
            )));
        }

        let dim = max_goals + 1;
        let pmf_home = poisson_pmf(lambda_home, max_goals);
        let pmf_away = poisson_pmf(lambda_away, max_goals);

        let mut cells = vec![0.0; dim * dim];
        for i in 0..dim {
            for j in 0..dim {
                let adj = if i <= 1 && j <= 1 {
                    match (i, j) {
                        (0, 0) => 1.0 - lambda_home * lambda_away * rho,
                        (0, 1) => 1.0 + lambda_home * rho,
                        (1, 0) => 1.0 + lambda_away * rho,
                        _ => 1.0 - rho,
                    }
                } else {
                    1.0
                };
                cells[i * dim + j] = pmf_home[i] * pmf_away[j] * adj;
            }
        }

        // Renormalize so the grid is a proper distribution. A zero total
        // cannot occur for valid lambdas but must not divide.
        let total: f64 = cells.iter().sum();
        if total > 0.0 {
            for c in &mut cells {
                *c /= total;
            }
        }

        Ok(ScorelineMatrix { cells, dim })
    }

    /// Construct directly from a cell function, used by market tests that
    /// need a hand-built distribution.
    pub(crate) fn from_fn(max_goals: usize, f: impl Fn(usize, usize) -> f64) -> Self {
        let dim = max_goals + 1;
        let mut cells = vec![0.0; dim * dim];
        for i in 0..dim {
            for j in 0..dim {
                cells[i * dim + j] = f(i, j);
            }
        }
        ScorelineMatrix { cells, dim }
    }

    pub fn max_goals(&self) -> usize {
        self.dim - 1
    }

    /// Probability of the exact score i–j; 0.0 outside the tracked range.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        if i < self.dim && j < self.dim {
            self.cells[i * self.dim + j]
        } else {
            0.0
        }
    }

    /// Sum all cells whose score pair satisfies the predicate. This is the
    /// one scan every market definition reduces to.
    pub fn sum_where(&self, pred: impl Fn(usize, usize) -> bool) -> f64 {
        let mut total = 0.0;
        for i in 0..self.dim {
            for j in 0..self.dim {
                if pred(i, j) {
                    total += self.cells[i * self.dim + j];
                }
            }
        }
        total
    }

    pub fn total(&self) -> f64 {
        self.cells.iter().sum()
    }
}

/// Poisson point masses for k = 0..=max_k via the multiplicative recurrence
/// p₀ = e^{−λ}, pₖ = pₖ₋₁·λ/k. Avoids factorials and overflow entirely.
fn poisson_pmf(lambda: f64, max_k: usize) -> Vec<f64> {
    let mut out = vec![0.0; max_k + 1];
    out[0] = (-lambda).exp();
    for k in 1..=max_k {
        out[k] = out[k - 1] * lambda / k as f64;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn matrix_sums_to_one_across_parameter_grid() {
        for &lh in &[0.3, 0.9, 1.4, 2.2, 3.1] {
            for &la in &[0.4, 1.1, 1.9, 2.8] {
                for &rho in &[0.0, 0.02, 0.05, 0.1] {
                    let m = ScorelineMatrix::build(lh, la, DEFAULT_MAX_GOALS, rho).unwrap();
                    assert_relative_eq!(m.total(), 1.0, epsilon = 1e-9);
                }
            }
        }
    }

    #[test]
    fn all_cells_non_negative() {
        let m = ScorelineMatrix::build(1.6, 1.2, DEFAULT_MAX_GOALS, 0.05).unwrap();
        for i in 0..=m.max_goals() {
            for j in 0..=m.max_goals() {
                assert!(m.get(i, j) >= 0.0, "cell ({i},{j}) negative");
            }
        }
    }

    #[test]
    fn zero_rho_reduces_to_product_poisson() {
        // Small lambdas keep the truncation residue far below the tolerance.
        let (lh, la) = (0.5, 0.5);
        let m = ScorelineMatrix::build(lh, la, DEFAULT_MAX_GOALS, 0.0).unwrap();
        let expected = (-lh).exp() * (-la).exp();
        assert_relative_eq!(m.get(0, 0), expected, epsilon = 1e-9);
    }

    #[test]
    fn dixon_coles_shifts_low_score_mass() {
        let independent = ScorelineMatrix::build(1.3, 1.1, DEFAULT_MAX_GOALS, 0.0).unwrap();
        let adjusted = ScorelineMatrix::build(1.3, 1.1, DEFAULT_MAX_GOALS, 0.05).unwrap();
        // Positive rho dampens 0-0 and 1-1, boosts 1-0 and 0-1.
        assert!(adjusted.get(0, 0) < independent.get(0, 0));
        assert!(adjusted.get(1, 1) < independent.get(1, 1));
        assert!(adjusted.get(1, 0) > independent.get(1, 0));
        assert!(adjusted.get(0, 1) > independent.get(0, 1));
    }

    #[test]
    fn identical_inputs_are_bit_identical() {
        let a = ScorelineMatrix::build(1.7, 0.9, DEFAULT_MAX_GOALS, 0.02).unwrap();
        let b = ScorelineMatrix::build(1.7, 0.9, DEFAULT_MAX_GOALS, 0.02).unwrap();
        for i in 0..=a.max_goals() {
            for j in 0..=a.max_goals() {
                assert_eq!(a.get(i, j).to_bits(), b.get(i, j).to_bits());
            }
        }
    }

    #[test]
    fn non_positive_lambda_is_rejected() {
        assert!(ScorelineMatrix::build(0.0, 1.0, DEFAULT_MAX_GOALS, 0.02).is_err());
        assert!(ScorelineMatrix::build(1.0, -0.5, DEFAULT_MAX_GOALS, 0.02).is_err());
        assert!(ScorelineMatrix::build(f64::NAN, 1.0, DEFAULT_MAX_GOALS, 0.02).is_err());
    }

    #[test]
    fn out_of_range_lookup_is_zero() {
        let m = ScorelineMatrix::build(1.5, 1.0, DEFAULT_MAX_GOALS, 0.02).unwrap();
        assert_eq!(m.get(11, 0), 0.0);
        assert_eq!(m.get(0, 11), 0.0);
    }
}
