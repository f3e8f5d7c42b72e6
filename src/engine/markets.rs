//! Derivation of wagering-market probabilities from a scoreline matrix.
//!
//! Every market is a sum of matrix cells under a predicate on the score
//! pair, so each function here is a thin wrapper over
//! [`ScorelineMatrix::sum_where`]. Nothing mutates the matrix and all
//! probabilities stay on the [0, 1] scale; presentation rounding happens at
//! result-assembly time.

use super::scoreline::ScorelineMatrix;

/// Markets the analysis endpoint reports, in presentation order.
pub const SUPPORTED_MARKETS: [&str; 13] = [
    "1X2",
    "Double Chance",
    "Draw No Bet",
    "Over/Under",
    "BTTS",
    "Team Goals",
    "1X2 + O/U",
    "DC + BTTS",
    "Result + BTTS",
    "Correct Score",
    "Clean Sheet",
    "Win to Nil",
    "Winning Margin",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Home,
    Away,
}

/// Match-result probabilities keyed by the conventional 1/X/2 codes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutcomeProbs {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}

impl OutcomeProbs {
    pub fn get(&self, code: &str) -> f64 {
        match code {
            "1" => self.home,
            "X" => self.draw,
            "2" => self.away,
            _ => 0.0,
        }
    }

    /// Model's top pick. Ties resolve to the first maximum in 1, X, 2 order,
    /// which is observable in output and must stay stable.
    pub fn best(&self) -> &'static str {
        let mut best = "1";
        let mut best_p = self.home;
        for (code, p) in [("X", self.draw), ("2", self.away)] {
            if p > best_p {
                best = code;
                best_p = p;
            }
        }
        best
    }
}

/// 1X2: home win is the strictly-lower triangle, draw the diagonal, away win
/// the strictly-upper triangle.
pub fn one_x_two(m: &ScorelineMatrix) -> OutcomeProbs {
    OutcomeProbs {
        home: m.sum_where(|i, j| i > j),
        draw: m.sum_where(|i, j| i == j),
        away: m.sum_where(|i, j| i < j),
    }
}

/// Double chance (1X, 12, X2), pairwise sums of the 1X2 outcomes.
pub fn double_chance(probs: &OutcomeProbs) -> (f64, f64, f64) {
    (
        probs.home + probs.draw,
        probs.home + probs.away,
        probs.draw + probs.away,
    )
}

/// Draw no bet: conditional win probabilities given no draw. Degenerate when
/// the draw carries all mass; defined as 0 in that case.
pub fn draw_no_bet(probs: &OutcomeProbs) -> (f64, f64) {
    if probs.draw < 1.0 {
        let rest = 1.0 - probs.draw;
        (probs.home / rest, probs.away / rest)
    } else {
        (0.0, 0.0)
    }
}

/// Total-goals over/under at a line (e.g. 2.5). Under is the complement.
pub fn over_under(m: &ScorelineMatrix, line: f64) -> (f64, f64) {
    let over = m.sum_where(|i, j| (i + j) as f64 > line);
    let under = m.sum_where(|i, j| (i + j) as f64 <= line);
    (over, under)
}

/// Both teams to score: (yes, no).
pub fn btts(m: &ScorelineMatrix) -> (f64, f64) {
    let yes = m.sum_where(|i, j| i > 0 && j > 0);
    (yes, 1.0 - yes)
}

/// Probability one side scores more than `line` goals.
pub fn team_goals_over(m: &ScorelineMatrix, side: Side, line: f64) -> f64 {
    match side {
        Side::Home => m.sum_where(|i, _| i as f64 > line),
        Side::Away => m.sum_where(|_, j| j as f64 > line),
    }
}

/// Joint result and total-goals market: (result & over, result & under) for
/// one 1X2 outcome code at one line.
pub fn result_total(m: &ScorelineMatrix, code: &str, line: f64) -> (f64, f64) {
    let result = result_predicate(code);
    (
        m.sum_where(|i, j| result(i, j) && (i + j) as f64 > line),
        m.sum_where(|i, j| result(i, j) && (i + j) as f64 <= line),
    )
}

/// Joint result and both-teams-to-score for one 1X2 outcome code.
pub fn result_btts(m: &ScorelineMatrix, code: &str) -> f64 {
    let result = result_predicate(code);
    m.sum_where(|i, j| result(i, j) && i > 0 && j > 0)
}

/// Joint double-chance and both-teams-to-score: (1X & GG, 12 & GG, X2 & GG).
pub fn double_chance_btts(m: &ScorelineMatrix) -> (f64, f64, f64) {
    (
        m.sum_where(|i, j| i >= j && i > 0 && j > 0),
        m.sum_where(|i, j| i != j && i > 0 && j > 0),
        m.sum_where(|i, j| j >= i && i > 0 && j > 0),
    )
}

/// Exact-score probability; 0 for scorelines outside the tracked range.
pub fn correct_score(m: &ScorelineMatrix, home_goals: usize, away_goals: usize) -> f64 {
    m.get(home_goals, away_goals)
}

/// Clean sheet: (home keeps one, away keeps one).
pub fn clean_sheet(m: &ScorelineMatrix) -> (f64, f64) {
    (m.sum_where(|_, j| j == 0), m.sum_where(|i, _| i == 0))
}

/// Win to nil: a clean sheet plus at least one goal scored.
pub fn win_to_nil(m: &ScorelineMatrix) -> (f64, f64) {
    (
        m.sum_where(|i, j| j == 0 && i >= 1),
        m.sum_where(|i, j| i == 0 && j >= 1),
    )
}

/// Winning-margin buckets by goal difference, clamped at ±3.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WinningMargin {
    pub home_by_one: f64,
    pub home_by_two: f64,
    pub home_by_three_plus: f64,
    pub away_by_one: f64,
    pub away_by_two: f64,
    pub away_by_three_plus: f64,
}

pub fn winning_margin(m: &ScorelineMatrix) -> WinningMargin {
    let diff = |i: usize, j: usize| i as i64 - j as i64;
    WinningMargin {
        home_by_one: m.sum_where(|i, j| diff(i, j) == 1),
        home_by_two: m.sum_where(|i, j| diff(i, j) == 2),
        home_by_three_plus: m.sum_where(|i, j| diff(i, j) >= 3),
        away_by_one: m.sum_where(|i, j| diff(i, j) == -1),
        away_by_two: m.sum_where(|i, j| diff(i, j) == -2),
        away_by_three_plus: m.sum_where(|i, j| diff(i, j) <= -3),
    }
}

fn result_predicate(code: &str) -> fn(usize, usize) -> bool {
    match code {
        "1" => |i, j| i > j,
        "2" => |i, j| i < j,
        _ => |i, j| i == j,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::scoreline::{ScorelineMatrix, DEFAULT_MAX_GOALS};
    use approx::assert_relative_eq;

    fn matrix() -> ScorelineMatrix {
        ScorelineMatrix::build(1.55, 1.18, DEFAULT_MAX_GOALS, 0.02).unwrap()
    }

    #[test]
    fn one_x_two_partitions_the_distribution() {
        let probs = one_x_two(&matrix());
        assert_relative_eq!(probs.home + probs.draw + probs.away, 1.0, epsilon = 1e-9);
        assert!(probs.home > probs.away, "higher home lambda should favour home");
    }

    #[test]
    fn double_chance_matches_component_sums_exactly() {
        let probs = one_x_two(&matrix());
        let (dc_1x, dc_12, dc_x2) = double_chance(&probs);
        // Same source cells, so equality is exact, not approximate.
        assert_eq!(dc_1x, probs.home + probs.draw);
        assert_eq!(dc_12, probs.home + probs.away);
        assert_eq!(dc_x2, probs.draw + probs.away);
    }

    #[test]
    fn draw_no_bet_renormalizes_without_draw() {
        let probs = one_x_two(&matrix());
        let (dnb_home, dnb_away) = draw_no_bet(&probs);
        assert_relative_eq!(dnb_home + dnb_away, 1.0, epsilon = 1e-9);
        assert!(dnb_home > probs.home);
    }

    #[test]
    fn draw_no_bet_degenerate_guard() {
        let all_draw = OutcomeProbs {
            home: 0.0,
            draw: 1.0,
            away: 0.0,
        };
        assert_eq!(draw_no_bet(&all_draw), (0.0, 0.0));
    }

    #[test]
    fn over_under_complement_holds_for_every_line() {
        let m = matrix();
        for &line in &[0.5, 1.5, 2.5, 3.5, 4.5] {
            let (over, under) = over_under(&m, line);
            assert_relative_eq!(over + under, 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn btts_complement() {
        let (yes, no) = btts(&matrix());
        assert_relative_eq!(yes + no, 1.0, epsilon = 1e-9);
        assert!(yes > 0.0 && yes < 1.0);
    }

    #[test]
    fn team_goals_over_is_monotone_in_line() {
        let m = matrix();
        let over_05 = team_goals_over(&m, Side::Home, 0.5);
        let over_15 = team_goals_over(&m, Side::Home, 1.5);
        let over_25 = team_goals_over(&m, Side::Home, 2.5);
        assert!(over_05 > over_15 && over_15 > over_25);
    }

    #[test]
    fn result_total_cells_partition_each_result() {
        let m = matrix();
        let probs = one_x_two(&m);
        for code in ["1", "X", "2"] {
            let (with_over, with_under) = result_total(&m, code, 2.5);
            assert_relative_eq!(with_over + with_under, probs.get(code), epsilon = 1e-9);
        }
    }

    #[test]
    fn result_btts_subsets_result() {
        let m = matrix();
        let probs = one_x_two(&m);
        for code in ["1", "X", "2"] {
            let joint = result_btts(&m, code);
            assert!(joint <= probs.get(code) + 1e-12);
        }
        // A drawn match with both teams scoring excludes 0-0.
        let x_gg = result_btts(&m, "X");
        assert!(x_gg < probs.draw);
    }

    #[test]
    fn double_chance_btts_consistency() {
        let m = matrix();
        let (dc1x_gg, dc12_gg, dcx2_gg) = double_chance_btts(&m);
        let (gg, _) = btts(&m);
        // 1X&GG plus 2&GG double-counts nothing and covers all GG outcomes.
        let two_gg = result_btts(&m, "2");
        assert_relative_eq!(dc1x_gg + two_gg, gg, epsilon = 1e-9);
        assert!(dc12_gg <= gg && dcx2_gg <= gg);
    }

    #[test]
    fn winning_margin_buckets_aggregate_tail() {
        // Hand-built distribution: only home wins by 1..=4 carry mass.
        let m = ScorelineMatrix::from_fn(DEFAULT_MAX_GOALS, |i, j| match (i, j) {
            (1, 0) => 0.10,
            (2, 0) => 0.05,
            (3, 0) => 0.02,
            (4, 0) => 0.01,
            _ => 0.0,
        });
        let margin = winning_margin(&m);
        assert_relative_eq!(margin.home_by_one, 0.10, epsilon = 1e-12);
        assert_relative_eq!(margin.home_by_two, 0.05, epsilon = 1e-12);
        assert_relative_eq!(margin.home_by_three_plus, 0.03, epsilon = 1e-12);
        assert_eq!(margin.away_by_one, 0.0);
        assert_eq!(margin.away_by_three_plus, 0.0);
    }

    #[test]
    fn correct_score_out_of_range_is_zero() {
        let m = matrix();
        assert_eq!(correct_score(&m, 11, 0), 0.0);
        assert_eq!(correct_score(&m, 0, 99), 0.0);
        assert!(correct_score(&m, 1, 0) > 0.0);
    }

    #[test]
    fn win_to_nil_excludes_goalless_draw() {
        let m = matrix();
        let (cs_home, cs_away) = clean_sheet(&m);
        let (wtn_home, wtn_away) = win_to_nil(&m);
        let p00 = m.get(0, 0);
        assert_relative_eq!(wtn_home, cs_home - p00, epsilon = 1e-9);
        assert_relative_eq!(wtn_away, cs_away - p00, epsilon = 1e-9);
    }

    #[test]
    fn model_best_breaks_ties_toward_home() {
        let tied = OutcomeProbs {
            home: 0.4,
            draw: 0.4,
            away: 0.2,
        };
        assert_eq!(tied.best(), "1");
        let tied_xa = OutcomeProbs {
            home: 0.2,
            draw: 0.4,
            away: 0.4,
        };
        assert_eq!(tied_xa.best(), "X");
    }
}
