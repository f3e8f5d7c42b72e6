//! Expected-goals priors and their contextual adjustments.

use serde::Deserialize;

/// Smallest allowed goal expectancy after adjustments.
pub const LAMBDA_FLOOR: f64 = 0.2;

const HOME_SPLIT: f64 = 0.95;
const AWAY_SPLIT: f64 = 1.05;
const HIGH_INTENSITY_BOOST: f64 = 1.03;
const ABSENCE_PENALTY: f64 = 0.92;

/// Contextual signals attached to an analysis request.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct ContextFlags {
    /// Derby or similarly volatile fixture; raises both goal rates and the
    /// low-score correlation.
    pub high_intensity: bool,
    pub home_key_absence: bool,
    pub away_key_absence: bool,
}

/// Expected goals for both sides after all adjustments. Both values stay
/// above [`LAMBDA_FLOOR`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpectedGoals {
    pub home: f64,
    pub away: f64,
}

/// Derives expected goals from a league-average prior and context flags.
///
/// The prior splits the league average with a slight tilt to the away
/// side; callers with live form data can pass adjusted averages instead.
pub fn estimate(league_avg_goals: f64, ctx: &ContextFlags) -> ExpectedGoals {
    let mut home = league_avg_goals / 2.0 * HOME_SPLIT;
    let mut away = league_avg_goals / 2.0 * AWAY_SPLIT;
    if ctx.high_intensity {
        home *= HIGH_INTENSITY_BOOST;
        away *= HIGH_INTENSITY_BOOST;
    }
    if ctx.home_key_absence {
        home *= ABSENCE_PENALTY;
    }
    if ctx.away_key_absence {
        away *= ABSENCE_PENALTY;
    }
    ExpectedGoals {
        home: home.max(LAMBDA_FLOOR),
        away: away.max(LAMBDA_FLOOR),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn neutral_context_splits_league_average() {
        let eg = estimate(2.6, &ContextFlags::default());
        assert_relative_eq!(eg.home, 1.3 * 0.95, epsilon = 1e-12);
        assert_relative_eq!(eg.away, 1.3 * 1.05, epsilon = 1e-12);
        assert_relative_eq!(eg.home + eg.away, 2.6, epsilon = 1e-9);
    }

    #[test]
    fn high_intensity_raises_both_sides() {
        let base = estimate(2.6, &ContextFlags::default());
        let derby = estimate(
            2.6,
            &ContextFlags {
                high_intensity: true,
                ..Default::default()
            },
        );
        assert_relative_eq!(derby.home, base.home * 1.03, epsilon = 1e-12);
        assert_relative_eq!(derby.away, base.away * 1.03, epsilon = 1e-12);
    }

    #[test]
    fn absence_lowers_only_the_affected_side() {
        let base = estimate(2.6, &ContextFlags::default());
        let weakened = estimate(
            2.6,
            &ContextFlags {
                home_key_absence: true,
                ..Default::default()
            },
        );
        assert!(weakened.home < base.home);
        assert_relative_eq!(weakened.away, base.away, epsilon = 1e-12);
    }

    #[test]
    fn floor_applies_to_tiny_averages() {
        let eg = estimate(0.1, &ContextFlags::default());
        assert_eq!(eg.home, LAMBDA_FLOOR);
        assert_eq!(eg.away, LAMBDA_FLOOR);
    }
}
