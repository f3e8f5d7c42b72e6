//! Value comparison between model probabilities and bookmaker 1X2 prices.

use serde::{Deserialize, Deserializer, Serialize};

use super::markets::OutcomeProbs;

/// Edge below which a quoted outcome is flagged as missing or unusable.
pub const MISSING_EDGE: f64 = -1.0;

/// Decimal 1X2 odds as quoted by a bookmaker. Feeds arrive from JSON where
/// prices may be numbers, numeric strings, or junk; anything unparsable is
/// treated as not quoted.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MarketOdds {
    #[serde(default, alias = "1", deserialize_with = "lenient_odds")]
    pub home: Option<f64>,
    #[serde(default, alias = "X", deserialize_with = "lenient_odds")]
    pub draw: Option<f64>,
    #[serde(default, alias = "2", deserialize_with = "lenient_odds")]
    pub away: Option<f64>,
}

impl MarketOdds {
    pub fn get(&self, code: &str) -> Option<f64> {
        match code {
            "1" => self.home,
            "X" => self.draw,
            "2" => self.away,
            _ => None,
        }
    }

    pub fn any_quoted(&self) -> bool {
        self.home.is_some() || self.draw.is_some() || self.away.is_some()
    }
}

fn lenient_odds<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Text(String),
        Other(serde_json::Value),
    }

    let parsed = match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Num(n)) => Some(n),
        Some(Raw::Text(s)) => s.trim().parse::<f64>().ok(),
        Some(Raw::Other(_)) | None => None,
    };
    Ok(parsed.filter(|v| v.is_finite()))
}

/// One outcome row of the value table.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ValueRow {
    /// Bookmaker's implied probability, 1/odds. Zero when unquoted.
    pub implied: f64,
    /// Model probability for the outcome.
    pub model: f64,
    /// Model-fair decimal odds, 1/p. None when the model gives zero chance.
    pub fair_odds: Option<f64>,
    /// Model minus implied probability, or [`MISSING_EDGE`] when unquoted.
    pub edge: f64,
}

/// Result of comparing one 1X2 quote against the model.
#[derive(Debug, Clone, Serialize)]
pub struct ValueReport {
    pub home: ValueRow,
    pub draw: ValueRow,
    pub away: ValueRow,
    /// Outcome code with the highest positive edge, first-seen in 1, X, 2
    /// order. Stays at "1" when nothing beats the missing sentinel.
    pub best_selection: &'static str,
    pub best_edge: f64,
    /// True when no outcome shows an edge at or above the efficiency cut.
    pub efficient: bool,
}

impl ValueReport {
    pub fn row(&self, code: &str) -> &ValueRow {
        match code {
            "X" => &self.draw,
            "2" => &self.away,
            _ => &self.home,
        }
    }
}

fn score_outcome(prob: f64, quote: Option<f64>) -> ValueRow {
    match quote {
        Some(odds) if odds > 0.0 => ValueRow {
            implied: 1.0 / odds,
            model: prob,
            fair_odds: if prob > 0.0 { Some(1.0 / prob) } else { None },
            edge: prob - 1.0 / odds,
        },
        _ => ValueRow {
            implied: 0.0,
            model: prob,
            fair_odds: None,
            edge: MISSING_EDGE,
        },
    }
}

/// Compares model 1X2 probabilities to quoted odds and picks the outcome
/// with the largest edge.
pub fn evaluate(probs: &OutcomeProbs, odds: &MarketOdds, efficiency_threshold: f64) -> ValueReport {
    let home = score_outcome(probs.home, odds.home);
    let draw = score_outcome(probs.draw, odds.draw);
    let away = score_outcome(probs.away, odds.away);

    let mut best_selection = "1";
    let mut best_edge = MISSING_EDGE;
    for (code, row) in [("1", &home), ("X", &draw), ("2", &away)] {
        if row.edge > best_edge {
            best_selection = code;
            best_edge = row.edge;
        }
    }

    ValueReport {
        home,
        draw,
        away,
        best_selection,
        best_edge,
        efficient: best_edge < efficiency_threshold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn probs() -> OutcomeProbs {
        OutcomeProbs {
            home: 0.55,
            draw: 0.25,
            away: 0.20,
        }
    }

    #[test]
    fn edges_follow_model_minus_implied() {
        let odds = MarketOdds {
            home: Some(2.0),
            draw: Some(3.2),
            away: Some(4.0),
        };
        let report = evaluate(&probs(), &odds, 0.03);
        assert_relative_eq!(report.home.edge, 0.05, epsilon = 1e-12);
        assert_relative_eq!(report.draw.edge, -0.0625, epsilon = 1e-12);
        assert_relative_eq!(report.away.edge, -0.05, epsilon = 1e-12);
        assert_eq!(report.best_selection, "1");
        assert!(!report.efficient);
        assert_relative_eq!(report.home.fair_odds.unwrap(), 1.0 / 0.55, epsilon = 1e-12);
    }

    #[test]
    fn missing_quote_gets_sentinel_edge() {
        let odds = MarketOdds {
            home: None,
            draw: Some(3.2),
            away: Some(4.0),
        };
        let report = evaluate(&probs(), &odds, 0.03);
        assert_eq!(report.home.edge, MISSING_EDGE);
        assert_eq!(report.home.implied, 0.0);
        assert!(report.home.fair_odds.is_none());
        // Negative real edges still beat the sentinel.
        assert_eq!(report.best_selection, "X");
    }

    #[test]
    fn non_positive_odds_treated_as_missing() {
        let odds = MarketOdds {
            home: Some(0.0),
            draw: Some(-2.5),
            away: Some(4.0),
        };
        let report = evaluate(&probs(), &odds, 0.03);
        assert_eq!(report.home.edge, MISSING_EDGE);
        assert_eq!(report.draw.edge, MISSING_EDGE);
        assert_eq!(report.best_selection, "2");
    }

    #[test]
    fn zero_model_probability_has_no_fair_price() {
        let certain = OutcomeProbs {
            home: 1.0,
            draw: 0.0,
            away: 0.0,
        };
        let odds = MarketOdds {
            home: Some(1.1),
            draw: Some(12.0),
            away: Some(20.0),
        };
        let report = evaluate(&certain, &odds, 0.03);
        assert!(report.draw.fair_odds.is_none());
        assert!(report.away.fair_odds.is_none());
        assert!(report.home.fair_odds.is_some());
    }

    #[test]
    fn tied_edges_resolve_to_earliest_outcome() {
        let even = OutcomeProbs {
            home: 0.4,
            draw: 0.4,
            away: 0.2,
        };
        let odds = MarketOdds {
            home: Some(2.5),
            draw: Some(2.5),
            away: Some(5.0),
        };
        let report = evaluate(&even, &odds, 0.03);
        assert_eq!(report.best_selection, "1");
    }

    #[test]
    fn efficient_when_every_edge_is_small() {
        let odds = MarketOdds {
            home: Some(1.0 / 0.54),
            draw: Some(1.0 / 0.25),
            away: Some(1.0 / 0.21),
        };
        let report = evaluate(&probs(), &odds, 0.03);
        assert!(report.efficient);
        assert!(report.best_edge < 0.03);
    }

    #[test]
    fn lenient_parsing_accepts_numbers_and_strings() {
        let odds: MarketOdds =
            serde_json::from_str(r#"{"home": 2.0, "draw": "3.20", "away": "n/a"}"#).unwrap();
        assert_eq!(odds.home, Some(2.0));
        assert_eq!(odds.draw, Some(3.2));
        assert_eq!(odds.away, None);
        assert!(odds.any_quoted());
    }

    #[test]
    fn lenient_parsing_rejects_non_finite() {
        let odds: MarketOdds = serde_json::from_str(r#"{"home": "NaN", "draw": "inf"}"#).unwrap();
        assert_eq!(odds.home, None);
        assert_eq!(odds.draw, None);
        assert_eq!(odds.away, None);
        assert!(!odds.any_quoted());
    }
}
