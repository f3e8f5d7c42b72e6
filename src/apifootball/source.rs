use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fixture lookup parameters; a fixture id alone is enough, otherwise a
/// league id plus season and/or date.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixtureQuery {
    pub fixture_id: Option<i64>,
    pub league_id: Option<i64>,
    pub season: Option<i64>,
    /// YYYY-MM-DD
    pub date: Option<String>,
}

impl FixtureQuery {
    pub fn is_usable(&self) -> bool {
        self.fixture_id.is_some()
            || (self.league_id.is_some() && (self.season.is_some() || self.date.is_some()))
    }
}

/// 1X2 prices from a single bookmaker
#[derive(Debug, Clone, Serialize)]
pub struct FixtureOdds {
    #[serde(rename = "1")]
    pub home: f64,
    #[serde(rename = "X")]
    pub draw: f64,
    #[serde(rename = "2")]
    pub away: f64,
    pub bookmaker: String,
}

/// One upcoming or live fixture, with 1X2 odds when posted
#[derive(Debug, Clone, Serialize)]
pub struct FixtureSummary {
    pub fixture_id: Option<i64>,
    pub utc: Option<String>,
    pub status: Option<String>,
    pub league_id: Option<i64>,
    pub league: Option<String>,
    pub country: Option<String>,
    pub season: Option<i64>,
    pub round: Option<String>,
    pub home_id: Option<i64>,
    pub home: Option<String>,
    pub away_id: Option<i64>,
    pub away: Option<String>,
    pub odds: Option<FixtureOdds>,
}

/// Trait for anything that can list fixtures and their quoted odds.
#[async_trait]
pub trait OddsSource: Send + Sync {
    /// Fixtures matching the query, each with its best 1X2 quote attached
    /// when one is posted.
    async fn fixtures_with_odds(&self, query: &FixtureQuery) -> Result<Vec<FixtureSummary>>;

    /// First team record matching a free-text name, raw provider JSON.
    async fn search_team(&self, name: &str) -> Result<Option<Value>>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}
