use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use super::source::{FixtureOdds, FixtureQuery, FixtureSummary, OddsSource};

/// Bookmakers tried in order when extracting a 1X2 quote. Labels are the
/// exact names API-FOOTBALL uses.
pub const PREFERRED_BOOKMAKERS: [&str; 7] = [
    "Bet365",
    "Pinnacle",
    "William Hill",
    "Marathonbet",
    "Unibet",
    "1xBet",
    "Betfair",
];

/// Client for the API-FOOTBALL v3 REST API.
#[derive(Clone)]
pub struct ApiFootballClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl ApiFootballClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(20))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiFootballClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// GET an API-FOOTBALL endpoint, returning its `response` array.
    async fn get_response(&self, path: &str, params: &[(&str, String)]) -> Result<Vec<Value>> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        debug!("API-FOOTBALL request: {} {:?}", url, params);

        let resp = self
            .http
            .get(&url)
            .header("x-apisports-key", &self.api_key)
            .header("Accept", "application/json")
            .query(params)
            .send()
            .await
            .context("API-FOOTBALL request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("API-FOOTBALL error {}: {}", status, body);
        }

        let raw: Value = resp
            .json()
            .await
            .context("Failed to parse API-FOOTBALL response")?;
        Ok(raw
            .get("response")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default())
    }

    /// Fixtures matching the query, without odds.
    pub async fn fixtures(&self, query: &FixtureQuery) -> Result<Vec<Value>> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(id) = query.fixture_id {
            params.push(("id", id.to_string()));
        }
        if let Some(league) = query.league_id {
            params.push(("league", league.to_string()));
        }
        if let Some(season) = query.season {
            params.push(("season", season.to_string()));
        }
        if let Some(date) = &query.date {
            params.push(("date", date.clone()));
        }
        self.get_response("fixtures", &params).await
    }

    /// Best available 1X2 quote for one fixture, or None when not posted.
    pub async fn odds_for_fixture(&self, fixture_id: i64) -> Result<Option<FixtureOdds>> {
        let entries = self
            .get_response("odds", &[("fixture", fixture_id.to_string())])
            .await?;
        Ok(extract_1x2(&entries))
    }
}

#[async_trait]
impl OddsSource for ApiFootballClient {
    async fn fixtures_with_odds(&self, query: &FixtureQuery) -> Result<Vec<FixtureSummary>> {
        let raw = self.fixtures(query).await?;
        let mut out = Vec::with_capacity(raw.len());
        for fx in &raw {
            let mut summary = parse_fixture(fx);
            if let Some(fid) = summary.fixture_id {
                // Odds are fetched one fixture at a time to stay inside the
                // API's rate limits; a failed lookup leaves odds empty.
                match self.odds_for_fixture(fid).await {
                    Ok(odds) => summary.odds = odds,
                    Err(e) => warn!("Odds fetch failed for fixture {}: {}", fid, e),
                }
            }
            out.push(summary);
        }
        Ok(out)
    }

    /// Team search, first candidate wins.
    async fn search_team(&self, name: &str) -> Result<Option<Value>> {
        if name.trim().is_empty() {
            return Ok(None);
        }
        let mut results = self
            .get_response("teams", &[("search", name.to_string())])
            .await?;
        Ok(if results.is_empty() {
            None
        } else {
            Some(results.swap_remove(0))
        })
    }

    fn name(&self) -> &str {
        "API-FOOTBALL"
    }
}

// ── Parsing helpers ────────────────────────────────────────────────────────────

fn parse_fixture(fx: &Value) -> FixtureSummary {
    let fixture = &fx["fixture"];
    let league = &fx["league"];
    let home = &fx["teams"]["home"];
    let away = &fx["teams"]["away"];
    let text = |v: &Value| v.as_str().map(|s| s.to_string());
    FixtureSummary {
        fixture_id: fixture["id"].as_i64(),
        utc: text(&fixture["date"]),
        status: text(&fixture["status"]["short"]),
        league_id: league["id"].as_i64(),
        league: text(&league["name"]),
        country: text(&league["country"]),
        season: league["season"].as_i64(),
        round: text(&league["round"]),
        home_id: home["id"].as_i64(),
        home: text(&home["name"]),
        away_id: away["id"].as_i64(),
        away: text(&away["name"]),
        odds: None,
    }
}

/// Pull a complete 1X2 quote out of an odds response, preferring well-known
/// bookmakers and falling back to the lowest-juice quote found.
fn extract_1x2(entries: &[Value]) -> Option<FixtureOdds> {
    let mut quotes: Vec<FixtureOdds> = Vec::new();
    for entry in entries {
        // v3 shape: { bookmakers: [ { bookmaker|name, bets: [...] } ] };
        // some plans return the bookmaker layer directly.
        let blocks = match entry.get("bookmakers").and_then(|v| v.as_array()) {
            Some(bks) => bks.clone(),
            None => vec![entry.clone()],
        };
        for block in &blocks {
            let name = block["bookmaker"]["name"]
                .as_str()
                .or_else(|| block["name"].as_str())
                .unwrap_or("unknown");
            if let Some(odds) = extract_from_bets(&block["bets"], name) {
                quotes.push(odds);
            }
        }
    }

    for pref in PREFERRED_BOOKMAKERS {
        if let Some(pos) = quotes.iter().position(|q| q.bookmaker == pref) {
            return Some(quotes.swap_remove(pos));
        }
    }
    // Lowest total implied probability = least bookmaker margin.
    quotes.into_iter().min_by(|a, b| {
        let juice = |q: &FixtureOdds| 1.0 / q.home + 1.0 / q.draw + 1.0 / q.away;
        juice(a).total_cmp(&juice(b))
    })
}

fn extract_from_bets(bets: &Value, bookmaker: &str) -> Option<FixtureOdds> {
    for bet in bets.as_array()? {
        let bet_name = bet["name"]
            .as_str()
            .or_else(|| bet["label"].as_str())
            .unwrap_or("")
            .to_lowercase();
        if !matches!(
            bet_name.as_str(),
            "match winner" | "1x2" | "winner" | "fulltime result"
        ) {
            continue;
        }
        let mut home = None;
        let mut draw = None;
        let mut away = None;
        let empty = Vec::new();
        for value in bet["values"].as_array().unwrap_or(&empty) {
            let label = value["value"]
                .as_str()
                .or_else(|| value["label"].as_str())
                .unwrap_or("")
                .trim()
                .to_uppercase();
            let odd = value["odd"]
                .as_str()
                .and_then(|s| s.parse::<f64>().ok())
                .or_else(|| value["odd"].as_f64());
            let Some(price) = odd.filter(|o| *o > 0.0) else {
                continue;
            };
            match label.as_str() {
                "1" | "HOME" => home = Some(price),
                "X" | "DRAW" => draw = Some(price),
                "2" | "AWAY" => away = Some(price),
                _ => {}
            }
        }
        if let (Some(home), Some(draw), Some(away)) = (home, draw, away) {
            return Some(FixtureOdds {
                home,
                draw,
                away,
                bookmaker: bookmaker.to_string(),
            });
        }
    }
    None
}
