use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One stored analysis outcome, promoted or skipped
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickRecord {
    pub id: Option<i64>,
    pub league: String,
    pub home: String,
    pub away: String,
    /// "FINAL_PICK" | "SKIPPED"
    pub status: String,
    /// Chosen 1X2 outcome code, present only for promoted picks
    pub selection: Option<String>,
    /// Winning edge on the [0, 1] scale, present only for promoted picks
    pub best_edge: Option<f64>,
    /// Full analysis result as served to the caller
    pub result_json: String,
    pub created_at: DateTime<Utc>,
}

impl PickRecord {
    /// Rebuild an index row from a stored or imported result document.
    /// Missing summary fields degrade to None rather than failing the import.
    pub fn from_result_json(result: &serde_json::Value) -> Result<Self> {
        let field = |key: &str| {
            result
                .get(key)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };
        let selection = result
            .pointer("/value_mode_table/best_edge_sel")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());
        let best_edge = result
            .pointer("/alignment/edge_best_pp")
            .and_then(|v| v.as_f64())
            .map(|pp| pp / 100.0);
        Ok(PickRecord {
            id: None,
            league: field("league"),
            home: field("home"),
            away: field("away"),
            status: field("status"),
            selection,
            best_edge,
            result_json: serde_json::to_string(result)?,
            created_at: Utc::now(),
        })
    }
}
