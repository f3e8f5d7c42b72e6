use anyhow::Result;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

pub mod models;
use models::*;

/// Thread-safe SQLite connection pool (single connection with mutex)
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the SQLite database at the given path
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        let db = Database {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Run schema migrations (idempotent)
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    // ── Picks ─────────────────────────────────────────────────────────────────

    /// Insert one analysis outcome, returning its row id
    pub fn insert_pick(&self, pick: &PickRecord) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO picks (
                league, home, away, status, selection, best_edge,
                result_json, created_at
             ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8)",
            params![
                pick.league,
                pick.home,
                pick.away,
                pick.status,
                pick.selection,
                pick.best_edge,
                pick.result_json,
                pick.created_at,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// List recorded picks, newest first (paginated)
    pub fn list_picks(&self, limit: i64, offset: i64) -> Result<Vec<PickRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, league, home, away, status, selection, best_edge,
                    result_json, created_at
             FROM picks ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2",
        )?;
        let picks = stmt
            .query_map(params![limit, offset], map_pick)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(picks)
    }

    /// Dump every stored analysis result as raw JSON, oldest first
    pub fn export_picks(&self) -> Result<Vec<serde_json::Value>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT result_json FROM picks ORDER BY created_at ASC, id ASC")?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        let mut items = Vec::with_capacity(rows.len());
        for raw in rows {
            items.push(serde_json::from_str(&raw)?);
        }
        Ok(items)
    }

    /// Replace the pick log wholesale with imported results.
    ///
    /// Runs in a transaction so a malformed item cannot leave the table
    /// half-replaced. Returns the number of rows imported.
    pub fn replace_picks(&self, items: &[serde_json::Value]) -> Result<usize> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM picks", [])?;
        for item in items {
            let record = PickRecord::from_result_json(item)?;
            tx.execute(
                "INSERT INTO picks (
                    league, home, away, status, selection, best_edge,
                    result_json, created_at
                 ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8)",
                params![
                    record.league,
                    record.home,
                    record.away,
                    record.status,
                    record.selection,
                    record.best_edge,
                    record.result_json,
                    record.created_at,
                ],
            )?;
        }
        tx.commit()?;
        Ok(items.len())
    }

    // ── Stats ─────────────────────────────────────────────────────────────────

    /// Aggregate counts over the pick log
    pub fn pick_stats(&self) -> Result<PickStats> {
        let conn = self.conn.lock().unwrap();
        let total: i64 = conn
            .query_row("SELECT COUNT(*) FROM picks", [], |r| r.get(0))
            .unwrap_or(0);
        let promoted: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM picks WHERE status='FINAL_PICK'",
                [],
                |r| r.get(0),
            )
            .unwrap_or(0);
        let skipped: i64 = conn
            .query_row("SELECT COUNT(*) FROM picks WHERE status='SKIPPED'", [], |r| {
                r.get(0)
            })
            .unwrap_or(0);
        Ok(PickStats {
            total,
            promoted,
            skipped,
        })
    }
}

fn map_pick(row: &rusqlite::Row) -> rusqlite::Result<PickRecord> {
    Ok(PickRecord {
        id: row.get(0)?,
        league: row.get(1)?,
        home: row.get(2)?,
        away: row.get(3)?,
        status: row.get(4)?,
        selection: row.get(5)?,
        best_edge: row.get(6)?,
        result_json: row.get(7)?,
        created_at: row.get(8)?,
    })
}

/// SQLite schema (idempotent CREATE IF NOT EXISTS)
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS picks (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    league      TEXT    NOT NULL,
    home        TEXT    NOT NULL,
    away        TEXT    NOT NULL,
    status      TEXT    NOT NULL,
    selection   TEXT,
    best_edge   REAL,
    result_json TEXT    NOT NULL,
    created_at  TEXT    NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_picks_status ON picks(status);
CREATE INDEX IF NOT EXISTS idx_picks_created ON picks(created_at);
"#;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickStats {
    pub total: i64,
    pub promoted: i64,
    pub skipped: i64,
}

impl Database {
    /// In-memory database for tests
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_pick(status: &str) -> PickRecord {
        PickRecord {
            id: None,
            league: "Premier League".into(),
            home: "Alpha".into(),
            away: "Beta".into(),
            status: status.into(),
            selection: (status == "FINAL_PICK").then(|| "1".to_string()),
            best_edge: (status == "FINAL_PICK").then_some(0.07),
            result_json: format!(r#"{{"status":"{status}","league":"Premier League","home":"Alpha","away":"Beta"}}"#),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn insert_and_list_roundtrip() {
        let db = Database::open_in_memory().unwrap();
        db.insert_pick(&sample_pick("FINAL_PICK")).unwrap();
        db.insert_pick(&sample_pick("SKIPPED")).unwrap();

        let picks = db.list_picks(10, 0).unwrap();
        assert_eq!(picks.len(), 2);
        // Newest first.
        assert_eq!(picks[0].status, "SKIPPED");
        assert_eq!(picks[1].selection.as_deref(), Some("1"));
    }

    #[test]
    fn stats_count_by_status() {
        let db = Database::open_in_memory().unwrap();
        db.insert_pick(&sample_pick("FINAL_PICK")).unwrap();
        db.insert_pick(&sample_pick("SKIPPED")).unwrap();
        db.insert_pick(&sample_pick("SKIPPED")).unwrap();

        let stats = db.pick_stats().unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.promoted, 1);
        assert_eq!(stats.skipped, 2);
    }

    #[test]
    fn replace_picks_swaps_the_log() {
        let db = Database::open_in_memory().unwrap();
        db.insert_pick(&sample_pick("FINAL_PICK")).unwrap();

        let imported = vec![
            serde_json::json!({"status": "SKIPPED", "league": "L", "home": "H", "away": "A"}),
            serde_json::json!({"status": "FINAL_PICK", "league": "L", "home": "H2", "away": "A2"}),
        ];
        let count = db.replace_picks(&imported).unwrap();
        assert_eq!(count, 2);

        let exported = db.export_picks().unwrap();
        assert_eq!(exported.len(), 2);
        assert_eq!(exported[0]["status"], "SKIPPED");
    }
}
