use chrono::{DateTime, Local};
use itertools::Itertools;
use rusqlite::{params, Connection, Result};
use serde::Serialize;
use std::error::Error;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;

/// The leaderboard is bounded to this many rows, best wpm first.
pub const LEADERBOARD_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreEntry {
    pub user_id: String,
    pub display_name: String,
    pub wpm: u32,
    pub timestamp: DateTime<Local>,
}

/// One finished mission, appended to the CSV log.
#[derive(Debug, Clone, Serialize)]
pub struct MissionRecord {
    pub date: String,
    pub language: String,
    pub difficulty: String,
    pub wpm: u32,
    pub progress: u32,
    pub outcome: String,
}

/// Local score store. Missions stay playable when this cannot be
/// opened; callers hold it as `Option<ScoreDb>` via `.ok()`.
#[derive(Debug)]
pub struct ScoreDb {
    conn: Connection,
}

impl ScoreDb {
    pub fn new() -> Result<Self> {
        let db_path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("sysoverride_arcade.db"));
        Self::with_path(db_path)
    }

    pub fn with_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {}", e)),
                )
            })?;
        }

        let conn = Connection::open(path)?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS leaderboard (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                display_name TEXT NOT NULL,
                wpm INTEGER NOT NULL,
                timestamp TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_leaderboard_wpm ON leaderboard(wpm)",
            [],
        )?;

        Ok(ScoreDb { conn })
    }

    pub fn save_score(&self, user_id: &str, display_name: &str, wpm: u32) -> Result<()> {
        self.conn.execute(
            "INSERT INTO leaderboard (user_id, display_name, wpm, timestamp) VALUES (?1, ?2, ?3, ?4)",
            params![user_id, display_name, wpm, Local::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Top scores ranked by wpm descending, newest first on ties,
    /// bounded to [`LEADERBOARD_LIMIT`].
    pub fn top_scores(&self) -> Result<Vec<ScoreEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, display_name, wpm, timestamp FROM leaderboard",
        )?;

        let rows = stmt.query_map([], |row| {
            let raw_ts: String = row.get(3)?;
            let timestamp = DateTime::parse_from_rfc3339(&raw_ts)
                .map(|dt| dt.with_timezone(&Local))
                .unwrap_or_else(|_| Local::now());
            Ok(ScoreEntry {
                user_id: row.get(0)?,
                display_name: row.get(1)?,
                wpm: row.get(2)?,
                timestamp,
            })
        })?;

        let entries: Vec<ScoreEntry> = rows.collect::<Result<_>>()?;
        Ok(entries
            .into_iter()
            .sorted_by(|a, b| b.wpm.cmp(&a.wpm).then(b.timestamp.cmp(&a.timestamp)))
            .take(LEADERBOARD_LIMIT)
            .collect())
    }

}

/// Append one mission to the CSV log. Headers are written only when
/// the file is created.
pub fn append_mission_log(record: &MissionRecord) -> Result<(), Box<dyn Error>> {
    let Some(log_path) = AppDirs::mission_log_path() else {
        return Ok(());
    };
    append_mission_log_at(&log_path, record)
}

pub fn append_mission_log_at(path: &Path, record: &MissionRecord) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let needs_header = !path.exists();
    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_header)
        .from_writer(file);
    writer.serialize(record)?;
    writer.flush()?;
    Ok(())
}
