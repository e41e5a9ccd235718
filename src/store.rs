use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::app_dirs::AppDirs;
use crate::error::StoreError;
use crate::games::GameMode;
use crate::leaderboard::{
    best_per_user, LeaderboardEntry, NewScore, Player, ScoreRecord, ScoreRepository, ANONYMOUS,
};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS profiles (
    id TEXT PRIMARY KEY,
    username TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS game_scores (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    score INTEGER NOT NULL,
    streak INTEGER NOT NULL,
    game_mode TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_game_scores_user ON game_scores(user_id);
CREATE INDEX IF NOT EXISTS idx_game_scores_mode ON game_scores(game_mode);

CREATE TABLE IF NOT EXISTS local_high_scores (
    game_mode TEXT PRIMARY KEY,
    score INTEGER NOT NULL,
    updated_at TEXT NOT NULL
);
"#;

impl ToSql for GameMode {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for GameMode {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|err| FromSqlError::Other(Box::new(err)))
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| StoreError::Timestamp(raw.to_string()))
}

#[derive(Debug)]
pub struct SqliteScoreStore {
    conn: Connection,
}

impl SqliteScoreStore {
    /// Opens the database at the default state path, creating it if needed
    pub fn open_default() -> Result<Self, StoreError> {
        let path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("dopamine_rush.db"));
        Self::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        debug!(path = %path.display(), "opening score store");
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    fn score_rows(&self, user_id: &str, limit: Option<usize>) -> Result<Vec<ScoreRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT user_id, score, streak, game_mode, created_at
            FROM game_scores
            WHERE user_id = ?1
            ORDER BY id DESC
            LIMIT ?2
            "#,
        )?;
        let limit = limit.map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX));
        let rows = stmt.query_map(params![user_id, limit], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u32>(1)?,
                row.get::<_, u32>(2)?,
                row.get::<_, GameMode>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut scores = Vec::new();
        for row in rows {
            let (user_id, score, streak, mode, created_at) = row?;
            scores.push(ScoreRecord {
                user_id,
                score,
                streak,
                mode,
                created_at: parse_timestamp(&created_at)?,
            });
        }
        Ok(scores)
    }
}

impl ScoreRepository for SqliteScoreStore {
    fn submit_score(&mut self, score: &NewScore) -> Result<(), StoreError> {
        self.conn.execute(
            r#"
            INSERT INTO game_scores (user_id, score, streak, game_mode, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![score.user_id, score.score, score.streak, score.mode, now_rfc3339()],
        )?;
        debug!(user = %score.user_id, score = score.score, mode = %score.mode, "score stored");
        Ok(())
    }

    fn query_best_scores(&self, mode: Option<GameMode>) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT s.user_id, p.username, s.score, s.streak, s.game_mode, s.created_at
            FROM game_scores s
            LEFT JOIN profiles p ON p.id = s.user_id
            WHERE ?1 IS NULL OR s.game_mode = ?1
            ORDER BY s.id
            "#,
        )?;
        let rows = stmt.query_map([mode], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, u32>(2)?,
                row.get::<_, u32>(3)?,
                row.get::<_, GameMode>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (user_id, name, score, streak, mode, created_at) = row?;
            entries.push(LeaderboardEntry {
                user_id,
                display_name: name.unwrap_or_else(|| ANONYMOUS.to_string()),
                score,
                streak,
                mode,
                created_at: parse_timestamp(&created_at)?,
            });
        }
        Ok(best_per_user(entries))
    }

    fn ensure_profile(&mut self, player: &Player) -> Result<(), StoreError> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO profiles (id, username, created_at) VALUES (?1, ?2, ?3)",
            params![player.user_id, player.display_name, now_rfc3339()],
        )?;
        if inserted > 0 {
            debug!(user = %player.user_id, "profile created");
        }
        Ok(())
    }

    fn scores_for(&self, user_id: &str) -> Result<Vec<ScoreRecord>, StoreError> {
        self.score_rows(user_id, None)
    }

    fn recent_scores(&self, user_id: &str, limit: usize) -> Result<Vec<ScoreRecord>, StoreError> {
        self.score_rows(user_id, Some(limit))
    }

    fn display_name(&self, user_id: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT username FROM profiles WHERE id = ?1",
                [user_id],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn local_high_score(&self, mode: GameMode) -> Result<u32, StoreError> {
        let score: Option<u32> = self
            .conn
            .query_row(
                "SELECT score FROM local_high_scores WHERE game_mode = ?1",
                [mode],
                |row| row.get(0),
            )
            .optional()?;
        Ok(score.unwrap_or(0))
    }

    fn record_local_high_score(&mut self, mode: GameMode, score: u32) -> Result<bool, StoreError> {
        let changed = self.conn.execute(
            r#"
            INSERT INTO local_high_scores (game_mode, score, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(game_mode) DO UPDATE SET
                score = excluded.score,
                updated_at = excluded.updated_at
            WHERE excluded.score > local_high_scores.score
            "#,
            params![mode, score, now_rfc3339()],
        )?;
        Ok(changed > 0 && score > 0)
    }
}
