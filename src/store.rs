use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::error::PersistenceError;
use crate::scores::ScoreRecord;

/// Append-only per-user score history
pub trait ScoreStore {
    /// All scores recorded for a user, in no particular order
    fn read_scores(&self, user_id: &str) -> Result<Vec<ScoreRecord>, PersistenceError>;

    /// Add one score. Existing scores are never modified.
    fn append_score(&mut self, user_id: &str, record: &ScoreRecord) -> Result<(), PersistenceError>;
}

const CREATE_SCORES: &str = r#"
    CREATE TABLE IF NOT EXISTS scores (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT NOT NULL,
        wpm INTEGER NOT NULL,
        accuracy INTEGER NOT NULL,
        difficulty TEXT NOT NULL,
        duration_secs INTEGER NOT NULL,
        completed_at TEXT NOT NULL
    )
"#;

/// SQLite-backed score history
#[derive(Debug)]
pub struct SqliteScoreStore {
    conn: Connection,
}

impl SqliteScoreStore {
    /// Open (creating if needed) the database at `path`
    pub fn open(path: &Path) -> Result<Self, PersistenceError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, PersistenceError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, PersistenceError> {
        conn.execute(CREATE_SCORES, [])?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_scores_user ON scores(user_id)",
            [],
        )?;
        Ok(Self { conn })
    }

    pub fn count(&self, user_id: &str) -> Result<usize, PersistenceError> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM scores WHERE user_id = ?1",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(n as usize)
    }
}

impl ScoreStore for SqliteScoreStore {
    fn read_scores(&self, user_id: &str) -> Result<Vec<ScoreRecord>, PersistenceError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT wpm, accuracy, difficulty, duration_secs, completed_at
            FROM scores
            WHERE user_id = ?1
            ORDER BY id
            "#,
        )?;

        let rows = stmt.query_map([user_id], |row| {
            Ok((
                row.get::<_, u32>(0)?,
                row.get::<_, u8>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, u32>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut scores = Vec::new();
        for row in rows {
            let (wpm, accuracy, difficulty, duration_secs, completed_at) = row?;
            let difficulty = difficulty
                .parse()
                .map_err(|e| PersistenceError::Malformed(format!("{e}")))?;
            let completed_at = DateTime::parse_from_rfc3339(&completed_at)
                .map_err(|e| PersistenceError::Malformed(format!("completed_at: {e}")))?
                .with_timezone(&Utc);

            scores.push(ScoreRecord {
                wpm,
                accuracy,
                difficulty,
                duration_secs,
                completed_at,
            });
        }

        Ok(scores)
    }

    fn append_score(&mut self, user_id: &str, record: &ScoreRecord) -> Result<(), PersistenceError> {
        self.conn.execute(
            r#"
            INSERT INTO scores
            (user_id, wpm, accuracy, difficulty, duration_secs, completed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                user_id,
                record.wpm,
                record.accuracy,
                record.difficulty.to_string(),
                record.duration_secs,
                record.completed_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    scores: HashMap<String, Vec<ScoreRecord>>,
    fail_reads: bool,
    fail_appends: bool,
    append_calls: usize,
}

/// In-process score history. Clones share state, so a test can keep a handle
/// while the app owns the store.
#[derive(Debug, Default, Clone)]
pub struct MemoryScoreStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scores(user_id: &str, scores: Vec<ScoreRecord>) -> Self {
        let store = Self::new();
        store.lock().scores.insert(user_id.to_string(), scores);
        store
    }

    pub fn set_fail_appends(&self, fail: bool) {
        self.lock().fail_appends = fail;
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.lock().fail_reads = fail;
    }

    /// Number of append attempts, failed ones included
    pub fn append_calls(&self) -> usize {
        self.lock().append_calls
    }

    pub fn scores_for(&self, user_id: &str) -> Vec<ScoreRecord> {
        self.lock().scores.get(user_id).cloned().unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        // a panic while holding the lock leaves plain data behind; keep using it
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ScoreStore for MemoryScoreStore {
    fn read_scores(&self, user_id: &str) -> Result<Vec<ScoreRecord>, PersistenceError> {
        let inner = self.lock();
        if inner.fail_reads {
            return Err(PersistenceError::Unavailable("reads disabled".into()));
        }
        Ok(inner.scores.get(user_id).cloned().unwrap_or_default())
    }

    fn append_score(&mut self, user_id: &str, record: &ScoreRecord) -> Result<(), PersistenceError> {
        let mut inner = self.lock();
        inner.append_calls += 1;
        if inner.fail_appends {
            return Err(PersistenceError::Unavailable("writes disabled".into()));
        }
        inner
            .scores
            .entry(user_id.to_string())
            .or_default()
            .push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Difficulty;
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    fn record(wpm: u32) -> ScoreRecord {
        ScoreRecord {
            wpm,
            accuracy: 94,
            difficulty: Difficulty::Hard,
            duration_secs: 120,
            completed_at: Utc.with_ymd_and_hms(2024, 5, 17, 8, 30, 0).unwrap(),
        }
    }

    #[test]
    fn sqlite_append_then_read() {
        let mut store = SqliteScoreStore::open_in_memory().unwrap();

        store.append_score("ada", &record(61)).unwrap();
        store.append_score("ada", &record(72)).unwrap();
        store.append_score("bob", &record(30)).unwrap();

        let ada = store.read_scores("ada").unwrap();
        assert_eq!(ada, vec![record(61), record(72)]);
        assert_eq!(store.count("bob").unwrap(), 1);
        assert!(store.read_scores("nobody").unwrap().is_empty());
    }

    #[test]
    fn sqlite_appends_never_overwrite() {
        let mut store = SqliteScoreStore::open_in_memory().unwrap();

        store.append_score("ada", &record(61)).unwrap();
        store.append_score("ada", &record(61)).unwrap();

        assert_eq!(store.count("ada").unwrap(), 2);
    }

    #[test]
    fn sqlite_rejects_malformed_rows() {
        let store = SqliteScoreStore::open_in_memory().unwrap();
        store
            .conn
            .execute(
                "INSERT INTO scores (user_id, wpm, accuracy, difficulty, duration_secs, completed_at) \
                 VALUES ('ada', 10, 90, 'extreme', 60, '2024-05-17T08:30:00Z')",
                [],
            )
            .unwrap();

        assert_matches!(store.read_scores("ada"), Err(PersistenceError::Malformed(_)));
    }

    #[test]
    fn sqlite_file_store_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("scores.db");

        {
            let mut store = SqliteScoreStore::open(&path).unwrap();
            store.append_score("ada", &record(88)).unwrap();
        }

        let store = SqliteScoreStore::open(&path).unwrap();
        assert_eq!(store.read_scores("ada").unwrap(), vec![record(88)]);
    }

    #[test]
    fn memory_store_shares_state_between_clones() {
        let handle = MemoryScoreStore::new();
        let mut store = handle.clone();

        store.append_score("ada", &record(40)).unwrap();

        assert_eq!(handle.scores_for("ada"), vec![record(40)]);
        assert_eq!(handle.append_calls(), 1);
    }

    #[test]
    fn memory_store_injected_failures() {
        let handle = MemoryScoreStore::with_scores("ada", vec![record(40)]);
        let mut store = handle.clone();

        handle.set_fail_appends(true);
        assert_matches!(
            store.append_score("ada", &record(41)),
            Err(PersistenceError::Unavailable(_))
        );
        assert_eq!(handle.append_calls(), 1);
        assert_eq!(handle.scores_for("ada").len(), 1);

        handle.set_fail_reads(true);
        assert!(store.read_scores("ada").is_err());
    }
}
