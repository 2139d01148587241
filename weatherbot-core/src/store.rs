//! Append-only log of served weather requests.

use std::path::{Path, PathBuf};

use chrono::Local;
use rusqlite::{Connection, params};
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("storage task join error: {0}")]
    Task(String),
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS requests (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    city TEXT NOT NULL,
    request_time TEXT NOT NULL
);
"#;

/// Write-only store backed by a single SQLite table. The schema is
/// created in [`RequestLog::open`], before any update is served, so
/// there is no first-write initialization race.
#[derive(Debug, Clone)]
pub struct RequestLog {
    db_path: PathBuf,
}

impl RequestLog {
    pub async fn open(db_path: impl AsRef<Path>) -> StoreResult<Self> {
        let log = Self {
            db_path: db_path.as_ref().to_path_buf(),
        };

        log.with_connection(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(log)
    }

    /// Append one row: the user, the city exactly as typed, and the
    /// current local time in ISO-8601.
    pub async fn record(&self, user_id: i64, city: &str) -> StoreResult<()> {
        let city = city.to_string();
        let request_time = Local::now().to_rfc3339();

        self.with_connection(move |conn| {
            conn.execute(
                "INSERT INTO requests (user_id, city, request_time) VALUES (?1, ?2, ?3)",
                params![user_id, city, request_time],
            )?;
            Ok(())
        })
        .await
    }

    async fn with_connection<T, F>(&self, func: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> StoreResult<T> + Send + 'static,
    {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let conn = Connection::open(&db_path)?;
            func(&conn)
        })
        .await
        .map_err(|error| StoreError::Task(error.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_creates_schema_and_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("requests.db");

        RequestLog::open(&path).await.expect("first open");
        RequestLog::open(&path).await.expect("second open");
    }

    #[tokio::test]
    async fn record_appends_rows_with_increasing_ids() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("requests.db");
        let log = RequestLog::open(&path).await.expect("open");

        log.record(42, "Moscow").await.expect("first record");
        log.record(42, "Oslo").await.expect("second record");

        let conn = Connection::open(&path).expect("open raw connection");
        let mut stmt = conn
            .prepare("SELECT id, user_id, city, request_time FROM requests ORDER BY id")
            .expect("prepare");
        let rows: Vec<(i64, i64, String, String)> = stmt
            .query_map([], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })
            .expect("query")
            .collect::<Result<_, _>>()
            .expect("rows");

        assert_eq!(rows.len(), 2);
        assert_eq!((rows[0].0, rows[0].1, rows[0].2.as_str()), (1, 42, "Moscow"));
        assert_eq!((rows[1].0, rows[1].1, rows[1].2.as_str()), (2, 42, "Oslo"));
        // Timestamps parse back as ISO-8601.
        for (_, _, _, ts) in &rows {
            chrono::DateTime::parse_from_rfc3339(ts).expect("ISO-8601 timestamp");
        }
    }
}
