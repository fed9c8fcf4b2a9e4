//! SQLite-backed profile and history store.

use super::{check_limit, HistoryStore, ProfileStore, Store, StoreError};
use crate::decompose::{DecompositionResult, TaskRecord, UserProfile};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

const SCHEMA: &str = r#"
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS users (
    email TEXT PRIMARY KEY NOT NULL,
    username TEXT NOT NULL,
    avatar TEXT NOT NULL,
    needs_more_steps INTEGER NOT NULL DEFAULT 1,
    simple_language INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL,
    task TEXT NOT NULL,
    steps TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tasks_email_id ON tasks(email, id DESC);
"#;

pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    path: PathBuf,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `db_path` and apply the schema.
    pub async fn open(db_path: PathBuf) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Backend(format!("Failed to create store dir: {}", e)))?;
        }

        let path = db_path.clone();
        let conn = tokio::task::spawn_blocking(move || {
            let conn = Connection::open(&path).map_err(|e| {
                StoreError::Backend(format!("Failed to open SQLite database: {}", e))
            })?;
            conn.execute_batch(SCHEMA)
                .map_err(|e| StoreError::Backend(format!("Failed to run schema: {}", e)))?;
            Ok::<_, StoreError>(conn)
        })
        .await
        .map_err(join_error)??;

        tracing::info!("Opened SQLite store at {}", db_path.display());

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: db_path,
        })
    }
}

fn join_error(e: tokio::task::JoinError) -> StoreError {
    StoreError::Backend(format!("Task join error: {}", e))
}

fn backend(e: rusqlite::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Backend(format!("Invalid created_at '{}': {}", raw, e)))
}

#[async_trait]
impl ProfileStore for SqliteStore {
    async fn register(&self, profile: &UserProfile) -> Result<(), StoreError> {
        let conn = self.conn.clone();
        let profile = profile.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            // The primary key is the duplicate guard; concurrent registrations race here safely.
            match conn.execute(
                "INSERT INTO users (email, username, avatar, needs_more_steps, simple_language)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    profile.email,
                    profile.username,
                    profile.avatar,
                    profile.needs_more_steps as i32,
                    profile.simple_language as i32,
                ],
            ) {
                Ok(_) => Ok(()),
                Err(rusqlite::Error::SqliteFailure(err, _))
                    if err.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    Err(StoreError::Conflict(format!("Email {}", profile.email)))
                }
                Err(e) => Err(backend(e)),
            }
        })
        .await
        .map_err(join_error)?
    }

    async fn get(&self, email: &str) -> Result<UserProfile, StoreError> {
        let conn = self.conn.clone();
        let email = email.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            conn.query_row(
                "SELECT email, username, avatar, needs_more_steps, simple_language
                 FROM users WHERE email = ?1",
                params![&email],
                |row| {
                    Ok(UserProfile {
                        email: row.get(0)?,
                        username: row.get(1)?,
                        avatar: row.get(2)?,
                        needs_more_steps: row.get::<_, i64>(3)? != 0,
                        simple_language: row.get::<_, i64>(4)? != 0,
                    })
                },
            )
            .optional()
            .map_err(backend)?
            .ok_or_else(|| StoreError::NotFound(format!("User {}", email)))
        })
        .await
        .map_err(join_error)?
    }
}

#[async_trait]
impl HistoryStore for SqliteStore {
    async fn append(
        &self,
        email: &str,
        task_text: &str,
        result: &DecompositionResult,
        created_at: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        // Serialize up front so a row is never written with a partial payload.
        let steps = serde_json::to_string(result)?;
        let conn = self.conn.clone();
        let email = email.to_string();
        let task_text = task_text.to_string();
        let created_at = created_at.to_rfc3339();

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            conn.execute(
                "INSERT INTO tasks (email, task, steps, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![email, task_text, steps, created_at],
            )
            .map_err(backend)?;
            Ok::<_, StoreError>(conn.last_insert_rowid())
        })
        .await
        .map_err(join_error)?
    }

    async fn list(&self, email: &str, limit: usize) -> Result<Vec<TaskRecord>, StoreError> {
        check_limit(limit)?;
        let conn = self.conn.clone();
        let email = email.to_string();

        let rows = tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let mut stmt = conn
                .prepare(
                    "SELECT id, email, task, steps, created_at
                     FROM tasks
                     WHERE email = ?1
                     ORDER BY id DESC
                     LIMIT ?2",
                )
                .map_err(backend)?;

            let rows = stmt
                .query_map(params![&email, limit as i64], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                })
                .map_err(backend)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(backend)?;

            Ok::<_, StoreError>(rows)
        })
        .await
        .map_err(join_error)??;

        rows.into_iter()
            .map(|(id, email, task_text, steps, created_at)| -> Result<TaskRecord, StoreError> {
                Ok(TaskRecord {
                    id,
                    email,
                    task_text,
                    steps: serde_json::from_str(&steps)?,
                    created_at: parse_timestamp(&created_at)?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl Store for SqliteStore {
    fn is_persistent(&self) -> bool {
        true
    }

    async fn close(&self) -> Result<(), StoreError> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
                .map_err(backend)
        })
        .await
        .map_err(join_error)??;

        tracing::info!("Closed SQLite store at {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decompose::{Step, StepPlan};

    #[tokio::test]
    async fn test_flags_round_trip_as_integers() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("users.db")).await.unwrap();

        let profile = UserProfile {
            email: "a@x.com".to_string(),
            username: "A".to_string(),
            avatar: "img1".to_string(),
            needs_more_steps: false,
            simple_language: true,
        };
        store.register(&profile).await.unwrap();

        let raw: (i64, i64) = {
            let conn = store.conn.lock().await;
            conn.query_row(
                "SELECT needs_more_steps, simple_language FROM users WHERE email = ?1",
                params!["a@x.com"],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap()
        };
        assert_eq!(raw, (0, 1));
        assert_eq!(store.get("a@x.com").await.unwrap(), profile);
    }

    #[tokio::test]
    async fn test_history_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("users.db");
        let plan = DecompositionResult::Success(StepPlan {
            task: "clean room".to_string(),
            steps: vec![Step {
                step: 1,
                text: "pick up one item".to_string(),
                micro_win: "done!".to_string(),
            }],
        });
        let created_at = Utc::now();

        {
            let store = SqliteStore::open(path.clone()).await.unwrap();
            store
                .append("a@x.com", "clean room", &plan, created_at)
                .await
                .unwrap();
            store.close().await.unwrap();
        }

        let store = SqliteStore::open(path).await.unwrap();
        let records = store.list("a@x.com", 5).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].steps, plan);
        assert_eq!(records[0].task_text, "clean room");
        assert_eq!(records[0].created_at, created_at);
    }

    #[tokio::test]
    async fn test_corrupt_payload_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("users.db")).await.unwrap();
        {
            let conn = store.conn.lock().await;
            conn.execute(
                "INSERT INTO tasks (email, task, steps, created_at) VALUES (?1, ?2, ?3, ?4)",
                params!["a@x.com", "broken", "not json", Utc::now().to_rfc3339()],
            )
            .unwrap();
        }

        let err = store.list("a@x.com", 5).await.unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)), "got {:?}", err);
    }
}
