//! Profile and task-history storage with pluggable backends.
//!
//! Supports:
//! - `memory`: In-memory storage (non-persistent, for testing)
//! - `sqlite`: SQLite database holding the `users` and `tasks` tables

mod memory;
mod sqlite;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

use crate::decompose::{DecompositionResult, TaskRecord, UserProfile};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Default number of records returned by a history listing.
pub const DEFAULT_HISTORY_LIMIT: usize = 5;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} already registered")]
    Conflict(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Stored payload is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persistence for user profiles, keyed by email.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Insert a new profile. Fails with `Conflict` when the email exists.
    async fn register(&self, profile: &UserProfile) -> Result<(), StoreError>;

    /// Fetch a profile. Fails with `NotFound` when the email is unknown.
    async fn get(&self, email: &str) -> Result<UserProfile, StoreError>;
}

/// Append-only persistence of decomposition results.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Record a decomposition and return its id.
    async fn append(
        &self,
        email: &str,
        task_text: &str,
        result: &DecompositionResult,
        created_at: DateTime<Utc>,
    ) -> Result<i64, StoreError>;

    /// Most recent records first, at most `limit` of them. `limit` must be positive.
    async fn list(&self, email: &str, limit: usize) -> Result<Vec<TaskRecord>, StoreError>;
}

/// A store handle with an explicit lifecycle.
#[async_trait]
pub trait Store: ProfileStore + HistoryStore {
    /// Whether this store persists data across restarts.
    fn is_persistent(&self) -> bool;

    /// Flush and release resources. Called once at shutdown.
    async fn close(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

pub(crate) fn check_limit(limit: usize) -> Result<(), StoreError> {
    if limit == 0 {
        return Err(StoreError::InvalidArgument(
            "limit must be a positive integer".to_string(),
        ));
    }
    Ok(())
}

/// Store type selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreType {
    Memory,
    #[default]
    Sqlite,
}

impl StoreType {
    /// Parse from environment variable value.
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "memory" => Self::Memory,
            "sqlite" | "db" => Self::Sqlite,
            _ => Self::default(),
        }
    }
}

/// Open a store based on type and configuration.
pub async fn create_store(
    store_type: StoreType,
    db_path: PathBuf,
) -> Result<Arc<dyn Store>, StoreError> {
    match store_type {
        StoreType::Memory => Ok(Arc::new(InMemoryStore::new())),
        StoreType::Sqlite => {
            let store = SqliteStore::open(db_path).await?;
            Ok(Arc::new(store))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decompose::{Step, StepPlan};

    fn profile(email: &str) -> UserProfile {
        UserProfile {
            email: email.to_string(),
            username: "A".to_string(),
            avatar: "img1".to_string(),
            needs_more_steps: true,
            simple_language: false,
        }
    }

    fn plan(task: &str) -> DecompositionResult {
        DecompositionResult::Success(StepPlan {
            task: task.to_string(),
            steps: vec![Step {
                step: 1,
                text: "pick up one item".to_string(),
                micro_win: "done!".to_string(),
            }],
        })
    }

    /// Exercise the shared contract against any backend.
    async fn check_contract(store: &dyn Store) {
        store.register(&profile("a@x.com")).await.expect("register");

        let dup = UserProfile {
            username: "Other".to_string(),
            ..profile("a@x.com")
        };
        let err = store.register(&dup).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)), "got {:?}", err);

        let stored = store.get("a@x.com").await.expect("get");
        assert_eq!(stored, profile("a@x.com"), "duplicate must not overwrite");

        let err = store.get("nobody@x.com").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));

        let base = Utc::now();
        let first = store
            .append("a@x.com", "first", &plan("first"), base)
            .await
            .unwrap();
        let failure = DecompositionResult::failure("LLM returned invalid JSON", "prose");
        let second = store
            .append("a@x.com", "second", &failure, base)
            .await
            .unwrap();
        let third = store
            .append("a@x.com", "third", &plan("third"), base)
            .await
            .unwrap();
        store
            .append("b@x.com", "other user", &plan("other user"), base)
            .await
            .unwrap();
        assert!(first < second && second < third);

        let records = store.list("a@x.com", 2).await.unwrap();
        let texts: Vec<_> = records.iter().map(|r| r.task_text.as_str()).collect();
        assert_eq!(texts, vec!["third", "second"]);
        assert_eq!(records[1].steps, failure);

        let all = store.list("a@x.com", DEFAULT_HISTORY_LIMIT).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[2].steps, plan("first"));
        assert!(all.iter().all(|r| r.email == "a@x.com"));

        assert!(store.list("nobody@x.com", 5).await.unwrap().is_empty());

        let err = store.list("a@x.com", 0).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_memory_store_contract() {
        let store = InMemoryStore::new();
        assert!(!store.is_persistent());
        check_contract(&store).await;
    }

    #[tokio::test]
    async fn test_sqlite_store_contract() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("users.db")).await.unwrap();
        assert!(store.is_persistent());
        check_contract(&store).await;
        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_create_store_selects_backend() {
        let dir = tempfile::tempdir().unwrap();
        let memory = create_store(StoreType::Memory, dir.path().join("unused.db"))
            .await
            .unwrap();
        assert!(!memory.is_persistent());

        let sqlite = create_store(StoreType::Sqlite, dir.path().join("users.db"))
            .await
            .unwrap();
        assert!(sqlite.is_persistent());
    }

    #[test]
    fn test_store_type_from_str() {
        assert_eq!(StoreType::from_str("memory"), StoreType::Memory);
        assert_eq!(StoreType::from_str(" SQLite "), StoreType::Sqlite);
        assert_eq!(StoreType::from_str("db"), StoreType::Sqlite);
        assert_eq!(StoreType::from_str("unknown"), StoreType::Sqlite);
    }
}
