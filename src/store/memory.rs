//! In-memory store (non-persistent).

use super::{check_limit, HistoryStore, ProfileStore, Store, StoreError};
use crate::decompose::{DecompositionResult, TaskRecord, UserProfile};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct InMemoryStore {
    users: Arc<RwLock<HashMap<String, UserProfile>>>,
    /// Append-only, ordered by id
    tasks: Arc<RwLock<Vec<TaskRecord>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
            tasks: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProfileStore for InMemoryStore {
    async fn register(&self, profile: &UserProfile) -> Result<(), StoreError> {
        match self.users.write().await.entry(profile.email.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict(format!("Email {}", profile.email))),
            Entry::Vacant(slot) => {
                slot.insert(profile.clone());
                Ok(())
            }
        }
    }

    async fn get(&self, email: &str) -> Result<UserProfile, StoreError> {
        self.users
            .read()
            .await
            .get(email)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("User {}", email)))
    }
}

#[async_trait]
impl HistoryStore for InMemoryStore {
    async fn append(
        &self,
        email: &str,
        task_text: &str,
        result: &DecompositionResult,
        created_at: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        let mut tasks = self.tasks.write().await;
        let id = tasks.last().map_or(1, |r| r.id + 1);
        tasks.push(TaskRecord {
            id,
            email: email.to_string(),
            task_text: task_text.to_string(),
            steps: result.clone(),
            created_at,
        });
        Ok(id)
    }

    async fn list(&self, email: &str, limit: usize) -> Result<Vec<TaskRecord>, StoreError> {
        check_limit(limit)?;
        let records = self
            .tasks
            .read()
            .await
            .iter()
            .rev()
            .filter(|r| r.email == email)
            .take(limit)
            .cloned()
            .collect();
        Ok(records)
    }
}

#[async_trait]
impl Store for InMemoryStore {
    fn is_persistent(&self) -> bool {
        false
    }
}
