//! Request orchestration: profile lookup, prompt, LLM call, history write.

use std::sync::Arc;

use chrono::Utc;

use super::error::ServiceError;
use super::gateway::LlmGateway;
use super::prompt::build_prompt;
use super::types::{DecompositionResult, TaskRecord, UserProfile};
use crate::store::{Store, StoreError, DEFAULT_HISTORY_LIMIT};

pub struct DecompositionService {
    store: Arc<dyn Store>,
    gateway: LlmGateway,
}

impl DecompositionService {
    pub fn new(store: Arc<dyn Store>, gateway: LlmGateway) -> Self {
        Self { store, gateway }
    }

    /// Create a profile. A second registration for the same email is a `Conflict`.
    pub async fn register(&self, profile: UserProfile) -> Result<(), ServiceError> {
        require_non_blank("email", &profile.email)?;

        match self.store.register(&profile).await {
            Ok(()) => {
                tracing::info!("Registered user {}", profile.email);
                Ok(())
            }
            Err(StoreError::Conflict(_)) => {
                Err(ServiceError::Conflict("Email already registered".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn profile(&self, email: &str) -> Result<UserProfile, ServiceError> {
        match self.store.get(email).await {
            Ok(profile) => Ok(profile),
            Err(StoreError::NotFound(_)) => {
                Err(ServiceError::NotFound("User not found".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Decompose `task_text` for a registered user and record the outcome.
    ///
    /// Exactly one history record is appended once the LLM has replied, whether
    /// the reply parsed or fell back to a failure payload. Nothing is written
    /// when the user is unknown or the provider call fails. A failed history
    /// write is logged and the result is still returned.
    pub async fn decompose(
        &self,
        email: &str,
        task_text: &str,
    ) -> Result<DecompositionResult, ServiceError> {
        require_non_blank("email", email)?;
        require_non_blank("task", task_text)?;

        let profile = match self.store.get(email).await {
            Ok(profile) => profile,
            Err(StoreError::NotFound(_)) => {
                return Err(ServiceError::NotFound("User not registered".to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let prompt = build_prompt(task_text, profile.preferences());
        tracing::debug!(
            "Decomposing task for {} ({} chars, model={})",
            email,
            task_text.chars().count(),
            self.gateway.model()
        );

        let result = self.gateway.complete(&prompt).await.map_err(|e| {
            tracing::error!("Decomposition for {} failed upstream: {}", email, e);
            ServiceError::Upstream(e)
        })?;

        match self
            .store
            .append(email, task_text, &result, Utc::now())
            .await
        {
            Ok(id) => tracing::info!(
                "Stored decomposition {} for {} ({})",
                id,
                email,
                result.variant()
            ),
            Err(e) => tracing::error!(
                "Failed to store decomposition for {} ({}): {}",
                email,
                result.variant(),
                e
            ),
        }

        Ok(result)
    }

    /// Most recent decompositions for `email`. `limit` defaults to 5 and must be positive.
    pub async fn history(
        &self,
        email: &str,
        limit: Option<i64>,
    ) -> Result<Vec<TaskRecord>, ServiceError> {
        let limit = match limit {
            None => DEFAULT_HISTORY_LIMIT,
            Some(n) if n > 0 => usize::try_from(n).unwrap_or(usize::MAX),
            Some(n) => {
                return Err(ServiceError::InvalidArgument(format!(
                    "limit must be a positive integer, got {}",
                    n
                )))
            }
        };
        Ok(self.store.list(email, limit).await?)
    }
}

fn require_non_blank(field: &str, value: &str) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::InvalidArgument(format!(
            "{} must not be empty",
            field
        )));
    }
    Ok(())
}
