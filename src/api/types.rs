//! API request and response types.

use serde::{Deserialize, Serialize};

use crate::decompose::{DecompositionResult, TaskRecord, UserProfile};

fn default_true() -> bool {
    true
}

/// Request to register a user.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub avatar: String,

    /// Ask for very small steps (default: true)
    #[serde(default = "default_true")]
    pub needs_more_steps: bool,

    /// Ask for simple wording (default: true)
    #[serde(default = "default_true")]
    pub simple_language: bool,
}

impl From<RegisterRequest> for UserProfile {
    fn from(req: RegisterRequest) -> Self {
        UserProfile {
            email: req.email,
            username: req.username,
            avatar: req.avatar,
            needs_more_steps: req.needs_more_steps,
            simple_language: req.simple_language,
        }
    }
}

/// Request to decompose a task.
#[derive(Debug, Clone, Deserialize)]
pub struct DecomposeRequest {
    pub email: String,
    pub task: String,
}

/// Query for `GET /user`.
#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub email: String,
}

/// Query for `GET /task-history`.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub email: String,
    /// Defaults to 5; must be positive
    pub limit: Option<i64>,
}

/// Simple `{status}` acknowledgement, used by registration and the health check.
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn new(status: &str) -> Self {
        Self {
            status: status.to_string(),
        }
    }
}

/// Stored profile as returned by `GET /user`.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub email: String,
    pub username: String,
    pub avatar: String,
    pub needs_more_steps: bool,
    pub simple_language: bool,
}

impl From<UserProfile> for UserResponse {
    fn from(profile: UserProfile) -> Self {
        Self {
            email: profile.email,
            username: profile.username,
            avatar: profile.avatar,
            needs_more_steps: profile.needs_more_steps,
            simple_language: profile.simple_language,
        }
    }
}

/// One entry of `GET /task-history`.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub task: String,
    pub steps: DecompositionResult,
    /// RFC 3339 timestamp
    pub created_at: String,
}

impl From<TaskRecord> for HistoryEntry {
    fn from(record: TaskRecord) -> Self {
        Self {
            task: record.task_text,
            steps: record.steps,
            created_at: record.created_at.to_rfc3339(),
        }
    }
}
