//! Core data model: user profiles, decomposition results, and task records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered user and their stored preference flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: String,
    pub username: String,
    /// Avatar identifier or URL chosen at onboarding
    pub avatar: String,
    pub needs_more_steps: bool,
    pub simple_language: bool,
}

impl UserProfile {
    pub fn preferences(&self) -> Preferences {
        Preferences {
            needs_more_steps: self.needs_more_steps,
            simple_language: self.simple_language,
        }
    }
}

/// Preference flags that shape the decomposition prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Preferences {
    /// Ask for very small steps
    pub needs_more_steps: bool,
    /// Ask for plain, simple wording
    pub simple_language: bool,
}

/// A single step in a decomposed task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// 1-based position in the plan
    pub step: u32,
    pub text: String,
    #[serde(alias = "microWin")]
    pub micro_win: String,
}

/// A task broken into ordered steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepPlan {
    pub task: String,
    pub steps: Vec<Step>,
}

/// Diagnostic payload kept when the model reply could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecompositionFailure {
    pub error: String,
    pub raw_output: String,
}

/// Outcome of a decomposition call.
///
/// Serialized untagged so the wire form is either the plan itself or the
/// `{error, raw_output}` payload. `Failure` is listed first because it is the
/// only shape with an `error` key; a stored plan never matches it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DecompositionResult {
    Failure(DecompositionFailure),
    Success(StepPlan),
}

impl DecompositionResult {
    pub fn failure(error: impl Into<String>, raw_output: impl Into<String>) -> Self {
        DecompositionResult::Failure(DecompositionFailure {
            error: error.into(),
            raw_output: raw_output.into(),
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DecompositionResult::Success(_))
    }

    /// Short label used in logs.
    pub fn variant(&self) -> &'static str {
        match self {
            DecompositionResult::Success(_) => "success",
            DecompositionResult::Failure(_) => "failure",
        }
    }
}

/// A persisted decomposition, one per completed LLM call.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRecord {
    pub id: i64,
    pub email: String,
    pub task_text: String,
    pub steps: DecompositionResult,
    pub created_at: DateTime<Utc>,
}
