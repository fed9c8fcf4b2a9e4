//! Task decomposition: data model, prompt construction, LLM gateway and the
//! service that ties them to storage.

mod error;
pub mod gateway;
pub mod prompt;
mod service;
mod types;

pub use error::ServiceError;
pub use gateway::{interpret_completion, LlmGateway};
pub use prompt::build_prompt;
pub use service::DecompositionService;
pub use types::{
    DecompositionFailure, DecompositionResult, Preferences, Step, StepPlan, TaskRecord,
    UserProfile,
};
