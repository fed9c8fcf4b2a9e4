//! HTTP API for the Smart Companion backend.
//!
//! ## Endpoints
//!
//! - `GET /` - Health check
//! - `POST /register` - Register a user with preference flags
//! - `GET /user?email=` - Fetch a stored profile
//! - `POST /decompose-task` - Break a task into small steps via the LLM
//! - `GET /task-history?email=&limit=5` - Most recent decompositions first

mod error;
mod routes;
pub mod types;

pub use error::ApiError;
pub use routes::{build_router, serve, AppState};
pub use types::*;
