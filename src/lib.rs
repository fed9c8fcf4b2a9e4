//! # Smart Companion
//!
//! Backend for a low-focus productivity companion: users register with a few
//! preference flags, submit a task, and get it back broken into small steps
//! with a "micro win" for each.
//!
//! ## Task Flow
//! 1. Look up the user's stored preferences
//! 2. Build a deterministic prompt with the required JSON shape
//! 3. Call the LLM once and parse/validate its reply
//! 4. Store the outcome as task history and return it
//!
//! ## Modules
//! - `api`: axum HTTP surface
//! - `decompose`: data model, prompt builder, LLM gateway, service
//! - `llm`: chat-completion client abstraction (Groq)
//! - `store`: profile and history persistence (SQLite or in-memory)

pub mod api;
pub mod config;
pub mod decompose;
pub mod llm;
pub mod store;

pub use config::Config;
pub use decompose::{DecompositionResult, DecompositionService};
