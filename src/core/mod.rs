//! Core business logic module
//!
//! This module contains the account transaction components:
//! - `retry` - The bounded OCC state machine shared by every mutation
//! - `engine` - The five account operations executed against a store

pub mod engine;
pub mod retry;

pub use engine::{AccountEngine, EngineConfig};
pub use retry::{OccState, RetryPolicy, MAX_RETRIES};
