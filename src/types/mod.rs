//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: The persisted account document
//! - `error`: Error types for the engine and the store

pub mod account;
pub mod error;

pub use account::{Account, AccountId};
pub use error::{BankError, StoreError};
