//! Bank RPC Library
//! # Overview
//!
//! This library provides a gRPC bank account service whose balances live in a
//! shared key-value store. Concurrent clients may hit the same account; every
//! balance change goes through an optimistic-concurrency cycle
//! (watch, read, decide, conditional commit) with a bounded retry budget, so
//! no update is ever lost.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Account, errors)
//! - [`store`] - Store interface plus in-memory and Redis implementations
//! - [`core`] - Business logic components:
//!   - [`core::retry`] - The bounded OCC state machine
//!   - [`core::engine`] - The account operations
//! - [`rpc`] - gRPC façade, status mapping and server startup
//! - [`cli`] - CLI argument parsing and logging setup
//!
//! # Operations
//!
//! - **CreateAccount**: Create an account with a zero balance (fails if it exists)
//! - **GetBalance**: Read the current balance
//! - **Deposit**: Credit a positive amount
//! - **Withdraw**: Debit a positive amount (requires sufficient balance)
//! - **CalculateInterest**: Credit `balance * rate / 100` for a positive rate
//!
//! # Outcomes
//!
//! Failures are classified, never generic:
//! - `InvalidArgument`, `AlreadyExists`, `NotFound`, `FailedPrecondition`: permanent, fix the request
//! - `Aborted`: the retry budget ran out under contention, repeat the call

// Module declarations
pub mod cli;
pub mod core;
pub mod rpc;
pub mod store;
pub mod types;

pub use self::core::{AccountEngine, EngineConfig, RetryPolicy};
pub use store::{AccountStore, MemoryStore, RedisStore, StoreSession};
pub use types::{Account, AccountId, BankError, StoreError};
