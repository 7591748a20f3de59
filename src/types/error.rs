//! Error types for the bank service
//!
//! This module defines the outcome taxonomy of the account engine and the
//! errors raised by the store collaborator.
//!
//! # Error Categories
//!
//! - **Request Errors**: invalid arguments, fixed by changing the request
//! - **State Errors**: missing or duplicate accounts, insufficient funds
//! - **Contention Errors**: retry budget exhausted, safe to retry the call
//! - **Infrastructure Errors**: store connectivity and corrupt documents

use super::account::AccountId;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by a store session
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// A watched key was written by someone else before the conditional commit
    ///
    /// This is the only transient error. The engine consumes it and restarts
    /// the read-modify-write cycle.
    #[error("Watched key '{key}' was modified before commit")]
    WatchConflict {
        /// The key whose watch was invalidated
        key: String,
    },

    /// The store could not be reached or the connection dropped
    #[error("Store connection error: {message}")]
    Connection {
        /// Description of the transport failure
        message: String,
    },

    /// The store answered with something the session could not interpret
    #[error("Store protocol error: {message}")]
    Protocol {
        /// Description of the unexpected reply
        message: String,
    },
}

impl From<redis::RedisError> for StoreError {
    fn from(error: redis::RedisError) -> Self {
        if error.is_io_error() || error.is_connection_dropped() || error.is_connection_refusal() {
            StoreError::Connection {
                message: error.to_string(),
            }
        } else {
            StoreError::Protocol {
                message: error.to_string(),
            }
        }
    }
}

/// Outcome taxonomy of the account engine
///
/// Every variant is a distinct, caller-visible outcome. Only `Aborted`
/// signals a transient condition.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BankError {
    /// A request parameter is invalid independently of stored state
    #[error("{message}")]
    InvalidArgument {
        /// Caller-facing description
        message: String,
    },

    /// Creation attempted on an existing key
    #[error("Account '{account_id}' already exists")]
    AlreadyExists {
        /// The duplicated account ID
        account_id: AccountId,
    },

    /// The referenced account does not exist
    #[error("Account '{account_id}' not found")]
    NotFound {
        /// The missing account ID
        account_id: AccountId,
    },

    /// Withdrawal larger than the freshly read balance
    #[error("Insufficient funds for account '{account_id}': balance {balance}, requested {requested}")]
    InsufficientFunds {
        /// Account ID
        account_id: AccountId,
        /// Balance observed by the attempt that rejected the withdrawal
        balance: Decimal,
        /// Requested withdrawal amount
        requested: Decimal,
    },

    /// The computed balance does not fit the decimal representation
    #[error("Arithmetic overflow in {operation} for account '{account_id}'")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
        /// Account ID
        account_id: AccountId,
    },

    /// Every attempt within the retry budget hit a conflicting write
    #[error("{operation} on account '{account_id}' aborted after {attempts} conflicting attempts")]
    Aborted {
        /// Operation that gave up
        operation: String,
        /// Account ID
        account_id: AccountId,
        /// Number of attempts made
        attempts: u32,
    },

    /// The stored document for an account could not be decoded or encoded
    #[error("Corrupt document for account '{account_id}': {message}")]
    Corrupt {
        /// Account ID
        account_id: AccountId,
        /// Decoder message
        message: String,
    },

    /// Infrastructure failure reported by the store
    #[error(transparent)]
    Store(#[from] StoreError),
}

// Helper functions for creating common errors

impl BankError {
    /// Create an InvalidArgument error
    pub fn invalid_argument(message: &str) -> Self {
        BankError::InvalidArgument {
            message: message.to_string(),
        }
    }

    /// Create an AlreadyExists error
    pub fn already_exists(account_id: &str) -> Self {
        BankError::AlreadyExists {
            account_id: account_id.to_string(),
        }
    }

    /// Create a NotFound error
    pub fn not_found(account_id: &str) -> Self {
        BankError::NotFound {
            account_id: account_id.to_string(),
        }
    }

    /// Create an InsufficientFunds error
    pub fn insufficient_funds(account_id: &str, balance: Decimal, requested: Decimal) -> Self {
        BankError::InsufficientFunds {
            account_id: account_id.to_string(),
            balance,
            requested,
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, account_id: &str) -> Self {
        BankError::ArithmeticOverflow {
            operation: operation.to_string(),
            account_id: account_id.to_string(),
        }
    }

    /// Create an Aborted error
    pub fn aborted(operation: &str, account_id: &str, attempts: u32) -> Self {
        BankError::Aborted {
            operation: operation.to_string(),
            account_id: account_id.to_string(),
            attempts,
        }
    }

    /// Create a Corrupt error
    pub fn corrupt(account_id: &str, error: impl std::fmt::Display) -> Self {
        BankError::Corrupt {
            account_id: account_id.to_string(),
            message: error.to_string(),
        }
    }

    /// Whether the caller may safely repeat the whole call
    pub fn is_transient(&self) -> bool {
        matches!(self, BankError::Aborted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::invalid_argument(
        BankError::invalid_argument("Transaction amount must be positive."),
        "Transaction amount must be positive."
    )]
    #[case::already_exists(BankError::already_exists("acct1"), "Account 'acct1' already exists")]
    #[case::not_found(BankError::not_found("ghost"), "Account 'ghost' not found")]
    #[case::insufficient_funds(
        BankError::insufficient_funds("acct1", Decimal::new(7000, 2), Decimal::new(100000, 2)),
        "Insufficient funds for account 'acct1': balance 70.00, requested 1000.00"
    )]
    #[case::overflow(
        BankError::arithmetic_overflow("deposit", "acct1"),
        "Arithmetic overflow in deposit for account 'acct1'"
    )]
    #[case::aborted(
        BankError::aborted("withdraw", "acct1", 3),
        "withdraw on account 'acct1' aborted after 3 conflicting attempts"
    )]
    #[case::store(
        BankError::Store(StoreError::Connection { message: "refused".to_string() }),
        "Store connection error: refused"
    )]
    fn test_error_display(#[case] error: BankError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    #[case::aborted(BankError::aborted("deposit", "a", 3), true)]
    #[case::not_found(BankError::not_found("a"), false)]
    #[case::insufficient(BankError::insufficient_funds("a", Decimal::ZERO, Decimal::ONE), false)]
    #[case::store(BankError::Store(StoreError::Protocol { message: "x".to_string() }), false)]
    fn test_is_transient(#[case] error: BankError, #[case] expected: bool) {
        assert_eq!(error.is_transient(), expected);
    }

    #[test]
    fn test_store_error_conversion() {
        let error: BankError = StoreError::WatchConflict {
            key: "acct1".to_string(),
        }
        .into();
        assert!(matches!(error, BankError::Store(StoreError::WatchConflict { .. })));
    }

    #[test]
    fn test_redis_io_error_is_connection_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let error: StoreError = redis::RedisError::from(io_error).into();
        assert!(matches!(error, StoreError::Connection { .. }));
    }
}
