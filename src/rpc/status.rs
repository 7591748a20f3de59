//! Mapping from engine outcomes to gRPC statuses
//!
//! Every failure leaves the service as a classified status so callers can
//! tell permanent rejections (fix the request) from transient ones (repeat
//! the call).

use crate::types::{BankError, StoreError};
use rust_decimal::Decimal;
use std::str::FromStr;
use tonic::Status;
use tracing::error;

pub const ACCOUNT_EXISTS: &str = "Account already exists.";
pub const ACCOUNT_NOT_FOUND: &str = "Account not found. Please check the account ID.";
pub const INSUFFICIENT_FUNDS: &str = "Insufficient funds for the requested withdrawal.";
pub const CREATE_ABORTED: &str = "Failed to create account after multiple retries.";
pub const UPDATE_ABORTED: &str = "Failed to update account after multiple retries.";
pub const OUT_OF_RANGE: &str = "Resulting balance is out of range.";
pub const CORRUPT_ACCOUNT: &str = "Stored account data is corrupt.";
pub const STORE_UNAVAILABLE: &str = "Account store is unavailable.";
pub const STORE_FAILURE: &str = "Account store failure.";

/// Convert an engine error into the status returned to the caller
pub fn to_status(error: BankError) -> Status {
    match error {
        BankError::InvalidArgument { message } => Status::invalid_argument(message),
        BankError::AlreadyExists { .. } => Status::already_exists(ACCOUNT_EXISTS),
        BankError::NotFound { .. } => Status::not_found(ACCOUNT_NOT_FOUND),
        BankError::InsufficientFunds { .. } => Status::failed_precondition(INSUFFICIENT_FUNDS),
        BankError::Aborted { ref operation, .. } if operation == "create_account" => {
            Status::aborted(CREATE_ABORTED)
        }
        BankError::Aborted { .. } => Status::aborted(UPDATE_ABORTED),
        BankError::ArithmeticOverflow { .. } => Status::out_of_range(OUT_OF_RANGE),
        BankError::Corrupt { .. } => {
            error!(error = %error, "Corrupt account document");
            Status::internal(CORRUPT_ACCOUNT)
        }
        BankError::Store(StoreError::Connection { .. }) => {
            error!(error = %error, "Store unreachable");
            Status::unavailable(STORE_UNAVAILABLE)
        }
        BankError::Store(_) => {
            error!(error = %error, "Store failure");
            Status::internal(STORE_FAILURE)
        }
    }
}

/// Parse a decimal request field
///
/// Only the syntax is checked here; sign rules belong to the engine.
pub fn parse_decimal(field: &str, value: &str) -> Result<Decimal, Status> {
    Decimal::from_str(value.trim())
        .map_err(|_| Status::invalid_argument(format!("{} must be a decimal number.", field)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tonic::Code;

    #[rstest]
    #[case::invalid(BankError::invalid_argument("Transaction amount must be positive."), Code::InvalidArgument, "Transaction amount must be positive.")]
    #[case::exists(BankError::already_exists("a"), Code::AlreadyExists, ACCOUNT_EXISTS)]
    #[case::not_found(BankError::not_found("a"), Code::NotFound, ACCOUNT_NOT_FOUND)]
    #[case::insufficient(
        BankError::insufficient_funds("a", Decimal::ONE, Decimal::TWO),
        Code::FailedPrecondition,
        INSUFFICIENT_FUNDS
    )]
    #[case::create_aborted(BankError::aborted("create_account", "a", 3), Code::Aborted, CREATE_ABORTED)]
    #[case::update_aborted(BankError::aborted("withdraw", "a", 3), Code::Aborted, UPDATE_ABORTED)]
    #[case::overflow(BankError::arithmetic_overflow("deposit", "a"), Code::OutOfRange, OUT_OF_RANGE)]
    #[case::corrupt(BankError::corrupt("a", "bad json"), Code::Internal, CORRUPT_ACCOUNT)]
    #[case::unavailable(
        BankError::Store(StoreError::Connection { message: "refused".to_string() }),
        Code::Unavailable,
        STORE_UNAVAILABLE
    )]
    #[case::protocol(
        BankError::Store(StoreError::Protocol { message: "odd reply".to_string() }),
        Code::Internal,
        STORE_FAILURE
    )]
    fn test_to_status(#[case] error: BankError, #[case] code: Code, #[case] message: &str) {
        let status = to_status(error);
        assert_eq!(status.code(), code);
        assert_eq!(status.message(), message);
    }

    #[rstest]
    #[case::integer("100", "100")]
    #[case::fraction("30.00", "30.00")]
    #[case::negative("-5", "-5")]
    #[case::padded(" 1.5 ", "1.5")]
    fn test_parse_decimal(#[case] value: &str, #[case] expected: &str) {
        assert_eq!(
            parse_decimal("Amount", value).unwrap(),
            Decimal::from_str(expected).unwrap()
        );
    }

    #[rstest]
    #[case::empty("")]
    #[case::word("ten")]
    #[case::float_garbage("1.2.3")]
    fn test_parse_decimal_rejects(#[case] value: &str) {
        let status = parse_decimal("Amount", value).unwrap_err();
        assert_eq!(status.code(), Code::InvalidArgument);
        assert_eq!(status.message(), "Amount must be a decimal number.");
    }
}
