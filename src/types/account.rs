//! Account-related types for the bank service
//!
//! This module defines the Account document as it is persisted in the store
//! and the conversions between the document and its serialized form.

use super::error::BankError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Account identifier
///
/// Opaque, caller-assigned key. The engine never generates identifiers.
pub type AccountId = String;

/// Persisted account state
///
/// Stored under its `account_id` key as a flat JSON document:
/// `{"account_type": "savings", "balance": 70.00}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Free-form account kind, e.g. "savings" or "checking"
    pub account_type: String,

    /// Current balance, never negative after a committed operation
    ///
    /// Written as an exact JSON number so no binary floating point is
    /// involved at any point.
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub balance: Decimal,
}

impl Account {
    /// Create a new account with a zero balance
    pub fn new(account_type: impl Into<String>) -> Self {
        Account {
            account_type: account_type.into(),
            balance: Decimal::ZERO,
        }
    }

    /// Decode a stored document
    ///
    /// # Errors
    ///
    /// Returns `BankError::Corrupt` if the document is not a valid account.
    pub fn from_document(account_id: &str, document: &str) -> Result<Self, BankError> {
        serde_json::from_str(document).map_err(|e| BankError::corrupt(account_id, e))
    }

    /// Encode the account as a stored document
    pub fn to_document(&self, account_id: &str) -> Result<String, BankError> {
        serde_json::to_string(self).map_err(|e| BankError::corrupt(account_id, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::str::FromStr;

    #[test]
    fn test_new_account_has_zero_balance() {
        let account = Account::new("savings");
        assert_eq!(account.account_type, "savings");
        assert_eq!(account.balance, Decimal::ZERO);
    }

    #[test]
    fn test_document_keeps_exact_balance() {
        let account = Account {
            account_type: "checking".to_string(),
            balance: Decimal::from_str("0.10").unwrap(),
        };

        let document = account.to_document("acct1").unwrap();
        assert_eq!(document, r#"{"account_type":"checking","balance":0.10}"#);

        let decoded = Account::from_document("acct1", &document).unwrap();
        assert_eq!(decoded, account);
    }

    #[rstest]
    #[case::float_zero(r#"{"account_type":"Savings","balance":0.0}"#, "0")]
    #[case::integer(r#"{"account_type":"Savings","balance":1000}"#, "1000")]
    #[case::fraction(r#"{"account_type":"Savings","balance":840.0}"#, "840")]
    fn test_reads_plain_json_numbers(#[case] document: &str, #[case] expected: &str) {
        let account = Account::from_document("admin123", document).unwrap();
        assert_eq!(account.balance, Decimal::from_str(expected).unwrap());
    }

    #[rstest]
    #[case::not_json("not json")]
    #[case::missing_balance(r#"{"account_type":"Savings"}"#)]
    #[case::string_type(r#"{"account_type":1,"balance":0}"#)]
    fn test_rejects_malformed_documents(#[case] document: &str) {
        let result = Account::from_document("acct1", document);
        assert!(matches!(result, Err(BankError::Corrupt { .. })));
    }
}
