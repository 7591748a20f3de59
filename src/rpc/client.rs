//! Thin typed client for `bank.BankService`
//!
//! Decimal arguments go out as decimal strings and balances come back parsed,
//! so callers never handle the wire representation.

use super::pb::bank_service_client::BankServiceClient;
use super::pb::{AccountRequest, DepositRequest, InterestRequest, WithdrawRequest};
use rust_decimal::Decimal;
use std::str::FromStr;
use tonic::transport::{Channel, Endpoint};
use tonic::Status;

/// Result of a balance-changing call
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub balance: Decimal,
    pub message: String,
}

/// Cloneable client; clones share one HTTP/2 channel
#[derive(Debug, Clone)]
pub struct BankClient {
    inner: BankServiceClient<Channel>,
}

impl BankClient {
    /// Connect to `endpoint`, e.g. `http://localhost:50051`
    pub async fn connect(endpoint: &str) -> Result<Self, tonic::transport::Error> {
        let channel = Endpoint::from_shared(endpoint.to_string())?
            .connect()
            .await?;
        Ok(Self::new(channel))
    }

    /// Wrap an existing channel
    pub fn new(channel: Channel) -> Self {
        Self {
            inner: BankServiceClient::new(channel),
        }
    }

    /// Create an account; returns the server's message
    pub async fn create_account(
        &mut self,
        account_id: &str,
        account_type: &str,
    ) -> Result<String, Status> {
        let response = self
            .inner
            .create_account(AccountRequest {
                account_id: account_id.to_string(),
                account_type: account_type.to_string(),
            })
            .await?;
        Ok(response.into_inner().message)
    }

    pub async fn get_balance(&mut self, account_id: &str) -> Result<Decimal, Status> {
        let response = self
            .inner
            .get_balance(AccountRequest {
                account_id: account_id.to_string(),
                account_type: String::new(),
            })
            .await?
            .into_inner();
        parse_balance(&response.balance)
    }

    pub async fn deposit(&mut self, account_id: &str, amount: Decimal) -> Result<Receipt, Status> {
        let response = self
            .inner
            .deposit(DepositRequest {
                account_id: account_id.to_string(),
                amount: amount.to_string(),
            })
            .await?
            .into_inner();
        receipt(&response.balance, response.message)
    }

    pub async fn withdraw(&mut self, account_id: &str, amount: Decimal) -> Result<Receipt, Status> {
        let response = self
            .inner
            .withdraw(WithdrawRequest {
                account_id: account_id.to_string(),
                amount: amount.to_string(),
            })
            .await?
            .into_inner();
        receipt(&response.balance, response.message)
    }

    pub async fn calculate_interest(
        &mut self,
        account_id: &str,
        annual_interest_rate: Decimal,
    ) -> Result<Receipt, Status> {
        let response = self
            .inner
            .calculate_interest(InterestRequest {
                account_id: account_id.to_string(),
                annual_interest_rate: annual_interest_rate.to_string(),
            })
            .await?
            .into_inner();
        receipt(&response.balance, response.message)
    }
}

fn parse_balance(balance: &str) -> Result<Decimal, Status> {
    Decimal::from_str(balance)
        .map_err(|e| Status::internal(format!("Server sent invalid balance '{}': {}", balance, e)))
}

fn receipt(balance: &str, message: String) -> Result<Receipt, Status> {
    Ok(Receipt {
        balance: parse_balance(balance)?,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::Code;

    #[test]
    fn test_receipt_parses_balance() {
        let receipt = receipt("77.000", "Interest calculated and deposited.".to_string()).unwrap();
        assert_eq!(receipt.balance, Decimal::new(77, 0));
    }

    #[test]
    fn test_invalid_balance_is_internal_error() {
        let status = parse_balance("NaN").unwrap_err();
        assert_eq!(status.code(), Code::Internal);
    }
}
