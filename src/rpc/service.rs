//! gRPC façade over the account engine
//!
//! Each handler translates one request into one engine call and one engine
//! outcome into one response or status. No business rule lives here.
//!
//! Concurrency is bounded by a semaphore with one permit per worker: at most
//! `workers` operations run against the store at the same time, whatever
//! the number of client connections.

use super::pb::bank_service_server::{BankService, BankServiceServer};
use super::pb::{
    AccountRequest, AccountResponse, BalanceResponse, DepositRequest, InterestRequest,
    TransactionResponse, WithdrawRequest,
};
use super::status::{parse_decimal, to_status};
use crate::core::AccountEngine;
use crate::store::AccountStore;
use std::sync::Arc;
use tokio::sync::{Semaphore, SemaphorePermit};
use tonic::{Request, Response, Status};
use tracing::debug;

/// Default number of concurrently executing operations
pub const DEFAULT_WORKERS: usize = 10;

/// gRPC handler for `bank.BankService`
pub struct BankGrpcService<S> {
    engine: AccountEngine<S>,
    permits: Arc<Semaphore>,
}

impl<S: AccountStore> BankGrpcService<S> {
    /// Create a handler running at most `workers` operations concurrently
    pub fn new(engine: AccountEngine<S>, workers: usize) -> Self {
        Self {
            engine,
            permits: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    /// Wrap the handler in the generated tonic server
    pub fn into_server(self) -> BankServiceServer<Self> {
        BankServiceServer::new(self)
    }

    async fn worker(&self) -> Result<SemaphorePermit<'_>, Status> {
        self.permits
            .acquire()
            .await
            .map_err(|_| Status::unavailable("Service is shutting down."))
    }
}

#[tonic::async_trait]
impl<S: AccountStore> BankService for BankGrpcService<S> {
    async fn create_account(
        &self,
        request: Request<AccountRequest>,
    ) -> Result<Response<AccountResponse>, Status> {
        let req = request.into_inner();
        let _permit = self.worker().await?;
        debug!(account_id = %req.account_id, "CreateAccount");

        self.engine
            .create_account(&req.account_id, &req.account_type)
            .await
            .map_err(to_status)?;

        Ok(Response::new(AccountResponse {
            account_id: req.account_id,
            message: "Account created.".to_string(),
        }))
    }

    async fn get_balance(
        &self,
        request: Request<AccountRequest>,
    ) -> Result<Response<BalanceResponse>, Status> {
        let req = request.into_inner();
        let _permit = self.worker().await?;

        let balance = self
            .engine
            .get_balance(&req.account_id)
            .await
            .map_err(to_status)?;

        Ok(Response::new(BalanceResponse {
            account_id: req.account_id,
            balance: balance.to_string(),
            message: "Balance retrieved.".to_string(),
        }))
    }

    async fn deposit(
        &self,
        request: Request<DepositRequest>,
    ) -> Result<Response<TransactionResponse>, Status> {
        let req = request.into_inner();
        let amount = parse_decimal("Transaction amount", &req.amount)?;
        let _permit = self.worker().await?;
        debug!(account_id = %req.account_id, %amount, "Deposit");

        let balance = self
            .engine
            .deposit(&req.account_id, amount)
            .await
            .map_err(to_status)?;

        Ok(Response::new(TransactionResponse {
            account_id: req.account_id,
            balance: balance.to_string(),
            message: "Deposit successful.".to_string(),
        }))
    }

    async fn withdraw(
        &self,
        request: Request<WithdrawRequest>,
    ) -> Result<Response<TransactionResponse>, Status> {
        let req = request.into_inner();
        let amount = parse_decimal("Transaction amount", &req.amount)?;
        let _permit = self.worker().await?;
        debug!(account_id = %req.account_id, %amount, "Withdraw");

        let balance = self
            .engine
            .withdraw(&req.account_id, amount)
            .await
            .map_err(to_status)?;

        Ok(Response::new(TransactionResponse {
            account_id: req.account_id,
            balance: balance.to_string(),
            message: "Withdraw successful.".to_string(),
        }))
    }

    async fn calculate_interest(
        &self,
        request: Request<InterestRequest>,
    ) -> Result<Response<TransactionResponse>, Status> {
        let req = request.into_inner();
        let rate = parse_decimal("Annual interest rate", &req.annual_interest_rate)?;
        let _permit = self.worker().await?;
        debug!(account_id = %req.account_id, %rate, "CalculateInterest");

        let balance = self
            .engine
            .calculate_interest(&req.account_id, rate)
            .await
            .map_err(to_status)?;

        Ok(Response::new(TransactionResponse {
            account_id: req.account_id,
            balance: balance.to_string(),
            message: "Interest calculated and deposited.".to_string(),
        }))
    }
}
