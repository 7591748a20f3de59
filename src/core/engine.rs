//! Account transaction engine
//!
//! This module provides `AccountEngine`, which executes the five account
//! operations against an injected store using optimistic concurrency control.
//!
//! # Design
//!
//! The engine keeps no account state between calls. Every mutating operation
//! re-reads the account under a watch, decides the new state with a pure
//! function of the read value and the request, and commits conditionally:
//!
//! ```text
//! validate request ──► watch ──► read ──► decide ──► conditional commit
//!        │                                  │              │
//!        ▼                                  ▼              ▼
//!  InvalidArgument           NotFound / AlreadyExists   conflict: restart
//!                            InsufficientFunds          (bounded by RetryPolicy)
//! ```
//!
//! Business rejections are terminal and never retried. Only watch conflicts
//! restart the cycle, and exhausting the budget yields `BankError::Aborted`.
//!
//! # Thread Safety
//!
//! The engine is cheap to clone and all clones share the store. Each call
//! opens its own store session, so concurrent calls never share a watch.

use super::retry::{OccState, RetryPolicy};
use crate::store::{AccountStore, StoreSession};
use crate::types::{Account, BankError, StoreError};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Configuration for the account engine
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EngineConfig {
    /// Bound on OCC attempts per operation
    pub retry: RetryPolicy,
}

/// Executes account operations with optimistic concurrency control
#[derive(Debug)]
pub struct AccountEngine<S> {
    store: Arc<S>,
    policy: RetryPolicy,
}

impl<S> Clone for AccountEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            policy: self.policy,
        }
    }
}

impl<S: AccountStore> AccountEngine<S> {
    /// Create an engine over `store`
    pub fn new(store: S, config: EngineConfig) -> Self {
        Self {
            store: Arc::new(store),
            policy: config.retry,
        }
    }

    /// Create an account with a zero balance
    ///
    /// The existence check runs under a watch and the new document is written
    /// through the conditional commit, so two racing creators of the same ID
    /// cannot both succeed.
    ///
    /// # Errors
    ///
    /// * `InvalidArgument` - `account_id` is empty
    /// * `AlreadyExists` - the key already holds an account (never retried)
    /// * `Aborted` - every attempt hit a conflicting write
    #[instrument(skip(self), fields(operation = "create_account"))]
    pub async fn create_account(
        &self,
        account_id: &str,
        account_type: &str,
    ) -> Result<Account, BankError> {
        validate_account_id(account_id)?;

        let account = Account::new(account_type);
        let document = account.to_document(account_id)?;
        let mut session = self.store.session().await?;
        let mut state = self.policy.start();

        loop {
            state = match state {
                OccState::Attempt(n) => {
                    session.watch(account_id).await?;
                    if session.exists(account_id).await? {
                        release_watch(&mut session).await;
                        return Err(BankError::already_exists(account_id));
                    }
                    match session.commit(account_id, document.clone()).await {
                        Ok(()) => OccState::Success(account.clone()),
                        Err(StoreError::WatchConflict { .. }) => {
                            debug!(attempt = n, "Conflicting write during create");
                            self.policy.on_conflict(n)
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
                retry @ OccState::ConflictRetry(_) => retry.retry(),
                OccState::Success(account) => {
                    info!(account_type, "Account created");
                    return Ok(account);
                }
                OccState::Exhausted(attempts) => {
                    warn!(attempts, "Retry budget exhausted");
                    return Err(BankError::aborted("create_account", account_id, attempts));
                }
            };
        }
    }

    /// Read the current balance
    ///
    /// Pure read: no watch and no retry.
    ///
    /// # Errors
    ///
    /// * `InvalidArgument` - `account_id` is empty
    /// * `NotFound` - no account under `account_id`
    #[instrument(skip(self), fields(operation = "get_balance"))]
    pub async fn get_balance(&self, account_id: &str) -> Result<Decimal, BankError> {
        validate_account_id(account_id)?;

        let mut session = self.store.session().await?;
        let document = session
            .get(account_id)
            .await?
            .ok_or_else(|| BankError::not_found(account_id))?;

        Ok(Account::from_document(account_id, &document)?.balance)
    }

    /// Credit `amount` to an account
    ///
    /// # Returns
    ///
    /// The balance after the committed deposit.
    ///
    /// # Errors
    ///
    /// * `InvalidArgument` - `amount <= 0`, checked before touching the store
    /// * `NotFound` - no account under `account_id`
    /// * `ArithmeticOverflow` - the new balance is not representable
    /// * `Aborted` - every attempt hit a conflicting write
    #[instrument(skip(self), fields(operation = "deposit"))]
    pub async fn deposit(&self, account_id: &str, amount: Decimal) -> Result<Decimal, BankError> {
        validate_account_id(account_id)?;
        if amount <= Decimal::ZERO {
            return Err(BankError::invalid_argument(INVALID_AMOUNT));
        }

        let account = self
            .mutate("deposit", account_id, |mut account| {
                account.balance = account
                    .balance
                    .checked_add(amount)
                    .ok_or_else(|| BankError::arithmetic_overflow("deposit", account_id))?;
                Ok(account)
            })
            .await?;

        Ok(account.balance)
    }

    /// Debit `amount` from an account
    ///
    /// Sufficient funds are checked against the balance read by each attempt,
    /// since a concurrent withdrawal can change availability between attempts.
    ///
    /// # Returns
    ///
    /// The balance after the committed withdrawal.
    ///
    /// # Errors
    ///
    /// * `InvalidArgument` - `amount <= 0`, checked before touching the store
    /// * `NotFound` - no account under `account_id`
    /// * `InsufficientFunds` - `balance < amount` on the attempt's fresh read
    /// * `Aborted` - every attempt hit a conflicting write
    #[instrument(skip(self), fields(operation = "withdraw"))]
    pub async fn withdraw(&self, account_id: &str, amount: Decimal) -> Result<Decimal, BankError> {
        validate_account_id(account_id)?;
        if amount <= Decimal::ZERO {
            return Err(BankError::invalid_argument(INVALID_AMOUNT));
        }

        let account = self
            .mutate("withdraw", account_id, |mut account| {
                if account.balance < amount {
                    return Err(BankError::insufficient_funds(
                        account_id,
                        account.balance,
                        amount,
                    ));
                }
                account.balance = account
                    .balance
                    .checked_sub(amount)
                    .ok_or_else(|| BankError::arithmetic_overflow("withdraw", account_id))?;
                Ok(account)
            })
            .await?;

        Ok(account.balance)
    }

    /// Credit one period of interest: `balance += balance * (rate / 100)`
    ///
    /// # Returns
    ///
    /// The balance after the committed accrual.
    ///
    /// # Errors
    ///
    /// * `InvalidArgument` - `annual_rate_percent <= 0`, checked up front
    /// * `NotFound` - no account under `account_id`
    /// * `ArithmeticOverflow` - the new balance is not representable
    /// * `Aborted` - every attempt hit a conflicting write
    #[instrument(skip(self), fields(operation = "calculate_interest"))]
    pub async fn calculate_interest(
        &self,
        account_id: &str,
        annual_rate_percent: Decimal,
    ) -> Result<Decimal, BankError> {
        validate_account_id(account_id)?;
        if annual_rate_percent <= Decimal::ZERO {
            return Err(BankError::invalid_argument(INVALID_RATE));
        }

        let account = self
            .mutate("calculate_interest", account_id, |mut account| {
                let overflow = || BankError::arithmetic_overflow("calculate_interest", account_id);
                let rate = annual_rate_percent
                    .checked_div(Decimal::ONE_HUNDRED)
                    .ok_or_else(overflow)?;
                let interest = account.balance.checked_mul(rate).ok_or_else(overflow)?;
                account.balance = account.balance.checked_add(interest).ok_or_else(overflow)?;
                Ok(account)
            })
            .await?;

        Ok(account.balance)
    }

    /// Run the OCC cycle for a read-modify-write on an existing account
    ///
    /// `apply` must be deterministic in its input; it is re-run on every
    /// attempt against the freshly read account.
    async fn mutate<F>(
        &self,
        operation: &'static str,
        account_id: &str,
        apply: F,
    ) -> Result<Account, BankError>
    where
        F: Fn(Account) -> Result<Account, BankError> + Send + Sync,
    {
        let mut session = self.store.session().await?;
        let mut state = self.policy.start();

        loop {
            state = match state {
                OccState::Attempt(n) => match self.attempt(&mut session, account_id, &apply).await {
                    Ok(account) => OccState::Success(account),
                    Err(BankError::Store(StoreError::WatchConflict { .. })) => {
                        debug!(attempt = n, "Conflicting write, restarting cycle");
                        self.policy.on_conflict(n)
                    }
                    Err(e) => return Err(e),
                },
                retry @ OccState::ConflictRetry(_) => retry.retry(),
                OccState::Success(account) => {
                    info!(balance = %account.balance, "{} committed", operation);
                    return Ok(account);
                }
                OccState::Exhausted(attempts) => {
                    warn!(attempts, "Retry budget exhausted");
                    return Err(BankError::aborted(operation, account_id, attempts));
                }
            };
        }
    }

    /// One watch / read / decide / commit pass
    async fn attempt<F>(
        &self,
        session: &mut S::Session,
        account_id: &str,
        apply: &F,
    ) -> Result<Account, BankError>
    where
        F: Fn(Account) -> Result<Account, BankError> + Send + Sync,
    {
        session.watch(account_id).await?;

        let decided = match session.get(account_id).await? {
            Some(document) => Account::from_document(account_id, &document).and_then(apply),
            None => Err(BankError::not_found(account_id)),
        };

        let account = match decided {
            Ok(account) => account,
            Err(e) => {
                release_watch(session).await;
                return Err(e);
            }
        };

        session
            .commit(account_id, account.to_document(account_id)?)
            .await?;
        Ok(account)
    }
}

const INVALID_AMOUNT: &str = "Transaction amount must be positive.";
const INVALID_RATE: &str = "Annual interest rate must be a positive value.";
const EMPTY_ACCOUNT_ID: &str = "Account ID must not be empty.";

/// Drop the watch before returning a business rejection
///
/// A failed UNWATCH must not replace the rejection: the session still counts
/// as watching and is discarded instead of reused.
async fn release_watch<T: StoreSession>(session: &mut T) {
    if let Err(e) = session.unwatch().await {
        debug!(error = %e, "Failed to release watch");
    }
}

fn validate_account_id(account_id: &str) -> Result<(), BankError> {
    if account_id.is_empty() {
        return Err(BankError::invalid_argument(EMPTY_ACCOUNT_ID));
    }
    Ok(())
}
