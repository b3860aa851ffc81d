use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::accounts::AccountService;
use crate::domain::{
    DEFAULT_CURRENCY, LedgerError, LedgerStore, NewLedgerEntry, StoreError, TransferReceipt,
    UnitOfWork, money,
};

/// The transactional money-transfer engine.
///
/// A transfer runs in two phases. Validation is lock-free and read-only: it
/// checks the request shape and that both participants exist and are not
/// soft-deleted. Execution then re-reads both balances under exclusive row
/// locks inside one unit of work, so the validation reads being stale cannot
/// corrupt anything; the locked funds check is the one that counts.
pub struct TransferEngine<S: LedgerStore> {
    accounts: AccountService<S>,
    store: Arc<S>,
}

impl<S: LedgerStore> TransferEngine<S> {
    pub fn new(accounts: AccountService<S>, store: Arc<S>) -> Self {
        Self { accounts, store }
    }

    /// Move `amount` from `source_id` to `destination_id`, recording a
    /// debit/credit ledger pair under one shared reference. Atomic: either
    /// both balances move and both entries exist, or nothing happened.
    pub async fn create_transaction(
        &self,
        source_id: i64,
        destination_id: i64,
        amount: Decimal,
    ) -> Result<TransferReceipt, LedgerError> {
        self.validate(source_id, destination_id, amount).await?;
        self.execute(source_id, destination_id, amount).await
    }

    async fn validate(
        &self,
        source_id: i64,
        destination_id: i64,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        if source_id <= 0 {
            return Err(LedgerError::InvalidSourceAccountId);
        }
        if destination_id <= 0 {
            return Err(LedgerError::InvalidDestinationAccountId);
        }
        if source_id == destination_id {
            return Err(LedgerError::SameSourceAndDestinationId);
        }
        if amount < Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }

        let source = self
            .accounts
            .get_account(source_id)
            .await
            .map_err(|err| match err {
                LedgerError::AccountNotFound => LedgerError::SourceAccountNotFound,
                _ => LedgerError::Internal,
            })?;
        if source.is_deleted() {
            return Err(LedgerError::SourceAccountNotFound);
        }

        let destination =
            self.accounts
                .get_account(destination_id)
                .await
                .map_err(|err| match err {
                    LedgerError::AccountNotFound => LedgerError::DestinationAccountNotFound,
                    _ => LedgerError::Internal,
                })?;
        if destination.is_deleted() {
            return Err(LedgerError::DestinationAccountNotFound);
        }

        Ok(())
    }

    async fn execute(
        &self,
        source_id: i64,
        destination_id: i64,
        amount: Decimal,
    ) -> Result<TransferReceipt, LedgerError> {
        let mut uow = match self.store.begin().await {
            Ok(uow) => uow,
            Err(err) => {
                warn!(source_id, destination_id, error = %err, "failed to open unit of work");
                return Err(LedgerError::TransactionFailed);
            }
        };

        // Locks go source first, then destination, in caller order. A lock
        // cycle between opposite-direction transfers is the store's problem
        // to break; its abort comes back as a retryable TransactionFailed.
        let source_balance = match uow.lock_balance(source_id).await {
            Ok(balance) => balance,
            Err(err) => return Err(abort(uow, "lock source balance", err).await),
        };

        if source_balance < amount {
            if let Err(err) = uow.rollback().await {
                warn!(error = %err, "rollback failed");
            }
            return Err(LedgerError::InsufficientBalance);
        }

        let destination_balance = match uow.lock_balance(destination_id).await {
            Ok(balance) => balance,
            Err(err) => return Err(abort(uow, "lock destination balance", err).await),
        };

        let new_source = source_balance - amount;
        let new_destination = destination_balance + amount;

        if let Err(err) = uow.write_balance(source_id, new_source).await {
            return Err(abort(uow, "write source balance", err).await);
        }
        if let Err(err) = uow.write_balance(destination_id, new_destination).await {
            return Err(abort(uow, "write destination balance", err).await);
        }

        let reference = transfer_reference();
        let debit = NewLedgerEntry {
            account_id: source_id,
            amount,
            currency_code: DEFAULT_CURRENCY.to_string(),
            available_balance: new_source,
            is_credit: false,
            reference: reference.clone(),
        };
        let credit = NewLedgerEntry {
            account_id: destination_id,
            amount,
            currency_code: DEFAULT_CURRENCY.to_string(),
            available_balance: new_destination,
            is_credit: true,
            reference: reference.clone(),
        };

        debug!(%debit, "appending ledger entry");
        if let Err(err) = uow.insert_ledger_entry(debit).await {
            return Err(abort(uow, "append debit entry", err).await);
        }
        debug!(%credit, "appending ledger entry");
        if let Err(err) = uow.insert_ledger_entry(credit).await {
            return Err(abort(uow, "append credit entry", err).await);
        }

        if let Err(err) = uow.commit().await {
            warn!(source_id, destination_id, error = %err, "commit failed");
            return Err(LedgerError::TransactionFailed);
        }

        info!(
            source_id,
            destination_id,
            amount = %amount,
            reference = %reference,
            "transfer committed"
        );

        Ok(TransferReceipt {
            source_account_id: source_id,
            available_balance: money::format_amount(new_source),
        })
    }
}

/// Roll the unit of work back and collapse the cause into the coarse
/// execution-phase failure. Validation already vouched for both accounts, so
/// the caller learns nothing finer than "it did not happen".
async fn abort<U: UnitOfWork>(uow: U, step: &str, err: StoreError) -> LedgerError {
    warn!(step, error = %err, "transfer aborted, rolling back");
    if let Err(rollback_err) = uow.rollback().await {
        warn!(error = %rollback_err, "rollback failed");
    }
    LedgerError::TransactionFailed
}

/// Globally unique reference shared by a transfer's debit/credit pair.
fn transfer_reference() -> String {
    format!("TXN-{}", Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Account;
    use crate::store::MemoryLedgerStore;
    use chrono::Utc;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn engine() -> (Arc<MemoryLedgerStore>, TransferEngine<MemoryLedgerStore>) {
        let store = Arc::new(MemoryLedgerStore::new());
        let accounts = AccountService::new(Arc::clone(&store));
        let engine = TransferEngine::new(accounts, Arc::clone(&store));
        (store, engine)
    }

    #[tokio::test]
    async fn rejects_bad_request_shapes() {
        let (_store, engine) = engine();
        assert_eq!(
            engine.create_transaction(0, 2, dec("1")).await,
            Err(LedgerError::InvalidSourceAccountId)
        );
        assert_eq!(
            engine.create_transaction(1, -2, dec("1")).await,
            Err(LedgerError::InvalidDestinationAccountId)
        );
        assert_eq!(
            engine.create_transaction(5, 5, dec("1")).await,
            Err(LedgerError::SameSourceAndDestinationId)
        );
        assert_eq!(
            engine.create_transaction(1, 2, dec("-0.01")).await,
            Err(LedgerError::InvalidAmount)
        );
    }

    #[tokio::test]
    async fn missing_participants_are_reported_by_side() {
        let (store, engine) = engine();
        store
            .insert_account(&Account::open(1, dec("10"), Utc::now()))
            .await
            .unwrap();

        assert_eq!(
            engine.create_transaction(999, 1, dec("1")).await,
            Err(LedgerError::SourceAccountNotFound)
        );
        assert_eq!(
            engine.create_transaction(1, 999, dec("1")).await,
            Err(LedgerError::DestinationAccountNotFound)
        );
    }

    #[tokio::test]
    async fn soft_deleted_participants_are_ineligible() {
        let (store, engine) = engine();
        let now = Utc::now();
        store
            .insert_account(&Account::open(1, dec("10"), now))
            .await
            .unwrap();
        let mut gone = Account::open(2, dec("10"), now);
        gone.deleted_at = Some(now);
        store.insert_account(&gone).await.unwrap();

        assert_eq!(
            engine.create_transaction(2, 1, dec("1")).await,
            Err(LedgerError::SourceAccountNotFound)
        );
        assert_eq!(
            engine.create_transaction(1, 2, dec("1")).await,
            Err(LedgerError::DestinationAccountNotFound)
        );
    }

    #[tokio::test]
    async fn reference_format_is_txn_uuid() {
        let reference = transfer_reference();
        assert!(reference.starts_with("TXN-"));
        assert_eq!(reference.len(), "TXN-".len() + 36);
        assert_ne!(reference, transfer_reference());
    }
}
