use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::domain::{Account, LedgerError, LedgerStore, money};

/// Account lifecycle: creation with a validated non-negative opening balance,
/// and lookup by id. After creation, balances change only through the
/// transfer engine.
pub struct AccountService<S: LedgerStore> {
    store: Arc<S>,
}

impl<S: LedgerStore> Clone for AccountService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: LedgerStore> AccountService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Create an account with the given id and opening balance.
    ///
    /// The balance arrives as caller-supplied text and must parse to a
    /// non-negative decimal. Ids already present, soft-deleted ones
    /// included, are rejected.
    pub async fn create_account(
        &self,
        account_id: i64,
        initial_balance: &str,
    ) -> Result<(), LedgerError> {
        if account_id <= 0 {
            return Err(LedgerError::InvalidAccountId);
        }

        let balance = money::parse_amount(initial_balance).ok_or(LedgerError::InvalidAmount)?;
        if balance < Decimal::ZERO {
            return Err(LedgerError::NegativeBalance);
        }

        match self.store.fetch_account(account_id).await {
            Ok(Some(_)) => return Err(LedgerError::AccountExists),
            Ok(None) => {}
            Err(err) => {
                warn!(account_id, error = %err, "account lookup failed");
                return Err(LedgerError::Internal);
            }
        }

        let account = Account::open(account_id, balance, Utc::now());
        if let Err(err) = self.store.insert_account(&account).await {
            warn!(account_id, error = %err, "account insert failed");
            return Err(LedgerError::AccountCreationFailed);
        }

        info!(account_id, balance = %balance, "account created");
        Ok(())
    }

    /// Look an account up by id. Soft-deleted accounts are returned with
    /// their `deleted_at` set; callers decide whether that disqualifies them.
    pub async fn get_account(&self, account_id: i64) -> Result<Account, LedgerError> {
        if account_id <= 0 {
            return Err(LedgerError::InvalidAccountId);
        }

        match self.store.fetch_account(account_id).await {
            Ok(Some(account)) => Ok(account),
            Ok(None) => Err(LedgerError::AccountNotFound),
            Err(err) => {
                warn!(account_id, error = %err, "account lookup failed");
                Err(LedgerError::Internal)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryLedgerStore;
    use std::str::FromStr;

    fn service() -> AccountService<MemoryLedgerStore> {
        AccountService::new(Arc::new(MemoryLedgerStore::new()))
    }

    #[tokio::test]
    async fn creates_account_with_parsed_balance() {
        let accounts = service();
        accounts.create_account(101, "1000.00").await.unwrap();

        let account = accounts.get_account(101).await.unwrap();
        assert_eq!(account.balance, Decimal::from_str("1000.00").unwrap());
        assert_eq!(account.created_at, account.updated_at);
        assert!(!account.is_deleted());
    }

    #[tokio::test]
    async fn rejects_non_positive_id() {
        let accounts = service();
        assert_eq!(
            accounts.create_account(0, "10").await,
            Err(LedgerError::InvalidAccountId)
        );
        assert_eq!(
            accounts.create_account(-3, "10").await,
            Err(LedgerError::InvalidAccountId)
        );
        assert_eq!(
            accounts.get_account(0).await,
            Err(LedgerError::InvalidAccountId)
        );
    }

    #[tokio::test]
    async fn rejects_unparsable_balance() {
        let accounts = service();
        assert_eq!(
            accounts.create_account(1, "ten dollars").await,
            Err(LedgerError::InvalidAmount)
        );
        assert_eq!(
            accounts.create_account(1, "").await,
            Err(LedgerError::InvalidAmount)
        );
    }

    #[tokio::test]
    async fn rejects_negative_balance() {
        let accounts = service();
        assert_eq!(
            accounts.create_account(1, "-5").await,
            Err(LedgerError::NegativeBalance)
        );
        // Nothing was inserted.
        assert_eq!(
            accounts.get_account(1).await,
            Err(LedgerError::AccountNotFound)
        );
    }

    #[tokio::test]
    async fn duplicate_creation_keeps_first_balance() {
        let accounts = service();
        accounts.create_account(1, "10").await.unwrap();
        assert_eq!(
            accounts.create_account(1, "99").await,
            Err(LedgerError::AccountExists)
        );
        assert_eq!(
            accounts.get_account(1).await.unwrap().balance,
            Decimal::from_str("10").unwrap()
        );
    }

    #[tokio::test]
    async fn missing_account_is_not_found() {
        let accounts = service();
        assert_eq!(
            accounts.get_account(404).await,
            Err(LedgerError::AccountNotFound)
        );
    }

    #[tokio::test]
    async fn soft_deleted_account_is_still_readable() {
        let store = Arc::new(MemoryLedgerStore::new());
        let accounts = AccountService::new(Arc::clone(&store));

        let now = Utc::now();
        let mut account = Account::open(7, Decimal::ZERO, now);
        account.deleted_at = Some(now);
        store.insert_account(&account).await.unwrap();

        let fetched = accounts.get_account(7).await.unwrap();
        assert!(fetched.is_deleted());
        assert!(fetched.summary().is_deleted);

        // And its id is still taken.
        assert_eq!(
            accounts.create_account(7, "1").await,
            Err(LedgerError::AccountExists)
        );
    }
}
