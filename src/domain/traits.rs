use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::{Account, NewLedgerEntry, StoreError};

/// Storage boundary for account rows and ledger entries.
///
/// The engine and the account service are generic over this trait so tests
/// can substitute fakes without touching the core logic. `fetch_account` and
/// `insert_account` run outside any unit of work; everything a transfer does
/// goes through a [`UnitOfWork`] obtained from [`begin`](LedgerStore::begin).
#[async_trait]
pub trait LedgerStore: Send + Sync + 'static {
    type Uow: UnitOfWork;

    /// Open a new unit of work. Its operations are invisible to other units
    /// until commit, and vanish entirely on rollback.
    async fn begin(&self) -> Result<Self::Uow, StoreError>;

    /// Point-read of an account row, soft-deleted rows included.
    async fn fetch_account(&self, account_id: i64) -> Result<Option<Account>, StoreError>;

    /// Insert a brand-new account row. `StoreError::Duplicate` if the id is
    /// already taken.
    async fn insert_account(&self, account: &Account) -> Result<(), StoreError>;
}

/// A bounded sequence of storage operations that commits or rolls back as a
/// whole. Dropping a unit of work without committing rolls it back.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Read an account's balance under an exclusive row lock. The lock is
    /// held until this unit of work commits or rolls back; concurrent units
    /// touching the same row block here.
    async fn lock_balance(&mut self, account_id: i64) -> Result<Decimal, StoreError>;

    /// Overwrite an account's balance, refreshing its `updated_at`.
    async fn write_balance(&mut self, account_id: i64, balance: Decimal) -> Result<(), StoreError>;

    /// Append one immutable ledger row.
    async fn insert_ledger_entry(&mut self, entry: NewLedgerEntry) -> Result<(), StoreError>;

    async fn commit(self) -> Result<(), StoreError>;

    async fn rollback(self) -> Result<(), StoreError>;
}
