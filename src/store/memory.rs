use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::OwnedMutexGuard;
use tokio::time::timeout;

use crate::domain::{Account, LedgerEntry, LedgerStore, NewLedgerEntry, StoreError, UnitOfWork};

/// How long a unit of work waits for a row lock before giving up. The
/// timeout is what breaks the cycle when two transfers lock the same pair of
/// accounts in opposite order, the same job a SQL backend's deadlock
/// detector does.
const DEFAULT_LOCK_WAIT: Duration = Duration::from_secs(5);

struct Inner {
    accounts: Mutex<HashMap<i64, Arc<tokio::sync::Mutex<Account>>>>,
    ledger: Mutex<Vec<LedgerEntry>>,
    next_entry_id: AtomicI64,
    lock_wait: Duration,
}

/// In-memory ledger store with one async mutex per account row.
///
/// A unit of work holds the owned guards of every row it locked and stages
/// its writes privately; commit applies them while the guards are still
/// held, so no other unit ever observes a half-applied transfer.
pub struct MemoryLedgerStore {
    inner: Arc<Inner>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::with_lock_wait(DEFAULT_LOCK_WAIT)
    }

    pub fn with_lock_wait(lock_wait: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                accounts: Mutex::new(HashMap::new()),
                ledger: Mutex::new(Vec::new()),
                next_entry_id: AtomicI64::new(1),
                lock_wait,
            }),
        }
    }

    /// Snapshot of every committed ledger entry, in commit order.
    pub fn ledger_entries(&self) -> Vec<LedgerEntry> {
        self.inner.ledger.lock().expect("ledger lock poisoned").clone()
    }
}

impl Default for MemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    type Uow = MemoryUnitOfWork;

    async fn begin(&self) -> Result<MemoryUnitOfWork, StoreError> {
        Ok(MemoryUnitOfWork {
            inner: Arc::clone(&self.inner),
            locked: HashMap::new(),
            staged_balances: HashMap::new(),
            staged_entries: Vec::new(),
        })
    }

    async fn fetch_account(&self, account_id: i64) -> Result<Option<Account>, StoreError> {
        let cell = {
            let accounts = self.inner.accounts.lock().expect("account index poisoned");
            accounts.get(&account_id).cloned()
        };
        match cell {
            Some(cell) => Ok(Some(cell.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        let mut accounts = self.inner.accounts.lock().expect("account index poisoned");
        match accounts.entry(account.account_id) {
            Entry::Occupied(_) => Err(StoreError::Duplicate),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(tokio::sync::Mutex::new(account.clone())));
                Ok(())
            }
        }
    }
}

pub struct MemoryUnitOfWork {
    inner: Arc<Inner>,
    locked: HashMap<i64, OwnedMutexGuard<Account>>,
    staged_balances: HashMap<i64, Decimal>,
    staged_entries: Vec<NewLedgerEntry>,
}

impl MemoryUnitOfWork {
    /// Take the row lock for `account_id` if this unit does not hold it yet.
    async fn acquire(&mut self, account_id: i64) -> Result<(), StoreError> {
        if self.locked.contains_key(&account_id) {
            return Ok(());
        }
        let cell = {
            let accounts = self.inner.accounts.lock().expect("account index poisoned");
            accounts.get(&account_id).cloned()
        }
        .ok_or(StoreError::NotFound)?;

        let guard = timeout(self.inner.lock_wait, cell.lock_owned())
            .await
            .map_err(|_| StoreError::LockTimeout)?;
        self.locked.insert(account_id, guard);
        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn lock_balance(&mut self, account_id: i64) -> Result<Decimal, StoreError> {
        self.acquire(account_id).await?;
        // A balance this unit already wrote is visible to its own reads.
        if let Some(balance) = self.staged_balances.get(&account_id) {
            return Ok(*balance);
        }
        let guard = self.locked.get(&account_id).ok_or(StoreError::NotFound)?;
        Ok(guard.balance)
    }

    async fn write_balance(&mut self, account_id: i64, balance: Decimal) -> Result<(), StoreError> {
        self.acquire(account_id).await?;
        self.staged_balances.insert(account_id, balance);
        Ok(())
    }

    async fn insert_ledger_entry(&mut self, entry: NewLedgerEntry) -> Result<(), StoreError> {
        self.staged_entries.push(entry);
        Ok(())
    }

    async fn commit(mut self) -> Result<(), StoreError> {
        let now = Utc::now();
        for (account_id, balance) in self.staged_balances.drain() {
            let guard = self
                .locked
                .get_mut(&account_id)
                .ok_or(StoreError::NotFound)?;
            guard.balance = balance;
            guard.updated_at = now;
        }
        if !self.staged_entries.is_empty() {
            let mut ledger = self.inner.ledger.lock().expect("ledger lock poisoned");
            for entry in self.staged_entries.drain(..) {
                let id = self.inner.next_entry_id.fetch_add(1, Ordering::Relaxed);
                ledger.push(LedgerEntry {
                    id,
                    account_id: entry.account_id,
                    amount: entry.amount,
                    currency_code: entry.currency_code,
                    available_balance: entry.available_balance,
                    is_credit: entry.is_credit,
                    reference: entry.reference,
                    created_at: now,
                    deleted_at: None,
                });
            }
        }
        // Dropping self releases every row lock.
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        // Staged state dies with the unit; dropping the guards unlocks the rows.
        Ok(())
    }
}
