//! A ledger service core: account balances plus an atomic money-transfer
//! engine that locks both account rows, checks funds, moves the balances and
//! writes a paired debit/credit record as one unit of work.
//!
//! Transport, request parsing and configuration live outside this crate;
//! everything here is expressed against the [`domain::LedgerStore`] storage
//! boundary, with an in-memory implementation for tests and a PostgreSQL one
//! for production.

pub mod accounts;
pub mod domain;
pub mod engine;
pub mod store;

pub use accounts::AccountService;
pub use domain::{
    Account, AccountSummary, LedgerEntry, LedgerError, LedgerStore, NewLedgerEntry, StoreError,
    TransferReceipt, UnitOfWork,
};
pub use engine::TransferEngine;
pub use store::{MemoryLedgerStore, PgLedgerStore};
