pub mod account;
pub mod error;
pub mod money;
pub mod traits;
pub mod transaction;

pub use account::{Account, AccountSummary};
pub use error::{LedgerError, StoreError};
pub use traits::{LedgerStore, UnitOfWork};
pub use transaction::{DEFAULT_CURRENCY, LedgerEntry, NewLedgerEntry, TransferReceipt};
