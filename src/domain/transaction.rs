use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// Currency recorded on every ledger entry. Multi-currency transfers are out
/// of scope, so the code is fixed rather than caller-supplied.
pub const DEFAULT_CURRENCY: &str = "USD";

/// One immutable ledger row: a single-sided debit or credit effect of a
/// transfer on one account. A successful transfer always writes two of these
/// sharing one `reference`.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub id: i64,
    pub account_id: i64,
    pub amount: Decimal,
    pub currency_code: String,
    /// Balance of `account_id` immediately after the transfer applied.
    pub available_balance: Decimal,
    pub is_credit: bool,
    pub reference: String,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Insert shape for a ledger row; id and timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLedgerEntry {
    pub account_id: i64,
    pub amount: Decimal,
    pub currency_code: String,
    pub available_balance: Decimal,
    pub is_credit: bool,
    pub reference: String,
}

impl core::fmt::Display for NewLedgerEntry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{},account={},amount={},ref={}",
            if self.is_credit { "credit" } else { "debit" },
            self.account_id,
            self.amount,
            self.reference
        )
    }
}

/// What the caller gets back from a successful transfer: the source account
/// and its post-transfer balance, fixed to five decimal places.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferReceipt {
    pub source_account_id: i64,
    pub available_balance: String,
}
