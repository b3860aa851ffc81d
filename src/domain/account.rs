use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::money;

/// A financial account holding the current balance.
///
/// Balance mutations only happen through account creation and the transfer
/// engine; `deleted_at` is read-only state here, nothing in this crate sets
/// or clears it.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub account_id: i64,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Account {
    /// A freshly created account: both timestamps set to `now`, not deleted.
    pub fn open(account_id: i64, balance: Decimal, now: DateTime<Utc>) -> Self {
        Self {
            account_id,
            balance,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Soft-deleted accounts stay readable but cannot take part in transfers.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn summary(&self) -> AccountSummary {
        AccountSummary {
            account_id: self.account_id,
            balance: money::format_amount(self.balance),
            is_deleted: self.is_deleted(),
        }
    }
}

/// Caller-facing account shape with the balance fixed to five decimal places.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSummary {
    pub account_id: i64,
    pub balance: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_deleted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn summary_formats_balance_and_flags_deletion() {
        let now = Utc::now();
        let mut account = Account::open(101, Decimal::from_str("1000").unwrap(), now);
        assert_eq!(
            account.summary(),
            AccountSummary {
                account_id: 101,
                balance: "1000.00000".to_string(),
                is_deleted: false,
            }
        );

        account.deleted_at = Some(now);
        assert!(account.summary().is_deleted);
    }
}
