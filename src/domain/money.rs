use rust_decimal::Decimal;

/// Caller-visible balances carry exactly this many decimal places, matching
/// the DECIMAL(20,5) columns the accounts are persisted in.
pub const BALANCE_DECIMALS: u32 = 5;

/// Parse a caller-supplied amount string into a decimal.
///
/// Rejects anything that is not a plain decimal number; sign handling is the
/// caller's concern (a negative result is a valid parse).
pub fn parse_amount(text: &str) -> Option<Decimal> {
    Decimal::from_str_exact(text.trim()).ok()
}

/// Format a balance with a fixed five decimal places, e.g. `900.00000`.
pub fn format_amount(value: Decimal) -> String {
    format!(
        "{:.1$}",
        value.round_dp(BALANCE_DECIMALS),
        BALANCE_DECIMALS as usize
    )
}
