//! Fixed-point rounding for sales, commission and totals
//!
//! Values are carried as `f64` and rounded through `Decimal` so that displayed
//! figures never show binary floating point artifacts.

use rust_decimal::prelude::*;

/// Number of decimal places for every displayed or exported amount
const DECIMAL_PLACES: u32 = 2;

/// Round to 2 decimal places, half-up on the decimal representation.
///
/// NaN and infinities are returned unchanged; callers validate amounts before
/// they reach this point.
pub fn round2(x: f64) -> f64 {
    if !x.is_finite() {
        return x;
    }

    // from_f64 keeps the shortest decimal that maps back to `x`, so 1.005
    // becomes 1.005 rather than 1.00499999...
    let Some(value) = Decimal::from_f64(x) else {
        return x;
    };

    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or(x)
}

/// Format an amount as dollars with exactly 2 decimals
pub fn format_usd(x: f64) -> String {
    format!("${:.2}", round2(x))
}

/// Format an amount with exactly 2 decimals and no symbol (CSV cells)
pub fn format_amount(x: f64) -> String {
    format!("{:.2}", round2(x))
}
