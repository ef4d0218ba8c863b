use crate::error::CoreError;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Number of fractional digits every price and percentage is rounded to.
pub const PRICE_SCALE: u32 = 4;

/// Rounds a raw price to `PRICE_SCALE` fractional digits.
///
/// Midpoints round away from zero, so `1.00005` becomes `1.0001`. Rounding
/// before any comparison keeps sub-cent noise from the quote source from
/// flipping a threshold check back and forth.
pub fn normalize(raw: Decimal) -> Result<Decimal, CoreError> {
    if raw.is_sign_negative() && !raw.is_zero() {
        return Err(CoreError::NegativePrice(raw));
    }
    Ok(round_to_scale(raw))
}

/// Float entry point for `normalize`. NaN and infinities are rejected rather than coerced.
pub fn normalize_f64(raw: f64) -> Result<Decimal, CoreError> {
    if !raw.is_finite() {
        return Err(CoreError::NonFinitePrice(raw));
    }
    let value = Decimal::from_f64(raw).ok_or(CoreError::Unrepresentable(raw))?;
    normalize(value)
}

/// Absolute percentage move from `previous` to `current`, rounded to `PRICE_SCALE`.
///
/// Returns `None` when `previous` is zero or the result exceeds the `Decimal` range.
pub fn percent_change(previous: Decimal, current: Decimal) -> Option<Decimal> {
    let ratio = current.checked_sub(previous)?.checked_div(previous)?;
    let pct = ratio.abs().checked_mul(Decimal::ONE_HUNDRED)?;
    Some(round_to_scale(pct))
}

fn round_to_scale(value: Decimal) -> Decimal {
    // `normalize()` strips trailing zeros so 100.5000 and 100.5 compare and print alike.
    value
        .round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
}
