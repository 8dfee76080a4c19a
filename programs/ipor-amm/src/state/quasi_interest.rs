//! Quasi interest math
//!
//! A quasi value is an interest amount that has not yet been divided by
//! `WAD * YEAR_IN_SECONDS`. Keeping amounts in this form lets swaps and SOAP
//! indicators accumulate `notional * rate * seconds` terms without losing
//! precision. Every quasi value is normalized exactly once, at the point an
//! amount is needed.

use {
    crate::math::{self, U256, WAD, YEAR_IN_SECONDS},
    anchor_lang::prelude::*,
};

/// `WAD * YEAR_IN_SECONDS`, the factor carried by every quasi value
pub fn quasi_denominator() -> U256 {
    U256::from(WAD) * U256::from(YEAR_IN_SECONDS)
}

/// Principal plus fixed interest for `period` seconds.
pub fn quasi_interest_fixed(notional: u128, fixed_rate: u128, period: u128) -> Result<U256> {
    math::checked_u256_add(
        math::checked_u256_mul(U256::from(notional), quasi_denominator())?,
        quasi_interest_fixed_accrued(notional, fixed_rate, period)?,
    )
}

/// Fixed interest alone, without the principal.
pub fn quasi_interest_fixed_accrued(notional: u128, fixed_rate: u128, period: u128) -> Result<U256> {
    math::checked_u256_mul(
        math::checked_u256_mul(U256::from(notional), U256::from(fixed_rate))?,
        U256::from(period),
    )
}

/// Value of `ibt_quantity` interest bearing tokens at `ibt_price`.
pub fn quasi_interest_floating(ibt_quantity: u128, ibt_price: u128) -> Result<U256> {
    math::checked_u256_mul(
        math::checked_u256_mul(U256::from(ibt_quantity), U256::from(ibt_price))?,
        U256::from(YEAR_IN_SECONDS),
    )
}

pub fn normalize(quasi: U256) -> Result<u128> {
    math::u256_as_u128(math::checked_u256_div_round(quasi, quasi_denominator())?)
}

/// Normalized `lhs - rhs`, rounding the magnitude half up.
pub fn normalize_difference(lhs: U256, rhs: U256) -> Result<i128> {
    if lhs >= rhs {
        math::checked_as_i128(normalize(math::checked_u256_sub(lhs, rhs)?)?)
    } else {
        let magnitude = math::checked_as_i128(normalize(math::checked_u256_sub(rhs, lhs)?)?)?;
        Ok(-magnitude)
    }
}
