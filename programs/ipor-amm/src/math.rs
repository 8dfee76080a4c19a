//! Common math routines
//!
//! All balances, rates and prices are carried as 18-decimal fixed point
//! values (WAD). Products that can outgrow `u128` (quasi interest, weighted
//! averages) go through the 256-bit `U256` type.

use {
    crate::error::IporError,
    anchor_lang::prelude::*,
    std::fmt::Display,
};

mod u256 {
    use uint::construct_uint;

    construct_uint! {
        pub struct U256(4);
    }
}
pub use u256::U256;

/// One unit in 18-decimal fixed point
pub const WAD: u128 = 1_000_000_000_000_000_000;
pub const WAD_DECIMALS: u8 = 18;
/// Length of the interest year
pub const YEAR_IN_SECONDS: u128 = 31_536_000;

pub fn checked_add<T>(arg1: T, arg2: T) -> Result<T>
where
    T: num_traits::PrimInt + Display,
{
    if let Some(res) = arg1.checked_add(&arg2) {
        Ok(res)
    } else {
        msg!("Error: Overflow in {} + {}", arg1, arg2);
        err!(IporError::MathOverflow)
    }
}

pub fn checked_sub<T>(arg1: T, arg2: T) -> Result<T>
where
    T: num_traits::PrimInt + Display,
{
    if let Some(res) = arg1.checked_sub(&arg2) {
        Ok(res)
    } else {
        msg!("Error: Overflow in {} - {}", arg1, arg2);
        err!(IporError::MathOverflow)
    }
}

pub fn checked_mul<T>(arg1: T, arg2: T) -> Result<T>
where
    T: num_traits::PrimInt + Display,
{
    if let Some(res) = arg1.checked_mul(&arg2) {
        Ok(res)
    } else {
        msg!("Error: Overflow in {} * {}", arg1, arg2);
        err!(IporError::MathOverflow)
    }
}

pub fn checked_div<T>(arg1: T, arg2: T) -> Result<T>
where
    T: num_traits::PrimInt + Display,
{
    if let Some(res) = arg1.checked_div(&arg2) {
        Ok(res)
    } else {
        msg!("Error: Overflow in {} / {}", arg1, arg2);
        err!(IporError::MathOverflow)
    }
}

/// Division rounding half up, used for every internal fixed point ratio.
pub fn checked_div_round(arg1: u128, arg2: u128) -> Result<u128> {
    if arg2 == 0 {
        msg!("Error: Overflow in {} / {}", arg1, arg2);
        return err!(IporError::MathOverflow);
    }
    checked_div(checked_add(arg1, arg2 / 2)?, arg2)
}

pub fn checked_pow<T>(arg: T, exp: usize) -> Result<T>
where
    T: num_traits::PrimInt + Display,
{
    if let Some(res) = num_traits::checked_pow(arg, exp) {
        Ok(res)
    } else {
        msg!("Error: Overflow in {} ^ {}", arg, exp);
        err!(IporError::MathOverflow)
    }
}

pub fn checked_as_u64<T>(arg: T) -> Result<u64>
where
    T: Display + num_traits::ToPrimitive + Clone,
{
    let option: Option<u64> = num_traits::NumCast::from(arg.clone());
    if let Some(res) = option {
        Ok(res)
    } else {
        msg!("Error: Overflow in {} as u64", arg);
        err!(IporError::MathOverflow)
    }
}

pub fn checked_as_u128<T>(arg: T) -> Result<u128>
where
    T: Display + num_traits::ToPrimitive + Clone,
{
    let option: Option<u128> = num_traits::NumCast::from(arg.clone());
    if let Some(res) = option {
        Ok(res)
    } else {
        msg!("Error: Overflow in {} as u128", arg);
        err!(IporError::MathOverflow)
    }
}

pub fn checked_as_i128<T>(arg: T) -> Result<i128>
where
    T: Display + num_traits::ToPrimitive + Clone,
{
    let option: Option<i128> = num_traits::NumCast::from(arg.clone());
    if let Some(res) = option {
        Ok(res)
    } else {
        msg!("Error: Overflow in {} as i128", arg);
        err!(IporError::MathOverflow)
    }
}

/// Computes `arg1 * arg2 / divisor` rounding half up, with a 256-bit
/// intermediate product.
pub fn checked_mul_div_round(arg1: u128, arg2: u128, divisor: u128) -> Result<u128> {
    let product = checked_u256_mul(U256::from(arg1), U256::from(arg2))?;
    u256_as_u128(checked_u256_div_round(product, U256::from(divisor))?)
}

/// Same as `checked_mul_div_round` but rounds down.
pub fn checked_mul_div_floor(arg1: u128, arg2: u128, divisor: u128) -> Result<u128> {
    let product = checked_u256_mul(U256::from(arg1), U256::from(arg2))?;
    u256_as_u128(checked_u256_div(product, U256::from(divisor))?)
}

pub fn checked_u256_add(arg1: U256, arg2: U256) -> Result<U256> {
    arg1.checked_add(arg2).ok_or_else(|| {
        msg!("Error: Overflow in {} + {}", arg1, arg2);
        error!(IporError::MathOverflow)
    })
}

pub fn checked_u256_sub(arg1: U256, arg2: U256) -> Result<U256> {
    arg1.checked_sub(arg2).ok_or_else(|| {
        msg!("Error: Overflow in {} - {}", arg1, arg2);
        error!(IporError::MathOverflow)
    })
}

pub fn checked_u256_mul(arg1: U256, arg2: U256) -> Result<U256> {
    arg1.checked_mul(arg2).ok_or_else(|| {
        msg!("Error: Overflow in {} * {}", arg1, arg2);
        error!(IporError::MathOverflow)
    })
}

pub fn checked_u256_div(arg1: U256, arg2: U256) -> Result<U256> {
    arg1.checked_div(arg2).ok_or_else(|| {
        msg!("Error: Overflow in {} / {}", arg1, arg2);
        error!(IporError::MathOverflow)
    })
}

pub fn checked_u256_div_round(arg1: U256, arg2: U256) -> Result<U256> {
    if arg2.is_zero() {
        msg!("Error: Overflow in {} / 0", arg1);
        return err!(IporError::MathOverflow);
    }
    checked_u256_div(checked_u256_add(arg1, arg2 >> 1)?, arg2)
}

pub fn u256_as_u128(arg: U256) -> Result<u128> {
    if arg > U256::from(u128::MAX) {
        msg!("Error: Overflow in {} as u128", arg);
        return err!(IporError::MathOverflow);
    }
    Ok(arg.as_u128())
}

/// Scales a native token amount to 18 decimals.
pub fn to_wad(amount: u64, decimals: u8) -> Result<u128> {
    if decimals > WAD_DECIMALS {
        return err!(IporError::UnsupportedAsset);
    }
    checked_mul(
        amount as u128,
        checked_pow(10u128, (WAD_DECIMALS - decimals) as usize)?,
    )
}

/// Scales an 18-decimal amount down to native decimals, rounding down.
pub fn from_wad(amount: u128, decimals: u8) -> Result<u64> {
    if decimals > WAD_DECIMALS {
        return err!(IporError::UnsupportedAsset);
    }
    checked_as_u64(checked_div(
        amount,
        checked_pow(10u128, (WAD_DECIMALS - decimals) as usize)?,
    )?)
}

/// 256-bit quasi interest value as stored in accounts
#[derive(Copy, Clone, PartialEq, Eq, AnchorSerialize, AnchorDeserialize, Default, Debug)]
pub struct QuasiAmount {
    /// Little-endian 64-bit limbs
    pub words: [u64; 4],
}

impl From<U256> for QuasiAmount {
    fn from(value: U256) -> Self {
        Self { words: value.0 }
    }
}

impl From<QuasiAmount> for U256 {
    fn from(value: QuasiAmount) -> Self {
        U256(value.words)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_div_round() {
        assert_eq!(checked_div_round(10, 4).unwrap(), 3);
        assert_eq!(checked_div_round(9, 4).unwrap(), 2);
        assert_eq!(checked_div_round(5, 2).unwrap(), 3);
        assert!(checked_div_round(1, 0).is_err());
    }

    #[test]
    fn test_mul_div() {
        // intermediate product above u128::MAX
        let big = 10u128.pow(30);
        assert_eq!(checked_mul_div_round(big, big, big).unwrap(), big);
        assert_eq!(checked_mul_div_floor(7, 1, 2).unwrap(), 3);
        assert_eq!(checked_mul_div_round(7, 1, 2).unwrap(), 4);
        assert!(checked_mul_div_round(u128::MAX, 2, 1).is_err());
    }

    #[test]
    fn test_wad_conversion() {
        assert_eq!(to_wad(1_500_000, 6).unwrap(), 1_500_000_000_000_000_000);
        assert_eq!(to_wad(7, 18).unwrap(), 7);
        assert_eq!(from_wad(1_999_999_999_999_999_999, 6).unwrap(), 1_999_999);
        assert!(to_wad(1, 19).is_err());
    }

    #[test]
    fn test_quasi_amount() {
        let value = U256::from(u128::MAX) * U256::from(1000u64);
        let stored = QuasiAmount::from(value);
        assert_eq!(U256::from(stored), value);
        assert_eq!(U256::from(QuasiAmount::default()), U256::zero());
    }
}
