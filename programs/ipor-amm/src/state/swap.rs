//! Swap state
//!
//! A swap exchanges a fixed rate for the floating index on a notional
//! amount until maturity. Pay-fixed buyers pay the fixed rate and receive
//! the floating one, receive-fixed buyers the opposite.

use {
    crate::{
        error::IporError,
        math::{self, U256},
        state::quasi_interest,
    },
    anchor_lang::prelude::*,
};

/// Side of the swap taken by the buyer
#[derive(Copy, Clone, PartialEq, Eq, AnchorSerialize, AnchorDeserialize, Debug)]
pub enum Leg {
    PayFixed,
    ReceiveFixed,
}

impl Default for Leg {
    fn default() -> Self {
        Self::PayFixed
    }
}

#[derive(Copy, Clone, PartialEq, Eq, AnchorSerialize, AnchorDeserialize, Debug)]
pub enum SwapState {
    /// Account allocated but never opened
    None,
    Active,
    Closed,
}

impl Default for SwapState {
    fn default() -> Self {
        Self::None
    }
}

/// Swap account, one per opened swap
#[account]
#[derive(Default, Debug)]
pub struct Swap {
    /// Sequential id within the pool, starting at 1
    pub id: u64,
    pub pool: Pubkey,
    /// Asset mint of the pool, checked again at close
    pub asset: Pubkey,
    /// Only account allowed to close before the maturity window
    pub buyer: Pubkey,
    pub leg: Leg,
    pub state: SwapState,

    /// Collateral locked by the buyer, net of all fees
    pub collateral: u128,
    /// collateral * leverage
    pub notional: u128,
    /// Rate quoted at opening, fixed for the life of the swap
    pub fixed_interest_rate: u128,
    /// Notional expressed in interest bearing tokens at opening
    pub ibt_quantity: u128,
    pub opening_fee_amount: u128,
    /// Returned to whoever closes the swap
    pub liquidation_deposit_amount: u128,

    pub open_timestamp: i64,
    /// Maturity, open time plus the pool's tenor
    pub end_timestamp: i64,
    /// Zero while active
    pub close_timestamp: i64,

    pub bump: u8,
}

impl Swap {
    pub const LEN: usize = 8 + std::mem::size_of::<Swap>();

    pub fn is_active(&self) -> bool {
        self.state == SwapState::Active
    }

    /// Quasi fixed and floating legs at `timestamp`
    pub fn get_quasi_interest(&self, timestamp: i64, ibt_price: u128) -> Result<(U256, U256)> {
        require!(
            timestamp >= self.open_timestamp,
            IporError::InvalidTimestamp
        );
        let period = math::checked_as_u128(math::checked_sub(timestamp, self.open_timestamp)?)?;

        let quasi_fixed =
            quasi_interest::quasi_interest_fixed(self.notional, self.fixed_interest_rate, period)?;
        let quasi_floating = quasi_interest::quasi_interest_floating(self.ibt_quantity, ibt_price)?;

        Ok((quasi_fixed, quasi_floating))
    }

    /// Value of the swap for its buyer, not bounded by collateral
    pub fn get_unbounded_value(&self, timestamp: i64, ibt_price: u128) -> Result<i128> {
        let (quasi_fixed, quasi_floating) = self.get_quasi_interest(timestamp, ibt_price)?;
        match self.leg {
            Leg::PayFixed => quasi_interest::normalize_difference(quasi_floating, quasi_fixed),
            Leg::ReceiveFixed => quasi_interest::normalize_difference(quasi_fixed, quasi_floating),
        }
    }

    /// Value of the swap for its buyer, bounded by +/- collateral
    pub fn get_payoff(&self, timestamp: i64, ibt_price: u128) -> Result<i128> {
        let value = self.get_unbounded_value(timestamp, ibt_price)?;
        let collateral = math::checked_as_i128(self.collateral)?;
        Ok(num::clamp(value, -collateral, collateral))
    }
}
