//! SOAP indicator
//!
//! Aggregate exposure of one leg: total notional, total IBT quantity, the
//! notional weighted average fixed rate and the fixed interest accrued up to
//! the last rebalance. The sum of all open positions (SOAP) at any time
//! follows from these figures without visiting individual swaps. SOAP is
//! reported from the pool's side: it is the negated sum of the traders'
//! position values.

use {
    crate::{
        error::IporError,
        math::{self, QuasiAmount, U256},
        state::{quasi_interest, swap::Leg},
    },
    anchor_lang::prelude::*,
};

#[derive(Copy, Clone, PartialEq, AnchorSerialize, AnchorDeserialize, Default, Debug)]
pub struct SoapIndicator {
    pub rebalance_timestamp: i64,
    pub total_notional: u128,
    pub total_ibt_quantity: u128,
    /// Notional weighted average fixed rate, for reporting
    pub average_interest_rate: u128,
    /// Exact sum of `notional * fixed_rate`, drives the interest accrual
    pub weighted_interest_rate_sum: QuasiAmount,
    /// Fixed interest accrued by all swaps up to `rebalance_timestamp`
    pub quasi_hypothetical_interest_cumulative: QuasiAmount,
}

impl SoapIndicator {
    /// Fixed interest accrued by `notional` at `rate` between two timestamps
    pub fn get_quasi_hypothetical_interest_delta(
        timestamp: i64,
        from_timestamp: i64,
        notional: u128,
        rate: u128,
    ) -> Result<U256> {
        require!(timestamp >= from_timestamp, IporError::InvalidTimestamp);
        let period = math::checked_as_u128(math::checked_sub(timestamp, from_timestamp)?)?;
        quasi_interest::quasi_interest_fixed_accrued(notional, rate, period)
    }

    pub fn get_quasi_hypothetical_interest_total(&self, timestamp: i64) -> Result<U256> {
        require!(
            timestamp >= self.rebalance_timestamp,
            IporError::InvalidTimestamp
        );
        let period = math::checked_as_u128(math::checked_sub(timestamp, self.rebalance_timestamp)?)?;
        math::checked_u256_add(
            U256::from(self.quasi_hypothetical_interest_cumulative),
            math::checked_u256_mul(
                U256::from(self.weighted_interest_rate_sum),
                U256::from(period),
            )?,
        )
    }

    fn get_average_interest_rate(weighted_sum: U256, total_notional: u128) -> Result<u128> {
        if total_notional == 0 {
            return Ok(0);
        }
        math::u256_as_u128(math::checked_u256_div_round(
            weighted_sum,
            U256::from(total_notional),
        )?)
    }

    pub fn rebalance_on_open(
        &mut self,
        timestamp: i64,
        notional: u128,
        rate: u128,
        ibt_quantity: u128,
    ) -> Result<()> {
        let cumulative = self.get_quasi_hypothetical_interest_total(timestamp)?;
        let weighted_sum = math::checked_u256_add(
            U256::from(self.weighted_interest_rate_sum),
            math::checked_u256_mul(U256::from(notional), U256::from(rate))?,
        )?;
        let total_notional = math::checked_add(self.total_notional, notional)?;

        *self = SoapIndicator {
            rebalance_timestamp: timestamp,
            total_notional,
            total_ibt_quantity: math::checked_add(self.total_ibt_quantity, ibt_quantity)?,
            average_interest_rate: Self::get_average_interest_rate(weighted_sum, total_notional)?,
            weighted_interest_rate_sum: weighted_sum.into(),
            quasi_hypothetical_interest_cumulative: cumulative.into(),
        };
        Ok(())
    }

    pub fn rebalance_on_close(
        &mut self,
        timestamp: i64,
        open_timestamp: i64,
        notional: u128,
        rate: u128,
        ibt_quantity: u128,
    ) -> Result<()> {
        if notional > self.total_notional {
            msg!(
                "Error: Closed notional {} exceeds tracked notional {}",
                notional,
                self.total_notional
            );
            return err!(IporError::SoapNotionalUnderflow);
        }
        if notional == self.total_notional {
            *self = SoapIndicator {
                rebalance_timestamp: timestamp,
                ..Default::default()
            };
            return Ok(());
        }

        let cumulative = math::checked_u256_sub(
            self.get_quasi_hypothetical_interest_total(timestamp)?,
            Self::get_quasi_hypothetical_interest_delta(timestamp, open_timestamp, notional, rate)?,
        )?;
        let weighted_sum = math::checked_u256_sub(
            U256::from(self.weighted_interest_rate_sum),
            math::checked_u256_mul(U256::from(notional), U256::from(rate))?,
        )?;
        let total_notional = math::checked_sub(self.total_notional, notional)?;

        *self = SoapIndicator {
            rebalance_timestamp: timestamp,
            total_notional,
            total_ibt_quantity: math::checked_sub(self.total_ibt_quantity, ibt_quantity)?,
            average_interest_rate: Self::get_average_interest_rate(weighted_sum, total_notional)?,
            weighted_interest_rate_sum: weighted_sum.into(),
            quasi_hypothetical_interest_cumulative: cumulative.into(),
        };
        Ok(())
    }

    /// Unrealized result of all open positions of `leg` at `timestamp`, from
    /// the pool's point of view. Negative when the pool owes the traders.
    pub fn get_soap(&self, leg: Leg, timestamp: i64, ibt_price: u128) -> Result<i128> {
        let quasi_fixed = math::checked_u256_add(
            math::checked_u256_mul(
                U256::from(self.total_notional),
                quasi_interest::quasi_denominator(),
            )?,
            self.get_quasi_hypothetical_interest_total(timestamp)?,
        )?;
        let quasi_floating =
            quasi_interest::quasi_interest_floating(self.total_ibt_quantity, ibt_price)?;

        match leg {
            Leg::PayFixed => quasi_interest::normalize_difference(quasi_fixed, quasi_floating),
            Leg::ReceiveFixed => quasi_interest::normalize_difference(quasi_floating, quasi_fixed),
        }
    }
}
