//! Spread model
//!
//! The quoted fixed rate is the index moved by a spread that reacts to
//! volatility (EWMV) and to the distance between the index and its moving
//! average. Each leg has two parameter regions selected by the leg's
//! utilization, and its own spread band.

use {
    crate::{
        math::{self, WAD},
        state::{ipor_oracle::AccruedIndex, swap::Leg},
    },
    anchor_lang::prelude::*,
};

/// Spread formula for one utilization range. All terms are signed 18
/// decimal fractions.
#[derive(Copy, Clone, PartialEq, AnchorSerialize, AnchorDeserialize, Default, Debug)]
pub struct SpreadRegion {
    pub base: i128,
    /// Weight of the index variance
    pub slope_for_volatility: i128,
    /// Weight of the distance between the index and its moving average
    pub slope_for_mean_reversion: i128,
}

#[derive(Copy, Clone, PartialEq, AnchorSerialize, AnchorDeserialize, Default, Debug)]
pub struct LegSpreadParams {
    pub region_one: SpreadRegion,
    pub region_two: SpreadRegion,
    /// Leg utilization from which region two applies
    pub region_two_utilization_threshold: u128,
    /// Bounds the computed spread is clamped to
    pub min_spread: i128,
    pub max_spread: i128,
}

#[derive(Copy, Clone, PartialEq, AnchorSerialize, AnchorDeserialize, Default, Debug)]
pub struct SpreadParams {
    pub pay_fixed: LegSpreadParams,
    pub receive_fixed: LegSpreadParams,
}

impl SpreadRegion {
    /// `(slope_vol * ewmv + slope_mr * (index - ema)) / WAD`
    pub fn get_adjustment(&self, ewmv: u128, index_minus_ema: i128) -> Result<i128> {
        let volatility_term =
            math::checked_mul(self.slope_for_volatility, math::checked_as_i128(ewmv)?)?;
        let mean_reversion_term = math::checked_mul(self.slope_for_mean_reversion, index_minus_ema)?;
        math::checked_div(
            math::checked_add(volatility_term, mean_reversion_term)?,
            WAD as i128,
        )
    }
}

impl LegSpreadParams {
    pub fn validate(&self) -> bool {
        self.min_spread <= self.max_spread && self.region_two_utilization_threshold <= WAD
    }

    pub fn get_region(&self, utilization_leg: u128) -> &SpreadRegion {
        if utilization_leg < self.region_two_utilization_threshold {
            &self.region_one
        } else {
            &self.region_two
        }
    }

    pub fn get_spread(&self, utilization_leg: u128, ewmv: u128, index_minus_ema: i128) -> Result<i128> {
        let region = self.get_region(utilization_leg);
        let spread = math::checked_add(region.base, region.get_adjustment(ewmv, index_minus_ema)?)?;
        Ok(num::clamp(spread, self.min_spread, self.max_spread))
    }
}

impl SpreadParams {
    pub fn validate(&self) -> bool {
        self.pay_fixed.validate() && self.receive_fixed.validate()
    }

    pub fn get_leg(&self, leg: Leg) -> &LegSpreadParams {
        match leg {
            Leg::PayFixed => &self.pay_fixed,
            Leg::ReceiveFixed => &self.receive_fixed,
        }
    }

    /// Fixed rate quoted for a new swap on `leg`
    pub fn get_quote(&self, leg: Leg, utilization_leg: u128, index: &AccruedIndex) -> Result<u128> {
        let index_value = math::checked_as_i128(index.index_value)?;
        let ema = math::checked_as_i128(index.exponential_moving_average)?;
        let spread = self.get_leg(leg).get_spread(
            utilization_leg,
            index.exponential_weighted_moving_variance,
            math::checked_sub(index_value, ema)?,
        )?;

        let quote = match leg {
            Leg::PayFixed => std::cmp::max(math::checked_add(index_value, spread)?, ema),
            Leg::ReceiveFixed => std::cmp::min(
                std::cmp::max(math::checked_sub(index_value, spread)?, 0),
                ema,
            ),
        };
        math::checked_as_u128(quote)
    }
}
