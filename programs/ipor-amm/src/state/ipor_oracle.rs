//! Index oracle state and routines
//!
//! The oracle stores one published benchmark rate per asset. Every
//! publication accrues the interest bearing token (IBT) price at the
//! previously published rate and refreshes the exponential moving average
//! and exponentially weighted moving variance used by the spread model.

use {
    crate::{
        error::IporError,
        math::{self, U256, WAD, YEAR_IN_SECONDS},
    },
    anchor_lang::prelude::*,
};

/// Updater allow-list and smoothing parameters shared by all indexes
#[account]
#[derive(Default, Debug)]
pub struct IporOracle {
    /// Accounts allowed to publish index values
    pub updaters: Vec<Pubkey>,
    /// Elapsed seconds after which the weight of the previous average halves
    pub decay_half_life: u32,
    pub bump: u8,
}

/// Published index of a single asset
#[account]
#[derive(Default, Debug)]
pub struct IporIndex {
    /// Asset mint the index is published for
    pub asset: Pubkey,
    /// Annualized benchmark rate
    pub index_value: u128,
    /// Price of the interest bearing token, zero until first publication
    pub ibt_price: u128,
    /// Time of the last publication, IBT price is accrued from there
    pub last_update_timestamp: i64,
    /// Smoothed index value, bounds the quoted fixed rates
    pub exponential_moving_average: u128,
    /// Smoothed squared distance of the index from its average
    pub exponential_weighted_moving_variance: u128,
    pub bump: u8,
}

/// Index snapshot with the IBT price accrued to a given time
#[derive(Copy, Clone, PartialEq, AnchorSerialize, AnchorDeserialize, Default, Debug)]
pub struct AccruedIndex {
    /// Last published rate
    pub index_value: u128,
    /// IBT price accrued to the requested time, not persisted
    pub ibt_price: u128,
    pub last_update_timestamp: i64,
    pub exponential_moving_average: u128,
    pub exponential_weighted_moving_variance: u128,
}

impl IporOracle {
    pub const MAX_UPDATERS: usize = 8;
    pub const LEN: usize = 8 + 4 + Self::MAX_UPDATERS * 32 + 4 + 1;
    pub const DEFAULT_DECAY_HALF_LIFE: u32 = 86_400;

    pub fn validate(&self) -> bool {
        if self.decay_half_life == 0 || self.updaters.len() > Self::MAX_UPDATERS {
            return false;
        }
        for (idx, updater) in self.updaters.iter().enumerate() {
            if self.updaters[..idx].contains(updater) {
                return false;
            }
        }
        true
    }

    pub fn check_updater(&self, key: &Pubkey) -> Result<()> {
        if self.updaters.contains(key) {
            Ok(())
        } else {
            msg!("Error: {} is not an index updater", key);
            err!(IporError::CallerNotIndexUpdater)
        }
    }
}

impl IporIndex {
    pub const LEN: usize = 8 + std::mem::size_of::<IporIndex>();

    pub fn is_published(&self) -> bool {
        self.ibt_price != 0
    }

    /// Returns the index as it would be after publishing `index_value` at
    /// `timestamp`. The stored state is left untouched so batch updates can
    /// validate every asset before writing any of them.
    pub fn get_updated(&self, index_value: u128, timestamp: i64, decay_half_life: u32) -> Result<IporIndex> {
        if !self.is_published() {
            return Ok(IporIndex {
                index_value,
                ibt_price: WAD,
                last_update_timestamp: timestamp,
                exponential_moving_average: index_value,
                exponential_weighted_moving_variance: 0,
                ..*self
            });
        }

        if timestamp < self.last_update_timestamp {
            msg!(
                "Error: Index update at {} is older than the stored one at {}",
                timestamp,
                self.last_update_timestamp
            );
            return err!(IporError::StaleIndexUpdate);
        }
        let elapsed = math::checked_as_u128(math::checked_sub(timestamp, self.last_update_timestamp)?)?;

        let ibt_price = Self::get_accrued_ibt_price(self.ibt_price, self.index_value, elapsed)?;
        let decay = Self::get_decay_factor(elapsed, decay_half_life)?;
        let ema = Self::get_exponential_moving_average(self.exponential_moving_average, index_value, decay)?;
        let ewmv = Self::get_exponential_weighted_moving_variance(
            self.exponential_weighted_moving_variance,
            ema,
            index_value,
            decay,
        )?;

        Ok(IporIndex {
            index_value,
            ibt_price,
            last_update_timestamp: timestamp,
            exponential_moving_average: ema,
            exponential_weighted_moving_variance: ewmv,
            ..*self
        })
    }

    pub fn update(&mut self, index_value: u128, timestamp: i64, decay_half_life: u32) -> Result<()> {
        *self = self.get_updated(index_value, timestamp, decay_half_life)?;
        Ok(())
    }

    /// Computes a publication covering several assets. `indexes[i]` must be
    /// the stored index of `assets[i]` and receives `index_values[i]`. Any
    /// invalid entry fails the whole batch, and an asset may appear only
    /// once since every update starts from the stored state.
    pub fn get_batch_updated(
        indexes: &[IporIndex],
        assets: &[Pubkey],
        index_values: &[u128],
        timestamp: i64,
        decay_half_life: u32,
    ) -> Result<Vec<IporIndex>> {
        if assets.len() != index_values.len() || assets.len() != indexes.len() {
            msg!(
                "Error: {} assets, {} values and {} indexes",
                assets.len(),
                index_values.len(),
                indexes.len()
            );
            return err!(IporError::ArityMismatch);
        }

        let mut updates = Vec::with_capacity(indexes.len());
        for (idx, (index, asset)) in indexes.iter().zip(assets).enumerate() {
            if assets[..idx].contains(asset) {
                msg!("Error: Asset {} is listed more than once", asset);
                return err!(IporError::DuplicateAsset);
            }
            require_keys_eq!(index.asset, *asset, IporError::IndexAssetMismatch);
            updates.push(index.get_updated(index_values[idx], timestamp, decay_half_life)?);
        }

        Ok(updates)
    }

    /// Snapshot with the IBT price accrued from the last publication to `timestamp`
    pub fn get_accrued(&self, timestamp: i64) -> Result<AccruedIndex> {
        require!(self.is_published(), IporError::IndexNotPublished);
        require!(
            timestamp >= self.last_update_timestamp,
            IporError::InvalidTimestamp
        );
        let elapsed = math::checked_as_u128(math::checked_sub(timestamp, self.last_update_timestamp)?)?;

        Ok(AccruedIndex {
            index_value: self.index_value,
            ibt_price: Self::get_accrued_ibt_price(self.ibt_price, self.index_value, elapsed)?,
            last_update_timestamp: self.last_update_timestamp,
            exponential_moving_average: self.exponential_moving_average,
            exponential_weighted_moving_variance: self.exponential_weighted_moving_variance,
        })
    }

    /// `ibt_price * (1 + index_value * elapsed / YEAR)`, rounded down.
    /// Never decreases since the index value is non-negative.
    pub fn get_accrued_ibt_price(ibt_price: u128, index_value: u128, elapsed: u128) -> Result<u128> {
        let year = U256::from(WAD) * U256::from(YEAR_IN_SECONDS);
        let growth = math::checked_u256_add(
            year,
            math::checked_u256_mul(U256::from(index_value), U256::from(elapsed))?,
        )?;
        math::u256_as_u128(math::checked_u256_div(
            math::checked_u256_mul(U256::from(ibt_price), growth)?,
            year,
        )?)
    }

    /// Weight of the previous average after `elapsed` seconds. Halves every
    /// `decay_half_life` seconds and is linear inside each half-life.
    pub fn get_decay_factor(elapsed: u128, decay_half_life: u32) -> Result<u128> {
        if decay_half_life == 0 {
            return err!(IporError::InvalidOracleConfig);
        }
        let half_life = decay_half_life as u128;
        let halvings = elapsed / half_life;
        if halvings >= 64 {
            return Ok(0);
        }
        let start = WAD >> halvings;
        let decline = math::checked_mul_div_floor(start / 2, elapsed % half_life, half_life)?;
        math::checked_sub(start, decline)
    }

    pub fn get_exponential_moving_average(last_ema: u128, index_value: u128, decay: u128) -> Result<u128> {
        let weighted = math::checked_add(
            math::checked_mul(decay, last_ema)?,
            math::checked_mul(math::checked_sub(WAD, decay)?, index_value)?,
        )?;
        math::checked_div_round(weighted, WAD)
    }

    pub fn get_exponential_weighted_moving_variance(
        last_ewmv: u128,
        ema: u128,
        index_value: u128,
        decay: u128,
    ) -> Result<u128> {
        let diff = U256::from(index_value.abs_diff(ema));
        let wad = U256::from(WAD);
        let new_term = math::checked_u256_mul(
            U256::from(math::checked_sub(WAD, decay)?),
            math::checked_u256_mul(diff, diff)?,
        )?;
        let inner = math::checked_u256_add(
            math::checked_u256_mul(U256::from(last_ewmv), wad * wad)?,
            new_term,
        )?;
        math::u256_as_u128(math::checked_u256_div_round(
            math::checked_u256_mul(U256::from(decay), inner)?,
            wad * wad * wad,
        )?)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const HALF_LIFE: u32 = 86_400;

    fn rate(percent: u128) -> u128 {
        percent * WAD / 100
    }

    fn get_fixture() -> IporIndex {
        let mut index = IporIndex {
            asset: Pubkey::new_unique(),
            ..Default::default()
        };
        index.update(rate(3), 1_000_000, HALF_LIFE).unwrap();
        index
    }

    #[test]
    fn test_first_update() {
        let index = get_fixture();

        assert!(index.is_published());
        assert_eq!(index.index_value, rate(3));
        assert_eq!(index.ibt_price, WAD);
        assert_eq!(index.exponential_moving_average, rate(3));
        assert_eq!(index.exponential_weighted_moving_variance, 0);
        assert_eq!(index.last_update_timestamp, 1_000_000);
    }

    #[test]
    fn test_stale_update() {
        let index = get_fixture();

        assert_eq!(
            index.get_updated(rate(4), 999_999, HALF_LIFE).unwrap_err(),
            error!(IporError::StaleIndexUpdate)
        );
        assert!(index.get_updated(rate(4), 1_000_000, HALF_LIFE).is_ok());
    }

    #[test]
    fn test_ibt_price_accrual() {
        let mut index = get_fixture();
        index
            .update(rate(5), 1_000_000 + YEAR_IN_SECONDS as i64, HALF_LIFE)
            .unwrap();

        // a full year at the previously published 3%
        assert_eq!(index.ibt_price, WAD + rate(3));
        assert_eq!(index.index_value, rate(5));
    }

    #[test]
    fn test_ibt_price_monotonic() {
        let mut index = get_fixture();
        let values = [rate(0), rate(7), 0, rate(1), rate(2)];
        let mut last_price = index.ibt_price;
        let mut timestamp = index.last_update_timestamp;

        for value in values {
            timestamp += 3_600;
            index.update(value, timestamp, HALF_LIFE).unwrap();
            assert!(index.ibt_price >= last_price);
            last_price = index.ibt_price;
        }

        // same-time republication does not move the price
        index.update(rate(9), timestamp, HALF_LIFE).unwrap();
        assert_eq!(index.ibt_price, last_price);
    }

    #[test]
    fn test_accrued_index() {
        let index = get_fixture();

        let accrued = index.get_accrued(1_000_000 + YEAR_IN_SECONDS as i64).unwrap();
        assert_eq!(accrued.ibt_price, WAD + rate(3));
        assert_eq!(accrued.index_value, rate(3));

        assert_eq!(
            index.get_accrued(999_000).unwrap_err(),
            error!(IporError::InvalidTimestamp)
        );
        assert_eq!(
            IporIndex::default().get_accrued(0).unwrap_err(),
            error!(IporError::IndexNotPublished)
        );
    }

    #[test]
    fn test_decay_factor() {
        let half_life = HALF_LIFE as u128;

        assert_eq!(IporIndex::get_decay_factor(0, HALF_LIFE).unwrap(), WAD);
        assert_eq!(IporIndex::get_decay_factor(half_life, HALF_LIFE).unwrap(), WAD / 2);
        assert_eq!(
            IporIndex::get_decay_factor(half_life / 2, HALF_LIFE).unwrap(),
            WAD * 3 / 4
        );
        assert_eq!(
            IporIndex::get_decay_factor(half_life * 3 / 2, HALF_LIFE).unwrap(),
            WAD * 3 / 8
        );
        assert_eq!(IporIndex::get_decay_factor(half_life * 100, HALF_LIFE).unwrap(), 0);
        assert!(IporIndex::get_decay_factor(1, 0).is_err());
    }

    #[test]
    fn test_moving_average_and_variance() {
        let ema = IporIndex::get_exponential_moving_average(rate(3), rate(5), WAD / 2).unwrap();
        assert_eq!(ema, rate(4));

        // value on the average leaves only the decayed previous variance
        let ewmv = IporIndex::get_exponential_weighted_moving_variance(1_000, rate(4), rate(4), WAD / 2)
            .unwrap();
        assert_eq!(ewmv, 500);

        // d * (1 - d) * diff^2 = 0.25 * 0.01^2
        let ewmv = IporIndex::get_exponential_weighted_moving_variance(0, rate(4), rate(5), WAD / 2)
            .unwrap();
        assert_eq!(ewmv, 25_000_000_000_000);

        let mut index = get_fixture();
        index.update(rate(5), 1_000_000 + HALF_LIFE as i64, HALF_LIFE).unwrap();
        assert_eq!(index.exponential_moving_average, rate(4));
        assert!(index.exponential_weighted_moving_variance > 0);
    }

    #[test]
    fn test_batch_update() {
        let first = get_fixture();
        let second = IporIndex {
            asset: Pubkey::new_unique(),
            ..Default::default()
        };
        let indexes = [first.clone(), second.clone()];
        let assets = [first.asset, second.asset];
        let timestamp = 1_000_000 + YEAR_IN_SECONDS as i64;

        let updates =
            IporIndex::get_batch_updated(&indexes, &assets, &[rate(5), rate(2)], timestamp, HALF_LIFE)
                .unwrap();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].asset, first.asset);
        assert_eq!(updates[0].index_value, rate(5));
        assert_eq!(updates[0].ibt_price, WAD + rate(3));
        assert_eq!(updates[1].asset, second.asset);
        assert_eq!(updates[1].ibt_price, WAD);
        assert_eq!(updates[1].last_update_timestamp, timestamp);
    }

    #[test]
    fn test_batch_update_rejected_as_a_whole() {
        let first = get_fixture();
        let second = IporIndex {
            asset: Pubkey::new_unique(),
            ..Default::default()
        };
        let indexes = [first.clone(), second.clone()];
        let assets = [first.asset, second.asset];

        assert_eq!(
            IporIndex::get_batch_updated(&indexes, &assets, &[rate(5)], 1_000_000, HALF_LIFE)
                .unwrap_err(),
            error!(IporError::ArityMismatch)
        );

        // the first entry is stale, so the valid second one is not applied either
        assert_eq!(
            IporIndex::get_batch_updated(&indexes, &assets, &[rate(5), rate(2)], 999_999, HALF_LIFE)
                .unwrap_err(),
            error!(IporError::StaleIndexUpdate)
        );

        assert_eq!(
            IporIndex::get_batch_updated(
                &[first.clone(), first.clone()],
                &[first.asset, first.asset],
                &[rate(3), rate(9)],
                1_000_000,
                HALF_LIFE
            )
            .unwrap_err(),
            error!(IporError::DuplicateAsset)
        );

        assert_eq!(
            IporIndex::get_batch_updated(
                &indexes,
                &[second.asset, first.asset],
                &[rate(5), rate(2)],
                1_000_000,
                HALF_LIFE
            )
            .unwrap_err(),
            error!(IporError::IndexAssetMismatch)
        );
    }

    #[test]
    fn test_oracle_validate() {
        let updater = Pubkey::new_unique();
        let mut oracle = IporOracle {
            updaters: vec![updater],
            decay_half_life: HALF_LIFE,
            bump: 255,
        };
        assert!(oracle.validate());
        assert!(oracle.check_updater(&updater).is_ok());
        assert_eq!(
            oracle.check_updater(&Pubkey::new_unique()).unwrap_err(),
            error!(IporError::CallerNotIndexUpdater)
        );

        oracle.updaters.push(updater);
        assert!(!oracle.validate());
    }
}
