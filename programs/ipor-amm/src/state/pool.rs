//! Pool state and logic
//!
//! One pool exists per asset. It owns the liquidity ledger, the SOAP
//! indicators of both legs and the configuration that bounds swaps and
//! liquidity operations. Handlers compute everything through the methods
//! below on copies of the ledger and commit only once every guard passed,
//! so a failing call never leaves a partial update behind.

use {
    crate::{
        error::IporError,
        math::{self, WAD, WAD_DECIMALS},
        state::{
            ipor_oracle::AccruedIndex,
            soap_indicator::SoapIndicator,
            spread::SpreadParams,
            swap::{Leg, Swap, SwapState},
        },
    },
    anchor_lang::prelude::*,
};

/// Ledger balances, all in 18 decimals
#[derive(Copy, Clone, PartialEq, AnchorSerialize, AnchorDeserialize, Default, Debug)]
pub struct Balance {
    /// Liquidity providers' reserve
    pub liquidity_pool: u128,
    /// Collateral locked by open pay-fixed swaps
    pub total_collateral_pay_fixed: u128,
    /// Collateral locked by open receive-fixed swaps
    pub total_collateral_receive_fixed: u128,
    /// Fees owed to the treasury manager
    pub treasury: u128,
    /// Publication fees owed to the index publisher
    pub ipor_publication_fee: u128,
}

/// Pool parameters. Rates and ratios are 18-decimal fractions, amounts are
/// 18-decimal asset units.
#[derive(Copy, Clone, PartialEq, AnchorSerialize, AnchorDeserialize, Default, Debug)]
pub struct PoolConfig {
    /// Lowest notional to collateral ratio a swap may open with
    pub min_leverage: u128,
    /// Highest notional to collateral ratio
    pub max_leverage: u128,
    /// Charged per unit of leverage on the collateral
    pub opening_fee_rate: u128,
    /// Share of the opening fee routed to the treasury, the rest goes to the pool
    pub opening_fee_treasury_portion_rate: u128,
    /// Charged on trader gains at close
    pub income_fee_rate: u128,
    /// Charged on the gross redeemed amount, kept by the treasury
    pub redeem_fee_rate: u128,
    /// Flat amount escrowed at open, paid to whoever closes the swap
    pub liquidation_deposit_amount: u128,
    /// Flat fee per opened swap owed to the index publisher
    pub ipor_publication_fee_amount: u128,
    /// Largest collateral a single swap may lock
    pub max_swap_collateral_amount: u128,
    /// Cap on total collateral over the liquidity pool after an open
    pub max_utilization: u128,
    /// Same cap for the collateral of the opened leg alone
    pub max_utilization_per_leg: u128,
    /// Cap on total collateral over the liquidity pool left after a redeem
    pub max_redeem_utilization: u128,
    /// Deposits are refused once the liquidity pool would exceed this
    pub max_liquidity_pool_balance: u128,
    /// Cap on the net amount a single account may have provided
    pub max_lp_account_contribution: u128,
    /// Fraction of collateral a payoff must reach for anyone to close early,
    /// must be positive
    pub min_position_value_to_close_before_maturity: u128,
    /// Length of the window before maturity in which anyone may close
    pub seconds_before_maturity_when_position_can_be_closed: i64,
    /// Time from open to maturity
    pub swap_tenor: i64,
    /// Largest batch accepted by `close_swaps`
    pub max_swaps_per_close: u8,
}

/// Accounts allowed to move accumulated fees
#[derive(Copy, Clone, PartialEq, AnchorSerialize, AnchorDeserialize, Default, Debug)]
pub struct PoolRoles {
    /// Signer allowed to call `transfer_to_treasury`
    pub treasury_manager: Pubkey,
    /// Token account receiving the treasury
    pub treasury: Pubkey,
    /// Signer allowed to call `transfer_publication_fee`
    pub publication_fee_transferer: Pubkey,
    /// Token account receiving publication fees
    pub publication_fee_treasury: Pubkey,
}

/// Sum of all open swaps' results from the pool's side. Negative values
/// mean traders are in profit.
#[derive(Copy, Clone, PartialEq, AnchorSerialize, AnchorDeserialize, Default, Debug)]
pub struct Soap {
    pub soap_pay_fixed: i128,
    pub soap_receive_fixed: i128,
    /// Sum of both legs
    pub soap: i128,
}

/// Split of the amount paid at open
#[derive(Copy, Clone, PartialEq, Default, Debug)]
pub struct OpenSwapAmounts {
    pub collateral: u128,
    /// Collateral times leverage
    pub notional: u128,
    pub opening_fee: u128,
    pub opening_fee_treasury: u128,
    /// Remainder of the opening fee, added to the liquidity pool
    pub opening_fee_lp: u128,
}

#[derive(Copy, Clone, PartialEq, Default, Debug)]
pub struct OpenSwapRequest {
    pub buyer: Pubkey,
    pub leg: Leg,
    /// Collateral plus all fees and the liquidation deposit
    pub total_amount: u128,
    /// Worst fixed rate the buyer accepts
    pub acceptable_fixed_interest_rate: u128,
    pub leverage: u128,
}

/// Result of closing one swap
#[derive(Copy, Clone, PartialEq, Default, Debug)]
pub struct CloseSwapOutcome {
    /// Buyer's result, capped at the collateral on the losing side
    pub payoff: i128,
    /// Taken from a positive payoff, credited to the treasury
    pub income_fee: u128,
    /// Owed to the buyer, liquidation deposit included when the buyer closed
    pub buyer_amount: u128,
    /// Liquidation deposit owed to a closer other than the buyer
    pub closer_amount: u128,
}

#[derive(Copy, Clone, PartialEq, Default, Debug)]
pub struct RedeemAmounts {
    /// Asset value of one share before the redeem
    pub exchange_rate: u128,
    /// Value of the redeemed shares, removed from the liquidity pool
    pub gross_amount: u128,
    pub fee: u128,
    /// Gross amount less the fee, owed to the redeemer
    pub payout: u128,
}

#[account]
#[derive(Default, Debug)]
pub struct Pool {
    /// Asset mint
    pub asset: Pubkey,
    /// Decimals of the asset mint, ledger amounts are scaled to 18
    pub decimals: u8,
    /// Liquidity, collateral and fee balances
    pub balance: Balance,
    /// Aggregate exposure of open pay-fixed swaps
    pub soap_pay_fixed: SoapIndicator,
    /// Aggregate exposure of open receive-fixed swaps
    pub soap_receive_fixed: SoapIndicator,
    /// Fees, caps and closing rules, replaced by `set_pool_config`
    pub config: PoolConfig,
    /// Quote parameters for both legs
    pub spread: SpreadParams,
    pub roles: PoolRoles,
    /// Id given to the next opened swap
    pub next_swap_id: u64,

    pub bump: u8,
    /// Bump of the `pool_token_account` PDA holding the asset
    pub token_account_bump: u8,
    /// Bump of the `share_mint` PDA
    pub share_mint_bump: u8,
    /// Time the pool was added
    pub inception_time: i64,
}

impl Balance {
    pub fn get_collateral(&self, leg: Leg) -> u128 {
        match leg {
            Leg::PayFixed => self.total_collateral_pay_fixed,
            Leg::ReceiveFixed => self.total_collateral_receive_fixed,
        }
    }

    /// Collateral of both legs
    pub fn get_total_collateral(&self) -> Result<u128> {
        math::checked_add(
            self.total_collateral_pay_fixed,
            self.total_collateral_receive_fixed,
        )
    }

    pub fn add_liquidity(&mut self, amount: u128) -> Result<()> {
        self.liquidity_pool = math::checked_add(self.liquidity_pool, amount)?;
        Ok(())
    }

    /// Fails instead of letting the liquidity pool go below zero
    pub fn subtract_liquidity(&mut self, amount: u128) -> Result<()> {
        if amount > self.liquidity_pool {
            msg!(
                "Error: Liquidity pool balance {} cannot cover {}",
                self.liquidity_pool,
                amount
            );
            return err!(IporError::LiquidityPoolTooLow);
        }
        self.liquidity_pool -= amount;
        Ok(())
    }

    pub fn add_collateral(&mut self, leg: Leg, amount: u128) -> Result<()> {
        match leg {
            Leg::PayFixed => {
                self.total_collateral_pay_fixed =
                    math::checked_add(self.total_collateral_pay_fixed, amount)?
            }
            Leg::ReceiveFixed => {
                self.total_collateral_receive_fixed =
                    math::checked_add(self.total_collateral_receive_fixed, amount)?
            }
        }
        Ok(())
    }

    pub fn subtract_collateral(&mut self, leg: Leg, amount: u128) -> Result<()> {
        match leg {
            Leg::PayFixed => {
                self.total_collateral_pay_fixed =
                    math::checked_sub(self.total_collateral_pay_fixed, amount)?
            }
            Leg::ReceiveFixed => {
                self.total_collateral_receive_fixed =
                    math::checked_sub(self.total_collateral_receive_fixed, amount)?
            }
        }
        Ok(())
    }
}

impl PoolConfig {
    /// Rates within [0, WAD], ordered leverage and utilization caps, a
    /// positive early-close threshold and a closing window inside the tenor
    pub fn validate(&self) -> bool {
        self.min_leverage >= WAD
            && self.min_leverage <= self.max_leverage
            && self.opening_fee_rate <= WAD
            && self.opening_fee_treasury_portion_rate <= WAD
            && self.income_fee_rate <= WAD
            && self.redeem_fee_rate < WAD
            && self.max_utilization <= WAD
            && self.max_utilization_per_leg <= self.max_utilization
            && self.max_redeem_utilization <= WAD
            && self.min_position_value_to_close_before_maturity > 0
            && self.min_position_value_to_close_before_maturity <= WAD
            && self.swap_tenor > 0
            && self.seconds_before_maturity_when_position_can_be_closed >= 0
            && self.seconds_before_maturity_when_position_can_be_closed <= self.swap_tenor
            && self.max_swaps_per_close > 0
    }
}

impl Pool {
    pub const LEN: usize = 8 + std::mem::size_of::<Pool>();

    pub fn validate(&self) -> bool {
        self.decimals <= WAD_DECIMALS && self.config.validate() && self.spread.validate()
    }

    pub fn get_soap_indicator(&self, leg: Leg) -> &SoapIndicator {
        match leg {
            Leg::PayFixed => &self.soap_pay_fixed,
            Leg::ReceiveFixed => &self.soap_receive_fixed,
        }
    }

    fn get_soap_indicator_mut(&mut self, leg: Leg) -> &mut SoapIndicator {
        match leg {
            Leg::PayFixed => &mut self.soap_pay_fixed,
            Leg::ReceiveFixed => &mut self.soap_receive_fixed,
        }
    }

    /// Collateral over liquidity, saturating when the pool is empty
    pub fn get_utilization(collateral: u128, liquidity_pool: u128) -> Result<u128> {
        if collateral == 0 {
            Ok(0)
        } else if liquidity_pool == 0 {
            Ok(u128::MAX)
        } else {
            math::checked_mul_div_round(collateral, WAD, liquidity_pool)
        }
    }

    /// Splits the amount paid by a trader into collateral and fees.
    /// The opening fee is proportional to the notional, so collateral solves
    /// `available = collateral * (1 + leverage * opening_fee_rate)`.
    pub fn get_swap_amounts(&self, total_amount: u128, leverage: u128) -> Result<OpenSwapAmounts> {
        let config = &self.config;
        let fixed_fees = math::checked_add(
            config.liquidation_deposit_amount,
            config.ipor_publication_fee_amount,
        )?;
        if total_amount <= fixed_fees {
            msg!(
                "Error: Total amount {} does not cover fees of {}",
                total_amount,
                fixed_fees
            );
            return err!(IporError::TotalAmountBelowFees);
        }
        let available = math::checked_sub(total_amount, fixed_fees)?;

        let fee_multiplier = math::checked_add(
            WAD,
            math::checked_mul_div_round(leverage, config.opening_fee_rate, WAD)?,
        )?;
        let collateral = math::checked_mul_div_round(available, WAD, fee_multiplier)?;
        let notional = math::checked_mul_div_round(collateral, leverage, WAD)?;
        let opening_fee = math::checked_sub(available, collateral)?;
        let opening_fee_treasury = math::checked_mul_div_round(
            opening_fee,
            config.opening_fee_treasury_portion_rate,
            WAD,
        )?;

        Ok(OpenSwapAmounts {
            collateral,
            notional,
            opening_fee,
            opening_fee_treasury,
            opening_fee_lp: math::checked_sub(opening_fee, opening_fee_treasury)?,
        })
    }

    /// Books a new swap. The returned swap still needs its pool address and
    /// bump filled in by the caller.
    pub fn open_swap(
        &mut self,
        request: &OpenSwapRequest,
        index: &AccruedIndex,
        timestamp: i64,
    ) -> Result<Swap> {
        let config = self.config;
        let leg = request.leg;

        require!(request.total_amount > 0, IporError::InvalidAmount);
        if request.leverage < config.min_leverage || request.leverage > config.max_leverage {
            msg!(
                "Error: Leverage {} is outside of [{}, {}]",
                request.leverage,
                config.min_leverage,
                config.max_leverage
            );
            return err!(IporError::LeverageOutOfRange);
        }

        let amounts = self.get_swap_amounts(request.total_amount, request.leverage)?;
        if amounts.collateral > config.max_swap_collateral_amount {
            msg!(
                "Error: Collateral {} exceeds max {}",
                amounts.collateral,
                config.max_swap_collateral_amount
            );
            return err!(IporError::CollateralTooHigh);
        }

        let mut balance = self.balance;
        balance.add_liquidity(amounts.opening_fee_lp)?;
        balance.add_collateral(leg, amounts.collateral)?;
        balance.treasury = math::checked_add(balance.treasury, amounts.opening_fee_treasury)?;
        balance.ipor_publication_fee = math::checked_add(
            balance.ipor_publication_fee,
            config.ipor_publication_fee_amount,
        )?;

        let utilization =
            Self::get_utilization(balance.get_total_collateral()?, balance.liquidity_pool)?;
        if utilization > config.max_utilization {
            msg!("Error: Utilization {} exceeds max {}", utilization, config.max_utilization);
            return err!(IporError::UtilizationExceeded);
        }
        let utilization_leg =
            Self::get_utilization(balance.get_collateral(leg), balance.liquidity_pool)?;
        if utilization_leg > config.max_utilization_per_leg {
            msg!(
                "Error: Leg utilization {} exceeds max {}",
                utilization_leg,
                config.max_utilization_per_leg
            );
            return err!(IporError::UtilizationPerLegExceeded);
        }

        let fixed_interest_rate = self.spread.get_quote(leg, utilization_leg, index)?;
        let acceptable = match leg {
            Leg::PayFixed => fixed_interest_rate <= request.acceptable_fixed_interest_rate,
            Leg::ReceiveFixed => fixed_interest_rate >= request.acceptable_fixed_interest_rate,
        };
        if !acceptable {
            msg!(
                "Error: Quoted rate {} does not satisfy acceptable rate {}",
                fixed_interest_rate,
                request.acceptable_fixed_interest_rate
            );
            return err!(IporError::AcceptableFixedRateExceeded);
        }

        let ibt_quantity = math::checked_mul_div_round(amounts.notional, WAD, index.ibt_price)?;
        let mut indicator = *self.get_soap_indicator(leg);
        indicator.rebalance_on_open(
            timestamp,
            amounts.notional,
            fixed_interest_rate,
            ibt_quantity,
        )?;

        let swap = Swap {
            id: self.next_swap_id,
            pool: Pubkey::default(),
            asset: self.asset,
            buyer: request.buyer,
            leg,
            state: SwapState::Active,
            collateral: amounts.collateral,
            notional: amounts.notional,
            fixed_interest_rate,
            ibt_quantity,
            opening_fee_amount: amounts.opening_fee,
            liquidation_deposit_amount: config.liquidation_deposit_amount,
            open_timestamp: timestamp,
            end_timestamp: math::checked_add(timestamp, config.swap_tenor)?,
            close_timestamp: 0,
            bump: 0,
        };

        self.balance = balance;
        *self.get_soap_indicator_mut(leg) = indicator;
        self.next_swap_id = math::checked_add(self.next_swap_id, 1)?;

        Ok(swap)
    }

    /// The buyer may close at any time, anyone else only close to maturity
    /// or once the payoff approaches the collateral.
    pub fn check_close_allowed(
        &self,
        swap: &Swap,
        closer: &Pubkey,
        timestamp: i64,
        payoff: i128,
    ) -> Result<()> {
        if *closer == swap.buyer {
            return Ok(());
        }
        let window_start = math::checked_sub(
            swap.end_timestamp,
            self.config.seconds_before_maturity_when_position_can_be_closed,
        )?;
        if timestamp >= window_start {
            return Ok(());
        }
        let threshold = math::checked_mul_div_round(
            swap.collateral,
            self.config.min_position_value_to_close_before_maturity,
            WAD,
        )?;
        if payoff.unsigned_abs() >= threshold {
            return Ok(());
        }
        msg!(
            "Error: Swap {} can only be closed by its buyer before {}",
            swap.id,
            window_start
        );
        err!(IporError::CloseNotAllowed)
    }

    /// Settles an active swap against the pool and marks it closed. Returns
    /// the amounts the caller has to transfer out of the pool token account.
    pub fn close_swap(
        &mut self,
        swap: &mut Swap,
        closer: &Pubkey,
        ibt_price: u128,
        timestamp: i64,
    ) -> Result<CloseSwapOutcome> {
        if !swap.is_active() {
            msg!("Error: Swap {} is not active", swap.id);
            return err!(IporError::SwapNotActive);
        }
        require_keys_eq!(swap.asset, self.asset, IporError::InvalidSwapAccount);

        let payoff = swap.get_payoff(timestamp, ibt_price)?;
        self.check_close_allowed(swap, closer, timestamp, payoff)?;

        let mut balance = self.balance;
        let payoff_abs = payoff.unsigned_abs();
        let (income_fee, mut buyer_amount) = if payoff > 0 {
            let income_fee =
                math::checked_mul_div_round(payoff_abs, self.config.income_fee_rate, WAD)?;
            balance.subtract_liquidity(payoff_abs)?;
            balance.treasury = math::checked_add(balance.treasury, income_fee)?;
            (
                income_fee,
                math::checked_sub(math::checked_add(swap.collateral, payoff_abs)?, income_fee)?,
            )
        } else {
            balance.add_liquidity(payoff_abs)?;
            (0, math::checked_sub(swap.collateral, payoff_abs)?)
        };
        balance.subtract_collateral(swap.leg, swap.collateral)?;

        let mut indicator = *self.get_soap_indicator(swap.leg);
        indicator.rebalance_on_close(
            timestamp,
            swap.open_timestamp,
            swap.notional,
            swap.fixed_interest_rate,
            swap.ibt_quantity,
        )?;

        let closer_amount = if *closer == swap.buyer {
            buyer_amount = math::checked_add(buyer_amount, swap.liquidation_deposit_amount)?;
            0
        } else {
            swap.liquidation_deposit_amount
        };

        self.balance = balance;
        *self.get_soap_indicator_mut(swap.leg) = indicator;
        swap.state = SwapState::Closed;
        swap.close_timestamp = timestamp;

        Ok(CloseSwapOutcome {
            payoff,
            income_fee,
            buyer_amount,
            closer_amount,
        })
    }

    /// SOAP of both legs at `timestamp` with the IBT price accrued to it
    pub fn calculate_soap(&self, ibt_price: u128, timestamp: i64) -> Result<Soap> {
        let soap_pay_fixed = self
            .soap_pay_fixed
            .get_soap(Leg::PayFixed, timestamp, ibt_price)?;
        let soap_receive_fixed = self
            .soap_receive_fixed
            .get_soap(Leg::ReceiveFixed, timestamp, ibt_price)?;

        Ok(Soap {
            soap_pay_fixed,
            soap_receive_fixed,
            soap: math::checked_add(soap_pay_fixed, soap_receive_fixed)?,
        })
    }

    /// Liquidity pool adjusted by the unrealized result of open swaps
    pub fn get_pool_value(&self, soap: i128) -> Result<i128> {
        math::checked_add(math::checked_as_i128(self.balance.liquidity_pool)?, soap)
    }

    /// Asset value of one share, WAD while no shares exist. Fails when the
    /// SOAP adjusted pool value is not positive.
    pub fn get_exchange_rate(&self, soap: i128, share_supply: u128) -> Result<u128> {
        if share_supply == 0 {
            return Ok(WAD);
        }
        let pool_value = self.get_pool_value(soap)?;
        if pool_value <= 0 {
            msg!(
                "Error: SOAP {} exceeds liquidity pool {}",
                soap,
                self.balance.liquidity_pool
            );
            return err!(IporError::SoapExceedsLiquidityPool);
        }
        math::checked_mul_div_round(pool_value as u128, WAD, share_supply)
    }

    /// Adds `amount` to the liquidity pool and returns the number of shares
    /// to mint.
    pub fn provide_liquidity(
        &mut self,
        amount: u128,
        soap: i128,
        share_supply: u128,
        contribution: &mut u128,
    ) -> Result<u128> {
        require!(amount > 0, IporError::InvalidAmount);

        let liquidity_pool = math::checked_add(self.balance.liquidity_pool, amount)?;
        if liquidity_pool > self.config.max_liquidity_pool_balance {
            msg!(
                "Error: Liquidity pool {} would exceed max {}",
                liquidity_pool,
                self.config.max_liquidity_pool_balance
            );
            return err!(IporError::LiquidityPoolBalanceTooHigh);
        }
        let new_contribution = math::checked_add(*contribution, amount)?;
        if new_contribution > self.config.max_lp_account_contribution {
            msg!(
                "Error: Contribution {} would exceed max {}",
                new_contribution,
                self.config.max_lp_account_contribution
            );
            return err!(IporError::AccountContributionTooHigh);
        }

        let exchange_rate = self.get_exchange_rate(soap, share_supply)?;
        let shares = math::checked_mul_div_floor(amount, WAD, exchange_rate)?;
        require!(shares > 0, IporError::InvalidAmount);

        self.balance.liquidity_pool = liquidity_pool;
        *contribution = new_contribution;

        Ok(shares)
    }

    /// Removes the value of `share_amount` shares from the liquidity pool.
    /// The redeem fee is moved to the treasury so remaining shares keep
    /// their exchange rate.
    pub fn redeem(
        &mut self,
        share_amount: u128,
        soap: i128,
        share_supply: u128,
        contribution: &mut u128,
    ) -> Result<RedeemAmounts> {
        require!(share_amount > 0, IporError::InvalidAmount);
        if share_amount > share_supply {
            return err!(IporError::AmountExceedsBalance);
        }
        let balance = self.balance;
        if soap.unsigned_abs() > balance.liquidity_pool {
            msg!(
                "Error: SOAP {} exceeds liquidity pool {}",
                soap,
                balance.liquidity_pool
            );
            return err!(IporError::SoapExceedsLiquidityPool);
        }

        let exchange_rate = self.get_exchange_rate(soap, share_supply)?;
        let gross_amount = math::checked_mul_div_floor(share_amount, exchange_rate, WAD)?;
        let fee = math::checked_mul_div_round(gross_amount, self.config.redeem_fee_rate, WAD)?;
        let payout = math::checked_sub(gross_amount, fee)?;

        let total_collateral = balance.get_total_collateral()?;
        if gross_amount > balance.liquidity_pool
            || (total_collateral > 0 && gross_amount == balance.liquidity_pool)
        {
            msg!(
                "Error: Redeem of {} would drain liquidity pool {} with {} collateral open",
                gross_amount,
                balance.liquidity_pool,
                total_collateral
            );
            return err!(IporError::LiquidityPoolTooLow);
        }
        let liquidity_pool = balance.liquidity_pool - gross_amount;

        let utilization = Self::get_utilization(total_collateral, liquidity_pool)?;
        if utilization > self.config.max_redeem_utilization {
            msg!(
                "Error: Utilization after redeem {} exceeds max {}",
                utilization,
                self.config.max_redeem_utilization
            );
            return err!(IporError::RedeemUtilizationExceeded);
        }

        self.balance.liquidity_pool = liquidity_pool;
        self.balance.treasury = math::checked_add(balance.treasury, fee)?;
        *contribution = contribution.saturating_sub(gross_amount);

        Ok(RedeemAmounts {
            exchange_rate,
            gross_amount,
            fee,
            payout,
        })
    }

    /// Books a treasury payout, the caller moves the tokens
    pub fn withdraw_treasury(&mut self, amount: u128) -> Result<()> {
        require!(amount > 0, IporError::InvalidAmount);
        if amount > self.balance.treasury {
            msg!("Error: Treasury balance {} is below {}", self.balance.treasury, amount);
            return err!(IporError::AmountExceedsBalance);
        }
        self.balance.treasury -= amount;
        Ok(())
    }

    pub fn withdraw_publication_fee(&mut self, amount: u128) -> Result<()> {
        require!(amount > 0, IporError::InvalidAmount);
        if amount > self.balance.ipor_publication_fee {
            msg!(
                "Error: Publication fee balance {} is below {}",
                self.balance.ipor_publication_fee,
                amount
            );
            return err!(IporError::AmountExceedsBalance);
        }
        self.balance.ipor_publication_fee -= amount;
        Ok(())
    }

    pub fn check_batch_size(&self, count: usize) -> Result<()> {
        if count > self.config.max_swaps_per_close as usize {
            msg!(
                "Error: {} swaps exceed max {} per close",
                count,
                self.config.max_swaps_per_close
            );
            return err!(IporError::TooManySwaps);
        }
        Ok(())
    }

    /// Closes each swap of the batch independently. A swap whose id was
    /// already listed earlier, or that fails to close, is logged and gets
    /// `None` while the rest of the batch goes through.
    pub fn close_swaps(
        &mut self,
        swaps: &mut [Swap],
        closer: &Pubkey,
        ibt_price: u128,
        timestamp: i64,
    ) -> Result<Vec<Option<CloseSwapOutcome>>> {
        self.check_batch_size(swaps.len())?;

        let mut outcomes = Vec::with_capacity(swaps.len());
        for idx in 0..swaps.len() {
            let (listed, rest) = swaps.split_at_mut(idx);
            let swap = &mut rest[0];
            if listed.iter().any(|item| item.id == swap.id) {
                msg!("Swap {} skipped: listed twice", swap.id);
                outcomes.push(None);
                continue;
            }
            match self.close_swap(swap, closer, ibt_price, timestamp) {
                Ok(outcome) => outcomes.push(Some(outcome)),
                Err(err) => {
                    msg!("Swap {} skipped: {}", swap.id, err);
                    outcomes.push(None);
                }
            }
        }

        Ok(outcomes)
    }
}

#[cfg(test)]
mod test {
    use {
        super::*,
        crate::state::{
            ipor_oracle::IporIndex,
            spread::{LegSpreadParams, SpreadRegion},
        },
    };

    const DAY: i64 = 86_400;

    fn scale(amount: u128) -> u128 {
        amount * WAD
    }

    fn rate(basis_points: u128) -> u128 {
        basis_points * WAD / 10_000
    }

    fn flat_spread(spread: u128) -> LegSpreadParams {
        let region = SpreadRegion {
            base: spread as i128,
            slope_for_volatility: 0,
            slope_for_mean_reversion: 0,
        };
        LegSpreadParams {
            region_one: region,
            region_two: region,
            region_two_utilization_threshold: WAD / 2,
            min_spread: 0,
            max_spread: rate(200) as i128,
        }
    }

    fn get_fixture() -> Pool {
        let pool = Pool {
            asset: Pubkey::new_unique(),
            decimals: 6,
            balance: Balance {
                liquidity_pool: scale(60_000),
                ..Default::default()
            },
            soap_pay_fixed: SoapIndicator::default(),
            soap_receive_fixed: SoapIndicator::default(),
            config: PoolConfig {
                min_leverage: scale(10),
                max_leverage: scale(1_000),
                opening_fee_rate: rate(30),
                opening_fee_treasury_portion_rate: 0,
                income_fee_rate: rate(1_000),
                redeem_fee_rate: rate(50),
                liquidation_deposit_amount: scale(20),
                ipor_publication_fee_amount: scale(10),
                max_swap_collateral_amount: scale(100_000),
                max_utilization: rate(8_000),
                max_utilization_per_leg: rate(4_800),
                max_redeem_utilization: WAD,
                max_liquidity_pool_balance: scale(1_000_000),
                max_lp_account_contribution: scale(500_000),
                min_position_value_to_close_before_maturity: rate(9_900),
                seconds_before_maturity_when_position_can_be_closed: 6 * 3_600,
                swap_tenor: 28 * DAY,
                max_swaps_per_close: 10,
            },
            spread: SpreadParams {
                pay_fixed: flat_spread(rate(100)),
                receive_fixed: flat_spread(rate(100)),
            },
            roles: PoolRoles::default(),
            next_swap_id: 1,
            bump: 255,
            token_account_bump: 254,
            share_mint_bump: 253,
            inception_time: 0,
        };
        assert!(pool.validate());
        pool
    }

    fn get_index(index_value: u128, timestamp: i64) -> IporIndex {
        let mut index = IporIndex::default();
        index.update(index_value, timestamp, 86_400).unwrap();
        index
    }

    // 368 units at 100x leverage buy 26,000 notional on 260 collateral
    fn get_request(leg: Leg, buyer: Pubkey) -> OpenSwapRequest {
        OpenSwapRequest {
            buyer,
            leg,
            total_amount: scale(368),
            acceptable_fixed_interest_rate: match leg {
                Leg::PayFixed => rate(600),
                Leg::ReceiveFixed => rate(100),
            },
            leverage: scale(100),
        }
    }

    fn open(pool: &mut Pool, leg: Leg, buyer: Pubkey, index: &IporIndex, timestamp: i64) -> Swap {
        pool.open_swap(
            &get_request(leg, buyer),
            &index.get_accrued(timestamp).unwrap(),
            timestamp,
        )
        .unwrap()
    }

    #[test]
    fn test_swap_amounts() {
        let pool = get_fixture();

        let amounts = pool.get_swap_amounts(scale(368), scale(100)).unwrap();
        assert_eq!(
            amounts,
            OpenSwapAmounts {
                collateral: scale(260),
                notional: scale(26_000),
                opening_fee: scale(78),
                opening_fee_treasury: 0,
                opening_fee_lp: scale(78),
            }
        );

        assert_eq!(
            pool.get_swap_amounts(scale(30), scale(100)).unwrap_err(),
            error!(IporError::TotalAmountBelowFees)
        );
    }

    #[test]
    fn test_open_swap() {
        let mut pool = get_fixture();
        let index = get_index(rate(300), 0);
        let buyer = Pubkey::new_unique();

        let swap = open(&mut pool, Leg::PayFixed, buyer, &index, 0);

        assert_eq!(swap.id, 1);
        assert_eq!(swap.buyer, buyer);
        assert_eq!(swap.state, SwapState::Active);
        assert_eq!(swap.fixed_interest_rate, rate(400));
        assert_eq!(swap.collateral, scale(260));
        assert_eq!(swap.notional, scale(26_000));
        assert_eq!(swap.ibt_quantity, scale(26_000));
        assert_eq!(swap.liquidation_deposit_amount, scale(20));
        assert_eq!(swap.end_timestamp, 28 * DAY);
        assert_eq!(pool.next_swap_id, 2);
        assert_eq!(
            pool.balance,
            Balance {
                liquidity_pool: scale(60_078),
                total_collateral_pay_fixed: scale(260),
                total_collateral_receive_fixed: 0,
                treasury: 0,
                ipor_publication_fee: scale(10),
            }
        );
        assert_eq!(pool.soap_pay_fixed.total_notional, scale(26_000));
        assert_eq!(pool.soap_pay_fixed.average_interest_rate, rate(400));

        let swap = open(&mut pool, Leg::ReceiveFixed, buyer, &index, DAY);
        assert_eq!(swap.id, 2);
        assert_eq!(swap.fixed_interest_rate, rate(200));
        assert_eq!(pool.balance.total_collateral_receive_fixed, scale(260));
    }

    #[test]
    fn test_open_swap_bounds() {
        let mut pool = get_fixture();
        let index = get_index(rate(300), 0).get_accrued(0).unwrap();
        let before = pool.balance;
        let buyer = Pubkey::new_unique();

        let mut request = get_request(Leg::PayFixed, buyer);
        request.leverage = scale(5);
        assert_eq!(
            pool.open_swap(&request, &index, 0).unwrap_err(),
            error!(IporError::LeverageOutOfRange)
        );

        let mut request = get_request(Leg::PayFixed, buyer);
        request.total_amount = 0;
        assert_eq!(
            pool.open_swap(&request, &index, 0).unwrap_err(),
            error!(IporError::InvalidAmount)
        );

        let mut request = get_request(Leg::PayFixed, buyer);
        request.acceptable_fixed_interest_rate = rate(350);
        assert_eq!(
            pool.open_swap(&request, &index, 0).unwrap_err(),
            error!(IporError::AcceptableFixedRateExceeded)
        );

        let mut request = get_request(Leg::ReceiveFixed, buyer);
        request.acceptable_fixed_interest_rate = rate(250);
        assert_eq!(
            pool.open_swap(&request, &index, 0).unwrap_err(),
            error!(IporError::AcceptableFixedRateExceeded)
        );

        pool.config.max_swap_collateral_amount = scale(100);
        assert_eq!(
            pool.open_swap(&get_request(Leg::PayFixed, buyer), &index, 0)
                .unwrap_err(),
            error!(IporError::CollateralTooHigh)
        );

        assert_eq!(pool.balance, before);
        assert_eq!(pool.soap_pay_fixed, SoapIndicator::default());
        assert_eq!(pool.next_swap_id, 1);
    }

    #[test]
    fn test_open_swap_utilization() {
        let mut pool = get_fixture();
        pool.balance.liquidity_pool = scale(1_000);
        let index = get_index(rate(300), 0).get_accrued(0).unwrap();
        let buyer = Pubkey::new_unique();

        // 600 collateral at 10x leverage against ~1,018 liquidity
        let mut request = get_request(Leg::PayFixed, buyer);
        request.leverage = scale(10);
        request.total_amount = scale(648);
        assert_eq!(
            pool.open_swap(&request, &index, 0).unwrap_err(),
            error!(IporError::UtilizationPerLegExceeded)
        );

        // 450 collateral on top of 400 on the other leg
        pool.balance.total_collateral_receive_fixed = scale(400);
        request.total_amount = scale(4_935) / 10;
        assert_eq!(
            pool.open_swap(&request, &index, 0).unwrap_err(),
            error!(IporError::UtilizationExceeded)
        );

        pool.balance.total_collateral_receive_fixed = 0;
        let swap = pool.open_swap(&request, &index, 0).unwrap();
        assert_eq!(swap.collateral, scale(450));
    }

    #[test]
    fn test_soap_and_exchange_rate_after_index_rise() {
        let mut pool = get_fixture();
        let share_supply = scale(60_000);
        let mut index = get_index(rate(300), 0);

        open(&mut pool, Leg::PayFixed, Pubkey::new_unique(), &index, 0);
        index.update(rate(500), 0, 86_400).unwrap();

        let accrued = index.get_accrued(25 * DAY).unwrap();
        let soap = pool.calculate_soap(accrued.ibt_price, 25 * DAY).unwrap();

        // 26,000 * (5% - 4%) * 25 / 365 owed to the pay-fixed trader
        assert_eq!(soap.soap_pay_fixed, -17_808_219_178_082_182_877);
        assert_eq!(soap.soap_receive_fixed, 0);
        assert_eq!(soap.soap, soap.soap_pay_fixed);
        assert!(soap.soap < 0);

        let exchange_rate = pool.get_exchange_rate(soap.soap, share_supply).unwrap();
        assert!(exchange_rate > WAD);
    }

    #[test]
    fn test_close_swap_with_profit() {
        let mut pool = get_fixture();
        let buyer = Pubkey::new_unique();
        let mut index = get_index(rate(300), 0);
        let mut swap = open(&mut pool, Leg::PayFixed, buyer, &index, 0);
        index.update(rate(500), 0, 86_400).unwrap();

        let timestamp = 25 * DAY;
        let ibt_price = index.get_accrued(timestamp).unwrap().ibt_price;
        let soap = pool.calculate_soap(ibt_price, timestamp).unwrap().soap;
        let value_before = pool.get_pool_value(soap).unwrap();
        let liquidity_before = pool.balance.liquidity_pool;

        let outcome = pool
            .close_swap(&mut swap, &buyer, ibt_price, timestamp)
            .unwrap();

        let payoff = 17_808_219_178_082_182_877u128;
        let income_fee = 1_780_821_917_808_218_288u128;
        assert_eq!(outcome.payoff, payoff as i128);
        assert_eq!(outcome.income_fee, income_fee);
        assert_eq!(
            outcome.buyer_amount,
            scale(260) + payoff - income_fee + scale(20)
        );
        assert_eq!(outcome.closer_amount, 0);
        assert_eq!(swap.state, SwapState::Closed);
        assert_eq!(swap.close_timestamp, timestamp);

        assert_eq!(pool.balance.liquidity_pool, liquidity_before - payoff);
        assert_eq!(pool.balance.treasury, income_fee);
        assert_eq!(pool.balance.total_collateral_pay_fixed, 0);
        assert_eq!(pool.soap_pay_fixed.total_notional, 0);

        let soap = pool.calculate_soap(ibt_price, timestamp).unwrap().soap;
        assert_eq!(soap, 0);
        assert!((pool.get_pool_value(soap).unwrap() - value_before).abs() <= 1);

        assert_eq!(
            pool.close_swap(&mut swap, &buyer, ibt_price, timestamp)
                .unwrap_err(),
            error!(IporError::SwapNotActive)
        );
    }

    #[test]
    fn test_close_keeps_pool_value() {
        let mut pool = get_fixture();
        let mut index = get_index(rate(300), 0);
        let buyer = Pubkey::new_unique();

        let mut first = open(&mut pool, Leg::PayFixed, buyer, &index, 0);
        index.update(rate(250), 2 * DAY, 86_400).unwrap();
        let _second = open(&mut pool, Leg::ReceiveFixed, buyer, &index, 2 * DAY);
        index.update(rate(420), 5 * DAY, 86_400).unwrap();
        let _third = open(&mut pool, Leg::PayFixed, buyer, &index, 5 * DAY);
        index.update(rate(150), 9 * DAY, 86_400).unwrap();

        let timestamp = 14 * DAY;
        let ibt_price = index.get_accrued(timestamp).unwrap().ibt_price;
        let value_before = pool
            .get_pool_value(pool.calculate_soap(ibt_price, timestamp).unwrap().soap)
            .unwrap();

        let outcome = pool
            .close_swap(&mut first, &buyer, ibt_price, timestamp)
            .unwrap();
        assert!(outcome.payoff < 0);
        assert_eq!(
            outcome.buyer_amount,
            first.collateral - outcome.payoff.unsigned_abs() + first.liquidation_deposit_amount
        );

        let value_after = pool
            .get_pool_value(pool.calculate_soap(ibt_price, timestamp).unwrap().soap)
            .unwrap();
        assert!((value_after - value_before).abs() <= 1);
    }

    #[test]
    fn test_close_by_third_party() {
        let mut pool = get_fixture();
        let buyer = Pubkey::new_unique();
        let keeper = Pubkey::new_unique();
        let index = get_index(rate(300), 0);
        let mut swap = open(&mut pool, Leg::PayFixed, buyer, &index, 0);

        let ibt_price = index.get_accrued(10 * DAY).unwrap().ibt_price;
        assert_eq!(
            pool.close_swap(&mut swap, &keeper, ibt_price, 10 * DAY)
                .unwrap_err(),
            error!(IporError::CloseNotAllowed)
        );
        assert!(swap.is_active());

        let timestamp = 28 * DAY - 6 * 3_600;
        let ibt_price = index.get_accrued(timestamp).unwrap().ibt_price;
        let outcome = pool
            .close_swap(&mut swap, &keeper, ibt_price, timestamp)
            .unwrap();
        assert_eq!(outcome.closer_amount, scale(20));
        assert_eq!(
            outcome.buyer_amount,
            scale(260) - outcome.payoff.unsigned_abs()
        );
    }

    #[test]
    fn test_close_liquidated_swap() {
        let mut pool = get_fixture();
        let buyer = Pubkey::new_unique();
        let keeper = Pubkey::new_unique();
        let mut index = get_index(rate(300), 0);
        let mut swap = open(&mut pool, Leg::ReceiveFixed, buyer, &index, 0);

        // floating at 100% wipes out the receive-fixed collateral
        index.update(WAD, 0, 86_400).unwrap();
        let timestamp = 5 * DAY;
        let ibt_price = index.get_accrued(timestamp).unwrap().ibt_price;
        assert!(swap.get_unbounded_value(timestamp, ibt_price).unwrap() < -(scale(260) as i128));

        let outcome = pool
            .close_swap(&mut swap, &keeper, ibt_price, timestamp)
            .unwrap();
        assert_eq!(outcome.payoff, -(scale(260) as i128));
        assert_eq!(outcome.buyer_amount, 0);
        assert_eq!(outcome.closer_amount, scale(20));
        assert_eq!(pool.balance.liquidity_pool, scale(60_078) + scale(260));
    }

    #[test]
    fn test_exchange_rate() {
        let pool = get_fixture();

        assert_eq!(pool.get_exchange_rate(0, 0).unwrap(), WAD);
        assert_eq!(pool.get_exchange_rate(0, scale(60_000)).unwrap(), WAD);
        assert_eq!(
            pool.get_exchange_rate(-(scale(6_000) as i128), scale(60_000))
                .unwrap(),
            rate(9_000)
        );
        assert_eq!(
            pool.get_exchange_rate(-(scale(60_000) as i128), scale(60_000))
                .unwrap_err(),
            error!(IporError::SoapExceedsLiquidityPool)
        );
    }

    #[test]
    fn test_provide_then_redeem() {
        let mut pool = get_fixture();
        let mut contribution = 0u128;
        let share_supply = scale(60_000);

        let shares = pool
            .provide_liquidity(scale(1_000), 0, share_supply, &mut contribution)
            .unwrap();
        assert_eq!(shares, scale(1_000));
        assert_eq!(pool.balance.liquidity_pool, scale(61_000));
        assert_eq!(contribution, scale(1_000));

        let amounts = pool
            .redeem(shares, 0, share_supply + shares, &mut contribution)
            .unwrap();
        assert_eq!(amounts.gross_amount, scale(1_000));
        assert_eq!(amounts.fee, scale(5));
        assert_eq!(amounts.payout, scale(995));
        assert_eq!(contribution, 0);
        assert_eq!(pool.balance.liquidity_pool, scale(60_000));
        assert_eq!(pool.balance.treasury, scale(5));
        assert_eq!(pool.get_exchange_rate(0, share_supply).unwrap(), WAD);
    }

    #[test]
    fn test_provide_liquidity_caps() {
        let mut pool = get_fixture();
        let mut contribution = 0u128;

        assert_eq!(
            pool.provide_liquidity(scale(940_001), 0, scale(60_000), &mut contribution)
                .unwrap_err(),
            error!(IporError::LiquidityPoolBalanceTooHigh)
        );

        contribution = scale(499_000);
        assert_eq!(
            pool.provide_liquidity(scale(1_001), 0, scale(60_000), &mut contribution)
                .unwrap_err(),
            error!(IporError::AccountContributionTooHigh)
        );
        assert_eq!(contribution, scale(499_000));
        assert_eq!(pool.balance.liquidity_pool, scale(60_000));
    }

    #[test]
    fn test_redeem_with_committed_collateral() {
        let mut pool = get_fixture();
        pool.balance.total_collateral_pay_fixed = scale(27_000);
        let before = pool.balance;
        let mut contribution = scale(41_000);

        assert_eq!(
            pool.redeem(scale(41_000), 0, scale(60_000), &mut contribution)
                .unwrap_err(),
            error!(IporError::RedeemUtilizationExceeded)
        );
        assert_eq!(
            pool.redeem(scale(60_000), 0, scale(60_000), &mut contribution)
                .unwrap_err(),
            error!(IporError::LiquidityPoolTooLow)
        );
        assert_eq!(pool.balance, before);
        assert_eq!(contribution, scale(41_000));
    }

    #[test]
    fn test_redeem_soap_exceeds_liquidity() {
        let mut pool = get_fixture();
        let mut contribution = 0u128;

        assert_eq!(
            pool.redeem(scale(1), scale(70_000) as i128, scale(60_000), &mut contribution)
                .unwrap_err(),
            error!(IporError::SoapExceedsLiquidityPool)
        );
        assert_eq!(
            pool.redeem(scale(60_001), 0, scale(60_000), &mut contribution)
                .unwrap_err(),
            error!(IporError::AmountExceedsBalance)
        );
    }

    #[test]
    fn test_fee_withdrawals() {
        let mut pool = get_fixture();
        pool.balance.treasury = scale(5);
        pool.balance.ipor_publication_fee = scale(10);

        assert_eq!(
            pool.withdraw_treasury(scale(6)).unwrap_err(),
            error!(IporError::AmountExceedsBalance)
        );
        pool.withdraw_treasury(scale(5)).unwrap();
        assert_eq!(pool.balance.treasury, 0);

        pool.withdraw_publication_fee(scale(4)).unwrap();
        assert_eq!(pool.balance.ipor_publication_fee, scale(6));
        assert_eq!(
            pool.withdraw_publication_fee(scale(7)).unwrap_err(),
            error!(IporError::AmountExceedsBalance)
        );
    }

    #[test]
    fn test_close_swaps_batch() {
        let mut pool = get_fixture();
        let buyer = Pubkey::new_unique();
        let other_buyer = Pubkey::new_unique();
        let index = get_index(rate(300), 0);

        let first = open(&mut pool, Leg::PayFixed, buyer, &index, 0);
        let second = open(&mut pool, Leg::ReceiveFixed, buyer, &index, 0);
        let third = open(&mut pool, Leg::PayFixed, other_buyer, &index, 0);
        let mut swaps = vec![first.clone(), third, first, second];

        let timestamp = 10 * DAY;
        let ibt_price = index.get_accrued(timestamp).unwrap().ibt_price;
        let outcomes = pool
            .close_swaps(&mut swaps, &buyer, ibt_price, timestamp)
            .unwrap();

        // the other buyer's swap is not closable yet and the repeated id is skipped
        assert_eq!(outcomes.len(), 4);
        assert!(outcomes[0].is_some());
        assert_eq!(outcomes[1], None);
        assert_eq!(outcomes[2], None);
        assert!(outcomes[3].is_some());
        assert_eq!(swaps[0].state, SwapState::Closed);
        assert_eq!(swaps[1].state, SwapState::Active);
        assert_eq!(swaps[3].state, SwapState::Closed);

        assert_eq!(pool.balance.total_collateral_pay_fixed, scale(260));
        assert_eq!(pool.balance.total_collateral_receive_fixed, 0);
        assert_eq!(pool.soap_pay_fixed.total_notional, scale(26_000));
        assert_eq!(pool.soap_receive_fixed.total_notional, 0);
    }

    #[test]
    fn test_close_swaps_too_many() {
        let mut pool = get_fixture();
        pool.config.max_swaps_per_close = 2;
        let buyer = Pubkey::new_unique();
        let index = get_index(rate(300), 0);

        let mut swaps = vec![
            open(&mut pool, Leg::PayFixed, buyer, &index, 0),
            open(&mut pool, Leg::PayFixed, buyer, &index, 0),
            open(&mut pool, Leg::ReceiveFixed, buyer, &index, 0),
        ];
        let before = pool.balance;

        assert_eq!(
            pool.close_swaps(&mut swaps, &buyer, WAD, DAY).unwrap_err(),
            error!(IporError::TooManySwaps)
        );
        assert_eq!(pool.balance, before);
        assert!(swaps.iter().all(|swap| swap.is_active()));
        assert!(pool.check_batch_size(2).is_ok());
    }

    #[test]
    fn test_redeem_without_contribution() {
        let mut pool = get_fixture();
        // shares received by transfer, the holder never provided liquidity
        let mut contribution = 0u128;

        let amounts = pool
            .redeem(scale(1_000), 0, scale(60_000), &mut contribution)
            .unwrap();
        assert_eq!(amounts.payout, scale(995));
        assert_eq!(contribution, 0);
        assert_eq!(pool.balance.liquidity_pool, scale(59_000));
    }

    #[test]
    fn test_config_requires_close_threshold() {
        let mut pool = get_fixture();

        pool.config.min_position_value_to_close_before_maturity = 0;
        assert!(!pool.validate());

        pool.config.min_position_value_to_close_before_maturity = WAD + 1;
        assert!(!pool.validate());

        pool.config.min_position_value_to_close_before_maturity = WAD;
        assert!(pool.validate());
    }
}
