//! CalculatePositionValue instruction handler (view)

use {
    crate::state::{ipor_oracle::IporIndex, swap::Swap},
    anchor_lang::prelude::*,
};

#[derive(Accounts)]
pub struct CalculatePositionValue<'info> {
    #[account(
        seeds = [b"swap",
                 swap.pool.as_ref(),
                 &swap.id.to_le_bytes()],
        bump = swap.bump
    )]
    pub swap: Box<Account<'info, Swap>>,

    #[account(
        seeds = [b"ipor_index",
                 swap.asset.as_ref()],
        bump = ipor_index.bump
    )]
    pub ipor_index: Box<Account<'info, IporIndex>>,
}

#[derive(AnchorSerialize, AnchorDeserialize)]
pub struct CalculatePositionValueParams {
    pub timestamp: i64,
}

#[derive(Copy, Clone, PartialEq, AnchorSerialize, AnchorDeserialize, Default, Debug)]
pub struct PositionValue {
    pub value: i128,
    /// `value` bounded by the swap collateral
    pub payoff: i128,
}

/// Value of the swap for its buyer at `timestamp`
pub fn calculate_position_value(
    ctx: Context<CalculatePositionValue>,
    params: &CalculatePositionValueParams,
) -> Result<PositionValue> {
    let index = ctx.accounts.ipor_index.get_accrued(params.timestamp)?;
    let swap = ctx.accounts.swap.as_ref();

    Ok(PositionValue {
        value: swap.get_unbounded_value(params.timestamp, index.ibt_price)?,
        payoff: swap.get_payoff(params.timestamp, index.ibt_price)?,
    })
}
