//! CalculateExchangeRate instruction handler (view)

use {
    crate::{
        math,
        state::{ipor_oracle::IporIndex, pool::Pool},
    },
    anchor_lang::prelude::*,
    anchor_spl::token::Mint,
};

#[derive(Accounts)]
pub struct CalculateExchangeRate<'info> {
    #[account(
        seeds = [b"pool",
                 pool.asset.as_ref()],
        bump = pool.bump
    )]
    pub pool: Box<Account<'info, Pool>>,

    #[account(
        seeds = [b"ipor_index",
                 pool.asset.as_ref()],
        bump = ipor_index.bump
    )]
    pub ipor_index: Box<Account<'info, IporIndex>>,

    #[account(
        seeds = [b"share_mint",
                 pool.key().as_ref()],
        bump = pool.share_mint_bump
    )]
    pub share_mint: Box<Account<'info, Mint>>,
}

#[derive(AnchorSerialize, AnchorDeserialize)]
pub struct CalculateExchangeRateParams {
    pub timestamp: i64,
}

/// Asset value of one share at `timestamp`, 18 decimals
pub fn calculate_exchange_rate(
    ctx: Context<CalculateExchangeRate>,
    params: &CalculateExchangeRateParams,
) -> Result<u128> {
    let pool = ctx.accounts.pool.as_ref();
    let index = ctx.accounts.ipor_index.get_accrued(params.timestamp)?;
    let soap = pool.calculate_soap(index.ibt_price, params.timestamp)?;
    let share_supply = math::to_wad(ctx.accounts.share_mint.supply, pool.decimals)?;

    pool.get_exchange_rate(soap.soap, share_supply)
}
