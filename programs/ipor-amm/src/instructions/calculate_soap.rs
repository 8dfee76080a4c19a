//! CalculateSoap instruction handler (view)

use {
    crate::state::{
        ipor_oracle::IporIndex,
        pool::{Pool, Soap},
    },
    anchor_lang::prelude::*,
};

#[derive(Accounts)]
pub struct CalculateSoap<'info> {
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
}

#[derive(AnchorSerialize, AnchorDeserialize)]
pub struct CalculateSoapParams {
    pub timestamp: i64,
}

/// Unrealized result of all open swaps at `timestamp`, from the pool's side
pub fn calculate_soap(ctx: Context<CalculateSoap>, params: &CalculateSoapParams) -> Result<Soap> {
    let index = ctx.accounts.ipor_index.get_accrued(params.timestamp)?;
    ctx.accounts
        .pool
        .calculate_soap(index.ibt_price, params.timestamp)
}
