//! GetAccruedBalance instruction handler (view)
//!
//! Reports the ledger as recorded on the pool account. Nothing is derived
//! from caller input.

use {
    crate::state::pool::{Balance, Pool},
    anchor_lang::prelude::*,
};

#[derive(Accounts)]
pub struct GetAccruedBalance<'info> {
    #[account(
        seeds = [b"pool",
                 pool.asset.as_ref()],
        bump = pool.bump
    )]
    pub pool: Box<Account<'info, Pool>>,
}

#[derive(AnchorSerialize, AnchorDeserialize)]
pub struct GetAccruedBalanceParams {}

pub fn get_accrued_balance(
    ctx: Context<GetAccruedBalance>,
    _params: &GetAccruedBalanceParams,
) -> Result<Balance> {
    Ok(ctx.accounts.pool.balance)
}
