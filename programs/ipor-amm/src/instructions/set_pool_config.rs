//! SetPoolConfig instruction handler

use {
    crate::{
        error::IporError,
        state::{
            multisig::{AdminInstruction, Multisig},
            pool::{Pool, PoolConfig, PoolRoles},
            spread::SpreadParams,
        },
    },
    anchor_lang::prelude::*,
};

#[derive(Accounts)]
pub struct SetPoolConfig<'info> {
    #[account()]
    pub admin: Signer<'info>,

    #[account(
        mut,
        seeds = [b"multisig"],
        bump = multisig.load()?.bump
    )]
    pub multisig: AccountLoader<'info, Multisig>,

    #[account(
        mut,
        seeds = [b"pool",
                 pool.asset.as_ref()],
        bump = pool.bump
    )]
    pub pool: Box<Account<'info, Pool>>,
}

#[derive(AnchorSerialize, AnchorDeserialize)]
pub struct SetPoolConfigParams {
    pub config: PoolConfig,
    pub spread: SpreadParams,
    pub roles: PoolRoles,
}

/// Replaces fees, caps, spread parameters and roles of a pool. Open swaps
/// keep the terms they were opened with.
pub fn set_pool_config<'info>(
    ctx: Context<'_, '_, '_, 'info, SetPoolConfig<'info>>,
    params: &SetPoolConfigParams,
) -> Result<u8> {
    let approvals_left = Multisig::approve(
        &ctx,
        &ctx.accounts.multisig,
        &ctx.accounts.admin,
        AdminInstruction::SetPoolConfig,
        params,
    )?;
    if approvals_left > 0 {
        return Ok(approvals_left);
    }

    let pool = ctx.accounts.pool.as_mut();
    pool.config = params.config;
    pool.spread = params.spread;
    pool.roles = params.roles;

    if !pool.validate() {
        err!(IporError::InvalidPoolConfig)
    } else {
        Ok(0)
    }
}
