//! SetIndexUpdaters instruction handler
//!
//! Replaces the oracle's updater allow-list and EMA half-life.

use {
    crate::{
        error::IporError,
        state::{
            ipor_oracle::IporOracle,
            multisig::{AdminInstruction, Multisig},
        },
    },
    anchor_lang::prelude::*,
};

#[derive(Accounts)]
pub struct SetIndexUpdaters<'info> {
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
        seeds = [b"ipor_oracle"],
        bump = ipor_oracle.bump
    )]
    pub ipor_oracle: Box<Account<'info, IporOracle>>,
}

#[derive(AnchorSerialize, AnchorDeserialize)]
pub struct SetIndexUpdatersParams {
    pub updaters: Vec<Pubkey>,
    pub decay_half_life: u32,
}

pub fn set_index_updaters<'info>(
    ctx: Context<'_, '_, '_, 'info, SetIndexUpdaters<'info>>,
    params: &SetIndexUpdatersParams,
) -> Result<u8> {
    let approvals_left = Multisig::approve(
        &ctx,
        &ctx.accounts.multisig,
        &ctx.accounts.admin,
        AdminInstruction::SetIndexUpdaters,
        params,
    )?;
    if approvals_left > 0 {
        return Ok(approvals_left);
    }

    let ipor_oracle = ctx.accounts.ipor_oracle.as_mut();
    ipor_oracle.updaters = params.updaters.clone();
    ipor_oracle.decay_half_life = params.decay_half_life;

    if !ipor_oracle.validate() {
        err!(IporError::InvalidOracleConfig)
    } else {
        Ok(0)
    }
}
