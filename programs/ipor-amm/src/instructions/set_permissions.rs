//! SetPermissions instruction handler

use {
    crate::{
        error::IporError,
        state::{
            multisig::{AdminInstruction, Multisig},
            protocol::Protocol,
        },
    },
    anchor_lang::prelude::*,
};

#[derive(Accounts)]
pub struct SetPermissions<'info> {
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
        seeds = [b"protocol"],
        bump = protocol.protocol_bump
    )]
    pub protocol: Box<Account<'info, Protocol>>,
}

#[derive(AnchorSerialize, AnchorDeserialize)]
pub struct SetPermissionsParams {
    pub allow_open_swap: bool,
    pub allow_close_swap: bool,
    pub allow_provide_liquidity: bool,
    pub allow_redeem: bool,
    pub allow_index_update: bool,
}

pub fn set_permissions<'info>(
    ctx: Context<'_, '_, '_, 'info, SetPermissions<'info>>,
    params: &SetPermissionsParams,
) -> Result<u8> {
    let approvals_left = Multisig::approve(
        &ctx,
        &ctx.accounts.multisig,
        &ctx.accounts.admin,
        AdminInstruction::SetPermissions,
        params,
    )?;
    if approvals_left > 0 {
        return Ok(approvals_left);
    }

    let protocol = ctx.accounts.protocol.as_mut();
    protocol.permissions.allow_open_swap = params.allow_open_swap;
    protocol.permissions.allow_close_swap = params.allow_close_swap;
    protocol.permissions.allow_provide_liquidity = params.allow_provide_liquidity;
    protocol.permissions.allow_redeem = params.allow_redeem;
    protocol.permissions.allow_index_update = params.allow_index_update;

    if !protocol.validate() {
        err!(IporError::InvalidProtocolConfig)
    } else {
        Ok(0)
    }
}
