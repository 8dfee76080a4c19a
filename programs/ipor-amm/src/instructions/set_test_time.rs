//! SetTestTime instruction handler
//!
//! Moves the protocol clock. Only builds with the "test" feature accept it,
//! elsewhere the approved instruction fails with `InvalidEnvironment`.

use {
    crate::state::{
        multisig::{AdminInstruction, Multisig},
        protocol::Protocol,
    },
    anchor_lang::prelude::*,
};

#[derive(Accounts)]
pub struct SetTestTime<'info> {
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
pub struct SetTestTimeParams {
    pub time: i64,
}

pub fn set_test_time<'info>(
    ctx: Context<'_, '_, '_, 'info, SetTestTime<'info>>,
    params: &SetTestTimeParams,
) -> Result<u8> {
    let approvals_left = Multisig::approve(
        &ctx,
        &ctx.accounts.multisig,
        &ctx.accounts.admin,
        AdminInstruction::SetTestTime,
        params,
    )?;
    if approvals_left > 0 {
        return Ok(approvals_left);
    }

    ctx.accounts.protocol.set_test_time(params.time)?;
    msg!("Test time set to {}", params.time);

    Ok(0)
}
