//! TransferToTreasury instruction handler

use {
    crate::{
        error::IporError,
        events::TreasuryTransferred,
        math,
        state::{pool::Pool, protocol::Protocol},
    },
    anchor_lang::prelude::*,
    anchor_spl::token::{Token, TokenAccount},
};

#[derive(Accounts)]
pub struct TransferToTreasury<'info> {
    pub treasury_manager: Signer<'info>,

    #[account(
        mut,
        constraint = treasury_account.mint == pool.asset,
        constraint = treasury_account.key() == pool.roles.treasury
    )]
    pub treasury_account: Box<Account<'info, TokenAccount>>,

    /// CHECK: Empty PDA, authority for token accounts
    #[account(
        seeds = [b"transfer_authority"],
        bump = protocol.transfer_authority_bump
    )]
    pub transfer_authority: AccountInfo<'info>,

    #[account(
        seeds = [b"protocol"],
        bump = protocol.protocol_bump
    )]
    pub protocol: Box<Account<'info, Protocol>>,

    #[account(
        mut,
        seeds = [b"pool",
                 pool.asset.as_ref()],
        bump = pool.bump
    )]
    pub pool: Box<Account<'info, Pool>>,

    #[account(
        mut,
        seeds = [b"pool_token_account",
                 pool.key().as_ref()],
        bump = pool.token_account_bump
    )]
    pub pool_token_account: Box<Account<'info, TokenAccount>>,

    token_program: Program<'info, Token>,
}

#[derive(AnchorSerialize, AnchorDeserialize)]
pub struct TransferToTreasuryParams {
    /// Native asset units
    pub amount: u64,
}

pub fn transfer_to_treasury(
    ctx: Context<TransferToTreasury>,
    params: &TransferToTreasuryParams,
) -> Result<()> {
    msg!("Check permissions");
    let pool = ctx.accounts.pool.as_mut();
    require_keys_eq!(
        ctx.accounts.treasury_manager.key(),
        pool.roles.treasury_manager,
        IporError::CallerNotTreasuryManager
    );

    msg!("Validate inputs");
    if params.amount == 0 {
        return err!(IporError::InvalidAmount);
    }
    let amount = math::to_wad(params.amount, pool.decimals)?;
    pool.withdraw_treasury(amount)?;

    msg!("Transfer tokens");
    ctx.accounts.protocol.transfer_tokens(
        ctx.accounts.pool_token_account.to_account_info(),
        ctx.accounts.treasury_account.to_account_info(),
        ctx.accounts.transfer_authority.to_account_info(),
        ctx.accounts.token_program.to_account_info(),
        params.amount,
    )?;

    emit!(TreasuryTransferred {
        asset: pool.asset,
        treasury: pool.roles.treasury,
        amount,
    });

    Ok(())
}
