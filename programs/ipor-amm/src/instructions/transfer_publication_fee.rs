//! TransferPublicationFee instruction handler

use {
    crate::{
        error::IporError,
        events::PublicationFeeTransferred,
        math,
        state::{pool::Pool, protocol::Protocol},
    },
    anchor_lang::prelude::*,
    anchor_spl::token::{Token, TokenAccount},
};

#[derive(Accounts)]
pub struct TransferPublicationFee<'info> {
    pub publication_fee_transferer: Signer<'info>,

    #[account(
        mut,
        constraint = publication_fee_treasury_account.mint == pool.asset,
        constraint = publication_fee_treasury_account.key() == pool.roles.publication_fee_treasury
    )]
    pub publication_fee_treasury_account: Box<Account<'info, TokenAccount>>,

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
pub struct TransferPublicationFeeParams {
    /// Native asset units
    pub amount: u64,
}

pub fn transfer_publication_fee(
    ctx: Context<TransferPublicationFee>,
    params: &TransferPublicationFeeParams,
) -> Result<()> {
    msg!("Check permissions");
    let pool = ctx.accounts.pool.as_mut();
    require_keys_eq!(
        ctx.accounts.publication_fee_transferer.key(),
        pool.roles.publication_fee_transferer,
        IporError::CallerNotPublicationFeeTransferer
    );

    msg!("Validate inputs");
    if params.amount == 0 {
        return err!(IporError::InvalidAmount);
    }
    let amount = math::to_wad(params.amount, pool.decimals)?;
    pool.withdraw_publication_fee(amount)?;

    msg!("Transfer tokens");
    ctx.accounts.protocol.transfer_tokens(
        ctx.accounts.pool_token_account.to_account_info(),
        ctx.accounts.publication_fee_treasury_account.to_account_info(),
        ctx.accounts.transfer_authority.to_account_info(),
        ctx.accounts.token_program.to_account_info(),
        params.amount,
    )?;

    emit!(PublicationFeeTransferred {
        asset: pool.asset,
        publication_fee_treasury: pool.roles.publication_fee_treasury,
        amount,
    });

    Ok(())
}
