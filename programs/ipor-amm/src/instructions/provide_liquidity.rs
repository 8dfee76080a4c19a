//! ProvideLiquidity instruction handler
//!
//! Deposits the pool asset and mints pool shares at the current exchange
//! rate. The rate accounts for the unrealized result of open swaps, so
//! shares are priced at the pool value rather than the bare ledger.

use {
    crate::{
        error::IporError,
        events::LiquidityProvided,
        math,
        state::{
            ipor_oracle::IporIndex, lp_contribution::LpContribution, pool::Pool,
            protocol::Protocol,
        },
    },
    anchor_lang::prelude::*,
    anchor_spl::token::{Mint, Token, TokenAccount},
};

#[derive(Accounts)]
pub struct ProvideLiquidity<'info> {
    #[account(mut)]
    pub owner: Signer<'info>,

    #[account(
        mut,
        constraint = funding_account.mint == pool.asset,
        has_one = owner
    )]
    pub funding_account: Box<Account<'info, TokenAccount>>,

    #[account(
        mut,
        constraint = share_token_account.mint == share_mint.key(),
        has_one = owner
    )]
    pub share_token_account: Box<Account<'info, TokenAccount>>,

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
        seeds = [b"ipor_index",
                 pool.asset.as_ref()],
        bump = ipor_index.bump
    )]
    pub ipor_index: Box<Account<'info, IporIndex>>,

    #[account(
        mut,
        seeds = [b"pool_token_account",
                 pool.key().as_ref()],
        bump = pool.token_account_bump
    )]
    pub pool_token_account: Box<Account<'info, TokenAccount>>,

    #[account(
        mut,
        seeds = [b"share_mint",
                 pool.key().as_ref()],
        bump = pool.share_mint_bump
    )]
    pub share_mint: Box<Account<'info, Mint>>,

    #[account(
        init_if_needed,
        payer = owner,
        space = LpContribution::LEN,
        seeds = [b"lp_contribution",
                 pool.key().as_ref(),
                 owner.key().as_ref()],
        bump
    )]
    pub lp_contribution: Box<Account<'info, LpContribution>>,

    system_program: Program<'info, System>,
    token_program: Program<'info, Token>,
}

#[derive(AnchorSerialize, AnchorDeserialize)]
pub struct ProvideLiquidityParams {
    pub amount: u64,
    pub min_share_amount_out: u64,
}

pub fn provide_liquidity(
    ctx: Context<ProvideLiquidity>,
    params: &ProvideLiquidityParams,
) -> Result<()> {
    msg!("Check permissions");
    let protocol = ctx.accounts.protocol.as_ref();
    require!(
        protocol.permissions.allow_provide_liquidity,
        IporError::InstructionNotAllowed
    );

    msg!("Validate inputs");
    if params.amount == 0 {
        return err!(IporError::InvalidAmount);
    }
    let pool_key = ctx.accounts.pool.key();
    let pool = ctx.accounts.pool.as_mut();
    let curtime = protocol.get_time()?;
    let index = ctx.accounts.ipor_index.get_accrued(curtime)?;

    msg!("Compute share amount");
    let soap = pool.calculate_soap(index.ibt_price, curtime)?;
    let share_supply = math::to_wad(ctx.accounts.share_mint.supply, pool.decimals)?;
    let exchange_rate = pool.get_exchange_rate(soap.soap, share_supply)?;
    let amount = math::to_wad(params.amount, pool.decimals)?;

    let lp_contribution = ctx.accounts.lp_contribution.as_mut();
    lp_contribution.init_if_needed(pool_key, ctx.accounts.owner.key(), ctx.bumps.lp_contribution);
    let shares = pool.provide_liquidity(
        amount,
        soap.soap,
        share_supply,
        &mut lp_contribution.amount,
    )?;
    let share_amount = math::from_wad(shares, pool.decimals)?;
    msg!("Amount in: {}, shares out: {}", params.amount, share_amount);
    if share_amount == 0 || share_amount < params.min_share_amount_out {
        msg!(
            "Error: Share amount {} is below the minimum {}",
            share_amount,
            params.min_share_amount_out
        );
        return err!(IporError::InsufficientAmountReturned);
    }

    msg!("Transfer tokens");
    protocol.transfer_tokens_from_user(
        ctx.accounts.funding_account.to_account_info(),
        ctx.accounts.pool_token_account.to_account_info(),
        ctx.accounts.owner.to_account_info(),
        ctx.accounts.token_program.to_account_info(),
        params.amount,
    )?;

    msg!("Mint shares");
    protocol.mint_tokens(
        ctx.accounts.share_mint.to_account_info(),
        ctx.accounts.share_token_account.to_account_info(),
        ctx.accounts.transfer_authority.to_account_info(),
        ctx.accounts.token_program.to_account_info(),
        share_amount,
    )?;

    emit!(LiquidityProvided {
        asset: pool.asset,
        provider: ctx.accounts.owner.key(),
        amount,
        exchange_rate,
        share_amount: shares,
        timestamp: curtime,
    });

    Ok(())
}
