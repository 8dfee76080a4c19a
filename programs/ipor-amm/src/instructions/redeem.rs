//! Redeem instruction handler
//!
//! Burns pool shares and pays out their value at the current exchange rate,
//! less the redeem fee.

use {
    crate::{
        error::IporError,
        events::LiquidityRedeemed,
        instructions::close_swap::transfer_from_pool,
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
pub struct Redeem<'info> {
    #[account(mut)]
    pub owner: Signer<'info>,

    #[account(
        mut,
        constraint = receiving_account.mint == pool.asset,
        has_one = owner
    )]
    pub receiving_account: Box<Account<'info, TokenAccount>>,

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

    // created here for holders that received their shares by transfer
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
pub struct RedeemParams {
    pub share_amount: u64,
    pub min_amount_out: u64,
}

pub fn redeem(ctx: Context<Redeem>, params: &RedeemParams) -> Result<()> {
    msg!("Check permissions");
    let protocol = ctx.accounts.protocol.as_ref();
    require!(
        protocol.permissions.allow_redeem,
        IporError::InstructionNotAllowed
    );

    msg!("Validate inputs");
    if params.share_amount == 0 {
        return err!(IporError::InvalidAmount);
    }
    let pool_key = ctx.accounts.pool.key();
    let pool = ctx.accounts.pool.as_mut();
    let curtime = protocol.get_time()?;
    let index = ctx.accounts.ipor_index.get_accrued(curtime)?;
    ctx.accounts.lp_contribution.init_if_needed(
        pool_key,
        ctx.accounts.owner.key(),
        ctx.bumps.lp_contribution,
    );

    msg!("Compute redeem amount");
    let soap = pool.calculate_soap(index.ibt_price, curtime)?;
    let share_supply = math::to_wad(ctx.accounts.share_mint.supply, pool.decimals)?;
    let shares = math::to_wad(params.share_amount, pool.decimals)?;
    let redeemed = pool.redeem(
        shares,
        soap.soap,
        share_supply,
        &mut ctx.accounts.lp_contribution.amount,
    )?;
    let payout = math::from_wad(redeemed.payout, pool.decimals)?;
    msg!(
        "Shares in: {}, amount out: {}, fee: {}",
        params.share_amount,
        payout,
        redeemed.fee
    );
    if payout < params.min_amount_out {
        msg!(
            "Error: Amount out {} is below the minimum {}",
            payout,
            params.min_amount_out
        );
        return err!(IporError::InsufficientAmountReturned);
    }

    msg!("Burn shares");
    protocol.burn_tokens(
        ctx.accounts.share_mint.to_account_info(),
        ctx.accounts.share_token_account.to_account_info(),
        ctx.accounts.owner.to_account_info(),
        ctx.accounts.token_program.to_account_info(),
        params.share_amount,
    )?;

    msg!("Transfer tokens");
    transfer_from_pool(
        protocol,
        pool.decimals,
        ctx.accounts.pool_token_account.to_account_info(),
        ctx.accounts.receiving_account.to_account_info(),
        ctx.accounts.transfer_authority.to_account_info(),
        ctx.accounts.token_program.to_account_info(),
        redeemed.payout,
    )?;

    emit!(LiquidityRedeemed {
        asset: pool.asset,
        provider: ctx.accounts.owner.key(),
        share_amount: shares,
        exchange_rate: redeemed.exchange_rate,
        gross_amount: redeemed.gross_amount,
        redeem_fee: redeemed.fee,
        payout: redeemed.payout,
        timestamp: curtime,
    });

    Ok(())
}
