//! OpenSwap instruction handler
//!
//! Opens a pay-fixed or receive-fixed swap against the pool. The trader
//! pays collateral, opening fee, publication fee and liquidation deposit in
//! one transfer; the fixed rate is quoted from the accrued index and the
//! pool's spread parameters.

use {
    crate::{
        error::IporError,
        events::SwapOpened,
        math,
        state::{
            ipor_oracle::IporIndex,
            pool::{OpenSwapRequest, Pool},
            protocol::Protocol,
            swap::{Leg, Swap},
        },
    },
    anchor_lang::prelude::*,
    anchor_spl::token::{Token, TokenAccount},
};

#[derive(Accounts)]
pub struct OpenSwap<'info> {
    /// Buyer of the swap, pays for the swap account
    #[account(mut)]
    pub owner: Signer<'info>,

    /// Source of the total amount
    #[account(
        mut,
        constraint = funding_account.mint == pool.asset,
        has_one = owner
    )]
    pub funding_account: Box<Account<'info, TokenAccount>>,

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

    /// Index of the pool's asset, accrued to now for the quote
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

    /// Created at the pool's next id
    #[account(
        init,
        payer = owner,
        space = Swap::LEN,
        seeds = [b"swap",
                 pool.key().as_ref(),
                 &pool.next_swap_id.to_le_bytes()],
        bump
    )]
    pub swap: Box<Account<'info, Swap>>,

    system_program: Program<'info, System>,
    token_program: Program<'info, Token>,
}

#[derive(AnchorSerialize, AnchorDeserialize)]
pub struct OpenSwapParams {
    /// Amount paid by the trader, in native asset units
    pub total_amount: u64,
    /// Highest fixed rate accepted for pay-fixed, lowest for receive-fixed
    pub acceptable_fixed_interest_rate: u128,
    /// Notional over collateral, 18 decimals
    pub leverage: u128,
}

/// Books the swap on `leg` and returns its id
pub fn open_swap(ctx: Context<OpenSwap>, params: &OpenSwapParams, leg: Leg) -> Result<u64> {
    msg!("Check permissions");
    let protocol = ctx.accounts.protocol.as_ref();
    require!(
        protocol.permissions.allow_open_swap,
        IporError::InstructionNotAllowed
    );

    msg!("Validate inputs");
    if params.total_amount == 0 {
        return err!(IporError::InvalidAmount);
    }
    let pool_key = ctx.accounts.pool.key();
    let pool = ctx.accounts.pool.as_mut();
    let curtime = protocol.get_time()?;
    let index = ctx.accounts.ipor_index.get_accrued(curtime)?;

    msg!("Open swap");
    let request = OpenSwapRequest {
        buyer: ctx.accounts.owner.key(),
        leg,
        total_amount: math::to_wad(params.total_amount, pool.decimals)?,
        acceptable_fixed_interest_rate: params.acceptable_fixed_interest_rate,
        leverage: params.leverage,
    };
    let mut swap = pool.open_swap(&request, &index, curtime)?;
    swap.pool = pool_key;
    swap.bump = ctx.bumps.swap;
    msg!(
        "Swap {} collateral {} notional {} fixed rate {}",
        swap.id,
        swap.collateral,
        swap.notional,
        swap.fixed_interest_rate
    );

    msg!("Transfer tokens");
    protocol.transfer_tokens_from_user(
        ctx.accounts.funding_account.to_account_info(),
        ctx.accounts.pool_token_account.to_account_info(),
        ctx.accounts.owner.to_account_info(),
        ctx.accounts.token_program.to_account_info(),
        params.total_amount,
    )?;

    emit!(SwapOpened {
        swap_id: swap.id,
        buyer: swap.buyer,
        asset: swap.asset,
        leg,
        total_amount: request.total_amount,
        collateral: swap.collateral,
        notional: swap.notional,
        opening_fee: swap.opening_fee_amount,
        liquidation_deposit: swap.liquidation_deposit_amount,
        ipor_publication_fee: pool.config.ipor_publication_fee_amount,
        fixed_interest_rate: swap.fixed_interest_rate,
        ibt_quantity: swap.ibt_quantity,
        open_timestamp: swap.open_timestamp,
        end_timestamp: swap.end_timestamp,
    });

    let swap_id = swap.id;
    ctx.accounts.swap.set_inner(swap);

    Ok(swap_id)
}
