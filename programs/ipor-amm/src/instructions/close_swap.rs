//! CloseSwap instruction handler
//!
//! Settles one swap at the current accrued index. The buyer may close at any
//! time; other accounts may close near maturity or once the payoff reaches
//! the liquidation threshold, and collect the liquidation deposit for it.

use {
    crate::{
        error::IporError,
        events::SwapClosed,
        math,
        state::{
            ipor_oracle::IporIndex,
            pool::{CloseSwapOutcome, Pool},
            protocol::Protocol,
            swap::{Leg, Swap},
        },
    },
    anchor_lang::prelude::*,
    anchor_spl::token::{Token, TokenAccount},
};

#[derive(Accounts)]
pub struct CloseSwap<'info> {
    #[account(mut)]
    pub closer: Signer<'info>,

    #[account(
        mut,
        constraint = buyer_token_account.mint == pool.asset,
        constraint = buyer_token_account.owner == swap.buyer
    )]
    pub buyer_token_account: Box<Account<'info, TokenAccount>>,

    #[account(
        mut,
        constraint = closer_token_account.mint == pool.asset,
        constraint = closer_token_account.owner == closer.key()
    )]
    pub closer_token_account: Box<Account<'info, TokenAccount>>,

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
        has_one = pool,
        seeds = [b"swap",
                 pool.key().as_ref(),
                 &swap.id.to_le_bytes()],
        bump = swap.bump
    )]
    pub swap: Box<Account<'info, Swap>>,

    token_program: Program<'info, Token>,
}

/// Moves an 18-decimal amount out of the pool token account, rounding down
/// to the asset's decimals.
pub fn transfer_from_pool<'info>(
    protocol: &Protocol,
    decimals: u8,
    pool_token_account: AccountInfo<'info>,
    receiving_account: AccountInfo<'info>,
    transfer_authority: AccountInfo<'info>,
    token_program: AccountInfo<'info>,
    amount: u128,
) -> Result<u64> {
    let native_amount = math::from_wad(amount, decimals)?;
    if native_amount > 0 {
        protocol.transfer_tokens(
            pool_token_account,
            receiving_account,
            transfer_authority,
            token_program,
            native_amount,
        )?;
    }
    Ok(native_amount)
}

pub fn emit_swap_closed(swap: &Swap, closer: Pubkey, outcome: &CloseSwapOutcome) {
    emit!(SwapClosed {
        swap_id: swap.id,
        buyer: swap.buyer,
        closer,
        asset: swap.asset,
        leg: swap.leg,
        payoff: outcome.payoff,
        income_fee: outcome.income_fee,
        buyer_amount: outcome.buyer_amount,
        closer_amount: outcome.closer_amount,
        close_timestamp: swap.close_timestamp,
    });
}

pub fn close_swap(ctx: Context<CloseSwap>, leg: Leg) -> Result<()> {
    msg!("Check permissions");
    let protocol = ctx.accounts.protocol.as_ref();
    require!(
        protocol.permissions.allow_close_swap,
        IporError::InstructionNotAllowed
    );

    msg!("Validate inputs");
    let swap = ctx.accounts.swap.as_mut();
    if swap.leg != leg {
        msg!("Error: Swap {} is not a {:?} swap", swap.id, leg);
        return err!(IporError::WrongLeg);
    }
    let curtime = protocol.get_time()?;
    let index = ctx.accounts.ipor_index.get_accrued(curtime)?;

    msg!("Close swap");
    let pool = ctx.accounts.pool.as_mut();
    let closer = ctx.accounts.closer.key();
    let outcome = pool.close_swap(swap, &closer, index.ibt_price, curtime)?;
    msg!(
        "Payoff {} income fee {} buyer amount {}",
        outcome.payoff,
        outcome.income_fee,
        outcome.buyer_amount
    );

    msg!("Transfer tokens");
    transfer_from_pool(
        protocol,
        pool.decimals,
        ctx.accounts.pool_token_account.to_account_info(),
        ctx.accounts.buyer_token_account.to_account_info(),
        ctx.accounts.transfer_authority.to_account_info(),
        ctx.accounts.token_program.to_account_info(),
        outcome.buyer_amount,
    )?;
    if outcome.closer_amount > 0 {
        transfer_from_pool(
            protocol,
            pool.decimals,
            ctx.accounts.pool_token_account.to_account_info(),
            ctx.accounts.closer_token_account.to_account_info(),
            ctx.accounts.transfer_authority.to_account_info(),
            ctx.accounts.token_program.to_account_info(),
            outcome.closer_amount,
        )?;
    }

    emit_swap_closed(swap, closer, &outcome);

    Ok(())
}
