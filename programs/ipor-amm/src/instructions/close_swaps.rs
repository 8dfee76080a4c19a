//! CloseSwaps instruction handler
//!
//! Closes a batch of swaps of one pool. Each swap is settled independently:
//! a swap that cannot be closed is logged and skipped while the others go
//! through. Ledger updates for the whole batch are made before any tokens
//! move.

use {
    crate::{
        error::IporError,
        instructions::close_swap::{emit_swap_closed, transfer_from_pool},
        math,
        state::{
            ipor_oracle::IporIndex,
            pool::Pool,
            protocol::Protocol,
            swap::Swap,
        },
    },
    anchor_lang::prelude::*,
    anchor_spl::token::{Token, TokenAccount},
};

#[derive(Accounts)]
pub struct CloseSwaps<'info> {
    #[account(mut)]
    pub closer: Signer<'info>,

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

    token_program: Program<'info, Token>,
    // remaining accounts, one pair per swap id:
    //   swap account (writable, unsigned)
    //   buyer token account (writable, unsigned)
}

#[derive(AnchorSerialize, AnchorDeserialize)]
pub struct CloseSwapsParams {
    pub swap_ids: Vec<u64>,
}

struct LoadedSwap<'info> {
    swap: Account<'info, Swap>,
    buyer_token_account: &'info AccountInfo<'info>,
}

fn load_swap<'info>(
    pool: &Pool,
    pool_key: &Pubkey,
    swap_id: u64,
    swap_info: &'info AccountInfo<'info>,
    buyer_token_info: &'info AccountInfo<'info>,
) -> Result<LoadedSwap<'info>> {
    require!(
        swap_info.is_writable && buyer_token_info.is_writable,
        ErrorCode::ConstraintMut
    );

    let swap = Account::<Swap>::try_from(swap_info)?;
    let expected_key = Pubkey::create_program_address(
        &[
            b"swap",
            pool_key.as_ref(),
            &swap_id.to_le_bytes(),
            &[swap.bump],
        ],
        &crate::ID,
    )
    .map_err(|_| error!(IporError::InvalidSwapAccount))?;
    require_keys_eq!(swap_info.key(), expected_key, IporError::InvalidSwapAccount);
    require_keys_eq!(swap.pool, *pool_key, IporError::InvalidSwapAccount);

    let buyer_token_account = Account::<TokenAccount>::try_from(buyer_token_info)?;
    require_keys_eq!(
        buyer_token_account.owner,
        swap.buyer,
        ErrorCode::ConstraintTokenOwner
    );
    require_keys_eq!(
        buyer_token_account.mint,
        pool.asset,
        ErrorCode::ConstraintTokenMint
    );

    Ok(LoadedSwap {
        swap,
        buyer_token_account: buyer_token_info,
    })
}

/// Returns the ids of the swaps actually closed
pub fn close_swaps<'info>(
    ctx: Context<'_, '_, 'info, 'info, CloseSwaps<'info>>,
    params: &CloseSwapsParams,
) -> Result<Vec<u64>> {
    msg!("Check permissions");
    let protocol = ctx.accounts.protocol.as_ref();
    require!(
        protocol.permissions.allow_close_swap,
        IporError::InstructionNotAllowed
    );

    msg!("Validate inputs");
    let pool_key = ctx.accounts.pool.key();
    let pool = ctx.accounts.pool.as_mut();
    pool.check_batch_size(params.swap_ids.len())?;
    if ctx.remaining_accounts.len() != math::checked_mul(params.swap_ids.len(), 2)? {
        msg!(
            "Error: {} swap ids and {} remaining accounts",
            params.swap_ids.len(),
            ctx.remaining_accounts.len()
        );
        return err!(IporError::ArityMismatch);
    }
    let curtime = protocol.get_time()?;
    let index = ctx.accounts.ipor_index.get_accrued(curtime)?;
    let closer = ctx.accounts.closer.key();

    let mut loaded: Vec<LoadedSwap> = Vec::with_capacity(params.swap_ids.len());
    for (swap_id, accounts) in params
        .swap_ids
        .iter()
        .zip(ctx.remaining_accounts.chunks(2))
    {
        match load_swap(pool, &pool_key, *swap_id, &accounts[0], &accounts[1]) {
            Ok(item) => loaded.push(item),
            Err(err) => msg!("Swap {} skipped: {}", swap_id, err),
        }
    }

    msg!("Close swaps");
    let mut swaps: Vec<Swap> = loaded.iter().map(|item| (*item.swap).clone()).collect();
    let outcomes = pool.close_swaps(&mut swaps, &closer, index.ibt_price, curtime)?;

    msg!("Transfer tokens");
    let mut closer_amount = 0u128;
    let mut closed_ids = Vec::with_capacity(outcomes.len());
    for ((mut item, swap), outcome) in loaded.into_iter().zip(swaps).zip(outcomes) {
        let Some(outcome) = outcome else {
            continue;
        };
        item.swap.set_inner(swap);
        item.swap.exit(&crate::ID)?;
        transfer_from_pool(
            protocol,
            pool.decimals,
            ctx.accounts.pool_token_account.to_account_info(),
            item.buyer_token_account.clone(),
            ctx.accounts.transfer_authority.to_account_info(),
            ctx.accounts.token_program.to_account_info(),
            outcome.buyer_amount,
        )?;
        closer_amount = math::checked_add(closer_amount, outcome.closer_amount)?;
        emit_swap_closed(&item.swap, closer, &outcome);
        closed_ids.push(item.swap.id);
    }
    if closer_amount > 0 {
        transfer_from_pool(
            protocol,
            pool.decimals,
            ctx.accounts.pool_token_account.to_account_info(),
            ctx.accounts.closer_token_account.to_account_info(),
            ctx.accounts.transfer_authority.to_account_info(),
            ctx.accounts.token_program.to_account_info(),
            closer_amount,
        )?;
    }
    msg!("Closed {} of {} swaps", closed_ids.len(), params.swap_ids.len());

    Ok(closed_ids)
}
