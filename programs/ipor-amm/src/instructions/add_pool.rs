//! AddPool instruction handler
//!
//! Creates the pool of an asset together with its token account, share mint
//! and index account. Requires multisig approval.

use {
    crate::{
        error::IporError,
        math::WAD_DECIMALS,
        state::{
            ipor_oracle::IporIndex,
            multisig::{AdminInstruction, Multisig},
            pool::{Pool, PoolConfig, PoolRoles},
            protocol::Protocol,
            spread::SpreadParams,
        },
    },
    anchor_lang::prelude::*,
    anchor_spl::token::{Mint, Token, TokenAccount},
};

#[derive(Accounts)]
pub struct AddPool<'info> {
    #[account(mut)]
    pub admin: Signer<'info>,

    #[account(
        mut,
        seeds = [b"multisig"],
        bump = multisig.load()?.bump
    )]
    pub multisig: AccountLoader<'info, Multisig>,

    /// CHECK: Empty PDA, authority for token accounts
    #[account(
        seeds = [b"transfer_authority"],
        bump = protocol.transfer_authority_bump
    )]
    pub transfer_authority: AccountInfo<'info>,

    #[account(
        mut,
        realloc = Protocol::LEN + (protocol.pools.len() + 1) * std::mem::size_of::<Pubkey>(),
        realloc::payer = admin,
        realloc::zero = false,
        seeds = [b"protocol"],
        bump = protocol.protocol_bump
    )]
    pub protocol: Box<Account<'info, Protocol>>,

    pub asset_mint: Box<Account<'info, Mint>>,

    // init_if_needed: the instruction is submitted once per admin signature,
    // the pool is filled in when the last signature arrives
    #[account(
        init_if_needed,
        payer = admin,
        space = Pool::LEN,
        seeds = [b"pool",
                 asset_mint.key().as_ref()],
        bump
    )]
    pub pool: Box<Account<'info, Pool>>,

    #[account(
        init_if_needed,
        payer = admin,
        token::mint = asset_mint,
        token::authority = transfer_authority,
        seeds = [b"pool_token_account",
                 pool.key().as_ref()],
        bump
    )]
    pub pool_token_account: Box<Account<'info, TokenAccount>>,

    #[account(
        init_if_needed,
        payer = admin,
        mint::authority = transfer_authority,
        mint::freeze_authority = transfer_authority,
        mint::decimals = asset_mint.decimals,
        seeds = [b"share_mint",
                 pool.key().as_ref()],
        bump
    )]
    pub share_mint: Box<Account<'info, Mint>>,

    #[account(
        init_if_needed,
        payer = admin,
        space = IporIndex::LEN,
        seeds = [b"ipor_index",
                 asset_mint.key().as_ref()],
        bump
    )]
    pub ipor_index: Box<Account<'info, IporIndex>>,

    system_program: Program<'info, System>,
    token_program: Program<'info, Token>,
    rent: Sysvar<'info, Rent>,
}

#[derive(AnchorSerialize, AnchorDeserialize)]
pub struct AddPoolParams {
    pub config: PoolConfig,
    pub spread: SpreadParams,
    pub roles: PoolRoles,
}

pub fn add_pool<'info>(
    ctx: Context<'_, '_, '_, 'info, AddPool<'info>>,
    params: &AddPoolParams,
) -> Result<u8> {
    if ctx.accounts.asset_mint.decimals > WAD_DECIMALS {
        msg!(
            "Error: Asset decimals {} exceed {}",
            ctx.accounts.asset_mint.decimals,
            WAD_DECIMALS
        );
        return err!(IporError::UnsupportedAsset);
    }

    let approvals_left = Multisig::approve(
        &ctx,
        &ctx.accounts.multisig,
        &ctx.accounts.admin,
        AdminInstruction::AddPool,
        params,
    )?;
    if approvals_left > 0 {
        return Ok(approvals_left);
    }

    let protocol = ctx.accounts.protocol.as_mut();
    let pool = ctx.accounts.pool.as_mut();

    if pool.asset != Pubkey::default() {
        // return error if pool is already initialized
        return Err(ProgramError::AccountAlreadyInitialized.into());
    }

    msg!("Record pool: {}", ctx.accounts.asset_mint.key());
    pool.asset = ctx.accounts.asset_mint.key();
    pool.decimals = ctx.accounts.asset_mint.decimals;
    pool.config = params.config;
    pool.spread = params.spread;
    pool.roles = params.roles;
    pool.next_swap_id = 1;
    pool.bump = ctx.bumps.pool;
    pool.token_account_bump = ctx.bumps.pool_token_account;
    pool.share_mint_bump = ctx.bumps.share_mint;
    pool.inception_time = protocol.get_time()?;

    if !pool.validate() {
        return err!(IporError::InvalidPoolConfig);
    }

    let ipor_index = ctx.accounts.ipor_index.as_mut();
    ipor_index.asset = pool.asset;
    ipor_index.bump = ctx.bumps.ipor_index;

    protocol.pools.push(ctx.accounts.pool.key());

    Ok(0)
}
