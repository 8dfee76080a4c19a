//! Init instruction handler
//!
//! Creates the admin multisig, the transfer authority PDA, the protocol
//! account and the index oracle. Callable once, by the program's upgrade
//! authority.

use {
    crate::{
        error::IporError,
        state::{ipor_oracle::IporOracle, multisig::Multisig, protocol::Protocol},
    },
    anchor_lang::prelude::*,
    anchor_spl::token::Token,
};

#[derive(Accounts)]
pub struct Init<'info> {
    #[account(mut)]
    pub upgrade_authority: Signer<'info>,

    #[account(
        init,
        payer = upgrade_authority,
        space = Multisig::LEN,
        seeds = [b"multisig"],
        bump
    )]
    pub multisig: AccountLoader<'info, Multisig>,

    /// CHECK: Empty PDA, will be set as authority for token accounts and share mints
    #[account(
        init,
        payer = upgrade_authority,
        space = 0,
        seeds = [b"transfer_authority"],
        bump
    )]
    pub transfer_authority: AccountInfo<'info>,

    #[account(
        init,
        payer = upgrade_authority,
        space = Protocol::LEN,
        seeds = [b"protocol"],
        bump
    )]
    pub protocol: Box<Account<'info, Protocol>>,

    #[account(
        init,
        payer = upgrade_authority,
        space = IporOracle::LEN,
        seeds = [b"ipor_oracle"],
        bump
    )]
    pub ipor_oracle: Box<Account<'info, IporOracle>>,

    /// CHECK: ProgramData account, doesn't work in tests
    #[account()]
    pub ipor_amm_program_data: AccountInfo<'info /*, ProgramData*/>,

    pub ipor_amm_program: Program<'info, crate::program::IporAmm>,

    system_program: Program<'info, System>,
    token_program: Program<'info, Token>,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone)]
pub struct InitParams {
    /// Initial admin set, 1 to `Multisig::MAX_SIGNERS` distinct keys
    pub admin_signers: Vec<Pubkey>,
    pub min_signatures: u8,
    pub allow_open_swap: bool,
    pub allow_close_swap: bool,
    pub allow_provide_liquidity: bool,
    pub allow_redeem: bool,
    pub allow_index_update: bool,
    /// Seconds after which the previous EMA weight halves
    pub decay_half_life: u32,
}

/// Sets up the program. The initial index updater list is empty and is
/// filled through `set_index_updaters`.
pub fn init<'info>(ctx: Context<'_, '_, '_, 'info, Init<'info>>, params: &InitParams) -> Result<()> {
    Protocol::validate_upgrade_authority(
        ctx.accounts.upgrade_authority.key(),
        &ctx.accounts.ipor_amm_program_data,
        &ctx.accounts.ipor_amm_program,
    )?;

    let mut multisig = ctx.accounts.multisig.load_init()?;
    multisig.set_signers(&params.admin_signers, params.min_signatures)?;
    multisig.bump = ctx.bumps.multisig;

    let protocol = ctx.accounts.protocol.as_mut();
    protocol.permissions.allow_open_swap = params.allow_open_swap;
    protocol.permissions.allow_close_swap = params.allow_close_swap;
    protocol.permissions.allow_provide_liquidity = params.allow_provide_liquidity;
    protocol.permissions.allow_redeem = params.allow_redeem;
    protocol.permissions.allow_index_update = params.allow_index_update;
    protocol.transfer_authority_bump = ctx.bumps.transfer_authority;
    protocol.protocol_bump = ctx.bumps.protocol;
    protocol.inception_time = protocol.get_time()?;

    if !protocol.validate() {
        return err!(IporError::InvalidProtocolConfig);
    }

    let ipor_oracle = ctx.accounts.ipor_oracle.as_mut();
    ipor_oracle.updaters = Vec::new();
    ipor_oracle.decay_half_life = params.decay_half_life;
    ipor_oracle.bump = ctx.bumps.ipor_oracle;

    if !ipor_oracle.validate() {
        return err!(IporError::InvalidOracleConfig);
    }

    Ok(())
}
