//! SetAdminSigners instruction handler

use {
    crate::state::multisig::{AdminInstruction, Multisig},
    anchor_lang::prelude::*,
};

#[derive(Accounts)]
pub struct SetAdminSigners<'info> {
    #[account()]
    pub admin: Signer<'info>,

    #[account(
        mut,
        seeds = [b"multisig"],
        bump = multisig.load()?.bump
    )]
    pub multisig: AccountLoader<'info, Multisig>,
}

#[derive(AnchorSerialize, AnchorDeserialize)]
pub struct SetAdminSignersParams {
    /// New admin set, 1 to `Multisig::MAX_SIGNERS` distinct keys
    pub signers: Vec<Pubkey>,
    pub min_signatures: u8,
}

/// Replaces the admin set once enough current admins approved it. Returns
/// the number of approvals still required.
pub fn set_admin_signers<'info>(
    ctx: Context<'_, '_, '_, 'info, SetAdminSigners<'info>>,
    params: &SetAdminSignersParams,
) -> Result<u8> {
    let approvals_left = Multisig::approve(
        &ctx,
        &ctx.accounts.multisig,
        &ctx.accounts.admin,
        AdminInstruction::SetAdminSigners,
        params,
    )?;
    if approvals_left > 0 {
        return Ok(approvals_left);
    }

    ctx.accounts
        .multisig
        .load_mut()?
        .set_signers(&params.signers, params.min_signatures)?;
    msg!(
        "Admin signers replaced: {} of {}",
        params.min_signatures,
        params.signers.len()
    );

    Ok(0)
}
