//! UpdateIndexes instruction handler
//!
//! Publishes index values for several assets at once. Every update is
//! computed before any account is written, so one invalid entry rejects the
//! whole batch.

use {
    crate::{
        error::IporError,
        events::IndexUpdated,
        state::{
            ipor_oracle::{IporIndex, IporOracle},
            protocol::Protocol,
        },
    },
    anchor_lang::prelude::*,
};

#[derive(Accounts)]
pub struct UpdateIndexes<'info> {
    pub updater: Signer<'info>,

    #[account(
        seeds = [b"protocol"],
        bump = protocol.protocol_bump
    )]
    pub protocol: Box<Account<'info, Protocol>>,

    #[account(
        seeds = [b"ipor_oracle"],
        bump = ipor_oracle.bump
    )]
    pub ipor_oracle: Box<Account<'info, IporOracle>>,
    // remaining accounts:
    //   assets.len() index accounts in the order of assets (writable, unsigned)
}

#[derive(AnchorSerialize, AnchorDeserialize)]
pub struct UpdateIndexesParams {
    pub assets: Vec<Pubkey>,
    pub index_values: Vec<u128>,
    pub timestamp: i64,
}

pub fn update_indexes<'info>(
    ctx: Context<'_, '_, 'info, 'info, UpdateIndexes<'info>>,
    params: &UpdateIndexesParams,
) -> Result<()> {
    msg!("Check permissions");
    let protocol = ctx.accounts.protocol.as_ref();
    require!(
        protocol.permissions.allow_index_update,
        IporError::InstructionNotAllowed
    );
    let ipor_oracle = ctx.accounts.ipor_oracle.as_ref();
    ipor_oracle.check_updater(ctx.accounts.updater.key)?;

    msg!("Validate inputs");
    let curtime = protocol.get_time()?;
    if params.timestamp > curtime {
        msg!("Error: Index timestamp {} is in the future", params.timestamp);
        return err!(IporError::InvalidTimestamp);
    }

    let mut accounts = Vec::with_capacity(ctx.remaining_accounts.len());
    for info in ctx.remaining_accounts.iter() {
        require!(info.is_writable, ErrorCode::ConstraintMut);
        let ipor_index = Account::<IporIndex>::try_from(info)?;
        let expected_key = Pubkey::create_program_address(
            &[b"ipor_index", ipor_index.asset.as_ref(), &[ipor_index.bump]],
            &crate::ID,
        )
        .map_err(|_| error!(ErrorCode::ConstraintSeeds))?;
        require_keys_eq!(info.key(), expected_key, ErrorCode::ConstraintSeeds);
        accounts.push(ipor_index);
    }

    msg!("Compute updates");
    let indexes: Vec<IporIndex> = accounts.iter().map(|acc| (**acc).clone()).collect();
    let updates = IporIndex::get_batch_updated(
        &indexes,
        &params.assets,
        &params.index_values,
        params.timestamp,
        ipor_oracle.decay_half_life,
    )?;

    msg!("Update indexes");
    for (mut ipor_index, updated) in accounts.into_iter().zip(updates) {
        emit!(IndexUpdated {
            asset: updated.asset,
            index_value: updated.index_value,
            ibt_price: updated.ibt_price,
            exponential_moving_average: updated.exponential_moving_average,
            exponential_weighted_moving_variance: updated.exponential_weighted_moving_variance,
            timestamp: params.timestamp,
        });
        ipor_index.set_inner(updated);
        ipor_index.exit(&crate::ID)?;
    }

    Ok(())
}
