//! UpdateIndex instruction handler
//!
//! Publishes a new index value for one asset. Only accounts on the oracle's
//! updater list may publish.

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
pub struct UpdateIndex<'info> {
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

    #[account(
        mut,
        seeds = [b"ipor_index",
                 ipor_index.asset.as_ref()],
        bump = ipor_index.bump
    )]
    pub ipor_index: Box<Account<'info, IporIndex>>,
}

#[derive(AnchorSerialize, AnchorDeserialize)]
pub struct UpdateIndexParams {
    pub index_value: u128,
    /// Observation time, not later than the current time
    pub timestamp: i64,
}

pub fn update_index(ctx: Context<UpdateIndex>, params: &UpdateIndexParams) -> Result<()> {
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

    msg!("Update index");
    let ipor_index = ctx.accounts.ipor_index.as_mut();
    ipor_index.update(
        params.index_value,
        params.timestamp,
        ipor_oracle.decay_half_life,
    )?;
    msg!(
        "Index {} ibt price {} ema {} ewmv {}",
        ipor_index.index_value,
        ipor_index.ibt_price,
        ipor_index.exponential_moving_average,
        ipor_index.exponential_weighted_moving_variance
    );

    emit!(IndexUpdated {
        asset: ipor_index.asset,
        index_value: ipor_index.index_value,
        ibt_price: ipor_index.ibt_price,
        exponential_moving_average: ipor_index.exponential_moving_average,
        exponential_weighted_moving_variance: ipor_index.exponential_weighted_moving_variance,
        timestamp: params.timestamp,
    });

    Ok(())
}
