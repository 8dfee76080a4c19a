//! GetIndex instruction handler (view)

use {
    crate::state::ipor_oracle::{AccruedIndex, IporIndex},
    anchor_lang::prelude::*,
};

#[derive(Accounts)]
pub struct GetIndex<'info> {
    #[account(
        seeds = [b"ipor_index",
                 ipor_index.asset.as_ref()],
        bump = ipor_index.bump
    )]
    pub ipor_index: Box<Account<'info, IporIndex>>,
}

#[derive(AnchorSerialize, AnchorDeserialize)]
pub struct GetIndexParams {
    pub timestamp: i64,
}

/// Last published index with the IBT price accrued to `timestamp`
pub fn get_index(ctx: Context<GetIndex>, params: &GetIndexParams) -> Result<AccruedIndex> {
    ctx.accounts.ipor_index.get_accrued(params.timestamp)
}
