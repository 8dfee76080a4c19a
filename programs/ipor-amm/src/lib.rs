//! Interest rate swap AMM referencing the IPOR index

#![allow(unexpected_cfgs)]

pub mod error;
pub mod events;
pub mod instructions;
pub mod math;
pub mod state;

use {
    anchor_lang::prelude::*,
    instructions::*,
    state::{
        ipor_oracle::AccruedIndex,
        pool::{Balance, Soap},
        swap::Leg,
    },
};

#[cfg(not(feature = "no-entrypoint"))]
solana_security_txt::security_txt! {
    name: "IPOR AMM",
    project_url: "https://ipor.io",
    contacts: "email:security@ipor.io",
    policy: "",
    preferred_languages: "en",
    auditors: ""
}

declare_id!("9DJpbxWxk9SVyNRjDYYTtP3ctYAsW8YJLzkr7iVwyRan");

#[program]
pub mod ipor_amm {
    use super::*;

    // admin instructions

    pub fn init<'info>(ctx: Context<'_, '_, '_, 'info, Init<'info>>, params: InitParams) -> Result<()> {
        instructions::init(ctx, &params)
    }

    pub fn set_admin_signers<'info>(
        ctx: Context<'_, '_, '_, 'info, SetAdminSigners<'info>>,
        params: SetAdminSignersParams,
    ) -> Result<u8> {
        instructions::set_admin_signers(ctx, &params)
    }

    pub fn set_permissions<'info>(
        ctx: Context<'_, '_, '_, 'info, SetPermissions<'info>>,
        params: SetPermissionsParams,
    ) -> Result<u8> {
        instructions::set_permissions(ctx, &params)
    }

    pub fn add_pool<'info>(
        ctx: Context<'_, '_, '_, 'info, AddPool<'info>>,
        params: AddPoolParams,
    ) -> Result<u8> {
        instructions::add_pool(ctx, &params)
    }

    pub fn set_pool_config<'info>(
        ctx: Context<'_, '_, '_, 'info, SetPoolConfig<'info>>,
        params: SetPoolConfigParams,
    ) -> Result<u8> {
        instructions::set_pool_config(ctx, &params)
    }

    pub fn set_index_updaters<'info>(
        ctx: Context<'_, '_, '_, 'info, SetIndexUpdaters<'info>>,
        params: SetIndexUpdatersParams,
    ) -> Result<u8> {
        instructions::set_index_updaters(ctx, &params)
    }

    pub fn set_test_time<'info>(
        ctx: Context<'_, '_, '_, 'info, SetTestTime<'info>>,
        params: SetTestTimeParams,
    ) -> Result<u8> {
        instructions::set_test_time(ctx, &params)
    }

    // oracle instructions

    pub fn update_index(ctx: Context<UpdateIndex>, params: UpdateIndexParams) -> Result<()> {
        instructions::update_index(ctx, &params)
    }

    pub fn update_indexes<'info>(
        ctx: Context<'_, '_, 'info, 'info, UpdateIndexes<'info>>,
        params: UpdateIndexesParams,
    ) -> Result<()> {
        instructions::update_indexes(ctx, &params)
    }

    pub fn get_index(ctx: Context<GetIndex>, params: GetIndexParams) -> Result<AccruedIndex> {
        instructions::get_index(ctx, &params)
    }

    // swap instructions

    pub fn open_swap_pay_fixed(ctx: Context<OpenSwap>, params: OpenSwapParams) -> Result<u64> {
        instructions::open_swap(ctx, &params, Leg::PayFixed)
    }

    pub fn open_swap_receive_fixed(ctx: Context<OpenSwap>, params: OpenSwapParams) -> Result<u64> {
        instructions::open_swap(ctx, &params, Leg::ReceiveFixed)
    }

    pub fn close_swap_pay_fixed(ctx: Context<CloseSwap>) -> Result<()> {
        instructions::close_swap(ctx, Leg::PayFixed)
    }

    pub fn close_swap_receive_fixed(ctx: Context<CloseSwap>) -> Result<()> {
        instructions::close_swap(ctx, Leg::ReceiveFixed)
    }

    pub fn close_swaps<'info>(
        ctx: Context<'_, '_, 'info, 'info, CloseSwaps<'info>>,
        params: CloseSwapsParams,
    ) -> Result<Vec<u64>> {
        instructions::close_swaps(ctx, &params)
    }

    pub fn calculate_soap(ctx: Context<CalculateSoap>, params: CalculateSoapParams) -> Result<Soap> {
        instructions::calculate_soap(ctx, &params)
    }

    pub fn calculate_position_value(
        ctx: Context<CalculatePositionValue>,
        params: CalculatePositionValueParams,
    ) -> Result<PositionValue> {
        instructions::calculate_position_value(ctx, &params)
    }

    pub fn get_accrued_balance(
        ctx: Context<GetAccruedBalance>,
        params: GetAccruedBalanceParams,
    ) -> Result<Balance> {
        instructions::get_accrued_balance(ctx, &params)
    }

    // liquidity instructions

    pub fn provide_liquidity(
        ctx: Context<ProvideLiquidity>,
        params: ProvideLiquidityParams,
    ) -> Result<()> {
        instructions::provide_liquidity(ctx, &params)
    }

    pub fn redeem(ctx: Context<Redeem>, params: RedeemParams) -> Result<()> {
        instructions::redeem(ctx, &params)
    }

    pub fn calculate_exchange_rate(
        ctx: Context<CalculateExchangeRate>,
        params: CalculateExchangeRateParams,
    ) -> Result<u128> {
        instructions::calculate_exchange_rate(ctx, &params)
    }

    pub fn transfer_to_treasury(
        ctx: Context<TransferToTreasury>,
        params: TransferToTreasuryParams,
    ) -> Result<()> {
        instructions::transfer_to_treasury(ctx, &params)
    }

    pub fn transfer_publication_fee(
        ctx: Context<TransferPublicationFee>,
        params: TransferPublicationFeeParams,
    ) -> Result<()> {
        instructions::transfer_publication_fee(ctx, &params)
    }
}
