//! Program events

use {crate::state::swap::Leg, anchor_lang::prelude::*};

#[event]
pub struct IndexUpdated {
    pub asset: Pubkey,
    pub index_value: u128,
    pub ibt_price: u128,
    pub exponential_moving_average: u128,
    pub exponential_weighted_moving_variance: u128,
    pub timestamp: i64,
}

#[event]
pub struct SwapOpened {
    pub swap_id: u64,
    pub buyer: Pubkey,
    pub asset: Pubkey,
    pub leg: Leg,
    pub total_amount: u128,
    pub collateral: u128,
    pub notional: u128,
    pub opening_fee: u128,
    pub liquidation_deposit: u128,
    pub ipor_publication_fee: u128,
    pub fixed_interest_rate: u128,
    pub ibt_quantity: u128,
    pub open_timestamp: i64,
    pub end_timestamp: i64,
}

#[event]
pub struct SwapClosed {
    pub swap_id: u64,
    pub buyer: Pubkey,
    pub closer: Pubkey,
    pub asset: Pubkey,
    pub leg: Leg,
    pub payoff: i128,
    pub income_fee: u128,
    pub buyer_amount: u128,
    pub closer_amount: u128,
    pub close_timestamp: i64,
}

#[event]
pub struct LiquidityProvided {
    pub asset: Pubkey,
    pub provider: Pubkey,
    pub amount: u128,
    pub exchange_rate: u128,
    pub share_amount: u128,
    pub timestamp: i64,
}

#[event]
pub struct LiquidityRedeemed {
    pub asset: Pubkey,
    pub provider: Pubkey,
    pub share_amount: u128,
    pub exchange_rate: u128,
    pub gross_amount: u128,
    pub redeem_fee: u128,
    pub payout: u128,
    pub timestamp: i64,
}

#[event]
pub struct TreasuryTransferred {
    pub asset: Pubkey,
    pub treasury: Pubkey,
    pub amount: u128,
}

#[event]
pub struct PublicationFeeTransferred {
    pub asset: Pubkey,
    pub publication_fee_treasury: Pubkey,
    pub amount: u128,
}
