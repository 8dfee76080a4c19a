// admin instructions
pub mod add_pool;
pub mod init;
pub mod set_admin_signers;
pub mod set_index_updaters;
pub mod set_permissions;
pub mod set_pool_config;
pub mod set_test_time;

// oracle instructions
pub mod get_index;
pub mod update_index;
pub mod update_indexes;

// swap instructions
pub mod calculate_position_value;
pub mod calculate_soap;
pub mod close_swap;
pub mod close_swaps;
pub mod get_accrued_balance;
pub mod open_swap;

// liquidity instructions
pub mod calculate_exchange_rate;
pub mod provide_liquidity;
pub mod redeem;
pub mod transfer_publication_fee;
pub mod transfer_to_treasury;

// bring everything in scope
pub use {
    add_pool::*, calculate_exchange_rate::*, calculate_position_value::*, calculate_soap::*,
    close_swap::*, close_swaps::*, get_accrued_balance::*, get_index::*, init::*, open_swap::*,
    provide_liquidity::*, redeem::*, set_admin_signers::*, set_index_updaters::*,
    set_permissions::*, set_pool_config::*, set_test_time::*, transfer_publication_fee::*,
    transfer_to_treasury::*, update_index::*, update_indexes::*,
};
