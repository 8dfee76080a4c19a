use anchor_lang::prelude::*;

#[error_code]
pub enum IporError {
    #[msg("Account is not authorized to sign this instruction")]
    MultisigAccountNotAuthorized,
    #[msg("Account has already signed this instruction")]
    MultisigAlreadySigned,
    #[msg("Admin signer set is invalid")]
    InvalidAdminSigners,
    #[msg("Math overflow")]
    MathOverflow,
    #[msg("Instruction is not allowed in production")]
    InvalidEnvironment,
    #[msg("Invalid protocol config")]
    InvalidProtocolConfig,
    #[msg("Invalid pool config")]
    InvalidPoolConfig,
    #[msg("Invalid oracle config")]
    InvalidOracleConfig,
    #[msg("Instruction is not allowed at this time")]
    InstructionNotAllowed,
    #[msg("Unsupported asset")]
    UnsupportedAsset,
    #[msg("Caller is not an index updater")]
    CallerNotIndexUpdater,
    #[msg("Caller is not the treasury manager")]
    CallerNotTreasuryManager,
    #[msg("Caller is not the publication fee transferer")]
    CallerNotPublicationFeeTransferer,
    #[msg("Index update is older than the stored index")]
    StaleIndexUpdate,
    #[msg("Index has never been published")]
    IndexNotPublished,
    #[msg("Invalid timestamp")]
    InvalidTimestamp,
    #[msg("Parallel arrays have different lengths")]
    ArityMismatch,
    #[msg("Asset is listed more than once")]
    DuplicateAsset,
    #[msg("Index account does not belong to the listed asset")]
    IndexAssetMismatch,
    #[msg("Invalid amount")]
    InvalidAmount,
    #[msg("Leverage is out of the configured range")]
    LeverageOutOfRange,
    #[msg("Total amount does not cover the fees")]
    TotalAmountBelowFees,
    #[msg("Collateral amount is too high")]
    CollateralTooHigh,
    #[msg("Quoted fixed rate is worse than the acceptable rate")]
    AcceptableFixedRateExceeded,
    #[msg("Liquidity pool balance cap exceeded")]
    LiquidityPoolBalanceTooHigh,
    #[msg("Account contribution cap exceeded")]
    AccountContributionTooHigh,
    #[msg("Amount exceeds the available balance")]
    AmountExceedsBalance,
    #[msg("Amount returned is below the requested minimum")]
    InsufficientAmountReturned,
    #[msg("Too many swaps in one batch")]
    TooManySwaps,
    #[msg("Liquidity pool utilization exceeded")]
    UtilizationExceeded,
    #[msg("Liquidity pool utilization per leg exceeded")]
    UtilizationPerLegExceeded,
    #[msg("Liquidity pool utilization after redeem exceeded")]
    RedeemUtilizationExceeded,
    #[msg("SOAP exceeds the liquidity pool balance")]
    SoapExceedsLiquidityPool,
    #[msg("Liquidity pool balance is too low")]
    LiquidityPoolTooLow,
    #[msg("Swap is not active")]
    SwapNotActive,
    #[msg("Swap belongs to the other leg")]
    WrongLeg,
    #[msg("Swap can be closed only by its buyer before maturity")]
    CloseNotAllowed,
    #[msg("Closed notional exceeds the tracked notional")]
    SoapNotionalUnderflow,
    #[msg("Invalid swap account")]
    InvalidSwapAccount,
}
