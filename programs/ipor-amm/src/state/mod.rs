pub mod ipor_oracle;
pub mod lp_contribution;
pub mod multisig;
pub mod pool;
pub mod protocol;
pub mod quasi_interest;
pub mod soap_indicator;
pub mod spread;
pub mod swap;
