use anchor_lang::prelude::*;

/// Liquidity provided by one account to one pool, net of redemptions
#[account]
#[derive(Default, Debug)]
pub struct LpContribution {
    pub pool: Pubkey,
    pub owner: Pubkey,
    pub amount: u128,
    pub bump: u8,
}

impl LpContribution {
    pub const LEN: usize = 8 + std::mem::size_of::<LpContribution>();

    pub fn is_initialized(&self) -> bool {
        self.owner != Pubkey::default()
    }

    /// Binds a freshly created record to its pool and owner. Existing
    /// records are left as they are.
    pub fn init_if_needed(&mut self, pool: Pubkey, owner: Pubkey, bump: u8) {
        if !self.is_initialized() {
            self.pool = pool;
            self.owner = owner;
            self.amount = 0;
            self.bump = bump;
        }
    }
}
