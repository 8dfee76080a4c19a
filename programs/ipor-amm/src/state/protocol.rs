//! Root protocol account and token helpers
//!
//! Holds the global permission switches, the list of pools and the bump of
//! the `transfer_authority` PDA that owns every pool token account and share
//! mint.

use {
    crate::error::IporError,
    anchor_lang::prelude::*,
    anchor_spl::token::{Burn, MintTo, Transfer},
};

/// Operation switches, flipped by the admin multisig
#[derive(Copy, Clone, PartialEq, AnchorSerialize, AnchorDeserialize, Default, Debug)]
pub struct Permissions {
    pub allow_open_swap: bool,
    pub allow_close_swap: bool,
    pub allow_provide_liquidity: bool,
    pub allow_redeem: bool,
    pub allow_index_update: bool,
}

#[account]
#[derive(Default, Debug)]
pub struct Protocol {
    pub permissions: Permissions,
    /// Pool addresses, one per asset
    pub pools: Vec<Pubkey>,

    pub transfer_authority_bump: u8,
    pub protocol_bump: u8,
    /// Time of inception, also used as current wall clock time for testing
    pub inception_time: i64,
}

impl anchor_lang::Id for Protocol {
    fn id() -> Pubkey {
        crate::ID
    }
}

impl Protocol {
    pub const LEN: usize = 8 + std::mem::size_of::<Protocol>();

    pub fn validate(&self) -> bool {
        true
    }

    #[cfg(feature = "test")]
    pub fn get_time(&self) -> Result<i64> {
        Ok(self.inception_time)
    }

    /// Moves the clock returned by `get_time`
    #[cfg(feature = "test")]
    pub fn set_test_time(&mut self, time: i64) -> Result<()> {
        require!(time > 0, IporError::InvalidTimestamp);
        self.inception_time = time;
        Ok(())
    }

    #[cfg(not(feature = "test"))]
    pub fn set_test_time(&mut self, _time: i64) -> Result<()> {
        err!(IporError::InvalidEnvironment)
    }

    #[cfg(not(feature = "test"))]
    pub fn get_time(&self) -> Result<i64> {
        let time = Clock::get()?.unix_timestamp;
        if time > 0 {
            Ok(time)
        } else {
            Err(ProgramError::InvalidAccountData.into())
        }
    }

    pub fn validate_upgrade_authority<'a>(
        expected_upgrade_authority: Pubkey,
        program_data: &AccountInfo<'a>,
        program: &Program<crate::program::IporAmm>,
    ) -> Result<()> {
        if let Some(programdata_address) = program.programdata_address()? {
            require_keys_eq!(
                programdata_address,
                program_data.key(),
                ErrorCode::InvalidProgramExecutable
            );
            // `Account::try_from` needs a `&'a AccountInfo<'a>` borrow
            let program_data: &'a AccountInfo<'a> = Box::leak(Box::new(program_data.clone()));
            let program_data: Account<ProgramData> = Account::try_from(program_data)?;
            if let Some(current_upgrade_authority) = program_data.upgrade_authority_address {
                if current_upgrade_authority != Pubkey::default() {
                    require_keys_eq!(
                        current_upgrade_authority,
                        expected_upgrade_authority,
                        ErrorCode::ConstraintOwner
                    );
                }
            }
        } // otherwise not upgradeable

        Ok(())
    }

    /// Transfers out of a pool token account, signed by the transfer authority
    pub fn transfer_tokens<'info>(
        &self,
        from: AccountInfo<'info>,
        to: AccountInfo<'info>,
        authority: AccountInfo<'info>,
        token_program: AccountInfo<'info>,
        amount: u64,
    ) -> Result<()> {
        let authority_seeds: &[&[&[u8]]] =
            &[&[b"transfer_authority", &[self.transfer_authority_bump]]];

        let context = CpiContext::new(
            token_program,
            Transfer {
                from,
                to,
                authority,
            },
        )
        .with_signer(authority_seeds);

        anchor_spl::token::transfer(context, amount)
    }

    pub fn transfer_tokens_from_user<'info>(
        &self,
        from: AccountInfo<'info>,
        to: AccountInfo<'info>,
        authority: AccountInfo<'info>,
        token_program: AccountInfo<'info>,
        amount: u64,
    ) -> Result<()> {
        let context = CpiContext::new(
            token_program,
            Transfer {
                from,
                to,
                authority,
            },
        );
        anchor_spl::token::transfer(context, amount)
    }

    /// Mints pool shares, signed by the transfer authority
    pub fn mint_tokens<'info>(
        &self,
        mint: AccountInfo<'info>,
        to: AccountInfo<'info>,
        authority: AccountInfo<'info>,
        token_program: AccountInfo<'info>,
        amount: u64,
    ) -> Result<()> {
        let authority_seeds: &[&[&[u8]]] =
            &[&[b"transfer_authority", &[self.transfer_authority_bump]]];

        let context = CpiContext::new(
            token_program,
            MintTo {
                mint,
                to,
                authority,
            },
        )
        .with_signer(authority_seeds);

        anchor_spl::token::mint_to(context, amount)
    }

    /// Burns pool shares from an account owned by `authority`
    pub fn burn_tokens<'info>(
        &self,
        mint: AccountInfo<'info>,
        from: AccountInfo<'info>,
        authority: AccountInfo<'info>,
        token_program: AccountInfo<'info>,
        amount: u64,
    ) -> Result<()> {
        let context = CpiContext::new(
            token_program,
            Burn {
                mint,
                from,
                authority,
            },
        );

        anchor_spl::token::burn(context, amount)
    }
}
