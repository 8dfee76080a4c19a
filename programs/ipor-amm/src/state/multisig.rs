//! Admin multisig
//!
//! Admin instructions run once `min_signatures` distinct admins approved the
//! same proposal. A proposal is the instruction kind, the keys of the
//! accounts it touches and its serialized parameters. Approvals are kept as
//! a bitmask over signer slots, and an approval for anything else replaces
//! the pending proposal.

use {
    crate::error::IporError,
    anchor_lang::prelude::*,
    core::hash::{BuildHasher, Hasher},
};

#[repr(C)]
#[account(zero_copy)]
#[derive(Default)]
pub struct Multisig {
    pub signers: [Pubkey; 6], // Multisig::MAX_SIGNERS
    pub proposal_hash: u64,
    /// Bit `i` set when `signers[i]` approved the pending proposal
    pub approvals: u16,
    pub num_signers: u8,
    pub min_signatures: u8,
    pub proposal_instruction: u8,
    /// Non-zero once the pending proposal collected enough approvals
    pub executed: u8,
    pub bump: u8,
    pub _padding: [u8; 1],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AdminInstruction {
    AddPool,
    SetAdminSigners,
    SetPoolConfig,
    SetPermissions,
    SetIndexUpdaters,
    SetTestTime,
}

impl Multisig {
    pub const MAX_SIGNERS: usize = 6;
    pub const LEN: usize = 8 + std::mem::size_of::<Multisig>();

    pub fn get_proposal_hash(
        instruction: AdminInstruction,
        account_keys: &[Pubkey],
        params: &[u8],
    ) -> u64 {
        let build_hasher = ahash::RandomState::with_seeds(
            0x1b0e_7a3c_55d2_94f1,
            0x6c4f_2e81_d93a_0b57,
            0x3a95_c0d7_18e4_6f22,
            0x7d21_b6f8_0c5e_a943,
        );
        let mut hasher = build_hasher.build_hasher();
        hasher.write_u8(instruction as u8);
        hasher.write_usize(account_keys.len());
        for key in account_keys {
            hasher.write(key.as_ref());
        }
        hasher.write(params);
        hasher.finish()
    }

    /// Counts the approval of `admin` for the instruction being executed
    /// with `params`. Returns the number of approvals still missing, zero
    /// meaning the caller may apply the instruction now.
    pub fn approve<'info, T, P>(
        ctx: &Context<'_, '_, '_, 'info, T>,
        multisig: &AccountLoader<'info, Multisig>,
        admin: &Signer<'info>,
        instruction: AdminInstruction,
        params: &P,
    ) -> Result<u8>
    where
        T: ToAccountInfos<'info> + anchor_lang::Bumps,
        P: AnchorSerialize,
    {
        let account_keys: Vec<Pubkey> = ctx
            .accounts
            .to_account_infos()
            .iter()
            .chain(ctx.remaining_accounts.iter())
            .map(|info| *info.key)
            .filter(|key| key != admin.key)
            .collect();
        let mut data = vec![];
        AnchorSerialize::serialize(params, &mut data)?;
        let proposal_hash = Self::get_proposal_hash(instruction, &account_keys, &data);

        let approvals_left =
            multisig
                .load_mut()?
                .record_approval(admin.key, instruction, proposal_hash)?;
        if approvals_left > 0 {
            msg!(
                "{:?} approved, {} more approvals required",
                instruction,
                approvals_left
            );
        }
        Ok(approvals_left)
    }

    pub fn record_approval(
        &mut self,
        signer: &Pubkey,
        instruction: AdminInstruction,
        proposal_hash: u64,
    ) -> Result<u8> {
        let bit = 1u16 << self.get_signer_index(signer)?;

        let is_pending = self.executed == 0
            && self.proposal_hash == proposal_hash
            && self.proposal_instruction == instruction as u8;
        if !is_pending {
            self.proposal_hash = proposal_hash;
            self.proposal_instruction = instruction as u8;
            self.approvals = bit;
            self.executed = 0;
        } else if self.approvals & bit != 0 {
            return err!(IporError::MultisigAlreadySigned);
        } else {
            self.approvals |= bit;
        }

        let approvals_left = self
            .min_signatures
            .saturating_sub(self.approvals.count_ones() as u8);
        if approvals_left == 0 {
            self.executed = 1;
        }
        Ok(approvals_left)
    }

    /// Replaces the signer set. Any pending proposal is dropped.
    pub fn set_signers(&mut self, keys: &[Pubkey], min_signatures: u8) -> Result<()> {
        if keys.is_empty() || keys.len() > Self::MAX_SIGNERS {
            msg!(
                "Error: {} signers given, expected 1 to {}",
                keys.len(),
                Self::MAX_SIGNERS
            );
            return err!(IporError::InvalidAdminSigners);
        }
        if min_signatures == 0 || min_signatures as usize > keys.len() {
            msg!(
                "Error: {} signatures required from {} signers",
                min_signatures,
                keys.len()
            );
            return err!(IporError::InvalidAdminSigners);
        }

        let mut signers = [Pubkey::default(); Self::MAX_SIGNERS];
        for (idx, key) in keys.iter().enumerate() {
            if *key == Pubkey::default() || keys[..idx].contains(key) {
                msg!("Error: Invalid or repeated signer {}", key);
                return err!(IporError::InvalidAdminSigners);
            }
            signers[idx] = *key;
        }

        *self = Multisig {
            signers,
            num_signers: keys.len() as u8,
            min_signatures,
            bump: self.bump,
            ..Default::default()
        };
        Ok(())
    }

    pub fn get_signer_index(&self, signer: &Pubkey) -> Result<usize> {
        self.signers[..self.num_signers as usize]
            .iter()
            .position(|key| key == signer)
            .ok_or_else(|| error!(IporError::MultisigAccountNotAuthorized))
    }

    pub fn is_signer(&self, key: &Pubkey) -> bool {
        self.get_signer_index(key).is_ok()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn get_fixture(num_signers: usize, min_signatures: u8) -> (Multisig, Vec<Pubkey>) {
        let keys: Vec<Pubkey> = (0..num_signers).map(|_| Pubkey::new_unique()).collect();
        let mut multisig = Multisig {
            bump: 250,
            ..Default::default()
        };
        multisig.set_signers(&keys, min_signatures).unwrap();
        (multisig, keys)
    }

    #[test]
    fn test_layout() {
        assert_eq!(std::mem::size_of::<Multisig>(), 208);
    }

    #[test]
    fn test_set_signers() {
        let (mut multisig, keys) = get_fixture(3, 2);
        assert_eq!(multisig.num_signers, 3);
        assert_eq!(multisig.bump, 250);
        assert!(multisig.is_signer(&keys[2]));
        assert!(!multisig.is_signer(&Pubkey::new_unique()));

        let invalid = error!(IporError::InvalidAdminSigners);
        assert_eq!(multisig.set_signers(&keys, 4).unwrap_err(), invalid);
        assert_eq!(multisig.set_signers(&keys, 0).unwrap_err(), invalid);
        assert_eq!(multisig.set_signers(&[], 1).unwrap_err(), invalid);
        assert_eq!(
            multisig
                .set_signers(&[keys[0], keys[1], keys[0]], 1)
                .unwrap_err(),
            invalid
        );
        assert_eq!(
            multisig
                .set_signers(&[keys[0], Pubkey::default()], 1)
                .unwrap_err(),
            invalid
        );
        let too_many: Vec<Pubkey> = (0..7).map(|_| Pubkey::new_unique()).collect();
        assert_eq!(multisig.set_signers(&too_many, 1).unwrap_err(), invalid);
        assert_eq!(multisig.num_signers, 3);
    }

    #[test]
    fn test_approvals() {
        let (mut multisig, keys) = get_fixture(3, 2);
        let proposal = AdminInstruction::SetPoolConfig;

        assert_eq!(multisig.record_approval(&keys[0], proposal, 42).unwrap(), 1);
        assert_eq!(
            multisig.record_approval(&keys[0], proposal, 42).unwrap_err(),
            error!(IporError::MultisigAlreadySigned)
        );
        assert_eq!(multisig.record_approval(&keys[2], proposal, 42).unwrap(), 0);
        assert_eq!(multisig.approvals, 0b101);
        assert_eq!(multisig.executed, 1);

        // an executed proposal is not reused, submitting it again starts over
        assert_eq!(multisig.record_approval(&keys[1], proposal, 42).unwrap(), 1);
        assert_eq!(multisig.approvals, 0b010);
        assert_eq!(multisig.executed, 0);

        assert_eq!(
            multisig
                .record_approval(&Pubkey::new_unique(), proposal, 42)
                .unwrap_err(),
            error!(IporError::MultisigAccountNotAuthorized)
        );
    }

    #[test]
    fn test_different_proposal_replaces_pending() {
        let (mut multisig, keys) = get_fixture(3, 2);

        assert_eq!(
            multisig
                .record_approval(&keys[0], AdminInstruction::SetPermissions, 7)
                .unwrap(),
            1
        );
        // same hash but another instruction kind
        assert_eq!(
            multisig
                .record_approval(&keys[1], AdminInstruction::SetTestTime, 7)
                .unwrap(),
            1
        );
        assert_eq!(multisig.approvals, 0b010);
        assert_eq!(
            multisig
                .record_approval(&keys[1], AdminInstruction::SetTestTime, 8)
                .unwrap(),
            1
        );
        assert_eq!(
            multisig
                .record_approval(&keys[2], AdminInstruction::SetTestTime, 8)
                .unwrap(),
            0
        );
    }

    #[test]
    fn test_single_signer() {
        let (mut multisig, keys) = get_fixture(1, 1);
        let proposal = AdminInstruction::AddPool;
        assert_eq!(multisig.record_approval(&keys[0], proposal, 1).unwrap(), 0);
        assert_eq!(multisig.record_approval(&keys[0], proposal, 1).unwrap(), 0);
    }

    #[test]
    fn test_signer_change_drops_pending() {
        let (mut multisig, keys) = get_fixture(3, 3);
        let proposal = AdminInstruction::SetIndexUpdaters;
        assert_eq!(multisig.record_approval(&keys[0], proposal, 5).unwrap(), 2);

        multisig.set_signers(&keys, 2).unwrap();
        assert_eq!(multisig.approvals, 0);
        assert_eq!(multisig.record_approval(&keys[0], proposal, 5).unwrap(), 1);
    }

    #[test]
    fn test_proposal_hash() {
        let keys = [Pubkey::new_unique(), Pubkey::new_unique()];
        let params = 7i64.to_le_bytes();
        let hash = Multisig::get_proposal_hash(AdminInstruction::SetTestTime, &keys, &params);

        assert_eq!(
            hash,
            Multisig::get_proposal_hash(AdminInstruction::SetTestTime, &keys, &params)
        );
        assert_ne!(
            hash,
            Multisig::get_proposal_hash(AdminInstruction::AddPool, &keys, &params)
        );
        assert_ne!(
            hash,
            Multisig::get_proposal_hash(AdminInstruction::SetTestTime, &keys[..1], &params)
        );
        assert_ne!(
            hash,
            Multisig::get_proposal_hash(
                AdminInstruction::SetTestTime,
                &keys,
                &8i64.to_le_bytes()
            )
        );
    }
}
