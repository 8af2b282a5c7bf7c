//! Priority-fee estimation from recent network observations.

use std::collections::HashSet;

use solana_message::Instruction;
use solana_pubkey::Pubkey;

use crate::network::PrioritizationFeeSample;

/// Maximum number of accounts accepted by `getRecentPrioritizationFees`.
pub const MAX_FEE_ACCOUNTS: usize = 128;

/// Bounds applied to a raw priority-fee estimate.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct PriorityFeePolicy {
    /// Lowest fee ever paid, micro-lamports per compute unit.
    pub floor: u64,
    /// Highest fee ever paid, micro-lamports per compute unit.
    pub ceiling: u64,
}

impl Default for PriorityFeePolicy {
    fn default() -> Self {
        Self {
            floor: 0,
            ceiling: 1_000_000,
        }
    }
}

impl PriorityFeePolicy {
    /// Returns a normalized policy where `ceiling >= floor`.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            floor: self.floor,
            ceiling: self.ceiling.max(self.floor),
        }
    }

    /// Clamps an estimate into the policy bounds.
    #[must_use]
    pub fn apply(self, estimate: u64) -> u64 {
        let policy = self.normalized();
        estimate.clamp(policy.floor, policy.ceiling)
    }
}

/// Collects the accounts a transaction will write, payer first, in instruction order.
#[must_use]
pub fn writable_accounts(payer: &Pubkey, instructions: &[Instruction]) -> Vec<Pubkey> {
    let mut seen = HashSet::new();
    let mut accounts = Vec::new();

    if seen.insert(*payer) {
        accounts.push(*payer);
    }

    for meta in instructions
        .iter()
        .flat_map(|instruction| instruction.accounts.iter())
        .filter(|meta| meta.is_writable)
    {
        if accounts.len() >= MAX_FEE_ACCOUNTS {
            break;
        }
        if seen.insert(meta.pubkey) {
            accounts.push(meta.pubkey);
        }
    }

    accounts
}

/// Returns the highest observed fee, or zero when nothing was observed.
#[must_use]
pub fn estimate_priority_fee(samples: &[PrioritizationFeeSample]) -> u64 {
    samples
        .iter()
        .map(|sample| sample.prioritization_fee)
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use solana_instruction::AccountMeta;

    use super::*;

    fn sample(slot: u64, fee: u64) -> PrioritizationFeeSample {
        PrioritizationFeeSample {
            slot,
            prioritization_fee: fee,
        }
    }

    #[test]
    fn estimate_is_maximum_observation() {
        let samples = vec![sample(10, 5), sample(11, 1_200), sample(12, 0), sample(13, 40)];
        assert_eq!(estimate_priority_fee(&samples), 1_200);
    }

    #[test]
    fn estimate_is_zero_without_observations() {
        assert_eq!(estimate_priority_fee(&[]), 0);
    }

    #[test]
    fn policy_clamps_into_bounds() {
        let policy = PriorityFeePolicy {
            floor: 100,
            ceiling: 5_000,
        };
        assert_eq!(policy.apply(0), 100);
        assert_eq!(policy.apply(2_500), 2_500);
        assert_eq!(policy.apply(80_000), 5_000);
    }

    #[test]
    fn inverted_policy_is_normalized() {
        let policy = PriorityFeePolicy {
            floor: 900,
            ceiling: 10,
        };
        assert_eq!(policy.apply(0), 900);
        assert_eq!(policy.apply(9_999), 900);
    }

    #[test]
    fn writable_accounts_dedupes_and_skips_readonly() {
        let payer = Pubkey::new_unique();
        let source = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let first = Pubkey::new_unique();
        let second = Pubkey::new_unique();
        let program = Pubkey::new_unique();
        let instruction = Instruction::new_with_bytes(
            program,
            &[1],
            vec![
                AccountMeta::new(source, false),
                AccountMeta::new_readonly(payer, true),
                AccountMeta::new_readonly(mint, false),
                AccountMeta::new(first, false),
                AccountMeta::new(second, false),
                AccountMeta::new(first, false),
            ],
        );

        assert_eq!(
            writable_accounts(&payer, &[instruction]),
            vec![payer, source, first, second]
        );
    }

    #[test]
    fn writable_accounts_respects_rpc_limit() {
        let payer = Pubkey::new_unique();
        let metas = (0..200)
            .map(|_| AccountMeta::new(Pubkey::new_unique(), false))
            .collect();
        let instruction = Instruction::new_with_bytes(Pubkey::new_unique(), &[], metas);
        assert_eq!(
            writable_accounts(&payer, &[instruction]).len(),
            MAX_FEE_ACCOUNTS
        );
    }
}
