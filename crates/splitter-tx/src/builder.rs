//! Instruction-set template turned into a signed transaction once per attempt.

use solana_compute_budget_interface::ComputeBudgetInstruction;
use solana_message::{Hash, Instruction, Message, VersionedMessage};
use solana_pubkey::Pubkey;
use solana_signer::{SignerError, signers::Signers};
use solana_transaction::versioned::VersionedTransaction;
use thiserror::Error;

/// Builder-layer errors.
#[derive(Debug, Error)]
pub enum BuilderError {
    /// The template carries no instructions.
    #[error("transaction has no instructions")]
    NoInstructions,
    /// A required signer is missing or signing failed.
    #[error("transaction signing failed: {source}")]
    Sign {
        /// Underlying signer error.
        source: SignerError,
    },
}

/// Compute-budget pair placed in front of the caller's instructions.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ComputeBudget {
    /// Compute-unit ceiling of the transaction.
    pub unit_limit: u32,
    /// Priority fee in micro-lamports per compute unit.
    pub unit_price_micro_lamports: u64,
}

impl ComputeBudget {
    /// Returns `SetComputeUnitLimit` followed by `SetComputeUnitPrice`.
    #[must_use]
    pub fn instructions(&self) -> [Instruction; 2] {
        [
            ComputeBudgetInstruction::set_compute_unit_limit(self.unit_limit),
            ComputeBudgetInstruction::set_compute_unit_price(self.unit_price_micro_lamports),
        ]
    }
}

/// Fee payer plus ordered instructions.
///
/// The template is reused across attempts; each attempt compiles it against its own
/// blockhash and compute budget.
#[derive(Debug, Clone)]
pub struct TxBuilder {
    /// Fee payer and first signer.
    payer: Pubkey,
    /// Caller instructions in execution order.
    instructions: Vec<Instruction>,
    /// Budget prefix, if any.
    budget: Option<ComputeBudget>,
}

impl TxBuilder {
    /// Starts an empty template paid by `payer`.
    #[must_use]
    pub const fn new(payer: Pubkey) -> Self {
        Self {
            payer,
            instructions: Vec::new(),
            budget: None,
        }
    }

    /// Appends one instruction.
    #[must_use]
    pub fn add_instruction(mut self, instruction: Instruction) -> Self {
        self.instructions.push(instruction);
        self
    }

    /// Appends many instructions.
    #[must_use]
    pub fn add_instructions<I>(mut self, instructions: I) -> Self
    where
        I: IntoIterator<Item = Instruction>,
    {
        self.instructions.extend(instructions);
        self
    }

    /// Sets the compute-budget prefix, replacing an earlier one.
    #[must_use]
    pub const fn with_compute_budget(mut self, budget: ComputeBudget) -> Self {
        self.budget = Some(budget);
        self
    }

    /// Fee payer.
    #[must_use]
    pub const fn payer(&self) -> &Pubkey {
        &self.payer
    }

    /// Caller instructions; the budget prefix is not included.
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Compiles a legacy message against `blockhash`.
    ///
    /// # Errors
    ///
    /// Returns [`BuilderError::NoInstructions`] for an empty template.
    pub fn compile(&self, blockhash: Hash) -> Result<VersionedMessage, BuilderError> {
        if self.instructions.is_empty() {
            return Err(BuilderError::NoInstructions);
        }
        let prefix = self.budget.as_ref().map(ComputeBudget::instructions);
        let ordered: Vec<Instruction> = prefix
            .into_iter()
            .flatten()
            .chain(self.instructions.iter().cloned())
            .collect();
        Ok(VersionedMessage::Legacy(Message::new_with_blockhash(
            &ordered,
            Some(&self.payer),
            &blockhash,
        )))
    }

    /// Compiles against `blockhash` and signs with `signers`.
    ///
    /// # Errors
    ///
    /// Returns [`BuilderError::NoInstructions`] for an empty template and
    /// [`BuilderError::Sign`] when a required signer is absent.
    pub fn sign<T>(
        &self,
        blockhash: Hash,
        signers: &T,
    ) -> Result<VersionedTransaction, BuilderError>
    where
        T: Signers + ?Sized,
    {
        let message = self.compile(blockhash)?;
        VersionedTransaction::try_new(message, signers)
            .map_err(|source| BuilderError::Sign { source })
    }
}

#[cfg(test)]
mod tests {
    use solana_keypair::Keypair;
    use solana_signer::Signer;
    use solana_system_interface::instruction::transfer;

    use super::*;

    fn budget() -> ComputeBudget {
        ComputeBudget {
            unit_limit: 200_000,
            unit_price_micro_lamports: 10_000,
        }
    }

    #[test]
    fn budget_prefix_precedes_caller_instructions() {
        let payer = Pubkey::new_unique();
        let message = TxBuilder::new(payer)
            .add_instruction(transfer(&payer, &Pubkey::new_unique(), 1))
            .with_compute_budget(budget())
            .compile(Hash::new_from_array([2_u8; 32]));

        assert!(message.is_ok());
        if let Ok(message) = message {
            let tags: Vec<Option<u8>> = message
                .instructions()
                .iter()
                .map(|instruction| instruction.data.first().copied())
                .collect();
            // 2 = SetComputeUnitLimit, 3 = SetComputeUnitPrice, 2 = system Transfer.
            assert_eq!(tags, vec![Some(2), Some(3), Some(2)]);
            assert_eq!(message.static_account_keys().first(), Some(&payer));
        }
    }

    #[test]
    fn later_budget_replaces_earlier_one() {
        let payer = Pubkey::new_unique();
        let message = TxBuilder::new(payer)
            .with_compute_budget(budget())
            .with_compute_budget(ComputeBudget {
                unit_limit: 50_000,
                unit_price_micro_lamports: 1,
            })
            .add_instruction(transfer(&payer, &Pubkey::new_unique(), 1))
            .compile(Hash::new_from_array([6_u8; 32]));

        assert!(matches!(message, Ok(ref message) if message.instructions().len() == 3));
    }

    #[test]
    fn template_without_budget_compiles_as_is() {
        let payer = Pubkey::new_unique();
        let blockhash = Hash::new_from_array([4_u8; 32]);
        let message = TxBuilder::new(payer)
            .add_instruction(transfer(&payer, &Pubkey::new_unique(), 1))
            .compile(blockhash);

        assert!(matches!(
            message,
            Ok(ref message)
                if message.instructions().len() == 1 && *message.recent_blockhash() == blockhash
        ));
    }

    #[test]
    fn empty_template_is_rejected() {
        let result = TxBuilder::new(Pubkey::new_unique()).compile(Hash::default());
        assert!(matches!(result, Err(BuilderError::NoInstructions)));
    }

    #[test]
    fn signing_twice_yields_distinct_signatures_per_blockhash() {
        let payer = Keypair::new();
        let template = TxBuilder::new(payer.pubkey())
            .add_instruction(transfer(&payer.pubkey(), &Pubkey::new_unique(), 1));

        let first = template.sign(Hash::new_from_array([3_u8; 32]), &[&payer]);
        let second = template.sign(Hash::new_from_array([5_u8; 32]), &[&payer]);

        assert!(first.is_ok() && second.is_ok());
        if let (Ok(first), Ok(second)) = (first, second) {
            assert_eq!(first.signatures.len(), 1);
            assert_ne!(first.signatures.first(), second.signatures.first());
        }
    }

    #[test]
    fn missing_signer_is_reported() {
        let payer = Keypair::new();
        let stranger = Keypair::new();
        let result = TxBuilder::new(payer.pubkey())
            .add_instruction(transfer(&payer.pubkey(), &Pubkey::new_unique(), 1))
            .sign(Hash::new_from_array([5_u8; 32]), &[&stranger]);

        assert!(matches!(result, Err(BuilderError::Sign { .. })));
    }
}
