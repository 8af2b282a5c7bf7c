//! Instruction builders for mint setup, token accounts, and the `send_to_all` fan-out.

use sha2::{Digest, Sha256};
use solana_instruction::{AccountMeta, Instruction};
use solana_pubkey::Pubkey;
use solana_system_interface::instruction as system_instruction;
use spl_associated_token_account_interface::{
    address::get_associated_token_address_with_program_id,
    instruction::create_associated_token_account_idempotent,
};
use spl_token_2022_interface::instruction as token_instruction;
use thiserror::Error;

/// Deployed splitter program id.
pub const SPLITTER_PROGRAM_ID: Pubkey =
    Pubkey::from_str_const("Gm5A2qTMjz3TMESWvBQoApGm8VuzXF1X2y7DEpJnUpda");

/// Token program every splitter mint belongs to.
pub const TOKEN_PROGRAM_ID: Pubkey = spl_token_2022_interface::ID;

/// Size of a mint account without extensions.
pub const MINT_ACCOUNT_LEN: usize = 82;

/// Anchor sighash namespace of the fan-out instruction.
const SEND_TO_ALL_SIGHASH: &str = "global:send_to_all";

/// Instruction-builder errors.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum TokenError {
    /// The token program rejected the instruction arguments.
    #[error("invalid token instruction: {message}")]
    InvalidInstruction {
        /// Program error description.
        message: String,
    },
    /// A fan-out needs at least one recipient.
    #[error("send_to_all needs at least one recipient")]
    NoRecipients,
    /// UI amount does not fit into base units.
    #[error("amount {ui_amount} with {decimals} decimals overflows u64")]
    AmountOverflow {
        /// Requested amount in whole tokens.
        ui_amount: u64,
        /// Mint decimals.
        decimals: u8,
    },
}

/// Arguments of one `send_to_all` fan-out.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SendToAll {
    /// Source token account, debited once per recipient.
    pub from: Pubkey,
    /// Owner of `from`; signs the transaction.
    pub authority: Pubkey,
    /// Mint of every involved token account.
    pub mint: Pubkey,
    /// Base units sent to each recipient.
    pub amount: u64,
    /// Destination token accounts.
    pub recipients: Vec<Pubkey>,
}

/// Returns the Anchor discriminator of `send_to_all`.
#[must_use]
pub fn send_to_all_discriminator() -> [u8; 8] {
    let digest = Sha256::digest(SEND_TO_ALL_SIGHASH.as_bytes());
    let mut discriminator = [0_u8; 8];
    discriminator.copy_from_slice(&digest[..8]);
    discriminator
}

/// Builds the `send_to_all` instruction; recipients follow the fixed accounts as
/// writable non-signers.
///
/// # Errors
///
/// Returns [`TokenError::NoRecipients`] for an empty recipient list.
pub fn send_to_all_instruction(args: &SendToAll) -> Result<Instruction, TokenError> {
    if args.recipients.is_empty() {
        return Err(TokenError::NoRecipients);
    }

    let mut data = Vec::with_capacity(16);
    data.extend_from_slice(&send_to_all_discriminator());
    data.extend_from_slice(&args.amount.to_le_bytes());

    let mut accounts = Vec::with_capacity(args.recipients.len().saturating_add(4));
    accounts.push(AccountMeta::new(args.from, false));
    accounts.push(AccountMeta::new_readonly(args.authority, true));
    accounts.push(AccountMeta::new_readonly(args.mint, false));
    accounts.push(AccountMeta::new_readonly(TOKEN_PROGRAM_ID, false));
    accounts.extend(
        args.recipients
            .iter()
            .map(|recipient| AccountMeta::new(*recipient, false)),
    );

    Ok(Instruction {
        program_id: SPLITTER_PROGRAM_ID,
        accounts,
        data,
    })
}

/// Returns the associated token account of `owner` for `mint`.
#[must_use]
pub fn associated_token_address(owner: &Pubkey, mint: &Pubkey) -> Pubkey {
    get_associated_token_address_with_program_id(owner, mint, &TOKEN_PROGRAM_ID)
}

/// Builds an idempotent associated-account creation paid by `payer`.
#[must_use]
pub fn create_associated_account_instruction(
    payer: &Pubkey,
    owner: &Pubkey,
    mint: &Pubkey,
) -> Instruction {
    create_associated_token_account_idempotent(payer, owner, mint, &TOKEN_PROGRAM_ID)
}

/// Builds the account allocation and initialization of a new mint.
///
/// # Errors
///
/// Returns [`TokenError::InvalidInstruction`] when the token program rejects the arguments.
pub fn create_mint_instructions(
    payer: &Pubkey,
    mint: &Pubkey,
    authority: &Pubkey,
    decimals: u8,
    rent_lamports: u64,
) -> Result<Vec<Instruction>, TokenError> {
    let allocate = system_instruction::create_account(
        payer,
        mint,
        rent_lamports,
        MINT_ACCOUNT_LEN as u64,
        &TOKEN_PROGRAM_ID,
    );
    let initialize =
        token_instruction::initialize_mint2(&TOKEN_PROGRAM_ID, mint, authority, None, decimals)
            .map_err(|error| TokenError::InvalidInstruction {
                message: error.to_string(),
            })?;
    Ok(vec![allocate, initialize])
}

/// Builds a checked mint of `amount` base units into `destination`.
///
/// # Errors
///
/// Returns [`TokenError::InvalidInstruction`] when the token program rejects the arguments.
pub fn mint_to_instruction(
    mint: &Pubkey,
    destination: &Pubkey,
    authority: &Pubkey,
    amount: u64,
    decimals: u8,
) -> Result<Instruction, TokenError> {
    token_instruction::mint_to_checked(
        &TOKEN_PROGRAM_ID,
        mint,
        destination,
        authority,
        &[],
        amount,
        decimals,
    )
    .map_err(|error| TokenError::InvalidInstruction {
        message: error.to_string(),
    })
}

/// Converts whole tokens into base units.
///
/// # Errors
///
/// Returns [`TokenError::AmountOverflow`] when the result does not fit into `u64`.
pub fn ui_to_base_units(ui_amount: u64, decimals: u8) -> Result<u64, TokenError> {
    10_u64
        .checked_pow(u32::from(decimals))
        .and_then(|scale| ui_amount.checked_mul(scale))
        .ok_or(TokenError::AmountOverflow {
            ui_amount,
            decimals,
        })
}
