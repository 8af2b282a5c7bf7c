//! Network endpoint types, errors, and the RPC endpoint trait.

use async_trait::async_trait;
use serde::Deserialize;
use solana_message::Hash;
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use thiserror::Error;

/// Commitment level a node reports for an observed transaction.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    /// Seen by the node in a processed block.
    Processed,
    /// Voted on by a supermajority.
    Confirmed,
    /// Rooted.
    Finalized,
}

impl Commitment {
    /// Returns the JSON-RPC spelling of this commitment.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Processed => "processed",
            Self::Confirmed => "confirmed",
            Self::Finalized => "finalized",
        }
    }
}

/// Freshness token returned by the node together with its expiry height.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct LatestBlockhash {
    /// Blockhash to embed into the next transaction.
    pub blockhash: Hash,
    /// Last block height at which a transaction using `blockhash` can land.
    pub last_valid_block_height: u64,
}

/// One recent priority-fee observation.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct PrioritizationFeeSample {
    /// Slot the observation was taken from.
    pub slot: u64,
    /// Minimum fee paid to land in that slot, micro-lamports per compute unit.
    pub prioritization_fee: u64,
}

/// Node-reported status of one signature.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureStatus {
    /// Slot the transaction was processed in.
    pub slot: u64,
    /// Highest commitment reached so far, when reported.
    pub confirmation_status: Option<Commitment>,
    /// Execution error, when the transaction failed on-chain.
    pub err: Option<serde_json::Value>,
}

impl SignatureStatus {
    /// Returns true when the status has reached at least `target`.
    #[must_use]
    pub fn reached(&self, target: Commitment) -> bool {
        self.confirmation_status
            .is_some_and(|status| status >= target)
    }
}

/// Token balance of one token account.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TokenAmount {
    /// Raw amount in base units.
    pub amount: u64,
    /// Mint decimals.
    pub decimals: u8,
    /// Human-readable amount as reported by the node.
    pub ui_amount_string: String,
}

/// `sendTransaction` tuning.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SendConfig {
    /// Skip preflight simulation when true.
    pub skip_preflight: bool,
    /// Optional preflight commitment.
    pub preflight_commitment: Option<Commitment>,
    /// Node-side rebroadcast budget; `Some(0)` leaves rebroadcasting to the caller.
    pub max_retries: Option<usize>,
}

impl Default for SendConfig {
    fn default() -> Self {
        Self {
            skip_preflight: true,
            preflight_commitment: None,
            max_retries: Some(0),
        }
    }
}

/// Low-level errors surfaced by endpoint implementations.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum TransportError {
    /// Invalid endpoint configuration.
    #[error("endpoint configuration invalid: {message}")]
    Config {
        /// Human-readable description.
        message: String,
    },
    /// Request could not be delivered or answered.
    #[error("transport failure: {message}")]
    Failure {
        /// Human-readable description.
        message: String,
    },
    /// Node answered with a JSON-RPC error object.
    #[error("rpc error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code.
        code: i64,
        /// Node-provided message.
        message: String,
    },
    /// Node answered with a payload that could not be interpreted.
    #[error("unexpected rpc payload: {message}")]
    Decode {
        /// Human-readable description.
        message: String,
    },
}

impl TransportError {
    /// Returns true when the node rejected a transaction for carrying an unknown blockhash.
    #[must_use]
    pub fn is_blockhash_not_found(&self) -> bool {
        match self {
            Self::Rpc { message, .. } => {
                message.contains("Blockhash not found") || message.contains("BlockhashNotFound")
            }
            Self::Config { .. } | Self::Failure { .. } | Self::Decode { .. } => false,
        }
    }
}

/// Remote procedure interface of a network node.
#[async_trait]
pub trait RpcEndpoint: Send + Sync {
    /// Fetches the newest blockhash and its expiry height.
    async fn latest_blockhash(&self) -> Result<LatestBlockhash, TransportError>;

    /// Fetches recent priority-fee observations for transactions writing `accounts`.
    async fn recent_prioritization_fees(
        &self,
        accounts: &[Pubkey],
    ) -> Result<Vec<PrioritizationFeeSample>, TransportError>;

    /// Broadcasts serialized transaction bytes and returns the signature string.
    async fn send_transaction(
        &self,
        tx_bytes: &[u8],
        config: &SendConfig,
    ) -> Result<String, TransportError>;

    /// Fetches statuses for `signatures`, positionally; `None` means not yet observed.
    async fn signature_statuses(
        &self,
        signatures: &[Signature],
    ) -> Result<Vec<Option<SignatureStatus>>, TransportError>;

    /// Fetches the current block height.
    async fn block_height(&self) -> Result<u64, TransportError>;

    /// Requests test funds and returns the airdrop transaction signature.
    async fn request_airdrop(
        &self,
        address: &Pubkey,
        lamports: u64,
    ) -> Result<Signature, TransportError>;

    /// Fetches the token balance held by a token account.
    async fn token_account_balance(&self, address: &Pubkey)
    -> Result<TokenAmount, TransportError>;

    /// Fetches the lamports needed for an account of `data_len` bytes to be rent exempt.
    async fn minimum_balance_for_rent_exemption(
        &self,
        data_len: usize,
    ) -> Result<u64, TransportError>;
}
