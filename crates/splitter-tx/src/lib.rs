#![forbid(unsafe_code)]
#![cfg_attr(
    test,
    allow(
        clippy::arithmetic_side_effects,
        clippy::expect_used,
        clippy::indexing_slicing,
        clippy::missing_docs_in_private_items,
        clippy::panic,
        missing_docs
    )
)]

//! Client SDK for the token splitter program: reliable submission of Solana transactions,
//! priority-fee estimation, Token-2022 instruction builders, and the workshop flow that
//! funds a payer, creates a mint, and fans tokens out with one `send_to_all` call.
//!
//! Start from:
//! - [`crate::workshop::Workshop`] for the sequenced end-to-end operations.
//! - [`crate::submit::ReliableSubmitter`] to land arbitrary instruction sets.
//! - [`crate::network::RpcEndpoint`] to plug in a different node backend.

/// Instruction-set template and compute-budget prefix.
pub mod builder;
/// Environment selection and client configuration.
pub mod config;
/// Priority-fee estimation.
pub mod fees;
/// Node interface and JSON-RPC implementation.
pub mod network;
/// Fixed-delay retry wrapper.
pub mod retry;
/// Keypair loading.
pub mod signing;
/// Reliable submission and confirmation.
pub mod submit;
/// Splitter program and Token-2022 instruction builders.
pub mod token;
/// Sequenced workshop operations.
pub mod workshop;

pub use builder::{BuilderError, ComputeBudget, TxBuilder};
pub use config::{
    ClientConfig, ConfigError, DEVNET_PYUSD_MINT, Environment, MAINNET_PYUSD_MINT,
};
pub use fees::{MAX_FEE_ACCOUNTS, PriorityFeePolicy, estimate_priority_fee, writable_accounts};
pub use network::{
    Commitment, JsonRpcEndpoint, LatestBlockhash, PrioritizationFeeSample, RpcEndpoint,
    SendConfig, SignatureStatus, TokenAmount, TransportError,
};
pub use retry::{FixedRetrier, RetryError, RetryPolicy};
pub use signing::{SigningError, read_keypair_file};
pub use submit::{
    ConfirmationStatus, ReliableSubmitter, SubmissionAttempt, SubmitConfig, SubmitError,
    SubmitOutcome,
};
pub use token::{SPLITTER_PROGRAM_ID, SendToAll, TOKEN_PROGRAM_ID, TokenError};
pub use workshop::{Scenario, ScenarioReport, Workshop, WorkshopError};
