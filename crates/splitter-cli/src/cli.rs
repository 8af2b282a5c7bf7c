//! Command-line arguments.

use clap::{Parser, Subcommand};
use solana_pubkey::Pubkey;
use splitter_tx::Environment;

/// Drives the send-to-all splitter program against one cluster.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Cluster to talk to.
    #[arg(long = "env", env = "SPLITTER_ENV", default_value = "devnet")]
    pub environment: Environment,

    /// Operation to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Supported operations.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Requests test SOL for the payer (localnet and devnet only)
    Airdrop {
        /// Lamports to request.
        #[arg(long, default_value_t = 1_000_000_000)]
        lamports: u64,
    },
    /// Prints a token balance
    Balance {
        /// Wallet whose associated account is read; defaults to the payer.
        #[arg(long)]
        owner: Option<Pubkey>,
        /// Mint to read; defaults to the environment's token.
        #[arg(long)]
        mint: Option<Pubkey>,
    },
    /// Sends the same amount to every recipient in one transaction
    Send {
        /// Whole tokens per recipient.
        #[arg(long)]
        amount: u64,
        /// Recipient wallets; their associated accounts are created when missing.
        #[arg(long = "recipient", required = true, num_args = 1..)]
        recipients: Vec<Pubkey>,
        /// Mint to send; defaults to the environment's token.
        #[arg(long)]
        mint: Option<Pubkey>,
        /// Expected mint decimals; defaults to the mint's own and is rejected on mismatch.
        #[arg(long)]
        decimals: Option<u8>,
    },
    /// Runs the full workshop scenario with two fresh recipients
    Demo,
}
