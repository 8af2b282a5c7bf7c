//! `splitter-cli`: airdrop, balance, send, and the end-to-end demo.

/// Command-line arguments.
mod cli;
/// Tracing subscriber setup.
mod logging;

use std::sync::Arc;

use clap::Parser;
use solana_keypair::Keypair;
use solana_pubkey::Pubkey;
use solana_signer::Signer;
use splitter_tx::{
    ClientConfig, ConfigError, Environment, JsonRpcEndpoint, RpcEndpoint, Scenario,
    SigningError, TokenError, TransportError, Workshop, WorkshopError, read_keypair_file,
    token::ui_to_base_units,
};
use thiserror::Error;

use crate::cli::{Cli, Commands};

/// Top-level command failures.
#[derive(Debug, Error)]
enum AppError {
    /// Environment overrides did not parse.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Payer keypair could not be loaded.
    #[error(transparent)]
    Signing(#[from] SigningError),
    /// RPC client could not be created.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Amount or instruction arguments were rejected.
    #[error(transparent)]
    Token(#[from] TokenError),
    /// A workshop operation failed.
    #[error(transparent)]
    Workshop(#[from] WorkshopError),
    /// No `--mint` and no environment default.
    #[error("{environment} has no default token mint; pass --mint")]
    MissingMint {
        /// Selected environment.
        environment: Environment,
    },
    /// Airdrop requested on a cluster without a faucet.
    #[error("{environment} does not hand out airdrops")]
    AirdropUnavailable {
        /// Selected environment.
        environment: Environment,
    },
    /// `--decimals` disagrees with the mint.
    #[error("--decimals {requested} does not match the mint's {actual} decimals")]
    DecimalsMismatch {
        /// Value passed on the command line.
        requested: u8,
        /// Decimals reported for the mint.
        actual: u8,
    },
    /// Demo requested on mainnet.
    #[error("the demo mints a throwaway token and is refused on {environment}")]
    DemoRefused {
        /// Selected environment.
        environment: Environment,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_tracing();
    let cli = Cli::parse();
    if let Err(error) = run(cli).await {
        tracing::error!(error = %error, "splitter-cli failed");
        return Err(error.into());
    }
    Ok(())
}

/// Executes one parsed command.
async fn run(cli: Cli) -> Result<(), AppError> {
    let environment = cli.environment;
    let config = ClientConfig::from_env(environment)?;
    let payer = read_keypair_file(&config.keypair_path)?;
    tracing::info!(
        %environment,
        rpc_url = %config.rpc_url,
        payer = %payer.pubkey(),
        "client configured"
    );

    let endpoint: Arc<dyn RpcEndpoint> =
        Arc::new(JsonRpcEndpoint::new(config.rpc_url.clone())?);
    let workshop = Workshop::new(endpoint, payer, &config);

    match cli.command {
        Commands::Airdrop { lamports } => {
            if !environment.supports_airdrop() {
                return Err(AppError::AirdropUnavailable { environment });
            }
            let signature = workshop.airdrop(&workshop.payer(), lamports).await?;
            println!("airdropped {lamports} lamports to {}: {signature}", workshop.payer());
        }
        Commands::Balance { owner, mint } => {
            let mint = resolve_mint(environment, mint)?;
            let owner = owner.unwrap_or_else(|| workshop.payer());
            let balance = workshop.token_balance(&owner, &mint).await?;
            println!("{owner}: {} ({} base units)", balance.ui_amount_string, balance.amount);
        }
        Commands::Send {
            amount,
            recipients,
            mint,
            decimals,
        } => {
            let mint = resolve_mint(environment, mint)?;
            let held = workshop.token_balance(&workshop.payer(), &mint).await?;
            let decimals = check_decimals(decimals, held.decimals)?;
            let base_units = ui_to_base_units(amount, decimals)?;
            workshop.create_associated_accounts(&mint, &recipients).await?;
            let outcome = workshop.distribute(&mint, base_units, &recipients).await?;
            println!(
                "sent {amount} to {} recipients in slot {}: {}",
                recipients.len(),
                outcome.slot,
                outcome.signature
            );
        }
        Commands::Demo => {
            if environment == Environment::Mainnet {
                return Err(AppError::DemoRefused { environment });
            }
            let recipients: Vec<Pubkey> = (0..2).map(|_| Keypair::new().pubkey()).collect();
            let report = workshop.run_scenario(&Scenario::workshop(recipients)).await?;
            println!("mint: {}", report.mint);
            println!("send_to_all: {}", report.distribution);
            println!(
                "sender {}: {}",
                workshop.payer(),
                report.sender_balance.ui_amount_string
            );
            for (recipient, balance) in &report.recipient_balances {
                println!("recipient {recipient}: {}", balance.ui_amount_string);
            }
        }
    }
    Ok(())
}

/// Picks the explicit mint, falling back to the environment's token.
fn resolve_mint(environment: Environment, mint: Option<Pubkey>) -> Result<Pubkey, AppError> {
    mint.or(environment.token_mint())
        .ok_or(AppError::MissingMint { environment })
}

/// Uses the mint's decimals, rejecting an explicit value that disagrees.
fn check_decimals(requested: Option<u8>, actual: u8) -> Result<u8, AppError> {
    match requested {
        Some(requested) if requested != actual => {
            Err(AppError::DecimalsMismatch { requested, actual })
        }
        _ => Ok(actual),
    }
}
