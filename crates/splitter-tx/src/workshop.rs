//! Sequenced workshop operations: funding, mint setup, token accounts, and fan-out.

use std::sync::Arc;

use solana_keypair::Keypair;
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_signer::{Signer, signers::Signers};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::{
    builder::TxBuilder,
    config::ClientConfig,
    network::{RpcEndpoint, TokenAmount},
    retry::{FixedRetrier, RetryError},
    submit::{ReliableSubmitter, SubmitError, SubmitOutcome},
    token::{
        MINT_ACCOUNT_LEN, SendToAll, TokenError, associated_token_address,
        create_associated_account_instruction, create_mint_instructions, mint_to_instruction,
        send_to_all_instruction, ui_to_base_units,
    },
};

/// Workshop-level errors.
#[derive(Debug, Error)]
pub enum WorkshopError {
    /// Instruction could not be built.
    #[error(transparent)]
    Token(#[from] TokenError),
    /// Reliable submission failed.
    #[error(transparent)]
    Submit(#[from] SubmitError),
    /// A retried one-shot operation failed.
    #[error(transparent)]
    Retry(#[from] RetryError<SubmitError>),
}

/// Parameters of the end-to-end distribution scenario.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Scenario {
    /// Lamports requested for the payer first; `None` skips the airdrop.
    pub airdrop_lamports: Option<u64>,
    /// Decimals of the created mint.
    pub decimals: u8,
    /// Whole tokens minted to the payer.
    pub mint_ui_amount: u64,
    /// Whole tokens sent to each recipient.
    pub per_recipient_ui_amount: u64,
    /// Recipient wallets.
    pub recipients: Vec<Pubkey>,
}

impl Scenario {
    /// Workshop defaults: 6 decimals, 1000 minted, 4 sent to each recipient.
    #[must_use]
    pub fn workshop(recipients: Vec<Pubkey>) -> Self {
        Self {
            airdrop_lamports: Some(2_000_000_000),
            decimals: 6,
            mint_ui_amount: 1_000,
            per_recipient_ui_amount: 4,
            recipients,
        }
    }
}

/// Balances observed after a scenario run.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ScenarioReport {
    /// Mint created for the run.
    pub mint: Pubkey,
    /// Confirmed fan-out signature.
    pub distribution: Signature,
    /// Payer balance after the fan-out.
    pub sender_balance: TokenAmount,
    /// Recipient wallets with their balances, in input order.
    pub recipient_balances: Vec<(Pubkey, TokenAmount)>,
}

/// Runs workshop operations one at a time for one payer.
pub struct Workshop {
    /// Submission path for state-changing operations.
    submitter: ReliableSubmitter,
    /// Retry wrapper for one-shot operations.
    retrier: FixedRetrier,
    /// Fee payer, mint authority, and token sender.
    payer: Keypair,
}

impl Workshop {
    /// Creates a workshop runner from explicit configuration.
    #[must_use]
    pub fn new(endpoint: Arc<dyn RpcEndpoint>, payer: Keypair, config: &ClientConfig) -> Self {
        Self {
            submitter: ReliableSubmitter::new(endpoint).with_config(config.submit.clone()),
            retrier: FixedRetrier::new(config.retry),
            payer,
        }
    }

    /// Returns the payer public key.
    #[must_use]
    pub fn payer(&self) -> Pubkey {
        self.payer.pubkey()
    }

    /// Requests test funds and waits for them to confirm.
    ///
    /// # Errors
    ///
    /// Returns [`WorkshopError::Retry`] once the retry budget is spent.
    pub async fn airdrop(
        &self,
        address: &Pubkey,
        lamports: u64,
    ) -> Result<Signature, WorkshopError> {
        let submitter = &self.submitter;
        let address = *address;
        let outcome = self
            .retrier
            .run_if(
                "airdrop",
                || async move {
                    let signature = submitter
                        .endpoint()
                        .request_airdrop(&address, lamports)
                        .await
                        .map_err(|source| SubmitError::Transport {
                            stage: "request_airdrop",
                            source,
                        })?;
                    tracing::info!(%address, lamports, %signature, "airdrop requested");
                    submitter.confirm(signature).await
                },
                SubmitError::is_retryable,
            )
            .await?;
        Ok(outcome.signature)
    }

    /// Creates a new mint owned by the payer.
    ///
    /// # Errors
    ///
    /// Returns [`WorkshopError`] when rent lookup or mint creation fails.
    pub async fn create_mint(&self, decimals: u8) -> Result<Pubkey, WorkshopError> {
        let submitter = &self.submitter;
        let rent = self
            .retrier
            .run_if(
                "get_minimum_balance_for_rent_exemption",
                || async move {
                    submitter
                        .endpoint()
                        .minimum_balance_for_rent_exemption(MINT_ACCOUNT_LEN)
                        .await
                        .map_err(|source| SubmitError::Transport {
                            stage: "get_minimum_balance_for_rent_exemption",
                            source,
                        })
                },
                SubmitError::is_retryable,
            )
            .await?;

        let mint = Keypair::new();
        let payer = self.payer();
        let builder = TxBuilder::new(payer).add_instructions(create_mint_instructions(
            &payer,
            &mint.pubkey(),
            &payer,
            decimals,
            rent,
        )?);
        let outcome = self
            .submit_retried("create_mint", &builder, &[&self.payer, &mint])
            .await?;
        tracing::info!(
            mint = %mint.pubkey(),
            decimals,
            signature = %outcome.signature,
            "mint created"
        );
        Ok(mint.pubkey())
    }

    /// Creates the associated token account of every owner, one after another.
    ///
    /// # Errors
    ///
    /// Returns the first [`WorkshopError`]; accounts created before it are not reported.
    pub async fn create_associated_accounts(
        &self,
        mint: &Pubkey,
        owners: &[Pubkey],
    ) -> Result<Vec<Pubkey>, WorkshopError> {
        let payer = self.payer();
        let mut accounts = Vec::with_capacity(owners.len());
        for owner in owners {
            let builder = TxBuilder::new(payer)
                .add_instruction(create_associated_account_instruction(&payer, owner, mint));
            self.submit_retried("create_associated_account", &builder, &[&self.payer])
                .await?;
            let account = associated_token_address(owner, mint);
            tracing::info!(%owner, %account, "associated token account ready");
            accounts.push(account);
        }
        Ok(accounts)
    }

    /// Mints `amount` base units into `owner`'s associated token account.
    ///
    /// # Errors
    ///
    /// Returns [`WorkshopError`] when the instruction cannot be built or submission fails.
    pub async fn mint_to(
        &self,
        mint: &Pubkey,
        owner: &Pubkey,
        amount: u64,
        decimals: u8,
    ) -> Result<SubmitOutcome, WorkshopError> {
        let payer = self.payer();
        let destination = associated_token_address(owner, mint);
        let builder = TxBuilder::new(payer).add_instruction(mint_to_instruction(
            mint,
            &destination,
            &payer,
            amount,
            decimals,
        )?);
        Ok(self.submitter.submit(builder, &[&self.payer]).await?)
    }

    /// Sends `amount` base units from the payer to each recipient wallet in one
    /// `send_to_all` instruction.
    ///
    /// # Errors
    ///
    /// Returns [`WorkshopError`] when the instruction cannot be built or submission fails.
    pub async fn distribute(
        &self,
        mint: &Pubkey,
        amount: u64,
        recipients: &[Pubkey],
    ) -> Result<SubmitOutcome, WorkshopError> {
        let payer = self.payer();
        let instruction = send_to_all_instruction(&SendToAll {
            from: associated_token_address(&payer, mint),
            authority: payer,
            mint: *mint,
            amount,
            recipients: recipients
                .iter()
                .map(|owner| associated_token_address(owner, mint))
                .collect(),
        })?;
        let builder = TxBuilder::new(payer).add_instruction(instruction);
        let outcome = self.submitter.submit(builder, &[&self.payer]).await?;
        tracing::info!(
            %mint,
            amount,
            recipients = recipients.len(),
            signature = %outcome.signature,
            attempts = outcome.attempts,
            "send_to_all confirmed"
        );
        Ok(outcome)
    }

    /// Reads `owner`'s balance of `mint`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkshopError::Retry`] once the retry budget is spent.
    pub async fn token_balance(
        &self,
        owner: &Pubkey,
        mint: &Pubkey,
    ) -> Result<TokenAmount, WorkshopError> {
        let submitter = &self.submitter;
        let account = associated_token_address(owner, mint);
        Ok(self
            .retrier
            .run_if(
                "get_token_account_balance",
                || async move {
                    submitter
                        .endpoint()
                        .token_account_balance(&account)
                        .await
                        .map_err(|source| SubmitError::Transport {
                            stage: "get_token_account_balance",
                            source,
                        })
                },
                SubmitError::is_retryable,
            )
            .await?)
    }

    /// Runs single attempts under the retrier, polling every earlier broadcast of `builder`
    /// alongside the current one.
    async fn submit_retried<T>(
        &self,
        operation: &'static str,
        builder: &TxBuilder,
        signers: &T,
    ) -> Result<SubmitOutcome, RetryError<SubmitError>>
    where
        T: Signers + ?Sized,
    {
        let submitter = &self.submitter;
        let outstanding = &Mutex::new(Vec::new());
        self.retrier
            .run_if(
                operation,
                || async move {
                    let mut outstanding = outstanding.lock().await;
                    submitter
                        .submit_once_tracked(builder, signers, &mut outstanding)
                        .await
                },
                SubmitError::is_retryable,
            )
            .await
    }

    /// Runs the full scenario: fund, create mint, create accounts, mint, distribute, and
    /// read back balances.
    ///
    /// # Errors
    ///
    /// Returns the first [`WorkshopError`]; earlier steps are not rolled back.
    pub async fn run_scenario(
        &self,
        scenario: &Scenario,
    ) -> Result<ScenarioReport, WorkshopError> {
        let payer = self.payer();
        if let Some(lamports) = scenario.airdrop_lamports {
            self.airdrop(&payer, lamports).await?;
        }

        let mint = self.create_mint(scenario.decimals).await?;

        let mut owners = Vec::with_capacity(scenario.recipients.len().saturating_add(1));
        owners.push(payer);
        owners.extend(scenario.recipients.iter().copied());
        self.create_associated_accounts(&mint, &owners).await?;

        let minted = ui_to_base_units(scenario.mint_ui_amount, scenario.decimals)?;
        self.mint_to(&mint, &payer, minted, scenario.decimals).await?;

        let per_recipient = ui_to_base_units(scenario.per_recipient_ui_amount, scenario.decimals)?;
        let distribution = self
            .distribute(&mint, per_recipient, &scenario.recipients)
            .await?;

        let sender_balance = self.token_balance(&payer, &mint).await?;
        let mut recipient_balances = Vec::with_capacity(scenario.recipients.len());
        for recipient in &scenario.recipients {
            let balance = self.token_balance(recipient, &mint).await?;
            recipient_balances.push((*recipient, balance));
        }

        Ok(ScenarioReport {
            mint,
            distribution: distribution.signature,
            sender_balance,
            recipient_balances,
        })
    }
}
