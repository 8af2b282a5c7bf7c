//! Reliable submitter: broadcast, poll, and rebroadcast with a fresh blockhash.

use std::{sync::Arc, time::Instant};

use solana_signature::Signature;
use solana_signer::signers::Signers;

use super::{
    ConfirmationStatus, SubmissionAttempt, SubmitConfig, SubmitError, SubmitOutcome,
};
use crate::{
    builder::{ComputeBudget, TxBuilder},
    fees::{estimate_priority_fee, writable_accounts},
    network::RpcEndpoint,
};

/// Submits instruction sets until they are confirmed, fail on-chain, or the attempt
/// budget runs out.
pub struct ReliableSubmitter {
    /// Node the transactions are sent to.
    endpoint: Arc<dyn RpcEndpoint>,
    /// Retry, polling, and fee tuning.
    config: SubmitConfig,
}

impl ReliableSubmitter {
    /// Creates a submitter with default tuning.
    #[must_use]
    pub fn new(endpoint: Arc<dyn RpcEndpoint>) -> Self {
        Self {
            endpoint,
            config: SubmitConfig::default(),
        }
    }

    /// Sets submission tuning.
    #[must_use]
    pub fn with_config(mut self, config: SubmitConfig) -> Self {
        self.config = config.normalized();
        self
    }

    /// Returns the active tuning.
    #[must_use]
    pub const fn config(&self) -> &SubmitConfig {
        &self.config
    }

    /// Returns the endpoint this submitter talks to.
    #[must_use]
    pub fn endpoint(&self) -> &Arc<dyn RpcEndpoint> {
        &self.endpoint
    }

    /// Submits `builder`'s instructions and waits for confirmation, rebroadcasting with a
    /// fresh blockhash and fee estimate after transient failures.
    ///
    /// Every signature broadcast by this call keeps being polled, so a transaction from an
    /// earlier attempt that lands late is reported instead of being superseded.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::Execution`] as soon as a broadcast fails on-chain,
    /// non-retryable build errors immediately, and [`SubmitError::AttemptsExhausted`] once
    /// `max_attempts` attempts ended in transient failures.
    pub async fn submit<T>(
        &self,
        builder: TxBuilder,
        signers: &T,
    ) -> Result<SubmitOutcome, SubmitError>
    where
        T: Signers + ?Sized,
    {
        let mut outstanding = Vec::new();
        let mut attempt = 1_u32;
        loop {
            match self
                .run_attempt(&builder, signers, attempt, &mut outstanding)
                .await
            {
                Ok(outcome) => return Ok(outcome),
                Err(error) if !error.is_retryable() => return Err(error),
                Err(error) if attempt >= self.config.max_attempts => {
                    tracing::error!(attempt, error = %error, "submission attempts exhausted");
                    return Err(SubmitError::AttemptsExhausted {
                        attempts: attempt,
                        last: Box::new(error),
                    });
                }
                Err(error) => {
                    let backoff = self.config.backoff(attempt);
                    tracing::warn!(
                        attempt,
                        backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
                        error = %error,
                        "submission attempt failed; rebroadcasting with fresh blockhash"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt = attempt.saturating_add(1);
                }
            }
        }
    }

    /// Runs exactly one broadcast-and-poll attempt without rebroadcasting.
    ///
    /// # Errors
    ///
    /// Returns the attempt's [`SubmitError`] unchanged.
    pub async fn submit_once<T>(
        &self,
        builder: TxBuilder,
        signers: &T,
    ) -> Result<SubmitOutcome, SubmitError>
    where
        T: Signers + ?Sized,
    {
        let mut outstanding = Vec::new();
        self.submit_once_tracked(&builder, signers, &mut outstanding)
            .await
    }

    /// Runs one attempt while also polling the signatures already in `outstanding`.
    ///
    /// The new signature is appended to `outstanding` before it is sent, so a caller that
    /// retries with the same set keeps watching every earlier broadcast. When an earlier
    /// broadcast confirms, it wins over a later duplicate that failed on-chain.
    ///
    /// # Errors
    ///
    /// Returns the attempt's [`SubmitError`] unchanged.
    pub async fn submit_once_tracked<T>(
        &self,
        builder: &TxBuilder,
        signers: &T,
        outstanding: &mut Vec<Signature>,
    ) -> Result<SubmitOutcome, SubmitError>
    where
        T: Signers + ?Sized,
    {
        let attempt = u32::try_from(outstanding.len())
            .unwrap_or(u32::MAX)
            .saturating_add(1);
        self.run_attempt(builder, signers, attempt, outstanding)
            .await
    }

    /// Polls an externally broadcast signature until it reaches the target commitment.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::Execution`] for on-chain failures,
    /// [`SubmitError::ConfirmationTimeout`] when the poll budget is spent, and
    /// [`SubmitError::Transport`] when polling fails.
    pub async fn confirm(&self, signature: Signature) -> Result<SubmitOutcome, SubmitError> {
        let outstanding = [signature];
        for poll in 1..=self.config.max_polls_per_attempt {
            if let Some(outcome) = self.check_outstanding(&outstanding, 1).await? {
                return Ok(outcome);
            }
            if poll < self.config.max_polls_per_attempt {
                tokio::time::sleep(self.config.poll_interval).await;
            }
        }
        Err(SubmitError::ConfirmationTimeout {
            signature,
            polls: self.config.max_polls_per_attempt,
        })
    }

    /// Broadcasts one freshly signed transaction and polls until a terminal outcome.
    async fn run_attempt<T>(
        &self,
        builder: &TxBuilder,
        signers: &T,
        attempt: u32,
        outstanding: &mut Vec<Signature>,
    ) -> Result<SubmitOutcome, SubmitError>
    where
        T: Signers + ?Sized,
    {
        let broadcast = self
            .broadcast(builder, signers, attempt, outstanding)
            .await?;
        self.await_confirmation(&broadcast, outstanding).await
    }

    /// Fetches blockhash and fee, signs, records the signature, and sends.
    async fn broadcast<T>(
        &self,
        builder: &TxBuilder,
        signers: &T,
        attempt: u32,
        outstanding: &mut Vec<Signature>,
    ) -> Result<SubmissionAttempt, SubmitError>
    where
        T: Signers + ?Sized,
    {
        let latest = self
            .endpoint
            .latest_blockhash()
            .await
            .map_err(|source| SubmitError::Transport {
                stage: "get_latest_blockhash",
                source,
            })?;

        let accounts = writable_accounts(builder.payer(), builder.instructions());
        let samples = self
            .endpoint
            .recent_prioritization_fees(&accounts)
            .await
            .map_err(|source| SubmitError::Transport {
                stage: "get_recent_prioritization_fees",
                source,
            })?;
        let observed = estimate_priority_fee(&samples);
        let priority_fee = self.config.fee_policy.apply(observed);
        tracing::debug!(
            attempt,
            accounts = accounts.len(),
            samples = samples.len(),
            observed,
            priority_fee,
            "priority fee estimated"
        );

        let tx = builder
            .clone()
            .with_compute_budget(ComputeBudget {
                unit_limit: self.config.compute_unit_limit,
                unit_price_micro_lamports: priority_fee,
            })
            .sign(latest.blockhash, signers)
            .map_err(|source| SubmitError::Build { source })?;
        let signature = tx
            .signatures
            .first()
            .copied()
            .ok_or(SubmitError::MissingSignature)?;
        let tx_bytes = bincode::serialize(&tx).map_err(|source| SubmitError::Encode { source })?;

        // Recorded before sending: a send that errors on our side may still reach the node.
        outstanding.push(signature);

        match self
            .endpoint
            .send_transaction(&tx_bytes, &self.config.send)
            .await
        {
            Ok(returned) => {
                if returned != signature.to_string() {
                    tracing::warn!(%signature, %returned, "node returned unexpected signature");
                }
            }
            Err(source) if source.is_blockhash_not_found() => {
                tracing::warn!(
                    %signature,
                    blockhash = %latest.blockhash,
                    "node rejected stale blockhash"
                );
                return Err(SubmitError::BlockhashExpired { signature });
            }
            Err(source) => {
                return Err(SubmitError::Transport {
                    stage: "send_transaction",
                    source,
                });
            }
        }

        tracing::info!(
            attempt,
            %signature,
            blockhash = %latest.blockhash,
            last_valid_block_height = latest.last_valid_block_height,
            priority_fee,
            "transaction broadcast"
        );

        Ok(SubmissionAttempt {
            attempt,
            signature,
            blockhash: latest.blockhash,
            last_valid_block_height: latest.last_valid_block_height,
            priority_fee_micro_lamports: priority_fee,
            submitted_at: Instant::now(),
        })
    }

    /// Polls every outstanding signature until one is terminal, the blockhash expires, or
    /// the poll budget is spent.
    async fn await_confirmation(
        &self,
        broadcast: &SubmissionAttempt,
        outstanding: &[Signature],
    ) -> Result<SubmitOutcome, SubmitError> {
        for poll in 1..=self.config.max_polls_per_attempt {
            if let Some(outcome) = self
                .check_outstanding(outstanding, broadcast.attempt)
                .await?
            {
                tracing::info!(
                    signature = %outcome.signature,
                    slot = outcome.slot,
                    attempt = broadcast.attempt,
                    elapsed_ms = u64::try_from(broadcast.submitted_at.elapsed().as_millis())
                        .unwrap_or(u64::MAX),
                    "transaction confirmed"
                );
                return Ok(outcome);
            }

            let block_height = self
                .endpoint
                .block_height()
                .await
                .map_err(|source| SubmitError::Transport {
                    stage: "get_block_height",
                    source,
                })?;
            if block_height > broadcast.last_valid_block_height {
                // The transaction may have landed between the status read and the height read.
                if let Some(outcome) = self
                    .check_outstanding(outstanding, broadcast.attempt)
                    .await?
                {
                    return Ok(outcome);
                }
                tracing::warn!(
                    signature = %broadcast.signature,
                    block_height,
                    last_valid_block_height = broadcast.last_valid_block_height,
                    "blockhash expired before confirmation"
                );
                return Err(SubmitError::BlockhashExpired {
                    signature: broadcast.signature,
                });
            }

            tracing::trace!(
                signature = %broadcast.signature,
                poll,
                "transaction not yet confirmed"
            );
            if poll < self.config.max_polls_per_attempt {
                tokio::time::sleep(self.config.poll_interval).await;
            }
        }

        Err(SubmitError::ConfirmationTimeout {
            signature: broadcast.signature,
            polls: self.config.max_polls_per_attempt,
        })
    }

    /// Reads statuses once. A confirmed signature wins over failed ones, since a failed
    /// duplicate usually means an earlier broadcast already executed.
    async fn check_outstanding(
        &self,
        outstanding: &[Signature],
        attempt: u32,
    ) -> Result<Option<SubmitOutcome>, SubmitError> {
        let statuses = self
            .endpoint
            .signature_statuses(outstanding)
            .await
            .map_err(|source| SubmitError::Transport {
                stage: "get_signature_statuses",
                source,
            })?;

        let mut failure = None;
        for (signature, status) in outstanding.iter().zip(statuses.iter()) {
            match ConfirmationStatus::classify(status.as_ref(), self.config.commitment) {
                ConfirmationStatus::Pending => {}
                ConfirmationStatus::Failed(error) => {
                    if failure.is_none() {
                        failure = Some((*signature, error));
                    }
                }
                ConfirmationStatus::Confirmed => {
                    let slot = status.as_ref().map_or(0, |status| status.slot);
                    return Ok(Some(SubmitOutcome {
                        signature: *signature,
                        slot,
                        attempts: attempt,
                    }));
                }
            }
        }

        match failure {
            Some((signature, error)) => {
                tracing::error!(%signature, error = %error, "transaction failed on-chain");
                Err(SubmitError::Execution { signature, error })
            }
            None => Ok(None),
        }
    }
}
