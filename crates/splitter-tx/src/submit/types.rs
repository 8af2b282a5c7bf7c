//! Shared submission types and errors.

use std::time::{Duration, Instant};

use solana_message::Hash;
use solana_signature::Signature;
use thiserror::Error;

use crate::{
    builder::BuilderError,
    fees::PriorityFeePolicy,
    network::{Commitment, SendConfig, SignatureStatus, TransportError},
};

/// Reliable-submission tuning.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SubmitConfig {
    /// Compute-unit ceiling prepended to every transaction.
    pub compute_unit_limit: u32,
    /// Bounds applied to the per-attempt fee estimate.
    pub fee_policy: PriorityFeePolicy,
    /// `sendTransaction` options.
    pub send: SendConfig,
    /// Commitment a signature must reach to count as confirmed.
    pub commitment: Commitment,
    /// Wait between two status polls.
    pub poll_interval: Duration,
    /// Status polls per attempt before the attempt is abandoned.
    pub max_polls_per_attempt: u32,
    /// Attempts per submission, including the first one.
    pub max_attempts: u32,
    /// Backoff after the first failed attempt.
    pub initial_backoff: Duration,
    /// Upper bound for the doubling backoff.
    pub max_backoff: Duration,
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            compute_unit_limit: 200_000,
            fee_policy: PriorityFeePolicy::default(),
            send: SendConfig::default(),
            commitment: Commitment::Confirmed,
            poll_interval: Duration::from_millis(500),
            max_polls_per_attempt: 120,
            max_attempts: 5,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
        }
    }
}

impl SubmitConfig {
    /// Returns a normalized config with bounded minimums.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            max_polls_per_attempt: self.max_polls_per_attempt.max(1),
            max_attempts: self.max_attempts.max(1),
            max_backoff: self.max_backoff.max(self.initial_backoff),
            fee_policy: self.fee_policy.normalized(),
            ..self
        }
    }

    /// Returns the wait after failed attempt number `attempt` (1-based).
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let factor = 1_u32.checked_shl(exponent).unwrap_or(u32::MAX);
        self.initial_backoff
            .checked_mul(factor)
            .map_or(self.max_backoff, |backoff| backoff.min(self.max_backoff))
    }
}

/// Confirmation state of one broadcast signature.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ConfirmationStatus {
    /// Not yet observed, or observed below the target commitment.
    Pending,
    /// Observed at or above the target commitment without error.
    Confirmed,
    /// Executed with an on-chain error.
    Failed(String),
}

impl ConfirmationStatus {
    /// Classifies a node-reported status against a target commitment.
    #[must_use]
    pub fn classify(status: Option<&SignatureStatus>, target: Commitment) -> Self {
        match status {
            None => Self::Pending,
            Some(status) => match &status.err {
                Some(err) => Self::Failed(err.to_string()),
                None if status.reached(target) => Self::Confirmed,
                None => Self::Pending,
            },
        }
    }
}

/// Transient record of one broadcast.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SubmissionAttempt {
    /// 1-based attempt number.
    pub attempt: u32,
    /// Signature of the broadcast transaction.
    pub signature: Signature,
    /// Blockhash the transaction was signed against.
    pub blockhash: Hash,
    /// Expiry height of `blockhash`.
    pub last_valid_block_height: u64,
    /// Priority fee paid, micro-lamports per compute unit.
    pub priority_fee_micro_lamports: u64,
    /// Local broadcast time.
    pub submitted_at: Instant,
}

/// Summary of a confirmed submission.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SubmitOutcome {
    /// Confirmed transaction signature.
    pub signature: Signature,
    /// Slot the transaction landed in.
    pub slot: u64,
    /// Attempts made by this call.
    pub attempts: u32,
}

/// Submission-level errors.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Could not build/sign transaction.
    #[error("failed to build/sign transaction: {source}")]
    Build {
        /// Builder-layer failure.
        source: BuilderError,
    },
    /// Signed transaction could not be serialized.
    #[error("failed to encode signed transaction: {source}")]
    Encode {
        /// Bincode encode error.
        source: Box<bincode::ErrorKind>,
    },
    /// Signed transaction carried no signature.
    #[error("signed transaction carries no signature")]
    MissingSignature,
    /// Network call failed.
    #[error("{stage} failed: {source}")]
    Transport {
        /// RPC step that failed.
        stage: &'static str,
        /// Transport error.
        source: TransportError,
    },
    /// Blockhash expired before the transaction was observed.
    #[error("blockhash expired before {signature} was confirmed")]
    BlockhashExpired {
        /// Signature of the abandoned broadcast.
        signature: Signature,
    },
    /// Poll budget spent without observing the transaction.
    #[error("{signature} not confirmed after {polls} status polls")]
    ConfirmationTimeout {
        /// Signature of the abandoned broadcast.
        signature: Signature,
        /// Polls made.
        polls: u32,
    },
    /// Transaction executed and failed on-chain.
    #[error("transaction {signature} failed on-chain: {error}")]
    Execution {
        /// Failed transaction signature.
        signature: Signature,
        /// Node-reported execution error.
        error: String,
    },
    /// Every attempt failed with a retryable error.
    #[error("submission abandoned after {attempts} attempts: {last}")]
    AttemptsExhausted {
        /// Attempts made.
        attempts: u32,
        /// Error of the final attempt.
        last: Box<SubmitError>,
    },
}

impl SubmitError {
    /// Returns true for transient failures that a fresh attempt may cure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. }
            | Self::BlockhashExpired { .. }
            | Self::ConfirmationTimeout { .. } => true,
            Self::Build { .. }
            | Self::Encode { .. }
            | Self::MissingSignature
            | Self::Execution { .. }
            | Self::AttemptsExhausted { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn backoff_doubles_then_caps() {
        let config = SubmitConfig {
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(3),
            ..SubmitConfig::default()
        };
        assert_eq!(config.backoff(1), Duration::from_millis(500));
        assert_eq!(config.backoff(2), Duration::from_secs(1));
        assert_eq!(config.backoff(3), Duration::from_secs(2));
        assert_eq!(config.backoff(4), Duration::from_secs(3));
        assert_eq!(config.backoff(40), Duration::from_secs(3));
    }

    #[test]
    fn normalized_enforces_minimums() {
        let config = SubmitConfig {
            max_attempts: 0,
            max_polls_per_attempt: 0,
            initial_backoff: Duration::from_secs(4),
            max_backoff: Duration::from_secs(1),
            ..SubmitConfig::default()
        }
        .normalized();
        assert_eq!(config.max_attempts, 1);
        assert_eq!(config.max_polls_per_attempt, 1);
        assert_eq!(config.max_backoff, Duration::from_secs(4));
    }

    #[test]
    fn classify_distinguishes_terminal_states() {
        let processed = SignatureStatus {
            slot: 1,
            confirmation_status: Some(Commitment::Processed),
            err: None,
        };
        let confirmed = SignatureStatus {
            confirmation_status: Some(Commitment::Confirmed),
            ..processed.clone()
        };
        let failed = SignatureStatus {
            err: Some(json!({ "InstructionError": [0, "InvalidAccountData"] })),
            ..processed.clone()
        };

        assert_eq!(
            ConfirmationStatus::classify(None, Commitment::Confirmed),
            ConfirmationStatus::Pending
        );
        assert_eq!(
            ConfirmationStatus::classify(Some(&processed), Commitment::Confirmed),
            ConfirmationStatus::Pending
        );
        assert_eq!(
            ConfirmationStatus::classify(Some(&confirmed), Commitment::Confirmed),
            ConfirmationStatus::Confirmed
        );
        assert!(matches!(
            ConfirmationStatus::classify(Some(&failed), Commitment::Confirmed),
            ConfirmationStatus::Failed(_)
        ));
    }

    #[test]
    fn execution_errors_are_not_retryable() {
        let execution = SubmitError::Execution {
            signature: Signature::default(),
            error: "custom program error: 0x1770".to_owned(),
        };
        let transport = SubmitError::Transport {
            stage: "send_transaction",
            source: TransportError::Failure {
                message: "connection reset".to_owned(),
            },
        };
        assert!(!execution.is_retryable());
        assert!(transport.is_retryable());
    }
}
