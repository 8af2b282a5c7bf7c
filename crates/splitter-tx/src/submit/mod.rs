//! Reliable transaction submission and confirmation.

/// Reliable submitter implementation.
mod client;
/// Shared submission types and errors.
mod types;

pub use client::ReliableSubmitter;
pub use types::{
    ConfirmationStatus, SubmissionAttempt, SubmitConfig, SubmitError, SubmitOutcome,
};
