//! JSON-RPC endpoint implementation over HTTP.

use std::{str::FromStr, time::Duration};

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64_STANDARD};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use solana_message::Hash;
use solana_pubkey::Pubkey;
use solana_signature::Signature;

use super::{
    Commitment, LatestBlockhash, PrioritizationFeeSample, RpcEndpoint, SendConfig,
    SignatureStatus, TokenAmount, TransportError,
};

/// Per-request HTTP timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// JSON-RPC endpoint talking to one node URL.
#[derive(Debug, Clone)]
pub struct JsonRpcEndpoint {
    /// HTTP client used for RPC calls.
    client: reqwest::Client,
    /// Target JSON-RPC endpoint URL.
    rpc_url: String,
    /// Commitment used for reads.
    commitment: Commitment,
}

impl JsonRpcEndpoint {
    /// Creates a JSON-RPC endpoint reading at `confirmed` commitment.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Config`] when HTTP client creation fails.
    pub fn new(rpc_url: impl Into<String>) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|error| TransportError::Config {
                message: error.to_string(),
            })?;
        Ok(Self {
            client,
            rpc_url: rpc_url.into(),
            commitment: Commitment::Confirmed,
        })
    }

    /// Sets the commitment used for reads.
    #[must_use]
    pub const fn with_commitment(mut self, commitment: Commitment) -> Self {
        self.commitment = commitment;
        self
    }

    /// Returns the endpoint URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.rpc_url
    }

    /// Performs one JSON-RPC call and decodes its `result`.
    async fn call<R>(&self, method: &'static str, params: Value) -> Result<R, TransportError>
    where
        R: DeserializeOwned,
    {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&payload)
            .send()
            .await
            .map_err(|error| TransportError::Failure {
                message: error.to_string(),
            })?;

        let response = response
            .error_for_status()
            .map_err(|error| TransportError::Failure {
                message: error.to_string(),
            })?;

        let parsed: JsonRpcResponse<R> =
            response
                .json()
                .await
                .map_err(|error| TransportError::Decode {
                    message: format!("{method}: {error}"),
                })?;

        if let Some(error) = parsed.error {
            return Err(TransportError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        parsed.result.ok_or_else(|| TransportError::Decode {
            message: format!("{method}: rpc returned neither result nor error"),
        })
    }

    /// Builds the `{ "commitment": .. }` config object used by read calls.
    fn commitment_config(&self) -> Value {
        json!({ "commitment": self.commitment.as_str() })
    }
}

/// JSON-RPC envelope.
#[derive(Debug, Deserialize)]
struct JsonRpcResponse<R> {
    /// Result value for successful calls.
    result: Option<R>,
    /// Error payload for failed calls.
    error: Option<JsonRpcError>,
}

/// JSON-RPC error object.
#[derive(Debug, Deserialize)]
struct JsonRpcError {
    /// JSON-RPC error code.
    code: i64,
    /// Human-readable message.
    message: String,
}

/// Result wrapper carrying a `context` alongside `value`.
#[derive(Debug, Deserialize)]
struct WithContext<T> {
    /// Wrapped value.
    value: T,
}

/// `getLatestBlockhash` value.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockhashWire {
    /// Base58 blockhash.
    blockhash: String,
    /// Last block height at which the blockhash is accepted.
    last_valid_block_height: u64,
}

/// One `getRecentPrioritizationFees` entry.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrioritizationFeeWire {
    /// Slot the sample was taken from.
    slot: u64,
    /// Minimum fee paid in that slot, in micro-lamports per compute unit.
    prioritization_fee: u64,
}

/// Non-null `getSignatureStatuses` entry.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignatureStatusWire {
    /// Slot the transaction was processed in.
    slot: u64,
    /// Highest commitment reached; absent on old nodes.
    #[serde(default)]
    confirmation_status: Option<Commitment>,
    /// Execution error, `null` on success.
    #[serde(default)]
    err: Option<Value>,
}

/// `getTokenAccountBalance` value.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenAmountWire {
    /// Base units as a decimal string.
    amount: String,
    /// Mint decimals.
    decimals: u8,
    /// Human-readable amount.
    ui_amount_string: String,
}

impl TryFrom<BlockhashWire> for LatestBlockhash {
    type Error = TransportError;

    fn try_from(wire: BlockhashWire) -> Result<Self, Self::Error> {
        let blockhash =
            Hash::from_str(&wire.blockhash).map_err(|error| TransportError::Decode {
                message: format!("blockhash {}: {error}", wire.blockhash),
            })?;
        Ok(Self {
            blockhash,
            last_valid_block_height: wire.last_valid_block_height,
        })
    }
}

impl From<SignatureStatusWire> for SignatureStatus {
    fn from(wire: SignatureStatusWire) -> Self {
        Self {
            slot: wire.slot,
            confirmation_status: wire.confirmation_status,
            err: wire.err.filter(|err| !err.is_null()),
        }
    }
}

impl TryFrom<TokenAmountWire> for TokenAmount {
    type Error = TransportError;

    fn try_from(wire: TokenAmountWire) -> Result<Self, Self::Error> {
        let amount = wire
            .amount
            .parse::<u64>()
            .map_err(|error| TransportError::Decode {
                message: format!("token amount {}: {error}", wire.amount),
            })?;
        Ok(Self {
            amount,
            decimals: wire.decimals,
            ui_amount_string: wire.ui_amount_string,
        })
    }
}

#[async_trait]
impl RpcEndpoint for JsonRpcEndpoint {
    async fn latest_blockhash(&self) -> Result<LatestBlockhash, TransportError> {
        let wire: WithContext<BlockhashWire> = self
            .call("getLatestBlockhash", json!([self.commitment_config()]))
            .await?;
        LatestBlockhash::try_from(wire.value)
    }

    async fn recent_prioritization_fees(
        &self,
        accounts: &[Pubkey],
    ) -> Result<Vec<PrioritizationFeeSample>, TransportError> {
        let accounts: Vec<String> = accounts.iter().map(ToString::to_string).collect();
        let wire: Vec<PrioritizationFeeWire> = self
            .call("getRecentPrioritizationFees", json!([accounts]))
            .await?;
        Ok(wire
            .into_iter()
            .map(|sample| PrioritizationFeeSample {
                slot: sample.slot,
                prioritization_fee: sample.prioritization_fee,
            })
            .collect())
    }

    async fn send_transaction(
        &self,
        tx_bytes: &[u8],
        config: &SendConfig,
    ) -> Result<String, TransportError> {
        #[derive(Debug, Serialize)]
        struct RpcConfig<'config> {
            /// Transaction encoding format.
            encoding: &'config str,
            /// Preflight skip flag.
            #[serde(rename = "skipPreflight")]
            skip_preflight: bool,
            /// Optional preflight commitment.
            #[serde(
                rename = "preflightCommitment",
                skip_serializing_if = "Option::is_none"
            )]
            preflight_commitment: Option<&'config str>,
            /// Optional node-side rebroadcast budget.
            #[serde(rename = "maxRetries", skip_serializing_if = "Option::is_none")]
            max_retries: Option<usize>,
        }

        let encoded_tx = BASE64_STANDARD.encode(tx_bytes);
        self.call(
            "sendTransaction",
            json!([
                encoded_tx,
                RpcConfig {
                    encoding: "base64",
                    skip_preflight: config.skip_preflight,
                    preflight_commitment: config.preflight_commitment.map(Commitment::as_str),
                    max_retries: config.max_retries,
                }
            ]),
        )
        .await
    }

    async fn signature_statuses(
        &self,
        signatures: &[Signature],
    ) -> Result<Vec<Option<SignatureStatus>>, TransportError> {
        let signatures: Vec<String> = signatures.iter().map(ToString::to_string).collect();
        let wire: WithContext<Vec<Option<SignatureStatusWire>>> = self
            .call(
                "getSignatureStatuses",
                json!([signatures, { "searchTransactionHistory": false }]),
            )
            .await?;
        Ok(wire
            .value
            .into_iter()
            .map(|status| status.map(SignatureStatus::from))
            .collect())
    }

    async fn block_height(&self) -> Result<u64, TransportError> {
        self.call("getBlockHeight", json!([self.commitment_config()]))
            .await
    }

    async fn request_airdrop(
        &self,
        address: &Pubkey,
        lamports: u64,
    ) -> Result<Signature, TransportError> {
        let signature: String = self
            .call(
                "requestAirdrop",
                json!([address.to_string(), lamports, self.commitment_config()]),
            )
            .await?;
        Signature::from_str(&signature).map_err(|error| TransportError::Decode {
            message: format!("airdrop signature {signature}: {error}"),
        })
    }

    async fn token_account_balance(
        &self,
        address: &Pubkey,
    ) -> Result<TokenAmount, TransportError> {
        let wire: WithContext<TokenAmountWire> = self
            .call(
                "getTokenAccountBalance",
                json!([address.to_string(), self.commitment_config()]),
            )
            .await?;
        TokenAmount::try_from(wire.value)
    }

    async fn minimum_balance_for_rent_exemption(
        &self,
        data_len: usize,
    ) -> Result<u64, TransportError> {
        self.call(
            "getMinimumBalanceForRentExemption",
            json!([data_len, self.commitment_config()]),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_status_wire_drops_null_error() {
        let parsed: Result<WithContext<Vec<Option<SignatureStatusWire>>>, _> =
            serde_json::from_value(json!({
                "context": { "slot": 82 },
                "value": [
                    {
                        "slot": 72,
                        "confirmations": 10,
                        "err": null,
                        "status": { "Ok": null },
                        "confirmationStatus": "confirmed"
                    },
                    null
                ]
            }));
        assert!(parsed.is_ok());
        if let Ok(parsed) = parsed {
            let statuses: Vec<Option<SignatureStatus>> = parsed
                .value
                .into_iter()
                .map(|status| status.map(SignatureStatus::from))
                .collect();
            assert_eq!(statuses.len(), 2);
            assert_eq!(
                statuses.first().cloned().flatten(),
                Some(SignatureStatus {
                    slot: 72,
                    confirmation_status: Some(Commitment::Confirmed),
                    err: None,
                })
            );
            assert_eq!(statuses.get(1).cloned().flatten(), None);
        }
    }

    #[test]
    fn signature_status_wire_keeps_execution_error() {
        let parsed: Result<SignatureStatusWire, _> = serde_json::from_value(json!({
            "slot": 9,
            "confirmations": null,
            "err": { "InstructionError": [2, { "Custom": 6000 }] },
            "confirmationStatus": "processed"
        }));
        assert!(parsed.is_ok());
        if let Ok(parsed) = parsed {
            let status = SignatureStatus::from(parsed);
            assert!(status.err.is_some());
            assert_eq!(status.confirmation_status, Some(Commitment::Processed));
        }
    }

    #[test]
    fn token_amount_wire_parses_string_amount() {
        let parsed: Result<TokenAmountWire, _> = serde_json::from_value(json!({
            "amount": "992000000",
            "decimals": 6,
            "uiAmount": 992.0,
            "uiAmountString": "992"
        }));
        assert!(parsed.is_ok());
        if let Ok(parsed) = parsed {
            let amount = TokenAmount::try_from(parsed);
            assert_eq!(
                amount,
                Ok(TokenAmount {
                    amount: 992_000_000,
                    decimals: 6,
                    ui_amount_string: "992".to_owned(),
                })
            );
        }
    }

    #[test]
    fn blockhash_wire_rejects_malformed_hash() {
        let wire = BlockhashWire {
            blockhash: "not-base58!".to_owned(),
            last_valid_block_height: 10,
        };
        assert!(matches!(
            LatestBlockhash::try_from(wire),
            Err(TransportError::Decode { .. })
        ));
    }

    #[test]
    fn rpc_error_envelope_is_decoded() {
        let parsed: Result<JsonRpcResponse<String>, _> = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32002, "message": "Blockhash not found" }
        }));
        assert!(parsed.is_ok());
        if let Ok(parsed) = parsed {
            assert!(parsed.result.is_none());
            let error = parsed.error;
            assert!(error.is_some());
            if let Some(error) = error {
                assert_eq!(error.code, -32002);
            }
        }
    }
}
