//! Network node interface consumed by the submitter, retrier, and workshop flow.

/// JSON-RPC endpoint implementation.
mod rpc;
/// Shared endpoint types, errors, and the endpoint trait.
mod types;

pub use rpc::JsonRpcEndpoint;
pub use types::{
    Commitment, LatestBlockhash, PrioritizationFeeSample, RpcEndpoint, SendConfig,
    SignatureStatus, TokenAmount, TransportError,
};
