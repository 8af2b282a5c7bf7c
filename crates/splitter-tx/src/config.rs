//! Named environments and client configuration.

use std::{fmt, path::PathBuf, str::FromStr, time::Duration};

use solana_pubkey::Pubkey;
use thiserror::Error;

use crate::{fees::PriorityFeePolicy, retry::RetryPolicy, submit::SubmitConfig};

/// PYUSD mint on devnet.
pub const DEVNET_PYUSD_MINT: Pubkey =
    Pubkey::from_str_const("CXk2AMBfi3TwaEL2468s6zP8xq9NxTXjp9gjMgzeUynM");

/// PYUSD mint on mainnet-beta.
pub const MAINNET_PYUSD_MINT: Pubkey =
    Pubkey::from_str_const("2b1kV6DkPAnxd5ixfnxCpjxmKwqjjaYmCZfHsFu24GXo");

/// Configuration errors.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum ConfigError {
    /// Unknown environment name.
    #[error("unknown environment `{name}` (expected localnet, devnet, or mainnet)")]
    UnknownEnvironment {
        /// Name that failed to parse.
        name: String,
    },
    /// Environment variable holds an unparsable value.
    #[error("invalid value `{value}` for {name}")]
    InvalidValue {
        /// Variable name.
        name: &'static str,
        /// Raw value.
        value: String,
    },
}

/// Cluster the client talks to.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Environment {
    /// Local test validator.
    Localnet,
    /// Public devnet.
    Devnet,
    /// Mainnet-beta.
    Mainnet,
}

impl Environment {
    /// All environments, in selector order.
    pub const ALL: [Self; 3] = [Self::Localnet, Self::Devnet, Self::Mainnet];

    /// Returns the selector name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Localnet => "localnet",
            Self::Devnet => "devnet",
            Self::Mainnet => "mainnet",
        }
    }

    /// Returns the public RPC URL of the environment.
    #[must_use]
    pub const fn default_rpc_url(self) -> &'static str {
        match self {
            Self::Localnet => "http://127.0.0.1:8899",
            Self::Devnet => "https://api.devnet.solana.com",
            Self::Mainnet => "https://api.mainnet-beta.solana.com",
        }
    }

    /// Returns the token mint used by default, if the environment has one.
    #[must_use]
    pub const fn token_mint(self) -> Option<Pubkey> {
        match self {
            Self::Localnet => None,
            Self::Devnet => Some(DEVNET_PYUSD_MINT),
            Self::Mainnet => Some(MAINNET_PYUSD_MINT),
        }
    }

    /// Returns true when the environment hands out test funds.
    #[must_use]
    pub const fn supports_airdrop(self) -> bool {
        matches!(self, Self::Localnet | Self::Devnet)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "localnet" | "local" | "localhost" => Ok(Self::Localnet),
            "devnet" => Ok(Self::Devnet),
            "mainnet" | "mainnet-beta" => Ok(Self::Mainnet),
            _ => Err(ConfigError::UnknownEnvironment {
                name: value.to_owned(),
            }),
        }
    }
}

/// Everything a client needs, built once and passed by value.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ClientConfig {
    /// Selected environment.
    pub environment: Environment,
    /// JSON-RPC URL.
    pub rpc_url: String,
    /// Fee-payer keypair file.
    pub keypair_path: PathBuf,
    /// Reliable-submission tuning.
    pub submit: SubmitConfig,
    /// One-shot operation retry budget.
    pub retry: RetryPolicy,
}

impl ClientConfig {
    /// Builds the default configuration of an environment.
    #[must_use]
    pub fn for_environment(environment: Environment) -> Self {
        Self {
            environment,
            rpc_url: environment.default_rpc_url().to_owned(),
            keypair_path: default_keypair_path(),
            submit: SubmitConfig::default(),
            retry: RetryPolicy::default(),
        }
    }

    /// Builds the configuration of an environment with process environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when an override does not parse.
    pub fn from_env(environment: Environment) -> Result<Self, ConfigError> {
        Self::from_lookup(environment, |name| std::env::var(name).ok())
    }

    /// Builds the configuration of an environment with overrides from `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when an override does not parse.
    pub fn from_lookup<F>(environment: Environment, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::for_environment(environment);

        if let Some(url) = lookup("SPLITTER_RPC_URL").filter(|url| !url.is_empty()) {
            config.rpc_url = url;
        }
        if let Some(path) = lookup("SPLITTER_KEYPAIR").filter(|path| !path.is_empty()) {
            config.keypair_path = PathBuf::from(path);
        }
        if let Some(units) = parse_var::<u32, _>(&lookup, "SPLITTER_COMPUTE_UNIT_LIMIT")? {
            config.submit.compute_unit_limit = units.clamp(1_000, 1_400_000);
        }
        if let Some(attempts) = parse_var::<u32, _>(&lookup, "SPLITTER_MAX_ATTEMPTS")? {
            config.submit.max_attempts = attempts.max(1);
        }
        if let Some(millis) = parse_var::<u64, _>(&lookup, "SPLITTER_POLL_INTERVAL_MS")? {
            config.submit.poll_interval = Duration::from_millis(millis.max(50));
        }
        if let Some(ceiling) = parse_var::<u64, _>(&lookup, "SPLITTER_PRIORITY_FEE_CEILING")? {
            config.submit.fee_policy = PriorityFeePolicy {
                ceiling,
                ..config.submit.fee_policy
            };
        }
        if let Some(attempts) = parse_var::<u32, _>(&lookup, "SPLITTER_RETRY_ATTEMPTS")? {
            config.retry.attempts = attempts.max(1);
        }

        config.submit = config.submit.normalized();
        config.retry = config.retry.normalized();
        Ok(config)
    }
}

/// Parses one optional variable, rejecting values that are present but malformed.
fn parse_var<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Ok(None),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { name, value }),
    }
}

/// Returns the Solana CLI default keypair location.
fn default_keypair_path() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_default()
        .join(".config/solana/id.json")
}
