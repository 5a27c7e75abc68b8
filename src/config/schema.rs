//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.
//! Credentials and the contract address have no usable defaults; validation
//! rejects a config that leaves them empty.

use serde::{Deserialize, Serialize};

/// Root configuration for the bid relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// JSON-RPC endpoint settings.
    pub network: NetworkConfig,

    /// Target contract and transaction policy.
    pub bidding: BiddingConfig,

    /// Signing accounts, selected by identifier.
    pub accounts: Vec<AccountConfig>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Network (JSON-RPC) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs.
    #[serde(default)]
    pub failover_urls: Vec<String>,

    /// Chain ID used for EIP-155 signing. Zero means "not configured".
    pub chain_id: u64,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            rpc_url: String::new(),
            failover_urls: Vec::new(),
            chain_id: 0,
            rpc_timeout_secs: 10,
        }
    }
}

/// Bid transaction policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BiddingConfig {
    /// Address of the auction contract exposing `bid()`.
    pub contract_address: String,

    /// Gas ceiling attached to every bid transaction.
    pub gas_limit: u64,

    /// Maximum time to wait for a receipt, in seconds.
    pub confirmation_timeout_secs: u64,

    /// Receipt polling interval in milliseconds.
    pub poll_interval_ms: u64,

    /// Block depth required before a bid counts as accepted (1 = included).
    pub confirmations: u64,

    /// Gas price multiplier (1.0 = node estimate, 1.2 = 20% buffer).
    pub gas_price_multiplier: f64,

    /// Maximum gas price in gwei (protection against spikes).
    pub max_gas_price_gwei: u64,
}

impl Default for BiddingConfig {
    fn default() -> Self {
        Self {
            contract_address: String::new(),
            gas_limit: 1_000_000,
            confirmation_timeout_secs: 120,
            poll_interval_ms: 2000,
            confirmations: 1,
            gas_price_multiplier: 1.0,
            max_gas_price_gwei: 5_000,
        }
    }
}

/// A signing account entry.
///
/// Private keys are never written in the config file itself, only the name of
/// the environment variable holding them.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountConfig {
    /// Caller-facing identifier (exact, case-sensitive match).
    pub identifier: String,

    /// Environment variable holding the hex-encoded private key.
    pub private_key_env: String,
}

/// Timeout configuration for HTTP handling.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 180 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Request hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 16 * 1024,
        }
    }
}
