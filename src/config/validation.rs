//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Required values present (RPC URL, chain id, contract, accounts)
//! - Validate value ranges (timeouts > 0, gas ceiling > 0)
//! - Detect duplicate account identifiers
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use alloy::primitives::Address;
use thiserror::Error;

use crate::config::schema::RelayConfig;

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{field} is invalid: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("duplicate account identifier '{0}'")]
    DuplicateIdentifier(String),
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ValidationError {
    ValidationError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Validate a parsed configuration, collecting every problem.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<std::net::SocketAddr>().is_err() {
        errors.push(invalid(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    let network = &config.network;
    if network.rpc_url.trim().is_empty() {
        errors.push(ValidationError::Missing("network.rpc_url"));
    } else if let Err(e) = network.rpc_url.parse::<url::Url>() {
        errors.push(invalid("network.rpc_url", e.to_string()));
    }
    if network.chain_id == 0 {
        errors.push(ValidationError::Missing("network.chain_id"));
    }
    if network.rpc_timeout_secs == 0 {
        errors.push(invalid("network.rpc_timeout_secs", "must be greater than zero"));
    }

    let bidding = &config.bidding;
    if bidding.contract_address.trim().is_empty() {
        errors.push(ValidationError::Missing("bidding.contract_address"));
    } else if let Err(e) = bidding.contract_address.parse::<Address>() {
        errors.push(invalid("bidding.contract_address", e.to_string()));
    }
    if bidding.gas_limit == 0 {
        errors.push(invalid("bidding.gas_limit", "must be greater than zero"));
    }
    if bidding.confirmation_timeout_secs == 0 {
        errors.push(invalid(
            "bidding.confirmation_timeout_secs",
            "must be greater than zero",
        ));
    }
    if bidding.poll_interval_ms == 0 {
        errors.push(invalid("bidding.poll_interval_ms", "must be greater than zero"));
    }
    if bidding.confirmations == 0 {
        errors.push(invalid("bidding.confirmations", "must be at least 1"));
    }
    if !(bidding.gas_price_multiplier.is_finite() && bidding.gas_price_multiplier >= 1.0) {
        errors.push(invalid("bidding.gas_price_multiplier", "must be >= 1.0"));
    }

    if config.accounts.is_empty() {
        errors.push(ValidationError::Missing("accounts"));
    }
    let mut seen = HashSet::new();
    for account in &config.accounts {
        if account.identifier.is_empty() {
            errors.push(invalid("accounts.identifier", "must not be empty"));
        }
        if account.private_key_env.trim().is_empty() {
            errors.push(invalid(
                "accounts.private_key_env",
                format!("missing for identifier '{}'", account.identifier),
            ));
        }
        if !seen.insert(account.identifier.as_str()) {
            errors.push(ValidationError::DuplicateIdentifier(account.identifier.clone()));
        }
    }

    // The HTTP timeout must outlive the confirmation wait, otherwise callers see
    // a generic timeout instead of ConfirmationTimeout.
    if config.timeouts.request_secs <= bidding.confirmation_timeout_secs {
        errors.push(invalid(
            "timeouts.request_secs",
            format!(
                "must exceed bidding.confirmation_timeout_secs ({})",
                bidding.confirmation_timeout_secs
            ),
        ));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(invalid(
            "observability.metrics_address",
            "not a socket address",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
