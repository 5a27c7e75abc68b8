//! Signing accounts and per-account sequence state.
//!
//! # Security
//! - Private keys are loaded ONLY from environment variables
//! - Keys are never logged or serialized

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

use crate::blockchain::types::{BlockchainError, BlockchainResult};
use crate::config::ConfigError;

/// Next-nonce cache for one account.
///
/// Only reachable through [`Account::lock_sequence`], so nonce assignment and
/// broadcast for one address never interleave. Identifiers that sign with the
/// same key share one state.
#[derive(Debug, Default)]
pub struct SequenceState {
    next_nonce: Option<u64>,
}

impl SequenceState {
    /// Nonce to use next, if known locally.
    pub fn cached(&self) -> Option<u64> {
        self.next_nonce
    }

    /// Record that `used` was accepted by the network.
    pub fn advance_past(&mut self, used: u64) {
        self.next_nonce = Some(used + 1);
    }

    /// Forget the cached nonce; the next bid re-reads it from the chain.
    pub fn invalidate(&mut self) {
        self.next_nonce = None;
    }
}

/// A signing identity selected by a caller-facing identifier.
pub struct Account {
    identifier: String,
    address: Address,
    wallet: EthereumWallet,
    sequence: Arc<Mutex<SequenceState>>,
}

impl Account {
    /// Create an account from a hex-encoded private key string.
    ///
    /// # Arguments
    /// * `identifier` - Caller-facing identifier
    /// * `private_key_hex` - Hex string (with or without 0x prefix)
    pub fn from_private_key(identifier: &str, private_key_hex: &str) -> BlockchainResult<Self> {
        let key_hex = private_key_hex
            .trim()
            .strip_prefix("0x")
            .unwrap_or(private_key_hex.trim());

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| BlockchainError::Wallet(format!("Invalid private key format: {}", e)))?;
        let address = signer.address();

        tracing::info!(
            identifier = %identifier,
            address = %address,
            "Account loaded"
        );

        Ok(Self {
            identifier: identifier.to_string(),
            address,
            wallet: EthereumWallet::from(signer),
            sequence: Arc::new(Mutex::new(SequenceState::default())),
        })
    }

    /// Load an account key through `lookup`, typically the process environment.
    pub fn from_lookup<F>(identifier: &str, env_var: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let private_key = lookup(env_var).ok_or_else(|| ConfigError::MissingCredential {
            identifier: identifier.to_string(),
            env_var: env_var.to_string(),
        })?;

        Self::from_private_key(identifier, &private_key).map_err(|e| {
            ConfigError::InvalidCredential {
                identifier: identifier.to_string(),
                reason: e.to_string(),
            }
        })
    }

    /// Load an account key from the named environment variable.
    pub fn from_env(identifier: &str, env_var: &str) -> Result<Self, ConfigError> {
        Self::from_lookup(identifier, env_var, |name| std::env::var(name).ok())
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Get the account's address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Wallet used to sign this account's transactions.
    pub fn wallet(&self) -> &EthereumWallet {
        &self.wallet
    }

    /// Use `other`'s sequence state. Both must sign with the same address.
    pub(crate) fn share_sequence_with(&mut self, other: &Account) {
        debug_assert_eq!(self.address, other.address);
        self.sequence = Arc::clone(&other.sequence);
    }

    /// Acquire the account's sequence lock.
    ///
    /// Held from nonce assignment until the broadcast returns.
    pub async fn lock_sequence(&self) -> MutexGuard<'_, SequenceState> {
        self.sequence.lock().await
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("identifier", &self.identifier)
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}
