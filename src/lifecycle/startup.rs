//! Startup orchestration.
//!
//! Order: validated config → accounts (keys from environment) → RPC client →
//! bid service. Any error here is fatal and the listener is never bound.

use std::sync::Arc;

use thiserror::Error;

use crate::accounts::AccountResolver;
use crate::bidding::{BidService, BidSubmitter, SubmitterSettings};
use crate::blockchain::client::{ChainClient, RpcClient};
use crate::blockchain::types::BlockchainError;
use crate::config::{ConfigError, RelayConfig};

/// Fatal startup failures.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("blockchain client error: {0}")]
    Blockchain(#[from] BlockchainError),
}

/// Everything the HTTP layer needs.
#[derive(Clone)]
pub struct Runtime {
    pub service: Arc<BidService>,
    pub chain: Arc<dyn ChainClient>,
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("service", &self.service)
            .field("endpoint", &self.chain.endpoint())
            .finish()
    }
}

/// Assemble the bid service around an existing chain client.
pub fn assemble(
    config: &RelayConfig,
    resolver: AccountResolver,
    chain: Arc<dyn ChainClient>,
) -> Result<Runtime, StartupError> {
    let settings = SubmitterSettings::from_config(&config.network, &config.bidding)?;
    let submitter = BidSubmitter::new(chain.clone(), settings);

    tracing::info!(
        accounts = resolver.len(),
        contract = %submitter.settings().contract,
        gas_limit = submitter.settings().gas_limit,
        confirmation_timeout_secs = config.bidding.confirmation_timeout_secs,
        "Bid service ready"
    );

    Ok(Runtime {
        service: Arc::new(BidService::new(resolver, submitter)),
        chain,
    })
}

/// Load accounts from the environment, connect to the RPC endpoint and assemble.
pub async fn build_runtime(config: &RelayConfig) -> Result<Runtime, StartupError> {
    let resolver = AccountResolver::from_config(&config.accounts)?;
    let chain: Arc<dyn ChainClient> = Arc::new(RpcClient::connect(&config.network).await?);
    assemble(config, resolver, chain)
}
