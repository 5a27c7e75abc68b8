//! Blockchain RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Connect to JSON-RPC endpoint (primary + failovers)
//! - Query chain state (block number, nonces, gas price, receipts)
//! - Broadcast signed raw transactions
//! - Separate node-side rejections from transport failures

use alloy::primitives::{Address, TxHash};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::transports::TransportError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::blockchain::types::{BlockchainError, BlockchainResult, ChainId, ReceiptSummary};
use crate::config::NetworkConfig;

/// The network operations the bid path needs.
///
/// Implemented by [`RpcClient`] for real nodes and by
/// [`MockChain`](crate::blockchain::mock::MockChain) for tests.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Chain ID reported by the node.
    async fn chain_id(&self) -> BlockchainResult<ChainId>;

    /// Latest block number.
    async fn block_number(&self) -> BlockchainResult<u64>;

    /// Transaction count of `address` including pending transactions.
    async fn pending_nonce(&self, address: Address) -> BlockchainResult<u64>;

    /// Current gas price in wei.
    async fn gas_price(&self) -> BlockchainResult<u128>;

    /// Broadcast an EIP-2718 encoded, signed transaction.
    async fn send_raw_transaction(&self, raw: &[u8]) -> BlockchainResult<TxHash>;

    /// Receipt for `tx_hash`, `None` while still pending.
    async fn transaction_receipt(&self, tx_hash: TxHash)
        -> BlockchainResult<Option<ReceiptSummary>>;

    /// Label used in logs and metrics.
    fn endpoint(&self) -> &str;
}

/// Map a transport error to a node rejection when the node actually answered.
fn classify_transport_error(err: TransportError) -> BlockchainError {
    match err.as_error_resp() {
        Some(payload) => BlockchainError::Rejected {
            code: payload.code,
            message: payload.message.to_string(),
        },
        None => BlockchainError::Rpc(err.to_string()),
    }
}

/// JSON-RPC client wrapper with failover support.
#[derive(Clone)]
pub struct RpcClient {
    /// List of providers (primary + failovers).
    providers: Vec<Arc<dyn Provider + Send + Sync>>,
    /// Primary endpoint, for logs.
    rpc_url: String,
    /// Expected chain ID.
    chain_id: u64,
    /// Request timeout duration.
    timeout_duration: Duration,
}

impl RpcClient {
    /// Build the client without touching the network.
    pub fn new(config: &NetworkConfig) -> BlockchainResult<Self> {
        let mut providers = Vec::new();

        let primary_url: url::Url = config.rpc_url.parse().map_err(|e| {
            BlockchainError::Rpc(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;
        providers.push(
            Arc::new(ProviderBuilder::new().connect_http(primary_url))
                as Arc<dyn Provider + Send + Sync>,
        );

        for url_str in &config.failover_urls {
            if let Ok(url) = url_str.parse() {
                providers.push(
                    Arc::new(ProviderBuilder::new().connect_http(url))
                        as Arc<dyn Provider + Send + Sync>,
                );
            } else {
                tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL");
            }
        }

        Ok(Self {
            providers,
            rpc_url: config.rpc_url.clone(),
            chain_id: config.chain_id,
            timeout_duration: Duration::from_secs(config.rpc_timeout_secs),
        })
    }

    /// Build the client and verify the node's chain ID.
    ///
    /// An unreachable node or a mismatch is logged, not fatal; bids will fail
    /// with a classified error until the node is reachable.
    pub async fn connect(config: &NetworkConfig) -> BlockchainResult<Self> {
        let client = Self::new(config)?;

        match client.verify_chain_id().await {
            Ok(()) => {
                tracing::info!(
                    rpc_url = %client.rpc_url,
                    chain_id = client.chain_id,
                    "Blockchain client initialized"
                );
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Blockchain client initialized but chain verification failed"
                );
            }
        }

        Ok(client)
    }

    /// Verify the connected chain ID matches configuration.
    pub async fn verify_chain_id(&self) -> BlockchainResult<()> {
        let chain_id = self.chain_id().await?;
        if chain_id.0 != self.chain_id {
            return Err(BlockchainError::ChainMismatch {
                expected: self.chain_id,
                actual: chain_id.0,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ChainClient for RpcClient {
    async fn chain_id(&self) -> BlockchainResult<ChainId> {
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, provider.get_chain_id()).await {
                Ok(Ok(result)) => return Ok(ChainId(result)),
                Ok(Err(e)) => {
                    tracing::warn!(provider_idx = i, error = %e, "RPC error, trying next provider");
                }
                Err(_) => {
                    tracing::warn!(provider_idx = i, "RPC timeout, trying next provider");
                }
            }
        }
        Err(BlockchainError::Rpc("All RPC providers failed".to_string()))
    }

    async fn block_number(&self) -> BlockchainResult<u64> {
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, provider.get_block_number()).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => tracing::warn!(provider_idx = i, error = %e, "RPC error"),
                Err(_) => tracing::warn!(provider_idx = i, "RPC timeout"),
            }
        }
        Err(BlockchainError::Rpc("All providers failed to get block number".to_string()))
    }

    async fn pending_nonce(&self, address: Address) -> BlockchainResult<u64> {
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.get_transaction_count(address).pending();
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => tracing::warn!(provider_idx = i, error = %e, "RPC error"),
                Err(_) => tracing::warn!(provider_idx = i, "RPC timeout"),
            }
        }
        Err(BlockchainError::Rpc("All providers failed to get transaction count".to_string()))
    }

    async fn gas_price(&self) -> BlockchainResult<u128> {
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, provider.get_gas_price()).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => tracing::warn!(provider_idx = i, error = %e, "RPC error"),
                Err(_) => tracing::warn!(provider_idx = i, "RPC timeout"),
            }
        }
        Err(BlockchainError::Rpc("All providers failed to get gas price".to_string()))
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> BlockchainResult<TxHash> {
        // Resending the same signed bytes to a failover is idempotent: same hash,
        // same nonce. A node-side rejection is final and is not retried.
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, provider.send_raw_transaction(raw)).await {
                Ok(Ok(pending)) => return Ok(*pending.tx_hash()),
                Ok(Err(e)) => match classify_transport_error(e) {
                    rejected @ BlockchainError::Rejected { .. } => return Err(rejected),
                    other => {
                        tracing::warn!(provider_idx = i, error = %other, "Broadcast failed, trying next provider")
                    }
                },
                Err(_) => tracing::warn!(provider_idx = i, "Broadcast timeout, trying next provider"),
            }
        }
        Err(BlockchainError::Rpc("All providers failed to broadcast transaction".to_string()))
    }

    async fn transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> BlockchainResult<Option<ReceiptSummary>> {
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, provider.get_transaction_receipt(tx_hash)).await {
                Ok(Ok(result)) => {
                    return Ok(result.map(|receipt| ReceiptSummary {
                        tx_hash,
                        block_number: receipt.block_number,
                        success: receipt.status(),
                    }))
                }
                Ok(Err(e)) => tracing::warn!(provider_idx = i, error = %e, "RPC error"),
                Err(_) => tracing::warn!(provider_idx = i, "RPC timeout"),
            }
        }
        Err(BlockchainError::Rpc("All providers failed to get receipt".to_string()))
    }

    fn endpoint(&self) -> &str {
        &self.rpc_url
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("rpc_url", &self.rpc_url)
            .field("chain_id", &self.chain_id)
            .field("providers", &self.providers.len())
            .field("timeout", &self.timeout_duration)
            .finish()
    }
}
