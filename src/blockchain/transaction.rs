//! Bid transaction building, signing, and confirmation monitoring.
//!
//! # Responsibilities
//! - Encode the `bid()` call and attach value and gas ceiling
//! - Sign as a legacy EIP-155 transaction with the account key
//! - Poll receipts until the required depth or the deadline

use alloy::eips::eip2718::Encodable2718;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::sol;
use alloy::sol_types::SolCall;
use std::time::{Duration, Instant};
use tokio::time::{interval, timeout, MissedTickBehavior};

use crate::blockchain::client::ChainClient;
use crate::blockchain::types::{BlockchainError, BlockchainResult, ConfirmationStatus};

sol! {
    /// Auction entry point; the attached value is the bid.
    function bid() external payable;
}

/// Everything needed to build one bid transaction.
#[derive(Debug, Clone, Copy)]
pub struct BidTxParams {
    pub from: Address,
    pub contract: Address,
    pub value: U256,
    pub nonce: u64,
    pub gas_limit: u64,
    pub gas_price: u128,
    pub chain_id: u64,
}

/// A signed transaction ready to broadcast.
#[derive(Debug, Clone)]
pub struct SignedBid {
    pub tx_hash: TxHash,
    pub raw: Vec<u8>,
}

/// Calldata for `bid()`.
pub fn bid_calldata() -> Bytes {
    Bytes::from(bidCall {}.abi_encode())
}

/// Build the unsigned request for a bid.
pub fn build_bid_request(params: &BidTxParams) -> TransactionRequest {
    TransactionRequest::default()
        .with_from(params.from)
        .with_to(params.contract)
        .with_value(params.value)
        .with_input(bid_calldata())
        .with_nonce(params.nonce)
        .with_gas_limit(params.gas_limit)
        .with_gas_price(params.gas_price)
        .with_chain_id(params.chain_id)
}

/// Build and sign a bid transaction.
pub async fn sign_bid(params: &BidTxParams, wallet: &EthereumWallet) -> BlockchainResult<SignedBid> {
    let envelope = build_bid_request(params)
        .build(wallet)
        .await
        .map_err(|e| BlockchainError::Wallet(format!("Signing failed: {}", e)))?;

    Ok(SignedBid {
        tx_hash: *envelope.tx_hash(),
        raw: envelope.encoded_2718(),
    })
}

/// Apply the configured multiplier to a node gas price, refusing results above the ceiling.
pub fn adjust_gas_price(
    node_price: u128,
    multiplier: f64,
    max_gwei: u64,
) -> BlockchainResult<u128> {
    let adjusted = (node_price as f64 * multiplier) as u128;
    let adjusted_gwei = adjusted / 1_000_000_000;
    if adjusted_gwei > max_gwei as u128 {
        return Err(BlockchainError::GasPriceTooHigh {
            current_gwei: u64::try_from(adjusted_gwei).unwrap_or(u64::MAX),
            max_gwei,
        });
    }
    Ok(adjusted)
}

/// Wait for a transaction to reach `confirmations` blocks of depth.
///
/// RPC errors while polling are logged and polling continues; only the
/// deadline ends the wait without a receipt. The broadcast transaction is
/// never retracted.
pub async fn wait_for_confirmation(
    client: &dyn ChainClient,
    tx_hash: TxHash,
    confirmations: u64,
    poll_interval: Duration,
    deadline: Duration,
) -> ConfirmationStatus {
    let started = Instant::now();

    let result = timeout(deadline, async {
        let mut ticker = interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let receipt = match client.transaction_receipt(tx_hash).await {
                Ok(Some(r)) => r,
                Ok(None) => {
                    tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(tx_hash = %tx_hash, error = %e, "Receipt poll failed");
                    continue;
                }
            };

            if !receipt.success {
                return ConfirmationStatus::Reverted {
                    block_number: receipt.block_number,
                };
            }

            let Some(tx_block) = receipt.block_number else {
                continue;
            };

            if confirmations <= 1 {
                return ConfirmationStatus::Confirmed { block_number: tx_block };
            }

            let current_block = match client.block_number().await {
                Ok(b) => b,
                Err(e) => {
                    tracing::warn!(error = %e, "Block number poll failed");
                    continue;
                }
            };
            let depth = current_block.saturating_sub(tx_block) + 1;

            if depth >= confirmations {
                return ConfirmationStatus::Confirmed { block_number: tx_block };
            }

            tracing::debug!(
                tx_hash = %tx_hash,
                depth = depth,
                required = confirmations,
                "Waiting for confirmations"
            );
        }
    })
    .await;

    result.unwrap_or(ConfirmationStatus::TimedOut {
        waited_secs: started.elapsed().as_secs(),
    })
}
