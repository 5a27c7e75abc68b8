//! In-memory chain for tests and local dry runs.
//!
//! Decodes and signature-checks every raw transaction, enforces per-sender
//! nonces and balances the way a node's mempool does, and mines each accepted
//! transaction into its own block. Receipts can be withheld to exercise
//! confirmation timeouts.

use alloy::consensus::transaction::SignerRecoverable;
use alloy::consensus::{Transaction, TxEnvelope};
use alloy::eips::eip2718::Decodable2718;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::blockchain::client::ChainClient;
use crate::blockchain::types::{BlockchainError, BlockchainResult, ChainId, ReceiptSummary};

/// JSON-RPC error code geth uses for mempool rejections.
const REJECTION_CODE: i64 = -32000;

/// A transaction the mock chain accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockTransaction {
    pub hash: TxHash,
    pub from: Address,
    pub to: Option<Address>,
    pub value: U256,
    pub nonce: u64,
    pub gas_limit: u64,
    pub gas_price: u128,
    pub input: Bytes,
}

#[derive(Default)]
struct MockState {
    block_number: u64,
    nonces: HashMap<Address, u64>,
    balances: HashMap<Address, U256>,
    receipts: HashMap<TxHash, ReceiptSummary>,
    transactions: Vec<MockTransaction>,
}

/// In-memory [`ChainClient`].
pub struct MockChain {
    chain_id: u64,
    gas_price: u128,
    broadcast_delay: Duration,
    state: Mutex<MockState>,
    withhold_receipts: AtomicBool,
    revert_bids: AtomicBool,
    rpc_calls: AtomicUsize,
}

impl MockChain {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            gas_price: 1_000_000_000,
            broadcast_delay: Duration::ZERO,
            state: Mutex::new(MockState::default()),
            withhold_receipts: AtomicBool::new(false),
            revert_bids: AtomicBool::new(false),
            rpc_calls: AtomicUsize::new(0),
        }
    }

    /// Sleep this long inside every broadcast, before the nonce check.
    pub fn with_broadcast_delay(mut self, delay: Duration) -> Self {
        self.broadcast_delay = delay;
        self
    }

    pub fn with_gas_price(mut self, gas_price: u128) -> Self {
        self.gas_price = gas_price;
        self
    }

    pub fn fund(&self, address: Address, amount: U256) {
        self.lock().balances.insert(address, amount);
    }

    /// Accept broadcasts but never produce receipts for them.
    pub fn set_withhold_receipts(&self, withhold: bool) {
        self.withhold_receipts.store(withhold, Ordering::SeqCst);
    }

    /// Mine bids with a failed execution status.
    pub fn set_revert_bids(&self, revert: bool) {
        self.revert_bids.store(revert, Ordering::SeqCst);
    }

    pub fn mine_blocks(&self, count: u64) {
        self.lock().block_number += count;
    }

    pub fn transactions(&self) -> Vec<MockTransaction> {
        self.lock().transactions.clone()
    }

    pub fn broadcast_count(&self) -> usize {
        self.lock().transactions.len()
    }

    pub fn nonce_of(&self, address: Address) -> u64 {
        self.lock().nonces.get(&address).copied().unwrap_or(0)
    }

    pub fn balance_of(&self, address: Address) -> U256 {
        self.lock().balances.get(&address).copied().unwrap_or_default()
    }

    /// Total number of [`ChainClient`] calls served.
    pub fn rpc_calls(&self) -> usize {
        self.rpc_calls.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        // A panicking test thread must not hide the state from the others.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn touch(&self) {
        self.rpc_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn reject(message: impl Into<String>) -> BlockchainError {
        BlockchainError::Rejected {
            code: REJECTION_CODE,
            message: message.into(),
        }
    }

    fn accept(&self, envelope: TxEnvelope) -> BlockchainResult<TxHash> {
        let from = envelope
            .recover_signer()
            .map_err(|e| Self::reject(format!("invalid sender: {}", e)))?;

        if let Some(chain_id) = envelope.chain_id() {
            if chain_id != self.chain_id {
                return Err(Self::reject(format!("invalid chain id {}", chain_id)));
            }
        }

        let mut state = self.lock();
        let expected = state.nonces.get(&from).copied().unwrap_or(0);
        if envelope.nonce() < expected {
            return Err(Self::reject(format!(
                "nonce too low: next nonce {}, tx nonce {}",
                expected,
                envelope.nonce()
            )));
        }
        if envelope.nonce() > expected {
            return Err(Self::reject(format!(
                "nonce too high: next nonce {}, tx nonce {}",
                expected,
                envelope.nonce()
            )));
        }

        let gas_price = envelope.gas_price().unwrap_or(self.gas_price);
        let cost = envelope.value()
            + U256::from(envelope.gas_limit()) * U256::from(gas_price);
        let balance = state.balances.get(&from).copied().unwrap_or_default();
        if balance < cost {
            return Err(Self::reject(format!(
                "insufficient funds for gas * price + value: address {} have {} want {}",
                from, balance, cost
            )));
        }

        let hash = *envelope.tx_hash();
        state.balances.insert(from, balance - cost);
        state.nonces.insert(from, expected + 1);
        state.block_number += 1;
        let block_number = state.block_number;

        if !self.withhold_receipts.load(Ordering::SeqCst) {
            state.receipts.insert(
                hash,
                ReceiptSummary {
                    tx_hash: hash,
                    block_number: Some(block_number),
                    success: !self.revert_bids.load(Ordering::SeqCst),
                },
            );
        }

        state.transactions.push(MockTransaction {
            hash,
            from,
            to: envelope.to(),
            value: envelope.value(),
            nonce: envelope.nonce(),
            gas_limit: envelope.gas_limit(),
            gas_price,
            input: envelope.input().clone(),
        });

        Ok(hash)
    }
}

impl std::fmt::Debug for MockChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockChain")
            .field("chain_id", &self.chain_id)
            .field("rpc_calls", &self.rpc_calls())
            .finish()
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn chain_id(&self) -> BlockchainResult<ChainId> {
        self.touch();
        Ok(ChainId(self.chain_id))
    }

    async fn block_number(&self) -> BlockchainResult<u64> {
        self.touch();
        Ok(self.lock().block_number)
    }

    async fn pending_nonce(&self, address: Address) -> BlockchainResult<u64> {
        self.touch();
        Ok(self.nonce_of(address))
    }

    async fn gas_price(&self) -> BlockchainResult<u128> {
        self.touch();
        Ok(self.gas_price)
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> BlockchainResult<TxHash> {
        self.touch();
        if !self.broadcast_delay.is_zero() {
            tokio::time::sleep(self.broadcast_delay).await;
        }
        let envelope = TxEnvelope::decode_2718(&mut &raw[..])
            .map_err(|e| Self::reject(format!("rlp: {}", e)))?;
        self.accept(envelope)
    }

    async fn transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> BlockchainResult<Option<ReceiptSummary>> {
        self.touch();
        Ok(self.lock().receipts.get(&tx_hash).copied())
    }

    fn endpoint(&self) -> &str {
        "mock"
    }
}
