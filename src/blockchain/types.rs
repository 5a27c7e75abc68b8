//! Chain-specific types and error definitions.

use alloy::primitives::TxHash;
use thiserror::Error;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, Error)]
pub enum BlockchainError {
    /// RPC connection or transport failed; the node never answered.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// The node answered with a JSON-RPC error object.
    #[error("node rejected request (code {code}): {message}")]
    Rejected { code: i64, message: String },

    /// Invalid private key format or signing failure.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Gas price exceeded maximum allowed.
    #[error("Gas price {current_gwei} gwei exceeds maximum {max_gwei} gwei")]
    GasPriceTooHigh { current_gwei: u64, max_gwei: u64 },

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },
}

impl BlockchainError {
    /// Whether a failed broadcast may still have reached a mempool.
    ///
    /// True when no node answered, or when a node reports it already holds the
    /// transaction.
    pub fn may_have_propagated(&self) -> bool {
        match self {
            BlockchainError::Rpc(_) => true,
            BlockchainError::Rejected { message, .. } => {
                let msg = message.to_ascii_lowercase();
                msg.contains("already known") || msg.contains("known transaction")
            }
            _ => false,
        }
    }
}

/// Result type for blockchain operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// The parts of a transaction receipt the relay cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptSummary {
    pub tx_hash: TxHash,
    /// Block the transaction was included in.
    pub block_number: Option<u64>,
    /// `false` when execution reverted.
    pub success: bool,
}

/// Transaction confirmation status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationStatus {
    /// Transaction is included with the required block depth.
    Confirmed { block_number: u64 },
    /// Transaction was mined but execution reverted.
    Reverted { block_number: Option<u64> },
    /// No qualifying receipt within the wait window.
    TimedOut { waited_secs: u64 },
}
