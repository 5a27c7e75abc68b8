//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment Variables (private keys) → accounts (signing)
//! RPC URL → client.rs (JSON-RPC with timeouts and failover)
//!     → transaction.rs (build, sign, confirm)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts

pub mod client;
pub mod mock;
pub mod transaction;
pub mod types;

pub use client::{ChainClient, RpcClient};
pub use mock::MockChain;
pub use types::{BlockchainError, ChainId, ConfirmationStatus, ReceiptSummary};
