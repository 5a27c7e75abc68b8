//! Bid failure classification.

use alloy::primitives::TxHash;
use serde::Serialize;
use thiserror::Error;

use crate::blockchain::types::BlockchainError;

/// Why the network refused a bid, when it can be told from the node's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    /// May succeed if resubmitted later (sequence conflict, node unreachable before broadcast).
    Transient,
    /// Will keep failing until the account or request changes.
    Permanent,
    /// Mined, but contract execution reverted.
    Reverted,
    /// The node's message did not match a known pattern.
    Unclassified,
}

impl RejectionKind {
    /// Classify a node error message (geth-style wording).
    pub fn classify(message: &str) -> Self {
        let msg = message.to_ascii_lowercase();
        const TRANSIENT: &[&str] = &[
            "nonce too low",
            "nonce too high",
            "replacement transaction underpriced",
            "txpool is full",
            "transaction underpriced",
        ];
        const PERMANENT: &[&str] = &[
            "insufficient funds",
            "intrinsic gas too low",
            "exceeds block gas limit",
            "gas limit reached",
            "invalid sender",
            "invalid chain id",
        ];

        if msg.contains("revert") {
            RejectionKind::Reverted
        } else if TRANSIENT.iter().any(|p| msg.contains(p)) {
            RejectionKind::Transient
        } else if PERMANENT.iter().any(|p| msg.contains(p)) {
            RejectionKind::Permanent
        } else {
            RejectionKind::Unclassified
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionKind::Transient => "transient",
            RejectionKind::Permanent => "permanent",
            RejectionKind::Reverted => "reverted",
            RejectionKind::Unclassified => "unclassified",
        }
    }
}

impl std::fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request-time bid failures. Every variant is terminal for its request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BidError {
    /// Identifier is not in the configured account table.
    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),

    /// Amount is negative, fractional, or outside the 256-bit value range.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// The network refused the transaction, or it reverted on-chain.
    #[error("submission rejected ({kind}): {reason}")]
    SubmissionRejected {
        reason: String,
        kind: RejectionKind,
        /// Set when the transaction was mined (reverted).
        tx_hash: Option<TxHash>,
    },

    /// Broadcast succeeded but no receipt arrived in time. The bid may still land.
    #[error("transaction {tx_hash} not confirmed within {waited_secs}s")]
    ConfirmationTimeout { tx_hash: TxHash, waited_secs: u64 },
}

impl BidError {
    /// Stable machine-readable name of the classification.
    pub fn kind(&self) -> &'static str {
        match self {
            BidError::UnknownIdentifier(_) => "unknown_identifier",
            BidError::InvalidAmount(_) => "invalid_amount",
            BidError::SubmissionRejected { .. } => "submission_rejected",
            BidError::ConfirmationTimeout { .. } => "confirmation_timeout",
        }
    }

    /// True when the caller can fix the request; nothing touched the network.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, BidError::UnknownIdentifier(_) | BidError::InvalidAmount(_))
    }

    pub(crate) fn rejected(reason: impl Into<String>, kind: RejectionKind) -> Self {
        BidError::SubmissionRejected {
            reason: reason.into(),
            kind,
            tx_hash: None,
        }
    }
}

/// Failures before a transaction was accepted by the node.
impl From<BlockchainError> for BidError {
    fn from(err: BlockchainError) -> Self {
        match err {
            BlockchainError::Rejected { message, .. } => {
                let kind = RejectionKind::classify(&message);
                BidError::rejected(message, kind)
            }
            e @ (BlockchainError::Rpc(_) | BlockchainError::GasPriceTooHigh { .. }) => {
                BidError::rejected(e.to_string(), RejectionKind::Transient)
            }
            e @ (BlockchainError::Wallet(_) | BlockchainError::ChainMismatch { .. }) => {
                BidError::rejected(e.to_string(), RejectionKind::Permanent)
            }
        }
    }
}
