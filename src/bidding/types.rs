//! Bid request, result and lifecycle types.

use alloy::primitives::{Address, TxHash, U256};
use serde::{Deserialize, Serialize};

use crate::bidding::error::BidError;

/// Bid amount in wei as sent by the caller.
///
/// Accepts a JSON integer of any size up to `U256::MAX`, or a decimal (or
/// 0x-hex) string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BidAmount {
    Number(serde_json::Number),
    Text(String),
}

impl BidAmount {
    /// Validate and convert to a transaction value.
    pub fn to_wei(&self) -> Result<U256, BidError> {
        match self {
            BidAmount::Number(n) => {
                // Parsed with arbitrary precision: this is the caller's literal text.
                let text = n.to_string();
                if text.starts_with('-') {
                    return Err(BidError::InvalidAmount(format!("{} is negative", text)));
                }
                if text.contains(['.', 'e', 'E']) {
                    return Err(BidError::InvalidAmount(format!(
                        "{} is not an integer number of wei",
                        text
                    )));
                }
                U256::from_str_radix(&text, 10)
                    .map_err(|e| BidError::InvalidAmount(format!("{}: {}", text, e)))
            }
            BidAmount::Text(s) => {
                let s = s.trim();
                if s.is_empty() {
                    return Err(BidError::InvalidAmount("empty amount".to_string()));
                }
                if s.starts_with('-') {
                    return Err(BidError::InvalidAmount(format!("{} is negative", s)));
                }
                s.parse::<U256>()
                    .map_err(|e| BidError::InvalidAmount(format!("'{}': {}", s, e)))
            }
        }
    }
}

impl From<u64> for BidAmount {
    fn from(v: u64) -> Self {
        BidAmount::Number(v.into())
    }
}

impl From<i64> for BidAmount {
    fn from(v: i64) -> Self {
        BidAmount::Number(v.into())
    }
}

/// The caller's intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidRequest {
    /// Selects the signing account.
    #[serde(alias = "userNumber")]
    pub identifier: String,
    /// Bid value in wei.
    pub amount: BidAmount,
}

impl BidRequest {
    pub fn new(identifier: impl Into<String>, amount: impl Into<BidAmount>) -> Self {
        Self {
            identifier: identifier.into(),
            amount: amount.into(),
        }
    }
}

/// A bid the network accepted into a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedTransaction {
    pub tx_hash: TxHash,
    pub confirmed: bool,
    /// Address that signed the bid.
    pub account: Address,
    pub nonce: u64,
    pub block_number: u64,
}

/// Where a single bid is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BidState {
    Received,
    Resolved,
    Constructed,
    Submitted,
    Confirmed,
    Rejected,
    TimedOut,
}

impl BidState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BidState::Confirmed | BidState::Rejected | BidState::TimedOut)
    }

    /// Forward-only transitions; terminal states go nowhere.
    pub fn can_advance_to(&self, next: BidState) -> bool {
        use BidState::*;
        matches!(
            (self, next),
            (Received, Resolved)
                | (Received, Rejected)
                | (Resolved, Constructed)
                | (Resolved, Rejected)
                | (Constructed, Submitted)
                | (Constructed, Rejected)
                | (Submitted, Confirmed)
                | (Submitted, Rejected)
                | (Submitted, TimedOut)
        )
    }
}

/// Tracks one bid through [`BidState`].
#[derive(Debug)]
pub struct BidLifecycle {
    state: BidState,
}

impl BidLifecycle {
    pub fn new() -> Self {
        Self {
            state: BidState::Received,
        }
    }

    /// Lifecycle for a bid whose account is already resolved.
    pub fn resolved() -> Self {
        Self {
            state: BidState::Resolved,
        }
    }

    pub fn state(&self) -> BidState {
        self.state
    }

    /// Move to `next`. Returns false (and stays put) on an illegal transition.
    pub fn advance(&mut self, next: BidState) -> bool {
        if !self.state.can_advance_to(next) {
            tracing::warn!(from = ?self.state, to = ?next, "Ignoring illegal bid state transition");
            return false;
        }
        tracing::debug!(from = ?self.state, to = ?next, "Bid state");
        self.state = next;
        true
    }

    /// Move to the terminal state matching `err`.
    pub fn fail(&mut self, err: &BidError) -> bool {
        match err {
            BidError::ConfirmationTimeout { .. } => self.advance(BidState::TimedOut),
            _ => self.advance(BidState::Rejected),
        }
    }
}

impl Default for BidLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_from_json_number() {
        let req: BidRequest =
            serde_json::from_str(r#"{"identifier":"1","amount":500000000000000000}"#).unwrap();
        assert_eq!(
            req.amount.to_wei().unwrap(),
            U256::from(500_000_000_000_000_000u64)
        );
    }

    #[test]
    fn test_amount_from_string() {
        let amount = BidAmount::Text("1000000000000000000000000".to_string());
        assert_eq!(
            amount.to_wei().unwrap(),
            U256::from(10u64).pow(U256::from(24u64))
        );
        assert_eq!(BidAmount::Text("0".into()).to_wei().unwrap(), U256::ZERO);
    }

    #[test]
    fn test_invalid_amounts() {
        let cases = [
            BidAmount::from(-1i64),
            BidAmount::Number(serde_json::Number::from_f64(1.5).unwrap()),
            BidAmount::Text("-1".into()),
            BidAmount::Text("".into()),
            BidAmount::Text("12abc".into()),
            // 2^256
            BidAmount::Text(
                "115792089237316195423570985008687907853269984665640564039457584007913129639936"
                    .into(),
            ),
        ];
        for amount in cases {
            assert!(
                matches!(amount.to_wei(), Err(BidError::InvalidAmount(_))),
                "{:?} should be invalid",
                amount
            );
        }
    }

    #[test]
    fn test_amount_beyond_u64_as_json_number() {
        let req: BidRequest =
            serde_json::from_str(r#"{"identifier":"1","amount":20000000000000000000}"#).unwrap();
        assert_eq!(
            req.amount.to_wei().unwrap(),
            U256::from(20u64) * U256::from(10u64).pow(U256::from(18u64))
        );

        let req: BidRequest =
            serde_json::from_str(r#"{"identifier":"1","amount":2e19}"#).unwrap();
        assert!(matches!(req.amount.to_wei(), Err(BidError::InvalidAmount(_))));
    }

    #[test]
    fn test_user_number_alias() {
        let req: BidRequest =
            serde_json::from_str(r#"{"userNumber":"2","amount":"42"}"#).unwrap();
        assert_eq!(req, BidRequest::new("2", BidAmount::Text("42".into())));
    }

    #[test]
    fn test_submitted_transaction_serializes_hex_hash() {
        let tx = SubmittedTransaction {
            tx_hash: TxHash::repeat_byte(0xab),
            confirmed: true,
            account: Address::ZERO,
            nonce: 3,
            block_number: 10,
        };
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["tx_hash"], format!("0x{}", "ab".repeat(32)));
        assert_eq!(json["confirmed"], true);
    }

    #[test]
    fn test_lifecycle_happy_path() {
        let mut lifecycle = BidLifecycle::new();
        for next in [
            BidState::Resolved,
            BidState::Constructed,
            BidState::Submitted,
            BidState::Confirmed,
        ] {
            assert!(lifecycle.advance(next));
        }
        assert!(lifecycle.state().is_terminal());
    }

    #[test]
    fn test_lifecycle_never_reenters() {
        let mut lifecycle = BidLifecycle::new();
        assert!(lifecycle.advance(BidState::Resolved));
        assert!(!lifecycle.advance(BidState::Received));
        assert!(lifecycle.fail(&BidError::InvalidAmount("-1".into())));
        assert_eq!(lifecycle.state(), BidState::Rejected);
        assert!(!lifecycle.advance(BidState::Constructed));
        assert_eq!(lifecycle.state(), BidState::Rejected);
    }

    #[test]
    fn test_timeout_only_after_submission() {
        let timeout = BidError::ConfirmationTimeout {
            tx_hash: TxHash::ZERO,
            waited_secs: 1,
        };
        let mut lifecycle = BidLifecycle::resolved();
        assert!(!lifecycle.fail(&timeout));

        lifecycle.advance(BidState::Constructed);
        lifecycle.advance(BidState::Submitted);
        assert!(lifecycle.fail(&timeout));
        assert_eq!(lifecycle.state(), BidState::TimedOut);
    }
}
