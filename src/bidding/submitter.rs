//! Bid construction, broadcast and confirmation.
//!
//! # Responsibilities
//! - Validate the amount before any network call
//! - Assign the nonce and broadcast under the account's sequence lock
//! - Wait for the receipt outside the lock, bounded by the configured timeout
//! - Classify every failure into a [`BidError`]

use alloy::primitives::{Address, TxHash, U256};
use std::sync::Arc;
use std::time::Duration;

use crate::accounts::Account;
use crate::bidding::error::{BidError, RejectionKind};
use crate::bidding::types::{BidAmount, BidLifecycle, BidState, SubmittedTransaction};
use crate::blockchain::client::ChainClient;
use crate::blockchain::transaction::{adjust_gas_price, sign_bid, wait_for_confirmation, BidTxParams};
use crate::blockchain::types::ConfirmationStatus;
use crate::config::{BiddingConfig, ConfigError, NetworkConfig, ValidationError};

/// Immutable transaction policy injected at startup.
#[derive(Debug, Clone)]
pub struct SubmitterSettings {
    pub contract: Address,
    pub chain_id: u64,
    pub gas_limit: u64,
    pub confirmations: u64,
    pub poll_interval: Duration,
    pub confirmation_timeout: Duration,
    pub gas_price_multiplier: f64,
    pub max_gas_price_gwei: u64,
}

impl SubmitterSettings {
    pub fn from_config(network: &NetworkConfig, bidding: &BiddingConfig) -> Result<Self, ConfigError> {
        let contract = bidding.contract_address.parse::<Address>().map_err(|e| {
            ConfigError::Validation(vec![ValidationError::Invalid {
                field: "bidding.contract_address",
                reason: e.to_string(),
            }])
        })?;

        Ok(Self {
            contract,
            chain_id: network.chain_id,
            gas_limit: bidding.gas_limit,
            confirmations: bidding.confirmations,
            poll_interval: Duration::from_millis(bidding.poll_interval_ms),
            confirmation_timeout: Duration::from_secs(bidding.confirmation_timeout_secs),
            gas_price_multiplier: bidding.gas_price_multiplier,
            max_gas_price_gwei: bidding.max_gas_price_gwei,
        })
    }
}

/// Submits `bid()` transactions for resolved accounts.
#[derive(Clone)]
pub struct BidSubmitter {
    client: Arc<dyn ChainClient>,
    settings: SubmitterSettings,
}

impl BidSubmitter {
    pub fn new(client: Arc<dyn ChainClient>, settings: SubmitterSettings) -> Self {
        Self { client, settings }
    }

    pub fn settings(&self) -> &SubmitterSettings {
        &self.settings
    }

    /// Submit a bid from `account` and wait for it to be accepted.
    pub async fn submit_bid(
        &self,
        account: &Account,
        amount: &BidAmount,
    ) -> Result<SubmittedTransaction, BidError> {
        let mut lifecycle = BidLifecycle::resolved();
        self.submit_tracked(account, amount, &mut lifecycle).await
    }

    /// [`submit_bid`](Self::submit_bid), recording progress in `lifecycle`.
    pub async fn submit_tracked(
        &self,
        account: &Account,
        amount: &BidAmount,
        lifecycle: &mut BidLifecycle,
    ) -> Result<SubmittedTransaction, BidError> {
        let result = self.run(account, amount, lifecycle).await;
        if let Err(e) = &result {
            lifecycle.fail(e);
        }
        result
    }

    async fn run(
        &self,
        account: &Account,
        amount: &BidAmount,
        lifecycle: &mut BidLifecycle,
    ) -> Result<SubmittedTransaction, BidError> {
        let value = amount.to_wei()?;

        let (tx_hash, nonce) = self.broadcast(account, value, lifecycle).await?;

        let status = wait_for_confirmation(
            self.client.as_ref(),
            tx_hash,
            self.settings.confirmations,
            self.settings.poll_interval,
            self.settings.confirmation_timeout,
        )
        .await;

        match status {
            ConfirmationStatus::Confirmed { block_number } => {
                lifecycle.advance(BidState::Confirmed);
                Ok(SubmittedTransaction {
                    tx_hash,
                    confirmed: true,
                    account: account.address(),
                    nonce,
                    block_number,
                })
            }
            ConfirmationStatus::Reverted { block_number } => Err(BidError::SubmissionRejected {
                reason: match block_number {
                    Some(b) => format!("execution reverted in block {}", b),
                    None => "execution reverted".to_string(),
                },
                kind: RejectionKind::Reverted,
                tx_hash: Some(tx_hash),
            }),
            ConfirmationStatus::TimedOut { waited_secs } => {
                Err(BidError::ConfirmationTimeout { tx_hash, waited_secs })
            }
        }
    }

    /// Assign a nonce, sign and broadcast while holding the account's sequence lock.
    async fn broadcast(
        &self,
        account: &Account,
        value: U256,
        lifecycle: &mut BidLifecycle,
    ) -> Result<(TxHash, u64), BidError> {
        let mut sequence = account.lock_sequence().await;

        let nonce = match sequence.cached() {
            Some(n) => n,
            None => self.client.pending_nonce(account.address()).await?,
        };

        let gas_price = adjust_gas_price(
            self.client.gas_price().await?,
            self.settings.gas_price_multiplier,
            self.settings.max_gas_price_gwei,
        )?;

        let params = BidTxParams {
            from: account.address(),
            contract: self.settings.contract,
            value,
            nonce,
            gas_limit: self.settings.gas_limit,
            gas_price,
            chain_id: self.settings.chain_id,
        };
        let signed = sign_bid(&params, account.wallet()).await?;
        lifecycle.advance(BidState::Constructed);

        let tx_hash = match self.client.send_raw_transaction(&signed.raw).await {
            Ok(tx_hash) => {
                if tx_hash != signed.tx_hash {
                    tracing::warn!(
                        expected = %signed.tx_hash,
                        reported = %tx_hash,
                        "Node reported a different transaction hash"
                    );
                }
                tx_hash
            }
            Err(e) if e.may_have_propagated() => {
                // Signed bytes may already be in a mempool.
                tracing::warn!(
                    tx_hash = %signed.tx_hash,
                    error = %e,
                    "Broadcast outcome unknown, waiting for receipt"
                );
                signed.tx_hash
            }
            Err(e) => {
                // The node's view of the nonce may differ from ours; re-read next time.
                sequence.invalidate();
                return Err(e.into());
            }
        };

        sequence.advance_past(nonce);
        lifecycle.advance(BidState::Submitted);
        tracing::info!(
            tx_hash = %tx_hash,
            account = %account.address(),
            nonce = nonce,
            value = %value,
            "Bid broadcast"
        );
        Ok((tx_hash, nonce))
    }
}

impl std::fmt::Debug for BidSubmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BidSubmitter")
            .field("endpoint", &self.client.endpoint())
            .field("settings", &self.settings)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::mock::MockChain;
    use crate::blockchain::transaction::bid_calldata;
    use crate::blockchain::types::{BlockchainError, BlockchainResult, ChainId, ReceiptSummary};
    use async_trait::async_trait;

    /// Forwards every broadcast to the chain, then reports `error` to the caller.
    struct LostBroadcastResponse {
        inner: Arc<MockChain>,
        error: fn() -> BlockchainError,
    }

    #[async_trait]
    impl ChainClient for LostBroadcastResponse {
        async fn chain_id(&self) -> BlockchainResult<ChainId> {
            self.inner.chain_id().await
        }

        async fn block_number(&self) -> BlockchainResult<u64> {
            self.inner.block_number().await
        }

        async fn pending_nonce(&self, address: Address) -> BlockchainResult<u64> {
            self.inner.pending_nonce(address).await
        }

        async fn gas_price(&self) -> BlockchainResult<u128> {
            self.inner.gas_price().await
        }

        async fn send_raw_transaction(&self, raw: &[u8]) -> BlockchainResult<TxHash> {
            self.inner.send_raw_transaction(raw).await?;
            Err((self.error)())
        }

        async fn transaction_receipt(
            &self,
            tx_hash: TxHash,
        ) -> BlockchainResult<Option<ReceiptSummary>> {
            self.inner.transaction_receipt(tx_hash).await
        }

        fn endpoint(&self) -> &str {
            "lost-response"
        }
    }

    const KEY_1: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const CHAIN_ID: u64 = 31337;

    fn settings() -> SubmitterSettings {
        SubmitterSettings {
            contract: "0x1d370423be52f9424b11163162F78f2e912C4907".parse().unwrap(),
            chain_id: CHAIN_ID,
            gas_limit: 1_000_000,
            confirmations: 1,
            poll_interval: Duration::from_millis(10),
            confirmation_timeout: Duration::from_millis(300),
            gas_price_multiplier: 1.0,
            max_gas_price_gwei: 500,
        }
    }

    fn setup() -> (Arc<MockChain>, BidSubmitter, Account) {
        let chain = Arc::new(MockChain::new(CHAIN_ID));
        let account = Account::from_private_key("1", KEY_1).unwrap();
        chain.fund(account.address(), U256::from(10u64).pow(U256::from(21u64)));
        let submitter = BidSubmitter::new(chain.clone(), settings());
        (chain, submitter, account)
    }

    #[tokio::test]
    async fn test_submit_bid_confirms() {
        let (chain, submitter, account) = setup();
        let amount = BidAmount::from(500_000_000_000_000_000u64);

        let tx = submitter.submit_bid(&account, &amount).await.unwrap();

        assert!(tx.confirmed);
        assert_eq!(tx.nonce, 0);
        assert_eq!(tx.account, account.address());

        let sent = chain.transactions();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].hash, tx.tx_hash);
        assert_eq!(sent[0].to, Some(settings().contract));
        assert_eq!(sent[0].value, U256::from(500_000_000_000_000_000u64));
        assert_eq!(sent[0].gas_limit, 1_000_000);
        assert_eq!(sent[0].input, bid_calldata());
    }

    #[tokio::test]
    async fn test_negative_amount_never_touches_network() {
        let (chain, submitter, account) = setup();
        let mut lifecycle = BidLifecycle::resolved();

        let err = submitter
            .submit_tracked(&account, &BidAmount::from(-1i64), &mut lifecycle)
            .await
            .unwrap_err();

        assert!(matches!(err, BidError::InvalidAmount(_)));
        assert_eq!(lifecycle.state(), BidState::Rejected);
        assert_eq!(chain.rpc_calls(), 0);
    }

    #[tokio::test]
    async fn test_sequential_bids_use_cached_nonce() {
        let (chain, submitter, account) = setup();
        for expected in 0..3 {
            let tx = submitter.submit_bid(&account, &BidAmount::from(1u64)).await.unwrap();
            assert_eq!(tx.nonce, expected);
        }
        assert_eq!(chain.nonce_of(account.address()), 3);
    }

    #[tokio::test]
    async fn test_insufficient_balance_is_rejected_with_reason() {
        let chain = Arc::new(MockChain::new(CHAIN_ID));
        let account = Account::from_private_key("1", KEY_1).unwrap();
        let submitter = BidSubmitter::new(chain.clone(), settings());

        let err = submitter.submit_bid(&account, &BidAmount::from(1u64)).await.unwrap_err();

        match err {
            BidError::SubmissionRejected { reason, kind, tx_hash } => {
                assert!(reason.contains("insufficient funds"));
                assert_eq!(kind, RejectionKind::Permanent);
                assert_eq!(tx_hash, None);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(chain.broadcast_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_receipt_times_out() {
        let (chain, submitter, account) = setup();
        chain.set_withhold_receipts(true);
        let mut lifecycle = BidLifecycle::resolved();

        let err = submitter
            .submit_tracked(&account, &BidAmount::from(1u64), &mut lifecycle)
            .await
            .unwrap_err();

        match err {
            BidError::ConfirmationTimeout { tx_hash, .. } => {
                assert_eq!(chain.transactions()[0].hash, tx_hash);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(lifecycle.state(), BidState::TimedOut);
    }

    #[tokio::test]
    async fn test_revert_carries_hash() {
        let (chain, submitter, account) = setup();
        chain.set_revert_bids(true);

        let err = submitter.submit_bid(&account, &BidAmount::from(1u64)).await.unwrap_err();
        assert!(matches!(
            err,
            BidError::SubmissionRejected { kind: RejectionKind::Reverted, tx_hash: Some(_), .. }
        ));
    }

    #[tokio::test]
    async fn test_gas_price_ceiling_blocks_broadcast() {
        let chain = Arc::new(MockChain::new(CHAIN_ID).with_gas_price(900_000_000_000));
        let account = Account::from_private_key("1", KEY_1).unwrap();
        let submitter = BidSubmitter::new(chain.clone(), settings());

        let err = submitter.submit_bid(&account, &BidAmount::from(1u64)).await.unwrap_err();
        assert!(matches!(
            err,
            BidError::SubmissionRejected { kind: RejectionKind::Transient, .. }
        ));
        assert_eq!(chain.broadcast_count(), 0);
    }

    #[tokio::test]
    async fn test_rejection_resyncs_nonce() {
        let (chain, submitter, account) = setup();
        submitter.submit_bid(&account, &BidAmount::from(1u64)).await.unwrap();

        // Local cache drifts ahead of the chain.
        {
            let mut seq = account.lock_sequence().await;
            seq.advance_past(5);
        }
        let err = submitter.submit_bid(&account, &BidAmount::from(1u64)).await.unwrap_err();
        assert!(err.to_string().contains("nonce too high"));

        let tx = submitter.submit_bid(&account, &BidAmount::from(1u64)).await.unwrap();
        assert_eq!(tx.nonce, chain.nonce_of(account.address()) - 1);
    }

    #[test]
    fn test_settings_reject_bad_contract() {
        let mut bidding = BiddingConfig::default();
        bidding.contract_address = "nope".to_string();
        assert!(SubmitterSettings::from_config(&NetworkConfig::default(), &bidding).is_err());
    }

    #[tokio::test]
    async fn test_lost_broadcast_response_is_tracked_not_rejected() {
        let chain = Arc::new(MockChain::new(CHAIN_ID));
        let account = Account::from_private_key("1", KEY_1).unwrap();
        chain.fund(account.address(), U256::from(10u64).pow(U256::from(21u64)));
        let client = LostBroadcastResponse {
            inner: chain.clone(),
            error: || BlockchainError::Rpc("All providers failed to broadcast transaction".into()),
        };
        let submitter = BidSubmitter::new(Arc::new(client), settings());

        let tx = submitter.submit_bid(&account, &BidAmount::from(1u64)).await.unwrap();
        assert!(tx.confirmed);
        assert_eq!(tx.tx_hash, chain.transactions()[0].hash);

        // The nonce was consumed, so the next bid moves on instead of colliding.
        let tx = submitter.submit_bid(&account, &BidAmount::from(1u64)).await.unwrap();
        assert_eq!(tx.nonce, 1);
        assert_eq!(chain.broadcast_count(), 2);
    }

    #[tokio::test]
    async fn test_already_known_without_receipt_times_out_with_hash() {
        let chain = Arc::new(MockChain::new(CHAIN_ID));
        chain.set_withhold_receipts(true);
        let account = Account::from_private_key("1", KEY_1).unwrap();
        chain.fund(account.address(), U256::from(10u64).pow(U256::from(21u64)));
        let client = LostBroadcastResponse {
            inner: chain.clone(),
            error: || BlockchainError::Rejected {
                code: -32000,
                message: "already known".into(),
            },
        };
        let submitter = BidSubmitter::new(Arc::new(client), settings());
        let mut lifecycle = BidLifecycle::resolved();

        let err = submitter
            .submit_tracked(&account, &BidAmount::from(1u64), &mut lifecycle)
            .await
            .unwrap_err();

        match err {
            BidError::ConfirmationTimeout { tx_hash, .. } => {
                assert_eq!(tx_hash, chain.transactions()[0].hash);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(lifecycle.state(), BidState::TimedOut);
    }

    #[tokio::test]
    async fn test_confirmation_depth_waits_for_blocks() {
        let (chain, _, account) = setup();
        let submitter = BidSubmitter::new(
            chain.clone(),
            SubmitterSettings {
                confirmations: 3,
                ..settings()
            },
        );

        // Included in block 1, but no further blocks arrive.
        let err = submitter.submit_bid(&account, &BidAmount::from(1u64)).await.unwrap_err();
        assert!(matches!(err, BidError::ConfirmationTimeout { .. }));

        let miner = {
            let chain = chain.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                chain.mine_blocks(2);
            })
        };
        let tx = submitter.submit_bid(&account, &BidAmount::from(1u64)).await.unwrap();
        miner.await.unwrap();

        assert!(tx.confirmed);
        assert_eq!(tx.nonce, 1);
        assert_eq!(tx.block_number, 2);
    }
}
