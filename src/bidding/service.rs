//! The single core operation: resolve an identifier, then submit its bid.

use std::time::Instant;
use tracing::Instrument;

use crate::accounts::AccountResolver;
use crate::bidding::error::BidError;
use crate::bidding::submitter::BidSubmitter;
use crate::bidding::types::{BidLifecycle, BidRequest, BidState, SubmittedTransaction};
use crate::observability::metrics;

/// Resolver and submitter composed into one pipeline.
#[derive(Debug)]
pub struct BidService {
    resolver: AccountResolver,
    submitter: BidSubmitter,
}

impl BidService {
    pub fn new(resolver: AccountResolver, submitter: BidSubmitter) -> Self {
        Self { resolver, submitter }
    }

    pub fn resolver(&self) -> &AccountResolver {
        &self.resolver
    }

    pub fn submitter(&self) -> &BidSubmitter {
        &self.submitter
    }

    /// Place one bid. Every call ends in exactly one terminal outcome.
    pub async fn place_bid(&self, request: &BidRequest) -> Result<SubmittedTransaction, BidError> {
        let span = tracing::info_span!("bid", identifier = %request.identifier);
        self.place_bid_inner(request).instrument(span).await
    }

    async fn place_bid_inner(&self, request: &BidRequest) -> Result<SubmittedTransaction, BidError> {
        let started = Instant::now();
        let mut lifecycle = BidLifecycle::new();

        let result = match self.resolver.resolve(&request.identifier) {
            Ok(account) => {
                lifecycle.advance(BidState::Resolved);
                self.submitter
                    .submit_tracked(&account, &request.amount, &mut lifecycle)
                    .await
            }
            Err(e) => {
                lifecycle.fail(&e);
                Err(e)
            }
        };

        match &result {
            Ok(tx) => {
                tracing::info!(
                    tx_hash = %tx.tx_hash,
                    block_number = tx.block_number,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Bid confirmed"
                );
                metrics::record_bid("confirmed", started);
            }
            Err(e) if e.is_caller_error() => {
                tracing::info!(error = %e, "Bid refused");
                metrics::record_bid(e.kind(), started);
            }
            Err(e) => {
                tracing::warn!(error = %e, state = ?lifecycle.state(), "Bid failed");
                metrics::record_bid(e.kind(), started);
            }
        }

        result
    }
}
