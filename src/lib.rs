//! Bid relay library.
//!
//! Resolves a caller identifier to one of a fixed set of signing accounts and
//! submits a payable `bid()` call to a configured auction contract.

pub mod accounts;
pub mod bidding;
pub mod blockchain;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use bidding::{BidError, BidRequest, BidService, SubmittedTransaction};
pub use config::RelayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
