//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, request ID)
//!     → bid.rs (JSON → BidRequest → BidService → status + JSON)
//!     → health.rs (RPC reachability)
//! ```
//!
//! # Status Mapping
//! - `unknown_identifier` → 404
//! - `invalid_amount` → 400
//! - `submission_rejected` → 502
//! - `confirmation_timeout` → 504

pub mod bid;
pub mod health;
pub mod server;

pub use server::{AppState, HttpServer};
