//! Bid submission subsystem.
//!
//! # Data Flow
//! ```text
//! BidRequest { identifier, amount }
//!     → service.rs (resolve identifier via accounts::AccountResolver)
//!     → submitter.rs (validate amount, sequence lock, sign, broadcast)
//!     → blockchain::transaction (receipt polling with deadline)
//!     → SubmittedTransaction | BidError
//! ```
//!
//! # Lifecycle
//! `Received → Resolved → Constructed → Submitted → {Confirmed | Rejected | TimedOut}`.
//! No automatic retries; a retry is a new request.

pub mod error;
pub mod service;
pub mod submitter;
pub mod types;

pub use error::{BidError, RejectionKind};
pub use service::BidService;
pub use submitter::{BidSubmitter, SubmitterSettings};
pub use types::{BidAmount, BidLifecycle, BidRequest, BidState, SubmittedTransaction};
