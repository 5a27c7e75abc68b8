//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validated config → Load accounts → Connect RPC → Assemble service
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain in-flight bids → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{build_runtime, Runtime, StartupError};
