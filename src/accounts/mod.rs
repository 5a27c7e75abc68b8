//! Account pool.
//!
//! # Data Flow
//! ```text
//! [[accounts]] config entries (identifier, env var name)
//!     → account.rs (key loading from environment, sequence lock)
//!     → resolver.rs (immutable identifier → Arc<Account> table)
//! ```

pub mod account;
pub mod resolver;

pub use account::{Account, SequenceState};
pub use resolver::AccountResolver;
