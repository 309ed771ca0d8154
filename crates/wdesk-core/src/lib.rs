//! # wdesk-core - Core Domain Types
//!
//! Foundation crate for Wallet Desk. Provides identity primitives, account
//! and transaction types, the multisig graph model, error handling and
//! logging setup.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, chrono, thiserror, regex, tracing).
//!
//! ## Public API
//!
//! ### Identity Primitives (`types`)
//! - [`Address`] - Validated raw account address
//! - [`PublicKey`] - Validated account public key
//! - [`TransactionHash`] - Content hash of a signed transaction
//! - [`NetworkType`] - Ledger network an identity lives on
//!
//! ### Accounts (`account`)
//! - [`Account`] - Locally known identity of the active profile
//! - [`Signer`] - Resolved acting identity (the account or a multisig it cosigns)
//! - [`AccountInfo`] - On-chain account state
//!
//! ### Multisig (`multisig`)
//! - [`MultisigGraph`] - Cosignatory relationships fetched from the network
//! - [`MultisigAccountInfo`] - One account's multisig configuration
//!
//! ### Transactions (`transaction`)
//! - [`Transaction`], [`SignedTransaction`], [`CosignatureSignedTransaction`]
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Error enum with `fatal` vs `recoverable` classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use wdesk_core::prelude::*;
//! ```

pub mod account;
pub mod error;
pub mod logging;
pub mod multisig;
pub mod transaction;
pub mod types;

/// Prelude for common imports used throughout all Wallet Desk crates
pub mod prelude {
    pub use super::error::{Error, Result, ResultExt};
    pub use tracing::{debug, error, info, instrument, trace, warn};
}

// Re-export commonly used types at crate root for convenience
pub use account::{Account, AccountInfo, MosaicBalance, Signer};
pub use error::{Error, Result, ResultExt};
pub use multisig::{MultisigAccountInfo, MultisigGraph};
pub use transaction::{CosignatureSignedTransaction, SignedTransaction, Transaction, TransactionKind};
pub use types::{Address, NetworkType, PublicKey, TransactionHash, SHORT_ADDRESS_LEN};
