//! # wdesk-ledger - Ledger Network Seams
//!
//! Collaborator interfaces the session core drives but does not implement:
//! the request/response ledger repository, the push-based notification
//! transport and the public-key-to-address codec. Concrete adapters live in
//! the SDK integration layer of the front-end.
//!
//! Depends on [`wdesk_core`] for domain types and error handling.
//!
//! ## Public API
//!
//! ### Repository
//! - [`LedgerRepository`] - Account info, multisig graph, announce endpoints
//!
//! ### Notification Transport
//! - [`NotificationTransport`] - Per-address listeners and stream subscriptions
//! - [`Closable`] - Explicitly released network handle
//! - [`Channel`], [`Notification`] - Stream channel names and delivered events
//!
//! ### Address Codec
//! - [`AddressCodec`] - Derive an address from a public key
//!
//! ### Test Helpers (feature `test-helpers`)
//! - `test_utils::FakeLedger`, `test_utils::FakeTransport`, `test_utils::PrefixCodec`

pub mod codec;
pub mod repository;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;
pub mod transport;

// Public API re-exports
pub use codec::AddressCodec;
pub use repository::{LedgerRepository, LocalLedgerRepository};
pub use transport::{
    Channel, Closable, LocalClosable, LocalNotificationTransport, Notification,
    NotificationTransport,
};
