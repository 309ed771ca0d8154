//! Wallet Desk Library
//!
//! Account and session state core for a ledger wallet front-end.
//!
//! The workspace is split into:
//! - [`core`] (`wdesk-core`) - domain types, errors, logging
//! - [`ledger`] (`wdesk-ledger`) - network collaborator seams
//! - [`app`] (`wdesk-app`) - session state, reducers and orchestration

pub use wdesk_app as app;
pub use wdesk_core as core;
pub use wdesk_ledger as ledger;

// Re-export main entry points
pub use wdesk_app::{BroadcastResult, SessionController, SessionEvent, SessionState, Settings};
pub use wdesk_core::{Error, Result};
