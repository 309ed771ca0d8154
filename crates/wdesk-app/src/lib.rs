//! wdesk-app - Session state and orchestration for Wallet Desk
//!
//! This crate implements the account/session core: a TEA-style state store
//! with pure reducers, signer resolution, the subscription registry, the
//! broadcast orchestrator, and the session controller that drives the
//! dependent domains. Configuration loading lives here too.

pub mod broadcast;
pub mod config;
pub mod domains;
pub mod handler;
pub mod message;
pub mod profile;
pub mod session;
pub mod session_event;
pub mod signers;
pub mod state;
pub mod store;
pub mod subscriptions;

// Re-export primary types
pub use broadcast::{BroadcastResult, BroadcastSubject, Broadcaster};
pub use config::Settings;
pub use domains::{DomainChannels, DomainCommand, DomainKind, DomainReceivers};
pub use handler::{update, UpdateResult};
pub use message::Mutation;
pub use profile::{ProfileStore, StaticProfile};
pub use session::SessionController;
pub use session_event::SessionEvent;
pub use signers::{known_addresses, resolve_signers};
pub use state::{Lifecycle, SessionState};
pub use store::Store;
pub use subscriptions::{SubscriptionEntry, SubscriptionRegistry};
