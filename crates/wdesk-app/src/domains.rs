//! Command channels to dependent domains
//!
//! Namespace, mosaic and transaction history caches live outside the session
//! core. The session tells them when the signer changes and when their data
//! is stale; it never waits for them. Delivery is fire-and-forget: a full or
//! closed channel drops the command with a warning.

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, warn};
use wdesk_core::Address;

use crate::config::DomainSettings;

/// A dependent domain fed by the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomainKind {
    Namespace,
    Mosaic,
    Transactions,
}

impl fmt::Display for DomainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DomainKind::Namespace => "namespace",
            DomainKind::Mosaic => "mosaic",
            DomainKind::Transactions => "transactions",
        };
        f.write_str(name)
    }
}

/// Instruction sent to a dependent domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainCommand {
    /// Drop everything cached for the previous identity
    Reset,
    /// The acting signer is now `signer`
    SignerChanged { signer: Address },
    /// Reload data owned by `address`
    Load { address: Address },
}

/// Sending halves held by the session
#[derive(Debug, Clone)]
pub struct DomainChannels {
    namespace: mpsc::Sender<DomainCommand>,
    mosaic: mpsc::Sender<DomainCommand>,
    transactions: mpsc::Sender<DomainCommand>,
}

/// Receiving halves handed to the domain implementations
#[derive(Debug)]
pub struct DomainReceivers {
    pub namespace: mpsc::Receiver<DomainCommand>,
    pub mosaic: mpsc::Receiver<DomainCommand>,
    pub transactions: mpsc::Receiver<DomainCommand>,
}

impl DomainChannels {
    /// Create one bounded channel per domain
    pub fn channel(capacity: usize) -> (Self, DomainReceivers) {
        let capacity = capacity.max(1);
        let (namespace, namespace_rx) = mpsc::channel(capacity);
        let (mosaic, mosaic_rx) = mpsc::channel(capacity);
        let (transactions, transactions_rx) = mpsc::channel(capacity);
        (
            Self {
                namespace,
                mosaic,
                transactions,
            },
            DomainReceivers {
                namespace: namespace_rx,
                mosaic: mosaic_rx,
                transactions: transactions_rx,
            },
        )
    }

    /// Channels sized from the `[domains]` settings
    pub fn from_settings(settings: &DomainSettings) -> (Self, DomainReceivers) {
        Self::channel(settings.command_buffer)
    }

    pub fn send(&self, kind: DomainKind, command: DomainCommand) {
        let tx = match kind {
            DomainKind::Namespace => &self.namespace,
            DomainKind::Mosaic => &self.mosaic,
            DomainKind::Transactions => &self.transactions,
        };
        debug!("{} domain <- {:?}", kind, command);
        if let Err(err) = tx.try_send(command) {
            warn!("{} domain channel full or closed, dropping command: {}", kind, err);
        }
    }

    /// Send the same command to every domain
    pub fn broadcast(&self, command: DomainCommand) {
        for kind in [
            DomainKind::Namespace,
            DomainKind::Mosaic,
            DomainKind::Transactions,
        ] {
            self.send(kind, command.clone());
        }
    }
}
