//! Notification transport seam
//!
//! A transport opens one listener per address; each listener carries any
//! number of stream subscriptions, one per [`Channel`]. Every handle is
//! individually closable. Stream notifications are pushed into an mpsc sink
//! supplied by the subscriber.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use wdesk_core::prelude::*;
use wdesk_core::{Address, TransactionHash};

/// Notification channels a listener can subscribe to for an address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Confirmed,
    UnconfirmedAdded,
    UnconfirmedRemoved,
    AggregateBondedAdded,
    AggregateBondedRemoved,
    CosignatureAdded,
    Status,
}

impl Channel {
    /// Every channel, in the order the session subscribes them
    pub const ALL: [Channel; 7] = [
        Channel::Confirmed,
        Channel::UnconfirmedAdded,
        Channel::UnconfirmedRemoved,
        Channel::AggregateBondedAdded,
        Channel::AggregateBondedRemoved,
        Channel::CosignatureAdded,
        Channel::Status,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Confirmed => "confirmedAdded",
            Channel::UnconfirmedAdded => "unconfirmedAdded",
            Channel::UnconfirmedRemoved => "unconfirmedRemoved",
            Channel::AggregateBondedAdded => "partialAdded",
            Channel::AggregateBondedRemoved => "partialRemoved",
            Channel::CosignatureAdded => "cosignature",
            Channel::Status => "status",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One event delivered on a stream subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub channel: Channel,
    pub address: Address,
    /// Hash of the transaction the event refers to, when there is one
    pub hash: Option<TransactionHash>,
    /// Free-form detail, e.g. the status code on the status channel
    pub detail: Option<String>,
}

/// A network resource that must be released explicitly
#[trait_variant::make(Closable: Send)]
pub trait LocalClosable {
    async fn close(&mut self) -> Result<()>;
}

/// Push-based notification access to the ledger network
#[trait_variant::make(NotificationTransport: Send)]
pub trait LocalNotificationTransport {
    /// Handle for an open per-address listener
    type Listener: Closable + Send + 'static;
    /// Handle for one stream registered on a listener
    type Stream: Closable + Send + 'static;

    /// Open a listener for an address
    async fn open(&self, address: &Address) -> Result<Self::Listener>;

    /// Register a stream on an open listener; events go to `sink`
    async fn subscribe(
        &self,
        listener: &mut Self::Listener,
        channel: Channel,
        address: &Address,
        sink: mpsc::Sender<Notification>,
    ) -> Result<Self::Stream>;

    /// Resolve once `hash` is observed on `channel` for `address`
    ///
    /// Errors when the network reports a failure status for the hash.
    async fn await_event(
        &self,
        listener: &mut Self::Listener,
        channel: Channel,
        address: &Address,
        hash: &TransactionHash,
    ) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_channels_unique_names() {
        let mut names: Vec<_> = Channel::ALL.iter().map(|c| c.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Channel::ALL.len());
    }

    #[test]
    fn test_channel_display() {
        assert_eq!(Channel::AggregateBondedAdded.to_string(), "partialAdded");
    }
}
