//! Subscription registry
//!
//! Per-address bookkeeping of open notification handles. An entry set is one
//! listener plus the streams registered on it. Unsubscribing closes every
//! stream and then the listener, best effort, before the address is removed.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;

use wdesk_core::prelude::*;
use wdesk_core::Address;
use wdesk_ledger::{Channel, Closable, Notification, NotificationTransport};

/// Handles opened for one address
pub struct SubscriptionEntry<T: NotificationTransport> {
    pub address: Address,
    listener: T::Listener,
    streams: Vec<(Channel, T::Stream)>,
}

impl<T: NotificationTransport> SubscriptionEntry<T> {
    pub fn channels(&self) -> Vec<Channel> {
        self.streams.iter().map(|(channel, _)| *channel).collect()
    }

    /// Close streams in order, then the listener. Returns one message per
    /// handle that failed to close.
    async fn close(mut self) -> Vec<String> {
        let mut errors = Vec::new();
        for (channel, stream) in self.streams.iter_mut() {
            if let Err(e) = stream.close().await {
                errors.push(format!("{channel} stream for {}: {e}", self.address));
            }
        }
        if let Err(e) = self.listener.close().await {
            errors.push(format!("listener for {}: {e}", self.address));
        }
        errors
    }
}

/// Address to entry-set mapping over a [`NotificationTransport`]
pub struct SubscriptionRegistry<T: NotificationTransport> {
    transport: Arc<T>,
    channels: Vec<Channel>,
    sink: mpsc::Sender<Notification>,
    entries: HashMap<Address, Vec<SubscriptionEntry<T>>>,
}

impl<T: NotificationTransport> SubscriptionRegistry<T> {
    /// Streams opened on subscribe deliver into `sink`
    pub fn new(transport: Arc<T>, channels: Vec<Channel>, sink: mpsc::Sender<Notification>) -> Self {
        Self {
            transport,
            channels,
            sink,
            entries: HashMap::new(),
        }
    }

    /// Open a listener and one stream per configured channel for `address`.
    ///
    /// No-op for `None` and for an address that already has an entry set.
    /// If any stream fails to open, the handles opened so far are closed and
    /// the error is returned; nothing is registered.
    pub async fn subscribe(&mut self, address: Option<&Address>) -> Result<()> {
        let Some(address) = address else {
            return Ok(());
        };
        if self.is_subscribed(address) {
            debug!("Already subscribed to {}, skipping", address);
            return Ok(());
        }

        let mut listener = self.transport.open(address).await?;
        let mut streams = Vec::with_capacity(self.channels.len());

        for &channel in &self.channels {
            let opened = self
                .transport
                .subscribe(&mut listener, channel, address, self.sink.clone())
                .await;
            match opened {
                Ok(stream) => streams.push((channel, stream)),
                Err(e) => {
                    let partial = SubscriptionEntry::<T> {
                        address: address.clone(),
                        listener,
                        streams,
                    };
                    for cleanup in partial.close().await {
                        warn!("Cleanup after failed subscribe: {}", cleanup);
                    }
                    return Err(e);
                }
            }
        }

        info!("Subscribed {} channels for {}", streams.len(), address);
        self.entries
            .entry(address.clone())
            .or_default()
            .push(SubscriptionEntry {
                address: address.clone(),
                listener,
                streams,
            });
        Ok(())
    }

    /// Close and remove every entry set for `address`.
    ///
    /// Returns close failures; they never stop the remaining handles from
    /// being closed and the address is always removed.
    pub async fn unsubscribe(&mut self, address: &Address) -> Vec<String> {
        let Some(entries) = self.entries.remove(address) else {
            return Vec::new();
        };

        let mut errors = Vec::new();
        for entry in entries {
            errors.extend(entry.close().await);
        }
        for e in &errors {
            warn!("Failed to close handle: {}", e);
        }
        debug!("Unsubscribed {}", address);
        errors
    }

    /// Unsubscribe every address
    pub async fn close_all(&mut self) -> Vec<String> {
        let addresses: Vec<Address> = self.entries.keys().cloned().collect();
        let mut errors = Vec::new();
        for address in addresses {
            errors.extend(self.unsubscribe(&address).await);
        }
        errors
    }

    pub fn is_subscribed(&self, address: &Address) -> bool {
        self.entries.contains_key(address)
    }

    pub fn subscribed_addresses(&self) -> Vec<Address> {
        let mut addresses: Vec<Address> = self.entries.keys().cloned().collect();
        addresses.sort();
        addresses
    }

    pub fn entries_for(&self, address: &Address) -> &[SubscriptionEntry<T>] {
        self.entries.get(address).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wdesk_core::NetworkType;
    use wdesk_ledger::test_utils::{test_address, FakeTransport};

    const NET: NetworkType = NetworkType::TestNet;

    fn registry(transport: &FakeTransport) -> SubscriptionRegistry<FakeTransport> {
        let (tx, _rx) = mpsc::channel(16);
        SubscriptionRegistry::new(Arc::new(transport.clone()), Channel::ALL.to_vec(), tx)
    }

    #[tokio::test]
    async fn test_subscribe_none_is_noop() {
        let transport = FakeTransport::new();
        let mut registry = registry(&transport);

        registry.subscribe(None).await.unwrap();

        assert_eq!(transport.listeners_opened(), 0);
        assert!(registry.subscribed_addresses().is_empty());
    }

    #[tokio::test]
    async fn test_subscribe_opens_listener_and_every_channel() {
        let transport = FakeTransport::new();
        let mut registry = registry(&transport);
        let address = test_address(1, NET);

        registry.subscribe(Some(&address)).await.unwrap();

        assert_eq!(transport.listeners_opened(), 1);
        assert_eq!(transport.streams_opened(), Channel::ALL.len());
        assert_eq!(registry.entries_for(&address).len(), 1);
        assert_eq!(
            registry.entries_for(&address)[0].channels(),
            Channel::ALL.to_vec()
        );
    }

    #[tokio::test]
    async fn test_resubscribe_is_deduplicated() {
        let transport = FakeTransport::new();
        let mut registry = registry(&transport);
        let address = test_address(1, NET);

        registry.subscribe(Some(&address)).await.unwrap();
        registry.subscribe(Some(&address)).await.unwrap();

        assert_eq!(transport.listeners_opened(), 1);
        assert_eq!(registry.entries_for(&address).len(), 1);
    }

    #[tokio::test]
    async fn test_unsubscribe_closes_every_handle_once() {
        let transport = FakeTransport::new();
        let mut registry = registry(&transport);
        let address = test_address(1, NET);

        registry.subscribe(Some(&address)).await.unwrap();
        let errors = registry.unsubscribe(&address).await;

        assert!(errors.is_empty());
        assert!(!registry.is_subscribed(&address));
        assert!(transport.all_closed_exactly_once());
    }

    #[tokio::test]
    async fn test_unsubscribe_unknown_is_noop() {
        let transport = FakeTransport::new();
        let mut registry = registry(&transport);
        assert!(registry.unsubscribe(&test_address(9, NET)).await.is_empty());
        assert_eq!(transport.close_calls(), 0);
    }

    #[tokio::test]
    async fn test_close_failure_does_not_stop_cleanup() {
        let transport = FakeTransport::new();
        transport.fail_close_on(Channel::UnconfirmedAdded);
        transport.fail_listener_close();
        let mut registry = registry(&transport);
        let address = test_address(1, NET);

        registry.subscribe(Some(&address)).await.unwrap();
        let errors = registry.unsubscribe(&address).await;

        assert_eq!(errors.len(), 2);
        assert!(errors[0].starts_with("unconfirmedAdded stream"));
        assert!(errors[1].starts_with("listener"));
        assert!(!registry.is_subscribed(&address));
        assert!(transport.all_closed_exactly_once());
    }

    #[tokio::test]
    async fn test_failed_subscribe_releases_partial_handles() {
        let transport = FakeTransport::new();
        transport.fail_subscribe_on(Channel::CosignatureAdded);
        let mut registry = registry(&transport);
        let address = test_address(1, NET);

        let result = registry.subscribe(Some(&address)).await;

        assert!(matches!(result, Err(Error::Network { .. })));
        assert!(!registry.is_subscribed(&address));
        assert_eq!(transport.open_handles(), 0);
        assert!(transport.all_closed_exactly_once());
    }

    #[tokio::test]
    async fn test_failed_open_registers_nothing() {
        let transport = FakeTransport::new();
        transport.fail_open();
        let mut registry = registry(&transport);
        let address = test_address(1, NET);

        assert!(registry.subscribe(Some(&address)).await.is_err());
        assert!(registry.subscribed_addresses().is_empty());
    }

    #[tokio::test]
    async fn test_close_all() {
        let transport = FakeTransport::new();
        let mut registry = registry(&transport);
        registry.subscribe(Some(&test_address(1, NET))).await.unwrap();
        registry.subscribe(Some(&test_address(2, NET))).await.unwrap();

        registry.close_all().await;

        assert!(registry.subscribed_addresses().is_empty());
        assert!(transport.all_closed_exactly_once());
    }
}
