//! Session controller
//!
//! Entry point for identity changes. Owns the [`Store`], the subscription
//! registry and the broadcaster, and drives the dependent domains.
//!
//! Initialize, uninitialize and signer changes take the registry lock for
//! their whole duration, so a logout racing a login (or two signer switches)
//! run one after the other and each observes the other's completed state.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;

use wdesk_core::prelude::*;
use wdesk_core::{
    Account, Address, CosignatureSignedTransaction, PublicKey, SignedTransaction, Transaction,
    TransactionHash,
};
use wdesk_ledger::{AddressCodec, LedgerRepository, NotificationTransport};

use crate::broadcast::{BroadcastResult, Broadcaster};
use crate::config::Settings;
use crate::domains::{DomainChannels, DomainCommand, DomainKind};
use crate::message::Mutation;
use crate::profile::{accounts_on, ProfileStore};
use crate::session_event::SessionEvent;
use crate::signers::resolve_signers;
use crate::state::SessionState;
use crate::store::Store;
use crate::subscriptions::SubscriptionRegistry;

/// Top-level coordinator of the account session
pub struct SessionController<R: LedgerRepository, T: NotificationTransport> {
    store: Store,
    repository: Arc<R>,
    codec: Arc<dyn AddressCodec>,
    profile: Arc<dyn ProfileStore>,
    domains: DomainChannels,
    broadcaster: Broadcaster<R, T>,
    /// Subscription registry; holding its lock is the acquisition guard
    registry: Mutex<SubscriptionRegistry<T>>,
    settings: Settings,
    forwarder: JoinHandle<()>,
}

impl<R: LedgerRepository, T: NotificationTransport> SessionController<R, T> {
    /// Create a controller with an empty, uninitialized session.
    ///
    /// Must be called from within a tokio runtime: a task forwarding stream
    /// notifications to observers is spawned here.
    pub fn new(
        settings: Settings,
        repository: Arc<R>,
        transport: Arc<T>,
        codec: Arc<dyn AddressCodec>,
        profile: Arc<dyn ProfileStore>,
        domains: DomainChannels,
    ) -> Self {
        let store = Store::new(
            SessionState::new(settings.network.network_type),
            settings.events.capacity,
        );

        let (notification_tx, notification_rx) =
            mpsc::channel(settings.subscriptions.notification_buffer.max(1));
        let forwarder = spawn_notification_forwarder(store.clone(), notification_rx);

        let registry = SubscriptionRegistry::new(
            Arc::clone(&transport),
            settings.subscriptions.channels.clone(),
            notification_tx,
        );
        let broadcaster = Broadcaster::new(
            store.clone(),
            Arc::clone(&repository),
            transport,
            Arc::clone(&codec),
            settings.broadcast.confirmation_timeout(),
        );

        Self {
            store,
            repository,
            codec,
            profile,
            domains,
            broadcaster,
            registry: Mutex::new(registry),
            settings,
            forwarder,
        }
    }

    // ─────────────────────────────────────────────────────────
    // Observation
    // ─────────────────────────────────────────────────────────

    /// Snapshot of the session state
    pub fn state(&self) -> SessionState {
        self.store.snapshot()
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.store.subscribe()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Addresses with open notification channels
    pub async fn subscribed_addresses(&self) -> Vec<Address> {
        self.registry.lock().await.subscribed_addresses()
    }

    // ─────────────────────────────────────────────────────────
    // Identity
    // ─────────────────────────────────────────────────────────

    /// Make `account` current, switch the signer to it and initialize the
    /// session for its address. No-op when the address is already current
    /// and its session is live.
    pub async fn set_current_account(&self, account: Account) -> Result<()> {
        let mut registry = self.registry.lock().await;

        let unchanged = self.store.read(|s| {
            s.lifecycle.is_initialized_for(&account.address)
                && s.current_account
                    .as_ref()
                    .is_some_and(|current| current.address == account.address)
        });
        if unchanged {
            debug!("Account {} already current", account.address);
            return Ok(());
        }

        let address = account.address.clone();
        info!("Switching account to {}", address.pretty());

        // The account signs as itself, so its signer address needs no derivation
        let public_key = account.public_key.clone();
        self.store
            .dispatch(Mutation::SetCurrentAccount(account.clone()));
        self.change_signer(&mut registry, &account, public_key, address.clone())
            .await;
        self.store.dispatch(Mutation::Initialize(address.clone()));
        self.store.emit(SessionEvent::AccountChanged { address });
        Ok(())
    }

    /// Act as the signer owning `public_key` (the account or a multisig it
    /// cosigns). Every fallible step (key parsing, the current account
    /// lookup, address derivation) runs before any state changes.
    pub async fn set_current_signer(&self, public_key: &str) -> Result<()> {
        let public_key = PublicKey::parse(public_key)?;
        let mut registry = self.registry.lock().await;

        let (network_type, account, known_signer) = self.store.read(|s| {
            (
                s.network_type,
                s.current_account.clone(),
                s.signer_by_public_key(&public_key)
                    .map(|signer| signer.address.clone()),
            )
        });
        let account = account.ok_or(Error::NoCurrentAccount)?;
        let signer_address = match known_signer {
            Some(address) => address,
            None => self
                .codec
                .address_from_public_key(&public_key, network_type)?,
        };

        self.change_signer(&mut registry, &account, public_key, signer_address)
            .await;
        Ok(())
    }

    /// Switch to an already resolved signer of `account`. Infallible: network
    /// failures past this point degrade with a warning.
    async fn change_signer(
        &self,
        registry: &mut SubscriptionRegistry<T>,
        account: &Account,
        public_key: PublicKey,
        signer_address: Address,
    ) {
        let (network_type, previous, previous_account) = self.store.read(|s| {
            (
                s.network_type,
                s.current_signer_address.clone(),
                s.current_account_address.clone(),
            )
        });

        if previous.as_ref() == Some(&signer_address)
            && previous_account.as_ref() == Some(&account.address)
        {
            debug!("Signer {} already current", signer_address);
            return;
        }

        // Domains reset against the outgoing identity
        self.domains
            .send(DomainKind::Transactions, DomainCommand::Reset);

        let known_accounts = accounts_on(self.profile.as_ref(), network_type);
        self.store.dispatch(Mutation::SetCurrentSigner {
            public_key,
            signer_address: signer_address.clone(),
            account_address: account.address.clone(),
            known_accounts,
        });
        self.domains.broadcast(DomainCommand::SignerChanged {
            signer: signer_address.clone(),
        });

        // Close the old channels before opening new ones
        if let Some(previous) = &previous {
            registry.unsubscribe(previous).await;
        }
        if let Err(e) = registry.subscribe(Some(&signer_address)).await {
            warn!("Failed to subscribe to {}: {}", signer_address, e);
        }

        self.refresh_signers(account).await;

        for kind in [DomainKind::Namespace, DomainKind::Mosaic] {
            self.domains.send(
                kind,
                DomainCommand::Load {
                    address: signer_address.clone(),
                },
            );
        }
    }

    /// Reload on-chain info and the multisig graph for the current account
    /// and re-resolve its signers
    pub async fn load_account_info(&self) -> Result<()> {
        let _guard = self.registry.lock().await;
        let account = self
            .store
            .read(|s| s.current_account.clone())
            .ok_or(Error::NoCurrentAccount)?;
        self.refresh_signers(&account).await;
        Ok(())
    }

    async fn refresh_signers(&self, account: &Account) {
        let (network_type, known_accounts) =
            self.store.read(|s| (s.network_type, s.known_accounts.clone()));

        let info = match self.repository.account_info(&account.address).await {
            Ok(info) => Some(info),
            Err(e) => {
                warn!("Account info for {} unavailable: {}", account.address, e);
                None
            }
        };
        let graph = match self.repository.multisig_graph(&account.address).await {
            Ok(graph) => Some(graph),
            Err(e) => {
                warn!(
                    "Multisig info for {} unavailable, assuming none: {}",
                    account.address, e
                );
                None
            }
        };

        let signers = resolve_signers(network_type, &known_accounts, account, graph.as_ref());
        debug!("Resolved {} signers for {}", signers.len(), account.address);
        self.store.dispatch(Mutation::AccountInfoLoaded {
            info,
            graph,
            signers,
        });
    }

    /// Change the display label of an account
    pub fn rename_account(&self, address: &Address, label: &str) -> Result<()> {
        let label = label.trim();
        if label.is_empty() {
            return Err(Error::invalid_argument("account label is required"));
        }
        self.store.dispatch(Mutation::RenameAccount {
            address: address.clone(),
            label: label.to_string(),
        });
        Ok(())
    }

    // ─────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────

    /// Tear down the session for `address`. Idempotent.
    pub async fn uninitialize(&self, address: &Address) -> Result<()> {
        let mut registry = self.registry.lock().await;
        self.teardown(&mut registry, address).await;
        Ok(())
    }

    /// Tear down the active session and return to the pristine state
    pub async fn logout(&self) -> Result<()> {
        let mut registry = self.registry.lock().await;
        if let Some(address) = self.store.read(|s| s.lifecycle.address().cloned()) {
            self.teardown(&mut registry, &address).await;
        }
        registry.close_all().await;
        self.store.dispatch(Mutation::Reset);
        info!("Logged out");
        Ok(())
    }

    /// Uninitializing the acting signer's address tears down the session
    /// that signer belongs to. Any other address only loses stray channels.
    async fn teardown(&self, registry: &mut SubscriptionRegistry<T>, address: &Address) {
        let owner = self.store.read(|s| {
            let owner = s.lifecycle.address()?;
            let acting = s.current_signer_address.as_ref() == Some(address);
            (owner == address || acting).then(|| owner.clone())
        });

        let Some(owner) = owner else {
            if registry.is_subscribed(address) {
                registry.unsubscribe(address).await;
            } else {
                debug!("No session for {}, nothing to tear down", address);
            }
            return;
        };

        if &owner != address {
            info!("Signer {} uninitialized, closing session of {}", address, owner);
        }
        // The signer's channels belong to this session too
        registry.close_all().await;
        self.domains
            .send(DomainKind::Transactions, DomainCommand::Reset);
        self.store.dispatch(Mutation::ResetTransactions);
        self.store.dispatch(Mutation::Uninitialize(owner));
    }

    // ─────────────────────────────────────────────────────────
    // Transaction Stage
    // ─────────────────────────────────────────────────────────

    pub fn stage(&self, transaction: Transaction) {
        self.store.dispatch(Mutation::Stage(transaction));
    }

    pub fn clear_stage(&self) {
        self.store.dispatch(Mutation::ClearStage);
    }

    pub fn sign(&self, transaction: SignedTransaction) {
        self.store.dispatch(Mutation::Sign(transaction));
    }

    pub fn unsign(&self, hash: &TransactionHash) {
        self.store.dispatch(Mutation::Unsign(hash.clone()));
    }

    // ─────────────────────────────────────────────────────────
    // Broadcast
    // ─────────────────────────────────────────────────────────

    pub async fn announce_single(&self, transaction: SignedTransaction) -> BroadcastResult {
        self.broadcaster.announce_single(transaction).await
    }

    pub async fn announce_aggregate_bonded(
        &self,
        lock: SignedTransaction,
        partial: SignedTransaction,
    ) -> BroadcastResult {
        self.broadcaster
            .announce_aggregate_bonded(lock, partial)
            .await
    }

    pub async fn announce_cosignature(
        &self,
        cosignature: CosignatureSignedTransaction,
    ) -> BroadcastResult {
        self.broadcaster.announce_cosignature(cosignature).await
    }
}

impl<R: LedgerRepository, T: NotificationTransport> Drop for SessionController<R, T> {
    fn drop(&mut self) {
        self.forwarder.abort();
    }
}

/// Republish stream notifications as session events
fn spawn_notification_forwarder(
    store: Store,
    mut rx: mpsc::Receiver<wdesk_ledger::Notification>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(notification) = rx.recv().await {
            trace!(
                "{} notification for {}",
                notification.channel,
                notification.address
            );
            store.emit(SessionEvent::Notification(notification));
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{MockProfileStore, StaticProfile};
    use crate::state::Lifecycle;
    use wdesk_core::NetworkType;
    use wdesk_ledger::test_utils::{
        test_account, test_public_key, FakeLedger, FakeTransport, PrefixCodec,
    };
    use wdesk_ledger::Channel;

    const NET: NetworkType = NetworkType::TestNet;

    fn controller(
        profile: MockProfileStore,
    ) -> (SessionController<FakeLedger, FakeTransport>, FakeLedger) {
        let ledger = FakeLedger::new();
        let (domains, _receivers) = DomainChannels::channel(8);
        let controller = SessionController::new(
            Settings::default(),
            Arc::new(ledger.clone()),
            Arc::new(FakeTransport::new()),
            Arc::new(PrefixCodec),
            Arc::new(profile),
            domains,
        );
        (controller, ledger)
    }

    /// Codec that derives like [`PrefixCodec`] but rejects one key
    fn refusing_codec(refused: PublicKey) -> Arc<dyn AddressCodec> {
        Arc::new(move |key: &PublicKey, network_type: NetworkType| {
            if *key == refused {
                Err(Error::invalid_argument("key not derivable"))
            } else {
                PrefixCodec.address_from_public_key(key, network_type)
            }
        })
    }

    fn controller_with_codec(
        accounts: Vec<Account>,
        codec: Arc<dyn AddressCodec>,
    ) -> (SessionController<FakeLedger, FakeTransport>, FakeTransport) {
        let ledger = FakeLedger::new();
        for account in &accounts {
            ledger.insert_known(account);
        }
        let transport = FakeTransport::new();
        let (domains, _receivers) = DomainChannels::channel(8);
        let controller = SessionController::new(
            Settings::default(),
            Arc::new(ledger),
            Arc::new(transport.clone()),
            codec,
            Arc::new(StaticProfile::new(accounts)),
            domains,
        );
        (controller, transport)
    }

    #[tokio::test]
    async fn test_signer_change_reads_profile_once() {
        let account = test_account(1, "main", NET);
        let profile_accounts = vec![account.clone(), test_account(2, "other", NetworkType::MainNet)];
        let mut profile = MockProfileStore::new();
        profile
            .expect_known_accounts()
            .times(1)
            .returning(move || profile_accounts.clone());
        let (controller, ledger) = controller(profile);
        ledger.insert_known(&account);

        controller.set_current_account(account.clone()).await.unwrap();

        let state = controller.state();
        assert_eq!(state.known_accounts, vec![account]);
    }

    #[tokio::test]
    async fn test_set_current_signer_without_account() {
        let mut profile = MockProfileStore::new();
        profile.expect_known_accounts().never();
        let (controller, _) = controller(profile);

        let err = controller
            .set_current_signer(&"0A".repeat(32))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoCurrentAccount));
    }

    #[tokio::test]
    async fn test_account_switch_uses_account_address_without_codec() {
        let first = test_account(1, "first", NET);
        let second = test_account(3, "second", NET);
        let (controller, transport) = controller_with_codec(
            vec![first.clone(), second.clone()],
            refusing_codec(second.public_key.clone()),
        );

        controller.set_current_account(first).await.unwrap();
        controller.set_current_account(second.clone()).await.unwrap();

        let state = controller.state();
        assert_eq!(
            state.current_account.as_ref().map(|a| &a.address),
            Some(&second.address)
        );
        assert_eq!(state.current_account_address, Some(second.address.clone()));
        assert_eq!(state.current_signer_address, Some(second.address.clone()));
        assert_eq!(state.lifecycle, Lifecycle::Initialized(second.address.clone()));
        assert_eq!(state.signers.len(), 1);
        assert_eq!(
            controller.subscribed_addresses().await,
            vec![second.address]
        );
        assert_eq!(transport.open_handles(), 1 + Channel::ALL.len());
    }

    #[tokio::test]
    async fn test_underivable_signer_key_leaves_session_untouched() {
        let main = test_account(1, "main", NET);
        let stranger = test_public_key(9);
        let (controller, transport) =
            controller_with_codec(vec![main.clone()], refusing_codec(stranger.clone()));
        controller.set_current_account(main.clone()).await.unwrap();
        let before = controller.state();
        let listeners = transport.listeners_opened();

        let err = controller
            .set_current_signer(stranger.as_str())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidArgument { .. }));
        assert_eq!(controller.state(), before);
        assert_eq!(controller.subscribed_addresses().await, vec![main.address]);
        assert_eq!(transport.listeners_opened(), listeners);
    }

    #[tokio::test]
    async fn test_empty_label_rejected() {
        let (controller, _) = controller(MockProfileStore::new());
        let account = test_account(1, "main", NET);
        let err = controller.rename_account(&account.address, "  ").unwrap_err();
        assert!(err.is_fatal());
    }
}
