//! Broadcast orchestrator
//!
//! Announces signed transactions and cosignatures, normalizing every
//! network-dependent outcome into a [`BroadcastResult`]. Announce is attempted
//! once per call; signed transactions leave the stage whatever the outcome,
//! since retrying requires re-signing.

use std::sync::Arc;
use std::time::Duration;

use wdesk_core::prelude::*;
use wdesk_core::{CosignatureSignedTransaction, SignedTransaction, TransactionHash};
use wdesk_ledger::{AddressCodec, Channel, Closable, LedgerRepository, NotificationTransport};

use crate::message::Mutation;
use crate::session_event::SessionEvent;
use crate::store::Store;

/// What an announce operation submitted
#[derive(Debug, Clone, PartialEq)]
pub enum BroadcastSubject {
    Transaction(SignedTransaction),
    AggregateBonded {
        lock: SignedTransaction,
        partial: SignedTransaction,
    },
    Cosignature(CosignatureSignedTransaction),
}

impl BroadcastSubject {
    /// Hash identifying the announced subject; the partial for bonded pairs
    /// and the parent transaction for cosignatures
    pub fn hash(&self) -> &TransactionHash {
        match self {
            BroadcastSubject::Transaction(tx) => &tx.hash,
            BroadcastSubject::AggregateBonded { partial, .. } => &partial.hash,
            BroadcastSubject::Cosignature(cosignature) => &cosignature.parent_hash,
        }
    }
}

/// Uniform outcome of all announce operations
#[derive(Debug, Clone, PartialEq)]
pub struct BroadcastResult {
    pub subject: BroadcastSubject,
    pub success: bool,
    /// Human readable failure description
    pub error: Option<String>,
}

impl BroadcastResult {
    pub fn success(subject: BroadcastSubject) -> Self {
        Self {
            subject,
            success: true,
            error: None,
        }
    }

    pub fn failure(subject: BroadcastSubject, error: impl Into<String>) -> Self {
        Self {
            subject,
            success: false,
            error: Some(error.into()),
        }
    }

    fn from_outcome(subject: BroadcastSubject, outcome: Result<()>) -> Self {
        match outcome {
            Ok(()) => Self::success(subject),
            Err(e) => Self::failure(subject, e.to_string()),
        }
    }
}

/// Submits transactions through the ledger collaborators
pub struct Broadcaster<R: LedgerRepository, T: NotificationTransport> {
    store: Store,
    repository: Arc<R>,
    transport: Arc<T>,
    codec: Arc<dyn AddressCodec>,
    confirmation_timeout: Duration,
}

impl<R: LedgerRepository, T: NotificationTransport> Broadcaster<R, T> {
    pub fn new(
        store: Store,
        repository: Arc<R>,
        transport: Arc<T>,
        codec: Arc<dyn AddressCodec>,
        confirmation_timeout: Duration,
    ) -> Self {
        Self {
            store,
            repository,
            transport,
            codec,
            confirmation_timeout,
        }
    }

    pub fn confirmation_timeout(&self) -> Duration {
        self.confirmation_timeout
    }

    /// Announce a fully signed transaction
    pub async fn announce_single(&self, transaction: SignedTransaction) -> BroadcastResult {
        let outcome = self.repository.announce(&transaction).await;
        self.store
            .dispatch(Mutation::Unsign(transaction.hash.clone()));
        self.complete(BroadcastResult::from_outcome(
            BroadcastSubject::Transaction(transaction),
            outcome,
        ))
    }

    /// Announce a hash lock and its aggregate-bonded partial, waiting for the
    /// partial to reach the bonded pool within the confirmation timeout
    pub async fn announce_aggregate_bonded(
        &self,
        lock: SignedTransaction,
        partial: SignedTransaction,
    ) -> BroadcastResult {
        let outcome = self.run_aggregate_bonded(&lock, &partial).await;

        self.store.dispatch(Mutation::Unsign(lock.hash.clone()));
        self.store.dispatch(Mutation::Unsign(partial.hash.clone()));

        self.complete(BroadcastResult::from_outcome(
            BroadcastSubject::AggregateBonded { lock, partial },
            outcome,
        ))
    }

    /// Announce a cosignature for a transaction in the partial pool
    pub async fn announce_cosignature(
        &self,
        cosignature: CosignatureSignedTransaction,
    ) -> BroadcastResult {
        let outcome = self.repository.announce_cosignature(&cosignature).await;
        self.complete(BroadcastResult::from_outcome(
            BroadcastSubject::Cosignature(cosignature),
            outcome,
        ))
    }

    async fn run_aggregate_bonded(
        &self,
        lock: &SignedTransaction,
        partial: &SignedTransaction,
    ) -> Result<()> {
        let address = self
            .codec
            .address_from_public_key(&partial.signer_public_key, partial.network_type)?;
        let mut slot: Option<T::Listener> = None;

        let flow = async {
            let listener = slot.insert(self.transport.open(&address).await?);
            self.repository.announce(lock).await?;
            self.transport
                .await_event(listener, Channel::Confirmed, &address, &lock.hash)
                .await?;
            debug!("Hash lock {} confirmed", lock.hash);
            self.repository.announce_aggregate_bonded(partial).await?;
            self.transport
                .await_event(
                    listener,
                    Channel::AggregateBondedAdded,
                    &address,
                    &partial.hash,
                )
                .await
        };
        let raced = tokio::time::timeout(self.confirmation_timeout, flow).await;

        // Whatever branch finished the race, an opened listener is released
        if let Some(mut listener) = slot {
            if let Err(e) = listener.close().await {
                warn!("Failed to close confirmation listener for {}: {}", address, e);
            }
        }

        match raced {
            Ok(outcome) => outcome,
            Err(_) => Err(Error::timeout(
                "Aggregate bonded confirmation",
                self.confirmation_timeout,
            )),
        }
    }

    fn complete(&self, result: BroadcastResult) -> BroadcastResult {
        match &result.error {
            None => info!("Announced {}", result.subject.hash()),
            Some(e) => warn!("Announce of {} failed: {}", result.subject.hash(), e),
        }
        self.store.emit(SessionEvent::BroadcastCompleted {
            hash: result.subject.hash().clone(),
            success: result.success,
            error: result.error.clone(),
        });
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SessionState;
    use wdesk_core::{NetworkType, TransactionKind};
    use wdesk_ledger::test_utils::{
        test_cosignature, test_signed, Confirmation, FakeLedger, FakeTransport, PrefixCodec,
    };

    struct Fixture {
        store: Store,
        ledger: FakeLedger,
        transport: FakeTransport,
        broadcaster: Broadcaster<FakeLedger, FakeTransport>,
    }

    fn fixture(timeout: Duration) -> Fixture {
        let store = Store::new(SessionState::new(NetworkType::TestNet), 32);
        let ledger = FakeLedger::new();
        let transport = FakeTransport::new();
        let broadcaster = Broadcaster::new(
            store.clone(),
            Arc::new(ledger.clone()),
            Arc::new(transport.clone()),
            Arc::new(PrefixCodec),
            timeout,
        );
        Fixture {
            store,
            ledger,
            transport,
            broadcaster,
        }
    }

    fn sign_all(store: &Store, transactions: &[&SignedTransaction]) {
        for tx in transactions {
            store.dispatch(Mutation::Sign((*tx).clone()));
        }
    }

    #[tokio::test]
    async fn test_single_success_unsigns() {
        let f = fixture(Duration::from_secs(30));
        let tx = test_signed(1, TransactionKind::Transfer, 7);
        sign_all(&f.store, &[&tx]);

        let result = f.broadcaster.announce_single(tx.clone()).await;

        assert!(result.success);
        assert_eq!(result.subject, BroadcastSubject::Transaction(tx.clone()));
        assert!(!f.store.read(|s| s.is_signed(&tx.hash)));
        assert_eq!(f.ledger.announced(), vec![tx.hash]);
    }

    #[tokio::test]
    async fn test_single_failure_still_unsigns() {
        let f = fixture(Duration::from_secs(30));
        let tx = test_signed(1, TransactionKind::Transfer, 7);
        let other = test_signed(2, TransactionKind::Transfer, 7);
        sign_all(&f.store, &[&tx, &other]);
        f.ledger.fail_announce(&tx.hash, "Failure_Core_Insufficient_Balance");

        let result = f.broadcaster.announce_single(tx.clone()).await;

        assert!(!result.success);
        assert!(result
            .error
            .as_deref()
            .unwrap()
            .contains("Failure_Core_Insufficient_Balance"));
        let remaining: Vec<_> = f
            .store
            .read(|s| s.signed_transactions.iter().map(|t| t.hash.clone()).collect());
        assert_eq!(remaining, vec![other.hash]);
    }

    #[tokio::test]
    async fn test_broadcast_emits_completion_event() {
        let f = fixture(Duration::from_secs(30));
        let mut events = f.store.subscribe();
        let tx = test_signed(1, TransactionKind::Transfer, 7);

        f.broadcaster.announce_single(tx.clone()).await;

        let mut seen = None;
        while let Ok(event) = events.try_recv() {
            if let SessionEvent::BroadcastCompleted { hash, success, .. } = event {
                seen = Some((hash, success));
            }
        }
        assert_eq!(seen, Some((tx.hash, true)));
    }

    #[tokio::test]
    async fn test_aggregate_bonded_success() {
        let f = fixture(Duration::from_secs(30));
        let lock = test_signed(1, TransactionKind::HashLock, 7);
        let partial = test_signed(2, TransactionKind::AggregateBonded, 7);
        sign_all(&f.store, &[&lock, &partial]);

        let result = f
            .broadcaster
            .announce_aggregate_bonded(lock.clone(), partial.clone())
            .await;

        assert!(result.success, "{:?}", result.error);
        assert_eq!(f.ledger.announced(), vec![lock.hash.clone()]);
        assert_eq!(f.ledger.announced_bonded(), vec![partial.hash.clone()]);
        assert_eq!(
            f.transport.awaited(),
            vec![
                (Channel::Confirmed, lock.hash),
                (Channel::AggregateBondedAdded, partial.hash),
            ]
        );
        assert!(f.store.read(|s| s.signed_transactions.is_empty()));
        assert!(f.transport.all_closed_exactly_once());
    }

    #[tokio::test]
    async fn test_aggregate_bonded_network_error_unsigns_both() {
        let f = fixture(Duration::from_secs(30));
        let lock = test_signed(1, TransactionKind::HashLock, 7);
        let partial = test_signed(2, TransactionKind::AggregateBonded, 7);
        sign_all(&f.store, &[&lock, &partial]);
        f.transport
            .set_confirmation(&lock.hash, Confirmation::Fail("Failure_Lock_Invalid_Mosaic".into()));

        let result = f
            .broadcaster
            .announce_aggregate_bonded(lock, partial.clone())
            .await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("Failure_Lock_Invalid_Mosaic"));
        assert!(f.ledger.announced_bonded().is_empty());
        assert!(f.store.read(|s| s.signed_transactions.is_empty()));
        assert!(f.transport.all_closed_exactly_once());
    }

    #[tokio::test(start_paused = true)]
    async fn test_aggregate_bonded_timeout_unsigns_both() {
        let f = fixture(Duration::from_secs(5));
        let lock = test_signed(1, TransactionKind::HashLock, 7);
        let partial = test_signed(2, TransactionKind::AggregateBonded, 7);
        let unrelated = test_signed(3, TransactionKind::Transfer, 7);
        sign_all(&f.store, &[&lock, &unrelated, &partial]);
        f.transport
            .set_confirmation(&partial.hash, Confirmation::After(Duration::from_secs(60)));

        let result = f
            .broadcaster
            .announce_aggregate_bonded(lock.clone(), partial.clone())
            .await;

        assert!(!result.success);
        let message = result.error.unwrap();
        assert!(message.contains("timed out"), "{message}");
        let remaining: Vec<_> = f
            .store
            .read(|s| s.signed_transactions.iter().map(|t| t.hash.clone()).collect());
        assert_eq!(remaining, vec![unrelated.hash]);
        assert!(f.transport.all_closed_exactly_once());
    }

    #[tokio::test]
    async fn test_aggregate_bonded_listener_open_failure() {
        let f = fixture(Duration::from_secs(30));
        f.transport.fail_open();
        let lock = test_signed(1, TransactionKind::HashLock, 7);
        let partial = test_signed(2, TransactionKind::AggregateBonded, 7);
        sign_all(&f.store, &[&lock, &partial]);

        let result = f.broadcaster.announce_aggregate_bonded(lock, partial).await;

        assert!(!result.success);
        assert!(f.ledger.announced().is_empty());
        assert!(f.store.read(|s| s.signed_transactions.is_empty()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_aggregate_bonded_stalled_listener_open_times_out() {
        let f = fixture(Duration::from_secs(5));
        f.transport.stall_open();
        let lock = test_signed(1, TransactionKind::HashLock, 7);
        let partial = test_signed(2, TransactionKind::AggregateBonded, 7);
        sign_all(&f.store, &[&lock, &partial]);

        let result = f.broadcaster.announce_aggregate_bonded(lock, partial).await;

        assert!(!result.success);
        let message = result.error.unwrap();
        assert!(message.contains("timed out"), "{message}");
        assert!(f.ledger.announced().is_empty());
        assert_eq!(f.transport.listeners_opened(), 0);
        assert!(f.store.read(|s| s.signed_transactions.is_empty()));
    }

    #[tokio::test]
    async fn test_cosignature_leaves_stage_untouched() {
        let f = fixture(Duration::from_secs(30));
        let parent = test_signed(4, TransactionKind::AggregateBonded, 7);
        sign_all(&f.store, &[&parent]);

        let result = f
            .broadcaster
            .announce_cosignature(test_cosignature(4, 8))
            .await;

        assert!(result.success);
        assert_eq!(result.subject.hash(), &parent.hash);
        assert!(f.store.read(|s| s.is_signed(&parent.hash)));
        assert_eq!(f.ledger.cosignatures(), vec![parent.hash]);
    }

    #[tokio::test]
    async fn test_cosignature_failure_is_normalized() {
        let f = fixture(Duration::from_secs(30));
        let cosignature = test_cosignature(4, 8);
        f.ledger
            .fail_announce(&cosignature.parent_hash, "Failure_Aggregate_Ineligible_Cosignatories");

        let result = f.broadcaster.announce_cosignature(cosignature).await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("Ineligible"));
    }
}
