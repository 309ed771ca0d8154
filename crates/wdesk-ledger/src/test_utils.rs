//! Test utilities for ledger seams
//!
//! In-memory stand-ins for the ledger network, the notification transport and
//! the address codec, plus builders for keys, accounts and transactions.
//! Every fake records the calls it receives so tests can assert on churn.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use wdesk_core::prelude::*;
use wdesk_core::{
    Account, AccountInfo, Address, CosignatureSignedTransaction, MultisigAccountInfo,
    MultisigGraph, NetworkType, PublicKey, SignedTransaction, Transaction, TransactionHash,
    TransactionKind,
};

use crate::codec::AddressCodec;
use crate::repository::LedgerRepository;
use crate::transport::{Channel, Closable, Notification, NotificationTransport};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

// ─────────────────────────────────────────────────────────────────
// Builders
// ─────────────────────────────────────────────────────────────────

/// Public key made of one repeated byte
pub fn test_public_key(seed: u8) -> PublicKey {
    PublicKey::parse(&format!("{seed:02X}").repeat(32)).expect("valid test key")
}

/// Transaction hash made of one repeated byte
pub fn test_hash(seed: u8) -> TransactionHash {
    TransactionHash::parse(&format!("{seed:02X}").repeat(32)).expect("valid test hash")
}

/// Address the [`PrefixCodec`] derives for `test_public_key(seed)`
pub fn test_address(seed: u8, network_type: NetworkType) -> Address {
    PrefixCodec
        .address_from_public_key(&test_public_key(seed), network_type)
        .expect("valid test address")
}

/// Account whose address is consistent with [`PrefixCodec`]
pub fn test_account(seed: u8, label: &str, network_type: NetworkType) -> Account {
    Account::new(
        test_address(seed, network_type),
        test_public_key(seed),
        label,
        network_type,
    )
}

/// Unsigned transfer for staging tests
pub fn test_transaction(payload: &str) -> Transaction {
    Transaction {
        kind: TransactionKind::Transfer,
        network_type: NetworkType::TestNet,
        signer: None,
        max_fee: 20_000,
        deadline: deadline(),
        payload: payload.to_string(),
    }
}

/// Signed transaction with a hash made of one repeated byte
pub fn test_signed(seed: u8, kind: TransactionKind, signer: u8) -> SignedTransaction {
    SignedTransaction {
        kind,
        network_type: NetworkType::TestNet,
        signer_public_key: test_public_key(signer),
        hash: test_hash(seed),
        payload: format!("PAYLOAD{seed:02X}"),
    }
}

/// Cosignature for the transaction identified by `parent`
pub fn test_cosignature(parent: u8, signer: u8) -> CosignatureSignedTransaction {
    CosignatureSignedTransaction {
        parent_hash: test_hash(parent),
        signer_public_key: test_public_key(signer),
        signature: "AA".repeat(64),
    }
}

/// Graph where `cosigner` cosigns every multisig listed in `multisigs`
pub fn test_graph(cosigner: &Account, multisigs: &[(u8, NetworkType)]) -> MultisigGraph {
    let mut graph = MultisigGraph::new().with_entry(
        0,
        MultisigAccountInfo {
            account_address: cosigner.address.clone(),
            account_public_key: cosigner.public_key.clone(),
            min_approval: 0,
            min_removal: 0,
            cosignatory_addresses: Vec::new(),
            multisig_addresses: multisigs
                .iter()
                .map(|(seed, network)| test_address(*seed, *network))
                .collect(),
        },
    );
    for (seed, network) in multisigs {
        graph = graph.with_entry(
            -1,
            MultisigAccountInfo {
                account_address: test_address(*seed, *network),
                account_public_key: test_public_key(*seed),
                min_approval: 1,
                min_removal: 1,
                cosignatory_addresses: vec![cosigner.address.clone()],
                multisig_addresses: Vec::new(),
            },
        );
    }
    graph
}

/// Fixed deadline so staged fixtures compare equal across calls
fn deadline() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default()
}

// ─────────────────────────────────────────────────────────────────
// PrefixCodec
// ─────────────────────────────────────────────────────────────────

/// Deterministic codec: network prefix followed by the first 38 key nibbles
/// mapped onto `A..P`
#[derive(Debug, Clone, Copy, Default)]
pub struct PrefixCodec;

impl AddressCodec for PrefixCodec {
    fn address_from_public_key(
        &self,
        public_key: &PublicKey,
        network_type: NetworkType,
    ) -> Result<Address> {
        let body: String = public_key
            .as_str()
            .chars()
            .take(38)
            .map(|c| {
                let nibble = c.to_digit(16).unwrap_or(0) as u8;
                char::from(b'A' + nibble)
            })
            .collect();
        Address::parse(&format!("{}{}", network_type.address_prefix(), body))
    }
}

// ─────────────────────────────────────────────────────────────────
// FakeLedger
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct LedgerState {
    accounts: HashMap<Address, AccountInfo>,
    graphs: HashMap<Address, MultisigGraph>,
    graph_error: Option<String>,
    announce_errors: HashMap<TransactionHash, String>,
    announced: Vec<TransactionHash>,
    announced_bonded: Vec<TransactionHash>,
    cosignatures: Vec<TransactionHash>,
    account_info_calls: Vec<Address>,
    graph_calls: Vec<Address>,
}

/// In-memory ledger network
#[derive(Debug, Clone, Default)]
pub struct FakeLedger {
    inner: Arc<Mutex<LedgerState>>,
}

impl FakeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_account(&self, info: AccountInfo) {
        lock(&self.inner).accounts.insert(info.address.clone(), info);
    }

    /// Register an account with no mosaics, derived from `account`
    pub fn insert_known(&self, account: &Account) {
        self.insert_account(AccountInfo {
            address: account.address.clone(),
            public_key: Some(account.public_key.clone()),
            mosaics: Vec::new(),
        });
    }

    pub fn insert_graph(&self, address: &Address, graph: MultisigGraph) {
        lock(&self.inner).graphs.insert(address.clone(), graph);
    }

    /// Make every multisig graph lookup fail
    pub fn fail_graph_lookups(&self, message: &str) {
        lock(&self.inner).graph_error = Some(message.to_string());
    }

    /// Make announcing `hash` (on any endpoint) fail
    pub fn fail_announce(&self, hash: &TransactionHash, message: &str) {
        lock(&self.inner)
            .announce_errors
            .insert(hash.clone(), message.to_string());
    }

    pub fn announced(&self) -> Vec<TransactionHash> {
        lock(&self.inner).announced.clone()
    }

    pub fn announced_bonded(&self) -> Vec<TransactionHash> {
        lock(&self.inner).announced_bonded.clone()
    }

    pub fn cosignatures(&self) -> Vec<TransactionHash> {
        lock(&self.inner).cosignatures.clone()
    }

    pub fn account_info_calls(&self) -> Vec<Address> {
        lock(&self.inner).account_info_calls.clone()
    }

    pub fn graph_calls(&self) -> Vec<Address> {
        lock(&self.inner).graph_calls.clone()
    }

    fn check_announce(state: &LedgerState, hash: &TransactionHash) -> Result<()> {
        match state.announce_errors.get(hash) {
            Some(message) => Err(Error::network(message.clone())),
            None => Ok(()),
        }
    }
}

impl LedgerRepository for FakeLedger {
    async fn account_info(&self, address: &Address) -> Result<AccountInfo> {
        let mut state = lock(&self.inner);
        state.account_info_calls.push(address.clone());
        state
            .accounts
            .get(address)
            .cloned()
            .ok_or_else(|| Error::network(format!("account {address} not found")))
    }

    async fn multisig_graph(&self, address: &Address) -> Result<MultisigGraph> {
        let mut state = lock(&self.inner);
        state.graph_calls.push(address.clone());
        if let Some(message) = &state.graph_error {
            return Err(Error::network(message.clone()));
        }
        state
            .graphs
            .get(address)
            .cloned()
            .ok_or_else(|| Error::network(format!("no multisig info for {address}")))
    }

    async fn announce(&self, transaction: &SignedTransaction) -> Result<()> {
        let mut state = lock(&self.inner);
        Self::check_announce(&state, &transaction.hash)?;
        state.announced.push(transaction.hash.clone());
        Ok(())
    }

    async fn announce_aggregate_bonded(&self, transaction: &SignedTransaction) -> Result<()> {
        let mut state = lock(&self.inner);
        Self::check_announce(&state, &transaction.hash)?;
        state.announced_bonded.push(transaction.hash.clone());
        Ok(())
    }

    async fn announce_cosignature(
        &self,
        cosignature: &CosignatureSignedTransaction,
    ) -> Result<()> {
        let mut state = lock(&self.inner);
        Self::check_announce(&state, &cosignature.parent_hash)?;
        state.cosignatures.push(cosignature.parent_hash.clone());
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────
// FakeTransport
// ─────────────────────────────────────────────────────────────────

/// How the fake network reacts when a hash is awaited
#[derive(Debug, Clone)]
pub enum Confirmation {
    Immediate,
    After(Duration),
    Never,
    Fail(String),
}

/// What a fake handle stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleKind {
    Listener,
    Stream(Channel),
}

#[derive(Debug, Clone)]
struct HandleRecord {
    address: Address,
    kind: HandleKind,
    closes: u32,
}

#[derive(Debug, Default)]
struct TransportState {
    handles: Vec<HandleRecord>,
    failing_closes: HashSet<Channel>,
    fail_listener_close: bool,
    failing_subscribes: HashSet<Channel>,
    fail_open: bool,
    stall_open: bool,
    confirmations: HashMap<TransactionHash, Confirmation>,
    awaited: Vec<(Channel, TransactionHash)>,
    /// Live stream sinks keyed by the id of the stream handle feeding them
    sinks: HashMap<usize, (Address, Channel, mpsc::Sender<Notification>)>,
}

/// In-memory notification transport that tracks every handle it hands out
#[derive(Debug, Clone, Default)]
pub struct FakeTransport {
    inner: Arc<Mutex<TransportState>>,
}

/// Handle returned by [`FakeTransport`] for listeners and streams
#[derive(Debug)]
pub struct FakeHandle {
    id: usize,
    fail_close: bool,
    log: Arc<Mutex<TransportState>>,
}

impl FakeHandle {
    pub fn id(&self) -> usize {
        self.id
    }
}

impl Closable for FakeHandle {
    async fn close(&mut self) -> Result<()> {
        let mut state = lock(&self.log);
        if let Some(record) = state.handles.get_mut(self.id) {
            record.closes += 1;
        }
        state.sinks.remove(&self.id);
        if self.fail_close {
            return Err(Error::resource_cleanup(format!("handle {} refused to close", self.id)));
        }
        Ok(())
    }
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Closing any stream on `channel` reports an error (the close is still counted)
    pub fn fail_close_on(&self, channel: Channel) {
        lock(&self.inner).failing_closes.insert(channel);
    }

    pub fn fail_listener_close(&self) {
        lock(&self.inner).fail_listener_close = true;
    }

    pub fn fail_subscribe_on(&self, channel: Channel) {
        lock(&self.inner).failing_subscribes.insert(channel);
    }

    pub fn fail_open(&self) {
        lock(&self.inner).fail_open = true;
    }

    /// Opening a listener never completes
    pub fn stall_open(&self) {
        lock(&self.inner).stall_open = true;
    }

    pub fn set_confirmation(&self, hash: &TransactionHash, confirmation: Confirmation) {
        lock(&self.inner)
            .confirmations
            .insert(hash.clone(), confirmation);
    }

    /// Number of listeners opened so far (any address)
    pub fn listeners_opened(&self) -> usize {
        self.count(|r| r.kind == HandleKind::Listener)
    }

    pub fn streams_opened(&self) -> usize {
        self.count(|r| matches!(r.kind, HandleKind::Stream(_)))
    }

    /// Listeners opened for one address
    pub fn listeners_opened_for(&self, address: &Address) -> usize {
        self.count(|r| r.kind == HandleKind::Listener && &r.address == address)
    }

    /// Total close calls across every handle
    pub fn close_calls(&self) -> u32 {
        lock(&self.inner).handles.iter().map(|r| r.closes).sum()
    }

    /// Handles that have not been closed yet
    pub fn open_handles(&self) -> usize {
        self.count(|r| r.closes == 0)
    }

    /// True when every handle ever opened was closed exactly once
    pub fn all_closed_exactly_once(&self) -> bool {
        lock(&self.inner).handles.iter().all(|r| r.closes == 1)
    }

    /// Handle kinds in the order they were closed is not tracked; this gives
    /// the per-handle close counts in opening order
    pub fn close_counts(&self) -> Vec<(HandleKind, u32)> {
        lock(&self.inner)
            .handles
            .iter()
            .map(|r| (r.kind, r.closes))
            .collect()
    }

    pub fn awaited(&self) -> Vec<(Channel, TransactionHash)> {
        lock(&self.inner).awaited.clone()
    }

    /// Deliver a notification to every live sink subscribed on `channel` for `address`
    pub async fn push(&self, address: &Address, channel: Channel, hash: Option<TransactionHash>) {
        let sinks: Vec<_> = lock(&self.inner)
            .sinks
            .values()
            .filter(|(a, c, _)| a == address && *c == channel)
            .map(|(_, _, tx)| tx.clone())
            .collect();

        for sink in sinks {
            let _ = sink
                .send(Notification {
                    channel,
                    address: address.clone(),
                    hash: hash.clone(),
                    detail: None,
                })
                .await;
        }
    }

    fn count(&self, predicate: impl Fn(&HandleRecord) -> bool) -> usize {
        lock(&self.inner).handles.iter().filter(|r| predicate(r)).count()
    }

    fn register(&self, address: &Address, kind: HandleKind, fail_close: bool) -> FakeHandle {
        let mut state = lock(&self.inner);
        Self::register_locked(&mut state, &self.inner, address, kind, fail_close)
    }

    fn register_locked(
        state: &mut TransportState,
        inner: &Arc<Mutex<TransportState>>,
        address: &Address,
        kind: HandleKind,
        fail_close: bool,
    ) -> FakeHandle {
        let id = state.handles.len();
        state.handles.push(HandleRecord {
            address: address.clone(),
            kind,
            closes: 0,
        });
        FakeHandle {
            id,
            fail_close,
            log: Arc::clone(inner),
        }
    }
}

impl NotificationTransport for FakeTransport {
    type Listener = FakeHandle;
    type Stream = FakeHandle;

    async fn open(&self, address: &Address) -> Result<FakeHandle> {
        let (stall, fail_close) = {
            let state = lock(&self.inner);
            if state.fail_open {
                return Err(Error::network(format!("listener for {address} refused")));
            }
            (state.stall_open, state.fail_listener_close)
        };
        if stall {
            std::future::pending::<()>().await;
        }
        Ok(self.register(address, HandleKind::Listener, fail_close))
    }

    async fn subscribe(
        &self,
        _listener: &mut FakeHandle,
        channel: Channel,
        address: &Address,
        sink: mpsc::Sender<Notification>,
    ) -> Result<FakeHandle> {
        let mut state = lock(&self.inner);
        if state.failing_subscribes.contains(&channel) {
            return Err(Error::network(format!("{channel} subscription refused")));
        }
        let fail_close = state.failing_closes.contains(&channel);
        let stream = Self::register_locked(
            &mut state,
            &self.inner,
            address,
            HandleKind::Stream(channel),
            fail_close,
        );
        state
            .sinks
            .insert(stream.id, (address.clone(), channel, sink));
        Ok(stream)
    }

    async fn await_event(
        &self,
        _listener: &mut FakeHandle,
        channel: Channel,
        _address: &Address,
        hash: &TransactionHash,
    ) -> Result<()> {
        let confirmation = {
            let mut state = lock(&self.inner);
            state.awaited.push((channel, hash.clone()));
            state
                .confirmations
                .get(hash)
                .cloned()
                .unwrap_or(Confirmation::Immediate)
        };

        match confirmation {
            Confirmation::Immediate => Ok(()),
            Confirmation::After(delay) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            Confirmation::Never => std::future::pending().await,
            Confirmation::Fail(message) => Err(Error::network(message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_codec_is_deterministic_and_distinct() {
        let a = test_address(1, NetworkType::TestNet);
        let b = test_address(2, NetworkType::TestNet);
        assert_eq!(a, test_address(1, NetworkType::TestNet));
        assert_ne!(a, b);
        assert_eq!(a.network_type(), Some(NetworkType::TestNet));
    }

    #[test]
    fn test_account_matches_codec() {
        let account = test_account(7, "seven", NetworkType::MainNet);
        let derived = PrefixCodec
            .address_from_public_key(&account.public_key, NetworkType::MainNet)
            .unwrap();
        assert_eq!(derived, account.address);
    }

    #[tokio::test]
    async fn test_fake_ledger_account_lookup() {
        let ledger = FakeLedger::new();
        let account = test_account(1, "one", NetworkType::TestNet);
        ledger.insert_known(&account);

        let info = ledger.account_info(&account.address).await.unwrap();
        assert_eq!(info.address, account.address);

        let missing = ledger
            .account_info(&test_address(2, NetworkType::TestNet))
            .await;
        assert!(matches!(missing, Err(Error::Network { .. })));
        assert_eq!(ledger.account_info_calls().len(), 2);
    }

    #[tokio::test]
    async fn test_fake_ledger_announce_failure() {
        let ledger = FakeLedger::new();
        let tx = test_signed(9, TransactionKind::Transfer, 1);
        ledger.fail_announce(&tx.hash, "Failure_Core_Insufficient_Balance");

        let err = ledger.announce(&tx).await.unwrap_err();
        assert!(err.to_string().contains("Insufficient_Balance"));
        assert!(ledger.announced().is_empty());
    }

    #[tokio::test]
    async fn test_fake_transport_tracks_closes() {
        let transport = FakeTransport::new();
        let address = test_address(1, NetworkType::TestNet);
        let (tx, _rx) = mpsc::channel(4);

        let mut listener = transport.open(&address).await.unwrap();
        let mut stream = transport
            .subscribe(&mut listener, Channel::Confirmed, &address, tx)
            .await
            .unwrap();
        assert_eq!(transport.open_handles(), 2);

        tokio_test::assert_ok!(stream.close().await);
        tokio_test::assert_ok!(listener.close().await);
        assert!(transport.all_closed_exactly_once());
    }

    #[tokio::test]
    async fn test_fake_transport_failing_close_still_counts() {
        let transport = FakeTransport::new();
        transport.fail_close_on(Channel::Status);
        let address = test_address(1, NetworkType::TestNet);
        let (tx, _rx) = mpsc::channel(4);

        let mut listener = transport.open(&address).await.unwrap();
        let mut stream = transport
            .subscribe(&mut listener, Channel::Status, &address, tx)
            .await
            .unwrap();

        assert!(stream.close().await.is_err());
        assert_eq!(transport.close_calls(), 1);
    }

    #[tokio::test]
    async fn test_push_reaches_subscribed_sink() {
        let transport = FakeTransport::new();
        let address = test_address(3, NetworkType::TestNet);
        let (tx, mut rx) = mpsc::channel(4);

        let mut listener = transport.open(&address).await.unwrap();
        let _stream = transport
            .subscribe(&mut listener, Channel::Confirmed, &address, tx)
            .await
            .unwrap();

        transport
            .push(&address, Channel::Confirmed, Some(test_hash(5)))
            .await;
        let notification = rx.recv().await.unwrap();
        assert_eq!(notification.channel, Channel::Confirmed);
        assert_eq!(notification.hash, Some(test_hash(5)));
    }

    #[tokio::test]
    async fn test_push_after_stream_close_is_not_delivered() {
        let transport = FakeTransport::new();
        let address = test_address(3, NetworkType::TestNet);
        let (tx, mut rx) = mpsc::channel(4);

        let mut listener = transport.open(&address).await.unwrap();
        let mut stream = transport
            .subscribe(&mut listener, Channel::Confirmed, &address, tx)
            .await
            .unwrap();
        tokio_test::assert_ok!(stream.close().await);

        transport
            .push(&address, Channel::Confirmed, Some(test_hash(5)))
            .await;

        // The only sender went away with the closed stream
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_confirmation() {
        let transport = FakeTransport::new();
        let address = test_address(1, NetworkType::TestNet);
        let hash = test_hash(4);
        transport.set_confirmation(&hash, Confirmation::After(Duration::from_secs(5)));

        let mut listener = transport.open(&address).await.unwrap();
        let start = tokio::time::Instant::now();
        transport
            .await_event(&mut listener, Channel::Confirmed, &address, &hash)
            .await
            .unwrap();
        assert!(start.elapsed() >= Duration::from_secs(5));
    }
}
