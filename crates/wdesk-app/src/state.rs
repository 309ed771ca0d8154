//! Session state (the Model)
//!
//! One [`SessionState`] exists per running session core. It is only mutated
//! through [`crate::handler::update`]; everything else reads snapshots.

use chrono::{DateTime, Local};
use wdesk_core::{
    Account, AccountInfo, Address, MultisigGraph, NetworkType, PublicKey, SignedTransaction,
    Signer, Transaction, TransactionHash,
};

/// Where the session is in its account lifecycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Lifecycle {
    #[default]
    Uninitialized,
    Initialized(Address),
}

impl Lifecycle {
    pub fn is_initialized_for(&self, address: &Address) -> bool {
        matches!(self, Lifecycle::Initialized(current) if current == address)
    }

    pub fn address(&self) -> Option<&Address> {
        match self {
            Lifecycle::Initialized(address) => Some(address),
            Lifecycle::Uninitialized => None,
        }
    }
}

/// Account and signer identity, signers, and the transaction stage
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub network_type: NetworkType,
    pub lifecycle: Lifecycle,

    // Identity
    pub current_account: Option<Account>,
    pub current_account_address: Option<Address>,
    pub current_signer_public_key: Option<PublicKey>,
    pub current_signer_address: Option<Address>,
    /// True iff the signer differs from the account
    pub is_cosignatory_mode: bool,

    // Derived identity data
    pub signers: Vec<Signer>,
    pub known_accounts: Vec<Account>,
    /// Deduplicated union of signer and known account addresses
    pub known_addresses: Vec<Address>,

    // Network data for the current account
    pub account_info: Option<AccountInfo>,
    pub multisig_graph: Option<MultisigGraph>,
    pub account_info_loaded_at: Option<DateTime<Local>>,

    // Transaction stage
    pub staged_transactions: Vec<Transaction>,
    pub signed_transactions: Vec<SignedTransaction>,
}

impl SessionState {
    pub fn new(network_type: NetworkType) -> Self {
        Self {
            network_type,
            ..Default::default()
        }
    }

    /// The signer entry matching the current signer address
    pub fn current_signer(&self) -> Option<&Signer> {
        let address = self.current_signer_address.as_ref()?;
        self.signers.iter().find(|s| &s.address == address)
    }

    pub fn is_signed(&self, hash: &TransactionHash) -> bool {
        self.signed_transactions.iter().any(|t| &t.hash == hash)
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Initialized(_))
    }

    /// Look up a signer by public key
    pub fn signer_by_public_key(&self, public_key: &PublicKey) -> Option<&Signer> {
        self.signers.iter().find(|s| &s.public_key == public_key)
    }
}
