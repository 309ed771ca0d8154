//! Mutation types for the session reducer (TEA pattern)

use wdesk_core::{
    Account, AccountInfo, Address, MultisigGraph, PublicKey, SignedTransaction, Signer,
    Transaction, TransactionHash,
};

/// All state changes the session core can apply
#[derive(Debug, Clone)]
pub enum Mutation {
    // ─────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────
    /// Mark the session initialized for an account address
    Initialize(Address),

    /// Mark the session uninitialized if it was initialized for this address
    Uninitialize(Address),

    /// Return to the pristine state, keeping the network type
    Reset,

    // ─────────────────────────────────────────────────────────
    // Identity
    // ─────────────────────────────────────────────────────────
    /// Replace the current account
    SetCurrentAccount(Account),

    /// Apply a signer switch; addresses are resolved by the controller
    SetCurrentSigner {
        public_key: PublicKey,
        signer_address: Address,
        account_address: Address,
        known_accounts: Vec<Account>,
    },

    /// Store freshly loaded network data and resolved signers
    AccountInfoLoaded {
        info: Option<AccountInfo>,
        graph: Option<MultisigGraph>,
        signers: Vec<Signer>,
    },

    /// Change the display label of an account
    RenameAccount { address: Address, label: String },

    // ─────────────────────────────────────────────────────────
    // Transaction Stage
    // ─────────────────────────────────────────────────────────
    Stage(Transaction),
    ClearStage,
    Sign(SignedTransaction),
    /// Remove the first signed transaction with this hash
    Unsign(TransactionHash),
    /// Drop staged and signed transactions
    ResetTransactions,
}
