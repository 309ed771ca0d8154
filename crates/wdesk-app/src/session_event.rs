//! Domain events published to session observers
//!
//! Events are broadcast on the store's `tokio::sync::broadcast` channel after
//! the mutation that caused them has been applied, so a subscriber reading
//! the store on receipt sees the post-change state.

use wdesk_core::{Address, TransactionHash};
use wdesk_ledger::Notification;

/// Domain events emitted by the session core for external consumers.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    // ─────────────────────────────────────────────────────────
    // Session Lifecycle
    // ─────────────────────────────────────────────────────────
    /// The session was initialized for an account
    Initialized { address: Address },

    /// The session for an account was torn down
    Uninitialized { address: Address },

    /// Session state was reset to its pristine value (logout)
    Reset,

    // ─────────────────────────────────────────────────────────
    // Identity
    // ─────────────────────────────────────────────────────────
    /// A different account became current
    AccountChanged { address: Address },

    /// An account label changed
    AccountRenamed { address: Address, label: String },

    /// The acting signer changed
    SignerChanged {
        previous: Option<Address>,
        current: Address,
        cosignatory_mode: bool,
    },

    /// Account info and signers were (re)loaded for the current account
    AccountInfoLoaded {
        address: Address,
        signers: usize,
        multisig_available: bool,
    },

    // ─────────────────────────────────────────────────────────
    // Transaction Stage
    // ─────────────────────────────────────────────────────────
    /// A transaction was appended to the stage
    TransactionStaged { staged: usize },

    /// The stage was emptied
    StageCleared,

    /// Signed and staged transactions were dropped
    TransactionsReset,

    /// A signed transaction is waiting for announcement
    TransactionSigned { hash: TransactionHash },

    /// A signed transaction left the signed list
    TransactionUnsigned { hash: TransactionHash },

    // ─────────────────────────────────────────────────────────
    // Network
    // ─────────────────────────────────────────────────────────
    /// An announce operation finished
    BroadcastCompleted {
        hash: TransactionHash,
        success: bool,
        error: Option<String>,
    },

    /// A stream subscription delivered a notification
    Notification(Notification),
}

impl SessionEvent {
    /// Returns a short string label for this event type (for logging/debugging).
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Initialized { .. } => "initialized",
            Self::Uninitialized { .. } => "uninitialized",
            Self::Reset => "reset",
            Self::AccountChanged { .. } => "account_changed",
            Self::AccountRenamed { .. } => "account_renamed",
            Self::SignerChanged { .. } => "signer_changed",
            Self::AccountInfoLoaded { .. } => "account_info_loaded",
            Self::TransactionStaged { .. } => "transaction_staged",
            Self::StageCleared => "stage_cleared",
            Self::TransactionsReset => "transactions_reset",
            Self::TransactionSigned { .. } => "transaction_signed",
            Self::TransactionUnsigned { .. } => "transaction_unsigned",
            Self::BroadcastCompleted { .. } => "broadcast_completed",
            Self::Notification(_) => "notification",
        }
    }
}
