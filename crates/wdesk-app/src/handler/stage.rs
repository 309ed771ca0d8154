//! Transaction stage handlers
//!
//! Both lists are sequences: insertion order is the order aggregates are
//! built and announced in.

use wdesk_core::{SignedTransaction, Transaction, TransactionHash};

use crate::session_event::SessionEvent;
use crate::state::SessionState;

use super::UpdateResult;

pub fn handle_stage(state: &mut SessionState, transaction: Transaction) -> UpdateResult {
    state.staged_transactions.push(transaction);
    UpdateResult::event(SessionEvent::TransactionStaged {
        staged: state.staged_transactions.len(),
    })
}

pub fn handle_clear_stage(state: &mut SessionState) -> UpdateResult {
    state.staged_transactions.clear();
    UpdateResult::event(SessionEvent::StageCleared)
}

pub fn handle_sign(state: &mut SessionState, transaction: SignedTransaction) -> UpdateResult {
    let hash = transaction.hash.clone();
    state.signed_transactions.push(transaction);
    UpdateResult::event(SessionEvent::TransactionSigned { hash })
}

/// Stable removal of the first match; unknown hashes are ignored
pub fn handle_unsign(state: &mut SessionState, hash: &TransactionHash) -> UpdateResult {
    match state
        .signed_transactions
        .iter()
        .position(|t| &t.hash == hash)
    {
        Some(index) => {
            state.signed_transactions.remove(index);
            UpdateResult::event(SessionEvent::TransactionUnsigned { hash: hash.clone() })
        }
        None => UpdateResult::none(),
    }
}

pub fn handle_reset_transactions(state: &mut SessionState) -> UpdateResult {
    state.staged_transactions.clear();
    state.signed_transactions.clear();
    UpdateResult::event(SessionEvent::TransactionsReset)
}
