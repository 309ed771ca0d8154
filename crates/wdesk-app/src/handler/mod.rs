//! Handler module - reducer and mutation handlers (TEA pattern)
//!
//! Organized into submodules:
//! - `identity`: Lifecycle, account and signer mutations
//! - `stage`: Staged and signed transaction mutations

pub(crate) mod identity;
pub(crate) mod stage;


use crate::message::Mutation;
use crate::session_event::SessionEvent;
use crate::state::SessionState;

/// Events produced by applying a mutation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateResult {
    pub events: Vec<SessionEvent>,
}

impl UpdateResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn event(event: SessionEvent) -> Self {
        Self {
            events: vec![event],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Apply a mutation to the state and report what observers should hear
pub fn update(state: &mut SessionState, mutation: Mutation) -> UpdateResult {
    match mutation {
        Mutation::Initialize(address) => identity::handle_initialize(state, address),
        Mutation::Uninitialize(address) => identity::handle_uninitialize(state, address),
        Mutation::Reset => identity::handle_reset(state),
        Mutation::SetCurrentAccount(account) => identity::handle_set_current_account(state, account),
        Mutation::SetCurrentSigner {
            public_key,
            signer_address,
            account_address,
            known_accounts,
        } => identity::handle_set_current_signer(
            state,
            public_key,
            signer_address,
            account_address,
            known_accounts,
        ),
        Mutation::AccountInfoLoaded {
            info,
            graph,
            signers,
        } => identity::handle_account_info_loaded(state, info, graph, signers),
        Mutation::RenameAccount { address, label } => {
            identity::handle_rename_account(state, address, label)
        }

        Mutation::Stage(transaction) => stage::handle_stage(state, transaction),
        Mutation::ClearStage => stage::handle_clear_stage(state),
        Mutation::Sign(transaction) => stage::handle_sign(state, transaction),
        Mutation::Unsign(hash) => stage::handle_unsign(state, &hash),
        Mutation::ResetTransactions => stage::handle_reset_transactions(state),
    }
}
