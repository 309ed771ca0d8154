//! Lifecycle, account and signer handlers

use chrono::Local;
use wdesk_core::{Account, AccountInfo, Address, MultisigGraph, PublicKey, Signer};

use crate::session_event::SessionEvent;
use crate::signers::known_addresses;
use crate::state::{Lifecycle, SessionState};

use super::UpdateResult;

pub fn handle_initialize(state: &mut SessionState, address: Address) -> UpdateResult {
    if state.lifecycle.is_initialized_for(&address) {
        return UpdateResult::none();
    }
    state.lifecycle = Lifecycle::Initialized(address.clone());
    UpdateResult::event(SessionEvent::Initialized { address })
}

pub fn handle_uninitialize(state: &mut SessionState, address: Address) -> UpdateResult {
    if !state.lifecycle.is_initialized_for(&address) {
        return UpdateResult::none();
    }
    state.lifecycle = Lifecycle::Uninitialized;
    // No acting signer outside a session; the account stays selected
    state.current_signer_public_key = None;
    state.current_signer_address = None;
    state.is_cosignatory_mode = false;
    UpdateResult::event(SessionEvent::Uninitialized { address })
}

pub fn handle_reset(state: &mut SessionState) -> UpdateResult {
    *state = SessionState::new(state.network_type);
    UpdateResult::event(SessionEvent::Reset)
}

pub fn handle_set_current_account(state: &mut SessionState, account: Account) -> UpdateResult {
    // Network data belongs to the previous account
    state.account_info = None;
    state.multisig_graph = None;
    state.account_info_loaded_at = None;
    state.signers.clear();
    state.current_account = Some(account);
    UpdateResult::none()
}

pub fn handle_set_current_signer(
    state: &mut SessionState,
    public_key: PublicKey,
    signer_address: Address,
    account_address: Address,
    known_accounts: Vec<Account>,
) -> UpdateResult {
    let previous = state.current_signer_address.take();
    let cosignatory_mode = signer_address != account_address;

    state.current_signer_public_key = Some(public_key);
    state.current_signer_address = Some(signer_address.clone());
    state.current_account_address = Some(account_address);
    state.is_cosignatory_mode = cosignatory_mode;
    state.known_addresses = known_addresses(&state.signers, &known_accounts);
    state.known_accounts = known_accounts;

    UpdateResult::event(SessionEvent::SignerChanged {
        previous,
        current: signer_address,
        cosignatory_mode,
    })
}

pub fn handle_account_info_loaded(
    state: &mut SessionState,
    info: Option<AccountInfo>,
    graph: Option<MultisigGraph>,
    signers: Vec<Signer>,
) -> UpdateResult {
    let Some(address) = state.current_account_address.clone() else {
        return UpdateResult::none();
    };

    let multisig_available = graph.is_some();
    state.account_info = info;
    state.multisig_graph = graph;
    state.known_addresses = known_addresses(&signers, &state.known_accounts);
    state.signers = signers;
    state.account_info_loaded_at = Some(Local::now());

    UpdateResult::event(SessionEvent::AccountInfoLoaded {
        address,
        signers: state.signers.len(),
        multisig_available,
    })
}

pub fn handle_rename_account(
    state: &mut SessionState,
    address: Address,
    label: String,
) -> UpdateResult {
    let mut renamed = false;

    if let Some(account) = state
        .current_account
        .as_mut()
        .filter(|a| a.address == address)
    {
        account.rename(label.clone());
        renamed = true;
    }
    for account in state.known_accounts.iter_mut().filter(|a| a.address == address) {
        account.rename(label.clone());
        renamed = true;
    }
    for signer in state.signers.iter_mut().filter(|s| s.address == address) {
        signer.label = label.clone();
        renamed = true;
    }

    if renamed {
        UpdateResult::event(SessionEvent::AccountRenamed { address, label })
    } else {
        UpdateResult::none()
    }
}
