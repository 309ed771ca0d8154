//! Profile access
//!
//! The active profile is the local wallet: the set of imported accounts the
//! session labels signers with. Storage is owned elsewhere.

use wdesk_core::{Account, NetworkType};

/// Read access to the accounts of the active profile
#[cfg_attr(test, mockall::automock)]
pub trait ProfileStore: Send + Sync {
    fn known_accounts(&self) -> Vec<Account>;
}

/// Fixed list of accounts
#[derive(Debug, Clone, Default)]
pub struct StaticProfile {
    accounts: Vec<Account>,
}

impl StaticProfile {
    pub fn new(accounts: Vec<Account>) -> Self {
        Self { accounts }
    }
}

impl ProfileStore for StaticProfile {
    fn known_accounts(&self) -> Vec<Account> {
        self.accounts.clone()
    }
}

/// Known accounts restricted to one network
pub fn accounts_on(profile: &dyn ProfileStore, network_type: NetworkType) -> Vec<Account> {
    profile
        .known_accounts()
        .into_iter()
        .filter(|a| a.network_type == network_type)
        .collect()
}
