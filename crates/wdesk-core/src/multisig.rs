//! Multisig graph info as fetched from the ledger network
//!
//! The graph is organised in levels around the queried account (level 0).
//! Wallet Desk only ever tests address membership against it, so no
//! traversal semantics beyond "which entries list this cosignatory" are
//! modelled here.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{Address, PublicKey};

/// Multisig configuration of a single account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultisigAccountInfo {
    pub account_address: Address,
    pub account_public_key: PublicKey,
    pub min_approval: u32,
    pub min_removal: u32,
    /// Accounts allowed to cosign for this account
    #[serde(default)]
    pub cosignatory_addresses: Vec<Address>,
    /// Multisig accounts this account cosigns for
    #[serde(default)]
    pub multisig_addresses: Vec<Address>,
}

impl MultisigAccountInfo {
    /// An account is multisig once it has at least one cosignatory
    pub fn is_multisig(&self) -> bool {
        !self.cosignatory_addresses.is_empty()
    }

    pub fn has_cosignatory(&self, address: &Address) -> bool {
        self.cosignatory_addresses.contains(address)
    }
}

/// Tree of cosignatory relationships, keyed by level
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultisigGraph {
    pub levels: BTreeMap<i32, Vec<MultisigAccountInfo>>,
}

impl MultisigGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion used by fixtures and repository adapters
    pub fn with_entry(mut self, level: i32, info: MultisigAccountInfo) -> Self {
        self.levels.entry(level).or_default().push(info);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.levels.values().all(Vec::is_empty)
    }

    /// All entries, lowest level first, preserving per-level order
    pub fn entries(&self) -> impl Iterator<Item = &MultisigAccountInfo> {
        self.levels.values().flatten()
    }

    pub fn find(&self, address: &Address) -> Option<&MultisigAccountInfo> {
        self.entries().find(|info| &info.account_address == address)
    }
}
