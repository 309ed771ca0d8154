//! Signer resolution
//!
//! Pure functions deriving the acting identities available to the current
//! account. Missing multisig data is never an error: it simply yields the
//! account on its own.

use wdesk_core::{Account, Address, MultisigGraph, NetworkType, Signer};

/// Resolve the signers available to `current`.
///
/// The account itself always comes first. It is followed by every multisig
/// account in `graph` that lists `current` as a cosignatory, in graph order
/// (lowest level first), each once. Labels come from `known_accounts` on the
/// same network, falling back to a truncated address.
pub fn resolve_signers(
    network_type: NetworkType,
    known_accounts: &[Account],
    current: &Account,
    graph: Option<&MultisigGraph>,
) -> Vec<Signer> {
    let own_entry = graph.and_then(|g| g.find(&current.address));

    let mut signers = vec![Signer {
        label: current.label.clone(),
        public_key: current.public_key.clone(),
        address: current.address.clone(),
        is_multisig: own_entry.is_some_and(|e| e.is_multisig()),
    }];

    let Some(graph) = graph else {
        return signers;
    };

    for entry in graph.entries() {
        if !entry.has_cosignatory(&current.address) {
            continue;
        }
        if signers.iter().any(|s| s.address == entry.account_address) {
            continue;
        }
        signers.push(Signer {
            label: label_for(network_type, known_accounts, &entry.account_address),
            public_key: entry.account_public_key.clone(),
            address: entry.account_address.clone(),
            is_multisig: true,
        });
    }

    signers
}

/// Local name for an address, or its truncated form
fn label_for(network_type: NetworkType, known_accounts: &[Account], address: &Address) -> String {
    known_accounts
        .iter()
        .find(|a| a.network_type == network_type && &a.address == address)
        .map(|a| a.label.clone())
        .unwrap_or_else(|| address.short_label())
}

/// Deduplicated union of signer addresses followed by known account addresses
pub fn known_addresses(signers: &[Signer], known_accounts: &[Account]) -> Vec<Address> {
    let mut addresses: Vec<Address> = Vec::with_capacity(signers.len() + known_accounts.len());
    let candidates = signers
        .iter()
        .map(|s| &s.address)
        .chain(known_accounts.iter().map(|a| &a.address));

    for address in candidates {
        if !addresses.contains(address) {
            addresses.push(address.clone());
        }
    }
    addresses
}
