//! Ledger network repository seam
//!
//! The request/response half of the network: account lookups, multisig graph
//! lookups and the three announce endpoints. Failures surface as
//! [`Error::Network`](wdesk_core::Error::Network) with the remote description.

use wdesk_core::prelude::*;
use wdesk_core::{
    AccountInfo, Address, CosignatureSignedTransaction, MultisigGraph, SignedTransaction,
};

/// Request/response access to the ledger network
#[trait_variant::make(LedgerRepository: Send)]
pub trait LocalLedgerRepository {
    /// Fetch on-chain info for an account
    async fn account_info(&self, address: &Address) -> Result<AccountInfo>;

    /// Fetch the multisig graph rooted at an account
    async fn multisig_graph(&self, address: &Address) -> Result<MultisigGraph>;

    /// Announce a fully signed transaction
    async fn announce(&self, transaction: &SignedTransaction) -> Result<()>;

    /// Announce an aggregate-bonded transaction to the partial pool
    async fn announce_aggregate_bonded(&self, transaction: &SignedTransaction) -> Result<()>;

    /// Announce a cosignature for a transaction in the partial pool
    async fn announce_cosignature(&self, cosignature: &CosignatureSignedTransaction)
        -> Result<()>;
}
