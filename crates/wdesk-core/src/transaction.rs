//! Transactions as seen by the session core
//!
//! Payloads are opaque: serialization and signing happen in the SDK layer.
//! The session core only needs the kind, the signer and the content hash.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{NetworkType, PublicKey, TransactionHash};

/// Transaction families the front-end composes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Transfer,
    AggregateComplete,
    AggregateBonded,
    HashLock,
    NamespaceRegistration,
    MosaicDefinition,
    MultisigModification,
}

impl TransactionKind {
    pub fn is_aggregate(self) -> bool {
        matches!(
            self,
            TransactionKind::AggregateComplete | TransactionKind::AggregateBonded
        )
    }
}

/// A composed transaction waiting for a signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub kind: TransactionKind,
    pub network_type: NetworkType,
    /// Account expected to sign; `None` means the current signer
    pub signer: Option<PublicKey>,
    pub max_fee: u64,
    pub deadline: DateTime<Utc>,
    /// Serialized body, hex encoded by the SDK
    pub payload: String,
}

/// A signed transaction awaiting announcement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub kind: TransactionKind,
    pub network_type: NetworkType,
    pub signer_public_key: PublicKey,
    pub hash: TransactionHash,
    pub payload: String,
}

/// A cosignature for an aggregate-bonded transaction already on the network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CosignatureSignedTransaction {
    pub parent_hash: TransactionHash,
    pub signer_public_key: PublicKey,
    pub signature: String,
}
