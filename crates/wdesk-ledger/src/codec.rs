//! Address derivation seam
//!
//! Turning a public key into an address is SDK cryptography (hash + checksum
//! + base32). The session core only needs the mapping, so it consumes it
//! through this trait.

use wdesk_core::prelude::*;
use wdesk_core::{Address, NetworkType, PublicKey};

/// Derives the on-chain address owned by a public key
pub trait AddressCodec: Send + Sync {
    fn address_from_public_key(
        &self,
        public_key: &PublicKey,
        network_type: NetworkType,
    ) -> Result<Address>;
}

impl<F> AddressCodec for F
where
    F: Fn(&PublicKey, NetworkType) -> Result<Address> + Send + Sync,
{
    fn address_from_public_key(
        &self,
        public_key: &PublicKey,
        network_type: NetworkType,
    ) -> Result<Address> {
        self(public_key, network_type)
    }
}
