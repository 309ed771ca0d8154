//! Identity primitives shared across all Wallet Desk crates
//!
//! Addresses, public keys and transaction hashes are validated newtypes over
//! their canonical string form. Construction goes through `parse`, which
//! normalizes case and separators and rejects malformed input with
//! [`Error::InvalidArgument`].

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Raw (unformatted) address: 39 base32 characters.
static ADDRESS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z2-7]{39}$").expect("Invalid address pattern regex"));

/// 32-byte value encoded as 64 hex characters (keys and hashes).
static HEX32_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9A-F]{64}$").expect("Invalid hex pattern regex"));

/// Number of address characters kept in a fallback display label
pub const SHORT_ADDRESS_LEN: usize = 13;

// ─────────────────────────────────────────────────────────────────
// NetworkType
// ─────────────────────────────────────────────────────────────────

/// Ledger network an identity belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkType {
    MainNet,
    #[default]
    TestNet,
    PrivateNet,
    PrivateTestNet,
}

impl NetworkType {
    /// Numeric network identifier used on the wire
    pub fn identifier(self) -> u8 {
        match self {
            NetworkType::MainNet => 104,
            NetworkType::TestNet => 152,
            NetworkType::PrivateNet => 120,
            NetworkType::PrivateTestNet => 168,
        }
    }

    /// First character of every raw address on this network
    pub fn address_prefix(self) -> char {
        match self {
            NetworkType::MainNet => 'N',
            NetworkType::TestNet => 'T',
            NetworkType::PrivateNet => 'P',
            NetworkType::PrivateTestNet => 'V',
        }
    }

    pub fn from_address_prefix(prefix: char) -> Option<Self> {
        match prefix {
            'N' => Some(NetworkType::MainNet),
            'T' => Some(NetworkType::TestNet),
            'P' => Some(NetworkType::PrivateNet),
            'V' => Some(NetworkType::PrivateTestNet),
            _ => None,
        }
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NetworkType::MainNet => "mainnet",
            NetworkType::TestNet => "testnet",
            NetworkType::PrivateNet => "privatenet",
            NetworkType::PrivateTestNet => "privatetestnet",
        };
        f.write_str(name)
    }
}

// ─────────────────────────────────────────────────────────────────
// Address
// ─────────────────────────────────────────────────────────────────

/// On-chain account address in raw form (no dashes, upper case)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Parse a raw or pretty (dash separated) address.
    pub fn parse(input: &str) -> Result<Self> {
        let raw: String = input
            .trim()
            .chars()
            .filter(|c| *c != '-')
            .map(|c| c.to_ascii_uppercase())
            .collect();

        if raw.is_empty() {
            return Err(Error::invalid_argument("address is required"));
        }
        if !ADDRESS_PATTERN.is_match(&raw) {
            return Err(Error::invalid_argument(format!("malformed address: {input}")));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Network encoded in the address prefix
    pub fn network_type(&self) -> Option<NetworkType> {
        self.0.chars().next().and_then(NetworkType::from_address_prefix)
    }

    /// Dash separated form, six characters per group
    pub fn pretty(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        chars
            .chunks(6)
            .map(|chunk| chunk.iter().collect::<String>())
            .collect::<Vec<_>>()
            .join("-")
    }

    /// Truncated label used when no local name is known for the address
    pub fn short_label(&self) -> String {
        let head: String = self.pretty().chars().take(SHORT_ADDRESS_LEN).collect();
        format!("{head}...")
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Address {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Address::parse(&value)
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.0
    }
}

// ─────────────────────────────────────────────────────────────────
// PublicKey / TransactionHash
// ─────────────────────────────────────────────────────────────────

fn parse_hex32(input: &str, what: &str) -> Result<String> {
    let normalized = input.trim().to_ascii_uppercase();
    if normalized.is_empty() {
        return Err(Error::invalid_argument(format!("{what} is required")));
    }
    if !HEX32_PATTERN.is_match(&normalized) {
        return Err(Error::invalid_argument(format!("malformed {what}: {input}")));
    }
    Ok(normalized)
}

/// Account public key, 64 upper case hex characters
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PublicKey(String);

impl PublicKey {
    pub fn parse(input: &str) -> Result<Self> {
        parse_hex32(input, "public key").map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PublicKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        PublicKey::parse(&value)
    }
}

impl From<PublicKey> for String {
    fn from(value: PublicKey) -> Self {
        value.0
    }
}

/// Content hash identifying a signed transaction
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TransactionHash(String);

impl TransactionHash {
    pub fn parse(input: &str) -> Result<Self> {
        parse_hex32(input, "transaction hash").map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TransactionHash {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        TransactionHash::parse(&value)
    }
}

impl From<TransactionHash> for String {
    fn from(value: TransactionHash) -> Self {
        value.0
    }
}
