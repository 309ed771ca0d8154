//! Accounts, signers and on-chain account info

use serde::{Deserialize, Serialize};

use crate::types::{Address, NetworkType, PublicKey};

/// A locally known identity imported into the active profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub address: Address,
    pub public_key: PublicKey,
    /// Display name chosen by the user
    pub label: String,
    pub network_type: NetworkType,
}

impl Account {
    pub fn new(
        address: Address,
        public_key: PublicKey,
        label: impl Into<String>,
        network_type: NetworkType,
    ) -> Self {
        Self {
            address,
            public_key,
            label: label.into(),
            network_type,
        }
    }

    /// Label is the only field that may change after import
    pub fn rename(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }
}

/// A resolved acting identity: the account itself or a multisig it cosigns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signer {
    pub label: String,
    pub public_key: PublicKey,
    pub address: Address,
    pub is_multisig: bool,
}

/// Balance of a single mosaic held by an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MosaicBalance {
    /// Hex mosaic identifier
    pub id: String,
    pub amount: u64,
}

/// Account state as reported by the ledger network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub address: Address,
    /// `None` until the account has announced its first transaction
    pub public_key: Option<PublicKey>,
    #[serde(default)]
    pub mosaics: Vec<MosaicBalance>,
}

impl AccountInfo {
    pub fn balance_of(&self, mosaic_id: &str) -> u64 {
        self.mosaics
            .iter()
            .filter(|m| m.id.eq_ignore_ascii_case(mosaic_id))
            .map(|m| m.amount)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_account() -> Account {
        Account::new(
            Address::parse("TATNE7Q5BITMUTRRN6IB4I7FLSDRDWZA37JGO5Q").unwrap(),
            PublicKey::parse(&"0A".repeat(32)).unwrap(),
            "savings",
            NetworkType::TestNet,
        )
    }

    #[test]
    fn test_rename_changes_only_label() {
        let mut account = sample_account();
        let before = account.clone();
        account.rename("cold storage");

        assert_eq!(account.label, "cold storage");
        assert_eq!(account.address, before.address);
        assert_eq!(account.public_key, before.public_key);
    }

    #[test]
    fn test_balance_of_sums_matching_mosaics() {
        let info = AccountInfo {
            address: sample_account().address,
            public_key: None,
            mosaics: vec![
                MosaicBalance {
                    id: "3A8416DB2D53B6C8".to_string(),
                    amount: 10,
                },
                MosaicBalance {
                    id: "3a8416db2d53b6c8".to_string(),
                    amount: 5,
                },
                MosaicBalance {
                    id: "091F837E059AE13C".to_string(),
                    amount: 99,
                },
            ],
        };

        assert_eq!(info.balance_of("3A8416DB2D53B6C8"), 15);
        assert_eq!(info.balance_of("FFFF"), 0);
    }
}
