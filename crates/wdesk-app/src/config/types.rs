//! Configuration types for Wallet Desk

use std::time::Duration;

use serde::{Deserialize, Serialize};
use wdesk_core::NetworkType;
use wdesk_ledger::Channel;

/// Lower bound for the aggregate-bonded confirmation window
pub const MIN_CONFIRMATION_TIMEOUT_MS: u64 = 1_000;

/// Global settings from `.wdesk/config.toml`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub network: NetworkSettings,

    #[serde(default)]
    pub broadcast: BroadcastSettings,

    #[serde(default)]
    pub subscriptions: SubscriptionSettings,

    #[serde(default)]
    pub events: EventSettings,

    #[serde(default)]
    pub domains: DomainSettings,
}

/// Network settings
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct NetworkSettings {
    /// Network the profile's accounts live on
    #[serde(default)]
    pub network_type: NetworkType,
}

/// Broadcast settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BroadcastSettings {
    /// How long to wait for an aggregate-bonded transaction to be confirmed
    #[serde(default = "default_confirmation_timeout_ms")]
    pub confirmation_timeout_ms: u64,
}

impl Default for BroadcastSettings {
    fn default() -> Self {
        Self {
            confirmation_timeout_ms: default_confirmation_timeout_ms(),
        }
    }
}

impl BroadcastSettings {
    /// Confirmation window, never shorter than [`MIN_CONFIRMATION_TIMEOUT_MS`]
    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_millis(self.confirmation_timeout_ms.max(MIN_CONFIRMATION_TIMEOUT_MS))
    }
}

fn default_confirmation_timeout_ms() -> u64 {
    30_000
}

/// Notification subscription settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SubscriptionSettings {
    /// Channels opened for the current signer
    #[serde(default = "default_channels")]
    pub channels: Vec<Channel>,

    /// Capacity of the notification sink shared by all streams
    #[serde(default = "default_notification_buffer")]
    pub notification_buffer: usize,
}

impl Default for SubscriptionSettings {
    fn default() -> Self {
        Self {
            channels: default_channels(),
            notification_buffer: default_notification_buffer(),
        }
    }
}

fn default_channels() -> Vec<Channel> {
    Channel::ALL.to_vec()
}

fn default_notification_buffer() -> usize {
    256
}

/// Observer event settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EventSettings {
    /// Broadcast buffer; slow observers lag past this many events
    #[serde(default = "default_event_capacity")]
    pub capacity: usize,
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            capacity: default_event_capacity(),
        }
    }
}

fn default_event_capacity() -> usize {
    256
}

/// Dependent domain settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DomainSettings {
    /// Per-domain command channel capacity
    #[serde(default = "default_command_buffer")]
    pub command_buffer: usize,
}

impl Default for DomainSettings {
    fn default() -> Self {
        Self {
            command_buffer: default_command_buffer(),
        }
    }
}

fn default_command_buffer() -> usize {
    64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.network.network_type, NetworkType::TestNet);
        assert_eq!(
            settings.broadcast.confirmation_timeout(),
            Duration::from_secs(30)
        );
        assert_eq!(settings.subscriptions.channels.len(), Channel::ALL.len());
        assert_eq!(settings.events.capacity, 256);
        assert_eq!(settings.domains.command_buffer, 64);
    }

    #[test]
    fn test_confirmation_timeout_is_clamped() {
        let broadcast = BroadcastSettings {
            confirmation_timeout_ms: 10,
        };
        assert_eq!(broadcast.confirmation_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings: Settings = toml::from_str(
            r#"
[network]
network_type = "main_net"

[subscriptions]
channels = ["confirmed", "status"]
"#,
        )
        .unwrap();

        assert_eq!(settings.network.network_type, NetworkType::MainNet);
        assert_eq!(
            settings.subscriptions.channels,
            vec![Channel::Confirmed, Channel::Status]
        );
        assert_eq!(settings.subscriptions.notification_buffer, 256);
        assert_eq!(settings.broadcast.confirmation_timeout_ms, 30_000);
    }
}
