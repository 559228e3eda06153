//! Service identity and discovered peers.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fixed service identifier both peers agree on (serial port profile).
pub const SERVICE_ID: Uuid = Uuid::from_u128(0x0000_1101_0000_1000_8000_0080_5F9B_34FB);

/// Prefix of every advertised service name.
pub const SERVICE_PREFIX: &str = "TicTacToe";

/// Name advertised while listening: `TicTacToe_Game_<n>`, `n` being the
/// current time in milliseconds modulo 10000.
#[must_use]
pub fn advertised_name() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    format!("{SERVICE_PREFIX}_Game_{}", millis % 10_000)
}

/// A reachable endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerInfo {
    /// Advertised name; may be empty when the device did not report one.
    pub name: String,
    /// Transport address used to connect.
    pub address: String,
}

impl PeerInfo {
    #[must_use]
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }

    /// Label for peer lists. Game services are shown by name alone; other
    /// devices get the tail of their address appended.
    #[must_use]
    pub fn display_name(&self) -> String {
        let name = if self.name.trim().is_empty() {
            "Unknown device"
        } else {
            self.name.as_str()
        };
        if name.contains(SERVICE_PREFIX) {
            return name.to_string();
        }
        let skip = self.address.chars().count().saturating_sub(8);
        let tail: String = self.address.chars().skip(skip).collect();
        format!("{name} ({tail})")
    }
}

/// Removes duplicate addresses, keeping the first entry for each.
#[must_use]
pub fn dedup_peers(peers: Vec<PeerInfo>) -> Vec<PeerInfo> {
    let mut seen = std::collections::HashSet::new();
    peers
        .into_iter()
        .filter(|peer| seen.insert(peer.address.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_id() {
        assert_eq!(
            SERVICE_ID.to_string(),
            "00001101-0000-1000-8000-00805f9b34fb"
        );
    }

    #[test]
    fn test_advertised_name() {
        let name = advertised_name();
        let n: u32 = name
            .strip_prefix("TicTacToe_Game_")
            .unwrap()
            .parse()
            .unwrap();
        assert!(n < 10_000);
    }

    #[test]
    fn test_display_name() {
        assert_eq!(
            PeerInfo::new("TicTacToe_Game_42", "00:11:22:33:44:55").display_name(),
            "TicTacToe_Game_42"
        );
        assert_eq!(
            PeerInfo::new("Pixel", "00:11:22:33:44:55").display_name(),
            "Pixel (33:44:55)"
        );
        assert_eq!(
            PeerInfo::new("", "abc").display_name(),
            "Unknown device (abc)"
        );
    }

    #[test]
    fn test_dedup_keeps_first() {
        let peers = dedup_peers(vec![
            PeerInfo::new("a", "1"),
            PeerInfo::new("b", "2"),
            PeerInfo::new("c", "1"),
        ]);
        assert_eq!(peers, vec![PeerInfo::new("a", "1"), PeerInfo::new("b", "2")]);
    }
}
