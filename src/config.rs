//! Bridge configuration constants and peripheral profiles

use uuid::Uuid;

use crate::error::BridgeError;

/// Link constants
pub mod link {
    /// Maximum payload bytes per write-without-response
    pub const MTU: usize = 20;
}

/// Local console input constants
pub mod input {
    /// Maximum bytes delivered per read, line terminator included
    pub const MAX_LINE_LEN: usize = 256;

    /// Printed once before the pump starts reading
    pub const PROMPT: &str = "type something, then [enter] to send.";
}

/// btleplug backend constants
pub mod scan {
    /// Default time to wait for the peripheral to show up in a scan
    pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

    /// Interval between peripheral list polls while scanning
    pub const POLL_INTERVAL_MS: u64 = 100;
}

/// Nordic UART Service
/// - TX Characteristic: 6E400002-... (host writes here)
/// - RX Characteristic: 6E400003-... (peripheral notifies here)
pub mod nordic {
    use uuid::Uuid;

    pub const TX_UUID: Uuid = Uuid::from_u128(0x6e400002_b5a3_f393_e0a9_e50e24dcca9e);
    pub const RX_UUID: Uuid = Uuid::from_u128(0x6e400003_b5a3_f393_e0a9_e50e24dcca9e);
}

/// Microchip RN487x "transparent UART" service
pub mod transparent {
    use uuid::Uuid;

    /// Written by the host and also notified by the module
    pub const TX_UUID: Uuid = Uuid::from_u128(0x49535343_1e4d_4bd9_ba61_23c647249616);
    /// Must be present, never subscribed
    pub const RX_UUID: Uuid = Uuid::from_u128(0x49535343_8841_43f4_a8d4_ecbe34729bb3);
    /// Second notification stream
    pub const NX_UUID: Uuid = Uuid::from_u128(0x49535343_4c8a_39b3_2f49_511cff073b7e);
}

/// Which characteristics the bridge talks to on a given peripheral family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeProfile {
    /// Characteristic the bridge writes console input into
    pub tx_uuid: Uuid,
    /// Characteristics whose notifications are rendered to the console
    pub notify_uuids: Vec<Uuid>,
    /// Characteristics that must exist but are otherwise unused
    pub also_require: Vec<Uuid>,
    /// Maximum bytes per write
    pub mtu: usize,
}

impl BridgeProfile {
    /// Nordic UART Service: one write slot, one notification stream
    pub fn nordic() -> Self {
        Self {
            tx_uuid: nordic::TX_UUID,
            notify_uuids: vec![nordic::RX_UUID],
            also_require: Vec::new(),
            mtu: link::MTU,
        }
    }

    /// RN487x transparent UART: two notification streams
    pub fn transparent() -> Self {
        Self {
            tx_uuid: transparent::TX_UUID,
            notify_uuids: vec![transparent::TX_UUID, transparent::NX_UUID],
            also_require: vec![transparent::RX_UUID],
            mtu: link::MTU,
        }
    }

    /// Look up a built-in profile by name
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "nordic" | "nus" => Some(Self::nordic()),
            "transparent" | "rn4871" => Some(Self::transparent()),
            _ => None,
        }
    }

    /// Build a profile from UUID strings.
    ///
    /// Fails with [`BridgeError::UuidParse`] naming the offending input.
    pub fn from_strs(tx: &str, notify: &[&str], mtu: usize) -> Result<Self, BridgeError> {
        let tx_uuid = parse_uuid(tx)?;
        let notify_uuids = notify
            .iter()
            .map(|s| parse_uuid(s))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            tx_uuid,
            notify_uuids,
            also_require: Vec::new(),
            mtu,
        })
    }

    /// Every UUID that has to resolve before the bridge starts, deduplicated,
    /// tx first.
    pub fn required_uuids(&self) -> Vec<Uuid> {
        let mut required = vec![self.tx_uuid];
        for uuid in self.notify_uuids.iter().chain(self.also_require.iter()) {
            if !required.contains(uuid) {
                required.push(*uuid);
            }
        }
        required
    }
}

impl Default for BridgeProfile {
    fn default() -> Self {
        Self::nordic()
    }
}

/// Parse a characteristic UUID, keeping the input for diagnostics
pub fn parse_uuid(input: &str) -> Result<Uuid, BridgeError> {
    Uuid::parse_str(input).map_err(|source| BridgeError::UuidParse {
        input: input.to_string(),
        source,
    })
}
