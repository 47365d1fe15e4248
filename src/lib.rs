//! Console bridge for serial-over-BLE peripherals
//!
//! Connects to a peripheral exposing a UART-style GATT service, sends console
//! lines to its transmit characteristic and prints whatever it notifies.
//! The BLE stack sits behind the traits in [`gatt`]; the btleplug backend is
//! only built with the `btle` feature.

pub mod bridge;
pub mod config;
pub mod console;
pub mod error;
pub mod gatt;
pub mod protocol;

#[cfg(feature = "btle")]
pub mod ble;

pub use bridge::{BridgeController, BridgeState, Canceller, ReassemblyConsumer};
pub use config::BridgeProfile;
pub use error::BridgeError;
