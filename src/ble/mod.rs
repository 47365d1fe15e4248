//! Bluetooth Low Energy backend
//!
//! Implements the GATT link traits on top of btleplug so the bridge can
//! talk to a real peripheral.

pub mod backend;

pub use backend::{BtleConnector, BtleLink};
