//! Bridge between the console and a serial-over-BLE peripheral
//!
//! ```text
//!   stdin ──► InputPump ──► ChunkedWriter ──┐
//!                                           ▼
//!                                    LinkAuthority ◄── BridgeController
//!                                           │              │
//!   stdout ◄── ReassemblyConsumer ◄── NotificationRouter ◄─┘ (event loop)
//! ```

pub mod controller;
pub mod events;
pub mod link;
pub mod pump;
pub mod router;
pub mod writer;

pub use controller::{BridgeController, BridgeState};
pub use events::{event_channel, BridgeEvent, Canceller, EventQueue};
pub use link::LinkAuthority;
pub use pump::{InputPump, PumpExit};
pub use router::{NotificationConsumer, NotificationRouter, ReassemblyConsumer};
pub use writer::ChunkedWriter;
