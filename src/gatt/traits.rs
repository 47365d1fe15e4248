//! GATT link traits for abstraction and testability
//!
//! These traits define the narrow interface the bridge needs from a BLE
//! stack, allowing the btleplug backend to be swapped with a mock for
//! testing.

use core::fmt;
use core::future::Future;
use core::num::NonZeroU16;
use core::pin::Pin;

use futures::Stream;
use thiserror::Error;
use uuid::Uuid;

/// Errors reported by the BLE stack
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    /// The connection was invalidated or disconnected
    #[error("connection closed")]
    Closed,
    /// No characteristic behind this handle in the current session
    #[error("no characteristic for handle {0}")]
    UnknownHandle(u16),
    /// No characteristic with this UUID in the current session
    #[error("no characteristic {0}")]
    UnknownCharacteristic(Uuid),
    /// Any other failure from the underlying stack
    #[error("{0}")]
    Backend(String),
}

/// A characteristic as returned by discovery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Characteristic {
    pub uuid: Uuid,
    /// Session-scoped value handle, zero when the stack reports none
    pub handle: u16,
}

/// A resolved, usable characteristic handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(NonZeroU16);

impl Handle {
    /// Returns `None` for the zero handle
    pub fn new(raw: u16) -> Option<Self> {
        NonZeroU16::new(raw).map(Self)
    }

    pub fn get(self) -> u16 {
        self.0.get()
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0.get())
    }
}

/// Notification pushed by the peripheral
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub uuid: Uuid,
    pub value: Vec<u8>,
}

/// Stream of notifications for every subscribed characteristic
pub type NotificationStream = Pin<Box<dyn Stream<Item = Notification> + Send>>;

/// An established connection to one peripheral
pub trait GattLink {
    /// Discover every characteristic exposed by the peripheral
    fn discover(&self) -> impl Future<Output = Result<Vec<Characteristic>, LinkError>>;

    /// Write without response to a resolved handle
    fn write_without_response(
        &self,
        handle: Handle,
        data: &[u8],
    ) -> impl Future<Output = Result<(), LinkError>>;

    /// Ask the peripheral to start notifying on `uuid`
    fn subscribe(&self, uuid: Uuid) -> impl Future<Output = Result<(), LinkError>>;

    /// Ask the peripheral to stop notifying on `uuid`
    fn unsubscribe(&self, uuid: Uuid) -> impl Future<Output = Result<(), LinkError>>;

    /// Stream of notifications delivered on this connection
    fn notifications(&self) -> impl Future<Output = Result<NotificationStream, LinkError>>;

    /// Release the connection
    fn disconnect(&self) -> impl Future<Output = Result<(), LinkError>>;
}

/// Something that can open a [`GattLink`] to a peripheral address
pub trait GattConnector {
    type Link: GattLink;

    fn connect(&self, address: &str) -> impl Future<Output = Result<Self::Link, LinkError>>;
}
