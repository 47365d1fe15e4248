//! Bridge controller
//!
//! Owns the connection and drives the bridge through its lifecycle:
//!
//! ```text
//! Disconnected ──connect──► Connected ──start_streams + launch_pump──► Streaming
//!                                                                        │
//! Disconnected ◄──────────── ShuttingDown ◄──────── first Cancel ────────┘
//! ```
//!
//! Shutdown runs at most once: it invalidates the link, stops every active
//! notification stream and disconnects.
//!
//! Operations called out of this order fail with [`BridgeError::OutOfOrder`].

use std::pin::pin;
use std::sync::Arc;

use futures::future::{self, Either};
use futures::stream::{self, StreamExt};
use log::{info, warn};
use uuid::Uuid;

use crate::bridge::events::{BridgeEvent, EventQueue};
use crate::bridge::link::LinkAuthority;
use crate::bridge::pump::InputPump;
use crate::bridge::router::{NotificationConsumer, NotificationRouter};
use crate::bridge::writer::ChunkedWriter;
use crate::config::BridgeProfile;
use crate::console::reader::LineReader;
use crate::console::traits::LineSource;
use crate::error::BridgeError;
use crate::gatt::resolver::CharacteristicResolver;
use crate::gatt::traits::{GattConnector, GattLink, Handle, NotificationStream};

/// Lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Disconnected,
    Connected,
    Streaming,
    ShuttingDown,
}

/// Bridge controller
pub struct BridgeController<L> {
    profile: BridgeProfile,
    state: BridgeState,
    link: Option<Arc<LinkAuthority<L>>>,
    router: NotificationRouter,
    writer: ChunkedWriter,
    tx_handle: Option<Handle>,
    notifications: Option<NotificationStream>,
    shutdown_done: bool,
}

impl<L: GattLink> BridgeController<L> {
    pub fn new(profile: BridgeProfile) -> Self {
        let writer = ChunkedWriter::with_mtu(profile.mtu);
        Self {
            profile,
            state: BridgeState::Disconnected,
            link: None,
            router: NotificationRouter::new(),
            writer,
            tx_handle: None,
            notifications: None,
            shutdown_done: false,
        }
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    /// Handle resolved for the transmit characteristic
    pub fn tx_handle(&self) -> Option<Handle> {
        self.tx_handle
    }

    pub fn router(&self) -> &NotificationRouter {
        &self.router
    }

    fn out_of_order(&self, operation: &'static str) -> BridgeError {
        BridgeError::OutOfOrder {
            operation,
            state: self.state,
        }
    }

    /// Connect to `address`. On failure the state stays `Disconnected`.
    pub async fn connect<C>(&mut self, connector: &C, address: &str) -> Result<(), BridgeError>
    where
        C: GattConnector<Link = L>,
    {
        if self.state != BridgeState::Disconnected || self.shutdown_done {
            return Err(self.out_of_order("connect"));
        }

        info!("Connecting to {}", address);
        let link = connector
            .connect(address)
            .await
            .map_err(|source| BridgeError::Connect {
                address: address.to_string(),
                source,
            })?;

        self.link = Some(Arc::new(LinkAuthority::new(link)));
        self.state = BridgeState::Connected;
        info!("Connected to {}", address);
        Ok(())
    }

    /// Resolve every required characteristic, register a consumer per
    /// notification stream and start the streams.
    ///
    /// Resolution failures are fatal: the connection is released and no
    /// subscription or write has happened. Stream start failures are logged
    /// and the bridge carries on without that stream.
    pub async fn start_streams<F>(&mut self, mut make_consumer: F) -> Result<(), BridgeError>
    where
        F: FnMut(Uuid) -> Box<dyn NotificationConsumer>,
    {
        let link = match (&self.link, self.state) {
            (Some(link), BridgeState::Connected) => link.clone(),
            _ => return Err(self.out_of_order("start_streams")),
        };

        let required = self.profile.required_uuids();
        let resolved = match CharacteristicResolver::new()
            .resolve(link.as_ref(), &required)
            .await
            .and_then(|resolved| resolved.require_all(&required).map(|_| resolved))
        {
            Ok(resolved) => resolved,
            Err(e) => {
                self.release().await;
                return Err(e);
            }
        };
        self.tx_handle = resolved.get(&self.profile.tx_uuid);

        match link.notifications().await {
            Ok(stream) => self.notifications = Some(stream),
            Err(e) => warn!("No notification stream available: {}", e),
        }

        for uuid in self.profile.notify_uuids.clone() {
            self.router.register(uuid, make_consumer(uuid));
            if let Err(e) = self.router.start(link.as_ref(), uuid).await {
                warn!("{}", e);
            }
        }

        Ok(())
    }

    /// Connect and start streams, giving up at the first Cancel on `events`.
    ///
    /// A cancelled startup releases whatever it had acquired and fails with
    /// [`BridgeError::Cancelled`].
    pub async fn start_or_cancel<C, F>(
        &mut self,
        connector: &C,
        address: &str,
        make_consumer: F,
        events: &mut EventQueue,
    ) -> Result<(), BridgeError>
    where
        C: GattConnector<Link = L>,
        F: FnMut(Uuid) -> Box<dyn NotificationConsumer>,
    {
        let outcome = {
            let startup = pin!(self.start(connector, address, make_consumer));
            match future::select(startup, events.next()).await {
                Either::Left((result, _)) => Some(result),
                Either::Right((Some(BridgeEvent::Cancel), _)) => None,
                Either::Right((_, startup)) => Some(startup.await),
            }
        };

        match outcome {
            Some(result) => result,
            None => {
                info!("Cancelled during startup");
                self.shutdown().await;
                Err(BridgeError::Cancelled)
            }
        }
    }

    async fn start<C, F>(
        &mut self,
        connector: &C,
        address: &str,
        make_consumer: F,
    ) -> Result<(), BridgeError>
    where
        C: GattConnector<Link = L>,
        F: FnMut(Uuid) -> Box<dyn NotificationConsumer>,
    {
        self.connect(connector, address).await?;
        self.start_streams(make_consumer).await
    }

    /// Build the input pump and hand it to `spawn`, which must run it on its
    /// own execution context. Moves the bridge to `Streaming`.
    pub fn launch_pump<S, F>(&mut self, source: S, spawn: F) -> Result<(), BridgeError>
    where
        S: LineSource,
        F: FnOnce(InputPump<L, S>),
    {
        let (Some(link), Some(handle), BridgeState::Connected) =
            (self.link.clone(), self.tx_handle, self.state)
        else {
            return Err(self.out_of_order("launch_pump"));
        };

        spawn(InputPump::new(
            link,
            self.writer,
            handle,
            LineReader::new(source),
        ));
        self.state = BridgeState::Streaming;
        Ok(())
    }

    /// Dispatch notifications until the first cancellation (or until every
    /// event source has ended), then shut down.
    ///
    /// Returns the non-fatal errors collected during shutdown.
    pub async fn run(&mut self, events: EventQueue) -> Vec<BridgeError> {
        let notifications = self
            .notifications
            .take()
            .unwrap_or_else(|| Box::pin(stream::empty()));
        // Round-robin, so a busy notification stream cannot hold off Cancel
        let mut events = stream::select(notifications.map(BridgeEvent::Notification), events);

        while let Some(event) = events.next().await {
            match event {
                BridgeEvent::Notification(notification) => {
                    self.router.dispatch(&notification.uuid, &notification.value);
                }
                BridgeEvent::Cancel => {
                    info!("Cancellation requested");
                    break;
                }
            }
        }

        self.shutdown().await
    }

    /// Stop every active stream and disconnect. Runs at most once; later
    /// calls return no errors and touch nothing.
    pub async fn shutdown(&mut self) -> Vec<BridgeError> {
        if self.shutdown_done {
            return Vec::new();
        }
        self.shutdown_done = true;
        self.state = BridgeState::ShuttingDown;

        let mut errors = Vec::new();
        let link = match self.link.take() {
            Some(authority) => authority.invalidate().await,
            None => None,
        };

        if let Some(link) = link {
            errors.extend(self.router.stop_all(&link).await);
            if let Err(source) = link.disconnect().await {
                errors.push(BridgeError::Shutdown {
                    step: "disconnect".to_string(),
                    source,
                });
            }
        }

        for e in &errors {
            warn!("{}", e);
        }
        self.state = BridgeState::Disconnected;
        info!("Disconnected");
        errors
    }

    /// Drop the connection after a fatal startup error
    async fn release(&mut self) {
        if let Some(authority) = self.link.take() {
            if let Some(link) = authority.invalidate().await {
                if let Err(e) = link.disconnect().await {
                    warn!("Failed to disconnect: {}", e);
                }
            }
        }
        self.state = BridgeState::Disconnected;
    }
}
