//! Notification router
//!
//! Demultiplexes notifications by source UUID to per-UUID consumers and
//! tracks which notification streams are active.

use std::collections::HashMap;
use std::io::{self, Write};

use log::{debug, info, trace, warn};
use uuid::Uuid;

use crate::error::BridgeError;
use crate::gatt::traits::GattLink;
use crate::protocol::render::render_payload;

/// Receives the raw payloads of one notification stream, in arrival order
pub trait NotificationConsumer {
    fn consume(&mut self, payload: &[u8]) -> io::Result<()>;
}

/// Renders payloads to an output sink, carriage returns as line breaks.
///
/// The sink is flushed after every payload so output interleaves correctly
/// with diagnostics from other threads.
pub struct ReassemblyConsumer<W: Write> {
    out: W,
    scratch: Vec<u8>,
}

impl<W: Write> ReassemblyConsumer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            scratch: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> NotificationConsumer for ReassemblyConsumer<W> {
    fn consume(&mut self, payload: &[u8]) -> io::Result<()> {
        self.scratch.clear();
        render_payload(payload, &mut self.scratch);
        self.out.write_all(&self.scratch)?;
        self.out.flush()
    }
}

/// Per-UUID stream state
struct Stream {
    active: bool,
    consumer: Option<Box<dyn NotificationConsumer>>,
}

/// Notification router
#[derive(Default)]
pub struct NotificationRouter {
    streams: HashMap<Uuid, Stream>,
}

impl NotificationRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the consumer for `uuid`, replacing any previous one.
    ///
    /// Does not subscribe.
    pub fn register(&mut self, uuid: Uuid, consumer: Box<dyn NotificationConsumer>) {
        let stream = self.streams.entry(uuid).or_insert(Stream {
            active: false,
            consumer: None,
        });
        if stream.consumer.replace(consumer).is_some() {
            debug!("Replaced consumer for {}", uuid);
        }
    }

    /// Ask the peripheral to start notifying on `uuid`.
    ///
    /// On failure the stream stays inactive; callers treat this as a soft
    /// failure. Starting an active stream does nothing.
    pub async fn start<L: GattLink>(&mut self, link: &L, uuid: Uuid) -> Result<(), BridgeError> {
        if self.is_active(&uuid) {
            return Ok(());
        }

        link.subscribe(uuid)
            .await
            .map_err(|source| BridgeError::Subscription { uuid, source })?;

        self.streams
            .entry(uuid)
            .or_insert(Stream {
                active: false,
                consumer: None,
            })
            .active = true;
        info!("Notifications started on {}", uuid);
        Ok(())
    }

    /// Ask the peripheral to stop notifying on `uuid`.
    ///
    /// Unknown or inactive UUIDs are a no-op. The stream is marked inactive
    /// even when the stack reports a failure.
    pub async fn stop<L: GattLink>(&mut self, link: &L, uuid: Uuid) -> Result<(), BridgeError> {
        let Some(stream) = self.streams.get_mut(&uuid) else {
            return Ok(());
        };
        if !stream.active {
            return Ok(());
        }
        stream.active = false;

        link.unsubscribe(uuid)
            .await
            .map_err(|source| BridgeError::Shutdown {
                step: format!("unsubscribe {}", uuid),
                source,
            })?;
        info!("Notifications stopped on {}", uuid);
        Ok(())
    }

    /// Stop every active stream once, collecting failures
    pub async fn stop_all<L: GattLink>(&mut self, link: &L) -> Vec<BridgeError> {
        let mut errors = Vec::new();
        for uuid in self.active_uuids() {
            if let Err(e) = self.stop(link, uuid).await {
                errors.push(e);
            }
        }
        errors
    }

    /// Forward `payload` to the consumer for `uuid` if the stream is active.
    ///
    /// Anything else is dropped.
    pub fn dispatch(&mut self, uuid: &Uuid, payload: &[u8]) {
        let Some(stream) = self.streams.get_mut(uuid) else {
            trace!("Dropping notification from unregistered {}", uuid);
            return;
        };
        if !stream.active {
            trace!("Dropping notification from inactive {}", uuid);
            return;
        }
        let Some(consumer) = stream.consumer.as_mut() else {
            trace!("Dropping notification from {} with no consumer", uuid);
            return;
        };

        if let Err(e) = consumer.consume(payload) {
            warn!("Failed to render notification from {}: {}", uuid, e);
        }
    }

    pub fn is_active(&self, uuid: &Uuid) -> bool {
        self.streams.get(uuid).is_some_and(|s| s.active)
    }

    pub fn active_uuids(&self) -> Vec<Uuid> {
        self.streams
            .iter()
            .filter(|(_, s)| s.active)
            .map(|(uuid, _)| *uuid)
            .collect()
    }
}
