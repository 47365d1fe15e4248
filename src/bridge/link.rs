//! Single checked entry point to the connection
//!
//! Every operation holds a read guard while it runs. Invalidation takes the
//! write guard and removes the link, so it waits for in-flight operations
//! and every later operation fails with [`LinkError::Closed`].

use tokio::sync::{RwLock, RwLockReadGuard};
use uuid::Uuid;

use crate::gatt::traits::{Characteristic, GattLink, Handle, LinkError, NotificationStream};

/// Owner of the live connection
pub struct LinkAuthority<L> {
    link: RwLock<Option<L>>,
}

impl<L: GattLink> LinkAuthority<L> {
    pub fn new(link: L) -> Self {
        Self {
            link: RwLock::new(Some(link)),
        }
    }

    /// Take the link out, waiting for in-flight operations to finish.
    ///
    /// Returns `None` if it was already invalidated.
    pub async fn invalidate(&self) -> Option<L> {
        self.link.write().await.take()
    }

    pub async fn is_valid(&self) -> bool {
        self.link.read().await.is_some()
    }

    async fn acquire(&self) -> Result<RwLockReadGuard<'_, L>, LinkError> {
        RwLockReadGuard::try_map(self.link.read().await, Option::as_ref)
            .map_err(|_| LinkError::Closed)
    }
}

impl<L: GattLink> GattLink for LinkAuthority<L> {
    async fn discover(&self) -> Result<Vec<Characteristic>, LinkError> {
        let link = self.acquire().await?;
        link.discover().await
    }

    async fn write_without_response(&self, handle: Handle, data: &[u8]) -> Result<(), LinkError> {
        let link = self.acquire().await?;
        link.write_without_response(handle, data).await
    }

    async fn subscribe(&self, uuid: Uuid) -> Result<(), LinkError> {
        let link = self.acquire().await?;
        link.subscribe(uuid).await
    }

    async fn unsubscribe(&self, uuid: Uuid) -> Result<(), LinkError> {
        let link = self.acquire().await?;
        link.unsubscribe(uuid).await
    }

    async fn notifications(&self) -> Result<NotificationStream, LinkError> {
        let link = self.acquire().await?;
        link.notifications().await
    }

    async fn disconnect(&self) -> Result<(), LinkError> {
        let link = self.acquire().await?;
        link.disconnect().await
    }
}
