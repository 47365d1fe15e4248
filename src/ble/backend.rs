//! btleplug-backed GATT link
//!
//! btleplug does not expose ATT handles, so each session numbers the
//! discovered characteristics from 1 in discovery order and maps handles
//! back to characteristics through that table.

use std::str::FromStr;
use std::time::{Duration, Instant};

use btleplug::api::{
    BDAddr, Central, Characteristic as BtleCharacteristic, Manager as _, Peripheral as _,
    ScanFilter, WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::StreamExt;
use log::{debug, info};
use uuid::Uuid;

use crate::config::scan::{DEFAULT_TIMEOUT_SECS, POLL_INTERVAL_MS};
use crate::gatt::traits::{
    Characteristic, GattConnector, GattLink, Handle, LinkError, Notification, NotificationStream,
};

fn backend_error(e: btleplug::Error) -> LinkError {
    LinkError::Backend(e.to_string())
}

/// Opens connections through the first Bluetooth adapter
#[derive(Debug, Clone)]
pub struct BtleConnector {
    scan_timeout: Duration,
}

impl BtleConnector {
    pub fn new() -> Self {
        Self::with_scan_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_scan_timeout(scan_timeout: Duration) -> Self {
        Self { scan_timeout }
    }

    /// Poll the adapter's peripheral list until `address` shows up
    async fn find_device(&self, adapter: &Adapter, address: BDAddr) -> Result<Peripheral, LinkError> {
        let start = Instant::now();

        while start.elapsed() < self.scan_timeout {
            for peripheral in adapter.peripherals().await.map_err(backend_error)? {
                if let Some(props) = peripheral.properties().await.map_err(backend_error)? {
                    if props.address == address {
                        return Ok(peripheral);
                    }
                }
            }

            tokio::time::sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
        }

        Err(LinkError::Backend(format!(
            "device {} not found within {:?}",
            address, self.scan_timeout
        )))
    }
}

impl Default for BtleConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl GattConnector for BtleConnector {
    type Link = BtleLink;

    async fn connect(&self, address: &str) -> Result<BtleLink, LinkError> {
        let address = BDAddr::from_str(address)
            .map_err(|e| LinkError::Backend(format!("invalid address {:?}: {}", address, e)))?;

        let manager = Manager::new().await.map_err(backend_error)?;
        let adapter = manager
            .adapters()
            .await
            .map_err(backend_error)?
            .into_iter()
            .next()
            .ok_or_else(|| LinkError::Backend("no Bluetooth adapters found".into()))?;

        debug!("Scanning for {}", address);
        adapter
            .start_scan(ScanFilter::default())
            .await
            .map_err(backend_error)?;
        let found = self.find_device(&adapter, address).await;
        adapter.stop_scan().await.map_err(backend_error)?;
        let peripheral = found?;

        peripheral.connect().await.map_err(backend_error)?;
        peripheral.discover_services().await.map_err(backend_error)?;

        let characteristics: Vec<BtleCharacteristic> =
            peripheral.characteristics().into_iter().collect();
        info!(
            "Discovered {} characteristics on {}",
            characteristics.len(),
            address
        );

        Ok(BtleLink {
            peripheral,
            characteristics,
        })
    }
}

/// Connection to one peripheral
pub struct BtleLink {
    peripheral: Peripheral,
    /// Handle `n` refers to entry `n - 1`
    characteristics: Vec<BtleCharacteristic>,
}

impl BtleLink {
    fn by_handle(&self, handle: Handle) -> Result<&BtleCharacteristic, LinkError> {
        self.characteristics
            .get(usize::from(handle.get()) - 1)
            .ok_or(LinkError::UnknownHandle(handle.get()))
    }

    fn by_uuid(&self, uuid: Uuid) -> Result<&BtleCharacteristic, LinkError> {
        self.characteristics
            .iter()
            .find(|c| c.uuid == uuid)
            .ok_or(LinkError::UnknownCharacteristic(uuid))
    }
}

impl GattLink for BtleLink {
    async fn discover(&self) -> Result<Vec<Characteristic>, LinkError> {
        Ok(self
            .characteristics
            .iter()
            .zip(1u16..)
            .map(|(c, handle)| Characteristic {
                uuid: c.uuid,
                handle,
            })
            .collect())
    }

    async fn write_without_response(&self, handle: Handle, data: &[u8]) -> Result<(), LinkError> {
        let characteristic = self.by_handle(handle)?;
        self.peripheral
            .write(characteristic, data, WriteType::WithoutResponse)
            .await
            .map_err(backend_error)
    }

    async fn subscribe(&self, uuid: Uuid) -> Result<(), LinkError> {
        let characteristic = self.by_uuid(uuid)?;
        self.peripheral
            .subscribe(characteristic)
            .await
            .map_err(backend_error)
    }

    async fn unsubscribe(&self, uuid: Uuid) -> Result<(), LinkError> {
        let characteristic = self.by_uuid(uuid)?;
        self.peripheral
            .unsubscribe(characteristic)
            .await
            .map_err(backend_error)
    }

    async fn notifications(&self) -> Result<NotificationStream, LinkError> {
        let stream = self
            .peripheral
            .notifications()
            .await
            .map_err(backend_error)?;
        Ok(Box::pin(stream.map(|n| Notification {
            uuid: n.uuid,
            value: n.value,
        })))
    }

    async fn disconnect(&self) -> Result<(), LinkError> {
        self.peripheral.disconnect().await.map_err(backend_error)
    }
}
