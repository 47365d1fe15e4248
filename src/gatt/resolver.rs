//! Characteristic resolver
//!
//! Maps the UUIDs the bridge needs onto session handles using a single
//! discovery call.

use std::collections::{HashMap, HashSet};

use log::{debug, info};
use uuid::Uuid;

use crate::error::BridgeError;
use crate::gatt::traits::{GattLink, Handle};

/// Outcome of a resolve call.
///
/// Holds only the UUIDs that were asked for. UUIDs discovered with a zero
/// handle are kept apart from ones that were never discovered.
#[derive(Debug, Default, Clone)]
pub struct ResolvedCharacteristics {
    handles: HashMap<Uuid, Handle>,
    zero_handles: HashSet<Uuid>,
}

impl ResolvedCharacteristics {
    /// Handle for `uuid`, if it resolved
    pub fn get(&self, uuid: &Uuid) -> Option<Handle> {
        self.handles.get(uuid).copied()
    }

    /// Handle for `uuid`, or the reason it is unusable
    pub fn require(&self, uuid: Uuid) -> Result<Handle, BridgeError> {
        if let Some(handle) = self.get(&uuid) {
            return Ok(handle);
        }
        if self.zero_handles.contains(&uuid) {
            Err(BridgeError::UnusableHandle { uuid })
        } else {
            Err(BridgeError::CharacteristicNotFound { uuid })
        }
    }

    /// Check every UUID in `required`, failing on the first unusable one
    pub fn require_all(&self, required: &[Uuid]) -> Result<(), BridgeError> {
        for uuid in required {
            self.require(*uuid)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

/// Characteristic resolver
pub struct CharacteristicResolver;

impl CharacteristicResolver {
    pub fn new() -> Self {
        Self
    }

    /// Discover once and match the results against `wanted`.
    ///
    /// Matching compares parsed UUIDs, never strings. The first non-zero
    /// handle seen for a UUID wins. Fails with [`BridgeError::Discovery`]
    /// if the discovery call fails; there is no retry.
    pub async fn resolve<L: GattLink>(
        &self,
        link: &L,
        wanted: &[Uuid],
    ) -> Result<ResolvedCharacteristics, BridgeError> {
        let discovered = link.discover().await.map_err(BridgeError::Discovery)?;
        debug!("Discovered {} characteristics", discovered.len());

        let mut resolved = ResolvedCharacteristics::default();

        for characteristic in &discovered {
            if !wanted.contains(&characteristic.uuid) {
                continue;
            }
            if resolved.handles.contains_key(&characteristic.uuid) {
                continue;
            }

            match Handle::new(characteristic.handle) {
                Some(handle) => {
                    info!("Resolved {} -> handle {}", characteristic.uuid, handle);
                    resolved.zero_handles.remove(&characteristic.uuid);
                    resolved.handles.insert(characteristic.uuid, handle);
                }
                None => {
                    debug!("{} reported with zero handle", characteristic.uuid);
                    resolved.zero_handles.insert(characteristic.uuid);
                }
            }
        }

        Ok(resolved)
    }
}

impl Default for CharacteristicResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gatt::traits::mock::{LinkCall, MockLink};
    use crate::gatt::traits::{Characteristic, LinkError};

    const A: Uuid = Uuid::from_u128(0xa);
    const B: Uuid = Uuid::from_u128(0xb);
    const C: Uuid = Uuid::from_u128(0xc);

    fn chars(list: &[(Uuid, u16)]) -> Vec<Characteristic> {
        list.iter()
            .map(|&(uuid, handle)| Characteristic { uuid, handle })
            .collect()
    }

    #[test]
    fn test_resolve_found_entries_only() {
        let link = MockLink::new(&chars(&[(A, 0x10), (C, 0x20), (B, 0x30)]));
        let resolver = CharacteristicResolver::new();

        futures::executor::block_on(async {
            let resolved = resolver.resolve(&link, &[A, B]).await.unwrap();

            assert_eq!(resolved.len(), 2);
            assert_eq!(resolved.get(&A).map(Handle::get), Some(0x10));
            assert_eq!(resolved.get(&B).map(Handle::get), Some(0x30));
            assert!(resolved.get(&C).is_none());
        });

        // Exactly one discovery call
        assert_eq!(link.calls(), vec![LinkCall::Discover]);
    }

    #[test]
    fn test_missing_uuid_reported() {
        let link = MockLink::new(&chars(&[(A, 0x10)]));
        let resolver = CharacteristicResolver::new();

        futures::executor::block_on(async {
            let resolved = resolver.resolve(&link, &[A, B]).await.unwrap();

            match resolved.require_all(&[A, B]) {
                Err(BridgeError::CharacteristicNotFound { uuid }) => assert_eq!(uuid, B),
                other => panic!("Expected CharacteristicNotFound, got {:?}", other),
            }
        });
    }

    #[test]
    fn test_zero_handle_distinguished_from_absent() {
        let link = MockLink::new(&chars(&[(A, 0)]));
        let resolver = CharacteristicResolver::new();

        futures::executor::block_on(async {
            let resolved = resolver.resolve(&link, &[A]).await.unwrap();

            assert!(resolved.get(&A).is_none());
            assert!(matches!(
                resolved.require(A),
                Err(BridgeError::UnusableHandle { uuid }) if uuid == A
            ));
        });
    }

    #[test]
    fn test_first_nonzero_handle_wins() {
        let link = MockLink::new(&chars(&[(A, 0), (A, 0x11), (A, 0x12)]));
        let resolver = CharacteristicResolver::new();

        futures::executor::block_on(async {
            let resolved = resolver.resolve(&link, &[A]).await.unwrap();
            assert_eq!(resolved.require(A).unwrap().get(), 0x11);
        });
    }

    #[test]
    fn test_discovery_failure() {
        let link = MockLink::new(&chars(&[(A, 0x10)]));
        link.set_discover_error(LinkError::Backend("gatt busy".into()));
        let resolver = CharacteristicResolver::new();

        futures::executor::block_on(async {
            let result = resolver.resolve(&link, &[A]).await;
            assert!(matches!(result, Err(BridgeError::Discovery(_))));
        });
    }
}
