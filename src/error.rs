//! Bridge error taxonomy

use thiserror::Error;
use uuid::Uuid;

use crate::bridge::BridgeState;
use crate::gatt::LinkError;

/// Errors surfaced by the bridge components
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The external connect call failed
    #[error("failed to connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: LinkError,
    },

    /// A configured characteristic UUID did not parse
    #[error("invalid characteristic UUID {input:?}: {source}")]
    UuidParse {
        input: String,
        #[source]
        source: uuid::Error,
    },

    /// Characteristic discovery itself failed
    #[error("characteristic discovery failed: {0}")]
    Discovery(#[source] LinkError),

    /// A required UUID is absent from the discovery results
    #[error("characteristic {uuid} not found")]
    CharacteristicNotFound { uuid: Uuid },

    /// A required UUID was discovered with a zero handle
    #[error("characteristic {uuid} was discovered with an unusable zero handle")]
    UnusableHandle { uuid: Uuid },

    /// Starting a notification stream failed
    #[error("failed to start notifications on {uuid}: {source}")]
    Subscription {
        uuid: Uuid,
        #[source]
        source: LinkError,
    },

    /// A segment write failed part way through a payload
    #[error("write failed after {bytes_sent} bytes, {bytes_remaining} bytes not sent: {source}")]
    Write {
        bytes_sent: usize,
        bytes_remaining: usize,
        #[source]
        source: LinkError,
    },

    /// A controller operation was called before its prerequisites
    #[error("{operation} called in state {state:?}")]
    OutOfOrder {
        operation: &'static str,
        state: BridgeState,
    },

    /// Startup was cancelled before the bridge began streaming
    #[error("cancelled during startup")]
    Cancelled,

    /// Unsubscribe or disconnect failed during teardown
    #[error("shutdown step '{step}' failed: {source}")]
    Shutdown {
        step: String,
        #[source]
        source: LinkError,
    },
}

impl BridgeError {
    /// Whether this error aborts startup.
    ///
    /// Subscription, write and shutdown failures only degrade the bridge.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            BridgeError::Subscription { .. } | BridgeError::Write { .. } | BridgeError::Shutdown { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_split() {
        let uuid = Uuid::nil();

        assert!(BridgeError::CharacteristicNotFound { uuid }.is_fatal());
        assert!(BridgeError::Discovery(LinkError::Closed).is_fatal());
        assert!(BridgeError::Cancelled.is_fatal());
        assert!(!BridgeError::Subscription {
            uuid,
            source: LinkError::Closed
        }
        .is_fatal());
        assert!(!BridgeError::Write {
            bytes_sent: 20,
            bytes_remaining: 5,
            source: LinkError::Closed
        }
        .is_fatal());
    }

    #[test]
    fn test_out_of_order_message() {
        let err = BridgeError::OutOfOrder {
            operation: "launch_pump",
            state: BridgeState::Disconnected,
        };
        assert_eq!(err.to_string(), "launch_pump called in state Disconnected");
    }

    #[test]
    fn test_write_error_message() {
        let err = BridgeError::Write {
            bytes_sent: 20,
            bytes_remaining: 25,
            source: LinkError::Closed,
        };
        assert_eq!(
            err.to_string(),
            "write failed after 20 bytes, 25 bytes not sent: connection closed"
        );
    }
}
