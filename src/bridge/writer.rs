//! Chunked writer
//!
//! Transmits a payload to one handle as a sequence of MTU-sized
//! write-without-response operations.

use log::trace;

use crate::config::link::MTU;
use crate::error::BridgeError;
use crate::gatt::traits::{GattLink, Handle};
use crate::protocol::framing::segments;

/// Chunked writer
#[derive(Debug, Clone, Copy)]
pub struct ChunkedWriter {
    mtu: usize,
}

impl ChunkedWriter {
    /// Create a writer using the default link MTU
    pub fn new() -> Self {
        Self::with_mtu(MTU)
    }

    /// Create a writer with a custom MTU (at least one byte)
    pub fn with_mtu(mtu: usize) -> Self {
        Self { mtu: mtu.max(1) }
    }

    pub fn mtu(&self) -> usize {
        self.mtu
    }

    /// Send `payload` in order, one segment at a time.
    ///
    /// Stops at the first failed segment and reports how far it got. Nothing
    /// is resent or skipped, and nothing is kept between calls.
    pub async fn send<L: GattLink>(
        &self,
        link: &L,
        handle: Handle,
        payload: &[u8],
    ) -> Result<(), BridgeError> {
        let mut bytes_sent = 0;

        for segment in segments(payload, self.mtu) {
            if let Err(source) = link.write_without_response(handle, segment).await {
                return Err(BridgeError::Write {
                    bytes_sent,
                    bytes_remaining: payload.len() - bytes_sent,
                    source,
                });
            }
            bytes_sent += segment.len();
            trace!("Sent {}/{} bytes to {}", bytes_sent, payload.len(), handle);
        }

        Ok(())
    }
}

impl Default for ChunkedWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gatt::traits::mock::{LinkCall, MockLink};
    use crate::gatt::traits::LinkError;

    fn handle() -> Handle {
        Handle::new(0x0e).unwrap()
    }

    #[test]
    fn test_send_45_bytes() {
        let link = MockLink::new(&[]);
        let writer = ChunkedWriter::new();
        let payload: Vec<u8> = (0..45).collect();

        futures::executor::block_on(async {
            writer.send(&link, handle(), &payload).await.unwrap();
        });

        assert_eq!(link.write_sizes(), vec![20, 20, 5]);
        assert_eq!(link.written_bytes(), payload);
        assert!(link.calls().iter().all(|c| matches!(
            c,
            LinkCall::Write { handle: 0x0e, .. }
        )));
    }

    #[test]
    fn test_send_empty_payload() {
        let link = MockLink::new(&[]);
        let writer = ChunkedWriter::new();

        futures::executor::block_on(async {
            writer.send(&link, handle(), &[]).await.unwrap();
        });

        assert!(link.calls().is_empty());
    }

    #[test]
    fn test_send_exact_multiple() {
        let link = MockLink::new(&[]);
        let writer = ChunkedWriter::new();

        futures::executor::block_on(async {
            writer.send(&link, handle(), &[0x55; 60]).await.unwrap();
        });

        assert_eq!(link.write_sizes(), vec![20, 20, 20]);
    }

    #[test]
    fn test_send_stops_at_first_failure() {
        let link = MockLink::new(&[]);
        link.fail_write_at(1, LinkError::Backend("le link lost".into()));
        let writer = ChunkedWriter::new();

        futures::executor::block_on(async {
            let result = writer.send(&link, handle(), &[0x01; 45]).await;

            match result {
                Err(BridgeError::Write {
                    bytes_sent,
                    bytes_remaining,
                    ..
                }) => {
                    assert_eq!(bytes_sent, 20);
                    assert_eq!(bytes_remaining, 25);
                }
                other => panic!("Expected Write error, got {:?}", other),
            }
        });

        // Third segment never attempted
        assert_eq!(link.write_sizes(), vec![20]);
    }

    #[test]
    fn test_custom_mtu() {
        let link = MockLink::new(&[]);
        let writer = ChunkedWriter::with_mtu(8);

        futures::executor::block_on(async {
            writer.send(&link, handle(), b"hello, world\n").await.unwrap();
        });

        assert_eq!(link.write_sizes(), vec![8, 5]);
    }
}
