//! Input pump
//!
//! Reads console lines and sends each one to the transmit characteristic.
//! Meant to run on its own thread: line reads block.

use std::sync::Arc;

use log::{debug, error, info};

use crate::bridge::link::LinkAuthority;
use crate::bridge::writer::ChunkedWriter;
use crate::console::reader::LineReader;
use crate::console::traits::LineSource;
use crate::gatt::traits::{GattLink, Handle};

/// Why the pump stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpExit {
    /// Console input ended
    EndOfInput,
    /// A write failed; the link is considered broken
    WriteFailed,
    /// Reading the console failed
    InputError,
}

/// Input pump
pub struct InputPump<L, S> {
    link: Arc<LinkAuthority<L>>,
    writer: ChunkedWriter,
    handle: Handle,
    reader: LineReader<S>,
}

impl<L: GattLink, S: LineSource> InputPump<L, S> {
    pub fn new(
        link: Arc<LinkAuthority<L>>,
        writer: ChunkedWriter,
        handle: Handle,
        reader: LineReader<S>,
    ) -> Self {
        Self {
            link,
            writer,
            handle,
            reader,
        }
    }

    /// Run until end of input or the first write failure. Never retries.
    pub async fn run(mut self) -> PumpExit {
        loop {
            let line = match self.reader.next_line() {
                Ok(Some(line)) => line,
                Ok(None) => {
                    info!("Console input ended");
                    return PumpExit::EndOfInput;
                }
                Err(e) => {
                    error!("Failed to read console input: {}", e);
                    return PumpExit::InputError;
                }
            };

            if !line.complete {
                debug!(
                    "Line longer than {} bytes, sending in pieces",
                    self.reader.max_len()
                );
            }

            if let Err(e) = self
                .writer
                .send(self.link.as_ref(), self.handle, &line.bytes)
                .await
            {
                error!("Failed to send data to TX characteristic {}: {}", self.handle, e);
                return PumpExit::WriteFailed;
            }
        }
    }
}
