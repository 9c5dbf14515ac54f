//! Receive loop
//!
//! Blocks on the transport (bounded by its read timeout), decodes each
//! datagram and appends it to the inbound queue.
//!
//! # Failure handling
//!
//! - **Transport closed on purpose** (`NotBound`): expected during shutdown,
//!   logged at debug only.
//! - **Receive error while bound**: logged as an error, loop continues.
//! - **Undecodable datagram**: logged as a warning and dropped.

use crate::error::Error;
use crate::protocol::decode;
use crate::proxy::queue::InboundSender;
use crate::transport::Transport;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// Back-off after a receive error so a persistent fault does not spin
const ERROR_BACKOFF: Duration = Duration::from_millis(10);

/// Back-off while the transport is deliberately closed
const UNBOUND_BACKOFF: Duration = Duration::from_millis(50);

/// Socket to queue pump
pub struct ReceivePump {
    transport: Arc<dyn Transport>,
    queue: InboundSender,
    running: Arc<AtomicBool>,
    /// Reused for every datagram
    buffer: Vec<u8>,
}

impl ReceivePump {
    pub fn new(
        transport: Arc<dyn Transport>,
        queue: InboundSender,
        running: Arc<AtomicBool>,
        buffer_len: usize,
    ) -> Self {
        Self {
            transport,
            queue,
            running,
            buffer: vec![0u8; buffer_len],
        }
    }

    /// Run until the running flag clears or the consumer goes away
    pub fn run(&mut self) {
        log::info!("Receive loop started");
        let mut received: u64 = 0;

        while self.running.load(Ordering::Relaxed) {
            match self.transport.recv(&mut self.buffer) {
                Ok(Some(len)) => match decode(&self.buffer[..len]) {
                    Ok(msg) => {
                        received += 1;
                        log::trace!(
                            "Received class={} seq={} text={:?}",
                            msg.class_code,
                            msg.sequence,
                            msg.text
                        );
                        if !self.queue.push(msg) {
                            log::warn!("Dispatch queue closed, receive loop exiting");
                            break;
                        }
                    }
                    Err(e) => log::warn!("Dropping datagram: {}", e),
                },
                Ok(None) => {
                    // Poll timeout, check running flag
                }
                Err(Error::NotBound) => {
                    log::debug!("Receive while transport closed");
                    thread::sleep(UNBOUND_BACKOFF);
                }
                Err(e) => {
                    log::error!("Receive error: {}", e);
                    thread::sleep(ERROR_BACKOFF);
                }
            }
        }

        log::info!("Receive loop stopped ({} datagrams)", received);
    }
}
