//! Dispatch loop
//!
//! Pops inbound messages oldest first and routes each one to the handler
//! owning its sequence number.
//!
//! | Situation | Outcome |
//! |-----------|---------|
//! | Known class, registered sequence | event delivered to the handler |
//! | Unregistered sequence | dropped, logged (late reply or foreign traffic) |
//! | Unknown class or COMMAND | ignored, logged |
//! | Handler callback panics | panic caught and logged, loop continues |

use crate::protocol::WireMessage;
use crate::proxy::handler::{HandlerEvent, RequestHandler};
use crate::proxy::queue::{InboundReceiver, Pop};
use crate::proxy::registry::SequenceRegistry;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// What happened to one dispatched message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Delivered,
    NoHandler,
    Ignored,
    Panicked,
}

/// Route one message to its handler
pub fn dispatch(registry: &SequenceRegistry<RequestHandler>, msg: WireMessage) -> DispatchOutcome {
    let sequence = msg.sequence;
    let class_code = msg.class_code;

    let Some(event) = HandlerEvent::from_message(msg) else {
        log::debug!(
            "Ignoring message class {} for seq={}",
            class_code,
            sequence
        );
        return DispatchOutcome::Ignored;
    };

    let Some(handler) = registry.lookup(sequence) else {
        log::info!(
            "No handler for seq={} ({:?}), dropping",
            sequence,
            event
        );
        return DispatchOutcome::NoHandler;
    };

    match panic::catch_unwind(AssertUnwindSafe(|| handler.complete(event))) {
        Ok(()) => DispatchOutcome::Delivered,
        Err(cause) => {
            let reason = cause
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| cause.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            log::error!("Handler for seq={} panicked: {}", sequence, reason);
            DispatchOutcome::Panicked
        }
    }
}

/// Queue to handler pump
pub struct DispatchPump {
    registry: Arc<SequenceRegistry<RequestHandler>>,
    queue: InboundReceiver,
    running: Arc<AtomicBool>,
    poll: Duration,
}

impl DispatchPump {
    pub fn new(
        registry: Arc<SequenceRegistry<RequestHandler>>,
        queue: InboundReceiver,
        running: Arc<AtomicBool>,
        poll: Duration,
    ) -> Self {
        Self {
            registry,
            queue,
            running,
            poll,
        }
    }

    /// Run until the running flag clears or the producer goes away
    pub fn run(&mut self) {
        log::info!("Dispatch loop started (poll {:?})", self.poll);
        let mut delivered: u64 = 0;
        let mut dropped: u64 = 0;

        while self.running.load(Ordering::Relaxed) {
            match self.queue.pop_timeout(self.poll) {
                Pop::Message(msg) => match dispatch(&self.registry, msg) {
                    DispatchOutcome::Delivered => delivered += 1,
                    _ => dropped += 1,
                },
                Pop::Empty => {}
                Pop::Closed => {
                    log::debug!("Inbound queue closed");
                    break;
                }
            }
        }

        log::info!(
            "Dispatch loop stopped ({} delivered, {} dropped)",
            delivered,
            dropped
        );
    }
}
