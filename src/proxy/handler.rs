//! Per-request state machine
//!
//! One [`RequestHandler`] exists for each command in flight:
//!
//! ```text
//! ┌─────────┐ send() ┌──────┐  DONE / RESPONSE / ERROR  ┌───────────┐
//! │ Created │───────▶│ Sent │──────────────────────────▶│ Completed │
//! └─────────┘        └──────┘                           └───────────┘
//!      │              │    ▲                                  ▲
//!      │              └────┘ ACK / ACTION (keep-alive relay)  │
//!      └──────────────────────────────────────────────────────┘
//!        translation failure, no-op translation, transmit failure
//! ```
//!
//! Completion happens exactly once: the first terminal event wins, the handler
//! deregisters its sequence number, delivers the result and drops its session.
//! Every later event is a silent no-op.
//!
//! There is no internal timeout. A handler whose reply never arrives stays
//! registered; only the caller's own wait (sized from [`RequestHandler::handling_time`])
//! gives up on it.

use crate::core::session::{RequestContext, Session};
use crate::core::types::{Command, CommandResult, codes};
use crate::protocol::{MessageClass, Timestamp, WireMessage, encode_into};
use crate::proxy::context::ProxyContext;
use crate::translator::translate_reply;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Scale applied to the handling time when relaying a keep-alive
pub const KEEP_ALIVE_FUDGE: f64 = 1.1;

/// Added to the handling time reported upward, covering relay latency
pub const HANDLING_TIME_MARGIN: Duration = Duration::from_secs(10);

/// Events routed to a handler by the dispatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerEvent {
    Ack(String),
    Action(String),
    Done(String),
    Response(String),
    Error(String),
}

impl HandlerEvent {
    /// Map a wire message to a handler event
    ///
    /// COMMAND datagrams and unknown classes have no meaning for a handler.
    pub fn from_message(msg: WireMessage) -> Option<Self> {
        let event = match msg.class()? {
            MessageClass::Ack => Self::Ack(msg.text),
            MessageClass::Action => Self::Action(msg.text),
            MessageClass::Done => Self::Done(msg.text),
            MessageClass::Response => Self::Response(msg.text),
            MessageClass::Error => Self::Error(msg.text),
            MessageClass::Command => return None,
        };
        Some(event)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done(_) | Self::Response(_) | Self::Error(_))
    }
}

/// Persisted handler state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerState {
    Created,
    Sent,
    Completed,
}

/// One in-flight proxied command
pub struct RequestHandler {
    request: RequestContext,
    command: Command,
    context: Arc<ProxyContext>,
    /// Wire text once translated and handed to the transport
    wire_text: Mutex<Option<String>>,
    /// Current estimate, refreshed by ACKs that carry one
    handling_time: Mutex<Duration>,
    completed: AtomicBool,
    /// Cleared on completion
    session: Mutex<Option<Arc<dyn Session>>>,
}

impl RequestHandler {
    /// Allocate a sequence number and register a new handler under it
    pub fn create(
        context: &Arc<ProxyContext>,
        command: Command,
        session: Arc<dyn Session>,
    ) -> Arc<Self> {
        let command_type = command.type_name();
        let handling_time = context.handling_time(command_type);
        let handler = context.registry.allocate(|sequence| {
            Arc::new(Self {
                request: RequestContext {
                    sequence,
                    command_type,
                },
                command,
                context: Arc::clone(context),
                wire_text: Mutex::new(None),
                handling_time: Mutex::new(handling_time),
                completed: AtomicBool::new(false),
                session: Mutex::new(Some(session)),
            })
        });
        log::debug!(
            "Created handler seq={} for {} (handling time {:?})",
            handler.sequence(),
            command_type,
            handling_time
        );
        handler
    }

    pub fn sequence(&self) -> i32 {
        self.request.sequence
    }

    pub fn request(&self) -> &RequestContext {
        &self.request
    }

    pub fn command(&self) -> &Command {
        &self.command
    }

    /// Translated wire text, once sent
    pub fn wire_text(&self) -> Option<String> {
        self.wire_text.lock().clone()
    }

    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }

    pub fn state(&self) -> HandlerState {
        if self.is_completed() {
            HandlerState::Completed
        } else if self.wire_text.lock().is_some() {
            HandlerState::Sent
        } else {
            HandlerState::Created
        }
    }

    /// Handling time reported upward: current estimate plus a fixed margin
    pub fn handling_time(&self) -> Duration {
        *self.handling_time.lock() + HANDLING_TIME_MARGIN
    }

    /// Translate the command and put it on the wire
    ///
    /// Translation and transmit failures complete the handler immediately
    /// with a failed result; nothing is retried.
    pub fn send(&self) {
        let text = match self.context.translator.translate_command(&self.command) {
            Ok(Some(text)) => text,
            Ok(None) => {
                log::info!(
                    "seq={}: {} has no {} representation, completing as no-op",
                    self.sequence(),
                    self.request.command_type,
                    self.context.translator.name()
                );
                self.finish(CommandResult::ok(Vec::new()));
                return;
            }
            Err(e) => {
                log::warn!("seq={}: translation failed: {}", self.sequence(), e);
                self.finish(CommandResult::failed(
                    codes::TRANSLATION_FAILED,
                    e.to_string(),
                ));
                return;
            }
        };

        let endpoint = self.context.endpoint;
        let msg = WireMessage::new(
            endpoint.local_id,
            endpoint.remote_id,
            MessageClass::Command,
            endpoint.service_class,
            self.sequence(),
            text.as_str(),
        );
        let mut datagram = Vec::with_capacity(text.len() + 64);
        encode_into(&mut datagram, &msg, Timestamp::now());

        // Recorded before sending so a fast reply sees the Sent state
        *self.wire_text.lock() = Some(text);

        match self.context.transport.send(&datagram) {
            Ok(()) => {
                log::info!("seq={}: sent {:?}", self.sequence(), msg.text);
            }
            Err(e) => {
                log::warn!("seq={}: transmit failed: {}", self.sequence(), e);
                self.finish(CommandResult::failed(codes::TRANSMIT_FAILED, e.to_string()));
            }
        }
    }

    /// Single entry point for every event routed to this handler
    pub fn complete(&self, event: HandlerEvent) {
        if self.is_completed() {
            log::debug!(
                "seq={}: ignoring {:?} after completion",
                self.sequence(),
                event
            );
            return;
        }

        match event {
            HandlerEvent::Ack(text) | HandlerEvent::Action(text) => self.keep_alive(&text),
            HandlerEvent::Done(text) | HandlerEvent::Response(text) => {
                let result = translate_reply(
                    self.context.translator.as_ref(),
                    &self.command,
                    &text,
                );
                self.finish(result);
            }
            HandlerEvent::Error(text) => {
                let mut result = translate_reply(
                    self.context.translator.as_ref(),
                    &self.command,
                    &text,
                );
                if result.success {
                    result = CommandResult::failed(codes::FAR_END_ERROR, text.trim());
                }
                self.finish(result);
            }
        }
    }

    /// Relay a keep-alive upward
    ///
    /// An ACK whose first token is a number carries the far end's own
    /// estimate in milliseconds and replaces the stored handling time.
    fn keep_alive(&self, text: &str) {
        let estimate = {
            let mut handling_time = self.handling_time.lock();
            if let Some(ms) = reported_millis(text) {
                *handling_time = Duration::from_millis(ms);
            }
            *handling_time
        };
        let time_to_complete = estimate.mul_f64(KEEP_ALIVE_FUDGE);

        let session = self.session.lock().clone();
        match session {
            Some(session) => {
                log::debug!(
                    "seq={}: keep-alive, time to complete {:?}",
                    self.sequence(),
                    time_to_complete
                );
                session.deliver_ack(&self.request, time_to_complete);
            }
            None => log::trace!("seq={}: keep-alive with no session", self.sequence()),
        }
    }

    /// Complete exactly once: deregister, deliver, drop the session
    fn finish(&self, result: CommandResult) {
        if self.completed.swap(true, Ordering::AcqRel) {
            log::debug!("seq={}: already completed", self.sequence());
            return;
        }

        self.context.registry.deregister(self.sequence());
        let session = self.session.lock().take();

        if result.success {
            log::info!(
                "seq={}: {} completed: {}",
                self.sequence(),
                self.request.command_type,
                result
            );
        } else {
            log::warn!(
                "seq={}: {} failed: {}",
                self.sequence(),
                self.request.command_type,
                result
            );
        }

        if let Some(session) = session {
            session.deliver_done(&self.request, result);
        }
    }
}

/// Far-end completion estimate carried in an ACK, in milliseconds
fn reported_millis(text: &str) -> Option<u64> {
    text.split_whitespace().next()?.parse::<u64>().ok()
}
