//! Blocking session used by the caller-facing path
//!
//! The caller waits for the single final result. The wait starts at the
//! handler's reported handling time and each keep-alive pushes the deadline
//! out to at least `now + time_to_complete`; a deadline never moves earlier.

use crate::core::session::{RequestContext, Session};
use crate::core::types::{CommandResult, codes};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One-shot completion slot
pub struct CompletionSlot {
    state: Mutex<SlotState>,
    cvar: Condvar,
}

#[derive(Default)]
struct SlotState {
    deadline: Option<Instant>,
    result: Option<CommandResult>,
    acks: u32,
}

impl SlotState {
    fn extend_to(&mut self, deadline: Instant) {
        self.deadline = Some(match self.deadline {
            Some(current) if current > deadline => current,
            _ => deadline,
        });
    }
}

impl CompletionSlot {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(SlotState::default()),
            cvar: Condvar::new(),
        })
    }

    /// Block until the result arrives or the (possibly extended) deadline passes
    ///
    /// On timeout the caller gets a failed result with
    /// [`codes::LOCAL_TIMEOUT`]; the far end is not told.
    pub fn wait(&self, initial: Duration) -> CommandResult {
        let mut state = self.state.lock();
        state.extend_to(Instant::now() + initial);

        loop {
            if let Some(result) = state.result.take() {
                return result;
            }
            let deadline = state.deadline.unwrap_or_else(Instant::now);
            if Instant::now() >= deadline {
                return CommandResult::failed(
                    codes::LOCAL_TIMEOUT,
                    format!("no reply after {} keep-alive(s)", state.acks),
                );
            }
            self.cvar.wait_until(&mut state, deadline);
        }
    }

    /// Result without blocking, if already delivered
    pub fn try_result(&self) -> Option<CommandResult> {
        self.state.lock().result.clone()
    }

    /// Keep-alives received so far
    pub fn acks(&self) -> u32 {
        self.state.lock().acks
    }
}

impl Session for CompletionSlot {
    fn deliver_ack(&self, ctx: &RequestContext, time_to_complete: Duration) {
        let mut state = self.state.lock();
        state.acks += 1;
        state.extend_to(Instant::now() + time_to_complete);
        log::trace!(
            "seq={}: deadline extended by {:?}",
            ctx.sequence,
            time_to_complete
        );
        self.cvar.notify_all();
    }

    fn deliver_done(&self, _ctx: &RequestContext, result: CommandResult) {
        let mut state = self.state.lock();
        state.result = Some(result);
        self.cvar.notify_all();
    }
}
