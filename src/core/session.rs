//! Interface back to the session that originated a command

use crate::core::types::CommandResult;
use std::time::Duration;

/// Identifies one proxied request to its originating session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub sequence: i32,
    pub command_type: &'static str,
}

/// Callbacks into the originating session
///
/// `deliver_ack` may be called any number of times before the single
/// `deliver_done`. Implementations are called from the dispatch thread and
/// must not block for long.
pub trait Session: Send + Sync {
    /// Keep-alive: the command is still in progress and should finish within `time_to_complete`
    fn deliver_ack(&self, ctx: &RequestContext, time_to_complete: Duration);

    /// Final result; called exactly once per request
    fn deliver_done(&self, ctx: &RequestContext, result: CommandResult);
}
