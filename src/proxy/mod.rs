//! CIL proxy core
//!
//! # Thread Model
//!
//! 1. **Receiver thread** (`cil-receiver`): blocks on the socket, decodes each
//!    datagram and appends it to the inbound queue.
//! 2. **Dispatcher thread** (`cil-dispatcher`): pops the oldest queued message,
//!    finds the handler owning its sequence number and routes the event to it.
//! 3. **Callers**: any number of threads creating and sending handlers through
//!    [`ProxyServer::submit`] / [`ProxyServer::execute`].
//!
//! The sequence registry and the inbound queue are the only shared mutable
//! structures; each synchronises itself.

pub mod completion;
pub mod context;
pub mod dispatcher;
pub mod handler;
pub mod queue;
pub mod receiver;
pub mod registry;
pub mod server;

pub use completion::CompletionSlot;
pub use context::{Endpoint, ProxyContext};
pub use dispatcher::{DispatchOutcome, DispatchPump, dispatch};
pub use handler::{HandlerEvent, HandlerState, RequestHandler};
pub use queue::{InboundReceiver, InboundSender, Pop, inbound_queue};
pub use receiver::ReceivePump;
pub use registry::SequenceRegistry;
pub use server::ProxyServer;
