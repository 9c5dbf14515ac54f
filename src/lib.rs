//! CIL proxy - command/response bridge to a telescope control system
//!
//! Accepts abstract telescope commands, sends them to the TCS as binary UDP
//! datagrams, correlates the asynchronous ACK/ACTION/DONE/ERROR replies by
//! sequence number and hands each caller exactly one final result.
//!
//! ## Layers
//!
//! - [`protocol`]: bit-exact datagram codec
//! - [`transport`]: datagram send/receive (UDP, mock)
//! - [`translator`]: pluggable command/reply dialects (real TCS, simulator)
//! - [`proxy`]: sequence registry, request handlers, receive/dispatch pumps, server

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod proxy;
pub mod translator;
pub mod transport;

// Re-export commonly used types
pub use config::Config;
pub use crate::core::{Command, CommandResult, RequestContext, Session, codes};
pub use error::{Error, Result};
pub use proxy::{CompletionSlot, ProxyServer, RequestHandler, SequenceRegistry};
pub use translator::{CommandTranslator, create_translator};
