//! Core domain types shared by the proxy and its callers

pub mod session;
pub mod types;

pub use session::{RequestContext, Session};
pub use types::{Command, CommandResult, codes};
