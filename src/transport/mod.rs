//! Datagram transport abstraction
//!
//! The proxy only needs to send one datagram to the far end and to receive
//! datagrams with a bounded wait, so the trait is deliberately narrow. The
//! bound flag distinguishes a transport that was closed on purpose (receive
//! failures are expected and quiet) from a live one (failures are reported).

use crate::error::Result;

mod mock;
mod udp;

pub use mock::MockTransport;
pub use udp::UdpTransport;

/// Transport trait for far-end communication
pub trait Transport: Send + Sync {
    /// Send one datagram to the far end
    ///
    /// Returns [`crate::Error::NotBound`] once the transport has been closed.
    fn send(&self, datagram: &[u8]) -> Result<()>;

    /// Receive one datagram into `buffer`
    ///
    /// `Ok(None)` means the poll timeout elapsed with nothing to read.
    fn recv(&self, buffer: &mut [u8]) -> Result<Option<usize>>;

    /// Mark the transport closed; subsequent sends and receives fail with `NotBound`
    fn close(&self);

    /// Whether the transport is expected to be live
    fn is_bound(&self) -> bool;
}
