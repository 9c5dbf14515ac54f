//! UDP transport to the telescope control system

use super::Transport;
use crate::error::{Error, Result};
use std::io::ErrorKind;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// UDP socket bound locally and aimed at a single far-end address
///
/// `send_to` on a UDP socket is atomic per datagram, so concurrent senders
/// share the socket without extra locking.
pub struct UdpTransport {
    socket: UdpSocket,
    remote: SocketAddr,
    bound: AtomicBool,
}

impl UdpTransport {
    /// Bind the local port and resolve the far-end address
    ///
    /// `read_timeout` bounds each receive so the receive loop can observe shutdown.
    pub fn bind(
        local_port: u16,
        remote_host: &str,
        remote_port: u16,
        read_timeout: Duration,
    ) -> Result<Self> {
        let remote = (remote_host, remote_port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                Error::Config(format!(
                    "remote host {}:{} did not resolve",
                    remote_host, remote_port
                ))
            })?;

        let local: SocketAddr = if remote.is_ipv4() {
            SocketAddr::from(([0, 0, 0, 0], local_port))
        } else {
            SocketAddr::from(([0u16; 8], local_port))
        };
        let socket = UdpSocket::bind(local)?;
        socket.set_read_timeout(Some(read_timeout))?;

        log::info!(
            "UDP transport bound on {} (far end {})",
            socket.local_addr()?,
            remote
        );

        Ok(Self {
            socket,
            remote,
            bound: AtomicBool::new(true),
        })
    }

    /// Local address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Far-end address datagrams are sent to
    pub fn remote_addr(&self) -> SocketAddr {
        self.remote
    }
}

impl Transport for UdpTransport {
    fn send(&self, datagram: &[u8]) -> Result<()> {
        if !self.is_bound() {
            return Err(Error::NotBound);
        }
        let sent = self.socket.send_to(datagram, self.remote)?;
        if sent != datagram.len() {
            return Err(Error::Other(format!(
                "short UDP send: {} of {} bytes",
                sent,
                datagram.len()
            )));
        }
        Ok(())
    }

    fn recv(&self, buffer: &mut [u8]) -> Result<Option<usize>> {
        if !self.is_bound() {
            return Err(Error::NotBound);
        }
        match self.socket.recv_from(buffer) {
            Ok((len, from)) => {
                log::trace!("Received {} bytes from {}", len, from);
                Ok(Some(len))
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
                Ok(None)
            }
            Err(_) if !self.is_bound() => Err(Error::NotBound),
            Err(e) => Err(Error::Io(e)),
        }
    }

    fn close(&self) {
        self.bound.store(false, Ordering::Release);
    }

    fn is_bound(&self) -> bool {
        self.bound.load(Ordering::Acquire)
    }
}
