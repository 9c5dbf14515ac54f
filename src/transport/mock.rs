//! Mock transport for testing

use super::Transport;
use crate::error::{Error, Result};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

/// How long `recv` waits for an injected datagram before reporting a timeout
const MOCK_POLL: Duration = Duration::from_millis(10);

/// In-memory transport: injected datagrams are received, sent ones are recorded
#[derive(Clone)]
pub struct MockTransport {
    inner: Arc<(Mutex<MockTransportInner>, Condvar)>,
}

struct MockTransportInner {
    inbound: VecDeque<Vec<u8>>,
    sent: Vec<Vec<u8>>,
    bound: bool,
    fail_sends: bool,
    recv_failures: usize,
}

impl MockTransport {
    /// Create a new, bound mock transport
    pub fn new() -> Self {
        MockTransport {
            inner: Arc::new((
                Mutex::new(MockTransportInner {
                    inbound: VecDeque::new(),
                    sent: Vec::new(),
                    bound: true,
                    fail_sends: false,
                    recv_failures: 0,
                }),
                Condvar::new(),
            )),
        }
    }

    /// Queue a datagram to be returned by `recv`
    pub fn inject(&self, datagram: Vec<u8>) {
        let (lock, cvar) = &*self.inner;
        lock.lock().inbound.push_back(datagram);
        cvar.notify_one();
    }

    /// All datagrams sent so far
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.inner.0.lock().sent.clone()
    }

    /// Make every subsequent send fail with an I/O error
    pub fn fail_sends(&self, fail: bool) {
        self.inner.0.lock().fail_sends = fail;
    }

    /// Make the next `count` receives fail with an I/O error while still bound
    pub fn fail_recvs(&self, count: usize) {
        self.inner.0.lock().recv_failures = count;
    }
}

impl Transport for MockTransport {
    fn send(&self, datagram: &[u8]) -> Result<()> {
        let mut inner = self.inner.0.lock();
        if !inner.bound {
            return Err(Error::NotBound);
        }
        if inner.fail_sends {
            return Err(Error::Io(std::io::Error::other("mock send failure")));
        }
        inner.sent.push(datagram.to_vec());
        Ok(())
    }

    fn recv(&self, buffer: &mut [u8]) -> Result<Option<usize>> {
        let (lock, cvar) = &*self.inner;
        let mut inner = lock.lock();
        if !inner.bound {
            return Err(Error::NotBound);
        }
        if inner.recv_failures > 0 {
            inner.recv_failures -= 1;
            return Err(Error::Io(std::io::Error::other("mock receive failure")));
        }
        if inner.inbound.is_empty() {
            cvar.wait_for(&mut inner, MOCK_POLL);
        }
        match inner.inbound.pop_front() {
            Some(datagram) => {
                let len = datagram.len().min(buffer.len());
                buffer[..len].copy_from_slice(&datagram[..len]);
                Ok(Some(len))
            }
            None => Ok(None),
        }
    }

    fn close(&self) {
        let (lock, cvar) = &*self.inner;
        lock.lock().bound = false;
        cvar.notify_all();
    }

    fn is_bound(&self) -> bool {
        self.inner.0.lock().bound
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}
