//! Inbound queue between the receiver (sole producer) and dispatcher (sole consumer)
//!
//! Backed by an unbounded crossbeam channel, so the dispatcher wakes as soon
//! as a message arrives instead of waiting out a full poll interval. Arrival
//! order is preserved.

use crate::protocol::WireMessage;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use std::time::Duration;

/// Result of waiting on the queue
#[derive(Debug, PartialEq, Eq)]
pub enum Pop {
    Message(WireMessage),
    /// Poll interval elapsed with nothing queued
    Empty,
    /// Producer has gone away and the queue is drained
    Closed,
}

/// Producer half, owned by the receive loop
pub struct InboundSender {
    tx: Sender<WireMessage>,
}

/// Consumer half, owned by the dispatch loop
pub struct InboundReceiver {
    rx: Receiver<WireMessage>,
}

/// Create a connected queue pair
pub fn inbound_queue() -> (InboundSender, InboundReceiver) {
    let (tx, rx) = unbounded();
    (InboundSender { tx }, InboundReceiver { rx })
}

impl InboundSender {
    /// Append a message; returns false if the consumer has gone away
    pub fn push(&self, msg: WireMessage) -> bool {
        self.tx.send(msg).is_ok()
    }
}

impl InboundReceiver {
    /// Pop the oldest message, waiting at most `poll`
    pub fn pop_timeout(&self, poll: Duration) -> Pop {
        match self.rx.recv_timeout(poll) {
            Ok(msg) => Pop::Message(msg),
            Err(RecvTimeoutError::Timeout) => Pop::Empty,
            Err(RecvTimeoutError::Disconnected) => Pop::Closed,
        }
    }

    /// Messages waiting to be dispatched
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::MessageClass;

    fn msg(seq: i32) -> WireMessage {
        WireMessage::new(1, 17, MessageClass::Ack, 1, seq, "")
    }

    #[test]
    fn test_fifo_order() {
        let (tx, rx) = inbound_queue();
        for seq in 0..5 {
            assert!(tx.push(msg(seq)));
        }
        assert_eq!(rx.len(), 5);
        for seq in 0..5 {
            assert_eq!(rx.pop_timeout(Duration::from_millis(1)), Pop::Message(msg(seq)));
        }
        assert_eq!(rx.pop_timeout(Duration::from_millis(1)), Pop::Empty);
    }

    #[test]
    fn test_closed_after_drain() {
        let (tx, rx) = inbound_queue();
        tx.push(msg(1));
        drop(tx);
        assert_eq!(rx.pop_timeout(Duration::from_millis(1)), Pop::Message(msg(1)));
        assert_eq!(rx.pop_timeout(Duration::from_millis(1)), Pop::Closed);
    }

    #[test]
    fn test_push_after_consumer_dropped() {
        let (tx, rx) = inbound_queue();
        drop(rx);
        assert!(!tx.push(msg(1)));
    }
}
