//! Datagram encoding and decoding
//!
//! # Pattern
//!
//! ```ignore
//! let mut buf = Vec::with_capacity(256);   // Create once per sender
//! encode_into(&mut buf, &msg, Timestamp::now());
//! socket.send(&buf)?;
//! ```
//!
//! Decoding never fails on content: any datagram of at least [`HEADER_LEN`]
//! bytes yields a message. The payload ends at the first zero byte (or the
//! end of the datagram when the terminator is missing) and invalid UTF-8 is
//! replaced rather than rejected.

use super::message::{MessageClass, Timestamp, WireMessage};
use super::{HEADER_LEN, TERMINATOR};
use crate::error::{Error, Result};

/// Encode a datagram into a caller-owned buffer (cleared first)
pub fn encode_into(buf: &mut Vec<u8>, msg: &WireMessage, timestamp: Timestamp) {
    buf.clear();
    buf.reserve(HEADER_LEN + msg.text.len() + 1);
    for word in [
        msg.tx_id,
        msg.rx_id,
        msg.class_code,
        msg.service_class,
        msg.sequence,
        timestamp.seconds,
        timestamp.nanos,
    ] {
        buf.extend_from_slice(&word.to_be_bytes());
    }
    buf.extend_from_slice(msg.text.as_bytes());
    buf.push(TERMINATOR);
}

/// Encode a datagram stamped with the current time
///
/// Length is always `28 + text.len() + 1`.
pub fn encode(
    tx_id: i32,
    rx_id: i32,
    class: MessageClass,
    service_class: i32,
    sequence: i32,
    text: &str,
) -> Vec<u8> {
    let msg = WireMessage::new(tx_id, rx_id, class, service_class, sequence, text);
    let mut buf = Vec::new();
    encode_into(&mut buf, &msg, Timestamp::now());
    buf
}

/// Decode a datagram, discarding the header timestamp
pub fn decode(bytes: &[u8]) -> Result<WireMessage> {
    decode_with_timestamp(bytes).map(|(msg, _)| msg)
}

/// Decode a datagram, returning the header timestamp alongside
pub fn decode_with_timestamp(bytes: &[u8]) -> Result<(WireMessage, Timestamp)> {
    if bytes.len() < HEADER_LEN {
        return Err(Error::InvalidPacket(format!(
            "datagram of {} bytes is shorter than the {}-byte header",
            bytes.len(),
            HEADER_LEN
        )));
    }

    let word = |index: usize| {
        let at = index * 4;
        i32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
    };

    let body = &bytes[HEADER_LEN..];
    let text_end = body
        .iter()
        .position(|&b| b == TERMINATOR)
        .unwrap_or(body.len());
    let text = String::from_utf8_lossy(&body[..text_end]).into_owned();

    let msg = WireMessage {
        tx_id: word(0),
        rx_id: word(1),
        class_code: word(2),
        service_class: word(3),
        sequence: word(4),
        text,
    };
    let timestamp = Timestamp {
        seconds: word(5),
        nanos: word(6),
    };
    Ok((msg, timestamp))
}
