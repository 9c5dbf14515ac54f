//! In-memory representation of one wire datagram

use super::EPOCH_UNIX_MS;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Protocol message class carried in the third header word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum MessageClass {
    Command = 1,
    Response = 2,
    Ack = 3,
    Action = 4,
    Done = 5,
    Error = 6,
}

impl MessageClass {
    /// Map a wire code to a class; unknown codes yield `None`
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Command),
            2 => Some(Self::Response),
            3 => Some(Self::Ack),
            4 => Some(Self::Action),
            5 => Some(Self::Done),
            6 => Some(Self::Error),
            _ => None,
        }
    }

    /// Wire code for this class
    #[inline]
    pub fn code(self) -> i32 {
        self as i32
    }

    /// True for classes that finish a request (DONE, RESPONSE, ERROR)
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Response | Self::Error)
    }
}

impl fmt::Display for MessageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Command => "COMMAND",
            Self::Response => "RESPONSE",
            Self::Ack => "ACK",
            Self::Action => "ACTION",
            Self::Done => "DONE",
            Self::Error => "ERROR",
        };
        f.write_str(name)
    }
}

/// Header timestamp: elapsed time since the 1980-01-05 reference epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timestamp {
    pub seconds: i32,
    pub nanos: i32,
}

impl Timestamp {
    /// Build from milliseconds since the Unix epoch
    pub fn from_unix_millis(unix_ms: u64) -> Self {
        let elapsed = unix_ms.saturating_sub(EPOCH_UNIX_MS);
        Self {
            seconds: (elapsed / 1000) as i32,
            nanos: ((elapsed % 1000) * 1_000_000) as i32,
        }
    }

    /// Current wall-clock time (millisecond resolution)
    pub fn now() -> Self {
        let unix_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self::from_unix_millis(unix_ms)
    }
}

/// One decoded protocol event
///
/// The class is kept as the raw wire code so that classes added by the far
/// end survive decoding; [`WireMessage::class`] returns `None` for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireMessage {
    pub tx_id: i32,
    pub rx_id: i32,
    pub class_code: i32,
    pub service_class: i32,
    pub sequence: i32,
    pub text: String,
}

impl WireMessage {
    pub fn new(
        tx_id: i32,
        rx_id: i32,
        class: MessageClass,
        service_class: i32,
        sequence: i32,
        text: impl Into<String>,
    ) -> Self {
        Self {
            tx_id,
            rx_id,
            class_code: class.code(),
            service_class,
            sequence,
            text: text.into(),
        }
    }

    /// Recognised message class, if any
    pub fn class(&self) -> Option<MessageClass> {
        MessageClass::from_code(self.class_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_codes() {
        for code in 1..=6 {
            let class = MessageClass::from_code(code).unwrap();
            assert_eq!(class.code(), code);
        }
        assert_eq!(MessageClass::from_code(0), None);
        assert_eq!(MessageClass::from_code(7), None);
        assert_eq!(MessageClass::from_code(-3), None);
    }

    #[test]
    fn test_terminal_classes() {
        assert!(MessageClass::Done.is_terminal());
        assert!(MessageClass::Response.is_terminal());
        assert!(MessageClass::Error.is_terminal());
        assert!(!MessageClass::Ack.is_terminal());
        assert!(!MessageClass::Action.is_terminal());
        assert!(!MessageClass::Command.is_terminal());
    }

    #[test]
    fn test_timestamp_epoch() {
        let ts = Timestamp::from_unix_millis(EPOCH_UNIX_MS);
        assert_eq!(ts, Timestamp { seconds: 0, nanos: 0 });

        // One day, 1.5 seconds after the reference epoch
        let ts = Timestamp::from_unix_millis(EPOCH_UNIX_MS + 86_401_500);
        assert_eq!(ts.seconds, 86_401);
        assert_eq!(ts.nanos, 500_000_000);
    }

    #[test]
    fn test_timestamp_before_epoch_saturates() {
        let ts = Timestamp::from_unix_millis(0);
        assert_eq!(ts, Timestamp::default());
    }

    #[test]
    fn test_unknown_class_preserved() {
        let mut msg = WireMessage::new(1, 2, MessageClass::Ack, 3, 4, "");
        msg.class_code = 42;
        assert_eq!(msg.class(), None);
    }
}
