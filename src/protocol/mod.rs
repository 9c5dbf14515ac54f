//! Binary wire protocol spoken with the telescope control system
//!
//! Every protocol event travels as one UDP datagram:
//!
//! ```text
//! ┌──────┬──────┬───────┬─────────┬──────────┬─────────┬─────────┬─────────────┬──────┐
//! │ txId │ rxId │ class │ service │ sequence │ ts secs │ ts nsec │ text (N)    │ 0x00 │
//! │ i32  │ i32  │ i32   │ i32     │ i32      │ i32     │ i32     │ raw bytes   │      │
//! └──────┴──────┴───────┴─────────┴──────────┴─────────┴─────────┴─────────────┴──────┘
//!  <──────────────────────── 28-byte header, big-endian ────────────────────────>
//! ```
//!
//! Timestamps count from 1980-01-05T00:00:00Z and are only millisecond
//! accurate (nanoseconds are derived from wall-clock milliseconds).

pub mod codec;
pub mod message;

pub use codec::{decode, decode_with_timestamp, encode, encode_into};
pub use message::{MessageClass, Timestamp, WireMessage};

/// Fixed header length: seven big-endian 32-bit integers
pub const HEADER_LEN: usize = 28;

/// Trailing terminator appended after the payload text
pub const TERMINATOR: u8 = 0x00;

/// Reference epoch (1980-01-05T00:00:00Z) as milliseconds since the Unix epoch
pub const EPOCH_UNIX_MS: u64 = 315_878_400_000;

/// Largest datagram the receive path expects
pub const MAX_DATAGRAM_LEN: usize = 65_536;
