//! MOAS Protocol Library
//!
//! This crate provides parsing and encoding for the host protocol of the
//! MOAS II multi-station antenna switch: six radio stations sharing a bank of
//! 64 antennas switched by 64 relays.
//!
//! # Wire format
//!
//! Commands and replies are ASCII and end with `;`. Stations are the digits
//! `1`-`6`. Antenna, relay, and system numbers are single symbols from a
//! 64-character alphabet (see [`sixbit`]).
//!
//! - `!1T5AB;` host → switch: station 1 transmits on antenna 5 via relays 10, 11
//! - `!1S5;` switch → host: station 1's transmit antenna is now 5
//! - `?A;` switch → host: the last command had a bad argument
//!
//! # Example
//!
//! ```rust
//! use moas_protocol::{CommandCodec, EncodeCommand, SwitchCommand};
//!
//! let mut codec = CommandCodec::new();
//! let frames = codec.push_bytes(b"';");
//! assert_eq!(frames, vec![Ok(SwitchCommand::Ping)]);
//! assert_eq!(SwitchCommand::Ping.encode(), b"';");
//! ```

pub mod codec;
pub mod command;
pub mod error;
pub mod reply;
pub mod sixbit;
pub mod types;

pub use codec::{CommandCodec, DEFAULT_COMMAND_BUFFER_LEN};
pub use command::{
    AntennaRole, StateFlag, StationFlagEdit, StatusQuery, SwitchCommand, SystemEdit, TableEdit,
    TimerKind,
};
pub use error::ParseError;
pub use reply::{Direction, ErrorReply, LineState, Reply};
pub use types::{
    Antenna, Relay, RelaySet, Station, StationSet, ANTENNAS, RELAYS, STATIONS,
};

/// Command terminator
pub const TERMINATOR: u8 = b';';

/// Discards the command being accumulated
pub const CANCEL: u8 = b'$';

/// Trait for encoding a message to its wire bytes
pub trait EncodeCommand {
    /// Encode to bytes, terminator included
    fn encode(&self) -> Vec<u8>;
}
