//! MOAS Switch Engine
//!
//! This crate emulates the control logic of a MOAS II multi-station antenna
//! switch: the command interpreter, the relay/inhibit output computation,
//! and the conflict resolver that decides when pending antenna changes may
//! take effect.
//!
//! # Architecture
//!
//! The engine is synchronous and owns all of its state. Bytes from the host
//! link go through a [`CommandCodec`](moas_protocol::CommandCodec) into typed
//! [`SwitchCommand`](moas_protocol::SwitchCommand)s; handlers update the
//! [`SwitchState`], run the resolver, and recompute the outputs. Everything
//! the switch would send or drive is collected as [`SwitchEvent`]s:
//!
//! - `Reply` - text for the host link (replies and unsolicited events)
//! - `RelayUpdate` - relay outputs and inhibited stations
//! - `AntennaUpdate` - actual transmit/receive antenna per station
//!
//! # Example
//!
//! ```rust
//! use moas_switch::Switch;
//!
//! let mut switch = Switch::new();
//! switch.feed(b"*A1;%C56;!2T6;");
//! switch.set_transmit(2, true).unwrap();
//! switch.feed(b"!1T5;");
//!
//! let mut host = String::new();
//! switch.flush_to(&mut host);
//! assert_eq!(host, "!2S6;!1C5;");
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
mod handlers;
mod pins;
mod resolver;
pub mod state;
pub mod tables;

pub use config::{FirmwareVersion, SwitchConfig};
pub use engine::Switch;
pub use error::SwitchError;
pub use events::{SwitchEvent, SwitchOutput};
pub use state::{Assignment, EventFlags, StationState, SwitchState};
pub use tables::{AntennaRelation, SystemTable};
