//! MOAS Switch Simulation Library
//!
//! This crate runs the synchronous switch engine inside an async task so it
//! can sit on the far end of a byte stream, the way a real switch sits on a
//! serial line. It includes:
//!
//! - **run_switch_task**: owns a `Switch`, answers the host over a stream,
//!   takes keying from a channel, and broadcasts output snapshots
//! - **Controller**: drives the task from the host side with typed commands
//!   or a line-oriented script
//!
//! # Example
//!
//! ```rust
//! use moas_sim::ScriptStep;
//! use moas_protocol::SwitchCommand;
//!
//! assert_eq!(ScriptStep::from_line(">tx 2").unwrap(), ScriptStep::Key { station: 2, active: true });
//! assert_eq!(ScriptStep::from_line("';").unwrap(), ScriptStep::Send(SwitchCommand::Ping));
//! ```

pub mod controller;
pub mod switch_task;

pub use controller::{Controller, ControllerError, ScriptStep};
pub use switch_task::{run_switch_task, SwitchSnapshot, SwitchTaskCommand};
