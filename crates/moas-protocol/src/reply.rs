//! Replies and unsolicited events sent by the switch
//!
//! Everything the switch writes back to the host is one of these. The
//! [`Display`](std::fmt::Display) impl produces the exact wire text,
//! terminator included.

use std::fmt;

use crate::types::{Antenna, RelaySet, Station, StationSet, RELAYS, STATIONS};
use crate::{sixbit, EncodeCommand};

/// Error tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorReply {
    /// `?U;` - unknown command byte
    UnknownCommand,
    /// `?A;` - malformed or out-of-range argument
    Argument,
    /// `?a;` - unknown table-edit selector
    UnknownSelector,
}

impl ErrorReply {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorReply::UnknownCommand => "?U;",
            ErrorReply::Argument => "?A;",
            ErrorReply::UnknownSelector => "?a;",
        }
    }
}

/// Per-station letter in the board status reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LineState {
    Inhibited,
    Transmitting,
    Receiving,
}

impl LineState {
    fn wire(self) -> char {
        match self {
            LineState::Inhibited => 'I',
            LineState::Transmitting => 'T',
            LineState::Receiving => 'R',
        }
    }
}

/// Which half of a station's assignment an event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    Transmit,
    Receive,
}

/// A reply or event in the switch-to-host direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Error(ErrorReply),
    /// `"B...;`
    Board {
        lines: [LineState; STATIONS],
        tx: [Antenna; STATIONS],
        rx: [Antenna; STATIONS],
        alternate: [Antenna; STATIONS],
    },
    /// `"I...;`
    InhibitPolarity(StationSet),
    /// `';` when operating, `.;` otherwise
    Ping { operate: bool },
    /// `:<major><minor:02><unit id>;`
    Identification { major: u8, minor: u8, unit_id: u8 },
    /// `|` plus the actual relay set
    RelayStatus(RelaySet),
    /// A pending antenna change was committed
    AntennaChanged {
        station: Station,
        direction: Direction,
        /// The fast table relates the station's current tx and rx antennas
        fast: bool,
        antenna: Antenna,
    },
    /// A pending antenna change is blocked by a conflict
    AntennaConflict {
        station: Station,
        direction: Direction,
        antenna: Antenna,
    },
    /// Pending alternate antenna resolved
    AlternateChanged {
        station: Station,
        accepted: bool,
        antenna: Antenna,
    },
    /// Extra relays committed
    ExtraRelays { station: Station },
    /// Station keyed up or down
    TransmitReceive {
        station: Station,
        transmitting: bool,
        rx_antenna: Antenna,
    },
}

impl Reply {
    /// Whether this is an unsolicited event rather than a reply to a query
    pub fn is_event(&self) -> bool {
        matches!(
            self,
            Reply::AntennaChanged { .. }
                | Reply::AntennaConflict { .. }
                | Reply::AlternateChanged { .. }
                | Reply::ExtraRelays { .. }
                | Reply::TransmitReceive { .. }
        )
    }
}

impl From<ErrorReply> for Reply {
    fn from(e: ErrorReply) -> Self {
        Reply::Error(e)
    }
}

fn symbol(antenna: Antenna) -> char {
    antenna.symbol() as char
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Error(e) => f.write_str(e.as_str()),
            Reply::Board {
                lines,
                tx,
                rx,
                alternate,
            } => {
                f.write_str("\"B")?;
                for line in lines {
                    write!(f, "{}", line.wire())?;
                }
                for antenna in tx.iter().chain(rx).chain(alternate) {
                    write!(f, "{}", symbol(*antenna))?;
                }
                f.write_str(";")
            }
            Reply::InhibitPolarity(stations) => {
                f.write_str("\"I")?;
                for station in stations.iter() {
                    write!(f, "{station}")?;
                }
                f.write_str(";")
            }
            Reply::Ping { operate: true } => f.write_str("';"),
            Reply::Ping { operate: false } => f.write_str(".;"),
            Reply::Identification {
                major,
                minor,
                unit_id,
            } => {
                // One major digit and two minor digits
                write!(f, ":{}{:02}{unit_id};", (*major).min(9), (*minor).min(99))
            }
            Reply::RelayStatus(relays) => {
                f.write_str("|")?;
                let bits = relays.bits();
                for group in (0..RELAYS).step_by(6) {
                    let value = ((bits >> group) & 0x3F) as u8;
                    write!(f, "{}", sixbit::encode(value) as char)?;
                }
                f.write_str(";")
            }
            Reply::AntennaChanged {
                station,
                direction,
                fast,
                antenna,
            } => {
                let code = match (*direction, *fast) {
                    (Direction::Transmit, true) => 'F',
                    (Direction::Transmit, false) => 'S',
                    (Direction::Receive, true) => 'f',
                    (Direction::Receive, false) => 's',
                };
                write!(f, "!{station}{code}{};", symbol(*antenna))
            }
            Reply::AntennaConflict {
                station,
                direction,
                antenna,
            } => {
                let code = match direction {
                    Direction::Transmit => 'C',
                    Direction::Receive => 'c',
                };
                write!(f, "!{station}{code}{};", symbol(*antenna))
            }
            Reply::AlternateChanged {
                station,
                accepted,
                antenna,
            } => {
                let code = if *accepted { 'A' } else { 'a' };
                write!(f, "!{station}{code}{};", symbol(*antenna))
            }
            Reply::ExtraRelays { station } => write!(f, "!{station}X;"),
            Reply::TransmitReceive {
                station,
                transmitting,
                rx_antenna,
            } => {
                let code = if *transmitting { '<' } else { '>' };
                write!(f, "{code}{station}{};", symbol(*rx_antenna))
            }
        }
    }
}

impl EncodeCommand for Reply {
    fn encode(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}
