//! Typed switch commands
//!
//! Every command is ASCII, starts with a one-byte command code, and ends with
//! `;`. Fields sit at fixed positions after the code; lists (stations,
//! relays, antenna pairs) run up to the terminator.
//!
//! ```text
//! !1T5AB;   station 1 transmit antenna 5 using relays 10 and 11
//! %C56;     antennas 5 and 6 conflict
//! (3;       inhibit station 3
//! *A1;      antenna events on, then operate
//! ```

use crate::error::ParseError;
use crate::types::{Antenna, Relay, RelaySet, Station, StationSet};
use crate::{sixbit, EncodeCommand, TERMINATOR};

/// Role letter of an antenna command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AntennaRole {
    /// `T` - transmit antenna
    Transmit,
    /// `R` - receive antenna
    Receive,
    /// `B` - same antenna for transmit and receive
    Both,
    /// `A` - alternate antenna used while a trigger station transmits
    Alternate,
    /// `X` - extra relays added to the transmit path
    Extra,
    /// `S` - relays latched on when the station starts transmitting
    Set,
    /// `C` - relays latched off when the station starts transmitting
    Clear,
}

impl AntennaRole {
    fn from_wire(b: u8) -> Result<Self, ParseError> {
        match b {
            b'T' => Ok(Self::Transmit),
            b'R' => Ok(Self::Receive),
            b'B' => Ok(Self::Both),
            b'A' => Ok(Self::Alternate),
            b'X' => Ok(Self::Extra),
            b'S' => Ok(Self::Set),
            b'C' => Ok(Self::Clear),
            _ => Err(ParseError::InvalidRole(b as char)),
        }
    }

    fn wire(self) -> u8 {
        match self {
            Self::Transmit => b'T',
            Self::Receive => b'R',
            Self::Both => b'B',
            Self::Alternate => b'A',
            Self::Extra => b'X',
            Self::Set => b'S',
            Self::Clear => b'C',
        }
    }
}

/// Status query variants (`"B;` and `"I;`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusQuery {
    /// Line state and antennas for every station
    Board,
    /// Stations with inhibit polarity set
    InhibitPolarity,
}

/// Edit to a symmetric antenna relation (conflict or fast table)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableEdit {
    /// `0` - clear every pair
    ClearAll,
    /// `1` - set every pair
    SetAll,
    /// Add the listed pairs
    Add(Vec<(Antenna, Antenna)>),
    /// Remove the listed pairs
    Remove(Vec<(Antenna, Antenna)>),
}

/// Edit to a per-station flag (inhibit polarity, inhibit type)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationFlagEdit {
    /// `0` - clear for every station
    ClearAll,
    /// `1` - set for every station
    SetAll,
    /// Set for the listed stations
    Set(StationSet),
    /// Clear for the listed stations
    Clear(StationSet),
}

/// Edit to the antenna system table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemEdit {
    /// `0` - no antenna belongs to a system
    ClearAll,
    /// `S` - assign each antenna to a system id
    Assign(Vec<(Antenna, u8)>),
}

/// Timer commands; timers are accepted but not modeled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// `[`
    InhibitTime,
    /// `\`
    ReceiveDelay,
    /// `]`
    InterruptModeDelay,
}

impl TimerKind {
    fn wire(self) -> u8 {
        match self {
            Self::InhibitTime => b'[',
            Self::ReceiveDelay => b'\\',
            Self::InterruptModeDelay => b']',
        }
    }
}

/// One flag of a set-state command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateFlag {
    /// `0` - full reset; flags after it are ignored
    Reset,
    /// `1` - enter operate state; flags after it are ignored
    Operate,
    /// `A` / `a`
    AntennaEvents(bool),
    /// `T` / `t`
    TransmitEvents(bool),
    /// `I` / `i`
    InhibitEvents(bool),
    /// `X` / `x`
    ExtraRelayEvents(bool),
    /// `R` / `r` - the emulator always resolves conflicts
    Resolver(bool),
}

impl StateFlag {
    fn from_wire(b: u8) -> Result<Self, ParseError> {
        match b {
            b'0' => Ok(Self::Reset),
            b'1' => Ok(Self::Operate),
            b'A' | b'a' => Ok(Self::AntennaEvents(b == b'A')),
            b'T' | b't' => Ok(Self::TransmitEvents(b == b'T')),
            b'I' | b'i' => Ok(Self::InhibitEvents(b == b'I')),
            b'X' | b'x' => Ok(Self::ExtraRelayEvents(b == b'X')),
            b'R' | b'r' => Ok(Self::Resolver(b == b'R')),
            _ => Err(ParseError::UnknownFlag(b as char)),
        }
    }

    /// `0` and `1` end the flag list
    pub fn is_final(self) -> bool {
        matches!(self, Self::Reset | Self::Operate)
    }

    fn wire(self) -> u8 {
        let (upper, on) = match self {
            Self::Reset => return b'0',
            Self::Operate => return b'1',
            Self::AntennaEvents(on) => (b'A', on),
            Self::TransmitEvents(on) => (b'T', on),
            Self::InhibitEvents(on) => (b'I', on),
            Self::ExtraRelayEvents(on) => (b'X', on),
            Self::Resolver(on) => (b'R', on),
        };
        if on {
            upper
        } else {
            upper.to_ascii_lowercase()
        }
    }
}

/// A parsed switch command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchCommand {
    /// `!<station><role><antenna><relays>;`
    Antenna {
        station: Station,
        role: AntennaRole,
        antenna: Antenna,
        relays: RelaySet,
    },
    /// `!0...;` - replace the global relay set
    GlobalRelays(RelaySet),
    /// `"B;` / `"I;`
    Status(StatusQuery),
    /// `%...;`
    ConflictTable(TableEdit),
    /// `&...;`
    FastTable(TableEdit),
    /// `';`
    Ping,
    /// `(<stations>;`
    Inhibit(StationSet),
    /// `)<stations>;`
    Uninhibit(StationSet),
    /// `~<station><others>;`
    CrossInhibit { station: Station, others: StationSet },
    /// `^...;`
    InhibitPolarity(StationFlagEdit),
    /// `=...;` - set means inhibit only while transmitting
    InhibitType(StationFlagEdit),
    /// `[`, `\`, `]`
    Timer { kind: TimerKind, params: String },
    /// `/W<stations>;` or `/I<stations>;`
    Mode { wait: bool, stations: StationSet },
    /// `*<flags>;`
    SetState(Vec<StateFlag>),
    /// `:[id];`
    UnitId(Option<u8>),
    /// `_...;`
    AntennaSystem(SystemEdit),
    /// `@<station><triggers>;`
    Alternate {
        station: Station,
        triggers: StationSet,
    },
    /// `|;`
    RelayStatus,
    /// `#...;`
    VendorExtension(String),
}

impl SwitchCommand {
    /// Parse a complete command frame. A trailing terminator is accepted and
    /// ignored.
    pub fn parse(frame: &[u8]) -> Result<SwitchCommand, ParseError> {
        let body = frame.strip_suffix(&[TERMINATOR]).unwrap_or(frame);
        let Some((&code, args)) = body.split_first() else {
            return Err(ParseError::UnknownCommand(TERMINATOR as char));
        };

        match code {
            b'!' => parse_antenna(args),
            b'"' => match args.first() {
                Some(b'B') => Ok(Self::Status(StatusQuery::Board)),
                Some(b'I') => Ok(Self::Status(StatusQuery::InhibitPolarity)),
                Some(&other) => Err(ParseError::UnknownSelector {
                    command: '"',
                    selector: other as char,
                }),
                None => Err(ParseError::MissingField("status selector")),
            },
            b'%' => parse_table_edit('%', b'C', b'c', args).map(Self::ConflictTable),
            b'&' => parse_table_edit('&', b'F', b'f', args).map(Self::FastTable),
            b'\'' => Ok(Self::Ping),
            b'(' => parse_stations(args).map(Self::Inhibit),
            b')' => parse_stations(args).map(Self::Uninhibit),
            b'~' => {
                let (station, others) = parse_station_and_others(args)?;
                Ok(Self::CrossInhibit { station, others })
            }
            b'^' => parse_flag_edit('^', b'E', b'I', args).map(Self::InhibitPolarity),
            b'=' => parse_flag_edit('=', b'T', b'A', args).map(Self::InhibitType),
            b'[' | b'\\' | b']' => {
                let kind = match code {
                    b'[' => TimerKind::InhibitTime,
                    b'\\' => TimerKind::ReceiveDelay,
                    _ => TimerKind::InterruptModeDelay,
                };
                Ok(Self::Timer {
                    kind,
                    params: String::from_utf8_lossy(args).into_owned(),
                })
            }
            b'/' => {
                let wait = match args.first() {
                    Some(b'W') => true,
                    Some(b'I') => false,
                    Some(&other) => {
                        return Err(ParseError::UnknownSelector {
                            command: '/',
                            selector: other as char,
                        })
                    }
                    None => return Err(ParseError::MissingField("mode selector")),
                };
                let stations = parse_stations(&args[1..])?;
                Ok(Self::Mode { wait, stations })
            }
            b'*' => {
                let mut flags = Vec::with_capacity(args.len());
                for &b in args {
                    let flag = StateFlag::from_wire(b)?;
                    flags.push(flag);
                    if flag.is_final() {
                        break;
                    }
                }
                Ok(Self::SetState(flags))
            }
            b':' => parse_unit_id(args).map(Self::UnitId),
            b'_' => match args.split_first() {
                Some((b'0', _)) => Ok(Self::AntennaSystem(SystemEdit::ClearAll)),
                Some((b'S', pairs)) => {
                    let mut assignments = Vec::with_capacity(pairs.len() / 2);
                    for (first, second) in symbol_pairs(pairs)? {
                        assignments.push((Antenna::from_symbol(first)?, sixbit::decode(second)?));
                    }
                    Ok(Self::AntennaSystem(SystemEdit::Assign(assignments)))
                }
                Some((&other, _)) => Err(ParseError::UnknownSelector {
                    command: '_',
                    selector: other as char,
                }),
                None => Err(ParseError::MissingField("system selector")),
            },
            b'@' => {
                let (station, triggers) = parse_station_and_others(args)?;
                Ok(Self::Alternate { station, triggers })
            }
            b'|' => Ok(Self::RelayStatus),
            b'#' => Ok(Self::VendorExtension(
                String::from_utf8_lossy(args).into_owned(),
            )),
            other => Err(ParseError::UnknownCommand(other as char)),
        }
    }

    /// Whether this command only reads switch state
    pub fn is_query(&self) -> bool {
        matches!(
            self,
            Self::Status(_) | Self::Ping | Self::RelayStatus | Self::UnitId(None)
        )
    }
}

fn parse_antenna(args: &[u8]) -> Result<SwitchCommand, ParseError> {
    let [station, role, antenna, relay_symbols @ ..] = args else {
        return Err(ParseError::MissingField("station, role, and antenna"));
    };

    let relays = relay_symbols
        .iter()
        .map(|&b| Relay::from_symbol(b))
        .collect::<Result<RelaySet, _>>()?;

    if *station == b'0' {
        return Ok(SwitchCommand::GlobalRelays(relays));
    }

    Ok(SwitchCommand::Antenna {
        station: Station::from_wire(*station)?,
        role: AntennaRole::from_wire(*role)?,
        antenna: Antenna::from_symbol(*antenna)?,
        relays,
    })
}

fn parse_stations(digits: &[u8]) -> Result<StationSet, ParseError> {
    digits.iter().map(|&b| Station::from_wire(b)).collect()
}

fn parse_station_and_others(args: &[u8]) -> Result<(Station, StationSet), ParseError> {
    let (&first, rest) = args
        .split_first()
        .ok_or(ParseError::MissingField("station"))?;
    let station = Station::from_wire(first)?;
    let others = parse_stations(rest)?;
    if others.contains(station) {
        return Err(ParseError::SelfReference(station.number()));
    }
    Ok((station, others))
}

fn parse_table_edit(command: char, add: u8, remove: u8, args: &[u8]) -> Result<TableEdit, ParseError> {
    let (&selector, rest) = args.split_first().unwrap_or((&TERMINATOR, &[][..]));
    match selector {
        b'0' => Ok(TableEdit::ClearAll),
        b'1' => Ok(TableEdit::SetAll),
        s if s == add || s == remove => {
            let mut pairs = Vec::with_capacity(rest.len() / 2);
            for (a, b) in symbol_pairs(rest)? {
                pairs.push((Antenna::from_symbol(a)?, Antenna::from_symbol(b)?));
            }
            if s == add {
                Ok(TableEdit::Add(pairs))
            } else {
                Ok(TableEdit::Remove(pairs))
            }
        }
        other => Err(ParseError::UnknownTableSelector {
            command,
            selector: other as char,
        }),
    }
}

fn parse_flag_edit(command: char, set: u8, clear: u8, args: &[u8]) -> Result<StationFlagEdit, ParseError> {
    let (&selector, rest) = args
        .split_first()
        .ok_or(ParseError::MissingField("selector"))?;
    match selector {
        b'0' => Ok(StationFlagEdit::ClearAll),
        b'1' => Ok(StationFlagEdit::SetAll),
        s if s == set => parse_stations(rest).map(StationFlagEdit::Set),
        s if s == clear => parse_stations(rest).map(StationFlagEdit::Clear),
        other => Err(ParseError::UnknownSelector {
            command,
            selector: other as char,
        }),
    }
}

fn parse_unit_id(digits: &[u8]) -> Result<Option<u8>, ParseError> {
    if digits.is_empty() {
        return Ok(None);
    }
    if digits.len() > 2 || !digits.iter().all(u8::is_ascii_digit) {
        return Err(ParseError::InvalidUnitId(
            String::from_utf8_lossy(digits).into_owned(),
        ));
    }
    Ok(Some(digits.iter().fold(0, |id, d| id * 10 + (d - b'0'))))
}

fn symbol_pairs(symbols: &[u8]) -> Result<impl Iterator<Item = (u8, u8)> + '_, ParseError> {
    if let Some(&dangling) = symbols.chunks(2).last().filter(|c| c.len() == 1).map(|c| &c[0]) {
        return Err(ParseError::UnpairedSymbol(dangling as char));
    }
    Ok(symbols.chunks_exact(2).map(|pair| (pair[0], pair[1])))
}

fn push_stations(out: &mut Vec<u8>, stations: StationSet) {
    out.extend(stations.iter().map(Station::wire));
}

fn push_pairs(out: &mut Vec<u8>, pairs: &[(Antenna, Antenna)]) {
    for (a, b) in pairs {
        out.push(a.symbol());
        out.push(b.symbol());
    }
}

fn push_flag_edit(out: &mut Vec<u8>, edit: StationFlagEdit, set: u8, clear: u8) {
    match edit {
        StationFlagEdit::ClearAll => out.push(b'0'),
        StationFlagEdit::SetAll => out.push(b'1'),
        StationFlagEdit::Set(stations) => {
            out.push(set);
            push_stations(out, stations);
        }
        StationFlagEdit::Clear(stations) => {
            out.push(clear);
            push_stations(out, stations);
        }
    }
}

fn push_table_edit(out: &mut Vec<u8>, edit: &TableEdit, add: u8, remove: u8) {
    match edit {
        TableEdit::ClearAll => out.push(b'0'),
        TableEdit::SetAll => out.push(b'1'),
        TableEdit::Add(pairs) => {
            out.push(add);
            push_pairs(out, pairs);
        }
        TableEdit::Remove(pairs) => {
            out.push(remove);
            push_pairs(out, pairs);
        }
    }
}

impl EncodeCommand for SwitchCommand {
    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(16);
        match self {
            SwitchCommand::Antenna {
                station,
                role,
                antenna,
                relays,
            } => {
                out.extend([b'!', station.wire(), role.wire(), antenna.symbol()]);
                out.extend(relays.iter().map(Relay::symbol));
            }
            SwitchCommand::GlobalRelays(relays) => {
                // Role and antenna are placeholders for station 0
                out.extend(b"!0T0");
                out.extend(relays.iter().map(Relay::symbol));
            }
            SwitchCommand::Status(StatusQuery::Board) => out.extend(b"\"B"),
            SwitchCommand::Status(StatusQuery::InhibitPolarity) => out.extend(b"\"I"),
            SwitchCommand::ConflictTable(edit) => {
                out.push(b'%');
                push_table_edit(&mut out, edit, b'C', b'c');
            }
            SwitchCommand::FastTable(edit) => {
                out.push(b'&');
                push_table_edit(&mut out, edit, b'F', b'f');
            }
            SwitchCommand::Ping => out.push(b'\''),
            SwitchCommand::Inhibit(stations) => {
                out.push(b'(');
                push_stations(&mut out, *stations);
            }
            SwitchCommand::Uninhibit(stations) => {
                out.push(b')');
                push_stations(&mut out, *stations);
            }
            SwitchCommand::CrossInhibit { station, others } => {
                out.extend([b'~', station.wire()]);
                push_stations(&mut out, *others);
            }
            SwitchCommand::InhibitPolarity(edit) => {
                out.push(b'^');
                push_flag_edit(&mut out, *edit, b'E', b'I');
            }
            SwitchCommand::InhibitType(edit) => {
                out.push(b'=');
                push_flag_edit(&mut out, *edit, b'T', b'A');
            }
            SwitchCommand::Timer { kind, params } => {
                out.push(kind.wire());
                out.extend(params.bytes());
            }
            SwitchCommand::Mode { wait, stations } => {
                out.extend([b'/', if *wait { b'W' } else { b'I' }]);
                push_stations(&mut out, *stations);
            }
            SwitchCommand::SetState(flags) => {
                out.push(b'*');
                out.extend(flags.iter().map(|f| f.wire()));
            }
            SwitchCommand::UnitId(id) => {
                out.push(b':');
                if let Some(id) = id {
                    out.extend(id.to_string().bytes());
                }
            }
            SwitchCommand::AntennaSystem(SystemEdit::ClearAll) => out.extend(b"_0"),
            SwitchCommand::AntennaSystem(SystemEdit::Assign(pairs)) => {
                out.extend(b"_S");
                for (antenna, system) in pairs {
                    out.push(antenna.symbol());
                    out.push(sixbit::encode(*system));
                }
            }
            SwitchCommand::Alternate { station, triggers } => {
                out.extend([b'@', station.wire()]);
                push_stations(&mut out, *triggers);
            }
            SwitchCommand::RelayStatus => out.push(b'|'),
            SwitchCommand::VendorExtension(data) => {
                out.push(b'#');
                out.extend(data.bytes());
            }
        }
        out.push(TERMINATOR);
        out
    }
}
