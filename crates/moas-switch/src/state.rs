//! Switch state tracking
//!
//! Transmit and receive assignments move through three generations:
//!
//! - **pending** - what the host last asked for
//! - **current** - what the conflict resolver has admitted
//! - **actual** - what drives the relays, derived from current plus extra
//!   relays, fast-table pairing, and alternates

use moas_protocol::{Antenna, LineState, RelaySet, Station, StationSet, STATIONS};
use serde::{Deserialize, Serialize};

use crate::tables::{AntennaRelation, SystemTable};

/// An antenna plus the relays that select it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub antenna: Antenna,
    pub relays: RelaySet,
}

impl Assignment {
    /// Reset value: the last antenna, no relays
    pub const PARKED: Assignment = Assignment {
        antenna: Antenna::LAST,
        relays: RelaySet::EMPTY,
    };

    pub fn new(antenna: Antenna, relays: RelaySet) -> Self {
        Self { antenna, relays }
    }
}

impl Default for Assignment {
    fn default() -> Self {
        Self::PARKED
    }
}

/// Per-station assignments and configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationState {
    pub pending_tx: Assignment,
    pub current_tx: Assignment,
    /// Current tx antenna; relays include current extra relays
    pub actual_tx: Assignment,

    pub pending_rx: Assignment,
    pub current_rx: Assignment,
    /// Current rx when the fast table pairs it with current tx, else current tx
    pub actual_rx: Assignment,

    /// Alternate antenna definition
    pub alternate: Assignment,
    /// Alternate relays as last resolved (empty when the alternate conflicts)
    pub actual_alternate_relays: RelaySet,

    pub pending_extra: RelaySet,
    pub current_extra: RelaySet,

    /// Latched on when this station starts transmitting
    pub set_relays: RelaySet,
    /// Latched off when this station starts transmitting
    pub reset_relays: RelaySet,

    /// Stations inhibited while this one transmits
    pub cross_inhibits: StationSet,
    /// Stations switched to their alternate antenna while this one transmits
    pub alternate_triggers: StationSet,

    pub inhibit_polarity: bool,
    /// Inhibit type: inhibit only while transmitting
    pub inhibit_on_transmit_only: bool,

    /// A transmit conflict has been reported for the pending antenna
    pub conflict_reported_tx: bool,
    /// A receive conflict has been reported for the pending antenna
    pub conflict_reported_rx: bool,
}

impl StationState {
    pub fn new() -> Self {
        Self {
            pending_tx: Assignment::PARKED,
            current_tx: Assignment::PARKED,
            actual_tx: Assignment::PARKED,
            pending_rx: Assignment::PARKED,
            current_rx: Assignment::PARKED,
            actual_rx: Assignment::PARKED,
            alternate: Assignment::PARKED,
            actual_alternate_relays: RelaySet::EMPTY,
            pending_extra: RelaySet::EMPTY,
            current_extra: RelaySet::EMPTY,
            set_relays: RelaySet::EMPTY,
            reset_relays: RelaySet::EMPTY,
            cross_inhibits: StationSet::EMPTY,
            alternate_triggers: StationSet::EMPTY,
            inhibit_polarity: false,
            inhibit_on_transmit_only: false,
            conflict_reported_tx: false,
            conflict_reported_rx: false,
        }
    }
}

impl Default for StationState {
    fn default() -> Self {
        Self::new()
    }
}

/// Unsolicited event classes the host has enabled with `*`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFlags {
    pub antenna: bool,
    pub transmit_receive: bool,
    pub inhibit: bool,
    pub extra_relay: bool,
}

/// Complete switch state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchState {
    pub stations: [StationState; STATIONS],

    /// Station-0 relays, asserted regardless of station state
    pub global_relays: RelaySet,
    /// Relays driven by set/reset latches
    pub latched_relays: RelaySet,
    /// Relay outputs as of the last pin update
    pub actual_relays: RelaySet,
    /// Inhibit outputs as of the last pin update
    pub reported_inhibits: StationSet,

    pub conflicts: AntennaRelation,
    pub fast: AntennaRelation,
    pub systems: SystemTable,

    pub tx_pending: StationSet,
    pub rx_pending: StationSet,
    pub extra_pending: StationSet,
    pub alt_pending: StationSet,

    /// Transmit bits from the host
    pub transmitting: StationSet,
    /// Transmit bits as of the last pin update while operating
    pub last_transmitting: StationSet,

    pub wait_mode: StationSet,
    /// Inhibits commanded with `(` and `)`
    pub manual_inhibits: StationSet,

    pub events: EventFlags,
    pub operate: bool,
    pub unit_id: u8,
}

impl SwitchState {
    /// Power-on state
    pub fn new() -> Self {
        Self {
            stations: std::array::from_fn(|_| StationState::new()),
            global_relays: RelaySet::EMPTY,
            latched_relays: RelaySet::EMPTY,
            actual_relays: RelaySet::EMPTY,
            reported_inhibits: StationSet::ALL,
            conflicts: AntennaRelation::new(),
            fast: AntennaRelation::new(),
            systems: SystemTable::new(),
            tx_pending: StationSet::EMPTY,
            rx_pending: StationSet::EMPTY,
            extra_pending: StationSet::EMPTY,
            alt_pending: StationSet::EMPTY,
            transmitting: StationSet::EMPTY,
            last_transmitting: StationSet::EMPTY,
            wait_mode: StationSet::ALL,
            manual_inhibits: StationSet::EMPTY,
            events: EventFlags::default(),
            operate: false,
            unit_id: 0,
        }
    }

    pub fn station(&self, station: Station) -> &StationState {
        &self.stations[station.index()]
    }

    pub fn station_mut(&mut self, station: Station) -> &mut StationState {
        &mut self.stations[station.index()]
    }

    /// Manual inhibits plus cross inhibits from transmitting stations
    ///
    /// Stations are scanned in order and a station already inhibited by an
    /// earlier one contributes nothing, so the result depends on station
    /// order.
    pub fn effective_inhibits(&self) -> StationSet {
        let mut inhibits = self.manual_inhibits;
        for station in Station::all() {
            if inhibits.contains(station) {
                continue;
            }
            if self.transmitting.contains(station) {
                inhibits |= self.station(station).cross_inhibits;
            }
        }
        inhibits
    }

    /// Transmitting stations that are not inhibited
    pub fn active_transmitters(&self, inhibits: StationSet) -> StationSet {
        self.transmitting.difference(inhibits)
    }

    /// Stations switched to their alternate by the given transmitters
    pub fn alternate_targets(&self, transmitters: StationSet) -> StationSet {
        transmitters
            .iter()
            .map(|s| self.station(s).alternate_triggers)
            .fold(StationSet::EMPTY, StationSet::union)
    }

    /// Line state letters for the board status reply
    pub fn line_states(&self) -> [LineState; STATIONS] {
        let inhibits = self.effective_inhibits();
        let mut lines = [LineState::Receiving; STATIONS];
        for station in Station::all() {
            if inhibits.contains(station) {
                lines[station.index()] = LineState::Inhibited;
            } else if self.transmitting.contains(station) {
                lines[station.index()] = LineState::Transmitting;
            }
        }
        lines
    }

    pub fn actual_tx_antennas(&self) -> [Antenna; STATIONS] {
        std::array::from_fn(|i| self.stations[i].actual_tx.antenna)
    }

    pub fn actual_rx_antennas(&self) -> [Antenna; STATIONS] {
        std::array::from_fn(|i| self.stations[i].actual_rx.antenna)
    }

    pub fn alternate_antennas(&self) -> [Antenna; STATIONS] {
        std::array::from_fn(|i| self.stations[i].alternate.antenna)
    }

    /// Stations with inhibit polarity set
    pub fn inhibit_polarity(&self) -> StationSet {
        Station::all()
            .filter(|s| self.station(*s).inhibit_polarity)
            .collect()
    }
}

impl Default for SwitchState {
    fn default() -> Self {
        Self::new()
    }
}
