//! Command handlers
//!
//! Commands arrive fully validated from the parser, so a handler never sees
//! an out-of-range station, antenna, or relay and never has to undo a
//! partial change.

use moas_protocol::{
    AntennaRole, Reply, StateFlag, Station, StationFlagEdit, StationSet, StatusQuery,
    SwitchCommand,
};
use tracing::{debug, info};

use crate::engine::Switch;
use crate::events::SwitchEvent;
use crate::state::{Assignment, StationState};

impl Switch {
    /// Execute one parsed command
    pub fn execute(&mut self, command: SwitchCommand) {
        debug!("Executing {:?}", command);

        match command {
            SwitchCommand::Antenna {
                station,
                role,
                antenna,
                relays,
            } => {
                let assignment = Assignment::new(antenna, relays);
                self.assign(station, role, assignment);
                self.state.resolve(&mut self.event_buffer);
            }
            SwitchCommand::GlobalRelays(relays) => {
                self.state.global_relays = relays;
                self.state.update_pins(&mut self.event_buffer);
            }
            SwitchCommand::Status(StatusQuery::Board) => {
                let reply = Reply::Board {
                    lines: self.state.line_states(),
                    tx: self.state.actual_tx_antennas(),
                    rx: self.state.actual_rx_antennas(),
                    alternate: self.state.alternate_antennas(),
                };
                self.reply(reply);
            }
            SwitchCommand::Status(StatusQuery::InhibitPolarity) => {
                let reply = Reply::InhibitPolarity(self.state.inhibit_polarity());
                self.reply(reply);
            }
            SwitchCommand::ConflictTable(edit) => self.state.conflicts.apply(&edit),
            SwitchCommand::FastTable(edit) => self.state.fast.apply(&edit),
            SwitchCommand::Ping => {
                let reply = Reply::Ping {
                    operate: self.state.operate,
                };
                self.reply(reply);
            }
            SwitchCommand::Inhibit(stations) => {
                self.state.manual_inhibits |= stations;
                self.state.update_pins(&mut self.event_buffer);
            }
            SwitchCommand::Uninhibit(stations) => {
                self.state.manual_inhibits = self.state.manual_inhibits.difference(stations);
                self.state.update_pins(&mut self.event_buffer);
            }
            SwitchCommand::CrossInhibit { station, others } => {
                self.state.station_mut(station).cross_inhibits = others;
            }
            SwitchCommand::InhibitPolarity(edit) => {
                self.edit_station_flag(edit, |s, on| s.inhibit_polarity = on);
            }
            SwitchCommand::InhibitType(edit) => {
                self.edit_station_flag(edit, |s, on| s.inhibit_on_transmit_only = on);
            }
            SwitchCommand::Timer { kind, params } => {
                debug!("Ignoring {:?} timer ({})", kind, params);
            }
            SwitchCommand::Mode { wait, stations } => {
                if wait {
                    self.state.wait_mode |= stations;
                } else {
                    self.state.wait_mode = self.state.wait_mode.difference(stations);
                }
            }
            SwitchCommand::SetState(flags) => self.set_state(&flags),
            SwitchCommand::UnitId(id) => {
                if let Some(id) = id {
                    self.state.unit_id = id;
                }
                let reply = Reply::Identification {
                    major: self.config.firmware.major,
                    minor: self.config.firmware.minor,
                    unit_id: self.state.unit_id,
                };
                self.reply(reply);
            }
            SwitchCommand::AntennaSystem(edit) => self.state.systems.apply(&edit),
            SwitchCommand::Alternate { station, triggers } => {
                self.state.station_mut(station).alternate_triggers = triggers;
            }
            SwitchCommand::RelayStatus => {
                let reply = Reply::RelayStatus(self.state.actual_relays);
                self.reply(reply);
            }
            SwitchCommand::VendorExtension(data) => {
                debug!("Ignoring vendor extension {:?}", data);
            }
        }
    }

    pub(crate) fn reply(&mut self, reply: Reply) {
        self.event_buffer.push(SwitchEvent::Reply(reply));
    }

    fn assign(&mut self, station: Station, role: AntennaRole, assignment: Assignment) {
        let state = &mut self.state;
        match role {
            AntennaRole::Transmit => {
                set_pending_tx(state.station_mut(station), assignment);
                state.tx_pending.insert(station);
            }
            AntennaRole::Receive => {
                set_pending_rx(state.station_mut(station), assignment);
                state.rx_pending.insert(station);
            }
            AntennaRole::Both => {
                let s = state.station_mut(station);
                set_pending_tx(s, assignment);
                set_pending_rx(s, assignment);
                state.tx_pending.insert(station);
                state.rx_pending.insert(station);
            }
            AntennaRole::Alternate => {
                state.station_mut(station).alternate = assignment;
                state.alt_pending.insert(station);
            }
            AntennaRole::Extra => {
                state.station_mut(station).pending_extra = assignment.relays;
                state.extra_pending.insert(station);
            }
            AntennaRole::Set => state.station_mut(station).set_relays = assignment.relays,
            AntennaRole::Clear => state.station_mut(station).reset_relays = assignment.relays,
        }
    }

    fn edit_station_flag(&mut self, edit: StationFlagEdit, apply: impl Fn(&mut StationState, bool)) {
        let (stations, on) = match edit {
            StationFlagEdit::ClearAll => (StationSet::ALL, false),
            StationFlagEdit::SetAll => (StationSet::ALL, true),
            StationFlagEdit::Set(stations) => (stations, true),
            StationFlagEdit::Clear(stations) => (stations, false),
        };
        for station in stations.iter() {
            apply(self.state.station_mut(station), on);
        }
    }

    fn set_state(&mut self, flags: &[StateFlag]) {
        for flag in flags {
            match *flag {
                StateFlag::Reset => {
                    self.initialize();
                    return;
                }
                StateFlag::Operate => {
                    info!("Entering operate mode");
                    self.state.operate = true;
                    self.state.update_pins(&mut self.event_buffer);
                    return;
                }
                StateFlag::AntennaEvents(on) => self.state.events.antenna = on,
                StateFlag::TransmitEvents(on) => self.state.events.transmit_receive = on,
                StateFlag::InhibitEvents(on) => self.state.events.inhibit = on,
                StateFlag::ExtraRelayEvents(on) => self.state.events.extra_relay = on,
                StateFlag::Resolver(on) => debug!("Resolver flag {} has no effect", on),
            }
        }
    }
}

/// A new pending antenna gets a fresh conflict report
fn set_pending_tx(s: &mut StationState, assignment: Assignment) {
    if s.pending_tx.antenna != assignment.antenna {
        s.conflict_reported_tx = false;
    }
    s.pending_tx = assignment;
}

fn set_pending_rx(s: &mut StationState, assignment: Assignment) {
    if s.pending_rx.antenna != assignment.antenna {
        s.conflict_reported_rx = false;
    }
    s.pending_rx = assignment;
}
