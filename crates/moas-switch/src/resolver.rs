//! Conflict resolver
//!
//! Decides which pending antenna changes can be committed without putting
//! two stations on conflicting antennas, hot-switching a shared antenna
//! system, or moving a station that is waiting on the air.
//!
//! Candidate sets of stations are tried from the numerically largest subset
//! of the admissible stations downwards (`x = (x - 1) & admissible`), so
//! higher-numbered stations win ties. The transmit search runs first against
//! every admissible receive change; the receive search then runs against the
//! transmit subset that was accepted.

use moas_protocol::{Antenna, Direction, RelaySet, Reply, Station, StationSet};
use tracing::debug;

use crate::events::SwitchEvent;
use crate::state::{Assignment, SwitchState};

impl SwitchState {
    /// Run the conflict resolver, commit what can be committed, and update
    /// the outputs
    pub fn resolve(&mut self, events: &mut Vec<SwitchEvent>) {
        if !self.operate {
            self.update_pins(events);
            return;
        }

        let inhibits = self.effective_inhibits();
        let active = self.active_transmitters(inhibits);

        self.commit_extra_relays(active, events);

        let alternates = self.alternate_targets(active);

        let admissible_tx: StationSet = self
            .tx_pending
            .iter()
            .filter(|&s| !self.tx_must_wait(s, active))
            .collect();
        let admissible_rx: StationSet = self
            .rx_pending
            .iter()
            .filter(|&s| !self.rx_must_wait(s, active))
            .collect();

        let accepted_tx = self.search(Direction::Transmit, admissible_tx, admissible_rx, events);
        let accepted_rx = self.search(Direction::Receive, admissible_rx, accepted_tx, events);

        debug!(
            "Resolver: tx pending {:06b} admissible {:06b} accepted {:06b}; rx pending {:06b} admissible {:06b} accepted {:06b}",
            self.tx_pending.bits(),
            admissible_tx.bits(),
            accepted_tx.bits(),
            self.rx_pending.bits(),
            admissible_rx.bits(),
            accepted_rx.bits()
        );

        let alt_conflicts = self.resolve_alternates(alternates | self.alt_pending, accepted_tx, accepted_rx);

        if accepted_tx.is_empty() && accepted_rx.is_empty() {
            self.update_pins(events);
            return;
        }

        for station in accepted_tx.iter() {
            let s = self.station_mut(station);
            s.current_tx = s.pending_tx;
            s.actual_tx = Assignment::new(s.pending_tx.antenna, s.pending_tx.relays | s.current_extra);
            s.conflict_reported_tx = false;
        }

        for station in Station::all() {
            let promote = accepted_rx.contains(station);
            let fast = {
                let s = self.station(station);
                let rx = if promote { s.pending_rx } else { s.current_rx };
                self.fast.contains(rx.antenna, s.current_tx.antenna)
            };
            let s = self.station_mut(station);
            if promote {
                s.current_rx = s.pending_rx;
                s.conflict_reported_rx = false;
            }
            s.actual_rx = if fast { s.current_rx } else { s.current_tx };
        }

        if self.events.antenna {
            self.report_commits(accepted_tx, accepted_rx, alt_conflicts, events);
        }

        self.tx_pending = self.tx_pending.difference(accepted_tx);
        self.rx_pending = self.rx_pending.difference(accepted_rx);
        self.alt_pending = StationSet::EMPTY;

        events.push(SwitchEvent::AntennaUpdate {
            tx: self.actual_tx_antennas(),
            rx: self.actual_rx_antennas(),
        });
        self.update_pins(events);
    }

    /// Move pending extra relays into effect for stations not on the air
    fn commit_extra_relays(&mut self, active: StationSet, events: &mut Vec<SwitchEvent>) {
        for station in self.extra_pending.difference(active).iter() {
            let s = self.station_mut(station);
            s.current_extra = s.pending_extra;
            s.actual_tx.relays = s.current_tx.relays | s.current_extra;

            if self.events.extra_relay {
                events.push(SwitchEvent::Reply(Reply::ExtraRelays { station }));
            }
            self.extra_pending.remove(station);
            debug!("Station {} extra relays committed", station);
        }
    }

    /// Stations that must move together with `station` on a shared system
    fn system_dependencies(&self, station: Station, system: u8) -> StationSet {
        let mut dependencies = StationSet::only(station);
        for other in Station::all() {
            let s = self.station(other);
            let uses_system = self.systems.get(s.current_tx.antenna) == system
                || (self.tx_pending.contains(other) && self.systems.get(s.pending_tx.antenna) == system);
            if uses_system {
                dependencies.insert(other);
            }
        }
        dependencies
    }

    fn dependencies_waiting(&self, dependencies: StationSet, active: StationSet) -> bool {
        dependencies.is_subset(self.wait_mode) && dependencies.intersects(active)
    }

    fn tx_must_wait(&self, station: Station, active: StationSet) -> bool {
        let system = self.systems.get(self.station(station).pending_tx.antenna);
        let dependencies = if system != 0 {
            self.system_dependencies(station, system)
        } else {
            StationSet::only(station)
        };
        let wait = self.dependencies_waiting(dependencies, active);
        if wait {
            debug!("Station {} transmit change waits on {:06b}", station, dependencies.bits());
        }
        wait
    }

    /// Receive changes only wait when they would switch a shared system
    fn rx_must_wait(&self, station: Station, active: StationSet) -> bool {
        let system = self.systems.get(self.station(station).pending_rx.antenna);
        if system == 0 {
            return false;
        }
        let dependencies = self.system_dependencies(station, system);
        let wait = self.dependencies_waiting(dependencies, active);
        if wait {
            debug!("Station {} receive change waits on {:06b}", station, dependencies.bits());
        }
        wait
    }

    /// Transmit and receive antennas of `station` as seen by a candidate
    /// commit
    fn antennas_in_effect(
        &self,
        station: Station,
        attempt_tx: StationSet,
        attempt_rx: StationSet,
    ) -> (Antenna, Antenna) {
        let s = self.station(station);
        let tx = if attempt_tx.contains(station) {
            s.pending_tx.antenna
        } else {
            s.current_tx.antenna
        };
        let rx = if attempt_rx.contains(station) {
            s.pending_rx.antenna
        } else {
            s.current_rx.antenna
        };
        (tx, rx)
    }

    fn conflicts_with_others(
        &self,
        station: Station,
        antenna: Antenna,
        attempt_tx: StationSet,
        attempt_rx: StationSet,
    ) -> bool {
        Station::all().filter(|&other| other != station).any(|other| {
            let (tx, rx) = self.antennas_in_effect(other, attempt_tx, attempt_rx);
            self.conflicts.contains(antenna, tx) || self.conflicts.contains(antenna, rx)
        })
    }

    /// Largest conflict-free subset of `admissible` for one direction
    ///
    /// `other` is the set of stations whose pending antennas are assumed in
    /// effect for the opposite direction.
    fn search(
        &mut self,
        direction: Direction,
        admissible: StationSet,
        other: StationSet,
        events: &mut Vec<SwitchEvent>,
    ) -> StationSet {
        for attempt in admissible.subsets_descending() {
            let (attempt_tx, attempt_rx) = match direction {
                Direction::Transmit => (attempt, other),
                Direction::Receive => (other, attempt),
            };

            let mut clean = true;
            for station in attempt.iter() {
                let antenna = match direction {
                    Direction::Transmit => self.station(station).pending_tx.antenna,
                    Direction::Receive => self.station(station).pending_rx.antenna,
                };
                if self.conflicts_with_others(station, antenna, attempt_tx, attempt_rx) {
                    clean = false;
                    self.report_conflict(station, direction, antenna, events);
                }
            }

            if clean {
                return attempt;
            }
        }
        StationSet::EMPTY
    }

    fn report_conflict(
        &mut self,
        station: Station,
        direction: Direction,
        antenna: Antenna,
        events: &mut Vec<SwitchEvent>,
    ) {
        if !self.events.antenna {
            return;
        }
        let s = self.station_mut(station);
        let reported = match direction {
            Direction::Transmit => &mut s.conflict_reported_tx,
            Direction::Receive => &mut s.conflict_reported_rx,
        };
        if *reported {
            return;
        }
        *reported = true;
        debug!("Station {} {:?} antenna {} conflicts", station, direction, antenna);
        events.push(SwitchEvent::Reply(Reply::AntennaConflict {
            station,
            direction,
            antenna,
        }));
    }

    /// Resolve alternate relays for `stations`; returns those whose
    /// alternate conflicts
    fn resolve_alternates(
        &mut self,
        stations: StationSet,
        accepted_tx: StationSet,
        accepted_rx: StationSet,
    ) -> StationSet {
        let mut conflicted = StationSet::EMPTY;
        for station in stations.iter() {
            let alternate = self.station(station).alternate;
            let conflict = self.conflicts_with_others(station, alternate.antenna, accepted_tx, accepted_rx);
            self.station_mut(station).actual_alternate_relays = if conflict {
                conflicted.insert(station);
                RelaySet::EMPTY
            } else {
                alternate.relays
            };
        }
        conflicted
    }

    fn report_commits(
        &self,
        accepted_tx: StationSet,
        accepted_rx: StationSet,
        alt_conflicts: StationSet,
        events: &mut Vec<SwitchEvent>,
    ) {
        for station in Station::all() {
            let s = self.station(station);
            let fast = self.fast.contains(s.current_tx.antenna, s.current_rx.antenna);

            if accepted_tx.contains(station) {
                events.push(SwitchEvent::Reply(Reply::AntennaChanged {
                    station,
                    direction: Direction::Transmit,
                    fast,
                    antenna: s.current_tx.antenna,
                }));
            }
            if accepted_rx.contains(station) {
                events.push(SwitchEvent::Reply(Reply::AntennaChanged {
                    station,
                    direction: Direction::Receive,
                    fast,
                    antenna: s.current_rx.antenna,
                }));
            }
            if self.alt_pending.contains(station) {
                events.push(SwitchEvent::Reply(Reply::AlternateChanged {
                    station,
                    accepted: !alt_conflicts.contains(station),
                    antenna: s.alternate.antenna,
                }));
            }
        }
    }
}
