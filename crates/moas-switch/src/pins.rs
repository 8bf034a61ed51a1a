//! Relay and inhibit output computation

use moas_protocol::{Station, StationSet};
use tracing::debug;

use crate::events::SwitchEvent;
use crate::state::SwitchState;

impl SwitchState {
    /// Recompute relay and inhibit outputs and report them
    ///
    /// Outside operate mode every station is reported inhibited and the
    /// relay outputs are left as they were.
    pub fn update_pins(&mut self, events: &mut Vec<SwitchEvent>) {
        if !self.operate {
            self.reported_inhibits = StationSet::ALL;
            events.push(SwitchEvent::RelayUpdate {
                relays: self.actual_relays,
                inhibits: StationSet::ALL,
            });
            return;
        }

        let mut inhibits = self.effective_inhibits();

        // Latches fire on the transmit edge
        let started = self.transmitting.difference(self.last_transmitting);
        for station in started.iter() {
            let (set, reset) = {
                let s = self.station(station);
                (s.set_relays, s.reset_relays)
            };
            self.latched_relays = self.latched_relays.union(set).difference(reset);
        }

        let active = self.active_transmitters(inhibits);

        for station in self.transmitting.iter() {
            if self.station(station).inhibit_on_transmit_only {
                inhibits.remove(station);
            }
        }

        let alternates = self.alternate_targets(active);

        let mut relays = self.global_relays | self.latched_relays;
        for station in Station::all() {
            let s = self.station(station);
            relays |= if active.contains(station) {
                s.actual_tx.relays
            } else if alternates.contains(station) {
                s.actual_alternate_relays
            } else {
                s.actual_rx.relays
            };
        }

        debug!(
            "Pins: relays {:016x}, inhibits {:06b}, transmitting {:06b}",
            relays.bits(),
            inhibits.bits(),
            active.bits()
        );

        self.actual_relays = relays;
        self.reported_inhibits = inhibits;
        events.push(SwitchEvent::RelayUpdate { relays, inhibits });
        self.last_transmitting = self.transmitting;
    }
}
