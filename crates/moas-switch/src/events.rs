//! Outbound switch events
//!
//! The switch has three outputs: text written to the host, the relay and
//! inhibit lines, and the per-station antenna indication. Each is one
//! [`SwitchEvent`] variant; the engine buffers them in the order produced.

use moas_protocol::{Antenna, Reply, RelaySet, StationSet, STATIONS};

/// Events emitted by the switch engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchEvent {
    /// Text for the host link
    Reply(Reply),
    /// Relay and inhibit outputs were recomputed
    RelayUpdate {
        relays: RelaySet,
        inhibits: StationSet,
    },
    /// Actual antennas per station after a commit
    AntennaUpdate {
        tx: [Antenna; STATIONS],
        rx: [Antenna; STATIONS],
    },
}

impl SwitchEvent {
    /// Wire text, for events that carry any
    pub fn wire_text(&self) -> Option<String> {
        match self {
            SwitchEvent::Reply(reply) => Some(reply.to_string()),
            _ => None,
        }
    }

    /// Hand this event to an output sink
    pub fn deliver<O: SwitchOutput + ?Sized>(&self, out: &mut O) {
        match self {
            SwitchEvent::Reply(reply) => out.write(&reply.to_string()),
            SwitchEvent::RelayUpdate { relays, inhibits } => out.relay_update(*relays, *inhibits),
            SwitchEvent::AntennaUpdate { tx, rx } => out.antenna_update(tx, rx),
        }
    }
}

/// Receiver for switch outputs
pub trait SwitchOutput {
    /// Text for the host link
    fn write(&mut self, text: &str);

    /// Relay outputs and inhibited stations
    fn relay_update(&mut self, relays: RelaySet, inhibits: StationSet);

    /// Actual transmit and receive antenna per station
    fn antenna_update(&mut self, tx: &[Antenna; STATIONS], rx: &[Antenna; STATIONS]);
}

/// Collects only the host text, concatenated
impl SwitchOutput for String {
    fn write(&mut self, text: &str) {
        self.push_str(text);
    }

    fn relay_update(&mut self, _relays: RelaySet, _inhibits: StationSet) {}

    fn antenna_update(&mut self, _tx: &[Antenna; STATIONS], _rx: &[Antenna; STATIONS]) {}
}
