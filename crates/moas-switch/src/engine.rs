//! Switch engine
//!
//! [`Switch`] owns the state, the command framer, and the outbound event
//! buffer. It has three entry points: [`Switch::initialize`],
//! [`Switch::feed_byte`], and [`Switch::set_transmit`]. Everything it
//! produces is buffered as [`SwitchEvent`]s and handed out by
//! [`Switch::drain_events`] or [`Switch::flush_to`].

use moas_protocol::{
    Antenna, CommandCodec, ParseError, RelaySet, Reply, Station, StationSet, STATIONS,
};
use tracing::{debug, info, warn};

use crate::config::SwitchConfig;
use crate::error::SwitchError;
use crate::events::{SwitchEvent, SwitchOutput};
use crate::state::SwitchState;

/// The emulated antenna switch
#[derive(Debug, Clone)]
pub struct Switch {
    pub(crate) config: SwitchConfig,
    pub(crate) state: SwitchState,
    codec: CommandCodec,
    pub(crate) event_buffer: Vec<SwitchEvent>,
}

impl Switch {
    /// Create a switch with default configuration
    pub fn new() -> Self {
        Self::with_config(SwitchConfig::default())
    }

    /// Create a switch with custom configuration
    ///
    /// The switch starts initialized, so the event buffer already holds the
    /// power-on relay update.
    pub fn with_config(config: SwitchConfig) -> Self {
        let codec = CommandCodec::with_limit(config.command_buffer_len);
        let mut switch = Self {
            config,
            state: SwitchState::new(),
            codec,
            event_buffer: Vec::new(),
        };
        switch.initialize();
        switch
    }

    pub fn config(&self) -> &SwitchConfig {
        &self.config
    }

    pub fn state(&self) -> &SwitchState {
        &self.state
    }

    /// Reset to the power-on state and report the outputs
    pub fn initialize(&mut self) {
        info!("Initializing switch");
        self.state = SwitchState::new();
        self.codec.clear();
        self.state.update_pins(&mut self.event_buffer);
    }

    /// Feed one byte from the host link
    pub fn feed_byte(&mut self, byte: u8) {
        match self.codec.push_byte(byte) {
            Some(Ok(command)) => self.execute(command),
            Some(Err(e)) => self.reject(e),
            None => {}
        }
    }

    /// Feed a run of bytes from the host link
    pub fn feed(&mut self, data: &[u8]) {
        for &byte in data {
            self.feed_byte(byte);
        }
    }

    fn reject(&mut self, error: ParseError) {
        warn!("Rejected command: {}", error);
        self.reply(Reply::Error(error.reply()));
    }

    /// Key a station up or down
    ///
    /// `station` is the 1-based station number.
    pub fn set_transmit(&mut self, station: u8, active: bool) -> Result<(), SwitchError> {
        let station = Station::from_number(station).ok_or(SwitchError::InvalidStation(station))?;

        // Inhibits as they were before the toggle
        let inhibits = self.state.effective_inhibits();

        self.state.transmitting.set(station, active);
        debug!(
            "Station {} {}",
            station,
            if active { "transmitting" } else { "receiving" }
        );

        if self.state.events.transmit_receive && !inhibits.contains(station) {
            let reply = Reply::TransmitReceive {
                station,
                transmitting: active,
                rx_antenna: self.state.station(station).actual_rx.antenna,
            };
            self.reply(reply);
        }

        self.state.resolve(&mut self.event_buffer);
        Ok(())
    }

    /// Take every buffered event
    pub fn drain_events(&mut self) -> Vec<SwitchEvent> {
        std::mem::take(&mut self.event_buffer)
    }

    /// Deliver every buffered event to `out`, in order
    pub fn flush_to<O: SwitchOutput + ?Sized>(&mut self, out: &mut O) {
        for event in self.drain_events() {
            event.deliver(out);
        }
    }

    /// Whether the switch is in operate mode
    pub fn is_operating(&self) -> bool {
        self.state.operate
    }

    /// Relay outputs as of the last update
    pub fn actual_relays(&self) -> RelaySet {
        self.state.actual_relays
    }

    /// Inhibit outputs as of the last update
    pub fn inhibits(&self) -> StationSet {
        self.state.reported_inhibits
    }

    pub fn actual_tx_antennas(&self) -> [Antenna; STATIONS] {
        self.state.actual_tx_antennas()
    }

    pub fn actual_rx_antennas(&self) -> [Antenna; STATIONS] {
        self.state.actual_rx_antennas()
    }

    /// Bytes of the command currently being received
    pub fn pending_input(&self) -> &[u8] {
        self.codec.pending()
    }
}

impl Default for Switch {
    fn default() -> Self {
        Self::new()
    }
}
