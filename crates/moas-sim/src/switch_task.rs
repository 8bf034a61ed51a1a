//! Switch actor task
//!
//! This module provides an async task that owns a [`Switch`] and talks to
//! its host over an async stream. The task uses a select! loop to:
//! - Read command bytes from the stream and write every reply back to it
//! - Handle keying and shutdown commands from a channel
//! - Publish output snapshots via a broadcast channel when they change

use std::io;

use moas_protocol::{Antenna, RelaySet, StationSet, STATIONS};
use moas_switch::Switch;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

/// Commands that can be sent to a switch task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchTaskCommand {
    /// Key a station up or down (1-based station number)
    SetTransmit { station: u8, active: bool },
    /// Stop the task
    Shutdown,
}

/// What the switch is driving, published whenever it changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchSnapshot {
    pub operating: bool,
    pub relays: RelaySet,
    pub inhibits: StationSet,
    pub transmitting: StationSet,
    pub tx_antennas: [Antenna; STATIONS],
    pub rx_antennas: [Antenna; STATIONS],
}

impl SwitchSnapshot {
    pub fn of(switch: &Switch) -> Self {
        Self {
            operating: switch.is_operating(),
            relays: switch.actual_relays(),
            inhibits: switch.inhibits(),
            transmitting: switch.state().transmitting,
            tx_antennas: switch.actual_tx_antennas(),
            rx_antennas: switch.actual_rx_antennas(),
        }
    }
}

/// Run the switch actor task
///
/// The stream is polled before the command channel, so bytes written ahead
/// of a keying command are processed ahead of it. Keying requests for a
/// station that does not exist are logged and dropped.
///
/// Returns when the stream closes, the command channel closes, or a
/// shutdown is requested.
pub async fn run_switch_task<S>(
    mut stream: S,
    mut switch: Switch,
    mut cmd_rx: mpsc::Receiver<SwitchTaskCommand>,
    state_tx: broadcast::Sender<SwitchSnapshot>,
) -> io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buf = [0u8; 1024];

    info!(
        "Starting switch task (firmware {}.{:02})",
        switch.config().firmware.major,
        switch.config().firmware.minor
    );

    // Power-on outputs
    flush_replies(&mut stream, &mut switch).await?;
    let mut last = SwitchSnapshot::of(&switch);
    let _ = state_tx.send(last.clone());

    loop {
        tokio::select! {
            biased;

            result = stream.read(&mut buf) => {
                match result {
                    Ok(0) => {
                        debug!("Switch stream closed");
                        break;
                    }
                    Ok(n) => {
                        let data = &buf[..n];
                        debug!(
                            "Switch received {} bytes: {:?}",
                            n,
                            String::from_utf8_lossy(data)
                        );
                        switch.feed(data);
                    }
                    Err(e) => {
                        warn!("Switch stream error: {}", e);
                        return Err(e);
                    }
                }
            }

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(SwitchTaskCommand::SetTransmit { station, active }) => {
                        if let Err(e) = switch.set_transmit(station, active) {
                            warn!("Ignoring keying request: {}", e);
                        }
                    }
                    Some(SwitchTaskCommand::Shutdown) => {
                        info!("Shutdown requested for switch task");
                        break;
                    }
                    None => {
                        debug!("Command channel closed for switch task");
                        break;
                    }
                }
            }
        }

        flush_replies(&mut stream, &mut switch).await?;

        let snapshot = SwitchSnapshot::of(&switch);
        if snapshot != last {
            debug!(
                "Switch outputs changed: relays {:016x}, inhibits {:06b}, transmitting {:06b}",
                snapshot.relays.bits(),
                snapshot.inhibits.bits(),
                snapshot.transmitting.bits()
            );
            let _ = state_tx.send(snapshot.clone());
            last = snapshot;
        }
    }

    info!("Switch task ended");
    Ok(())
}

/// Write everything the switch has queued for the host
async fn flush_replies<S>(stream: &mut S, switch: &mut Switch) -> io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    let mut text = String::new();
    switch.flush_to(&mut text);
    if text.is_empty() {
        return Ok(());
    }

    debug!("Switch replying {:?}", text);
    stream.write_all(text.as_bytes()).await?;
    stream.flush().await
}
