//! MOAS Antenna Switch Emulator - Terminal front end
//!
//! Reads host commands from stdin, one script line at a time, and prints the
//! switch's replies on stdout. Lines of the form `>tx N` / `>rx N` key
//! station `N` up or down. Logs go to stderr.

mod settings;

use std::path::PathBuf;
use std::process::ExitCode;

use moas_protocol::{Antenna, TERMINATOR};
use moas_sim::{run_switch_task, Controller, ScriptStep, SwitchSnapshot};
use moas_switch::Switch;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::settings::Settings;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "moas=info,moas_protocol=info,moas_switch=info,moas_sim=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let explicit = std::env::args_os().nth(1).map(PathBuf::from);
    let settings = match Settings::load(explicit.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            error!("Failed to load settings: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("Starting MOAS switch emulator");

    let (host, switch_stream) = tokio::io::duplex(settings.link_buffer);
    let (cmd_tx, cmd_rx) = mpsc::channel(32);
    let (state_tx, state_rx) = broadcast::channel(64);

    let switch = Switch::with_config(settings.switch.clone());
    let switch_task = tokio::spawn(run_switch_task(switch_stream, switch, cmd_rx, state_tx));

    let (reader, writer) = tokio::io::split(host);
    tokio::spawn(forward_replies(reader, tokio::io::stdout(), settings.reply_per_line));
    if settings.log_snapshots {
        tokio::spawn(log_snapshots(state_rx));
    }

    let mut controller = Controller::new(writer, cmd_tx);

    for line in &settings.startup_script {
        if !run_line(&mut controller, line).await {
            return ExitCode::FAILURE;
        }
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if !run_line(&mut controller, &line).await {
                    break;
                }
            }
            Ok(None) => {
                debug!("End of input");
                break;
            }
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                break;
            }
        }
    }

    if let Err(e) = controller.shutdown().await {
        debug!("Switch task already stopped: {}", e);
    }

    match switch_task.await {
        Ok(Ok(())) => ExitCode::SUCCESS,
        Ok(Err(e)) => {
            error!("Switch task failed: {}", e);
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("Switch task panicked: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Run one script line; false when the switch task can no longer be reached
async fn run_line<W>(controller: &mut Controller<W>, line: &str) -> bool
where
    W: AsyncWrite + Unpin,
{
    if line.trim().is_empty() {
        return true;
    }

    let step = match ScriptStep::from_line(line) {
        Ok(step) => step,
        Err(e) => {
            warn!("{}", e);
            return true;
        }
    };

    match controller.run_step(&step).await {
        Ok(()) => true,
        Err(e) => {
            error!("Failed to reach switch: {}", e);
            false
        }
    }
}

/// Copy switch replies to `out`
async fn forward_replies<R, W>(mut reader: R, mut out: W, reply_per_line: bool)
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = [0u8; 1024];
    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                warn!("Failed to read switch replies: {}", e);
                break;
            }
        };

        let text = format_replies(&buf[..n], reply_per_line);
        if let Err(e) = out.write_all(&text).await {
            warn!("Failed to write replies: {}", e);
            break;
        }
        let _ = out.flush().await;
    }
}

fn format_replies(data: &[u8], reply_per_line: bool) -> Vec<u8> {
    if !reply_per_line {
        return data.to_vec();
    }
    let mut out = Vec::with_capacity(data.len() + 8);
    for &b in data {
        out.push(b);
        if b == TERMINATOR {
            out.push(b'\n');
        }
    }
    out
}

async fn log_snapshots(mut state_rx: broadcast::Receiver<SwitchSnapshot>) {
    loop {
        match state_rx.recv().await {
            Ok(snapshot) => info!("{}", describe_snapshot(&snapshot)),
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!("Snapshot log skipped {} updates", n);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn describe_snapshot(snapshot: &SwitchSnapshot) -> String {
    let antennas = |list: &[Antenna]| {
        list.iter()
            .map(|a| a.to_string())
            .collect::<Vec<_>>()
            .join(",")
    };
    format!(
        "{} relays {:016x} inhibits {:06b} transmitting {:06b} tx [{}] rx [{}]",
        if snapshot.operating { "Operate" } else { "Standby" },
        snapshot.relays.bits(),
        snapshot.inhibits.bits(),
        snapshot.transmitting.bits(),
        antennas(&snapshot.tx_antennas),
        antennas(&snapshot.rx_antennas)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use moas_protocol::{RelaySet, StationSet, STATIONS};

    #[test]
    fn test_replies_split_per_line() {
        assert_eq!(format_replies(b"!1S5;!2C6;", true), b"!1S5;\n!2C6;\n".to_vec());
        assert_eq!(format_replies(b"!1S5;!2C", true), b"!1S5;\n!2C".to_vec());
        assert_eq!(format_replies(b"!1S5;!2C6;", false), b"!1S5;!2C6;".to_vec());
    }

    #[test]
    fn test_snapshot_description() {
        let snapshot = SwitchSnapshot {
            operating: true,
            relays: RelaySet::from_bits(0x0c00),
            inhibits: StationSet::from_bits(0b000100),
            transmitting: StationSet::EMPTY,
            tx_antennas: [Antenna::LAST; STATIONS],
            rx_antennas: [Antenna::LAST; STATIONS],
        };
        assert_eq!(
            describe_snapshot(&snapshot),
            "Operate relays 0000000000000c00 inhibits 000100 transmitting 000000 \
             tx [63,63,63,63,63,63] rx [63,63,63,63,63,63]"
        );
    }

    #[tokio::test]
    async fn test_forward_replies_until_close() {
        let (mut switch_side, reader) = tokio::io::duplex(64);
        let mut out = Vec::new();

        switch_side.write_all(b"';.;").await.unwrap();
        drop(switch_side);
        forward_replies(reader, &mut out, true).await;

        assert_eq!(out, b"';\n.;\n".to_vec());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn per_line_output_only_adds_newlines(data in proptest::collection::vec(any::<u8>(), 0..256)) {
                let out = format_replies(&data, true);
                let stripped: Vec<u8> = out
                    .iter()
                    .enumerate()
                    .filter(|&(i, &b)| !(b == b'\n' && i > 0 && out[i - 1] == TERMINATOR))
                    .map(|(_, &b)| b)
                    .collect();
                prop_assert_eq!(stripped, data);
            }
        }
    }
}
