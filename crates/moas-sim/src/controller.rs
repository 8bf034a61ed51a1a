//! Scripted host controller
//!
//! A [`Controller`] stands where the host program would: it writes command
//! bytes to the switch stream and keys stations through the switch task's
//! command channel. Scripts are plain text, one step per line:
//!
//! - `>tx N` / `>rx N` key station `N` up or down
//! - anything else is sent to the switch as command bytes

use std::io;

use moas_protocol::{EncodeCommand, SwitchCommand, TERMINATOR};
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::debug;

use crate::switch_task::SwitchTaskCommand;

/// Errors from driving the switch task
#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Switch task is no longer running")]
    TaskClosed,

    #[error("Invalid script line: {0}")]
    InvalidLine(String),
}

/// One step of a controller script
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStep {
    /// A single well-formed command
    Send(SwitchCommand),
    /// Bytes passed through untouched, for malformed or multi-command lines
    Raw(Vec<u8>),
    /// Key a station (1-based) up or down
    Key { station: u8, active: bool },
}

impl ScriptStep {
    /// Parse one script line
    pub fn from_line(line: &str) -> Result<Self, ControllerError> {
        let line = line.trim();

        if let Some(rest) = line.strip_prefix('>') {
            let (direction, station) = rest
                .split_once(char::is_whitespace)
                .ok_or_else(|| ControllerError::InvalidLine(line.to_string()))?;
            let active = match direction {
                "tx" => true,
                "rx" => false,
                _ => return Err(ControllerError::InvalidLine(line.to_string())),
            };
            let station = station
                .trim()
                .parse()
                .map_err(|_| ControllerError::InvalidLine(line.to_string()))?;
            return Ok(Self::Key { station, active });
        }

        let bytes = line.as_bytes();
        let single_frame = bytes.iter().position(|&b| b == TERMINATOR) == Some(bytes.len().wrapping_sub(1));
        if single_frame {
            if let Ok(command) = SwitchCommand::parse(bytes) {
                return Ok(Self::Send(command));
            }
        }
        Ok(Self::Raw(bytes.to_vec()))
    }
}

/// Host-side driver for a running switch task
pub struct Controller<W> {
    writer: W,
    commands: mpsc::Sender<SwitchTaskCommand>,
}

impl<W> Controller<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(writer: W, commands: mpsc::Sender<SwitchTaskCommand>) -> Self {
        Self { writer, commands }
    }

    /// Encode and send one command
    pub async fn send(&mut self, command: &SwitchCommand) -> Result<(), ControllerError> {
        debug!("Sending {:?}", command);
        self.write_raw(&command.encode()).await
    }

    /// Send bytes exactly as given
    pub async fn write_raw(&mut self, data: &[u8]) -> Result<(), ControllerError> {
        self.writer.write_all(data).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Key a station up or down
    pub async fn key(&self, station: u8, active: bool) -> Result<(), ControllerError> {
        self.commands
            .send(SwitchTaskCommand::SetTransmit { station, active })
            .await
            .map_err(|_| ControllerError::TaskClosed)
    }

    /// Ask the switch task to stop
    pub async fn shutdown(&self) -> Result<(), ControllerError> {
        self.commands
            .send(SwitchTaskCommand::Shutdown)
            .await
            .map_err(|_| ControllerError::TaskClosed)
    }

    pub async fn run_step(&mut self, step: &ScriptStep) -> Result<(), ControllerError> {
        match step {
            ScriptStep::Send(command) => self.send(command).await,
            ScriptStep::Raw(data) => self.write_raw(data).await,
            ScriptStep::Key { station, active } => self.key(*station, *active).await,
        }
    }

    /// Run every non-blank line of `script`; returns the number of steps run
    ///
    /// The whole script is parsed before anything is sent.
    pub async fn run_script(&mut self, script: &str) -> Result<usize, ControllerError> {
        let steps = script
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(ScriptStep::from_line)
            .collect::<Result<Vec<_>, _>>()?;

        for step in &steps {
            self.run_step(step).await?;
        }
        Ok(steps.len())
    }
}
