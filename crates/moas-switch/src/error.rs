//! Error types for the switch engine

use thiserror::Error;

/// Errors returned to the host program driving the switch
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SwitchError {
    /// Station number outside 1..=6
    #[error("invalid station number: {0}")]
    InvalidStation(u8),

    /// Firmware version that does not fit one major and two minor digits
    #[error("firmware version {major}.{minor} does not fit the identification reply")]
    InvalidFirmwareVersion { major: u8, minor: u8 },
}
