//! Switch configuration

use moas_protocol::DEFAULT_COMMAND_BUFFER_LEN;
use serde::{Deserialize, Serialize};

use crate::error::SwitchError;

/// Firmware version reported by the unit id command
///
/// Deserializing rejects versions that do not fit the reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFirmwareVersion")]
pub struct FirmwareVersion {
    /// One digit
    pub major: u8,
    /// Reported as two digits
    pub minor: u8,
}

impl FirmwareVersion {
    pub const MAX_MAJOR: u8 = 9;
    pub const MAX_MINOR: u8 = 99;

    pub fn new(major: u8, minor: u8) -> Result<Self, SwitchError> {
        if major > Self::MAX_MAJOR || minor > Self::MAX_MINOR {
            return Err(SwitchError::InvalidFirmwareVersion { major, minor });
        }
        Ok(Self { major, minor })
    }
}

#[derive(Deserialize)]
struct RawFirmwareVersion {
    major: u8,
    minor: u8,
}

impl TryFrom<RawFirmwareVersion> for FirmwareVersion {
    type Error = SwitchError;

    fn try_from(raw: RawFirmwareVersion) -> Result<Self, SwitchError> {
        Self::new(raw.major, raw.minor)
    }
}

impl Default for FirmwareVersion {
    fn default() -> Self {
        Self { major: 1, minor: 1 }
    }
}

/// Switch engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitchConfig {
    /// Longest accepted command in bytes, terminator included
    pub command_buffer_len: usize,
    pub firmware: FirmwareVersion,
}

impl Default for SwitchConfig {
    fn default() -> Self {
        Self {
            command_buffer_len: DEFAULT_COMMAND_BUFFER_LEN,
            firmware: FirmwareVersion::default(),
        }
    }
}
