//! Streaming command framer
//!
//! The switch receives one byte at a time from its host link. [`CommandCodec`]
//! accumulates bytes until the `;` terminator and parses the frame into a
//! [`SwitchCommand`].

use crate::command::SwitchCommand;
use crate::error::ParseError;
use crate::{CANCEL, TERMINATOR};

/// Default command buffer size in bytes, terminator included
pub const DEFAULT_COMMAND_BUFFER_LEN: usize = 128;

/// Byte-at-a-time framer for switch commands
///
/// - bytes below space and bytes with the high bit set are dropped
/// - `$` discards the partial command
/// - a command that fills the buffer without a terminator is dropped and
///   reported once as [`ParseError::CommandTooLong`]; input is then skipped
///   through the next `;` (or a `$`)
#[derive(Debug, Clone)]
pub struct CommandCodec {
    buffer: Vec<u8>,
    limit: usize,
    discarding: bool,
}

impl CommandCodec {
    /// Create a codec with the default buffer size
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_COMMAND_BUFFER_LEN)
    }

    /// Create a codec whose commands may be at most `limit` bytes long,
    /// terminator included
    pub fn with_limit(limit: usize) -> Self {
        let limit = limit.max(2);
        Self {
            buffer: Vec::with_capacity(limit),
            limit,
            discarding: false,
        }
    }

    /// Buffer bound in bytes
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Bytes of the command currently being accumulated
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    /// Drop any partial command
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.discarding = false;
    }

    /// Push one byte. Returns the parsed command (or parse failure) when
    /// the byte completes a frame.
    pub fn push_byte(&mut self, byte: u8) -> Option<Result<SwitchCommand, ParseError>> {
        // Line noise
        if byte < b' ' || !byte.is_ascii() {
            return None;
        }

        if byte == CANCEL {
            self.clear();
            return None;
        }

        if self.discarding {
            if byte == TERMINATOR {
                self.discarding = false;
            }
            return None;
        }

        self.buffer.push(byte);

        if byte == TERMINATOR {
            let result = SwitchCommand::parse(&self.buffer);
            self.buffer.clear();
            return Some(result);
        }

        if self.buffer.len() >= self.limit {
            tracing::warn!(
                "Command exceeds {} bytes, discarding until terminator",
                self.limit
            );
            self.buffer.clear();
            self.discarding = true;
            return Some(Err(ParseError::CommandTooLong { limit: self.limit }));
        }

        None
    }

    /// Push a run of bytes, collecting every completed frame in order
    pub fn push_bytes(&mut self, data: &[u8]) -> Vec<Result<SwitchCommand, ParseError>> {
        data.iter().filter_map(|&b| self.push_byte(b)).collect()
    }
}

impl Default for CommandCodec {
    fn default() -> Self {
        Self::new()
    }
}
