//! Error types for MOAS command parsing

use thiserror::Error;

use crate::reply::ErrorReply;

/// Errors that can occur while parsing a switch command
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Leading byte does not name any command
    #[error("unknown command: {0:?}")]
    UnknownCommand(char),

    /// Command ended before a required field
    #[error("missing {0}")]
    MissingField(&'static str),

    /// Station digit outside 1..=6
    #[error("invalid station digit: {0:?}")]
    InvalidStation(char),

    /// Byte is not part of the 64-symbol alphabet
    #[error("invalid symbol: {0:?}")]
    InvalidSymbol(char),

    /// Station list names the station being configured
    #[error("station {0} cannot reference itself")]
    SelfReference(u8),

    /// Pair list ended with an odd symbol
    #[error("unpaired symbol {0:?} before terminator")]
    UnpairedSymbol(char),

    /// Unit identifier is not one or two decimal digits
    #[error("invalid unit id: {0}")]
    InvalidUnitId(String),

    /// Unrecognized antenna role letter
    #[error("invalid antenna role: {0:?}")]
    InvalidRole(char),

    /// Unrecognized set-state flag
    #[error("unknown state flag: {0:?}")]
    UnknownFlag(char),

    /// Unrecognized sub-selector for a command family
    #[error("unknown selector {selector:?} for command {command:?}")]
    UnknownSelector {
        /// Leading command byte
        command: char,
        /// Offending selector byte
        selector: char,
    },

    /// Unrecognized sub-selector for a table edit (conflict/fast)
    #[error("unknown table selector {selector:?} for command {command:?}")]
    UnknownTableSelector {
        /// Leading command byte
        command: char,
        /// Offending selector byte
        selector: char,
    },

    /// Command reached the buffer bound before its terminator
    #[error("command exceeds {limit} bytes")]
    CommandTooLong {
        /// Configured buffer bound
        limit: usize,
    },
}

impl ParseError {
    /// The reply token the switch sends for this error
    pub fn reply(&self) -> ErrorReply {
        match self {
            ParseError::UnknownCommand(_) => ErrorReply::UnknownCommand,
            ParseError::UnknownTableSelector { .. } => ErrorReply::UnknownSelector,
            _ => ErrorReply::Argument,
        }
    }
}
