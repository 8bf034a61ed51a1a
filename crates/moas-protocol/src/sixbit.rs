//! Six-bit wire alphabet
//!
//! Antenna numbers, relay numbers, system ids, and packed relay status all
//! travel as single symbols from a 64-character alphabet:
//!
//! | Symbols | Values |
//! |---------|--------|
//! | `0`-`9` | 0-9    |
//! | `A`-`Z` | 10-35  |
//! | `a`-`z` | 36-61  |
//! | `{` `}` | 62, 63 |

use crate::error::ParseError;

/// The 64 wire symbols, indexed by value
pub const ALPHABET: &[u8; 64] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz{}";

/// Encode a value (only the low six bits are used) as a wire symbol
pub fn encode(value: u8) -> u8 {
    ALPHABET[(value & 0x3F) as usize]
}

/// Decode a wire symbol into its value
pub fn decode(symbol: u8) -> Result<u8, ParseError> {
    match symbol {
        b'0'..=b'9' => Ok(symbol - b'0'),
        b'A'..=b'Z' => Ok(symbol - b'A' + 10),
        b'a'..=b'z' => Ok(symbol - b'a' + 36),
        b'{' => Ok(62),
        b'}' => Ok(63),
        _ => Err(ParseError::InvalidSymbol(symbol as char)),
    }
}
