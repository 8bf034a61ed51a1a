//! Station, antenna, and relay identifiers plus the fixed-width sets the
//! switch keeps over them.
//!
//! Internally everything is zero-based. On the wire stations are the digits
//! `1`-`6` and antennas/relays are [`sixbit`](crate::sixbit) symbols.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use crate::error::ParseError;
use crate::sixbit;

/// Number of stations (radio ports) on the switch
pub const STATIONS: usize = 6;
/// Number of selectable antennas
pub const ANTENNAS: usize = 64;
/// Number of physical relays
pub const RELAYS: usize = 64;

/// One radio station, zero-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Station(u8);

impl Station {
    /// Create from a zero-based index
    pub fn new(index: usize) -> Option<Self> {
        (index < STATIONS).then_some(Self(index as u8))
    }

    /// Create from a 1-based station number as used by hosts and the wire
    pub fn from_number(number: u8) -> Option<Self> {
        number.checked_sub(1).and_then(|i| Self::new(i as usize))
    }

    /// Parse a wire station digit (`1`-`6`)
    pub fn from_wire(digit: u8) -> Result<Self, ParseError> {
        digit
            .checked_sub(b'1')
            .and_then(|i| Self::new(i as usize))
            .ok_or(ParseError::InvalidStation(digit as char))
    }

    /// Zero-based index
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// 1-based station number
    pub fn number(self) -> u8 {
        self.0 + 1
    }

    /// Wire digit for this station
    pub fn wire(self) -> u8 {
        b'1' + self.0
    }

    /// All stations in ascending order
    pub fn all() -> impl Iterator<Item = Station> {
        (0..STATIONS as u8).map(Station)
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// One antenna, 0..64
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Antenna(u8);

impl Antenna {
    /// The highest antenna number; every assignment starts here after reset
    pub const LAST: Antenna = Antenna(ANTENNAS as u8 - 1);

    /// Create from an index
    pub fn new(index: usize) -> Option<Self> {
        (index < ANTENNAS).then_some(Self(index as u8))
    }

    /// Parse a wire symbol
    pub fn from_symbol(symbol: u8) -> Result<Self, ParseError> {
        sixbit::decode(symbol).map(Self)
    }

    /// Wire symbol for this antenna
    pub fn symbol(self) -> u8 {
        sixbit::encode(self.0)
    }

    /// Zero-based index
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Antenna {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One relay, 0..64
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Relay(u8);

impl Relay {
    /// Create from an index
    pub fn new(index: usize) -> Option<Self> {
        (index < RELAYS).then_some(Self(index as u8))
    }

    /// Parse a wire symbol
    pub fn from_symbol(symbol: u8) -> Result<Self, ParseError> {
        sixbit::decode(symbol).map(Self)
    }

    /// Wire symbol for this relay
    pub fn symbol(self) -> u8 {
        sixbit::encode(self.0)
    }

    /// Zero-based index
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A set of stations, one bit per station
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StationSet(u8);

impl StationSet {
    const MASK: u8 = (1 << STATIONS) - 1;

    /// The empty set
    pub const EMPTY: StationSet = StationSet(0);
    /// Every station
    pub const ALL: StationSet = StationSet(Self::MASK);

    /// Build from raw bits; bits beyond the station count are dropped
    pub fn from_bits(bits: u8) -> Self {
        Self(bits & Self::MASK)
    }

    /// Raw bit pattern, station 1 in bit 0
    pub fn bits(self) -> u8 {
        self.0
    }

    /// A set holding only `station`
    pub fn only(station: Station) -> Self {
        Self(1 << station.index())
    }

    pub fn contains(self, station: Station) -> bool {
        self.0 & (1 << station.index()) != 0
    }

    pub fn insert(&mut self, station: Station) {
        self.0 |= 1 << station.index();
    }

    pub fn remove(&mut self, station: Station) {
        self.0 &= !(1 << station.index());
    }

    pub fn set(&mut self, station: Station, member: bool) {
        if member {
            self.insert(station);
        } else {
            self.remove(station);
        }
    }

    pub fn union(self, other: StationSet) -> StationSet {
        Self(self.0 | other.0)
    }

    pub fn intersection(self, other: StationSet) -> StationSet {
        Self(self.0 & other.0)
    }

    /// Members of `self` that are not in `other`
    pub fn difference(self, other: StationSet) -> StationSet {
        Self(self.0 & !other.0)
    }

    pub fn intersects(self, other: StationSet) -> bool {
        self.0 & other.0 != 0
    }

    /// True when every member of `self` is also in `other`
    pub fn is_subset(self, other: StationSet) -> bool {
        self.0 & !other.0 == 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Members in ascending station order
    pub fn iter(self) -> impl Iterator<Item = Station> {
        Station::all().filter(move |s| self.contains(*s))
    }

    /// Every subset of `self` in strictly decreasing numeric order, starting
    /// with `self` and ending with the empty set.
    ///
    /// Each step is `(x - 1) & self`, which visits every subset exactly once.
    pub fn subsets_descending(self) -> Subsets {
        Subsets {
            mask: self.0,
            next: Some(self.0),
        }
    }
}

impl BitOr for StationSet {
    type Output = StationSet;

    fn bitor(self, rhs: StationSet) -> StationSet {
        self.union(rhs)
    }
}

impl BitOrAssign for StationSet {
    fn bitor_assign(&mut self, rhs: StationSet) {
        self.0 |= rhs.0;
    }
}

impl FromIterator<Station> for StationSet {
    fn from_iter<I: IntoIterator<Item = Station>>(iter: I) -> Self {
        let mut set = StationSet::EMPTY;
        for station in iter {
            set.insert(station);
        }
        set
    }
}

/// Iterator returned by [`StationSet::subsets_descending`]
#[derive(Debug, Clone)]
pub struct Subsets {
    mask: u8,
    next: Option<u8>,
}

impl Iterator for Subsets {
    type Item = StationSet;

    fn next(&mut self) -> Option<StationSet> {
        let current = self.next?;
        self.next = (current != 0).then(|| (current - 1) & self.mask);
        Some(StationSet(current))
    }
}

/// A set of relays, one bit per relay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RelaySet(u64);

impl RelaySet {
    /// No relays
    pub const EMPTY: RelaySet = RelaySet(0);

    pub fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Raw bit pattern, relay 0 in bit 0
    pub fn bits(self) -> u64 {
        self.0
    }

    pub fn contains(self, relay: Relay) -> bool {
        self.0 & (1 << relay.index()) != 0
    }

    pub fn insert(&mut self, relay: Relay) {
        self.0 |= 1 << relay.index();
    }

    pub fn remove(&mut self, relay: Relay) {
        self.0 &= !(1 << relay.index());
    }

    pub fn union(self, other: RelaySet) -> RelaySet {
        Self(self.0 | other.0)
    }

    /// Members of `self` that are not in `other`
    pub fn difference(self, other: RelaySet) -> RelaySet {
        Self(self.0 & !other.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Members in ascending relay order
    pub fn iter(self) -> impl Iterator<Item = Relay> {
        (0..RELAYS as u8)
            .map(Relay)
            .filter(move |r| self.contains(*r))
    }

    /// One flag per relay, `true` when asserted
    pub fn to_flags(self) -> [bool; RELAYS] {
        std::array::from_fn(|i| self.0 & (1 << i) != 0)
    }
}

impl BitOr for RelaySet {
    type Output = RelaySet;

    fn bitor(self, rhs: RelaySet) -> RelaySet {
        self.union(rhs)
    }
}

impl BitOrAssign for RelaySet {
    fn bitor_assign(&mut self, rhs: RelaySet) {
        self.0 |= rhs.0;
    }
}

impl FromIterator<Relay> for RelaySet {
    fn from_iter<I: IntoIterator<Item = Relay>>(iter: I) -> Self {
        let mut set = RelaySet::EMPTY;
        for relay in iter {
            set.insert(relay);
        }
        set
    }
}
