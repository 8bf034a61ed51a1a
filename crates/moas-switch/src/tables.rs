//! Antenna relations and the antenna-system table

use moas_protocol::{Antenna, SystemEdit, TableEdit, ANTENNAS};

/// Symmetric relation over antenna pairs, one bit row per antenna
///
/// Used for both the conflict table (antennas that must not be selected at
/// the same time by different stations) and the fast table (tx/rx pairs that
/// can be switched without waiting).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AntennaRelation {
    rows: [u64; ANTENNAS],
}

impl AntennaRelation {
    /// Relation with no pairs
    pub fn new() -> Self {
        Self {
            rows: [0; ANTENNAS],
        }
    }

    pub fn contains(&self, a: Antenna, b: Antenna) -> bool {
        self.rows[a.index()] & (1 << b.index()) != 0
    }

    /// Relate `a` and `b` in both directions
    pub fn link(&mut self, a: Antenna, b: Antenna) {
        self.rows[a.index()] |= 1 << b.index();
        self.rows[b.index()] |= 1 << a.index();
    }

    /// Remove the pair in both directions
    pub fn unlink(&mut self, a: Antenna, b: Antenna) {
        self.rows[a.index()] &= !(1 << b.index());
        self.rows[b.index()] &= !(1 << a.index());
    }

    /// Relate every pair
    pub fn fill(&mut self) {
        self.rows = [u64::MAX; ANTENNAS];
    }

    pub fn clear(&mut self) {
        self.rows = [0; ANTENNAS];
    }

    /// Apply a table edit command
    pub fn apply(&mut self, edit: &TableEdit) {
        match edit {
            TableEdit::ClearAll => self.clear(),
            TableEdit::SetAll => self.fill(),
            TableEdit::Add(pairs) => {
                for &(a, b) in pairs {
                    self.link(a, b);
                }
            }
            TableEdit::Remove(pairs) => {
                for &(a, b) in pairs {
                    self.unlink(a, b);
                }
            }
        }
    }

    /// Number of related ordered pairs
    pub fn len(&self) -> usize {
        self.rows.iter().map(|r| r.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|r| *r == 0)
    }
}

impl Default for AntennaRelation {
    fn default() -> Self {
        Self::new()
    }
}

/// Antenna → shared system id (0 means standalone)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemTable {
    systems: [u8; ANTENNAS],
}

impl SystemTable {
    pub fn new() -> Self {
        Self {
            systems: [0; ANTENNAS],
        }
    }

    /// System id of an antenna
    pub fn get(&self, antenna: Antenna) -> u8 {
        self.systems[antenna.index()]
    }

    pub fn set(&mut self, antenna: Antenna, system: u8) {
        self.systems[antenna.index()] = system;
    }

    pub fn clear(&mut self) {
        self.systems = [0; ANTENNAS];
    }

    /// Apply a system edit command
    pub fn apply(&mut self, edit: &SystemEdit) {
        match edit {
            SystemEdit::ClearAll => self.clear(),
            SystemEdit::Assign(pairs) => {
                for &(antenna, system) in pairs {
                    self.set(antenna, system);
                }
            }
        }
    }
}

impl Default for SystemTable {
    fn default() -> Self {
        Self::new()
    }
}
