//! Register Status Table (RST).
//!
//! Maps each architectural register to the reservation station currently computing its value.
//! A mapping is only meaningful until the producer broadcasts: writeback releases the station and
//! clears the mapping if it still names that station, after which consumers read the value from
//! the ROB instead.

use std::fmt;

use crate::common::RsIndex;

/// Register-to-reservation-station producer map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterStatusTable {
    map: Vec<Option<RsIndex>>,
}

impl RegisterStatusTable {
    /// Creates a table with no register claimed.
    pub fn new(num_regs: usize) -> Self {
        Self {
            map: vec![None; num_regs],
        }
    }

    /// Records station `rs_index` as the producer of `reg`.
    pub fn set(&mut self, reg: usize, rs_index: RsIndex) {
        let len = self.map.len();
        assert!(reg < len, "RST access to register r{reg} out of range (0..{len})");
        self.map[reg] = Some(rs_index);
    }

    /// The station claiming `reg`.
    pub fn get(&self, reg: usize) -> Option<RsIndex> {
        let len = self.map.len();
        assert!(reg < len, "RST access to register r{reg} out of range (0..{len})");
        self.map[reg]
    }

    /// Returns true if a station claims `reg`.
    pub fn exists(&self, reg: usize) -> bool {
        self.get(reg).is_some()
    }

    /// Clears the claim on `reg` if it is held by `rs_index`. Returns true if cleared.
    pub fn clear_if_match(&mut self, reg: usize, rs_index: RsIndex) -> bool {
        if self.get(reg) == Some(rs_index) {
            self.map[reg] = None;
            true
        } else {
            false
        }
    }

    /// Number of claimed registers.
    pub fn claimed(&self) -> usize {
        self.map.iter().flatten().count()
    }
}

impl fmt::Display for RegisterStatusTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RST:")?;
        for (reg, rs) in self.map.iter().enumerate() {
            if let Some(rs) = rs {
                write!(f, " r{reg}->rs{rs}")?;
            }
        }
        Ok(())
    }
}
