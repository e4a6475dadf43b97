//! Register Alias Table (RAT).
//!
//! Maps each architectural register to the ROB index of its latest in-flight producer, or `None`
//! if the register file holds the current value. The issue stage overwrites the mapping for every
//! destination it renames (last writer wins); commit clears it only while it still names the
//! committing entry.

use std::fmt;

use crate::common::RobIndex;

/// Register-to-ROB producer map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterAliasTable {
    map: Vec<Option<RobIndex>>,
}

impl RegisterAliasTable {
    /// Creates a table with every register unmapped.
    pub fn new(num_regs: usize) -> Self {
        Self {
            map: vec![None; num_regs],
        }
    }

    /// Records `rob_index` as the newest producer of `reg`.
    pub fn set(&mut self, reg: usize, rob_index: RobIndex) {
        let len = self.map.len();
        assert!(reg < len, "RAT access to register r{reg} out of range (0..{len})");
        self.map[reg] = Some(rob_index);
    }

    /// The newest in-flight producer of `reg`.
    pub fn get(&self, reg: usize) -> Option<RobIndex> {
        let len = self.map.len();
        assert!(reg < len, "RAT access to register r{reg} out of range (0..{len})");
        self.map[reg]
    }

    /// Returns true if `reg` has an in-flight producer.
    pub fn exists(&self, reg: usize) -> bool {
        self.get(reg).is_some()
    }

    /// Clears the mapping of `reg`, but only if it still names `rob_index`.
    ///
    /// Returns true if the mapping was cleared. A superseded producer leaves the table unchanged.
    pub fn clear_if_match(&mut self, reg: usize, rob_index: RobIndex) -> bool {
        if self.get(reg) == Some(rob_index) {
            self.map[reg] = None;
            true
        } else {
            false
        }
    }

    /// Number of mapped registers.
    pub fn mapped(&self) -> usize {
        self.map.iter().flatten().count()
    }
}

impl fmt::Display for RegisterAliasTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RAT:")?;
        for (reg, rob) in self.map.iter().enumerate() {
            if let Some(rob) = rob {
                write!(f, " r{reg}->rob{rob}")?;
            }
        }
        Ok(())
    }
}
