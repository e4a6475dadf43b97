//! Architectural Register File.
//!
//! The committed register state of the machine. The scheduling core only reads it at issue
//! (for operands with no in-flight producer) and writes it at commit. Every register is an
//! ordinary storage cell; there is no hardwired zero.

use std::fmt;

use super::Word;

/// Architectural register file, pre-sized to the configured register count.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterFile {
    regs: Vec<Word>,
}

impl RegisterFile {
    /// Creates a register file of `count` registers, all zero.
    pub fn new(count: usize) -> Self {
        Self {
            regs: vec![0; count],
        }
    }

    /// Number of architectural registers.
    #[inline]
    pub fn len(&self) -> usize {
        self.regs.len()
    }

    /// Returns true if the file has no registers.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.regs.is_empty()
    }

    /// Reads a register.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is not a valid architectural register.
    #[inline]
    pub fn read(&self, idx: usize) -> Word {
        assert!(
            idx < self.regs.len(),
            "register r{idx} out of range (have {})",
            self.regs.len()
        );
        self.regs[idx]
    }

    /// Writes a register.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is not a valid architectural register.
    #[inline]
    pub fn write(&mut self, idx: usize, val: Word) {
        assert!(
            idx < self.regs.len(),
            "register r{idx} out of range (have {})",
            self.regs.len()
        );
        self.regs[idx] = val;
    }

    /// Read-only view of all registers.
    pub fn as_slice(&self) -> &[Word] {
        &self.regs
    }
}

impl fmt::Display for RegisterFile {
    /// Formats the registers four per line as `rN=value`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, chunk) in self.regs.chunks(4).enumerate() {
            for (col, val) in chunk.iter().enumerate() {
                let idx = row * 4 + col;
                if col > 0 {
                    write!(f, "  ")?;
                }
                write!(f, "r{idx:<2}={val:#010x}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
