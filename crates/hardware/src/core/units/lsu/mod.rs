//! Load/Store Unit (LSU).
//!
//! This module provides the load/store unit and the data memory it owns. It includes:
//! - [`ordering`]: The lock gate consulted before a memory operation is dispatched.
//!
//! Memory is word-addressed. Effective addresses are `rs1 + imm`; stores write when their
//! latency elapses. An address outside memory completes the operation as faulted instead of
//! touching memory.

/// Memory-ordering lock gate.
pub mod ordering;

use std::fmt;

use crate::common::{Fault, SimError, Word};
use crate::isa::{Instruction, Opcode};

use super::{FuOp, FuType, FunctionalUnit, LatencySlot};

pub use ordering::{LockGate, MemoryOrderGate};

/// Word-addressed data memory.
#[derive(Clone, PartialEq, Eq)]
pub struct Memory {
    words: Vec<Word>,
}

impl Memory {
    /// Creates zeroed memory of `size_words` words.
    pub fn new(size_words: usize) -> Self {
        Self {
            words: vec![0; size_words],
        }
    }

    /// Size in words.
    #[inline]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Returns true if memory has no words.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Reads the word at `addr`.
    pub fn read(&self, addr: u32) -> Result<Word, Fault> {
        self.words
            .get(addr as usize)
            .copied()
            .ok_or(Fault::MemoryOutOfRange { addr })
    }

    /// Writes `value` at `addr`.
    pub fn write(&mut self, addr: u32, value: Word) -> Result<(), Fault> {
        let slot = self
            .words
            .get_mut(addr as usize)
            .ok_or(Fault::MemoryOutOfRange { addr })?;
        *slot = value;
        Ok(())
    }

    /// Preloads `(address, value)` pairs, as produced by `.word` directives.
    pub fn load_image(&mut self, data: &[(u32, Word)]) -> Result<(), SimError> {
        for &(addr, value) in data {
            self.write(addr, value).map_err(|fault| {
                SimError::InvalidConfig(format!(
                    "program data does not fit in {} words of memory: {fault}",
                    self.words.len()
                ))
            })?;
        }
        Ok(())
    }

    /// All words.
    pub fn as_slice(&self) -> &[Word] {
        &self.words
    }
}

impl fmt::Debug for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let used = self.words.iter().filter(|&&w| w != 0).count();
        f.debug_struct("Memory")
            .field("size_words", &self.words.len())
            .field("nonzero_words", &used)
            .finish()
    }
}

/// Load/Store Unit behind the functional-unit contract.
#[derive(Debug)]
pub struct LsuUnit {
    latency: u32,
    memory: Memory,
    slot: LatencySlot,
}

impl LsuUnit {
    /// Creates an idle unit owning `memory`.
    pub fn new(latency: u32, memory: Memory) -> Self {
        Self {
            latency,
            memory,
            slot: LatencySlot::default(),
        }
    }

    /// Data memory.
    #[inline]
    pub const fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Mutable data memory.
    #[inline]
    pub const fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    /// Effective word address of a memory operation.
    #[inline]
    pub const fn effective_address(inst: &Instruction, base: Word) -> u32 {
        base.wrapping_add_signed(inst.imm)
    }
}

impl FunctionalUnit for LsuUnit {
    fn fu_type(&self) -> FuType {
        FuType::Lsu
    }

    fn latency(&self, _inst: &Instruction) -> u32 {
        self.latency
    }

    fn compute(&mut self, op: &FuOp) -> Result<Word, Fault> {
        let addr = Self::effective_address(&op.inst, op.rs1_data);
        match op.inst.op {
            Opcode::Lw => self.memory.read(addr),
            Opcode::Sw => self.memory.write(addr, op.rs2_data).map(|()| 0),
            _ => Ok(0),
        }
    }

    fn slot(&self) -> &LatencySlot {
        &self.slot
    }

    fn slot_mut(&mut self) -> &mut LatencySlot {
        &mut self.slot
    }
}
