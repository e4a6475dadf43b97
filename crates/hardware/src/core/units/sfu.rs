//! Special function unit.
//!
//! Executes `exit`. Its result is the exit code: the value of `rs1`, or 0 when `exit` names no
//! register (the issue stage leaves unused operands at 0).

use crate::common::{Fault, Word};
use crate::isa::Instruction;

use super::{FuOp, FuType, FunctionalUnit, LatencySlot};

/// Special function unit behind the functional-unit contract.
#[derive(Debug)]
pub struct SfuUnit {
    latency: u32,
    slot: LatencySlot,
}

impl SfuUnit {
    /// Creates an idle unit.
    pub fn new(latency: u32) -> Self {
        Self {
            latency,
            slot: LatencySlot::default(),
        }
    }
}

impl FunctionalUnit for SfuUnit {
    fn fu_type(&self) -> FuType {
        FuType::Sfu
    }

    fn latency(&self, _inst: &Instruction) -> u32 {
        self.latency
    }

    fn compute(&mut self, op: &FuOp) -> Result<Word, Fault> {
        Ok(if op.inst.flags.use_rs1 { op.rs1_data } else { 0 })
    }

    fn slot(&self) -> &LatencySlot {
        &self.slot
    }

    fn slot_mut(&mut self) -> &mut LatencySlot {
        &mut self.slot
    }
}
