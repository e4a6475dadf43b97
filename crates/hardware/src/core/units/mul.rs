//! Multiply/divide unit.
//!
//! Division by zero and signed overflow follow RISC-V M-extension results instead of trapping:
//! `x / 0 = -1`, `x % 0 = x`, `MIN / -1 = MIN`, `MIN % -1 = 0`.

use crate::common::{Fault, Word};
use crate::isa::{Instruction, Opcode};

use super::{FuOp, FuType, FunctionalUnit, LatencySlot};

/// Number of bits in a word (used for high-multiply shift).
const WORD_BITS: u32 = 32;

/// Multiply/divide arithmetic.
#[derive(Debug)]
pub struct MulDiv;

impl MulDiv {
    /// Executes a MUL-class opcode. Returns 0 for other opcodes.
    pub fn execute(op: Opcode, a: Word, b: Word) -> Word {
        let (sa, sb) = (a as i32, b as i32);
        match op {
            Opcode::Mul => a.wrapping_mul(b),
            Opcode::Mulh => ((i64::from(sa) * i64::from(sb)) >> WORD_BITS) as u32,
            Opcode::Div => {
                if b == 0 {
                    u32::MAX
                } else {
                    sa.wrapping_div(sb) as u32
                }
            }
            Opcode::Divu => a.checked_div(b).unwrap_or(u32::MAX),
            Opcode::Rem => {
                if b == 0 {
                    a
                } else {
                    sa.wrapping_rem(sb) as u32
                }
            }
            Opcode::Remu => a.checked_rem(b).unwrap_or(a),
            _ => 0,
        }
    }
}

/// Multiplier/divider behind the functional-unit contract.
#[derive(Debug)]
pub struct MulUnit {
    mul_latency: u32,
    div_latency: u32,
    slot: LatencySlot,
}

impl MulUnit {
    /// Creates an idle unit; divide and remainder use `div_latency`.
    pub fn new(mul_latency: u32, div_latency: u32) -> Self {
        Self {
            mul_latency,
            div_latency,
            slot: LatencySlot::default(),
        }
    }
}

impl FunctionalUnit for MulUnit {
    fn fu_type(&self) -> FuType {
        FuType::Mul
    }

    fn latency(&self, inst: &Instruction) -> u32 {
        if inst.op.is_divide() {
            self.div_latency
        } else {
            self.mul_latency
        }
    }

    fn compute(&mut self, op: &FuOp) -> Result<Word, Fault> {
        Ok(MulDiv::execute(op.inst.op, op.rs1_data, op.rs2_data))
    }

    fn slot(&self) -> &LatencySlot {
        &self.slot
    }

    fn slot_mut(&mut self) -> &mut LatencySlot {
        &mut self.slot
    }
}
