//! Arithmetic Logic Unit (ALU).
//!
//! This module implements the integer ALU. It handles arithmetic, logical operations, shifts and
//! compares on 32-bit words, and resolves conditional branches by producing the next program counter.

use crate::common::{Fault, Word};
use crate::isa::{Instruction, Opcode};

use super::{FuOp, FuType, FunctionalUnit, LatencySlot};

/// Mask selecting the shift amount from the low operand bits.
const SHAMT_MASK: u32 = 0x1f;

/// Arithmetic Logic Unit (ALU) for integer operations.
///
/// Stateless; [`AluUnit`] adds the timing around it.
#[derive(Debug)]
pub struct Alu;

impl Alu {
    /// Executes an ALU-class instruction.
    ///
    /// # Arguments
    ///
    /// * `inst` - The instruction (its opcode, immediate and pc are used)
    /// * `a`    - Value of `rs1`
    /// * `b`    - Value of `rs2`
    ///
    /// # Returns
    ///
    /// The result word. Branches return the next program counter; `nop` and `j` return 0.
    ///
    /// # Examples
    ///
    /// ```
    /// use tomasim_core::core::units::Alu;
    /// use tomasim_core::isa::{Instruction, Opcode};
    ///
    /// assert_eq!(Alu::execute(&Instruction::reg(Opcode::Add, 3, 1, 2), 5, 7), 12);
    /// assert_eq!(Alu::execute(&Instruction::imm(Opcode::Addi, 1, 1, -1), 0, 0), u32::MAX);
    ///
    /// let beq = Instruction::branch(Opcode::Beq, 1, 2, 4).with_pc(10);
    /// assert_eq!(Alu::execute(&beq, 3, 3), 14);
    /// assert_eq!(Alu::execute(&beq, 3, 4), 11);
    /// ```
    pub fn execute(inst: &Instruction, a: Word, b: Word) -> Word {
        let imm = inst.imm as u32;
        match inst.op {
            Opcode::Add => a.wrapping_add(b),
            Opcode::Sub => a.wrapping_sub(b),
            Opcode::And => a & b,
            Opcode::Or => a | b,
            Opcode::Xor => a ^ b,
            Opcode::Sll => a << (b & SHAMT_MASK),
            Opcode::Srl => a >> (b & SHAMT_MASK),
            Opcode::Sra => ((a as i32) >> (b & SHAMT_MASK)) as u32,
            Opcode::Slt => u32::from((a as i32) < (b as i32)),
            Opcode::Sltu => u32::from(a < b),
            Opcode::Addi => a.wrapping_add(imm),
            Opcode::Andi => a & imm,
            Opcode::Ori => a | imm,
            Opcode::Xori => a ^ imm,
            Opcode::Slli => a << (imm & SHAMT_MASK),
            Opcode::Srli => a >> (imm & SHAMT_MASK),
            Opcode::Srai => ((a as i32) >> (imm & SHAMT_MASK)) as u32,
            Opcode::Slti => u32::from((a as i32) < inst.imm),
            Opcode::Li => imm,
            Opcode::Beq | Opcode::Bne | Opcode::Blt | Opcode::Bge => {
                if Self::branch_taken(inst.op, a, b) {
                    inst.target()
                } else {
                    inst.pc.wrapping_add(1)
                }
            }
            _ => 0,
        }
    }

    /// Evaluates a branch condition.
    pub fn branch_taken(op: Opcode, a: Word, b: Word) -> bool {
        match op {
            Opcode::Beq => a == b,
            Opcode::Bne => a != b,
            Opcode::Blt => (a as i32) < (b as i32),
            Opcode::Bge => (a as i32) >= (b as i32),
            _ => false,
        }
    }
}

/// The ALU behind the functional-unit contract.
#[derive(Debug)]
pub struct AluUnit {
    latency: u32,
    slot: LatencySlot,
}

impl AluUnit {
    /// Creates an idle ALU with a fixed latency.
    pub fn new(latency: u32) -> Self {
        Self {
            latency,
            slot: LatencySlot::default(),
        }
    }
}

impl FunctionalUnit for AluUnit {
    fn fu_type(&self) -> FuType {
        FuType::Alu
    }

    fn latency(&self, _inst: &Instruction) -> u32 {
        self.latency
    }

    fn compute(&mut self, op: &FuOp) -> Result<Word, Fault> {
        Ok(Alu::execute(&op.inst, op.rs1_data, op.rs2_data))
    }

    fn slot(&self) -> &LatencySlot {
        &self.slot
    }

    fn slot_mut(&mut self) -> &mut LatencySlot {
        &mut self.slot
    }
}
