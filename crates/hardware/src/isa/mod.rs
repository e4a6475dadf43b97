//! Instruction set.
//!
//! This module defines the instructions the simulator executes. It provides:
//! 1. **Instruction:** Opcodes, register fields, immediates and execute flags.
//! 2. **Assembler:** Text-to-program loading with labels and data directives.

/// Assembly-text program loader.
pub mod asm;

/// Decoded instruction representation and disassembly.
pub mod instruction;

pub use asm::{Program, assemble};
pub use instruction::{ExeFlags, Instruction, Opcode};
