//! Core processor implementation.
//!
//! This module contains the Tomasulo scheduling core: the `Cpu` container, the pipeline
//! structures and stages, and the functional units they drive.

/// CPU state container and per-cycle driver.
pub mod cpu;

/// Scheduling structures (RAT, RST, RS, ROB, CDB), instruction supply and stages.
pub mod pipeline;

/// Functional units (ALU, MUL, LSU, SFU) and data memory.
pub mod units;

pub use self::cpu::{Cpu, Retired};
