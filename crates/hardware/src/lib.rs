//! Tomasulo dynamic-scheduling core simulator library.
//!
//! This crate implements a cycle-level out-of-order core using the Tomasulo algorithm, with the
//! following:
//! 1. **Core:** Register renaming (RAT/RST), reservation stations, reorder buffer, common data bus,
//!    and the issue/execute/writeback/commit stages.
//! 2. **Units:** Fixed-latency ALU, multiply/divide, load/store and special function units.
//! 3. **ISA:** A small 32-bit instruction set with an assembler and disassembler.
//! 4. **Simulation:** Instruction frontend, cycle driver, configuration, and statistics.

/// Common types (words, indices, register file, faults and errors).
pub mod common;
/// Simulator configuration (defaults, policies, hierarchical config structures).
pub mod config;
/// Scheduling core (pipeline structures, stages, functional units).
pub mod core;
/// Instruction set (instructions, assembler).
pub mod isa;
/// Cycle driver and exit status.
pub mod sim;
/// Simulation statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or load from JSON.
pub use crate::config::Config;
/// Scheduling core; holds the RAT, RST, RS, ROB, CDB and functional units.
pub use crate::core::Cpu;
/// Top-level simulator; pairs the core with its instruction frontend.
pub use crate::sim::Simulator;
