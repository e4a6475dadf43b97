//! CPU Core Definition and Initialization.
//!
//! This module defines the central `Cpu` structure, the container for the whole scheduling-core
//! state of one simulated machine. It owns:
//! 1. **Renaming:** The register alias table and register status table.
//! 2. **Scheduling:** Reservation stations, reorder buffer and common data bus.
//! 3. **Execution:** One functional unit per class and the memory-ordering gate.
//! 4. **Architectural State:** The register file, committed count and exit code.
//!
//! Every structure is an instance field, so any number of machines can be simulated side by side.

use std::fmt;

use tracing::trace;

use crate::common::{RegisterFile, RobIndex, SimError, Word};
use crate::config::{Config, RstPolicy};
use crate::core::pipeline::cdb::CommonDataBus;
use crate::core::pipeline::rat::RegisterAliasTable;
use crate::core::pipeline::rob::ReorderBuffer;
use crate::core::pipeline::rs::ReservationStations;
use crate::core::pipeline::rst::RegisterStatusTable;
use crate::core::pipeline::stages::{commit_stage, execute_stage, issue_stage, writeback_stage};
use crate::core::pipeline::supply::InstructionSupply;
use crate::core::units::{FunctionalUnits, LockGate, Memory, MemoryOrderGate};
use crate::isa::Instruction;
use crate::stats::SimStats;

/// An instruction retired by the commit stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Retired {
    /// ROB slot it occupied.
    pub rob_index: RobIndex,
    /// The instruction.
    pub inst: Instruction,
    /// Its result (next pc for branches, exit code for `exit`).
    pub result: Word,
}

/// Main CPU structure containing the scheduling core.
pub struct Cpu {
    /// Architectural registers.
    pub regs: RegisterFile,
    /// Register Alias Table.
    pub rat: RegisterAliasTable,
    /// Register Status Table.
    pub rst: RegisterStatusTable,
    /// Reservation Station array.
    pub stations: ReservationStations,
    /// Reorder Buffer.
    pub rob: ReorderBuffer,
    /// Common Data Bus.
    pub cdb: CommonDataBus,
    /// Functional units, one per class.
    pub units: FunctionalUnits,
    /// Load/store dispatch gate.
    pub gate: Box<dyn LockGate>,
    /// When the issue stage claims the RST.
    pub rst_policy: RstPolicy,
    /// Instructions retired so far.
    pub committed: u64,
    /// Exit code once an `exit` instruction has retired.
    pub exit_code: Option<Word>,
    /// Performance statistics.
    pub stats: SimStats,
}

impl Cpu {
    /// Builds an idle core sized by `config`, with zeroed registers and memory and the
    /// program-order memory gate.
    pub fn new(config: &Config) -> Self {
        Self {
            regs: RegisterFile::new(config.core.num_regs),
            rat: RegisterAliasTable::new(config.core.num_regs),
            rst: RegisterStatusTable::new(config.core.num_regs),
            stations: ReservationStations::new(config.core.rs_size),
            rob: ReorderBuffer::new(config.core.rob_size),
            cdb: CommonDataBus::new(),
            units: FunctionalUnits::new(&config.latency, Memory::new(config.memory.size_words)),
            gate: Box::new(MemoryOrderGate),
            rst_policy: config.core.rst_policy,
            committed: 0,
            exit_code: None,
            stats: SimStats::default(),
        }
    }

    /// Replaces the memory-ordering gate.
    #[must_use]
    pub fn with_gate(mut self, gate: Box<dyn LockGate>) -> Self {
        self.gate = gate;
        self
    }

    /// Simulates one cycle: issue, execute, writeback, commit.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Fault`] when a faulted instruction reaches the ROB head.
    pub fn tick(&mut self, supply: &mut dyn InstructionSupply) -> Result<Option<Retired>, SimError> {
        self.stats.cycles += 1;
        let _ = issue_stage(self, supply);
        let _ = execute_stage(self);
        let _ = writeback_stage(self);
        debug_assert!(self.cdb.is_empty());
        let retired = commit_stage(self, supply)?;

        trace!(cycle = self.stats.cycles, "{}\n{}", self.rat, self.rst);
        trace!(cycle = self.stats.cycles, "reservation stations\n{}", self.stations);
        trace!(cycle = self.stats.cycles, "reorder buffer\n{}", self.rob);
        Ok(retired)
    }

    /// Returns true once an `exit` instruction has retired.
    #[inline]
    pub const fn has_exited(&self) -> bool {
        self.exit_code.is_some()
    }

    /// Returns true if nothing is in flight.
    pub fn is_idle(&self) -> bool {
        self.rob.is_empty() && self.cdb.is_empty() && !self.units.any_busy()
    }
}

impl fmt::Debug for Cpu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cpu")
            .field("regs", &self.regs)
            .field("rat", &self.rat)
            .field("rst", &self.rst)
            .field("stations", &self.stations)
            .field("rob", &self.rob)
            .field("cdb", &self.cdb)
            .field("units", &self.units)
            .field("rst_policy", &self.rst_policy)
            .field("committed", &self.committed)
            .field("exit_code", &self.exit_code)
            .finish_non_exhaustive()
    }
}
