//! Scheduling pipeline implementation.
//!
//! This module contains the structures of the Tomasulo core and the stages that drive them:
//! 1. **Renaming:** RAT (register to ROB producer) and RST (register to station producer).
//! 2. **Reservation Stations:** Operand waiting, forwarding and dispatch eligibility.
//! 3. **Reorder Buffer:** In-order commit of out-of-order results.
//! 4. **Common Data Bus:** The single broadcast slot.
//! 5. **Supply:** The instruction source consumed by issue.
//! 6. **Stages:** Issue, execute, writeback and commit.

/// Common Data Bus.
pub mod cdb;

/// Register Alias Table.
pub mod rat;

/// Reorder Buffer.
pub mod rob;

/// Reservation Station array.
pub mod rs;

/// Register Status Table.
pub mod rst;

/// Pipeline stage implementations (issue, execute, writeback, commit).
pub mod stages;

/// Instruction supply trait and fetch unit.
pub mod supply;
