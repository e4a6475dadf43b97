//! Pipeline stage implementations.
//!
//! This module contains the four stages of the scheduling core, run once per cycle in this order:
//! 1. **Issue:** Renames one instruction from the supply into a reservation station and the ROB.
//! 2. **Execute:** Advances the functional units, selects one CDB broadcast, dispatches ready
//!    stations.
//! 3. **Writeback:** Forwards the broadcast to waiting stations, releases the producer, completes
//!    its ROB entry.
//! 4. **Commit:** Retires the ROB head in program order.

/// Commit stage implementation.
pub mod commit;

/// Execute stage implementation.
pub mod execute;

/// Issue stage implementation.
pub mod issue;

/// Writeback stage implementation.
pub mod writeback;

/// Commit stage entry point.
pub use commit::commit_stage;
/// Execute stage entry point.
pub use execute::execute_stage;
/// Issue stage entry point.
pub use issue::issue_stage;
/// Writeback stage entry point.
pub use writeback::writeback_stage;
