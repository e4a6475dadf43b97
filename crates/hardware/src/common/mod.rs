//! Common types shared across the simulator.
//!
//! This module provides the building blocks used by every other component:
//! 1. **Word and index types:** The machine word and the index aliases used for cross-references
//!    between the reservation stations, the reorder buffer and the renaming tables.
//! 2. **Error Handling:** Execution faults and the driver-facing `SimError`.
//! 3. **Register File:** Architectural register storage.

/// Error and fault definitions.
pub mod error;

/// Architectural register file.
pub mod reg;

pub use error::{Fault, SimError};
pub use reg::RegisterFile;

/// Machine word. All arithmetic on words wraps.
pub type Word = u32;

/// Index of a slot in the reorder buffer.
pub type RobIndex = usize;

/// Index of a slot in the reservation station array.
pub type RsIndex = usize;
