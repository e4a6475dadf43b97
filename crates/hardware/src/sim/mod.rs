//! Simulation driver.
//!
//! Pairs the scheduling core with its instruction frontend and runs programs to completion.

/// Cycle driver and exit status.
pub mod simulator;

pub use simulator::{ExitStatus, Simulator};
