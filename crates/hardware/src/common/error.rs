//! Fault and error definitions.
//!
//! This module defines the two failure channels of the simulator:
//! 1. **Faults:** Conditions raised by a functional unit while executing an instruction. They travel
//!    with the result over the common data bus and are reported when the instruction reaches the ROB head.
//! 2. **Errors:** Runtime conditions outside the scheduling core (configuration, program text,
//!    faults at commit, cycle limits), propagated to the driver with `?`.
//!
//! Structural-hazard stalls are not errors, and broken core invariants are assertions, not values.

use std::path::PathBuf;

use thiserror::Error;

/// Fault raised while executing an instruction on a functional unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum Fault {
    /// Load or store to a word address outside data memory.
    #[error("memory access out of range at word address {addr:#x}")]
    MemoryOutOfRange {
        /// Faulting word address.
        addr: u32,
    },
}

/// Errors reported by the simulator to its caller.
#[derive(Debug, Error)]
pub enum SimError {
    /// A configuration or program file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration JSON could not be decoded.
    #[error("malformed configuration: {0}")]
    ConfigFormat(#[from] serde_json::Error),

    /// The configuration decoded but describes an impossible machine.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The assembly source could not be parsed.
    #[error("line {line}: {message}")]
    Parse {
        /// 1-based source line.
        line: usize,
        /// Description of the problem.
        message: String,
    },

    /// An instruction faulted and reached the head of the reorder buffer.
    #[error("instruction at pc {pc} faulted: {fault}")]
    Fault {
        /// Program counter of the faulting instruction.
        pc: u32,
        /// The fault raised by the functional unit.
        fault: Fault,
    },

    /// The simulation ran for the configured number of cycles without exiting.
    #[error("cycle limit of {0} reached before the program exited")]
    CycleLimit(u64),
}

impl SimError {
    /// Builds a parse error for the given 1-based line.
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}
