//! Configuration system for the simulator.
//!
//! This module defines all configuration structures used to parameterize the machine. It provides:
//! 1. **Defaults:** Baseline sizes and latencies when a field is not supplied.
//! 2. **Structures:** Hierarchical config for general, core, latency and memory settings.
//! 3. **Policies:** The register-status-table update policy.
//!
//! Configuration is supplied as JSON (`Config::from_json` / `Config::from_file`) or built with
//! `Config::default()`.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::common::SimError;

/// Default configuration constants for the simulator.
mod defaults {
    /// Number of architectural registers.
    pub const NUM_REGS: usize = 32;

    /// Number of reservation station entries.
    pub const RS_SIZE: usize = 8;

    /// Number of reorder buffer entries.
    pub const ROB_SIZE: usize = 16;

    /// Instructions fetched per cycle.
    pub const FETCH_WIDTH: usize = 1;

    /// Capacity of the queue between fetch and issue.
    pub const QUEUE_CAPACITY: usize = 4;

    /// Cycles simulated before giving up on a program.
    pub const MAX_CYCLES: u64 = 1_000_000;

    /// ALU latency in cycles.
    pub const ALU_LATENCY: u32 = 1;

    /// Multiplier latency in cycles.
    pub const MUL_LATENCY: u32 = 3;

    /// Divider latency in cycles.
    pub const DIV_LATENCY: u32 = 8;

    /// Load/store unit latency in cycles.
    pub const LSU_LATENCY: u32 = 2;

    /// Special function unit latency in cycles.
    pub const SFU_LATENCY: u32 = 1;

    /// Data memory size in words (16 KiB).
    pub const MEMORY_WORDS: usize = 4096;
}

/// When the issue stage records an instruction in the register status table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum RstPolicy {
    /// Only instructions that write a destination register claim it.
    #[default]
    WritesRd,
    /// Every instruction claims its `rd` field, whether it writes it or not.
    ///
    /// Kept for comparison with hardware models that update the table unconditionally. Stores,
    /// branches, `j`, `nop` and `exit` claim r0 here, so a reader of r0 issued while an r0 writer is
    /// in flight can take the store's or branch's broadcast instead of the written value.
    /// [`Simulator::new`](crate::sim::Simulator::new) warns when a program is exposed to this.
    Always,
}

/// Root configuration structure containing all simulator settings.
///
/// # Examples
///
/// ```
/// use tomasim_core::config::{Config, RstPolicy};
///
/// let config = Config::default();
/// assert_eq!(config.core.rs_size, 8);
/// assert_eq!(config.core.rst_policy, RstPolicy::WritesRd);
///
/// let json = r#"{
///     "core": { "rs_size": 4, "rob_size": 8, "rst_policy": "Always" },
///     "latency": { "mul": 5 }
/// }"#;
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.core.rs_size, 4);
/// assert_eq!(config.core.num_regs, 32);
/// assert_eq!(config.latency.mul, 5);
/// assert_eq!(config.latency.alu, 1);
/// assert_eq!(config.core.rst_policy, RstPolicy::Always);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// General simulation settings
    #[serde(default)]
    pub general: GeneralConfig,
    /// Scheduling core sizes and policies
    #[serde(default)]
    pub core: CoreConfig,
    /// Functional unit latencies
    #[serde(default)]
    pub latency: LatencyConfig,
    /// Data memory configuration
    #[serde(default)]
    pub memory: MemoryConfig,
}

impl Config {
    /// Parses and validates a configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self, SimError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Rejects configurations that describe an impossible machine.
    pub fn validate(&self) -> Result<(), SimError> {
        let sizes = [
            ("core.num_regs", self.core.num_regs),
            ("core.rs_size", self.core.rs_size),
            ("core.rob_size", self.core.rob_size),
            ("general.fetch_width", self.general.fetch_width),
            ("general.queue_capacity", self.general.queue_capacity),
            ("memory.size_words", self.memory.size_words),
        ];
        for (name, value) in sizes {
            if value == 0 {
                return Err(SimError::InvalidConfig(format!("{name} must be at least 1")));
            }
        }

        let latencies = [
            ("latency.alu", self.latency.alu),
            ("latency.mul", self.latency.mul),
            ("latency.div", self.latency.div),
            ("latency.lsu", self.latency.lsu),
            ("latency.sfu", self.latency.sfu),
        ];
        for (name, value) in latencies {
            if value == 0 {
                return Err(SimError::InvalidConfig(format!(
                    "{name} must be at least 1 cycle"
                )));
            }
        }

        if u32::try_from(self.memory.size_words).is_err() {
            return Err(SimError::InvalidConfig(
                "memory.size_words must fit in a 32-bit address".to_string(),
            ));
        }
        Ok(())
    }
}

/// General simulation settings and options.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Emit per-stage trace events and RS/ROB dumps
    #[serde(default)]
    pub trace: bool,

    /// Cycles to simulate before reporting a cycle-limit error
    #[serde(default = "GeneralConfig::default_max_cycles")]
    pub max_cycles: u64,

    /// Instructions fetched per cycle
    #[serde(default = "GeneralConfig::default_fetch_width")]
    pub fetch_width: usize,

    /// Capacity of the instruction queue between fetch and issue
    #[serde(default = "GeneralConfig::default_queue_capacity")]
    pub queue_capacity: usize,
}

impl GeneralConfig {
    fn default_max_cycles() -> u64 {
        defaults::MAX_CYCLES
    }

    fn default_fetch_width() -> usize {
        defaults::FETCH_WIDTH
    }

    fn default_queue_capacity() -> usize {
        defaults::QUEUE_CAPACITY
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            trace: false,
            max_cycles: defaults::MAX_CYCLES,
            fetch_width: defaults::FETCH_WIDTH,
            queue_capacity: defaults::QUEUE_CAPACITY,
        }
    }
}

/// Scheduling core configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CoreConfig {
    /// Number of architectural registers
    #[serde(default = "CoreConfig::default_num_regs")]
    pub num_regs: usize,

    /// Reservation station entries
    #[serde(default = "CoreConfig::default_rs_size")]
    pub rs_size: usize,

    /// Reorder buffer entries
    #[serde(default = "CoreConfig::default_rob_size")]
    pub rob_size: usize,

    /// Register status table update policy
    #[serde(default)]
    pub rst_policy: RstPolicy,
}

impl CoreConfig {
    fn default_num_regs() -> usize {
        defaults::NUM_REGS
    }

    fn default_rs_size() -> usize {
        defaults::RS_SIZE
    }

    fn default_rob_size() -> usize {
        defaults::ROB_SIZE
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            num_regs: defaults::NUM_REGS,
            rs_size: defaults::RS_SIZE,
            rob_size: defaults::ROB_SIZE,
            rst_policy: RstPolicy::default(),
        }
    }
}

/// Functional unit latencies, in cycles from dispatch to result.
#[derive(Debug, Clone, Deserialize)]
pub struct LatencyConfig {
    /// Integer ALU (arithmetic, logic, shifts, branches)
    #[serde(default = "LatencyConfig::default_alu")]
    pub alu: u32,

    /// Multiplier
    #[serde(default = "LatencyConfig::default_mul")]
    pub mul: u32,

    /// Divider (div/rem share the multiply unit)
    #[serde(default = "LatencyConfig::default_div")]
    pub div: u32,

    /// Load/store unit
    #[serde(default = "LatencyConfig::default_lsu")]
    pub lsu: u32,

    /// Special function unit
    #[serde(default = "LatencyConfig::default_sfu")]
    pub sfu: u32,
}

impl LatencyConfig {
    fn default_alu() -> u32 {
        defaults::ALU_LATENCY
    }

    fn default_mul() -> u32 {
        defaults::MUL_LATENCY
    }

    fn default_div() -> u32 {
        defaults::DIV_LATENCY
    }

    fn default_lsu() -> u32 {
        defaults::LSU_LATENCY
    }

    fn default_sfu() -> u32 {
        defaults::SFU_LATENCY
    }
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            alu: defaults::ALU_LATENCY,
            mul: defaults::MUL_LATENCY,
            div: defaults::DIV_LATENCY,
            lsu: defaults::LSU_LATENCY,
            sfu: defaults::SFU_LATENCY,
        }
    }
}

/// Data memory configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    /// Size of data memory in 32-bit words
    #[serde(default = "MemoryConfig::default_size_words")]
    pub size_words: usize,
}

impl MemoryConfig {
    fn default_size_words() -> usize {
        defaults::MEMORY_WORDS
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            size_words: defaults::MEMORY_WORDS,
        }
    }
}
