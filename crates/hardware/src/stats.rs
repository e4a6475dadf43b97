//! Simulation statistics collection and reporting.
//!
//! This module tracks performance metrics for the scheduling core. It provides:
//! 1. **Cycle and IPC:** Total cycles, retired instructions, and derived metrics (IPC, CPI).
//! 2. **Instruction mix:** Retired counts by category (ALU, multiply, load, store, branch, system).
//! 3. **Functional units:** Dispatches per unit class and CDB broadcasts.
//! 4. **Stalls:** Issue stalls on a full RS array or ROB, commit stalls, and results held back
//!    by bus arbitration.
//!
//! `SimStats` serializes to JSON for machine-readable reports.

use std::fmt::Write as _;
use std::time::Instant;

use serde::Serialize;

use crate::core::units::FuType;
use crate::isa::{Instruction, Opcode};

/// Per-functional-unit-class counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct UnitCounts {
    /// Integer ALU.
    pub alu: u64,
    /// Multiply/divide unit.
    pub mul: u64,
    /// Load/store unit.
    pub lsu: u64,
    /// Special function unit.
    pub sfu: u64,
}

impl UnitCounts {
    /// Increments the counter for `fu_type`.
    pub fn bump(&mut self, fu_type: FuType) {
        match fu_type {
            FuType::Alu => self.alu += 1,
            FuType::Mul => self.mul += 1,
            FuType::Lsu => self.lsu += 1,
            FuType::Sfu => self.sfu += 1,
        }
    }

    /// Counter for `fu_type`.
    pub const fn get(&self, fu_type: FuType) -> u64 {
        match fu_type {
            FuType::Alu => self.alu,
            FuType::Mul => self.mul,
            FuType::Lsu => self.lsu,
            FuType::Sfu => self.sfu,
        }
    }

    /// Sum over all classes.
    pub const fn total(&self) -> u64 {
        self.alu + self.mul + self.lsu + self.sfu
    }
}

/// Simulation statistics structure tracking all performance metrics.
#[derive(Clone, Debug, Serialize)]
pub struct SimStats {
    #[serde(skip)]
    start_time: Instant,
    /// Total simulator cycles elapsed.
    pub cycles: u64,
    /// Number of instructions committed (retired).
    pub instructions_retired: u64,
    /// Number of instructions issued into the reservation stations.
    pub instructions_issued: u64,

    /// Count of ALU (non-branch) instructions retired.
    pub inst_alu: u64,
    /// Count of multiply/divide instructions retired.
    pub inst_mul: u64,
    /// Count of load instructions retired.
    pub inst_load: u64,
    /// Count of store instructions retired.
    pub inst_store: u64,
    /// Count of branch/jump instructions retired.
    pub inst_branch: u64,
    /// Count of system (exit) instructions retired.
    pub inst_system: u64,

    /// Operations dispatched to each unit class.
    pub dispatched: UnitCounts,
    /// Results broadcast on the common data bus.
    pub cdb_broadcasts: u64,

    /// Cycles the issue stage stalled on a full reservation station array.
    pub stalls_rs_full: u64,
    /// Cycles the issue stage stalled on a full reorder buffer.
    pub stalls_rob_full: u64,
    /// Cycles the issue stage found the instruction supply empty.
    pub stalls_fetch: u64,
    /// Cycles the ROB head was waiting for its result.
    pub stalls_commit: u64,
    /// Finished results that lost bus arbitration in a cycle.
    pub cdb_conflicts: u64,
    /// Ready stations held back by the memory-ordering gate in a cycle.
    pub lock_stalls: u64,
}

impl Default for SimStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            cycles: 0,
            instructions_retired: 0,
            instructions_issued: 0,
            inst_alu: 0,
            inst_mul: 0,
            inst_load: 0,
            inst_store: 0,
            inst_branch: 0,
            inst_system: 0,
            dispatched: UnitCounts::default(),
            cdb_broadcasts: 0,
            stalls_rs_full: 0,
            stalls_rob_full: 0,
            stalls_fetch: 0,
            stalls_commit: 0,
            cdb_conflicts: 0,
            lock_stalls: 0,
        }
    }
}

/// Section names for selective stats output.
///
/// Valid section identifiers: `"summary"`, `"mix"`, `"units"`, `"stalls"`.
/// Pass an empty slice to `print_sections` to print all sections.
pub const STATS_SECTIONS: &[&str] = &["summary", "mix", "units", "stalls"];

const RULE: &str = "----------------------------------------------------------";

impl SimStats {
    /// Records a retired instruction in the instruction mix.
    pub fn record_retire(&mut self, inst: &Instruction) {
        self.instructions_retired += 1;
        match inst.op {
            Opcode::Lw => self.inst_load += 1,
            Opcode::Sw => self.inst_store += 1,
            Opcode::Exit => self.inst_system += 1,
            Opcode::Jump => self.inst_branch += 1,
            op if op.is_branch() => self.inst_branch += 1,
            op if op.fu_type() == FuType::Mul => self.inst_mul += 1,
            _ => self.inst_alu += 1,
        }
    }

    /// Instructions per cycle.
    pub fn ipc(&self) -> f64 {
        self.instructions_retired as f64 / self.cycles.max(1) as f64
    }

    /// Cycles per instruction.
    pub fn cpi(&self) -> f64 {
        self.cycles as f64 / self.instructions_retired.max(1) as f64
    }

    /// Renders the requested sections as text. An empty slice renders every section.
    pub fn render_sections(&self, sections: &[String]) -> String {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);
        let pct = |n: u64, of: u64| (n as f64 / of.max(1) as f64) * 100.0;
        let cyc = self.cycles;
        let instr = self.instructions_retired;
        let mut out = String::new();

        if want("summary") {
            let seconds = self.start_time.elapsed().as_secs_f64();
            let khz = if seconds > 0.0 {
                (cyc as f64 / seconds) / 1000.0
            } else {
                0.0
            };
            let _ = writeln!(out, "==========================================================");
            let _ = writeln!(out, "TOMASULO CORE SIMULATION STATISTICS");
            let _ = writeln!(out, "==========================================================");
            let _ = writeln!(out, "host_seconds             {seconds:.4} s");
            let _ = writeln!(out, "sim_cycles               {cyc}");
            let _ = writeln!(out, "sim_freq                 {khz:.2} kHz");
            let _ = writeln!(out, "sim_insts                {instr}");
            let _ = writeln!(out, "sim_issued               {}", self.instructions_issued);
            let _ = writeln!(out, "sim_ipc                  {:.4}", self.ipc());
            let _ = writeln!(out, "sim_cpi                  {:.4}", self.cpi());
            let _ = writeln!(out, "{RULE}");
        }
        if want("mix") {
            let _ = writeln!(out, "INSTRUCTION MIX");
            for (name, n) in [
                ("op.alu", self.inst_alu),
                ("op.mul", self.inst_mul),
                ("op.load", self.inst_load),
                ("op.store", self.inst_store),
                ("op.branch", self.inst_branch),
                ("op.system", self.inst_system),
            ] {
                let _ = writeln!(out, "  {name:<22} {n} ({:.2}%)", pct(n, instr));
            }
            let _ = writeln!(out, "{RULE}");
        }
        if want("units") {
            let _ = writeln!(out, "FUNCTIONAL UNITS");
            for fu_type in FuType::ALL {
                let n = self.dispatched.get(fu_type);
                let _ = writeln!(
                    out,
                    "  {:<22} {n} ({:.2}% of cycles)",
                    format!("dispatch.{fu_type}"),
                    pct(n, cyc)
                );
            }
            let _ = writeln!(
                out,
                "  cdb.broadcasts         {} ({:.2}% of cycles)",
                self.cdb_broadcasts,
                pct(self.cdb_broadcasts, cyc)
            );
            let _ = writeln!(out, "{RULE}");
        }
        if want("stalls") {
            let _ = writeln!(out, "STALLS");
            for (name, n) in [
                ("issue.rs_full", self.stalls_rs_full),
                ("issue.rob_full", self.stalls_rob_full),
                ("issue.no_inst", self.stalls_fetch),
                ("commit.not_ready", self.stalls_commit),
                ("cdb.conflict", self.cdb_conflicts),
                ("lsu.locked", self.lock_stalls),
            ] {
                let _ = writeln!(out, "  {name:<22} {n} ({:.2}%)", pct(n, cyc));
            }
            let _ = writeln!(out, "{RULE}");
        }
        out
    }

    /// Prints only the requested statistics sections to stdout.
    ///
    /// Each element of `sections` should be one of [`STATS_SECTIONS`]. Pass an empty slice to
    /// print all sections.
    pub fn print_sections(&self, sections: &[String]) {
        print!("{}", self.render_sections(sections));
    }

    /// Prints all statistics sections to stdout.
    pub fn print(&self) {
        self.print_sections(&[]);
    }
}
