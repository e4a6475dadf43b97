//! Simulator: owns the CPU and the instruction frontend side by side.
//!
//! Each tick runs the four core stages, then resolves control flow the core does not model:
//! a committed branch redirects the frontend to its computed next pc, after which the frontend
//! fetches for the next cycle.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::common::{SimError, Word};
use crate::config::{Config, RstPolicy};
use crate::core::pipeline::supply::FetchUnit;
use crate::core::{Cpu, Retired};
use crate::isa::{Instruction, Program};

/// How a finished program ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ExitStatus {
    /// Exit code: the retired `exit` result, or 0 if the program ran off its end.
    pub code: Word,
    /// Cycles simulated.
    pub cycles: u64,
    /// Instructions retired.
    pub retired: u64,
}

/// Top-level simulator: scheduling core plus instruction supply.
#[derive(Debug)]
pub struct Simulator {
    /// Scheduling core and architectural state.
    pub cpu: Cpu,
    /// Instruction fetch unit feeding the issue stage.
    pub frontend: FetchUnit,
    max_cycles: u64,
}

impl Simulator {
    /// Creates a simulator for `program`, with its data image preloaded into memory.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] if the configuration is invalid, an instruction names a
    /// register the core does not have, or the data image does not fit in memory.
    pub fn new(config: &Config, program: &Program) -> Result<Self, SimError> {
        config.validate()?;
        let num_regs = config.core.num_regs;
        for inst in &program.instructions {
            if let Some(reg) = inst.max_register().filter(|&r| r >= num_regs) {
                return Err(SimError::InvalidConfig(format!(
                    "`{inst}` at pc {} uses r{reg} but the core has {num_regs} registers",
                    inst.pc
                )));
            }
        }

        if let Some(inst) = Self::rst_alias_hazard(config, program) {
            warn!(
                pc = inst.pc,
                reg = inst.rd,
                "`{inst}` writes r{} which non-writing instructions also claim in the RST; \
                 readers of it may see the wrong value under the Always policy",
                inst.rd
            );
        }

        let mut cpu = Cpu::new(config);
        cpu.units.memory_mut().load_image(&program.data)?;
        let frontend = FetchUnit::new(
            program.instructions.clone(),
            config.general.fetch_width,
            config.general.queue_capacity,
        );
        info!(
            instructions = program.len(),
            data_words = program.data.len(),
            rs = config.core.rs_size,
            rob = config.core.rob_size,
            "simulator ready"
        );
        Ok(Self {
            cpu,
            frontend,
            max_cycles: config.general.max_cycles,
        })
    }

    /// First instruction of `program` whose destination is also claimed in the RST by an
    /// instruction that writes nothing, which only happens under [`RstPolicy::Always`].
    pub fn rst_alias_hazard<'a>(config: &Config, program: &'a Program) -> Option<&'a Instruction> {
        if config.core.rst_policy != RstPolicy::Always {
            return None;
        }
        let claimed: Vec<usize> = program
            .instructions
            .iter()
            .filter(|inst| !inst.flags.use_rd)
            .map(|inst| inst.rd)
            .collect();
        program
            .instructions
            .iter()
            .find(|inst| inst.flags.use_rd && claimed.contains(&inst.rd))
    }

    /// Advances the simulator by one clock cycle.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Fault`] when a faulted instruction reaches commit.
    pub fn tick(&mut self) -> Result<Option<Retired>, SimError> {
        let retired = self.cpu.tick(&mut self.frontend)?;
        if let Some(r) = retired.filter(|r| r.inst.flags.is_branch) {
            debug!(pc = r.inst.pc, next = r.result, "branch resolved");
            self.frontend.redirect(r.result);
        }
        if !self.cpu.has_exited() {
            let _ = self.frontend.fetch();
        }
        Ok(retired)
    }

    /// Returns true once `exit` has retired, or the program ran off its end and drained.
    pub fn is_finished(&self) -> bool {
        self.cpu.has_exited() || (self.frontend.is_drained() && self.cpu.is_idle())
    }

    /// Runs until the program finishes.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::CycleLimit`] after `general.max_cycles` cycles, or the first fault.
    pub fn run(&mut self) -> Result<ExitStatus, SimError> {
        while !self.is_finished() {
            if self.cpu.stats.cycles >= self.max_cycles {
                warn!(
                    pc = self.frontend.pc(),
                    retired = self.cpu.committed,
                    "cycle limit reached"
                );
                return Err(SimError::CycleLimit(self.max_cycles));
            }
            let _ = self.tick()?;
        }
        let status = self.exit_status();
        info!(
            code = status.code,
            cycles = status.cycles,
            retired = status.retired,
            "simulation finished"
        );
        Ok(status)
    }

    /// Current exit status.
    pub fn exit_status(&self) -> ExitStatus {
        ExitStatus {
            code: self.cpu.exit_code.unwrap_or(0),
            cycles: self.cpu.stats.cycles,
            retired: self.cpu.committed,
        }
    }
}
