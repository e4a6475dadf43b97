//! Commit Stage: retire the ROB head.
//!
//! Retires the oldest instruction if and only if its result has been written back. A retiring
//! writer updates the register file and clears its RAT mapping only when no younger writer has
//! renamed the register since. A faulted head stops the simulation.

use tracing::debug;

use crate::common::SimError;
use crate::core::Cpu;
use crate::core::cpu::Retired;
use crate::core::pipeline::supply::InstructionSupply;

/// Executes the commit stage. Returns the retired instruction, if any.
///
/// # Errors
///
/// Returns [`SimError::Fault`] when the head instruction faulted during execution.
///
/// # Panics
///
/// Panics if more instructions would be committed than the supply has fetched.
pub fn commit_stage(
    cpu: &mut Cpu,
    supply: &dyn InstructionSupply,
) -> Result<Option<Retired>, SimError> {
    let Some(head_index) = cpu.rob.head_index() else {
        return Ok(None);
    };
    let head = *cpu.rob.get(head_index);
    if let Some(fault) = head.fault {
        return Err(SimError::Fault {
            pc: head.inst.pc,
            fault,
        });
    }
    if !head.is_ready() {
        cpu.stats.stalls_commit += 1;
        return Ok(None);
    }

    assert!(
        cpu.committed < supply.fetched(),
        "commit of instruction {} exceeds the {} fetched",
        cpu.committed + 1,
        supply.fetched()
    );

    let inst = head.inst;
    if inst.flags.use_rd {
        cpu.regs.write(inst.rd, head.result);
        let _ = cpu.rat.clear_if_match(inst.rd, head_index);
    }
    let _ = cpu.rob.pop_head();
    cpu.committed += 1;
    cpu.stats.record_retire(&inst);

    if inst.flags.is_exit {
        cpu.exit_code = Some(head.result);
    }
    debug!(pc = inst.pc, rob = head_index, result = head.result, "commit {inst}");

    Ok(Some(Retired {
        rob_index: head_index,
        inst,
        result: head.result,
    }))
}
