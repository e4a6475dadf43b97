//! Issue Stage: rename and allocate.
//!
//! Takes at most one instruction per cycle from the instruction supply. The instruction stays in
//! the supply when no reservation station is free or the ROB is full. Otherwise each used source
//! operand is resolved, in order of precedence, to:
//! 1. the register file value, when the RAT has no mapping;
//! 2. the ROB result, when the mapped ROB entry has been written back;
//! 3. a pending tag: the station claiming the register in the RST, or else the mapped ROB entry.
//!
//! Sources are resolved before the destination is renamed, so an instruction reading its own
//! destination waits on the previous producer.

use tracing::debug;

use crate::config::RstPolicy;
use crate::core::Cpu;
use crate::core::pipeline::rs::{Operand, Tag};
use crate::core::pipeline::supply::InstructionSupply;

/// Executes the issue stage. Returns true if an instruction was issued.
pub fn issue_stage(cpu: &mut Cpu, supply: &mut dyn InstructionSupply) -> bool {
    let Some(&inst) = supply.peek() else {
        cpu.stats.stalls_fetch += 1;
        return false;
    };

    let Some(rs_index) = cpu.stations.find_free() else {
        cpu.stats.stalls_rs_full += 1;
        debug!(pc = inst.pc, "issue stall: reservation stations full");
        return false;
    };
    if cpu.rob.is_full() {
        cpu.stats.stalls_rob_full += 1;
        debug!(pc = inst.pc, "issue stall: ROB full");
        return false;
    }

    let rs1 = if inst.flags.use_rs1 {
        resolve_operand(cpu, inst.rs1)
    } else {
        Operand::ready(0)
    };
    let rs2 = if inst.flags.use_rs2 {
        resolve_operand(cpu, inst.rs2)
    } else {
        Operand::ready(0)
    };

    let rob_index = cpu.rob.allocate(inst);
    if inst.flags.use_rd {
        cpu.rat.set(inst.rd, rob_index);
    }

    cpu.stations.allocate(rs_index, rob_index, inst, rs1, rs2);

    match cpu.rst_policy {
        RstPolicy::WritesRd if inst.flags.use_rd => cpu.rst.set(inst.rd, rs_index),
        RstPolicy::WritesRd => {}
        RstPolicy::Always => cpu.rst.set(inst.rd, rs_index),
    }

    let _ = supply.pop();
    cpu.stats.instructions_issued += 1;
    debug!(
        pc = inst.pc,
        rs = rs_index,
        rob = rob_index,
        rs1 = ?rs1.tag,
        rs2 = ?rs2.tag,
        "issue {inst}"
    );
    true
}

/// Resolves the current value of architectural register `reg`, or the producer to wait for.
pub fn resolve_operand(cpu: &Cpu, reg: usize) -> Operand {
    let Some(rob_index) = cpu.rat.get(reg) else {
        return Operand::ready(cpu.regs.read(reg));
    };
    let producer = cpu.rob.get(rob_index);
    if producer.is_ready() {
        return Operand::ready(producer.result);
    }
    match cpu.rst.get(reg) {
        Some(rs_index) => Operand::pending(Tag::Station(rs_index)),
        None => Operand::pending(Tag::Rob(rob_index)),
    }
}
