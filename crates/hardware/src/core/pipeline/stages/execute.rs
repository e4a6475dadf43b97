//! Execute Stage: advance, arbitrate, dispatch.
//!
//! In order:
//! 1. Every functional unit advances one cycle.
//! 2. Units are scanned in class order (ALU, MUL, LSU, SFU); the first finished result goes on the
//!    common data bus and its unit is cleared. Other finished units keep their result and stay busy.
//! 3. Reservation stations are scanned in index order. The memory-ordering gate refreshes the
//!    `locked` flag of waiting memory operations, then the first dispatchable entry of each class is
//!    issued to its unit if that unit is idle.

use tracing::{debug, trace};

use crate::core::Cpu;
use crate::core::pipeline::cdb::CdbEntry;
use crate::core::units::{FuOp, FuType};

/// Executes the execute stage. Returns the class that won the bus, if any.
pub fn execute_stage(cpu: &mut Cpu) -> Option<FuType> {
    cpu.units.execute_all();
    let winner = broadcast(cpu);
    refresh_locks(cpu);
    dispatch(cpu);
    winner
}

fn broadcast(cpu: &mut Cpu) -> Option<FuType> {
    let mut winner = None;
    for fu_type in FuType::ALL {
        let unit = cpu.units.unit_mut(fu_type);
        let Some(output) = unit.get_output() else {
            continue;
        };
        if winner.is_some() {
            cpu.stats.cdb_conflicts += 1;
            trace!(unit = %fu_type, rob = output.rob_index, "result waits for the bus");
            continue;
        }
        unit.clear();
        cpu.cdb.push(CdbEntry::from(output));
        debug!(
            unit = %fu_type,
            rob = output.rob_index,
            rs = output.rs_index,
            result = output.result,
            fault = ?output.fault,
            "cdb push"
        );
        winner = Some(fu_type);
    }
    winner
}

fn refresh_locks(cpu: &mut Cpu) {
    for rs_index in 0..cpu.stations.len() {
        let entry = cpu.stations.get(rs_index);
        if !entry.valid || entry.running || entry.inst.fu_type() != FuType::Lsu {
            continue;
        }
        let locked = cpu.gate.locked(&cpu.stations, &cpu.rob, rs_index);
        let entry = cpu.stations.get_mut(rs_index);
        entry.locked = locked;
        if locked && entry.operands_ready() {
            cpu.stats.lock_stalls += 1;
        }
    }
}

fn dispatch(cpu: &mut Cpu) {
    let mut claimed = [false; FuType::COUNT];
    for rs_index in 0..cpu.stations.len() {
        let entry = *cpu.stations.get(rs_index);
        let fu_type = entry.inst.fu_type();
        if claimed[fu_type.index()] || !entry.is_dispatchable() {
            continue;
        }
        claimed[fu_type.index()] = true;

        let unit = cpu.units.unit_mut(fu_type);
        if unit.is_busy() {
            continue;
        }
        unit.issue(FuOp {
            inst: entry.inst,
            rob_index: entry.rob_index,
            rs_index,
            rs1_data: entry.rs1_data,
            rs2_data: entry.rs2_data,
        });
        cpu.stations.get_mut(rs_index).running = true;
        cpu.stats.dispatched.bump(fu_type);
        debug!(unit = %fu_type, rs = rs_index, rob = entry.rob_index, "dispatch {}", entry.inst);
    }
}
