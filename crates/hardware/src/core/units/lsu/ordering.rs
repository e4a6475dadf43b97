//! Memory ordering gate.
//!
//! The execute stage asks a [`LockGate`] whether a memory operation in a reservation station may be
//! dispatched this cycle. The answer is stored in the entry's `locked` flag; a locked entry is
//! skipped and reconsidered on the next cycle.
//!
//! [`MemoryOrderGate`] keeps memory effects in program order without address comparison:
//! - a store waits until every older load and store has left the reservation stations;
//! - a load waits until every older store has left the reservation stations.
//!
//! Stores write memory when they complete and leave their station when they broadcast, so an
//! unlocked load always observes every older store. The oldest memory operation is never locked.

use crate::common::RsIndex;
use crate::core::pipeline::rob::ReorderBuffer;
use crate::core::pipeline::rs::ReservationStations;
use crate::core::units::FuType;
use crate::isa::Opcode;

/// Load/store dispatch gate.
pub trait LockGate {
    /// Returns true if the memory operation in station `rs_index` must not dispatch this cycle.
    fn locked(&self, stations: &ReservationStations, rob: &ReorderBuffer, rs_index: RsIndex) -> bool;
}

/// Program-order memory gate (see module docs).
#[derive(Clone, Copy, Debug, Default)]
pub struct MemoryOrderGate;

impl LockGate for MemoryOrderGate {
    fn locked(&self, stations: &ReservationStations, rob: &ReorderBuffer, rs_index: RsIndex) -> bool {
        let entry = stations.get(rs_index);
        if !entry.valid || entry.inst.fu_type() != FuType::Lsu {
            return false;
        }
        let is_store = entry.inst.op == Opcode::Sw;
        let age = rob.age(entry.rob_index);

        stations.iter().any(|(idx, other)| {
            idx != rs_index
                && other.valid
                && other.inst.fu_type() == FuType::Lsu
                && rob.age(other.rob_index) < age
                && (is_store || other.inst.op == Opcode::Sw)
        })
    }
}
