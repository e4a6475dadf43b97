//! Common Data Bus.
//!
//! A single broadcast slot. The execute stage pushes at most one finished result per cycle and the
//! writeback stage of the same cycle drains it.

use crate::common::{Fault, RobIndex, RsIndex, Word};
use crate::core::units::FuOutput;

/// A result travelling on the bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CdbEntry {
    /// Result value.
    pub result: Word,
    /// ROB entry being completed.
    pub rob_index: RobIndex,
    /// Producing reservation station.
    pub rs_index: RsIndex,
    /// Fault raised by the producer.
    pub fault: Option<Fault>,
}

impl From<FuOutput> for CdbEntry {
    fn from(out: FuOutput) -> Self {
        Self {
            result: out.result,
            rob_index: out.rob_index,
            rs_index: out.rs_index,
            fault: out.fault,
        }
    }
}

/// The single-slot common data bus.
#[derive(Clone, Debug, Default)]
pub struct CommonDataBus {
    slot: Option<CdbEntry>,
}

impl CommonDataBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Places a result on the bus.
    ///
    /// # Panics
    ///
    /// Panics if the bus is already occupied: one broadcast per cycle.
    pub fn push(&mut self, entry: CdbEntry) {
        assert!(
            self.slot.is_none(),
            "second CDB broadcast in one cycle (rob{} while rob{} pending)",
            entry.rob_index,
            self.slot.map_or(0, |e| e.rob_index)
        );
        self.slot = Some(entry);
    }

    /// The pending broadcast.
    #[inline]
    pub const fn data(&self) -> Option<&CdbEntry> {
        self.slot.as_ref()
    }

    /// Drains the bus.
    pub fn pop(&mut self) -> Option<CdbEntry> {
        self.slot.take()
    }

    /// Returns true if no broadcast is pending.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.slot.is_none()
    }
}
