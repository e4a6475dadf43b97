//! Functional units.
//!
//! Each operation class has exactly one fixed-latency unit. The scheduling core talks to every unit
//! through the same narrow contract:
//! 1. **`issue`:** Hand a ready operation (with its ROB and RS indices) to an idle unit.
//! 2. **`execute`:** Advance the unit by one cycle.
//! 3. **`done` / `get_output`:** Report and expose a finished result awaiting the bus.
//! 4. **`clear`:** Free the unit once its result has been put on the common data bus.
//!
//! A unit holds one operation at a time and stays busy from `issue` until `clear`, so a finished
//! result that loses bus arbitration blocks its unit until it is broadcast.

/// Integer ALU (arithmetic, logic, shifts, compares, branch resolution).
pub mod alu;

/// Load/store unit, data memory and memory-ordering gate.
pub mod lsu;

/// Multiply/divide unit.
pub mod mul;

/// Special function unit (program exit).
pub mod sfu;

use std::fmt;

use crate::common::{Fault, RobIndex, RsIndex, Word};
use crate::config::LatencyConfig;
use crate::isa::Instruction;

pub use alu::{Alu, AluUnit};
pub use lsu::{LockGate, LsuUnit, Memory, MemoryOrderGate};
pub use mul::{MulDiv, MulUnit};
pub use sfu::SfuUnit;

/// Functional-unit class.
///
/// The declaration order is the fixed scan order used for common data bus arbitration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FuType {
    /// Integer ALU.
    Alu,
    /// Multiply/divide unit.
    Mul,
    /// Load/store unit.
    Lsu,
    /// Special function unit.
    Sfu,
}

impl FuType {
    /// Number of functional-unit classes.
    pub const COUNT: usize = 4;

    /// All classes in arbitration order.
    pub const ALL: [Self; Self::COUNT] = [Self::Alu, Self::Mul, Self::Lsu, Self::Sfu];

    /// Class index, usable to address per-class tables.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Short lowercase name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Alu => "alu",
            Self::Mul => "mul",
            Self::Lsu => "lsu",
            Self::Sfu => "sfu",
        }
    }
}

impl fmt::Display for FuType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An operation dispatched from a reservation station.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FuOp {
    /// The instruction being executed.
    pub inst: Instruction,
    /// ROB entry that will receive the result.
    pub rob_index: RobIndex,
    /// Reservation station that dispatched the operation.
    pub rs_index: RsIndex,
    /// First operand value.
    pub rs1_data: Word,
    /// Second operand value.
    pub rs2_data: Word,
}

/// A finished result, ready for the common data bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FuOutput {
    /// Computed value (0 for faulted operations).
    pub result: Word,
    /// ROB entry to complete.
    pub rob_index: RobIndex,
    /// Reservation station that produced the value.
    pub rs_index: RsIndex,
    /// Fault raised during execution, if any.
    pub fault: Option<Fault>,
}

/// Timing state shared by all fixed-latency units: one operation, a countdown, and the finished output.
#[derive(Clone, Debug, Default)]
pub struct LatencySlot {
    op: Option<FuOp>,
    remaining: u32,
    output: Option<FuOutput>,
}

impl LatencySlot {
    /// Loads an operation that will finish after `latency` calls to [`LatencySlot::tick`].
    ///
    /// # Panics
    ///
    /// Panics if the slot already holds an operation.
    pub fn load(&mut self, op: FuOp, latency: u32) {
        assert!(
            self.op.is_none(),
            "functional unit issued rs{} while still holding rs{}",
            op.rs_index,
            self.op.map_or(0, |held| held.rs_index)
        );
        self.op = Some(op);
        self.remaining = latency.max(1);
    }

    /// Advances one cycle. Returns the operation on the cycle its latency elapses.
    pub fn tick(&mut self) -> Option<FuOp> {
        if self.output.is_some() || self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        if self.remaining == 0 { self.op } else { None }
    }

    /// Records the result of the operation that just finished.
    pub fn finish(&mut self, op: &FuOp, result: Result<Word, Fault>) {
        let (result, fault) = match result {
            Ok(value) => (value, None),
            Err(fault) => (0, Some(fault)),
        };
        self.output = Some(FuOutput {
            result,
            rob_index: op.rob_index,
            rs_index: op.rs_index,
            fault,
        });
    }

    /// The finished output, if any.
    #[inline]
    pub const fn output(&self) -> Option<FuOutput> {
        self.output
    }

    /// Returns true from load until clear.
    #[inline]
    pub const fn is_busy(&self) -> bool {
        self.op.is_some()
    }

    /// Frees the slot.
    pub fn clear(&mut self) {
        self.op = None;
        self.remaining = 0;
        self.output = None;
    }
}

/// Contract between the scheduling core and a functional unit.
///
/// Implementors supply their class, latency, computation and timing slot; the issue/execute/done/
/// get_output/clear protocol is shared.
pub trait FunctionalUnit {
    /// Operation class this unit executes.
    fn fu_type(&self) -> FuType;

    /// Cycles an instruction spends in this unit.
    fn latency(&self, inst: &Instruction) -> u32;

    /// Computes the result of a finished operation.
    fn compute(&mut self, op: &FuOp) -> Result<Word, Fault>;

    /// Timing state.
    fn slot(&self) -> &LatencySlot;

    /// Mutable timing state.
    fn slot_mut(&mut self) -> &mut LatencySlot;

    /// Starts executing an operation.
    fn issue(&mut self, op: FuOp) {
        debug_assert_eq!(op.inst.fu_type(), self.fu_type());
        let latency = self.latency(&op.inst);
        self.slot_mut().load(op, latency);
    }

    /// Advances the unit by one cycle.
    fn execute(&mut self) {
        if let Some(op) = self.slot_mut().tick() {
            let result = self.compute(&op);
            self.slot_mut().finish(&op, result);
        }
    }

    /// Returns true if a finished result is waiting for the bus.
    fn done(&self) -> bool {
        self.slot().output().is_some()
    }

    /// The finished result.
    fn get_output(&self) -> Option<FuOutput> {
        self.slot().output()
    }

    /// Frees the unit after its result has been broadcast.
    fn clear(&mut self) {
        self.slot_mut().clear();
    }

    /// Returns true while the unit holds an operation.
    fn is_busy(&self) -> bool {
        self.slot().is_busy()
    }
}

/// The full set of functional units, one per class, addressed by [`FuType`].
#[derive(Debug)]
pub struct FunctionalUnits {
    alu: AluUnit,
    mul: MulUnit,
    lsu: LsuUnit,
    sfu: SfuUnit,
}

impl FunctionalUnits {
    /// Builds one unit per class with the configured latencies.
    pub fn new(latency: &LatencyConfig, memory: Memory) -> Self {
        Self {
            alu: AluUnit::new(latency.alu),
            mul: MulUnit::new(latency.mul, latency.div),
            lsu: LsuUnit::new(latency.lsu, memory),
            sfu: SfuUnit::new(latency.sfu),
        }
    }

    /// The unit for a class.
    pub fn unit(&self, fu_type: FuType) -> &dyn FunctionalUnit {
        match fu_type {
            FuType::Alu => &self.alu,
            FuType::Mul => &self.mul,
            FuType::Lsu => &self.lsu,
            FuType::Sfu => &self.sfu,
        }
    }

    /// The unit for a class, mutably.
    pub fn unit_mut(&mut self, fu_type: FuType) -> &mut dyn FunctionalUnit {
        match fu_type {
            FuType::Alu => &mut self.alu,
            FuType::Mul => &mut self.mul,
            FuType::Lsu => &mut self.lsu,
            FuType::Sfu => &mut self.sfu,
        }
    }

    /// Advances every unit by one cycle.
    pub fn execute_all(&mut self) {
        for fu_type in FuType::ALL {
            self.unit_mut(fu_type).execute();
        }
    }

    /// Returns true if any unit holds an operation.
    pub fn any_busy(&self) -> bool {
        FuType::ALL.iter().any(|&t| self.unit(t).is_busy())
    }

    /// Data memory owned by the load/store unit.
    pub fn memory(&self) -> &Memory {
        self.lsu.memory()
    }

    /// Mutable data memory.
    pub fn memory_mut(&mut self) -> &mut Memory {
        self.lsu.memory_mut()
    }
}
