//! Reorder Buffer (ROB) for in-order commit.
//!
//! The ROB is a circular buffer that tracks in-flight instructions from issue through commit. It
//! provides:
//! 1. **Allocation:** Entries are taken at the tail in program order; the slot index is the tag
//!    consumers and the RAT refer to.
//! 2. **Completion:** Exactly one broadcast marks an entry completed (or faulted) with its result.
//! 3. **In-order Commit:** Only the head retires, and only once it is no longer `Issued`.
//! 4. **Age:** Distance from the head, used to order memory operations.

use std::fmt;

use crate::common::{Fault, RobIndex, Word};
use crate::isa::Instruction;

/// Lifecycle state of an ROB entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RobState {
    /// Entry allocated but instruction not yet finished executing.
    #[default]
    Issued,
    /// Execution complete, result available, waiting to commit.
    Completed,
    /// Instruction faulted; the simulation stops when it reaches the head.
    Faulted,
}

/// A single entry in the Reorder Buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RobEntry {
    /// The instruction.
    pub inst: Instruction,
    /// Current lifecycle state.
    pub state: RobState,
    /// Computed result value.
    pub result: Word,
    /// Fault raised during execution, if faulted.
    pub fault: Option<Fault>,
    /// Whether this entry is occupied.
    pub valid: bool,
}

impl Default for RobEntry {
    fn default() -> Self {
        Self {
            inst: Instruction::nop(),
            state: RobState::Issued,
            result: 0,
            fault: None,
            valid: false,
        }
    }
}

impl RobEntry {
    /// Returns true once the result (or fault) has been written back.
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.state != RobState::Issued
    }
}

/// Reorder Buffer, a circular buffer for in-order commit.
#[derive(Clone, Debug)]
pub struct ReorderBuffer {
    /// Fixed-size entry array.
    entries: Vec<RobEntry>,
    /// Index of the oldest entry (commit point).
    head: usize,
    /// Index where the next entry will be allocated.
    tail: usize,
    /// Number of valid entries.
    count: usize,
}

impl ReorderBuffer {
    /// Creates a new ROB with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: vec![RobEntry::default(); capacity],
            head: 0,
            tail: 0,
            count: 0,
        }
    }

    /// Returns the ROB capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Returns the number of occupied entries.
    #[inline]
    pub const fn len(&self) -> usize {
        self.count
    }

    /// Returns true if the ROB is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns true if the ROB is full.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.count == self.entries.len()
    }

    /// Allocates the tail entry for `inst` and returns its index.
    ///
    /// # Panics
    ///
    /// Panics if the ROB is full; the issue stage checks capacity first.
    pub fn allocate(&mut self, inst: Instruction) -> RobIndex {
        assert!(!self.is_full(), "ROB allocate while full ({} entries)", self.count);
        let index = self.tail;
        self.entries[index] = RobEntry {
            inst,
            valid: true,
            ..RobEntry::default()
        };
        self.tail = (self.tail + 1) % self.entries.len();
        self.count += 1;
        index
    }

    /// Marks an entry as Completed with its result value.
    ///
    /// # Panics
    ///
    /// Panics if the entry is free or was already written back.
    pub fn complete(&mut self, index: RobIndex, result: Word) {
        let entry = self.issued_mut(index);
        entry.state = RobState::Completed;
        entry.result = result;
    }

    /// Marks an entry as Faulted.
    ///
    /// # Panics
    ///
    /// Panics if the entry is free or was already written back.
    pub fn fault(&mut self, index: RobIndex, fault: Fault) {
        let entry = self.issued_mut(index);
        entry.state = RobState::Faulted;
        entry.fault = Some(fault);
    }

    fn issued_mut(&mut self, index: RobIndex) -> &mut RobEntry {
        let entry = self.get_mut(index);
        assert!(
            entry.state == RobState::Issued,
            "ROB entry rob{index} written back twice"
        );
        entry
    }

    /// Index of the head entry, if the ROB is non-empty.
    #[inline]
    pub const fn head_index(&self) -> Option<RobIndex> {
        if self.count == 0 { None } else { Some(self.head) }
    }

    /// Returns a reference to the head entry (oldest), if the ROB is non-empty.
    pub fn peek_head(&self) -> Option<&RobEntry> {
        self.head_index().map(|i| &self.entries[i])
    }

    /// Retires the head entry.
    ///
    /// # Panics
    ///
    /// Panics if the ROB is empty.
    pub fn pop_head(&mut self) -> RobEntry {
        assert!(self.count > 0, "ROB pop while empty");
        let retired = self.entries[self.head];
        self.entries[self.head].valid = false;
        self.head = (self.head + 1) % self.entries.len();
        self.count -= 1;
        retired
    }

    /// Valid entry at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range or free.
    pub fn get(&self, index: RobIndex) -> &RobEntry {
        let cap = self.entries.len();
        assert!(index < cap, "ROB index {index} out of range (0..{cap})");
        let entry = &self.entries[index];
        assert!(entry.valid, "ROB access to free entry rob{index}");
        entry
    }

    fn get_mut(&mut self, index: RobIndex) -> &mut RobEntry {
        let cap = self.entries.len();
        assert!(index < cap, "ROB index {index} out of range (0..{cap})");
        let entry = &mut self.entries[index];
        assert!(entry.valid, "ROB access to free entry rob{index}");
        entry
    }

    /// Program-order position of `index` relative to the head (0 = oldest).
    pub fn age(&self, index: RobIndex) -> usize {
        let cap = self.entries.len();
        (index + cap - self.head) % cap
    }

    /// Iterates valid entries from head to tail with their indices.
    pub fn iter(&self) -> impl Iterator<Item = (RobIndex, &RobEntry)> {
        let cap = self.entries.len();
        (0..self.count).map(move |n| {
            let idx = (self.head + n) % cap;
            (idx, &self.entries[idx])
        })
    }
}

impl fmt::Display for ReorderBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, e) in self.iter() {
            let state = match e.state {
                RobState::Issued => "issued",
                RobState::Completed => "done",
                RobState::Faulted => "fault",
            };
            writeln!(
                f,
                "rob{idx:<2} {}{state:<6} pc={:<4} {:<20} result={:#x}",
                if idx == self.head { '>' } else { ' ' },
                e.inst.pc,
                e.inst.to_string(),
                e.result
            )?;
        }
        Ok(())
    }
}
