//! Reservation Station array.
//!
//! A fixed array of entries with explicit validity flags. Each entry holds an issued instruction
//! until its own result is broadcast on the common data bus. It provides:
//! 1. **Allocation:** First-free linear scan, the structural hazard check of the issue stage.
//! 2. **Operand tags:** Each source is either resolved into its data field or waits on a producer.
//! 3. **Forwarding:** A broadcast resolves every operand waiting on the broadcasting producer.
//! 4. **Release:** Exactly one entry, the producer, is freed per broadcast.

use std::fmt;

use crate::common::{RobIndex, RsIndex, Word};
use crate::isa::Instruction;

/// Producer an unresolved operand is waiting on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tag {
    /// Forwarded from the reservation station computing the value.
    Station(RsIndex),
    /// Delivered by the broadcast completing this ROB entry; used when no station claims the
    /// producer.
    Rob(RobIndex),
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Station(rs) => write!(f, "rs{rs}"),
            Self::Rob(rob) => write!(f, "rob{rob}"),
        }
    }
}

/// A source operand as resolved by the issue stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Operand {
    /// Pending producer, `None` once resolved.
    pub tag: Option<Tag>,
    /// Value, meaningful once resolved.
    pub data: Word,
}

impl Operand {
    /// An operand whose value is known.
    pub const fn ready(data: Word) -> Self {
        Self { tag: None, data }
    }

    /// An operand waiting on a producer.
    pub const fn pending(tag: Tag) -> Self {
        Self {
            tag: Some(tag),
            data: 0,
        }
    }
}

/// A single reservation station entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RsEntry {
    /// Occupied.
    pub valid: bool,
    /// Dispatched to a functional unit.
    pub running: bool,
    /// Held back by the memory-ordering gate this cycle.
    pub locked: bool,
    /// ROB entry this instruction will complete.
    pub rob_index: RobIndex,
    /// Producer of the first operand, `None` once resolved.
    pub rs1_tag: Option<Tag>,
    /// Producer of the second operand, `None` once resolved.
    pub rs2_tag: Option<Tag>,
    /// First operand value.
    pub rs1_data: Word,
    /// Second operand value.
    pub rs2_data: Word,
    /// The instruction.
    pub inst: Instruction,
}

impl Default for RsEntry {
    fn default() -> Self {
        Self {
            valid: false,
            running: false,
            locked: false,
            rob_index: 0,
            rs1_tag: None,
            rs2_tag: None,
            rs1_data: 0,
            rs2_data: 0,
            inst: Instruction::nop(),
        }
    }
}

impl RsEntry {
    /// Returns true if both operands are resolved.
    #[inline]
    pub const fn operands_ready(&self) -> bool {
        self.rs1_tag.is_none() && self.rs2_tag.is_none()
    }

    /// Returns true if the entry may be dispatched: valid, idle, operands resolved, not locked.
    #[inline]
    pub const fn is_dispatchable(&self) -> bool {
        self.valid && !self.running && !self.locked && self.operands_ready()
    }

    fn resolve(&mut self, producer: impl Fn(Tag) -> bool, value: Word) {
        if self.rs1_tag.is_some_and(&producer) {
            self.rs1_tag = None;
            self.rs1_data = value;
        }
        if self.rs2_tag.is_some_and(&producer) {
            self.rs2_tag = None;
            self.rs2_data = value;
        }
    }
}

/// The reservation station array.
#[derive(Clone, Debug)]
pub struct ReservationStations {
    entries: Vec<RsEntry>,
}

impl ReservationStations {
    /// Creates `size` free entries.
    pub fn new(size: usize) -> Self {
        Self {
            entries: vec![RsEntry::default(); size],
        }
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the array has no entries at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of occupied entries.
    pub fn occupied(&self) -> usize {
        self.entries.iter().filter(|e| e.valid).count()
    }

    /// First free entry in index order.
    pub fn find_free(&self) -> Option<RsIndex> {
        self.entries.iter().position(|e| !e.valid)
    }

    /// Fills a free entry.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range or already occupied.
    pub fn allocate(
        &mut self,
        index: RsIndex,
        rob_index: RobIndex,
        inst: Instruction,
        rs1: Operand,
        rs2: Operand,
    ) {
        let entry = self.get_mut(index);
        assert!(!entry.valid, "RS allocate into occupied entry rs{index}");
        *entry = RsEntry {
            valid: true,
            running: false,
            locked: false,
            rob_index,
            rs1_tag: rs1.tag,
            rs2_tag: rs2.tag,
            rs1_data: rs1.data,
            rs2_data: rs2.data,
            inst,
        };
    }

    /// Frees an entry.
    ///
    /// # Panics
    ///
    /// Panics if the entry is already free.
    pub fn release(&mut self, index: RsIndex) {
        let entry = self.get_mut(index);
        assert!(entry.valid, "double release of RS entry rs{index}");
        entry.valid = false;
        entry.running = false;
        entry.locked = false;
    }

    /// Offers a broadcast to every valid entry: operands waiting on station `rs_index` or on ROB
    /// entry `rob_index` take `value`.
    pub fn forward(&mut self, rs_index: RsIndex, rob_index: RobIndex, value: Word) {
        let producer =
            |tag: Tag| tag == Tag::Station(rs_index) || tag == Tag::Rob(rob_index);
        for entry in self.entries.iter_mut().filter(|e| e.valid) {
            entry.resolve(&producer, value);
        }
    }

    /// The valid entry that will complete ROB entry `rob_index`.
    pub fn find_producer(&self, rob_index: RobIndex) -> Option<RsIndex> {
        self.entries
            .iter()
            .position(|e| e.valid && e.rob_index == rob_index)
    }

    /// Entry at `index`.
    pub fn get(&self, index: RsIndex) -> &RsEntry {
        let len = self.entries.len();
        assert!(index < len, "RS index {index} out of range (0..{len})");
        &self.entries[index]
    }

    /// Mutable entry at `index`.
    pub fn get_mut(&mut self, index: RsIndex) -> &mut RsEntry {
        let len = self.entries.len();
        assert!(index < len, "RS index {index} out of range (0..{len})");
        &mut self.entries[index]
    }

    /// All entries with their indices, in index order.
    pub fn iter(&self) -> impl Iterator<Item = (RsIndex, &RsEntry)> {
        self.entries.iter().enumerate()
    }
}

impl fmt::Display for ReservationStations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn operand(tag: Option<Tag>, data: Word) -> String {
            tag.map_or_else(|| format!("{data:#x}"), |t| format!("<{t}>"))
        }
        for (i, e) in self.iter().filter(|(_, e)| e.valid) {
            writeln!(
                f,
                "rs{i:<2} rob{:<2} {}{} {:<20} a={} b={}",
                e.rob_index,
                if e.running { 'R' } else { '-' },
                if e.locked { 'L' } else { '-' },
                e.inst.to_string(),
                operand(e.rs1_tag, e.rs1_data),
                operand(e.rs2_tag, e.rs2_data),
            )?;
        }
        Ok(())
    }
}
