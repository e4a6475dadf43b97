//! Instruction supply.
//!
//! The issue stage consumes instructions through the [`InstructionSupply`] trait. [`FetchUnit`] is
//! the in-tree implementation: it walks a program and fills a bounded queue. Control flow is
//! handled here, outside the scheduling core:
//! 1. **Jumps:** `j` is followed at fetch and still flows through the core as a no-op.
//! 2. **Branches:** Fetch stops after a conditional branch until the driver calls
//!    [`FetchUnit::redirect`] with the branch's committed next pc.
//! 3. **Exit:** Fetch stops after `exit` and at the end of the program.

use std::collections::VecDeque;

use tracing::trace;

use crate::isa::{Instruction, Opcode};

/// Source of decoded instructions for the issue stage.
pub trait InstructionSupply {
    /// Returns true if no instruction is ready to issue.
    fn is_empty(&self) -> bool;

    /// The next instruction, without consuming it.
    fn peek(&self) -> Option<&Instruction>;

    /// Consumes the next instruction.
    fn pop(&mut self) -> Option<Instruction>;

    /// Total instructions produced so far.
    fn fetched(&self) -> u64;
}

/// Why fetch is not advancing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchState {
    /// Fetching sequentially.
    Running,
    /// Waiting for a conditional branch to commit.
    AwaitBranch,
    /// Past `exit` or the end of the program.
    Stopped,
}

/// Program walker feeding a bounded instruction queue.
#[derive(Clone, Debug)]
pub struct FetchUnit {
    program: Vec<Instruction>,
    pc: u32,
    queue: VecDeque<Instruction>,
    capacity: usize,
    width: usize,
    fetched: u64,
    state: FetchState,
}

impl FetchUnit {
    /// Creates a fetch unit at pc 0.
    pub fn new(program: Vec<Instruction>, width: usize, capacity: usize) -> Self {
        Self {
            program,
            pc: 0,
            queue: VecDeque::with_capacity(capacity),
            capacity,
            width,
            fetched: 0,
            state: FetchState::Running,
        }
    }

    /// Fetches up to `width` instructions into the queue. Returns how many were fetched.
    pub fn fetch(&mut self) -> usize {
        let mut count = 0;
        while count < self.width
            && self.state == FetchState::Running
            && self.queue.len() < self.capacity
        {
            let Some(&inst) = self.program.get(self.pc as usize) else {
                trace!(pc = self.pc, "fetch reached end of program");
                self.state = FetchState::Stopped;
                break;
            };
            self.queue.push_back(inst);
            self.fetched += 1;
            count += 1;

            if inst.op == Opcode::Jump {
                self.pc = inst.target();
            } else {
                self.pc = self.pc.wrapping_add(1);
            }
            if inst.flags.is_branch {
                self.state = FetchState::AwaitBranch;
            } else if inst.flags.is_exit {
                self.state = FetchState::Stopped;
            }
        }
        count
    }

    /// Resumes fetch at `pc` after a conditional branch commits.
    pub fn redirect(&mut self, pc: u32) {
        debug_assert_eq!(self.state, FetchState::AwaitBranch);
        trace!(pc, "fetch redirected");
        self.pc = pc;
        self.state = FetchState::Running;
    }

    /// Next pc to fetch.
    #[inline]
    pub const fn pc(&self) -> u32 {
        self.pc
    }

    /// Current fetch state.
    #[inline]
    pub const fn state(&self) -> FetchState {
        self.state
    }

    /// Instructions queued for issue.
    #[inline]
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Returns true once fetch has stopped for good and the queue is empty.
    pub fn is_drained(&self) -> bool {
        self.state == FetchState::Stopped && self.queue.is_empty()
    }
}

impl InstructionSupply for FetchUnit {
    fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    fn peek(&self) -> Option<&Instruction> {
        self.queue.front()
    }

    fn pop(&mut self) -> Option<Instruction> {
        self.queue.pop_front()
    }

    fn fetched(&self) -> u64 {
        self.fetched
    }
}
