//! Commit Stage Unit Tests.
//!
//! Verifies that `commit_stage`:
//!   1. Retires only a written-back head, one per cycle, in program order
//!   2. Writes the register file and clears the RAT only for the latest writer
//!   3. Latches the exit code of a retiring `exit`
//!   4. Surfaces a faulted head as an error
//!   5. Refuses to commit more than was fetched

use crate::common::harness::{QueueSupply, TestContext};
use pretty_assertions::assert_eq;
use tomasim_core::common::{Fault, SimError};
use tomasim_core::config::Config;
use tomasim_core::core::pipeline::stages::{
    commit_stage, execute_stage, issue_stage, writeback_stage,
};
use tomasim_core::core::pipeline::supply::InstructionSupply;
use tomasim_core::isa::{Instruction, Opcode};

fn issue_all(ctx: &mut TestContext) {
    while issue_stage(&mut ctx.cpu, &mut ctx.supply) {}
}

fn commit(ctx: &mut TestContext) -> Option<tomasim_core::core::Retired> {
    commit_stage(&mut ctx.cpu, &ctx.supply).unwrap()
}

// ══════════════════════════════════════════════════════════
// Retirement
// ══════════════════════════════════════════════════════════

#[test]
fn add_commits_sum_to_register_file() {
    let mut ctx = TestContext::new();
    ctx.set_reg(1, 5);
    ctx.set_reg(2, 7);
    let _ = ctx.push(Instruction::reg(Opcode::Add, 3, 1, 2));
    issue_all(&mut ctx);

    assert_eq!(commit(&mut ctx), None);
    assert_eq!(ctx.cpu.stats.stalls_commit, 1);

    let _ = execute_stage(&mut ctx.cpu);
    let _ = execute_stage(&mut ctx.cpu);
    let _ = writeback_stage(&mut ctx.cpu).unwrap();
    let retired = commit(&mut ctx).unwrap();

    assert_eq!(retired.rob_index, 0);
    assert_eq!(retired.result, 12);
    assert_eq!(ctx.get_reg(3), 12);
    assert_eq!(ctx.cpu.rat.get(3), None);
    assert!(ctx.cpu.rob.is_empty());
    assert_eq!(ctx.cpu.committed, 1);
    assert_eq!(ctx.cpu.stats.instructions_retired, 1);
    assert_eq!(ctx.cpu.stats.inst_alu, 1);
}

#[test]
fn completed_younger_entry_waits_for_head() {
    let mut config = Config::default();
    config.latency.mul = 5;
    let mut ctx = TestContext::with_config(&config);
    let _ = ctx.push_all([
        Instruction::reg(Opcode::Mul, 1, 0, 0),
        Instruction::li(2, 9),
    ]);
    issue_all(&mut ctx);
    let _ = execute_stage(&mut ctx.cpu);
    let _ = execute_stage(&mut ctx.cpu);
    let _ = writeback_stage(&mut ctx.cpu).unwrap();

    assert!(ctx.cpu.rob.get(1).is_ready());
    assert_eq!(commit(&mut ctx), None);
    assert_eq!(ctx.get_reg(2), 0);
}

#[test]
fn older_writer_does_not_clear_younger_mapping() {
    let mut ctx = TestContext::new();
    let _ = ctx.push_all([Instruction::li(4, 1), Instruction::li(4, 2)]);
    issue_all(&mut ctx);
    let _ = execute_stage(&mut ctx.cpu);
    let _ = execute_stage(&mut ctx.cpu);
    let _ = writeback_stage(&mut ctx.cpu).unwrap();

    let first = commit(&mut ctx).unwrap();
    assert_eq!(first.result, 1);
    assert_eq!(ctx.get_reg(4), 1);
    assert_eq!(ctx.cpu.rat.get(4), Some(1));

    let _ = execute_stage(&mut ctx.cpu);
    let _ = writeback_stage(&mut ctx.cpu).unwrap();
    let second = commit(&mut ctx).unwrap();
    assert_eq!(second.rob_index, 1);
    assert_eq!(ctx.get_reg(4), 2);
    assert_eq!(ctx.cpu.rat.get(4), None);
}

#[test]
fn store_commit_leaves_registers_alone() {
    let mut ctx = TestContext::new();
    ctx.set_reg(1, 77);
    let _ = ctx.push(Instruction::store(1, 0, 2));
    issue_all(&mut ctx);
    let regs = ctx.cpu.regs.clone();
    for _ in 0..4 {
        let _ = execute_stage(&mut ctx.cpu);
        let _ = writeback_stage(&mut ctx.cpu);
    }

    let retired = commit(&mut ctx).unwrap();
    assert_eq!(retired.inst.op, Opcode::Sw);
    assert_eq!(ctx.cpu.regs, regs);
    assert_eq!(ctx.cpu.units.memory().read(2), Ok(77));
    assert_eq!(ctx.cpu.stats.inst_store, 1);
}

#[test]
fn exit_latches_exit_code() {
    let mut ctx = TestContext::new();
    ctx.set_reg(5, 3);
    let _ = ctx.push(Instruction::exit(Some(5)));
    issue_all(&mut ctx);
    let _ = execute_stage(&mut ctx.cpu);
    let _ = execute_stage(&mut ctx.cpu);
    let _ = writeback_stage(&mut ctx.cpu).unwrap();

    assert!(!ctx.cpu.has_exited());
    let _ = commit(&mut ctx).unwrap();
    assert_eq!(ctx.cpu.exit_code, Some(3));
    assert_eq!(ctx.cpu.stats.inst_system, 1);
}

#[test]
fn empty_rob_commits_nothing() {
    let mut ctx = TestContext::new();
    let before = format!("{:?}", ctx.cpu);
    assert_eq!(commit(&mut ctx), None);
    assert_eq!(format!("{:?}", ctx.cpu), before);
    assert_eq!(ctx.cpu.stats.stalls_commit, 0);
}

// ══════════════════════════════════════════════════════════
// Faults and contract checks
// ══════════════════════════════════════════════════════════

#[test]
fn faulted_head_is_an_error() {
    let mut config = Config::default();
    config.memory.size_words = 16;
    let mut ctx = TestContext::with_config(&config);
    let _ = ctx.push_all([Instruction::li(1, 1), Instruction::load(2, 0, 40)]);
    issue_all(&mut ctx);

    let mut error = None;
    for _ in 0..8 {
        let _ = execute_stage(&mut ctx.cpu);
        let _ = writeback_stage(&mut ctx.cpu);
        match commit_stage(&mut ctx.cpu, &ctx.supply) {
            Ok(_) => {}
            Err(e) => {
                error = Some(e);
                break;
            }
        }
    }

    // The older `li` retired normally before the fault surfaced.
    assert_eq!(ctx.get_reg(1), 1);
    match error {
        Some(SimError::Fault { pc, fault }) => {
            assert_eq!(pc, 1);
            assert_eq!(fault, Fault::MemoryOutOfRange { addr: 40 });
        }
        other => panic!("expected fault at commit, got {other:?}"),
    }
}

/// A supply that reports nothing fetched, to trip the commit contract.
#[derive(Debug, Default)]
struct EmptyHistory;

impl InstructionSupply for EmptyHistory {
    fn is_empty(&self) -> bool {
        true
    }

    fn peek(&self) -> Option<&Instruction> {
        None
    }

    fn pop(&mut self) -> Option<Instruction> {
        None
    }

    fn fetched(&self) -> u64 {
        0
    }
}

#[test]
#[should_panic(expected = "exceeds")]
fn committing_more_than_fetched_panics() {
    let mut ctx = TestContext::new();
    let mut supply = QueueSupply::default();
    supply.push(Instruction::li(1, 1));
    let _ = issue_stage(&mut ctx.cpu, &mut supply);
    let _ = execute_stage(&mut ctx.cpu);
    let _ = execute_stage(&mut ctx.cpu);
    let _ = writeback_stage(&mut ctx.cpu);
    let _ = commit_stage(&mut ctx.cpu, &EmptyHistory);
}
