//! Multi-cycle scenarios driven through `Cpu::tick`.
//!
//! Each cycle runs issue, execute, writeback and commit. These tests pin the observable cycle
//! timing and the final architectural state for the classic dependency patterns.

use crate::common::harness::TestContext;
use pretty_assertions::assert_eq;
use rstest::rstest;
use tomasim_core::config::{Config, RstPolicy};
use tomasim_core::core::pipeline::rs::{Operand, Tag};
use tomasim_core::core::pipeline::stages::issue::resolve_operand;
use tomasim_core::isa::{Instruction, Opcode};

// ══════════════════════════════════════════════════════════
// Timing
// ══════════════════════════════════════════════════════════

#[test]
fn single_alu_op_retires_in_second_cycle() {
    let mut ctx = TestContext::new();
    ctx.set_reg(1, 5);
    ctx.set_reg(2, 7);
    let _ = ctx.push(Instruction::reg(Opcode::Add, 3, 1, 2));

    assert_eq!(ctx.tick(), None);
    let retired = ctx.tick().unwrap();
    assert_eq!(retired.result, 12);
    assert_eq!(ctx.get_reg(3), 12);
    assert!(ctx.cpu.is_idle());
}

#[rstest]
#[case::alu(Instruction::reg(Opcode::Add, 1, 2, 3), 1)]
#[case::mul(Instruction::reg(Opcode::Mul, 1, 2, 3), 3)]
#[case::div(Instruction::reg(Opcode::Div, 1, 2, 3), 8)]
#[case::load(Instruction::load(1, 2, 0), 2)]
#[case::exit(Instruction::exit(Some(2)), 1)]
fn retire_cycle_tracks_unit_latency(#[case] inst: Instruction, #[case] latency: u64) {
    let mut ctx = TestContext::new();
    ctx.set_reg(3, 1);
    let _ = ctx.push(inst);
    let cycles = ctx.run_until_idle(32);
    assert_eq!(cycles, latency + 1);
    assert_eq!(ctx.cpu.stats.cycles, latency + 1);
}

#[test]
fn dependent_chain_serializes_on_the_bus() {
    let mut ctx = TestContext::new();
    let _ = ctx.push_all([
        Instruction::li(1, 1),
        Instruction::imm(Opcode::Addi, 1, 1, 1),
        Instruction::imm(Opcode::Addi, 1, 1, 1),
        Instruction::imm(Opcode::Addi, 1, 1, 1),
    ]);
    let _ = ctx.run_until_idle(64);

    assert_eq!(ctx.get_reg(1), 4);
    assert_eq!(ctx.cpu.rat.mapped(), 0);
    assert_eq!(ctx.cpu.rst.claimed(), 0);
    assert_eq!(ctx.retired_pcs(), vec![0, 1, 2, 3]);
}

// ══════════════════════════════════════════════════════════
// Name dependencies
// ══════════════════════════════════════════════════════════

#[test]
fn write_after_write_keeps_youngest_value() {
    let mut config = Config::default();
    config.latency.div = 6;
    let mut ctx = TestContext::with_config(&config);
    ctx.set_reg(2, 12);
    ctx.set_reg(3, 4);
    // The slow divide finishes after the younger `li`, but commits first.
    let _ = ctx.push_all([
        Instruction::reg(Opcode::Div, 5, 2, 3),
        Instruction::li(5, 99),
        Instruction::reg(Opcode::Add, 6, 5, 0),
    ]);
    let _ = ctx.run_until_idle(64);

    assert_eq!(ctx.get_reg(5), 99);
    assert_eq!(ctx.get_reg(6), 99);
    assert_eq!(ctx.retired_pcs(), vec![0, 1, 2]);
}

#[test]
fn write_after_read_uses_old_value() {
    let mut config = Config::default();
    config.latency.mul = 6;
    let mut ctx = TestContext::with_config(&config);
    ctx.set_reg(1, 10);
    let _ = ctx.push_all([
        // Delay the reader behind a slow producer of its other operand.
        Instruction::reg(Opcode::Mul, 2, 0, 0),
        Instruction::reg(Opcode::Add, 3, 1, 2),
        Instruction::li(1, 500),
    ]);
    let _ = ctx.run_until_idle(64);

    assert_eq!(ctx.get_reg(3), 10);
    assert_eq!(ctx.get_reg(1), 500);
}

#[test]
fn independent_work_overtakes_a_stalled_producer() {
    let mut config = Config::default();
    config.latency.div = 10;
    let mut ctx = TestContext::with_config(&config);
    ctx.set_reg(1, 100);
    ctx.set_reg(2, 5);
    let _ = ctx.push_all([
        Instruction::reg(Opcode::Div, 3, 1, 2),
        Instruction::li(4, 1),
        Instruction::li(5, 2),
        Instruction::li(6, 3),
    ]);
    for _ in 0..8 {
        let _ = ctx.tick();
    }

    // Every `li` has been written back while the divide is still running.
    assert!(ctx.retired.is_empty());
    for rob_index in 1..4 {
        assert!(ctx.cpu.rob.get(rob_index).is_ready());
    }
    assert!(!ctx.cpu.rob.get(0).is_ready());

    let _ = ctx.run_until_idle(32);
    assert_eq!(ctx.get_reg(3), 20);
    assert_eq!(ctx.retired_pcs(), vec![0, 1, 2, 3]);
}

// ══════════════════════════════════════════════════════════
// Memory
// ══════════════════════════════════════════════════════════

#[test]
fn load_after_store_sees_stored_value() {
    let mut ctx = TestContext::new();
    let _ = ctx.push_all([
        Instruction::li(1, 42),
        Instruction::store(1, 0, 3),
        Instruction::load(2, 0, 3),
    ]);
    let _ = ctx.run_until_idle(64);

    assert_eq!(ctx.get_reg(2), 42);
    assert!(ctx.cpu.stats.lock_stalls > 0);
}

#[test]
fn store_after_load_does_not_clobber_loaded_value() {
    let mut ctx = TestContext::new();
    ctx.cpu.units.memory_mut().write(8, 7).unwrap();
    ctx.set_reg(1, 1000);
    let _ = ctx.push_all([Instruction::load(2, 0, 8), Instruction::store(1, 0, 8)]);
    let _ = ctx.run_until_idle(64);

    assert_eq!(ctx.get_reg(2), 7);
    assert_eq!(ctx.cpu.units.memory().read(8), Ok(1000));
}

// ══════════════════════════════════════════════════════════
// RST policy
// ══════════════════════════════════════════════════════════

#[test]
fn unclaimed_producer_is_tracked_by_rob_tag() {
    let mut config = Config::default();
    config.core.rst_policy = RstPolicy::Always;
    config.latency.div = 12;
    let mut ctx = TestContext::with_config(&config);
    ctx.set_reg(2, 36);
    ctx.set_reg(3, 6);
    ctx.set_reg(5, 1);
    // The store claims r0 in the RST and gives it up at its writeback, while the divide that
    // renamed r0 is still running.
    let _ = ctx.push_all([
        Instruction::reg(Opcode::Div, 0, 2, 3),
        Instruction::store(5, 4, 0),
    ]);
    while ctx.cpu.stats.cdb_broadcasts == 0 {
        let _ = ctx.tick();
    }
    assert_eq!(ctx.cpu.rst.get(0), None);
    assert_eq!(ctx.cpu.rat.get(0), Some(0));
    assert_eq!(resolve_operand(&ctx.cpu, 0), Operand::pending(Tag::Rob(0)));

    let _ = ctx.push(Instruction::reg(Opcode::Add, 8, 0, 0));
    let _ = ctx.run_until_idle(64);
    assert_eq!(ctx.get_reg(0), 6);
    assert_eq!(ctx.get_reg(8), 12);
}
