//! Property tests: the scheduling core against the in-order reference.
//!
//! Random straight-line programs of ALU, multiply/divide, load and store instructions run on
//! randomly sized machines with random unit latencies. Out-of-order execution must never be
//! visible: the final registers and memory match the reference, and instructions retire in
//! program order.

use proptest::prelude::*;

use crate::common::harness::TestContext;
use crate::common::reference::Reference;
use tomasim_core::common::Word;
use tomasim_core::config::Config;
use tomasim_core::isa::{Instruction, Opcode};

const NUM_REGS: usize = 8;
const MEMORY_WORDS: usize = 64;

const ALU_REG_OPS: [Opcode; 10] = [
    Opcode::Add,
    Opcode::Sub,
    Opcode::And,
    Opcode::Or,
    Opcode::Xor,
    Opcode::Sll,
    Opcode::Srl,
    Opcode::Sra,
    Opcode::Slt,
    Opcode::Sltu,
];

const ALU_IMM_OPS: [Opcode; 5] = [
    Opcode::Addi,
    Opcode::Xori,
    Opcode::Slli,
    Opcode::Srai,
    Opcode::Slti,
];

const MUL_OPS: [Opcode; 6] = [
    Opcode::Mul,
    Opcode::Mulh,
    Opcode::Div,
    Opcode::Divu,
    Opcode::Rem,
    Opcode::Remu,
];

fn dest() -> impl Strategy<Value = usize> {
    1..NUM_REGS
}

fn src() -> impl Strategy<Value = usize> {
    0..NUM_REGS
}

/// Straight-line instructions. Memory operands use `r0` as base so addresses stay in range.
fn instruction() -> impl Strategy<Value = Instruction> {
    prop_oneof![
        4 => (prop::sample::select(ALU_REG_OPS.to_vec()), dest(), src(), src())
            .prop_map(|(op, rd, rs1, rs2)| Instruction::reg(op, rd, rs1, rs2)),
        2 => (prop::sample::select(ALU_IMM_OPS.to_vec()), dest(), src(), -64i32..64)
            .prop_map(|(op, rd, rs1, imm)| Instruction::imm(op, rd, rs1, imm)),
        2 => (dest(), any::<i32>()).prop_map(|(rd, imm)| Instruction::li(rd, imm)),
        2 => (prop::sample::select(MUL_OPS.to_vec()), dest(), src(), src())
            .prop_map(|(op, rd, rs1, rs2)| Instruction::reg(op, rd, rs1, rs2)),
        2 => (dest(), 0i32..16).prop_map(|(rd, off)| Instruction::load(rd, 0, off)),
        2 => (src(), 0i32..16).prop_map(|(rs2, off)| Instruction::store(rs2, 0, off)),
    ]
}

prop_compose! {
    fn machine()(
        rs_size in 1usize..8,
        rob_size in 1usize..16,
        latencies in prop::array::uniform5(1u32..6),
    ) -> Config {
        let mut config = Config::default();
        config.core.num_regs = NUM_REGS;
        config.core.rs_size = rs_size;
        config.core.rob_size = rob_size;
        config.memory.size_words = MEMORY_WORDS;
        config.latency.alu = latencies[0];
        config.latency.mul = latencies[1];
        config.latency.div = latencies[2];
        config.latency.lsu = latencies[3];
        config.latency.sfu = latencies[4];
        config
    }
}

fn run_both(config: &Config, init: &[Word], program: &[Instruction]) -> (TestContext, Reference) {
    let mut reference = Reference::new(NUM_REGS, MEMORY_WORDS);
    let mut ctx = TestContext::with_config(config);
    for (reg, &val) in init.iter().enumerate().skip(1) {
        reference.regs.write(reg, val);
        ctx.set_reg(reg, val);
    }
    reference.run(program).unwrap();

    let _ = ctx.push_all(program.iter().copied());
    let _ = ctx.run_until_idle(4_000);
    (ctx, reference)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(96))]

    /// Registers and memory match the in-order reference.
    #[test]
    fn matches_in_order_reference(
        config in machine(),
        init in prop::array::uniform8(any::<u32>()),
        program in prop::collection::vec(instruction(), 1..40),
    ) {
        let (ctx, reference) = run_both(&config, &init, &program);

        prop_assert_eq!(ctx.cpu.regs.as_slice(), reference.regs.as_slice());
        prop_assert_eq!(ctx.cpu.units.memory().as_slice(), reference.memory.as_slice());
    }

    /// Instructions retire in fetch order and leave no renaming state behind.
    #[test]
    fn retires_in_program_order(
        config in machine(),
        program in prop::collection::vec(instruction(), 1..40),
    ) {
        let (ctx, _) = run_both(&config, &[0; NUM_REGS], &program);

        let expected: Vec<u32> = (0..program.len() as u32).collect();
        prop_assert_eq!(ctx.retired_pcs(), expected);
        prop_assert_eq!(ctx.cpu.rat.mapped(), 0);
        prop_assert_eq!(ctx.cpu.rst.claimed(), 0);
        prop_assert_eq!(ctx.cpu.stations.occupied(), 0);
    }

    /// Every instruction is broadcast exactly once, at most one broadcast per cycle.
    #[test]
    fn one_broadcast_per_instruction(
        config in machine(),
        program in prop::collection::vec(instruction(), 1..40),
    ) {
        let (ctx, _) = run_both(&config, &[0; NUM_REGS], &program);
        let stats = &ctx.cpu.stats;

        prop_assert_eq!(stats.cdb_broadcasts, program.len() as u64);
        prop_assert!(stats.cdb_broadcasts <= stats.cycles);
        prop_assert_eq!(stats.instructions_issued, program.len() as u64);
        prop_assert_eq!(stats.dispatched.total(), program.len() as u64);
        prop_assert_eq!(ctx.cpu.committed, program.len() as u64);
    }
}
