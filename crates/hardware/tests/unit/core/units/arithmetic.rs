//! ALU and multiply/divide result tables.

use pretty_assertions::assert_eq;
use rstest::rstest;
use tomasim_core::common::Word;
use tomasim_core::core::units::{Alu, MulDiv};
use tomasim_core::isa::{Instruction, Opcode};

#[rstest]
#[case(Opcode::Add, 5, 7, 12)]
#[case(Opcode::Add, u32::MAX, 1, 0)]
#[case(Opcode::Sub, 3, 5, (-2i32) as u32)]
#[case(Opcode::And, 0b1100, 0b1010, 0b1000)]
#[case(Opcode::Or, 0b1100, 0b1010, 0b1110)]
#[case(Opcode::Xor, 0b1100, 0b1010, 0b0110)]
#[case(Opcode::Sll, 1, 33, 2)]
#[case(Opcode::Srl, 0x8000_0000, 31, 1)]
#[case(Opcode::Sra, 0x8000_0000, 31, u32::MAX)]
#[case(Opcode::Slt, (-1i32) as u32, 0, 1)]
#[case(Opcode::Sltu, (-1i32) as u32, 0, 0)]
fn alu_register_ops(#[case] op: Opcode, #[case] a: Word, #[case] b: Word, #[case] expected: Word) {
    let inst = Instruction::reg(op, 1, 2, 3);
    assert_eq!(Alu::execute(&inst, a, b), expected);
}

#[rstest]
#[case(Opcode::Addi, 10, -3, 7)]
#[case(Opcode::Andi, 0xff, 0x0f, 0x0f)]
#[case(Opcode::Ori, 0xf0, 0x0f, 0xff)]
#[case(Opcode::Xori, 0xff, -1, 0xffff_ff00)]
#[case(Opcode::Slli, 3, 4, 48)]
#[case(Opcode::Srli, 0xffff_ffff, 28, 0xf)]
#[case(Opcode::Srai, 0xffff_fff0, 4, 0xffff_ffff)]
#[case(Opcode::Slti, 4, 5, 1)]
fn alu_immediate_ops(#[case] op: Opcode, #[case] a: Word, #[case] imm: i32, #[case] expected: Word) {
    let inst = Instruction::imm(op, 1, 2, imm);
    assert_eq!(Alu::execute(&inst, a, 0), expected);
}

#[rstest]
#[case(Opcode::Beq, 4, 4, true)]
#[case(Opcode::Beq, 4, 5, false)]
#[case(Opcode::Bne, 4, 5, true)]
#[case(Opcode::Blt, (-1i32) as u32, 0, true)]
#[case(Opcode::Bge, (-1i32) as u32, 0, false)]
#[case(Opcode::Bge, 7, 7, true)]
fn branch_conditions(#[case] op: Opcode, #[case] a: Word, #[case] b: Word, #[case] taken: bool) {
    assert_eq!(Alu::branch_taken(op, a, b), taken);
}

#[test]
fn branch_result_is_next_pc() {
    let taken = Instruction::branch(Opcode::Bne, 1, 2, -3).with_pc(10);
    assert_eq!(Alu::execute(&taken, 1, 2), 7);
    assert_eq!(Alu::execute(&taken, 2, 2), 11);
}

#[test]
fn li_ignores_operands() {
    assert_eq!(Alu::execute(&Instruction::li(1, -5), 99, 99), (-5i32) as u32);
}

#[rstest]
#[case(Opcode::Mul, 6, 7, 42)]
#[case(Opcode::Mul, 0x1_0000, 0x1_0000, 0)]
#[case(Opcode::Mulh, 0x1_0000, 0x1_0000, 1)]
#[case(Opcode::Mulh, (-2i32) as u32, 3, u32::MAX)]
#[case(Opcode::Div, (-7i32) as u32, 2, (-3i32) as u32)]
#[case(Opcode::Divu, 7, 2, 3)]
#[case(Opcode::Rem, (-7i32) as u32, 2, (-1i32) as u32)]
#[case(Opcode::Remu, 7, 2, 1)]
#[case::div_by_zero(Opcode::Div, 5, 0, u32::MAX)]
#[case::divu_by_zero(Opcode::Divu, 5, 0, u32::MAX)]
#[case::rem_by_zero(Opcode::Rem, 5, 0, 5)]
#[case::remu_by_zero(Opcode::Remu, 5, 0, 5)]
#[case::div_overflow(Opcode::Div, 0x8000_0000, u32::MAX, 0x8000_0000)]
#[case::rem_overflow(Opcode::Rem, 0x8000_0000, u32::MAX, 0)]
fn mul_div_ops(#[case] op: Opcode, #[case] a: Word, #[case] b: Word, #[case] expected: Word) {
    assert_eq!(MulDiv::execute(op, a, b), expected);
}
