//! Assembly-text program loader.
//!
//! Turns a small RISC-style assembly dialect into a [`Program`]:
//! - One instruction per line, optionally preceded by `label:`.
//! - `#` and `;` start comments.
//! - Registers are written `rN` or `xN`; immediates are decimal or `0x` hex, optionally negative.
//! - Branch and jump targets are labels or signed instruction offsets.
//! - `.word addr value [value ...]` preloads consecutive data memory words starting at `addr`.
//!
//! Pseudo-instructions: `mv rd, rs` is `addi rd, rs, 0` and `halt` is `exit`.

use std::collections::HashMap;

use crate::common::{SimError, Word};
use crate::isa::instruction::{Instruction, Opcode};

/// An assembled program: instruction memory plus data memory initialisers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Program {
    /// Instructions; `instructions[pc]` has program counter `pc`.
    pub instructions: Vec<Instruction>,
    /// `(word address, value)` pairs written to data memory before the run.
    pub data: Vec<(u32, Word)>,
}

impl Program {
    /// Builds a program from instructions, assigning program counters in order.
    pub fn from_instructions(instructions: impl IntoIterator<Item = Instruction>) -> Self {
        let instructions = instructions
            .into_iter()
            .enumerate()
            .map(|(pc, inst)| inst.with_pc(pc as u32))
            .collect();
        Self {
            instructions,
            data: Vec::new(),
        }
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Returns true if the program has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

/// One source line after comment and label stripping.
struct SourceLine<'a> {
    line: usize,
    mnemonic: &'a str,
    operands: Vec<&'a str>,
}

/// Assembles program text.
///
/// # Examples
///
/// ```
/// use tomasim_core::isa::asm::assemble;
///
/// let program = assemble("
///     li   r1, 5
///     li   r2, 7
///     add  r3, r1, r2
///     exit r3
/// ").unwrap();
/// assert_eq!(program.len(), 4);
/// assert_eq!(program.instructions[2].to_string(), "add r3, r1, r2");
/// ```
pub fn assemble(src: &str) -> Result<Program, SimError> {
    let mut labels: HashMap<&str, u32> = HashMap::new();
    let mut lines = Vec::new();
    let mut data = Vec::new();

    // First pass: labels, data directives and instruction lines.
    for (idx, raw) in src.lines().enumerate() {
        let line = idx + 1;
        let mut text = strip_comment(raw).trim();

        while let Some(colon) = text.find(':') {
            let label = text[..colon].trim();
            if !is_identifier(label) {
                return Err(SimError::parse(line, format!("invalid label `{label}`")));
            }
            let pc = lines.len() as u32;
            if labels.insert(label, pc).is_some() {
                return Err(SimError::parse(line, format!("duplicate label `{label}`")));
            }
            text = text[colon + 1..].trim();
        }

        if text.is_empty() {
            continue;
        }

        let (mnemonic, rest) = match text.split_once(char::is_whitespace) {
            Some((m, rest)) => (m, rest.trim()),
            None => (text, ""),
        };

        if mnemonic == ".word" {
            data.extend(parse_data(line, rest)?);
            continue;
        }

        let operands = if rest.is_empty() {
            Vec::new()
        } else {
            rest.split(',').map(str::trim).collect()
        };
        lines.push(SourceLine {
            line,
            mnemonic,
            operands,
        });
    }

    // Second pass: encode with all labels known.
    let mut instructions = Vec::with_capacity(lines.len());
    for (pc, src_line) in lines.iter().enumerate() {
        let inst = encode(src_line, pc as u32, &labels)?;
        instructions.push(inst.with_pc(pc as u32));
    }

    Ok(Program { instructions, data })
}

fn strip_comment(line: &str) -> &str {
    match line.find(['#', ';']) {
        Some(pos) => &line[..pos],
        None => line,
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '.')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

fn parse_data(line: usize, rest: &str) -> Result<Vec<(u32, Word)>, SimError> {
    let mut fields = rest
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty());
    let addr_text = fields
        .next()
        .ok_or_else(|| SimError::parse(line, ".word needs an address"))?;
    let base = parse_word(line, addr_text)?;

    let mut out = Vec::new();
    for (offset, field) in fields.enumerate() {
        out.push((base.wrapping_add(offset as u32), parse_word(line, field)?));
    }
    if out.is_empty() {
        return Err(SimError::parse(line, ".word needs at least one value"));
    }
    Ok(out)
}

fn expect_operands(src: &SourceLine<'_>, count: usize) -> Result<(), SimError> {
    if src.operands.len() == count {
        Ok(())
    } else {
        Err(SimError::parse(
            src.line,
            format!(
                "`{}` takes {count} operand(s), found {}",
                src.mnemonic,
                src.operands.len()
            ),
        ))
    }
}

fn encode(src: &SourceLine<'_>, pc: u32, labels: &HashMap<&str, u32>) -> Result<Instruction, SimError> {
    let line = src.line;
    let ops = &src.operands;

    match src.mnemonic {
        "mv" => {
            expect_operands(src, 2)?;
            return Ok(Instruction::imm(
                Opcode::Addi,
                parse_reg(line, ops[0])?,
                parse_reg(line, ops[1])?,
                0,
            ));
        }
        "halt" => {
            expect_operands(src, 0)?;
            return Ok(Instruction::exit(None));
        }
        _ => {}
    }

    let op = Opcode::from_mnemonic(src.mnemonic)
        .ok_or_else(|| SimError::parse(line, format!("unknown mnemonic `{}`", src.mnemonic)))?;

    let inst = match op {
        Opcode::Add
        | Opcode::Sub
        | Opcode::And
        | Opcode::Or
        | Opcode::Xor
        | Opcode::Sll
        | Opcode::Srl
        | Opcode::Sra
        | Opcode::Slt
        | Opcode::Sltu
        | Opcode::Mul
        | Opcode::Mulh
        | Opcode::Div
        | Opcode::Divu
        | Opcode::Rem
        | Opcode::Remu => {
            expect_operands(src, 3)?;
            Instruction::reg(
                op,
                parse_reg(line, ops[0])?,
                parse_reg(line, ops[1])?,
                parse_reg(line, ops[2])?,
            )
        }
        Opcode::Addi
        | Opcode::Andi
        | Opcode::Ori
        | Opcode::Xori
        | Opcode::Slli
        | Opcode::Srli
        | Opcode::Srai
        | Opcode::Slti => {
            expect_operands(src, 3)?;
            Instruction::imm(
                op,
                parse_reg(line, ops[0])?,
                parse_reg(line, ops[1])?,
                parse_imm(line, ops[2])?,
            )
        }
        Opcode::Li => {
            expect_operands(src, 2)?;
            Instruction::li(parse_reg(line, ops[0])?, parse_imm(line, ops[1])?)
        }
        Opcode::Nop => {
            expect_operands(src, 0)?;
            Instruction::nop()
        }
        Opcode::Beq | Opcode::Bne | Opcode::Blt | Opcode::Bge => {
            expect_operands(src, 3)?;
            Instruction::branch(
                op,
                parse_reg(line, ops[0])?,
                parse_reg(line, ops[1])?,
                parse_target(line, ops[2], pc, labels)?,
            )
        }
        Opcode::Jump => {
            expect_operands(src, 1)?;
            Instruction::jump(parse_target(line, ops[0], pc, labels)?)
        }
        Opcode::Lw => {
            expect_operands(src, 2)?;
            let (offset, base) = parse_mem(line, ops[1])?;
            Instruction::load(parse_reg(line, ops[0])?, base, offset)
        }
        Opcode::Sw => {
            expect_operands(src, 2)?;
            let (offset, base) = parse_mem(line, ops[1])?;
            Instruction::store(parse_reg(line, ops[0])?, base, offset)
        }
        Opcode::Exit => match ops.len() {
            0 => Instruction::exit(None),
            1 => Instruction::exit(Some(parse_reg(line, ops[0])?)),
            _ => return Err(SimError::parse(line, "`exit` takes at most one register")),
        },
    };
    Ok(inst)
}

fn parse_reg(line: usize, text: &str) -> Result<usize, SimError> {
    text.strip_prefix('r')
        .or_else(|| text.strip_prefix('x'))
        .and_then(|n| n.parse::<usize>().ok())
        .ok_or_else(|| SimError::parse(line, format!("expected register, found `{text}`")))
}

/// Parses a number in decimal or `0x` hex, accepting anything that fits in 32 bits signed or unsigned.
fn parse_number(text: &str) -> Option<i64> {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let magnitude = match body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        Some(hex) => i64::from_str_radix(hex, 16).ok()?,
        None => body.parse::<i64>().ok()?,
    };
    let value = if negative { -magnitude } else { magnitude };
    (i64::from(i32::MIN)..=i64::from(u32::MAX))
        .contains(&value)
        .then_some(value)
}

fn parse_imm(line: usize, text: &str) -> Result<i32, SimError> {
    parse_number(text)
        .map(|v| v as u32 as i32)
        .ok_or_else(|| SimError::parse(line, format!("expected 32-bit immediate, found `{text}`")))
}

fn parse_word(line: usize, text: &str) -> Result<Word, SimError> {
    parse_number(text)
        .map(|v| v as u32)
        .ok_or_else(|| SimError::parse(line, format!("expected 32-bit value, found `{text}`")))
}

fn parse_target(line: usize, text: &str, pc: u32, labels: &HashMap<&str, u32>) -> Result<i32, SimError> {
    if let Some(&target) = labels.get(text) {
        return Ok(target as i32 - pc as i32);
    }
    if is_identifier(text) {
        return Err(SimError::parse(line, format!("undefined label `{text}`")));
    }
    parse_imm(line, text)
}

/// Parses `offset(rN)`; the offset may be omitted.
fn parse_mem(line: usize, text: &str) -> Result<(i32, usize), SimError> {
    let open = text
        .find('(')
        .ok_or_else(|| SimError::parse(line, format!("expected `offset(reg)`, found `{text}`")))?;
    let close = text
        .rfind(')')
        .filter(|&c| c > open && c == text.len() - 1)
        .ok_or_else(|| SimError::parse(line, format!("unbalanced parentheses in `{text}`")))?;

    let offset_text = text[..open].trim();
    let offset = if offset_text.is_empty() {
        0
    } else {
        parse_imm(line, offset_text)?
    };
    let base = parse_reg(line, text[open + 1..close].trim())?;
    Ok((offset, base))
}
