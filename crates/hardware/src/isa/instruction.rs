//! Decoded instruction representation.
//!
//! An `Instruction` is what the instruction supply hands to the issue stage. It carries:
//! 1. **Opcode:** The operation, which also selects the functional-unit class.
//! 2. **Register fields:** `rd`, `rs1`, `rs2` as architectural indices (unused fields are 0).
//! 3. **Immediate:** Sign-extended immediate, memory offset, or branch/jump offset in instructions.
//! 4. **Execute flags:** Which register fields are actually read or written, and whether the
//!    instruction terminates the program or redirects fetch.

use std::fmt;

use crate::core::units::FuType;

/// Operation performed by an instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// rd = rs1 + rs2
    Add,
    /// rd = rs1 - rs2
    Sub,
    /// rd = rs1 & rs2
    And,
    /// rd = rs1 | rs2
    Or,
    /// rd = rs1 ^ rs2
    Xor,
    /// rd = rs1 << rs2[4:0]
    Sll,
    /// rd = rs1 >> rs2[4:0] (logical)
    Srl,
    /// rd = rs1 >> rs2[4:0] (arithmetic)
    Sra,
    /// rd = (rs1 < rs2) signed
    Slt,
    /// rd = (rs1 < rs2) unsigned
    Sltu,
    /// rd = rs1 + imm
    Addi,
    /// rd = rs1 & imm
    Andi,
    /// rd = rs1 | imm
    Ori,
    /// rd = rs1 ^ imm
    Xori,
    /// rd = rs1 << imm[4:0]
    Slli,
    /// rd = rs1 >> imm[4:0] (logical)
    Srli,
    /// rd = rs1 >> imm[4:0] (arithmetic)
    Srai,
    /// rd = (rs1 < imm) signed
    Slti,
    /// rd = imm
    Li,
    /// No operation.
    Nop,
    /// Branch if rs1 == rs2.
    Beq,
    /// Branch if rs1 != rs2.
    Bne,
    /// Branch if rs1 < rs2 (signed).
    Blt,
    /// Branch if rs1 >= rs2 (signed).
    Bge,
    /// Unconditional jump, followed by the frontend at fetch.
    Jump,
    /// rd = low word of rs1 * rs2
    Mul,
    /// rd = high word of signed rs1 * rs2
    Mulh,
    /// rd = rs1 / rs2 (signed)
    Div,
    /// rd = rs1 / rs2 (unsigned)
    Divu,
    /// rd = rs1 % rs2 (signed)
    Rem,
    /// rd = rs1 % rs2 (unsigned)
    Remu,
    /// rd = mem[rs1 + imm]
    Lw,
    /// mem[rs1 + imm] = rs2
    Sw,
    /// Terminate the program with exit code rs1 (or 0).
    Exit,
}

impl Opcode {
    /// Functional-unit class that executes this opcode.
    pub const fn fu_type(self) -> FuType {
        match self {
            Self::Mul | Self::Mulh | Self::Div | Self::Divu | Self::Rem | Self::Remu => {
                FuType::Mul
            }
            Self::Lw | Self::Sw => FuType::Lsu,
            Self::Exit => FuType::Sfu,
            _ => FuType::Alu,
        }
    }

    /// Returns true for conditional branches.
    pub const fn is_branch(self) -> bool {
        matches!(self, Self::Beq | Self::Bne | Self::Blt | Self::Bge)
    }

    /// Returns true for opcodes that use the divider latency.
    pub const fn is_divide(self) -> bool {
        matches!(self, Self::Div | Self::Divu | Self::Rem | Self::Remu)
    }

    /// Assembly mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::And => "and",
            Self::Or => "or",
            Self::Xor => "xor",
            Self::Sll => "sll",
            Self::Srl => "srl",
            Self::Sra => "sra",
            Self::Slt => "slt",
            Self::Sltu => "sltu",
            Self::Addi => "addi",
            Self::Andi => "andi",
            Self::Ori => "ori",
            Self::Xori => "xori",
            Self::Slli => "slli",
            Self::Srli => "srli",
            Self::Srai => "srai",
            Self::Slti => "slti",
            Self::Li => "li",
            Self::Nop => "nop",
            Self::Beq => "beq",
            Self::Bne => "bne",
            Self::Blt => "blt",
            Self::Bge => "bge",
            Self::Jump => "j",
            Self::Mul => "mul",
            Self::Mulh => "mulh",
            Self::Div => "div",
            Self::Divu => "divu",
            Self::Rem => "rem",
            Self::Remu => "remu",
            Self::Lw => "lw",
            Self::Sw => "sw",
            Self::Exit => "exit",
        }
    }

    /// Looks up an opcode by mnemonic.
    pub fn from_mnemonic(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.mnemonic() == name)
    }

    /// Every opcode, in declaration order.
    pub const ALL: [Self; 34] = [
        Self::Add,
        Self::Sub,
        Self::And,
        Self::Or,
        Self::Xor,
        Self::Sll,
        Self::Srl,
        Self::Sra,
        Self::Slt,
        Self::Sltu,
        Self::Addi,
        Self::Andi,
        Self::Ori,
        Self::Xori,
        Self::Slli,
        Self::Srli,
        Self::Srai,
        Self::Slti,
        Self::Li,
        Self::Nop,
        Self::Beq,
        Self::Bne,
        Self::Blt,
        Self::Bge,
        Self::Jump,
        Self::Mul,
        Self::Mulh,
        Self::Div,
        Self::Divu,
        Self::Rem,
        Self::Remu,
        Self::Lw,
        Self::Sw,
        Self::Exit,
    ];
}

/// Capability flags telling the core which register fields an instruction uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExeFlags {
    /// Reads `rs1`.
    pub use_rs1: bool,
    /// Reads `rs2`.
    pub use_rs2: bool,
    /// Writes `rd`.
    pub use_rd: bool,
    /// Terminates the program when committed.
    pub is_exit: bool,
    /// Conditional branch; its result is the next program counter.
    pub is_branch: bool,
}

/// A decoded instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Instruction {
    /// Program counter (instruction index).
    pub pc: u32,
    /// Operation.
    pub op: Opcode,
    /// Destination register.
    pub rd: usize,
    /// First source register.
    pub rs1: usize,
    /// Second source register.
    pub rs2: usize,
    /// Immediate operand or offset.
    pub imm: i32,
    /// Register usage and control flags.
    pub flags: ExeFlags,
}

impl Instruction {
    fn build(op: Opcode, rd: usize, rs1: usize, rs2: usize, imm: i32, flags: ExeFlags) -> Self {
        Self {
            pc: 0,
            op,
            rd,
            rs1,
            rs2,
            imm,
            flags,
        }
    }

    /// Register-register operation (`add`, `mul`, `slt`, ...).
    pub fn reg(op: Opcode, rd: usize, rs1: usize, rs2: usize) -> Self {
        let flags = ExeFlags {
            use_rs1: true,
            use_rs2: true,
            use_rd: true,
            ..ExeFlags::default()
        };
        Self::build(op, rd, rs1, rs2, 0, flags)
    }

    /// Register-immediate operation (`addi`, `slli`, ...).
    pub fn imm(op: Opcode, rd: usize, rs1: usize, imm: i32) -> Self {
        let flags = ExeFlags {
            use_rs1: true,
            use_rd: true,
            ..ExeFlags::default()
        };
        Self::build(op, rd, rs1, 0, imm, flags)
    }

    /// Load immediate.
    pub fn li(rd: usize, imm: i32) -> Self {
        let flags = ExeFlags {
            use_rd: true,
            ..ExeFlags::default()
        };
        Self::build(Opcode::Li, rd, 0, 0, imm, flags)
    }

    /// Load word from `rs1 + offset`.
    pub fn load(rd: usize, rs1: usize, offset: i32) -> Self {
        let flags = ExeFlags {
            use_rs1: true,
            use_rd: true,
            ..ExeFlags::default()
        };
        Self::build(Opcode::Lw, rd, rs1, 0, offset, flags)
    }

    /// Store `rs2` to `rs1 + offset`.
    pub fn store(rs2: usize, rs1: usize, offset: i32) -> Self {
        let flags = ExeFlags {
            use_rs1: true,
            use_rs2: true,
            ..ExeFlags::default()
        };
        Self::build(Opcode::Sw, 0, rs1, rs2, offset, flags)
    }

    /// Conditional branch by `offset` instructions.
    pub fn branch(op: Opcode, rs1: usize, rs2: usize, offset: i32) -> Self {
        let flags = ExeFlags {
            use_rs1: true,
            use_rs2: true,
            is_branch: true,
            ..ExeFlags::default()
        };
        Self::build(op, 0, rs1, rs2, offset, flags)
    }

    /// Unconditional jump by `offset` instructions.
    pub fn jump(offset: i32) -> Self {
        Self::build(Opcode::Jump, 0, 0, 0, offset, ExeFlags::default())
    }

    /// No operation.
    pub fn nop() -> Self {
        Self::build(Opcode::Nop, 0, 0, 0, 0, ExeFlags::default())
    }

    /// Program exit, optionally taking the exit code from a register.
    pub fn exit(code_reg: Option<usize>) -> Self {
        let flags = ExeFlags {
            use_rs1: code_reg.is_some(),
            is_exit: true,
            ..ExeFlags::default()
        };
        Self::build(Opcode::Exit, 0, code_reg.unwrap_or(0), 0, 0, flags)
    }

    /// Returns a copy placed at program counter `pc`.
    #[must_use]
    pub const fn with_pc(mut self, pc: u32) -> Self {
        self.pc = pc;
        self
    }

    /// Functional-unit class that executes this instruction.
    #[inline]
    pub const fn fu_type(&self) -> FuType {
        self.op.fu_type()
    }

    /// Target of a branch or jump: `pc + imm`.
    #[inline]
    pub const fn target(&self) -> u32 {
        self.pc.wrapping_add_signed(self.imm)
    }

    /// Highest architectural register index this instruction touches, if any.
    pub fn max_register(&self) -> Option<usize> {
        let mut regs = Vec::with_capacity(3);
        if self.flags.use_rs1 {
            regs.push(self.rs1);
        }
        if self.flags.use_rs2 {
            regs.push(self.rs2);
        }
        if self.flags.use_rd {
            regs.push(self.rd);
        }
        regs.into_iter().max()
    }
}

impl fmt::Display for Instruction {
    /// Formats the instruction as assembly accepted by [`crate::isa::asm::assemble`].
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.op.mnemonic();
        match self.op {
            Opcode::Nop => write!(f, "{m}"),
            Opcode::Li => write!(f, "{m} r{}, {}", self.rd, self.imm),
            Opcode::Jump => write!(f, "{m} {}", self.imm),
            Opcode::Lw => write!(f, "{m} r{}, {}(r{})", self.rd, self.imm, self.rs1),
            Opcode::Sw => write!(f, "{m} r{}, {}(r{})", self.rs2, self.imm, self.rs1),
            Opcode::Exit if self.flags.use_rs1 => write!(f, "{m} r{}", self.rs1),
            Opcode::Exit => write!(f, "{m}"),
            op if op.is_branch() => {
                write!(f, "{m} r{}, r{}, {}", self.rs1, self.rs2, self.imm)
            }
            _ if self.flags.use_rs2 => {
                write!(f, "{m} r{}, r{}, r{}", self.rd, self.rs1, self.rs2)
            }
            _ => write!(f, "{m} r{}, r{}, {}", self.rd, self.rs1, self.imm),
        }
    }
}
