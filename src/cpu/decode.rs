//! Instruction decoder.
//!
//! MIPS instructions are 32-bit words in one of three layouts, selected
//! by the opcode in bits 31..26:
//!
//! - R-type: `opcode(6) rs(5) rt(5) rd(5) shamt(5) funct(6)`, opcode 0
//! - J-type: `opcode(6) target(26)`, opcodes 2 and 3
//! - I-type: `opcode(6) rs(5) rt(5) immediate(16)`, everything else
//!
//! These shifts and masks are the binary-compatibility contract with
//! externally assembled programs; do not change them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// R-type function codes (bits 5..0 when opcode is 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Funct {
    /// Shift left logical: `rd = rt << shamt`
    Sll,
    /// Jump register: `pc = rs`
    Jr,
    /// Move from lo: `rd = lo`
    Mflo,
    /// Multiply: `lo = (rs * rt) & 0xFFFFFFFF`
    Mult,
    /// Divide: `lo = rs / rt` (skipped entirely when `rt` is 0)
    Div,
    /// Add: `rd = rs + rt`
    Add,
    /// Subtract: `rd = rs - rt`
    Sub,
    /// Bitwise and: `rd = rs & rt`
    And,
    /// Bitwise or: `rd = rs | rt`
    Or,
    /// Bitwise xor: `rd = rs ^ rt`
    Xor,
    /// Bitwise nor: `rd = !(rs | rt)`
    Nor,
    /// Set on less than: `rd = (rs < rt) as u32`
    Slt,
}

impl Funct {
    /// Decode a 6-bit function code.
    pub fn from_code(code: u32) -> Result<Self, DecodeError> {
        match code {
            0x00 => Ok(Funct::Sll),
            0x08 => Ok(Funct::Jr),
            0x12 => Ok(Funct::Mflo),
            0x18 => Ok(Funct::Mult),
            0x1A => Ok(Funct::Div),
            0x20 => Ok(Funct::Add),
            0x22 => Ok(Funct::Sub),
            0x24 => Ok(Funct::And),
            0x25 => Ok(Funct::Or),
            0x26 => Ok(Funct::Xor),
            0x27 => Ok(Funct::Nor),
            0x2A => Ok(Funct::Slt),
            _ => Err(DecodeError::InvalidFunct(code as u8)),
        }
    }

    /// The 6-bit function code.
    pub fn code(self) -> u32 {
        match self {
            Funct::Sll => 0x00,
            Funct::Jr => 0x08,
            Funct::Mflo => 0x12,
            Funct::Mult => 0x18,
            Funct::Div => 0x1A,
            Funct::Add => 0x20,
            Funct::Sub => 0x22,
            Funct::And => 0x24,
            Funct::Or => 0x25,
            Funct::Xor => 0x26,
            Funct::Nor => 0x27,
            Funct::Slt => 0x2A,
        }
    }
}

/// I-type opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IOp {
    /// Add immediate: `rt = rs + imm`
    Addi,
    /// Branch on equal: `if rs == rt { pc += imm * 4 }`
    Beq,
    /// Branch on not equal: `if rs != rt { pc += imm * 4 }`
    Bne,
    /// Load word: `rt = mem[rs + imm]`
    Lw,
    /// Store word: `mem[rs + imm] = rt`
    Sw,
}

impl IOp {
    /// Decode a 6-bit I-type opcode.
    pub fn from_code(code: u32) -> Result<Self, DecodeError> {
        match code {
            0x04 => Ok(IOp::Beq),
            0x05 => Ok(IOp::Bne),
            0x08 => Ok(IOp::Addi),
            0x23 => Ok(IOp::Lw),
            0x2B => Ok(IOp::Sw),
            _ => Err(DecodeError::InvalidOpcode(code as u8)),
        }
    }

    /// The 6-bit opcode.
    pub fn code(self) -> u32 {
        match self {
            IOp::Beq => 0x04,
            IOp::Bne => 0x05,
            IOp::Addi => 0x08,
            IOp::Lw => 0x23,
            IOp::Sw => 0x2B,
        }
    }
}

/// J-type opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JOp {
    /// Jump: `pc = (pc & 0xF0000000) | (target << 2)`
    J,
    /// Jump and link: `$ra = pc`, then jump
    Jal,
}

impl JOp {
    /// The 6-bit opcode.
    pub fn code(self) -> u32 {
        match self {
            JOp::J => 0x02,
            JOp::Jal => 0x03,
        }
    }
}

/// A decoded MIPS instruction, one of the three binary layouts.
///
/// Register fields are raw 5-bit indices; the immediate is already
/// sign-extended. Produced by [`decode`] and consumed within a single
/// fetch-decode-execute cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    /// Register-register operation, selected by function code.
    R {
        rs: usize,
        rt: usize,
        rd: usize,
        shamt: u32,
        funct: Funct,
    },
    /// Immediate operation, load/store, or branch.
    I {
        op: IOp,
        rs: usize,
        rt: usize,
        imm: i32,
    },
    /// Jump within the current 256 MiB region.
    J { op: JOp, target: u32 },
}

/// Decode a 32-bit instruction word.
pub fn decode(word: u32) -> Result<Instruction, DecodeError> {
    let opcode = (word >> 26) & 0x3F;

    match opcode {
        0 => Ok(Instruction::R {
            rs: ((word >> 21) & 0x1F) as usize,
            rt: ((word >> 16) & 0x1F) as usize,
            rd: ((word >> 11) & 0x1F) as usize,
            shamt: (word >> 6) & 0x1F,
            funct: Funct::from_code(word & 0x3F)?,
        }),
        2 => Ok(Instruction::J {
            op: JOp::J,
            target: word & 0x03FF_FFFF,
        }),
        3 => Ok(Instruction::J {
            op: JOp::Jal,
            target: word & 0x03FF_FFFF,
        }),
        _ => {
            let imm = word & 0xFFFF;
            // Sign-extend the 16-bit immediate
            let imm = if imm & 0x8000 != 0 {
                imm as i32 - 0x10000
            } else {
                imm as i32
            };
            Ok(Instruction::I {
                op: IOp::from_code(opcode)?,
                rs: ((word >> 21) & 0x1F) as usize,
                rt: ((word >> 16) & 0x1F) as usize,
                imm,
            })
        }
    }
}

/// Encode an instruction back to its 32-bit word.
pub fn encode(instr: &Instruction) -> u32 {
    match *instr {
        Instruction::R {
            rs,
            rt,
            rd,
            shamt,
            funct,
        } => {
            ((rs as u32) << 21)
                | ((rt as u32) << 16)
                | ((rd as u32) << 11)
                | (shamt << 6)
                | funct.code()
        }
        Instruction::I { op, rs, rt, imm } => {
            (op.code() << 26)
                | ((rs as u32) << 21)
                | ((rt as u32) << 16)
                | (imm as u32 & 0xFFFF)
        }
        Instruction::J { op, target } => (op.code() << 26) | (target & 0x03FF_FFFF),
    }
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid opcode: {0:#04x}")]
    InvalidOpcode(u8),

    #[error("invalid R-type function code: {0:#04x}")]
    InvalidFunct(u8),
}
