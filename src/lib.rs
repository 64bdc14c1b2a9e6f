//! # MIPS Emulator
//!
//! A single-cycle simulator of a classic 32-bit MIPS subset.
//!
//! The core is a fetch-decode-execute engine over an explicit register
//! file and a bounded byte-addressable memory, supporting R-type
//! (add, sub, sll, slt, xor, or, nor, and, jr, mult, div, mflo),
//! I-type (addi, lw, sw, beq, bne) and J-type (j, jal) instructions.

pub mod cpu;
pub mod disasm;
pub mod loader;

// Re-export commonly used types
pub use cpu::{decode, encode, Cpu, CpuError, DecodeError, Instruction, Memory, MemoryError, RegisterFile};
pub use disasm::{disassemble, disassemble_word};
pub use loader::{load_hex, parse_hex, LoaderError};
