//! CPU emulation for the MIPS subset.
//!
//! This module implements a single-cycle fetch-decode-execute machine:
//! - 32 general-purpose registers plus a pseudo `lo` register
//! - 2 MiB byte-addressable memory with segment folding
//! - R/I/J instruction decoding and execution

pub mod decode;
pub mod execute;
pub mod memory;
pub mod registers;

pub use decode::{decode, encode, DecodeError, Funct, IOp, Instruction, JOp};
pub use execute::{Cpu, CpuError};
pub use memory::{Memory, MemoryError, DATA_BASE, MEMORY_SIZE, TEXT_BASE};
pub use registers::{RegisterFile, LO, RA, REG_COUNT, REG_NAMES, SP, ZERO};
