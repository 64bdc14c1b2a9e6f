//! The MIPS register file.
//!
//! 32 general-purpose 32-bit registers plus a pseudo `lo` register at
//! index 32 holding multiply/divide results. Register 0 is hardwired
//! to zero: writes to it are silently discarded.

use serde::{Deserialize, Serialize};

/// Number of register slots: 32 general registers + the `lo` register.
pub const REG_COUNT: usize = 33;

/// Index of the hardwired-zero register (`$zero`).
pub const ZERO: usize = 0;
/// Index of the stack pointer (`$sp`).
pub const SP: usize = 29;
/// Index of the return-address / link register (`$ra`).
pub const RA: usize = 31;
/// Index of the pseudo `lo` register.
pub const LO: usize = 32;

/// Canonical names for all 33 slots, indexed by register number.
pub const REG_NAMES: [&str; REG_COUNT] = [
    "$zero", "$at", "$v0", "$v1", "$a0", "$a1", "$a2", "$a3",
    "$t0", "$t1", "$t2", "$t3", "$t4", "$t5", "$t6", "$t7",
    "$s0", "$s1", "$s2", "$s3", "$s4", "$s5", "$s6", "$s7",
    "$t8", "$t9", "$k0", "$k1", "$gp", "$sp", "$fp", "$ra",
    "lo",
];

/// The MIPS register file.
///
/// All values are stored as unsigned 32-bit words; signed instructions
/// reinterpret the raw bits as needed.
#[derive(Clone, Serialize, Deserialize)]
pub struct RegisterFile {
    regs: Vec<u32>,
}

impl RegisterFile {
    /// Create a new register file with all slots zeroed.
    pub fn new() -> Self {
        Self {
            regs: vec![0; REG_COUNT],
        }
    }

    /// Read the value of a register.
    ///
    /// Index 0 always yields 0.
    ///
    /// # Panics
    /// Panics if `index` is outside 0..=32. An out-of-range index is a
    /// bug in the caller, never a property of a guest program, so it
    /// fails fast rather than corrupting the simulation.
    #[inline]
    pub fn read(&self, index: usize) -> u32 {
        assert!(index < REG_COUNT, "register index {} out of range (0-{})", index, REG_COUNT - 1);
        self.regs[index]
    }

    /// Write a value to a register.
    ///
    /// Writes to index 0 are discarded (`$zero` is read-only).
    ///
    /// # Panics
    /// Panics if `index` is outside 0..=32, as with [`read`](Self::read).
    #[inline]
    pub fn write(&mut self, index: usize, value: u32) {
        assert!(index < REG_COUNT, "register index {} out of range (0-{})", index, REG_COUNT - 1);
        if index == ZERO {
            return;
        }
        self.regs[index] = value;
    }

    /// Reset every register to zero.
    pub fn reset(&mut self) {
        for reg in &mut self.regs {
            *reg = 0;
        }
    }

    /// The canonical name of a register slot.
    pub fn name(index: usize) -> &'static str {
        REG_NAMES[index]
    }

    /// Snapshot all 33 slots as `(index, name, value)` rows for display.
    pub fn dump(&self) -> Vec<(usize, &'static str, u32)> {
        self.regs
            .iter()
            .enumerate()
            .map(|(i, &v)| (i, REG_NAMES[i], v))
            .collect()
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RegisterFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Only show non-zero registers
        let non_zero: Vec<String> = self
            .regs
            .iter()
            .enumerate()
            .filter(|(_, &v)| v != 0)
            .map(|(i, &v)| format!("{}={:#010x}", REG_NAMES[i], v))
            .collect();

        f.debug_struct("RegisterFile")
            .field("non_zero", &non_zero)
            .finish()
    }
}
