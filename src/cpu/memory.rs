//! Byte-addressable simulator memory.
//!
//! A fixed 2 MiB backing store stands in for the full 32-bit MIPS
//! address space. Addresses are folded onto the store by keeping only
//! their low 21 bits, so the text segment (0x00400000), data segment
//! (0x10000000) and stack all land inside the same 2 MiB window. The
//! folding is a deliberate simplification of this simulator, not a
//! defect; test programs rely on it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Backing store capacity in bytes (2 MiB).
pub const MEMORY_SIZE: usize = 2 * 1024 * 1024;

/// Mask applied to every address: keep the low 21 bits.
pub const ADDR_MASK: u32 = 0x001F_FFFF;

/// Start of the text segment, where programs are loaded.
pub const TEXT_BASE: u32 = 0x0040_0000;

/// Start of the data segment.
pub const DATA_BASE: u32 = 0x1000_0000;

/// Simulator memory: a bounded byte array addressed through
/// [`translate`](Memory::translate).
///
/// Words are stored big-endian, most-significant byte first.
#[derive(Clone, Serialize, Deserialize)]
pub struct Memory {
    data: Vec<u8>,
}

impl Memory {
    /// Create a new memory with all bytes zeroed.
    pub fn new() -> Self {
        Self {
            data: vec![0; MEMORY_SIZE],
        }
    }

    /// Fold a MIPS address onto the backing store.
    ///
    /// Keeps only the low 21 bits, aliasing distant segments onto the
    /// same 2 MiB window (0x00400000 -> 0x00000000, etc.).
    #[inline]
    pub fn translate(address: u32) -> usize {
        (address & ADDR_MASK) as usize
    }

    /// Load a 32-bit word from memory.
    ///
    /// The address is translated first; the 4-byte span must fit within
    /// capacity or the access fails with [`MemoryError::OutOfBounds`].
    pub fn load_word(&self, address: u32) -> Result<u32, MemoryError> {
        let index = Self::translate(address);
        if index + 3 >= self.data.len() {
            return Err(MemoryError::OutOfBounds { address, index });
        }

        let mut value: u32 = 0;
        for i in 0..4 {
            value = (value << 8) | u32::from(self.data[index + i]);
        }
        Ok(value)
    }

    /// Store a 32-bit word to memory, most-significant byte first.
    pub fn store_word(&mut self, address: u32, value: u32) -> Result<(), MemoryError> {
        let index = Self::translate(address);
        if index + 3 >= self.data.len() {
            return Err(MemoryError::OutOfBounds { address, index });
        }

        for i in 0..4 {
            self.data[index + i] = (value >> (24 - i * 8)) as u8;
        }
        Ok(())
    }

    /// Load a program into memory as consecutive words starting at
    /// [`TEXT_BASE`].
    pub fn load_program(&mut self, words: &[u32]) -> Result<(), MemoryError> {
        let mut addr = TEXT_BASE;
        for &word in words {
            self.store_word(addr, word)?;
            addr = addr.wrapping_add(4);
        }
        Ok(())
    }

    /// Dump `count` consecutive words starting at `start` as
    /// `(address, word)` pairs, using the same translation as
    /// [`load_word`](Self::load_word).
    pub fn dump(&self, start: u32, count: usize) -> Result<Vec<(u32, u32)>, MemoryError> {
        let mut words = Vec::with_capacity(count);
        let mut addr = start;
        for _ in 0..count {
            words.push((addr, self.load_word(addr)?));
            addr = addr.wrapping_add(4);
        }
        Ok(words)
    }

    /// Clear all memory to zeros.
    pub fn clear(&mut self) {
        for byte in &mut self.data {
            *byte = 0;
        }
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let non_zero = self.data.iter().filter(|&&b| b != 0).count();

        f.debug_struct("Memory")
            .field("non_zero_bytes", &non_zero)
            .field("capacity", &self.data.len())
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// The translated 4-byte span does not fit within capacity.
    #[error("memory access out of bounds: {address:#010x} -> index {index}")]
    OutOfBounds { address: u32, index: usize },
}
