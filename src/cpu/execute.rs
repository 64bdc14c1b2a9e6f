//! CPU execution engine.
//!
//! Implements the single-cycle fetch-decode-execute loop over the
//! register file and memory. The program counter is advanced by 4
//! during fetch, so branch and jump targets are computed relative to
//! the instruction *after* the one being executed.

use crate::cpu::decode::{self, DecodeError, Funct, IOp, Instruction, JOp};
use crate::cpu::memory::{Memory, MemoryError, TEXT_BASE};
use crate::cpu::registers::{RegisterFile, LO, RA, SP};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Initial value of the stack pointer at power-on.
pub const STACK_INIT: u32 = 0x0010_0000;

/// The simulated CPU.
///
/// Owns its register file and memory outright; display code reads
/// state through the public fields after a run rather than sharing
/// them mutably.
#[derive(Clone, Serialize, Deserialize)]
pub struct Cpu {
    /// The register file (32 general registers + `lo`).
    pub regs: RegisterFile,
    /// Main memory.
    pub mem: Memory,
    /// Program counter.
    pc: u32,
    /// Instruction count (for profiling).
    pub cycles: u64,
    /// Last executed instruction (for debugging).
    last_instr: Option<Instruction>,
}

impl Cpu {
    /// Create a new CPU at power-on state: `pc` at the start of the
    /// text segment, `$sp` at the top of the stack, `lo` zeroed.
    pub fn new() -> Self {
        let mut regs = RegisterFile::new();
        regs.write(SP, STACK_INIT);
        regs.write(LO, 0);

        Self {
            regs,
            mem: Memory::new(),
            pc: TEXT_BASE,
            cycles: 0,
            last_instr: None,
        }
    }

    /// Reset the CPU and memory to power-on state.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.regs.write(SP, STACK_INIT);
        self.mem.clear();
        self.pc = TEXT_BASE;
        self.cycles = 0;
        self.last_instr = None;
    }

    /// Load a program into the text segment.
    pub fn load_program(&mut self, words: &[u32]) -> Result<(), MemoryError> {
        self.mem.load_program(words)
    }

    /// Current program counter.
    pub fn pc(&self) -> u32 {
        self.pc
    }

    /// Fetch the word at the program counter and advance past it.
    fn fetch(&mut self) -> Result<u32, MemoryError> {
        let word = self.mem.load_word(self.pc)?;
        self.pc = self.pc.wrapping_add(4);
        Ok(word)
    }

    /// Execute a single fetch-decode-execute cycle.
    ///
    /// Returns the instruction that was executed. On error the cycle
    /// is abandoned; registers and memory keep the state of the last
    /// completed cycle.
    pub fn step(&mut self) -> Result<Instruction, CpuError> {
        let word = self.fetch()?;
        let instr = decode::decode(word)?;
        self.execute(instr)?;

        self.cycles += 1;
        self.last_instr = Some(instr);

        Ok(instr)
    }

    /// Run `cycles` sequential fetch-decode-execute cycles.
    ///
    /// A mid-run error aborts the remaining cycles; state as of the
    /// last completed cycle stays inspectable.
    pub fn run(&mut self, cycles: u64) -> Result<(), CpuError> {
        for _ in 0..cycles {
            self.step()?;
        }
        Ok(())
    }

    /// Execute a decoded instruction.
    fn execute(&mut self, instr: Instruction) -> Result<(), CpuError> {
        match instr {
            Instruction::R {
                rs,
                rt,
                rd,
                shamt,
                funct,
            } => {
                let v1 = self.regs.read(rs);
                let v2 = self.regs.read(rt);

                match funct {
                    Funct::Add => self.regs.write(rd, v1.wrapping_add(v2)),
                    Funct::Sub => self.regs.write(rd, v1.wrapping_sub(v2)),
                    Funct::Sll => self.regs.write(rd, v2 << shamt),
                    // Comparison is on the raw stored (unsigned) values
                    Funct::Slt => self.regs.write(rd, u32::from(v1 < v2)),
                    Funct::Xor => self.regs.write(rd, v1 ^ v2),
                    Funct::Or => self.regs.write(rd, v1 | v2),
                    Funct::Nor => self.regs.write(rd, !(v1 | v2)),
                    Funct::And => self.regs.write(rd, v1 & v2),
                    Funct::Jr => self.pc = v1,
                    // Only the low 32 bits of the product; there is no
                    // hi register in this simulator
                    Funct::Mult => self.regs.write(LO, v1.wrapping_mul(v2)),
                    // Division by zero is skipped outright: lo keeps
                    // its prior value
                    Funct::Div => {
                        if v2 != 0 {
                            self.regs.write(LO, v1 / v2);
                        }
                    }
                    Funct::Mflo => {
                        let lo = self.regs.read(LO);
                        self.regs.write(rd, lo);
                    }
                }
            }

            Instruction::I { op, rs, rt, imm } => {
                let rs_val = self.regs.read(rs);

                match op {
                    IOp::Addi => self.regs.write(rt, rs_val.wrapping_add(imm as u32)),
                    IOp::Lw => {
                        let addr = rs_val.wrapping_add(imm as u32);
                        let value = self.mem.load_word(addr)?;
                        self.regs.write(rt, value);
                    }
                    IOp::Sw => {
                        let addr = rs_val.wrapping_add(imm as u32);
                        let rt_val = self.regs.read(rt);
                        self.mem.store_word(addr, rt_val)?;
                    }
                    // Branch offsets are in words, relative to the
                    // instruction after the branch (pc already advanced)
                    IOp::Beq => {
                        if rs_val == self.regs.read(rt) {
                            self.pc = self.pc.wrapping_add((imm as u32).wrapping_mul(4));
                        }
                    }
                    IOp::Bne => {
                        if rs_val != self.regs.read(rt) {
                            self.pc = self.pc.wrapping_add((imm as u32).wrapping_mul(4));
                        }
                    }
                }
            }

            Instruction::J { op, target } => {
                // Jump target: PC[31:28] || target << 2, with pc
                // already past the jump instruction
                let target = (self.pc & 0xF000_0000) | (target << 2);

                match op {
                    JOp::J => self.pc = target,
                    JOp::Jal => {
                        // Link register gets the instruction after the jal
                        self.regs.write(RA, self.pc);
                        self.pc = target;
                    }
                }
            }
        }

        Ok(())
    }

    /// Get the last executed instruction.
    pub fn last_instruction(&self) -> Option<Instruction> {
        self.last_instr
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("pc", &format_args!("{:#010x}", self.pc))
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .finish()
    }
}

/// Errors that can occur during CPU execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::memory::DATA_BASE;

    #[test]
    fn test_power_on_state() {
        let cpu = Cpu::new();
        assert_eq!(cpu.pc(), TEXT_BASE);
        assert_eq!(cpu.regs.read(SP), STACK_INIT);
        assert_eq!(cpu.regs.read(LO), 0);
    }

    #[test]
    fn test_addi_then_add() {
        let mut cpu = Cpu::new();
        cpu.load_program(&[
            0x2008_0005, // addi $t0, $zero, 5
            0x0108_4820, // add $t1, $t0, $t0
        ])
        .unwrap();

        cpu.run(2).unwrap();

        assert_eq!(cpu.regs.read(8), 5);
        assert_eq!(cpu.regs.read(9), 10);
        assert_eq!(cpu.pc(), TEXT_BASE + 8);
    }

    #[test]
    fn test_add_wraps() {
        let mut cpu = Cpu::new();
        cpu.regs.write(8, 0xFFFF_FFFF);
        cpu.regs.write(9, 2);
        cpu.load_program(&[0x0109_5020]) // add $t2, $t0, $t1
            .unwrap();

        cpu.run(1).unwrap();

        assert_eq!(cpu.regs.read(10), 1);
    }

    #[test]
    fn test_store_then_load() {
        let mut cpu = Cpu::new();
        cpu.load_program(&[
            0x2008_1000, // addi $t0, $zero, 0x1000
            0x2009_0042, // addi $t1, $zero, 0x42
            0xAD09_0000, // sw $t1, 0($t0)
            0x200A_0000, // addi $t2, $zero, 0
            0x8D0A_0000, // lw $t2, 0($t0)
        ])
        .unwrap();

        cpu.run(5).unwrap();

        assert_eq!(cpu.mem.load_word(0x1000).unwrap(), 0x42);
        assert_eq!(cpu.regs.read(10), 0x42);
    }

    #[test]
    fn test_beq_taken_skips_two() {
        let mut cpu = Cpu::new();
        cpu.load_program(&[
            0x2008_0005, // addi $t0, $zero, 5
            0x2009_0005, // addi $t1, $zero, 5
            0x1109_0002, // beq $t0, $t1, 2
            0x200A_000A, // addi $t2, $zero, 10 (skipped)
            0x200B_0014, // addi $t3, $zero, 20 (skipped)
            0x200C_001E, // addi $t4, $zero, 30
        ])
        .unwrap();

        cpu.run(4).unwrap();

        assert_eq!(cpu.regs.read(10), 0);
        assert_eq!(cpu.regs.read(11), 0);
        assert_eq!(cpu.regs.read(12), 30);
    }

    #[test]
    fn test_branch_not_taken_falls_through() {
        let mut cpu = Cpu::new();
        cpu.load_program(&[
            0x2008_0005, // addi $t0, $zero, 5
            0x1100_0004, // beq $t0, $zero, 4 (not taken: 5 != 0)
        ])
        .unwrap();

        cpu.run(2).unwrap();

        assert_eq!(cpu.pc(), TEXT_BASE + 8);
    }

    #[test]
    fn test_bne_taken() {
        let mut cpu = Cpu::new();
        cpu.load_program(&[
            0x2008_0005, // addi $t0, $zero, 5
            0x1500_0002, // bne $t0, $zero, 2
        ])
        .unwrap();

        cpu.run(2).unwrap();

        assert_eq!(cpu.pc(), TEXT_BASE + 8 + 8);
    }

    #[test]
    fn test_jal_and_jr_return() {
        let mut cpu = Cpu::new();
        cpu.load_program(&[
            0x2002_0000, // addi $v0, $zero, 0
            0x0C10_0003, // jal 0x0040000C
            0x0810_0005, // j 0x00400014
            0x2002_002A, // addi $v0, $zero, 42 (the function)
            0x03E0_0008, // jr $ra
        ])
        .unwrap();

        cpu.run(5).unwrap();

        // jr returned to the instruction right after the jal
        assert_eq!(cpu.regs.read(RA), TEXT_BASE + 8);
        assert_eq!(cpu.regs.read(2), 42);
        assert_eq!(cpu.pc(), TEXT_BASE + 0x14);
    }

    #[test]
    fn test_bitwise_ops() {
        let mut cpu = Cpu::new();
        cpu.load_program(&[
            0x2008_00FF, // addi $t0, $zero, 0xFF
            0x2009_0F0F, // addi $t1, $zero, 0xF0F
            0x0109_5024, // and $t2, $t0, $t1
            0x0109_5825, // or $t3, $t0, $t1
            0x0109_6026, // xor $t4, $t0, $t1
            0x0109_6827, // nor $t5, $t0, $t1
        ])
        .unwrap();

        cpu.run(6).unwrap();

        assert_eq!(cpu.regs.read(10), 0x0F);
        assert_eq!(cpu.regs.read(11), 0xFFF);
        assert_eq!(cpu.regs.read(12), 0xFF0);
        assert_eq!(cpu.regs.read(13), 0xFFFF_F000);
    }

    #[test]
    fn test_sll() {
        let mut cpu = Cpu::new();
        cpu.regs.write(8, 3);
        // sll $t1, $t0, 4
        let word = decode::encode(&Instruction::R {
            rs: 0,
            rt: 8,
            rd: 9,
            shamt: 4,
            funct: Funct::Sll,
        });
        cpu.load_program(&[word]).unwrap();

        cpu.run(1).unwrap();

        assert_eq!(cpu.regs.read(9), 48);
    }

    #[test]
    fn test_slt_on_raw_values() {
        let mut cpu = Cpu::new();
        cpu.regs.write(8, 0xFFFF_FFFF); // stored unsigned: largest value
        cpu.regs.write(9, 1);
        let slt = |rs, rt, rd| {
            decode::encode(&Instruction::R {
                rs,
                rt,
                rd,
                shamt: 0,
                funct: Funct::Slt,
            })
        };
        cpu.load_program(&[slt(8, 9, 10), slt(9, 8, 11)]).unwrap();

        cpu.run(2).unwrap();

        assert_eq!(cpu.regs.read(10), 0);
        assert_eq!(cpu.regs.read(11), 1);
    }

    #[test]
    fn test_div_by_zero_leaves_lo_unchanged() {
        let mut cpu = Cpu::new();
        cpu.regs.write(LO, 77);
        cpu.regs.write(8, 10);
        // div $t0, $zero
        let word = decode::encode(&Instruction::R {
            rs: 8,
            rt: 0,
            rd: 0,
            shamt: 0,
            funct: Funct::Div,
        });
        cpu.load_program(&[word]).unwrap();

        cpu.run(1).unwrap();

        assert_eq!(cpu.regs.read(LO), 77);
    }

    #[test]
    fn test_div_quotient() {
        let mut cpu = Cpu::new();
        cpu.regs.write(8, 17);
        cpu.regs.write(9, 5);
        let word = decode::encode(&Instruction::R {
            rs: 8,
            rt: 9,
            rd: 0,
            shamt: 0,
            funct: Funct::Div,
        });
        cpu.load_program(&[word]).unwrap();

        cpu.run(1).unwrap();

        assert_eq!(cpu.regs.read(LO), 3);
    }

    #[test]
    fn test_mult_keeps_low_word_only() {
        let mut cpu = Cpu::new();
        cpu.regs.write(8, 0x0001_0000);
        cpu.regs.write(9, 0x0001_0000);
        let word = decode::encode(&Instruction::R {
            rs: 8,
            rt: 9,
            rd: 0,
            shamt: 0,
            funct: Funct::Mult,
        });
        cpu.load_program(&[word]).unwrap();

        cpu.run(1).unwrap();

        // 2^16 * 2^16 = 2^32: low word is 0, high bits are discarded
        assert_eq!(cpu.regs.read(LO), 0);
    }

    #[test]
    fn test_factorial_program() {
        let mut cpu = Cpu::new();
        cpu.load_program(&[
            0x2008_0005, // addi $t0, $zero, 5 (n = 5)
            0x2009_0001, // addi $t1, $zero, 1 (result = 1)
            0x1100_0004, // beq $t0, $zero, 4 (exit loop when n == 0)
            0x0128_0018, // mult $t1, $t0
            0x0000_4812, // mflo $t1
            0x2108_FFFF, // addi $t0, $t0, -1
            0x0810_0002, // j 0x00400008 (loop check)
        ])
        .unwrap();

        cpu.run(20).unwrap();

        assert_eq!(cpu.regs.read(9), 120);
    }

    #[test]
    fn test_lw_out_of_bounds_halts_run() {
        let mut cpu = Cpu::new();
        // lw $t0, -4($zero): address 0xFFFFFFFC folds to index
        // 0x1FFFFC... still in bounds; use the last 3 bytes instead.
        cpu.regs.write(8, crate::cpu::memory::MEMORY_SIZE as u32 - 3);
        // lw $t1, 0($t0)
        let word = decode::encode(&Instruction::I {
            op: IOp::Lw,
            rs: 8,
            rt: 9,
            imm: 0,
        });
        cpu.load_program(&[word]).unwrap();

        let err = cpu.run(5).unwrap_err();
        assert!(matches!(err, CpuError::Memory(MemoryError::OutOfBounds { .. })));

        // State as of the last completed cycle: the failed lw never
        // wrote its target, but fetch had already advanced the pc.
        assert_eq!(cpu.regs.read(9), 0);
        assert_eq!(cpu.cycles, 0);
    }

    #[test]
    fn test_data_segment_store() {
        let mut cpu = Cpu::new();
        cpu.regs.write(8, DATA_BASE);
        cpu.regs.write(9, 0x42);
        let word = decode::encode(&Instruction::I {
            op: IOp::Sw,
            rs: 8,
            rt: 9,
            imm: 0x10,
        });
        cpu.load_program(&[word]).unwrap();

        cpu.run(1).unwrap();

        assert_eq!(cpu.mem.load_word(DATA_BASE + 0x10).unwrap(), 0x42);
    }
}
