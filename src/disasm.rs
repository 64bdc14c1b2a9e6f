//! Disassembler for MIPS instruction words.
//!
//! Converts 32-bit words back to readable assembly with `$`-register
//! names. Used by the CLI `disasm` command and trace output.

use crate::cpu::decode::{decode, Funct, IOp, Instruction, JOp};
use crate::cpu::memory::TEXT_BASE;
use crate::cpu::registers::REG_NAMES;

/// Disassemble a single instruction word to text.
pub fn disassemble_word(word: u32) -> String {
    match decode(word) {
        Ok(instr) => format_instruction(&instr),
        Err(_) => format!("??? ; {:#010x}", word),
    }
}

/// Disassemble a program, one line per word, with text-segment
/// addresses.
pub fn disassemble(words: &[u32]) -> String {
    let mut output = String::new();

    for (i, &word) in words.iter().enumerate() {
        let addr = TEXT_BASE + (i as u32) * 4;
        output.push_str(&format!(
            "{:#010x}: {:08x}  {}\n",
            addr,
            word,
            disassemble_word(word)
        ));
    }

    output
}

/// Format a decoded instruction as assembly text.
fn format_instruction(instr: &Instruction) -> String {
    match *instr {
        Instruction::R {
            rs,
            rt,
            rd,
            shamt,
            funct,
        } => {
            let (rs, rt, rd) = (REG_NAMES[rs], REG_NAMES[rt], REG_NAMES[rd]);
            match funct {
                Funct::Add => format!("add {}, {}, {}", rd, rs, rt),
                Funct::Sub => format!("sub {}, {}, {}", rd, rs, rt),
                Funct::And => format!("and {}, {}, {}", rd, rs, rt),
                Funct::Or => format!("or {}, {}, {}", rd, rs, rt),
                Funct::Xor => format!("xor {}, {}, {}", rd, rs, rt),
                Funct::Nor => format!("nor {}, {}, {}", rd, rs, rt),
                Funct::Slt => format!("slt {}, {}, {}", rd, rs, rt),
                Funct::Sll => format!("sll {}, {}, {}", rd, rt, shamt),
                Funct::Jr => format!("jr {}", rs),
                Funct::Mult => format!("mult {}, {}", rs, rt),
                Funct::Div => format!("div {}, {}", rs, rt),
                Funct::Mflo => format!("mflo {}", rd),
            }
        }
        Instruction::I { op, rs, rt, imm } => {
            let (rs, rt) = (REG_NAMES[rs], REG_NAMES[rt]);
            match op {
                IOp::Addi => format!("addi {}, {}, {}", rt, rs, imm),
                IOp::Lw => format!("lw {}, {}({})", rt, imm, rs),
                IOp::Sw => format!("sw {}, {}({})", rt, imm, rs),
                IOp::Beq => format!("beq {}, {}, {}", rs, rt, imm),
                IOp::Bne => format!("bne {}, {}, {}", rs, rt, imm),
            }
        }
        Instruction::J { op, target } => {
            // Show the resolved text-segment address, assuming the
            // usual 0x0xxxxxxx region
            let addr = target << 2;
            match op {
                JOp::J => format!("j {:#010x}", addr),
                JOp::Jal => format!("jal {:#010x}", addr),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disassemble_rtype() {
        assert_eq!(disassemble_word(0x0108_4820), "add $t1, $t0, $t0");
    }

    #[test]
    fn test_disassemble_itype() {
        assert_eq!(disassemble_word(0x2008_0005), "addi $t0, $zero, 5");
        assert_eq!(disassemble_word(0x2108_FFFF), "addi $t0, $t0, -1");
        assert_eq!(disassemble_word(0x8D0A_0000), "lw $t2, 0($t0)");
        assert_eq!(disassemble_word(0xAD09_0004), "sw $t1, 4($t0)");
    }

    #[test]
    fn test_disassemble_jtype() {
        assert_eq!(disassemble_word(0x0810_0002), "j 0x00400008");
        assert_eq!(disassemble_word(0x0C10_0003), "jal 0x0040000c");
    }

    #[test]
    fn test_disassemble_unknown() {
        assert_eq!(disassemble_word(0xFC00_0000), "??? ; 0xfc000000");
    }

    #[test]
    fn test_disassemble_listing() {
        let listing = disassemble(&[0x2008_0005, 0x0108_4820]);
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("0x00400000:"));
        assert!(lines[0].ends_with("addi $t0, $zero, 5"));
        assert!(lines[1].starts_with("0x00400004:"));
    }
}
