//! MIPS Emulator - CLI Entry Point
//!
//! Commands:
//! - `mips-emu run <program>` - Load a hex-word program and run it
//! - `mips-emu disasm <program>` - Disassemble a hex-word program

use clap::{Parser, Subcommand};
use mips::cpu::{memory::TEXT_BASE, Cpu};
use mips::disasm::{disassemble, disassemble_word};
use mips::loader::load_hex;

#[derive(Parser)]
#[command(name = "mips-emu")]
#[command(version = "0.1.0")]
#[command(about = "A single-cycle simulator of the classic 32-bit MIPS architecture")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a hex-word program for a number of cycles
    Run {
        /// Path to the program file (hex words, # or ; comments)
        program: String,
        /// Number of fetch-decode-execute cycles to run
        #[arg(short, long, default_value = "1000")]
        cycles: u64,
        /// Show a per-cycle trace
        #[arg(short, long)]
        trace: bool,
        /// Dump registers as JSON instead of a table
        #[arg(short, long)]
        json: bool,
    },
    /// Disassemble a hex-word program
    Disasm {
        /// Path to the program file
        program: String,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            program,
            cycles,
            trace,
            json,
        } => run_program(&program, cycles, trace, json),
        Commands::Disasm { program } => disassemble_file(&program),
    }
}

fn run_program(path: &str, cycles: u64, trace: bool, json: bool) {
    let words = match load_hex(path) {
        Ok(words) => words,
        Err(e) => {
            eprintln!("failed to load {}: {}", path, e);
            std::process::exit(1);
        }
    };

    if words.is_empty() {
        eprintln!("no instructions in {}", path);
        std::process::exit(1);
    }

    let mut cpu = Cpu::new();
    if let Err(e) = cpu.load_program(&words) {
        eprintln!("failed to load program: {}", e);
        std::process::exit(1);
    }

    println!("loaded {} instructions at {:#010x}", words.len(), TEXT_BASE);

    let mut executed = 0u64;
    for _ in 0..cycles {
        let pc = cpu.pc();
        match cpu.step() {
            Ok(instr) => {
                if trace {
                    let word = mips::cpu::encode(&instr);
                    println!("{:#010x}: {}", pc, disassemble_word(word));
                }
                executed += 1;
            }
            Err(e) => {
                eprintln!("CPU error at pc={:#010x}: {}", pc, e);
                break;
            }
        }
    }

    println!();
    println!("executed {} cycles, pc = {:#010x}", executed, cpu.pc());
    println!();

    if json {
        print_registers_json(&cpu);
    } else {
        print_registers(&cpu);
    }
}

fn print_registers(cpu: &Cpu) {
    println!("==== Register State ====");
    for (index, name, value) in cpu.regs.dump() {
        if index < 32 {
            println!("{:<5} (${:02}): {:#010x}", name, index, value);
        } else {
            println!("{:<5}      : {:#010x}", name, value);
        }
    }
    println!("========================");
}

fn print_registers_json(cpu: &Cpu) {
    let dump: serde_json::Map<String, serde_json::Value> = cpu
        .regs
        .dump()
        .into_iter()
        .map(|(_, name, value)| (name.to_string(), serde_json::Value::from(value)))
        .collect();

    match serde_json::to_string_pretty(&dump) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("failed to serialize registers: {}", e),
    }
}

fn disassemble_file(path: &str) {
    let words = match load_hex(path) {
        Ok(words) => words,
        Err(e) => {
            eprintln!("failed to load {}: {}", path, e);
            std::process::exit(1);
        }
    };

    print!("{}", disassemble(&words));
}
