use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use risc_v_sim::simulator::{SimConfig, SimState, Simulator, DEFAULT_MAX_STEPS};
use risc_v_sim::{asm, program};

#[derive(Debug, Parser)]
#[clap(name = "risc-v-sim", version)]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Executes a binary program file
    Run {
        /// Stop after this many instructions
        #[clap(long, default_value_t = DEFAULT_MAX_STEPS)]
        max_steps: usize,

        /// Prints each executed instruction with its control signals
        #[clap(short, long)]
        trace: bool,

        /// Prints data memory after the run
        #[clap(short, long)]
        memory: bool,

        program: PathBuf,
    },

    /// Prints the disassembly of a binary program file
    Disasm { program: PathBuf },

    /// Assembles a text source into binary program lines
    Asm {
        source: PathBuf,

        #[clap(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run(path: &Path, config: SimConfig, trace: bool, show_memory: bool) -> anyhow::Result<()> {
    let instructions = program::from_file(path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    let mut sim = Simulator::new(instructions);

    let summary = sim.run(&config, |report, pending| {
        if trace {
            println!("Pending instructions:");
            for instruction in pending {
                println!("\t{}", instruction);
            }
            println!("PC = {}", report.pc);
            println!("Executed: {}\n", report.instruction);
            println!("{}", report.signals);
        }
    });
    let summary = summary.with_context(|| format!("execution failed at pc {}", sim.machine.pc))?;

    println!("[REGISTERS]");
    print!("{}", sim.machine.registers);
    if show_memory {
        println!("\n[MEMORY]");
        print!("{}", sim.machine.memory);
    }
    match summary.state {
        SimState::Halted => println!("\nHalted after {} instructions.", summary.steps),
        SimState::Running => println!("\nStopped after {} instructions, pc = {}.", summary.steps, sim.machine.pc),
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Run { max_steps, trace, memory, program } => {
            run(&program, SimConfig { max_steps }, trace, memory)
        }
        Command::Disasm { program } => {
            let instructions = program::from_file(&program)
                .with_context(|| format!("failed to load {}", program.display()))?;
            for (index, instruction) in instructions.iter().enumerate() {
                println!("{:4}: {}", index * 4, instruction);
            }
            Ok(())
        }
        Command::Asm { source, output } => {
            let text = fs::read_to_string(&source)
                .with_context(|| format!("failed to read {}", source.display()))?;
            let machine_code = asm::assemble(&text)?;
            let lines = asm::to_binary_lines(&machine_code);
            match output {
                Some(path) => fs::write(&path, lines)
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => print!("{}", lines),
            }
            Ok(())
        }
    }
}
