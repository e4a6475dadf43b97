//! Tomasulo core simulator CLI.
//!
//! This binary provides a single entry point for running and inspecting programs. It performs:
//! 1. **Run:** Assemble a program, simulate it to completion, and exit with its exit code.
//! 2. **Disassemble:** Print the assembled program, one instruction per line with its pc.

use std::path::{Path, PathBuf};
use std::{fs, process};

use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use tomasim_core::common::SimError;
use tomasim_core::config::{Config, RstPolicy};
use tomasim_core::isa::{Program, assemble};
use tomasim_core::stats::STATS_SECTIONS;
use tomasim_core::Simulator;

#[derive(Parser, Debug)]
#[command(
    name = "sim",
    author,
    version,
    about = "Cycle-level Tomasulo out-of-order core simulator",
    long_about = "Assemble and run a program on a Tomasulo scheduling core.\n\nConfiguration is JSON (see `Config`); every field is optional.\n\nExamples:\n  sim run programs/sum.s --stats\n  sim run programs/sum.s --config programs/small.json --trace\n  sim disasm programs/sum.s"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a program until it exits.
    Run {
        /// Assembly source file.
        program: PathBuf,

        /// JSON configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Log every stage event and dump RS/ROB tables each cycle.
        #[arg(long)]
        trace: bool,

        /// Override `general.max_cycles`.
        #[arg(long)]
        max_cycles: Option<u64>,

        /// Override `core.rst_policy`.
        #[arg(long, value_enum)]
        rst_policy: Option<PolicyArg>,

        /// Print statistics; optionally only the named sections.
        #[arg(long, num_args = 0.., value_parser = clap::builder::PossibleValuesParser::new(STATS_SECTIONS.iter().copied()))]
        stats: Option<Vec<String>>,

        /// Print exit status and statistics as JSON.
        #[arg(long)]
        json: bool,

        /// Print the register file after the run.
        #[arg(long)]
        regs: bool,
    },

    /// Print the assembled program.
    Disasm {
        /// Assembly source file.
        program: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PolicyArg {
    WritesRd,
    Always,
}

impl From<PolicyArg> for RstPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::WritesRd => Self::WritesRd,
            PolicyArg::Always => Self::Always,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            program,
            config,
            trace,
            max_cycles,
            rst_policy,
            stats,
            json,
            regs,
        } => cmd_run(&RunArgs {
            program,
            config,
            trace,
            max_cycles,
            rst_policy,
            stats,
            json,
            regs,
        }),
        Commands::Disasm { program } => cmd_disasm(&program).map(|()| 0),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

struct RunArgs {
    program: PathBuf,
    config: Option<PathBuf>,
    trace: bool,
    max_cycles: Option<u64>,
    rst_policy: Option<PolicyArg>,
    stats: Option<Vec<String>>,
    json: bool,
    regs: bool,
}

/// Runs a program and returns the process exit code.
fn cmd_run(args: &RunArgs) -> Result<i32, SimError> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(limit) = args.max_cycles {
        config.general.max_cycles = limit;
    }
    if let Some(policy) = args.rst_policy {
        config.core.rst_policy = policy.into();
    }
    config.general.trace |= args.trace;
    init_tracing(config.general.trace);

    debug!(program = %args.program.display(), ?config, "loading program");
    let program = load_program(&args.program)?;
    let mut sim = Simulator::new(&config, &program)?;
    let outcome = sim.run();

    if args.regs {
        println!("{}", sim.cpu.regs);
    }
    if args.json {
        let report = serde_json::json!({
            "status": sim.exit_status(),
            "error": outcome.as_ref().err().map(ToString::to_string),
            "stats": sim.cpu.stats,
        });
        println!("{report:#}");
    } else if let Some(sections) = &args.stats {
        if sections.is_empty() {
            sim.cpu.stats.print();
        } else {
            sim.cpu.stats.print_sections(sections);
        }
    }

    let status = outcome?;
    Ok(status.code as i32)
}

fn cmd_disasm(path: &Path) -> Result<(), SimError> {
    let program = load_program(path)?;
    for inst in &program.instructions {
        println!("{:>5}:  {inst}", inst.pc);
    }
    for (addr, value) in &program.data {
        println!(".word {addr:#x} {value:#x}");
    }
    Ok(())
}

fn load_program(path: &Path) -> Result<Program, SimError> {
    let text = fs::read_to_string(path).map_err(|source| SimError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    assemble(&text)
}

/// Installs the stderr log subscriber. `RUST_LOG` wins unless tracing was requested.
fn init_tracing(trace: bool) {
    let filter = if trace {
        EnvFilter::new("trace")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
