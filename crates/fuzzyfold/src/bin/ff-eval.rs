use std::io::Write;

use anyhow::Result;
use clap::{ArgAction, Args, Parser};
use colored::*;
use env_logger::Builder;
use log::info;

use ff_energy::minimum_free_energy;

use fuzzyfold::energy_parsers::EnergyModelArguments;
use fuzzyfold::input_parsers::{read_eval_input, ruler};

#[derive(Debug, Args)]
pub struct EvalInput {
    /// Input file (FASTA-like: optional header, sequence, dot-bracket), or "-" for stdin
    #[arg(value_name = "INPUT", default_value = "-")]
    pub input: String,

    /// Verbosity (-v = info, -vv = debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Parser)]
#[command(name = "ff-eval")]
#[command(author, version, about)]
pub struct Cli {
    #[command(flatten)]
    pub eval: EvalInput,

    #[command(flatten, next_help_heading = "Energy model parameters")]
    pub energy: EnergyModelArguments,
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.eval.verbose);

    let (header, sequence, structure) = read_eval_input(&cli.eval.input)?;
    if let Some(h) = header {
        println!("{}", h.yellow());
    }

    info!("{}", ruler(sequence.len().saturating_sub(1)).magenta());
    let (energy, _tree) = minimum_free_energy(
        &sequence,
        &structure,
        cli.energy.temperature,
        cli.energy.parameter_set(),
        cli.energy.dangle_model(),
    )?;
    println!("{}\n{} {}", sequence, structure, format!("{:>6.2}", energy).green());
    info!("{}", ruler(sequence.len().saturating_sub(1)).magenta());

    Ok(())
}
