use clap::{Parser, Subcommand};

use self::{evolve::EvolveArg, show_weights::ShowWeightsArg};

mod evolve;
mod show_weights;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Evolve one role's weights against the capture simulator
    Evolve(#[clap(flatten)] EvolveArg),
    /// Print the parsed baseline weights
    ShowWeights(#[clap(flatten)] ShowWeightsArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Evolve(arg) => evolve::run(&arg)?,
        Mode::ShowWeights(arg) => show_weights::run(&arg)?,
    }
    Ok(())
}
