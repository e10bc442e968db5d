use std::path::PathBuf;

use pactune_evaluator::payload;
use pactune_weights::Role;

use crate::{command::evolve::DEFAULT_WEIGHTS_PATH, util};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ShowWeightsArg {
    /// Baseline weights file (`-` for stdin)
    #[arg(long, short = 'w', default_value = DEFAULT_WEIGHTS_PATH)]
    weights: PathBuf,
    /// Print only this role, as the literal passed to the simulator
    #[arg(long)]
    role: Option<Role>,
}

pub(crate) fn run(arg: &ShowWeightsArg) -> anyhow::Result<()> {
    let ShowWeightsArg { weights, role } = arg;
    let baseline = util::read_baseline(weights)?;

    match role {
        Some(role) => println!("{}", payload::serialize_vector(baseline.get(*role))?),
        None => print!("{baseline}"),
    }
    Ok(())
}
