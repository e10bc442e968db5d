use std::{path::PathBuf, time::Duration};

use chrono::Utc;
use pactune_evaluator::{
    payload::PayloadStyle,
    simulator::{DEFAULT_OUTPUT_BUDGET, SimulatorCommand, SimulatorEvaluator},
};
use pactune_training::{
    driver::{EvolutionDriver, GenerationReport, RunConfig},
    mutation::MutationPolicy,
};
use pactune_weights::Role;

use crate::{schema::tuned_model::TunedModel, util};

pub(crate) const DEFAULT_WEIGHTS_PATH: &str = "teams/Dankest/default";

const POPULATION_SIZE: usize = 8;
const GENERATION_COUNT: usize = 10;
const REPEAT_COUNT: usize = 1;

const MUTATION_RATE: f64 = 1.0;
const MUTATION_INTENSITY: f64 = 0.25;

const SIMULATOR_PROGRAM: &str = "python2";
const SIMULATOR_SCRIPT: &str = "capture.py";
const TEAM: &str = "Dankest";
const ITERATIONS: u32 = 400;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct EvolveArg {
    /// Baseline weights file (`-` for stdin)
    #[arg(long, short = 'w', default_value = DEFAULT_WEIGHTS_PATH)]
    weights: PathBuf,
    /// Role whose weights are evolved; the other role keeps its baseline weights
    #[arg(long, default_value = "offensive")]
    role: Role,

    /// Number of candidates per generation
    #[arg(long, short = 'n', default_value_t = POPULATION_SIZE)]
    population: usize,
    #[arg(long, short = 'g', default_value_t = GENERATION_COUNT)]
    generations: usize,
    /// Matches played per candidate per generation
    #[arg(long, default_value_t = REPEAT_COUNT)]
    repeats: usize,
    /// Probability of perturbing each weight
    #[arg(long, default_value_t = MUTATION_RATE)]
    mutation_rate: f64,
    /// Perturbation standard deviation relative to the weight's magnitude
    #[arg(long, default_value_t = MUTATION_INTENSITY)]
    mutation_intensity: f64,
    /// RNG seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Simulator interpreter or executable
    #[arg(long, default_value = SIMULATOR_PROGRAM)]
    program: String,
    /// Simulator entry point
    #[arg(long, default_value = SIMULATOR_SCRIPT)]
    script: PathBuf,
    /// Red team module, which plays the candidate weights
    #[arg(long, default_value = TEAM)]
    team: String,
    /// Blue team module
    #[arg(long)]
    opponent: Option<String>,
    /// Map layout
    #[arg(long)]
    layout: Option<String>,
    /// Step limit per match
    #[arg(long, default_value_t = ITERATIONS)]
    iterations: u32,
    /// Extra simulator argument, inserted before the weights (repeatable)
    #[arg(long = "sim-arg", allow_hyphen_values = true)]
    sim_args: Vec<String>,
    /// How weights are passed to the simulator: `single` or `paired`
    #[arg(long, default_value = "single")]
    payload: PayloadStyle,
    /// Side name the candidate plays as in the simulator's result line
    #[arg(long, default_value = "Red")]
    side: String,
    /// Kill a match that runs longer than this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Trailing simulator output bytes kept for parsing
    #[arg(long, default_value_t = DEFAULT_OUTPUT_BUDGET)]
    output_budget: usize,
    /// Directory to run the simulator in
    #[arg(long)]
    working_dir: Option<PathBuf>,

    /// Output file path for the tuned model
    #[arg(long)]
    output: Option<PathBuf>,
}

impl EvolveArg {
    fn run_config(&self) -> RunConfig {
        RunConfig {
            population_size: self.population,
            generation_count: self.generations,
            repeat_count: self.repeats,
            evolved_role: self.role,
            mutation: MutationPolicy {
                rate: self.mutation_rate,
                intensity: self.mutation_intensity,
            },
            seed: self.seed,
        }
    }

    fn evaluator(&self) -> SimulatorEvaluator {
        let command = SimulatorCommand {
            program: self.program.clone(),
            script: self.script.clone(),
            team: self.team.clone(),
            opponent: self.opponent.clone(),
            layout: self.layout.clone(),
            iterations: self.iterations,
            extra_args: self.sim_args.clone(),
            payload: self.payload,
            working_dir: self.working_dir.clone(),
        };
        SimulatorEvaluator::new(command)
            .with_side(&self.side)
            .with_output_budget(self.output_budget)
            .with_timeout(self.timeout_secs.map(Duration::from_secs))
    }
}

pub(crate) fn run(arg: &EvolveArg) -> anyhow::Result<()> {
    let baseline = util::read_baseline(&arg.weights)?;
    let evaluator = arg.evaluator();
    let driver = EvolutionDriver::new(arg.run_config(), &baseline, &evaluator)?;

    let outcome = driver.run(print_generation)?;

    eprintln!("Best {} weights:", arg.role);
    eprintln!("  {} => {}", outcome.best, outcome.best_fitness);
    eprintln!("{} tuning completed.", arg.role);

    let model = TunedModel {
        role: arg.role,
        tuned_at: Utc::now(),
        final_fitness: outcome.best_fitness,
        generations: outcome.generations,
        seed: outcome.seed,
        weights: outcome.best,
    };
    util::save_json(&model, arg.output.as_deref())?;

    eprintln!();
    eprintln!("Model saved successfully");
    if let Some(path) = &arg.output {
        eprintln!("  Path: {}", path.display());
    }
    eprintln!("  Role: {}", model.role);
    eprintln!("  Tuned at: {}", model.tuned_at);
    eprintln!("  Final fitness: {}", model.final_fitness);
    eprintln!("  Seed: {}", model.seed);
    eprintln!("  Weights: {} features", model.weights.len());

    Ok(())
}

fn print_generation(report: &GenerationReport<'_>) {
    eprintln!(
        "Generation #{}/{}:",
        report.generation + 1,
        report.generation_count
    );

    eprintln!("  Candidates:");
    for (rank, (result, vector)) in report.ranked_members().enumerate() {
        match &result.outcome {
            Ok(fitness) => eprintln!("  {rank:2}: {vector:.3} => {fitness}"),
            Err(e) => eprintln!("  {rank:2}: {vector:.3} => failed ({e})"),
        }
    }

    let ranking = report.ranking;
    if let Some(stats) = ranking.fitness_stats() {
        eprintln!("  Fitness Stats:");
        eprintln!("    Min:    {:.1}", stats.min);
        eprintln!("    Max:    {:.1}", stats.max);
        eprintln!("    Mean:   {:.1}", stats.mean);
        eprintln!("    Median: {:.1}", stats.median);
        eprintln!("    StdDev: {:.1}", stats.std_dev);
    }
    if ranking.failure_count() > 0 {
        eprintln!("    Failed: {}/{}", ranking.failure_count(), ranking.len());
    }
}
