//! Evolutionary tuning of capture agent weights.
//!
//! This crate evolves one role's weight vector (see [`pactune_weights::Role`]) while the other
//! role is held at its baseline values. Candidates are scored by an
//! [`Evaluator`](pactune_evaluator::Evaluator), usually the external simulator.
//!
//! # How Tuning Works
//!
//! 1. **Seed** - Fill the population with copies of the evolved role's baseline vector
//! 2. **Mutate** - Perturb every weight with Gaussian noise proportional to its magnitude
//! 3. **Evaluate** - Play matches for every member concurrently, one thread per member
//! 4. **Rank** - Sort by fitness, best first, with failed trials last
//! 5. **Breed** - Replace the population with pairwise averages of the top-ranked members
//! 6. **Repeat** - Continue for the configured number of generations
//!
//! The last generation is evaluated and ranked but not bred. Its best member is the result
//! of the run.
//!
//! # Architecture
//!
//! ```text
//! RunConfig + BaselineWeights
//!     ↓ seed
//! Population
//!     ↓ mutation (MutationPolicy)
//! Population (mutated)
//!     ↓ trial::run_generation (scoped threads)
//! Vec<TrialResult>
//!     ↓ Ranking::new
//! Ranking ──→ GenerationReport (observer)
//!     ↓ Population::next_generation
//! Population (next generation)
//! ```
//!
//! # Modules
//!
//! - [`mutation`] - Gaussian weight perturbation
//! - [`population`] - population, ranking, and the breeding schedule
//! - [`trial`] - concurrent evaluation of one generation
//! - [`driver`] - run configuration and the generation loop
//! - [`stats`] - fitness summary statistics
//!
//! # Example
//!
//! ```rust,ignore
//! use pactune_training::driver::{EvolutionDriver, RunConfig};
//! # let (baseline, evaluator) = todo!();
//!
//! let driver = EvolutionDriver::new(RunConfig::default(), &baseline, &evaluator)?;
//! let outcome = driver.run(|report| {
//!     eprintln!("generation {}: {:?}", report.generation, report.ranking.fitness_stats());
//! })?;
//! println!("{}", outcome.best);
//! ```

pub mod driver;
pub mod mutation;
pub mod population;
pub mod stats;
pub mod trial;
