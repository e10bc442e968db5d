//! The generation loop.
//!
//! A run seeds the population with copies of the evolved role's baseline vector and then, for
//! each generation, mutates every member, evaluates the whole population concurrently, ranks
//! the results and breeds the next generation from the top of the ranking. The last
//! generation is not bred; its ranking is the result of the run.

use pactune_evaluator::{Evaluator, Fitness};
use pactune_weights::{BaselineWeights, ParameterVector, Role};
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::{
    mutation::MutationPolicy,
    population::{BreedError, MIN_POPULATION_SIZE, Population, Ranking, TrialResult},
    trial,
};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("population size must be at least {min}, got {size}")]
    PopulationTooSmall { size: usize, min: usize },
    #[display("at least one generation is required")]
    NoGenerations,
    #[display("at least one match per trial is required")]
    ZeroRepeats,
    #[display("mutation rate must be within [0, 1], got {rate}")]
    InvalidMutationRate { rate: f64 },
    #[display("mutation intensity must be finite and non-negative, got {intensity}")]
    InvalidMutationIntensity { intensity: f64 },
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum EvolveError {
    #[display("invalid run configuration")]
    Config(ConfigError),
    #[display("baseline has no {role} weights to evolve")]
    EmptyRole { role: Role },
    #[display("every trial of generation {generation} failed")]
    AllTrialsFailed { generation: usize },
    #[display("failed to breed generation {generation}")]
    Breed {
        generation: usize,
        source: BreedError,
    },
}

/// Parameters of a tuning run. Fixed for the whole run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub population_size: usize,
    pub generation_count: usize,
    /// Matches played per trial; their scores are summed
    pub repeat_count: usize,
    pub evolved_role: Role,
    pub mutation: MutationPolicy,
    /// RNG seed; a random seed is drawn and logged when unset
    pub seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            population_size: 8,
            generation_count: 10,
            repeat_count: 1,
            evolved_role: Role::Offensive,
            mutation: MutationPolicy::default(),
            seed: None,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size < MIN_POPULATION_SIZE {
            return Err(ConfigError::PopulationTooSmall {
                size: self.population_size,
                min: MIN_POPULATION_SIZE,
            });
        }
        if self.generation_count == 0 {
            return Err(ConfigError::NoGenerations);
        }
        if self.repeat_count == 0 {
            return Err(ConfigError::ZeroRepeats);
        }
        let MutationPolicy { rate, intensity } = self.mutation;
        if !(0.0..=1.0).contains(&rate) {
            return Err(ConfigError::InvalidMutationRate { rate });
        }
        if !intensity.is_finite() || intensity < 0.0 {
            return Err(ConfigError::InvalidMutationIntensity { intensity });
        }
        Ok(())
    }
}

/// A snapshot of one evaluated generation, handed to the run observer.
#[derive(Debug)]
pub struct GenerationReport<'a> {
    /// Zero-based generation number
    pub generation: usize,
    pub generation_count: usize,
    /// The population as it was evaluated (after mutation)
    pub population: &'a Population,
    pub ranking: &'a Ranking,
}

impl<'a> GenerationReport<'a> {
    /// Trial results paired with the evaluated vectors, best first.
    pub fn ranked_members(&self) -> impl Iterator<Item = (&'a TrialResult, &'a ParameterVector)> {
        let population = self.population;
        let ranking = self.ranking;
        ranking
            .results()
            .iter()
            .filter_map(move |r| Some((r, population.get(r.index)?)))
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.generation + 1 == self.generation_count
    }
}

/// The result of a completed run.
#[derive(Debug)]
pub struct EvolutionOutcome {
    pub best: ParameterVector,
    pub best_fitness: Fitness,
    pub generations: usize,
    /// The seed the run actually used
    pub seed: u64,
    /// Ranking of the last generation
    pub ranking: Ranking,
}

/// Runs the generation loop for one evolved role.
#[derive(Debug)]
pub struct EvolutionDriver<'a, E>
where
    E: ?Sized,
{
    config: RunConfig,
    baseline: &'a BaselineWeights,
    evaluator: &'a E,
}

impl<'a, E> EvolutionDriver<'a, E>
where
    E: Evaluator + ?Sized,
{
    /// Validates `config` against `baseline` and prepares a run.
    pub fn new(
        config: RunConfig,
        baseline: &'a BaselineWeights,
        evaluator: &'a E,
    ) -> Result<Self, EvolveError> {
        config.validate().map_err(EvolveError::Config)?;
        let role = config.evolved_role;
        if baseline.get(role).is_empty() {
            return Err(EvolveError::EmptyRole { role });
        }
        Ok(Self {
            config,
            baseline,
            evaluator,
        })
    }

    #[must_use]
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Runs every generation, calling `observer` after each one is ranked.
    pub fn run<F>(&self, mut observer: F) -> Result<EvolutionOutcome, EvolveError>
    where
        F: FnMut(&GenerationReport<'_>),
    {
        let RunConfig {
            population_size,
            generation_count,
            repeat_count,
            evolved_role,
            mutation,
            seed,
        } = self.config;

        let seed = seed.unwrap_or_else(rand::random);
        log::info!("evolving {evolved_role} weights with seed {seed}");
        let mut rng = Pcg32::seed_from_u64(seed);

        let mut population =
            Population::from_seed(self.baseline.get(evolved_role), population_size);
        let mut generation = 0;
        loop {
            population.mutate(&mutation, &mut rng);

            log::info!("generation {generation}: evaluating {population_size} candidates");
            let results = trial::run_generation(
                self.evaluator,
                &population,
                self.baseline,
                evolved_role,
                repeat_count,
            );
            let ranking = Ranking::new(results);
            let Some((best_index, best_fitness)) = ranking
                .best()
                .and_then(|r| Some((r.index, r.fitness()?)))
            else {
                return Err(EvolveError::AllTrialsFailed { generation });
            };
            if ranking.failure_count() > 0 {
                log::warn!(
                    "generation {generation}: {} of {population_size} trials failed",
                    ranking.failure_count()
                );
            }

            observer(&GenerationReport {
                generation,
                generation_count,
                population: &population,
                ranking: &ranking,
            });

            if generation + 1 == generation_count {
                let best = population.members()[best_index].clone();
                return Ok(EvolutionOutcome {
                    best,
                    best_fitness,
                    generations: generation_count,
                    seed,
                    ranking,
                });
            }

            population = population
                .next_generation(&ranking)
                .map_err(|source| EvolveError::Breed { generation, source })?;
            generation += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use pactune_evaluator::{EvaluationError, outcome::ParseOutcomeError};
    use pactune_weights::RoleVectors;

    use super::*;

    /// Scores how close `score` is to 1000.
    #[derive(Debug, Default)]
    struct Target {
        calls: AtomicUsize,
    }

    impl Evaluator for Target {
        #[expect(clippy::cast_possible_truncation)]
        fn play_match(&self, vectors: RoleVectors<'_>) -> Result<Fitness, EvaluationError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            let score = vectors.candidate().get("score").unwrap_or_default();
            Ok(-(score - 1000.0).abs() as Fitness)
        }
    }

    #[derive(Debug)]
    struct AlwaysFails;

    impl Evaluator for AlwaysFails {
        fn play_match(&self, _vectors: RoleVectors<'_>) -> Result<Fitness, EvaluationError> {
            Err(EvaluationError::Parse(ParseOutcomeError::MissingResultLine))
        }
    }

    fn baseline() -> BaselineWeights {
        BaselineWeights::parse(
            "Offensive\nscore 400.0\nfoodDistance -25.0\ndisperse 0.0\n\nDefensive\npacmanDistance -50.0\n",
        )
        .unwrap()
    }

    fn config() -> RunConfig {
        RunConfig {
            seed: Some(7),
            ..RunConfig::default()
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(RunConfig::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let cases = [
            (
                RunConfig {
                    population_size: 2,
                    ..config()
                },
                "population",
            ),
            (
                RunConfig {
                    generation_count: 0,
                    ..config()
                },
                "generation",
            ),
            (
                RunConfig {
                    repeat_count: 0,
                    ..config()
                },
                "match",
            ),
            (
                RunConfig {
                    mutation: MutationPolicy {
                        rate: 1.5,
                        intensity: 0.25,
                    },
                    ..config()
                },
                "rate",
            ),
            (
                RunConfig {
                    mutation: MutationPolicy {
                        rate: 1.0,
                        intensity: f64::NAN,
                    },
                    ..config()
                },
                "intensity",
            ),
            (
                RunConfig {
                    mutation: MutationPolicy {
                        rate: 1.0,
                        intensity: -0.1,
                    },
                    ..config()
                },
                "intensity",
            ),
        ];
        for (config, keyword) in cases {
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains(keyword), "{err}");
        }
    }

    #[test]
    fn test_invalid_config_is_rejected_before_evaluation() {
        let baseline = baseline();
        let evaluator = Target::default();
        let config = RunConfig {
            population_size: 1,
            ..config()
        };
        let err = EvolutionDriver::new(config, &baseline, &evaluator).unwrap_err();
        assert!(matches!(
            err,
            EvolveError::Config(ConfigError::PopulationTooSmall { size: 1, min: 3 })
        ));
        assert_eq!(evaluator.calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_empty_role_is_rejected() {
        let baseline = BaselineWeights::parse("Offensive\nscore 1.0\n").unwrap();
        let config = RunConfig {
            evolved_role: Role::Defensive,
            ..config()
        };
        let err = EvolutionDriver::new(config, &baseline, &Target::default()).unwrap_err();
        assert!(matches!(err, EvolveError::EmptyRole { role: Role::Defensive }));
    }

    #[test]
    fn test_observer_sees_every_generation() {
        let baseline = baseline();
        let evaluator = Target::default();
        let config = RunConfig {
            generation_count: 4,
            repeat_count: 2,
            ..config()
        };
        let driver = EvolutionDriver::new(config, &baseline, &evaluator).unwrap();

        let mut seen = vec![];
        let outcome = driver
            .run(|report| {
                assert_eq!(report.ranking.len(), 8);
                assert_eq!(report.ranked_members().count(), 8);
                seen.push((report.generation, report.is_last()));
            })
            .unwrap();

        assert_eq!(seen, [(0, false), (1, false), (2, false), (3, true)]);
        assert_eq!(outcome.generations, 4);
        assert_eq!(outcome.seed, 7);
        assert_eq!(evaluator.calls.load(Ordering::Relaxed), 4 * 8 * 2);
    }

    #[test]
    fn test_outcome_is_best_of_last_generation() {
        let baseline = baseline();
        let evaluator = Target::default();
        let driver = EvolutionDriver::new(config(), &baseline, &evaluator).unwrap();

        let mut last_best = None;
        let outcome = driver
            .run(|report| {
                let (result, vector) = report.ranked_members().next().unwrap();
                last_best = Some((result.fitness(), vector.clone()));
            })
            .unwrap();

        let (fitness, vector) = last_best.unwrap();
        assert_eq!(fitness, Some(outcome.best_fitness));
        assert_eq!(vector, outcome.best);
        assert!(outcome.best.same_features(&baseline.offensive));
        assert_eq!(outcome.best.get("disperse"), Some(0.0));
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let baseline = baseline();
        let run = || {
            let evaluator = Target::default();
            let driver = EvolutionDriver::new(config(), &baseline, &evaluator).unwrap();
            driver.run(|_| {}).unwrap()
        };
        let a = run();
        let b = run();
        assert_eq!(a.best, b.best);
        assert_eq!(a.best_fitness, b.best_fitness);
    }

    #[test]
    fn test_evolution_improves_fitness() {
        let baseline = baseline();
        let evaluator = Target::default();
        let config = RunConfig {
            generation_count: 25,
            ..config()
        };
        let driver = EvolutionDriver::new(config, &baseline, &evaluator).unwrap();

        let mut first_best = None;
        let outcome = driver
            .run(|report| {
                if report.generation == 0 {
                    first_best = report.ranking.best().and_then(TrialResult::fitness);
                }
            })
            .unwrap();

        let first_best = first_best.unwrap();
        assert!(
            outcome.best_fitness > first_best,
            "{} <= {first_best}",
            outcome.best_fitness
        );
    }

    #[test]
    fn test_identity_mutation_keeps_baseline() {
        let baseline = baseline();
        let config = RunConfig {
            mutation: MutationPolicy {
                rate: 0.0,
                intensity: 0.25,
            },
            ..config()
        };
        let evaluator = Target::default();
        let driver = EvolutionDriver::new(config, &baseline, &evaluator).unwrap();
        let outcome = driver.run(|_| {}).unwrap();
        assert_eq!(outcome.best, baseline.offensive);
        assert_eq!(outcome.best_fitness, -600);
    }

    #[test]
    fn test_all_trials_failed_aborts_run() {
        let baseline = baseline();
        let driver = EvolutionDriver::new(config(), &baseline, &AlwaysFails).unwrap();
        let mut reports = 0;
        let err = driver.run(|_| reports += 1).unwrap_err();
        assert!(matches!(err, EvolveError::AllTrialsFailed { generation: 0 }));
        assert_eq!(reports, 0);
    }
}
