//! Concurrent evaluation of a whole population.
//!
//! Every member is evaluated on its own thread. All threads are started before any of them
//! is joined, so the wall-clock time of a generation is that of its slowest trial. A failure
//! or panic in one trial is recorded in its [`TrialResult`] and never affects the others.

use std::thread;

use pactune_evaluator::{EvaluationError, Evaluator, payload};
use pactune_weights::{BaselineWeights, ParameterVector, Role};

use crate::population::{Population, TrialResult};

/// Evaluates every member of `population` against `baseline`.
///
/// Each member is placed in the `evolved` role; the other role uses the baseline vector. The
/// returned results are in population order (`results[i].index == i`).
pub fn run_generation<E>(
    evaluator: &E,
    population: &Population,
    baseline: &BaselineWeights,
    evolved: Role,
    repeat_count: usize,
) -> Vec<TrialResult>
where
    E: Evaluator + ?Sized,
{
    thread::scope(|s| {
        let handles = population
            .members()
            .iter()
            .enumerate()
            .map(|(index, candidate)| {
                log::info!("{}", trial_line(index, candidate));
                let vectors = baseline.with_candidate(evolved, candidate);
                s.spawn(move || evaluator.evaluate(vectors, repeat_count))
            })
            .collect::<Vec<_>>();

        handles
            .into_iter()
            .enumerate()
            .map(|(index, handle)| {
                let outcome = handle.join().unwrap_or(Err(EvaluationError::Panicked));
                match &outcome {
                    Ok(fitness) => log::debug!("trial {index} scored {fitness}"),
                    Err(e) => log::warn!("trial {index} failed: {e}"),
                }
                TrialResult { index, outcome }
            })
            .collect()
    })
}

/// The `<index> - <payload>` line logged when a trial starts.
fn trial_line(index: usize, candidate: &ParameterVector) -> String {
    let payload =
        payload::serialize_vector(candidate).unwrap_or_else(|_| candidate.to_string());
    format!("{index} - {payload}")
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Barrier,
        atomic::{AtomicUsize, Ordering},
    };

    use pactune_evaluator::{Fitness, outcome::ParseOutcomeError};
    use pactune_weights::RoleVectors;

    use super::*;
    use crate::population::Ranking;

    /// Scores `10 - a`, so the member with the smallest `a` wins.
    #[derive(Debug)]
    struct SmallestWins;

    impl Evaluator for SmallestWins {
        #[expect(clippy::cast_possible_truncation)]
        fn play_match(&self, vectors: RoleVectors<'_>) -> Result<Fitness, EvaluationError> {
            let a = vectors.candidate().get("a").unwrap_or_default();
            Ok(10 - a as Fitness)
        }
    }

    fn baseline() -> BaselineWeights {
        BaselineWeights::parse("Offensive\na 1\nb 2\n\nDefensive\na 1\nb 2\n").unwrap()
    }

    #[expect(clippy::cast_precision_loss)]
    fn population(size: usize) -> Population {
        Population::from_members(
            (0..size)
                .map(|i| [("a", i as f64), ("b", 2.0)].into_iter().collect())
                .collect::<Vec<ParameterVector>>(),
        )
    }

    fn run<E>(evaluator: &E, size: usize, role: Role, repeat_count: usize) -> Vec<TrialResult>
    where
        E: Evaluator,
    {
        run_generation(evaluator, &population(size), &baseline(), role, repeat_count)
    }

    #[test]
    fn test_trial_line_uses_simulator_payload() {
        let candidate: ParameterVector = [("b", 2.0), ("a", 1.0)].into_iter().collect();
        assert_eq!(trial_line(3, &candidate), "3 - {'a':1.0,'b':2.0}");
    }

    #[test]
    fn test_results_are_in_population_order() {
        let results = run(&SmallestWins, 8, Role::Offensive, 1);
        assert_eq!(results.len(), 8);
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.index, i);
        }
    }

    #[test]
    fn test_ranking_of_generation() {
        let results = run(&SmallestWins, 8, Role::Offensive, 3);
        let ranking = Ranking::new(results);
        assert_eq!(ranking.results()[0].index, 0);
        assert_eq!(ranking.results()[0].fitness(), Some(30));
        assert_eq!(ranking.results()[7].index, 7);
        assert_eq!(ranking.results()[7].fitness(), Some(9));
    }

    #[test]
    fn test_candidate_takes_evolved_role() {
        #[derive(Debug)]
        struct DefensiveOnly;

        impl Evaluator for DefensiveOnly {
            fn play_match(&self, vectors: RoleVectors<'_>) -> Result<Fitness, EvaluationError> {
                assert_eq!(vectors.offensive.get("a"), Some(1.0));
                assert_eq!(vectors.evolved, Role::Defensive);
                Ok(1)
            }
        }

        let results = run(&DefensiveOnly, 4, Role::Defensive, 1);
        assert!(results.iter().all(|r| r.fitness() == Some(1)));
    }

    #[test]
    fn test_failed_trial_does_not_abort_generation() {
        #[derive(Debug)]
        struct FailsOnThree;

        impl Evaluator for FailsOnThree {
            fn play_match(&self, vectors: RoleVectors<'_>) -> Result<Fitness, EvaluationError> {
                if vectors.candidate().get("a") == Some(3.0) {
                    return Err(EvaluationError::Parse(ParseOutcomeError::MissingResultLine));
                }
                Ok(1)
            }
        }

        let results = run(&FailsOnThree, 6, Role::Offensive, 1);
        assert!(results[3].outcome.is_err());
        assert_eq!(results.iter().filter(|r| r.outcome.is_ok()).count(), 5);
    }

    #[test]
    fn test_panicking_trial_is_reported() {
        #[derive(Debug)]
        struct PanicsOnOne;

        impl Evaluator for PanicsOnOne {
            fn play_match(&self, vectors: RoleVectors<'_>) -> Result<Fitness, EvaluationError> {
                assert_ne!(vectors.candidate().get("a"), Some(1.0), "boom");
                Ok(1)
            }
        }

        let results = run(&PanicsOnOne, 3, Role::Offensive, 1);
        assert!(matches!(results[1].outcome, Err(EvaluationError::Panicked)));
        assert!(results[0].outcome.is_ok());
        assert!(results[2].outcome.is_ok());
    }

    #[test]
    fn test_trials_run_concurrently() {
        // Every trial waits for all others; this would deadlock if trials ran one at a time.
        #[derive(Debug)]
        struct Rendezvous {
            barrier: Barrier,
            calls: AtomicUsize,
        }

        impl Evaluator for Rendezvous {
            fn play_match(&self, _vectors: RoleVectors<'_>) -> Result<Fitness, EvaluationError> {
                self.calls.fetch_add(1, Ordering::Relaxed);
                self.barrier.wait();
                Ok(0)
            }
        }

        let evaluator = Rendezvous {
            barrier: Barrier::new(5),
            calls: AtomicUsize::new(0),
        };
        let results = run(&evaluator, 5, Role::Offensive, 1);
        assert_eq!(results.len(), 5);
        assert_eq!(evaluator.calls.load(Ordering::Relaxed), 5);
    }
}
