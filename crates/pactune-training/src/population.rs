//! Population, ranking, and breeding.
//!
//! # Ranking
//!
//! Trial results are sorted by fitness, best first. Failed trials (see
//! [`EvaluationError`]) rank after every successful trial regardless of score. The sort is
//! stable, so trials with equal fitness keep their population order.
//!
//! # Breeding
//!
//! The next generation is built entirely from pairwise averages of the top-ranked vectors of
//! the current one. For a population of `N`, the parent pool is the smallest top-`K` whose
//! `K·(K−1)/2` unordered pairs cover `N` children. The pair schedule lists every pair among
//! the first `K−1` ranks in lexicographic order, then pairs each of those ranks with rank
//! `K` until `N` pairs exist. With `N = 8` this gives (1-indexed ranks):
//!
//! ```text
//! (1,2) (1,3) (1,4) (2,3) (2,4) (3,4) (1,5) (2,5)
//! ```
//!
//! There is no elitism: the fittest vector survives only through its averages.

use pactune_evaluator::{EvaluationError, Fitness};
use pactune_weights::{FeatureMismatchError, ParameterVector};
use rand::Rng;

use crate::{mutation::MutationPolicy, stats::FitnessStats};

/// Smallest supported population size.
///
/// Below this the parent pool would need more ranks than there are members.
pub const MIN_POPULATION_SIZE: usize = 3;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum BreedError {
    #[display("cannot breed rank {rank} with itself")]
    SelfBreeding { rank: usize },
    #[display("rank {rank} is out of range for a ranking of {len} trials")]
    RankOutOfRange { rank: usize, len: usize },
    #[display("trial index {index} has no member in a population of {len}")]
    MissingMember { index: usize, len: usize },
    #[display("parents have different feature sets")]
    FeatureMismatch(FeatureMismatchError),
}

/// The outcome of evaluating one population member.
#[derive(Debug)]
pub struct TrialResult {
    /// Position of the evaluated member in the population
    pub index: usize,
    pub outcome: Result<Fitness, EvaluationError>,
}

impl TrialResult {
    /// The fitness, or `None` if the trial failed.
    #[must_use]
    pub fn fitness(&self) -> Option<Fitness> {
        self.outcome.as_ref().ok().copied()
    }
}

/// Trial results of one generation, best first.
#[derive(Debug)]
pub struct Ranking {
    results: Vec<TrialResult>,
}

impl Ranking {
    /// Sorts `results` by fitness, descending, with failed trials last.
    #[must_use]
    pub fn new(mut results: Vec<TrialResult>) -> Self {
        // `None < Some(_)`, so failures sort after every fitness value when reversed
        results.sort_by(|a, b| b.fitness().cmp(&a.fitness()));
        Self { results }
    }

    #[must_use]
    pub fn results(&self) -> &[TrialResult] {
        &self.results
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// The best successful trial, if any trial succeeded.
    #[must_use]
    pub fn best(&self) -> Option<&TrialResult> {
        self.results.first().filter(|r| r.outcome.is_ok())
    }

    #[must_use]
    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_ok()).count()
    }

    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.len() - self.success_count()
    }

    /// Statistics over the fitness of successful trials.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn fitness_stats(&self) -> Option<FitnessStats> {
        FitnessStats::new(
            self.results
                .iter()
                .filter_map(TrialResult::fitness)
                .map(|f| f as f64),
        )
    }
}

/// Returns the size `K` of the parent pool for a population of `population_size`.
///
/// `K` is the smallest value whose `K·(K−1)/2` unordered pairs cover the population.
///
/// # Examples
///
/// ```
/// use pactune_training::population::parent_pool_size;
///
/// assert_eq!(parent_pool_size(8), 5);
/// assert_eq!(parent_pool_size(10), 5);
/// assert_eq!(parent_pool_size(11), 6);
/// ```
#[must_use]
pub fn parent_pool_size(population_size: usize) -> usize {
    let mut k = 2;
    while k * (k - 1) / 2 < population_size {
        k += 1;
    }
    k
}

/// Returns the breeding schedule for a population of `population_size`.
///
/// Each entry is a pair of 0-indexed ranks. See the [module docs](self) for the ordering.
#[must_use]
pub fn breeding_pairs(population_size: usize) -> Vec<(usize, usize)> {
    let k = parent_pool_size(population_size);
    let inner = (0..k - 1).flat_map(|a| (a + 1..k - 1).map(move |b| (a, b)));
    let outer = (0..k - 1).map(|a| (a, k - 1));
    inner.chain(outer).take(population_size).collect()
}

/// A fixed-size, ordered set of candidate weight vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct Population {
    members: Vec<ParameterVector>,
}

impl Population {
    /// Creates a population of `size` copies of `seed`.
    #[must_use]
    pub fn from_seed(seed: &ParameterVector, size: usize) -> Self {
        Self {
            members: vec![seed.clone(); size],
        }
    }

    #[must_use]
    pub fn from_members(members: Vec<ParameterVector>) -> Self {
        Self { members }
    }

    #[must_use]
    pub fn members(&self) -> &[ParameterVector] {
        &self.members
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ParameterVector> {
        self.members.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Mutates every member in place.
    pub fn mutate<R>(&mut self, policy: &MutationPolicy, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        for member in &mut self.members {
            policy.mutate(member, rng);
        }
    }

    /// Produces a child by averaging the members at ranks `dad` and `mom` (0-indexed).
    pub fn breed(
        &self,
        ranking: &Ranking,
        dad: usize,
        mom: usize,
    ) -> Result<ParameterVector, BreedError> {
        if dad == mom {
            return Err(BreedError::SelfBreeding { rank: dad });
        }
        let dad = self.member_at_rank(ranking, dad)?;
        let mom = self.member_at_rank(ranking, mom)?;
        dad.average(mom).map_err(BreedError::FeatureMismatch)
    }

    /// Builds the next generation from `ranking` using [`breeding_pairs`].
    ///
    /// The result has the same size as `self`.
    pub fn next_generation(&self, ranking: &Ranking) -> Result<Self, BreedError> {
        let members = breeding_pairs(self.len())
            .into_iter()
            .map(|(dad, mom)| self.breed(ranking, dad, mom))
            .collect::<Result<_, _>>()?;
        Ok(Self { members })
    }

    fn member_at_rank(
        &self,
        ranking: &Ranking,
        rank: usize,
    ) -> Result<&ParameterVector, BreedError> {
        let result = ranking
            .results
            .get(rank)
            .ok_or(BreedError::RankOutOfRange {
                rank,
                len: ranking.len(),
            })?;
        self.members
            .get(result.index)
            .ok_or(BreedError::MissingMember {
                index: result.index,
                len: self.len(),
            })
    }
}
