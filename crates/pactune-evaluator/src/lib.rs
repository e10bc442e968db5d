//! Fitness evaluation of capture agent weights.
//!
//! The simulator that actually plays matches is an external black box. This crate wraps it
//! behind the [`Evaluator`] trait:
//!
//! ```text
//! RoleVectors (candidate + fixed baseline)
//!     ↓ serialized by
//! payload (single-quoted dictionary literals)
//!     ↓ passed to
//! simulator subprocess
//!     ↓ prints
//! status line ("Tie game!" / "The Red team wins by N points.")
//!     ↓ parsed by
//! outcome (MatchOutcome → signed score)
//! ```
//!
//! # Fitness
//!
//! Fitness is a signed integer seen from the candidate's side: a win adds the margin, a loss
//! subtracts it, a tie adds nothing. Matches are noisy, so [`Evaluator::evaluate`] plays a
//! configurable number of matches and sums their scores.
//!
//! # Failures
//!
//! Every failure mode of a single evaluation is reported as an [`EvaluationError`]. None of
//! them are fatal to a tuning run; the training system ranks failed trials last.

use std::{fmt, io, process::ExitStatus, time::Duration};

use pactune_weights::RoleVectors;

use crate::outcome::ParseOutcomeError;

pub mod outcome;
pub mod payload;
pub mod simulator;

/// Signed match score from the candidate's point of view.
pub type Fitness = i64;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum EvaluationError {
    #[display("failed to serialize weights")]
    Serialize(serde_json::Error),
    #[display("failed to start simulator '{program}'")]
    Spawn { program: String, source: io::Error },
    #[display("failed to wait for simulator")]
    Wait(io::Error),
    #[display("failed to read simulator output")]
    Output(io::Error),
    #[display("simulator exited abnormally ({status})")]
    AbnormalExit { status: ExitStatus },
    #[display("simulator did not finish within {timeout:?}")]
    Timeout { timeout: Duration },
    #[display("failed to parse simulator result")]
    Parse(ParseOutcomeError),
    #[display("evaluation worker panicked")]
    Panicked,
}

/// Scores a candidate weight vector by playing matches against the fixed baseline.
pub trait Evaluator: fmt::Debug + Send + Sync {
    /// Plays a single match and returns its signed score.
    fn play_match(&self, vectors: RoleVectors<'_>) -> Result<Fitness, EvaluationError>;

    /// Plays `repeat_count` matches (at least one) and returns the summed score.
    ///
    /// The first failing match aborts the evaluation.
    fn evaluate(
        &self,
        vectors: RoleVectors<'_>,
        repeat_count: usize,
    ) -> Result<Fitness, EvaluationError> {
        let mut total = 0;
        for _ in 0..repeat_count.max(1) {
            total += self.play_match(vectors)?;
        }
        Ok(total)
    }
}

impl<E> Evaluator for &E
where
    E: Evaluator + ?Sized,
{
    fn play_match(&self, vectors: RoleVectors<'_>) -> Result<Fitness, EvaluationError> {
        (**self).play_match(vectors)
    }
}
