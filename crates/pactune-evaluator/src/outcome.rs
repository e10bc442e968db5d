//! Match outcomes reported by the simulator.
//!
//! The simulator prints free-form progress text and finishes with a status line. Only two
//! shapes of that line are recognized:
//!
//! ```text
//! Tie game!
//! The Red team wins by 14 points.
//! ```
//!
//! The winner sentence is accepted with or without the leading `The` and the `team` word,
//! and with `point` or `points`.

use std::str::FromStr;

use crate::Fitness;

/// The exact status line printed when a match ends level.
pub const TIE_LINE: &str = "Tie game!";

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ParseOutcomeError {
    #[display("simulator output has no result line")]
    MissingResultLine,
    #[display("unrecognized result line: {line:?}")]
    Unrecognized { line: String },
    #[display("invalid margin {margin:?} in result line")]
    InvalidMargin { margin: String },
}

/// Result of a single simulated match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    Tie,
    Win { winner: String, margin: u32 },
}

impl MatchOutcome {
    /// Extracts the outcome from the full simulator output.
    ///
    /// The result is taken from the next-to-last `\n`-separated piece of the output, which is
    /// the final line when the output is newline terminated.
    ///
    /// # Examples
    ///
    /// ```
    /// use pactune_evaluator::outcome::MatchOutcome;
    ///
    /// let outcome = MatchOutcome::from_output("Time is up.\nThe Blue team wins by 3 points.\n").unwrap();
    /// assert_eq!(outcome, MatchOutcome::Win { winner: "Blue".to_owned(), margin: 3 });
    /// ```
    pub fn from_output(output: &str) -> Result<Self, ParseOutcomeError> {
        let lines = output.split('\n').collect::<Vec<_>>();
        let [.., line, _] = lines.as_slice() else {
            return Err(ParseOutcomeError::MissingResultLine);
        };
        line.parse()
    }

    /// Signed score of this outcome as seen by `side`.
    ///
    /// A win for `side` counts as `+margin`, a win for anyone else as `-margin`, and a tie as
    /// zero. Side names are compared ignoring ASCII case.
    #[must_use]
    pub fn score_for(&self, side: &str) -> Fitness {
        match self {
            Self::Tie => 0,
            Self::Win { winner, margin } if winner.eq_ignore_ascii_case(side) => {
                Fitness::from(*margin)
            }
            Self::Win { margin, .. } => -Fitness::from(*margin),
        }
    }
}

impl FromStr for MatchOutcome {
    type Err = ParseOutcomeError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim_end();
        if line == TIE_LINE {
            return Ok(Self::Tie);
        }

        let mut tokens = line
            .strip_suffix('.')
            .unwrap_or(line)
            .split_whitespace()
            .collect::<Vec<_>>();
        if tokens.first() == Some(&"The") {
            tokens.remove(0);
        }
        match tokens.as_slice() {
            [winner, "wins", "by", margin, "point" | "points"]
            | [winner, "team", "wins", "by", margin, "point" | "points"] => {
                let margin = margin
                    .parse()
                    .map_err(|_| ParseOutcomeError::InvalidMargin {
                        margin: (*margin).to_owned(),
                    })?;
                Ok(Self::Win {
                    winner: (*winner).to_owned(),
                    margin,
                })
            }
            _ => Err(ParseOutcomeError::Unrecognized {
                line: line.to_owned(),
            }),
        }
    }
}
