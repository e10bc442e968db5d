//! Baseline weight files.
//!
//! The baseline file holds the default weights for both roles in a plain, line-oriented
//! format:
//!
//! ```text
//! Offensive
//! score 400.0
//! foodDistance -25.0
//!
//! Defensive
//! pacmanDistance -50.0
//! onDefense 100.0
//! ```
//!
//! - A line with a single token is a role label (`Offensive` or `Defensive`) and selects
//!   the section that following pairs are added to.
//! - A blank line closes the current section.
//! - A line with two tokens is a `<feature> <weight>` pair. The weight must be a finite
//!   number.
//!
//! Anything else is rejected with a [`BaselineError`] that names the offending line.

use std::{
    fmt,
    io::{self, BufRead},
};

use crate::{ParameterVector, Role, RoleVectors};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum BaselineError {
    #[display("failed to read baseline weights")]
    Io(io::Error),
    #[display("line {line}: unknown role label '{label}'")]
    UnknownLabel {
        line: usize,
        label: String,
    },
    #[display("line {line}: weight for '{feature}' appears outside of any role section")]
    OutsideSection {
        line: usize,
        feature: String,
    },
    #[display("line {line}: invalid weight '{value}' for feature '{feature}'")]
    InvalidWeight {
        line: usize,
        feature: String,
        value: String,
    },
    #[display("line {line}: duplicate feature '{feature}' in {role} section")]
    DuplicateFeature {
        line: usize,
        role: Role,
        feature: String,
    },
    #[display("line {line}: expected '<feature> <weight>' or a role label, found {tokens} tokens")]
    Malformed { line: usize, tokens: usize },
}

/// Default weights for both roles, as read from a baseline file.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BaselineWeights {
    pub offensive: ParameterVector,
    pub defensive: ParameterVector,
}

impl BaselineWeights {
    /// Parses baseline weights from a reader.
    pub fn read<R>(reader: R) -> Result<Self, BaselineError>
    where
        R: BufRead,
    {
        let mut weights = Self::default();
        let mut active = None;

        for (i, line) in reader.lines().enumerate() {
            let line_no = i + 1;
            let line = line.map_err(BaselineError::Io)?;
            let tokens = line.split_whitespace().collect::<Vec<_>>();
            match tokens.as_slice() {
                [] => active = None,
                [label] => {
                    let role = label
                        .parse::<Role>()
                        .map_err(|_| BaselineError::UnknownLabel {
                            line: line_no,
                            label: (*label).to_owned(),
                        })?;
                    active = Some(role);
                }
                [feature, value] => {
                    let Some(role) = active else {
                        return Err(BaselineError::OutsideSection {
                            line: line_no,
                            feature: (*feature).to_owned(),
                        });
                    };
                    let weight = value
                        .parse::<f64>()
                        .ok()
                        .filter(|w| w.is_finite())
                        .ok_or_else(|| BaselineError::InvalidWeight {
                            line: line_no,
                            feature: (*feature).to_owned(),
                            value: (*value).to_owned(),
                        })?;
                    if weights.get_mut(role).insert(*feature, weight).is_some() {
                        return Err(BaselineError::DuplicateFeature {
                            line: line_no,
                            role,
                            feature: (*feature).to_owned(),
                        });
                    }
                }
                _ => {
                    return Err(BaselineError::Malformed {
                        line: line_no,
                        tokens: tokens.len(),
                    });
                }
            }
        }

        Ok(weights)
    }

    /// Parses baseline weights from a string.
    ///
    /// # Examples
    ///
    /// ```
    /// use pactune_weights::BaselineWeights;
    ///
    /// let baseline = BaselineWeights::parse("Offensive\nscore 400.0\n\nDefensive\nonDefense 100\n").unwrap();
    /// assert_eq!(baseline.offensive.get("score"), Some(400.0));
    /// assert_eq!(baseline.defensive.get("onDefense"), Some(100.0));
    /// ```
    pub fn parse(s: &str) -> Result<Self, BaselineError> {
        Self::read(s.as_bytes())
    }

    #[must_use]
    pub fn get(&self, role: Role) -> &ParameterVector {
        match role {
            Role::Offensive => &self.offensive,
            Role::Defensive => &self.defensive,
        }
    }

    pub fn get_mut(&mut self, role: Role) -> &mut ParameterVector {
        match role {
            Role::Offensive => &mut self.offensive,
            Role::Defensive => &mut self.defensive,
        }
    }

    /// Pairs `candidate` in the `evolved` role with the baseline vector of the other role.
    #[must_use]
    pub fn with_candidate<'a>(
        &'a self,
        evolved: Role,
        candidate: &'a ParameterVector,
    ) -> RoleVectors<'a> {
        match evolved {
            Role::Offensive => RoleVectors {
                evolved,
                offensive: candidate,
                defensive: &self.defensive,
            },
            Role::Defensive => RoleVectors {
                evolved,
                offensive: &self.offensive,
                defensive: candidate,
            },
        }
    }
}

/// Writes the weights back out in the baseline file format.
impl fmt::Display for BaselineWeights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, role) in Role::ALL.into_iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "{role}")?;
            for (feature, weight) in self.get(role).iter() {
                writeln!(f, "{feature} {weight:?}")?;
            }
        }
        Ok(())
    }
}
