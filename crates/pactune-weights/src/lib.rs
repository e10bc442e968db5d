//! Feature weight vectors for the capture agents tuned by `pactune`.
//!
//! The agent controller is configured by two weight vectors, one per role:
//!
//! - **Offensive** - weights used by the agent that raids the opponent's side
//! - **Defensive** - weights used by the agent that guards its own side
//!
//! A tuning run evolves exactly one of these roles. The other one is held fixed at the
//! values read from the baseline file ([`baseline`]).
//!
//! # Modules
//!
//! - [`vector`] - [`ParameterVector`], a sorted mapping of feature name to weight
//! - [`baseline`] - reading and writing the baseline weight file

use serde::{Deserialize, Serialize};

pub use self::{
    baseline::{BaselineError, BaselineWeights},
    vector::{FeatureMismatchError, ParameterVector},
};

pub mod baseline;
pub mod vector;

/// The role a weight vector configures.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::FromStr,
)]
pub enum Role {
    Offensive,
    Defensive,
}

impl Role {
    pub const ALL: [Self; 2] = [Self::Offensive, Self::Defensive];

    /// Returns the role that is not `self`.
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Self::Offensive => Self::Defensive,
            Self::Defensive => Self::Offensive,
        }
    }
}

/// The pair of vectors handed to the simulator for one match.
///
/// One of the two is the candidate under evaluation; the other is the fixed baseline.
#[derive(Debug, Clone, Copy)]
pub struct RoleVectors<'a> {
    pub evolved: Role,
    pub offensive: &'a ParameterVector,
    pub defensive: &'a ParameterVector,
}

impl<'a> RoleVectors<'a> {
    #[must_use]
    pub fn get(&self, role: Role) -> &'a ParameterVector {
        match role {
            Role::Offensive => self.offensive,
            Role::Defensive => self.defensive,
        }
    }

    /// The vector being evaluated.
    #[must_use]
    pub fn candidate(&self) -> &'a ParameterVector {
        self.get(self.evolved)
    }

    /// The fixed vector for the role that is not evolved.
    #[must_use]
    pub fn baseline(&self) -> &'a ParameterVector {
        self.get(self.evolved.other())
    }
}
