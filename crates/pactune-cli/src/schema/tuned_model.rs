use chrono::{DateTime, Utc};
use pactune_weights::{ParameterVector, Role};
use serde::{Deserialize, Serialize};

/// The exported result of a tuning run.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TunedModel {
    pub role: Role,
    pub tuned_at: DateTime<Utc>,
    pub final_fitness: i64,
    pub generations: usize,
    pub seed: u64,
    pub weights: ParameterVector,
}
