//! Serialization of weight vectors into simulator arguments.
//!
//! The simulator reads weights as Python dictionary literals, so vectors are rendered as
//! JSON objects with the double quotes swapped for single quotes:
//!
//! ```text
//! {'foodDistance':-25.0,'score':400.0}
//! ```
//!
//! When both role vectors are passed through the team option string, the simulator splits
//! that string on commas. In that style every comma inside a vector is replaced by `|`,
//! which the agent factory turns back into a comma before evaluating the literal.

use pactune_weights::{ParameterVector, RoleVectors};

/// How the weight payload is attached to the simulator command line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::FromStr)]
pub enum PayloadStyle {
    /// `-w <candidate>`: only the evolved vector is passed.
    #[default]
    Single,
    /// `--redOpts offensiveWeights=<o>,defensiveWeights=<d>`: both role vectors are passed.
    Paired,
}

/// Renders a vector as a single-quoted dictionary literal.
///
/// # Examples
///
/// ```
/// use pactune_evaluator::payload;
/// use pactune_weights::ParameterVector;
///
/// let v: ParameterVector = [("b", 2.0), ("a", 1.5)].into_iter().collect();
/// assert_eq!(payload::serialize_vector(&v).unwrap(), "{'a':1.5,'b':2.0}");
/// ```
pub fn serialize_vector(vector: &ParameterVector) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(vector)?;
    Ok(json.replace('"', "'"))
}

/// Like [`serialize_vector`], with commas replaced by `|` so the literal survives being
/// embedded in a comma-separated option string.
pub fn serialize_vector_piped(vector: &ParameterVector) -> Result<String, serde_json::Error> {
    Ok(serialize_vector(vector)?.replace(',', "|"))
}

impl PayloadStyle {
    /// Builds the trailing payload arguments for one match.
    pub fn args(self, vectors: RoleVectors<'_>) -> Result<Vec<String>, serde_json::Error> {
        let args = match self {
            Self::Single => vec!["-w".to_owned(), serialize_vector(vectors.candidate())?],
            Self::Paired => vec![
                "--redOpts".to_owned(),
                format!(
                    "offensiveWeights={},defensiveWeights={}",
                    serialize_vector_piped(vectors.offensive)?,
                    serialize_vector_piped(vectors.defensive)?,
                ),
            ],
        };
        Ok(args)
    }
}
