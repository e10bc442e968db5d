//! Named feature weight vectors.
//!
//! A [`ParameterVector`] maps feature names to real-valued weights. It is the unit that the
//! training system mutates, breeds, and hands to the simulator for scoring.
//!
//! Keys are kept in sorted order so that two vectors with equal contents always serialize
//! to the same payload string.

use std::{
    collections::{BTreeMap, btree_map},
    fmt,
};

use serde::{Deserialize, Serialize};

/// Error returned when two vectors are combined but do not share the same feature set.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("feature sets differ: {missing:?} missing, {unexpected:?} unexpected")]
pub struct FeatureMismatchError {
    /// Features present in the left vector but not in the right one.
    pub missing: Vec<String>,
    /// Features present in the right vector but not in the left one.
    pub unexpected: Vec<String>,
}

/// A mapping from feature name to weight.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterVector {
    weights: BTreeMap<String, f64>,
}

impl ParameterVector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    #[must_use]
    pub fn get(&self, feature: &str) -> Option<f64> {
        self.weights.get(feature).copied()
    }

    #[must_use]
    pub fn contains(&self, feature: &str) -> bool {
        self.weights.contains_key(feature)
    }

    /// Inserts or replaces a weight, returning the previous value.
    pub fn insert<S>(&mut self, feature: S, weight: f64) -> Option<f64>
    where
        S: Into<String>,
    {
        self.weights.insert(feature.into(), weight)
    }

    /// Iterates over `(feature, weight)` pairs in feature-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Iterates over feature names in sorted order.
    pub fn features(&self) -> impl Iterator<Item = &str> {
        self.weights.keys().map(String::as_str)
    }

    /// Iterates mutably over the weights. Keys cannot be changed through this view.
    pub fn weights_mut(&mut self) -> btree_map::ValuesMut<'_, String, f64> {
        self.weights.values_mut()
    }

    /// Returns `true` if both vectors have exactly the same feature names.
    #[must_use]
    pub fn same_features(&self, other: &Self) -> bool {
        self.weights.len() == other.weights.len()
            && self.weights.keys().eq(other.weights.keys())
    }

    /// Computes the elementwise mean of two vectors.
    ///
    /// Both vectors must have identical feature sets; the result has that same set.
    ///
    /// # Examples
    ///
    /// ```
    /// use pactune_weights::ParameterVector;
    ///
    /// let a: ParameterVector = [("x", 1.0), ("y", 4.0)].into_iter().collect();
    /// let b: ParameterVector = [("x", 3.0), ("y", -2.0)].into_iter().collect();
    /// let child = a.average(&b).unwrap();
    /// assert_eq!(child.get("x"), Some(2.0));
    /// assert_eq!(child.get("y"), Some(1.0));
    /// ```
    pub fn average(&self, other: &Self) -> Result<Self, FeatureMismatchError> {
        if !self.same_features(other) {
            return Err(FeatureMismatchError {
                missing: self
                    .features()
                    .filter(|f| !other.contains(f))
                    .map(str::to_owned)
                    .collect(),
                unexpected: other
                    .features()
                    .filter(|f| !self.contains(f))
                    .map(str::to_owned)
                    .collect(),
            });
        }
        let weights = self
            .weights
            .iter()
            .zip(other.weights.values())
            .map(|((k, a), b)| (k.clone(), (a + b) / 2.0))
            .collect();
        Ok(Self { weights })
    }
}

impl<S> FromIterator<(S, f64)> for ParameterVector
where
    S: Into<String>,
{
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
    {
        Self {
            weights: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl fmt::Display for ParameterVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (feature, weight)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match f.precision() {
                Some(p) => write!(f, "{feature}: {weight:.p$}")?,
                None => write!(f, "{feature}: {weight}")?,
            }
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(pairs: &[(&str, f64)]) -> ParameterVector {
        pairs.iter().map(|&(k, v)| (k, v)).collect()
    }

    #[test]
    fn test_average_is_commutative() {
        let a = vector(&[("score", 400.0), ("ghostDistance", -100.0), ("disperse", 0.3)]);
        let b = vector(&[("score", 217.0), ("ghostDistance", 53.8), ("disperse", 2.9)]);
        assert_eq!(a.average(&b).unwrap(), b.average(&a).unwrap());
    }

    #[test]
    fn test_average_keeps_feature_set() {
        let a = vector(&[("a", 1.0), ("b", 2.0)]);
        let b = vector(&[("a", 3.0), ("b", 6.0)]);
        let child = a.average(&b).unwrap();
        assert!(child.same_features(&a));
        assert_eq!(child.get("a"), Some(2.0));
        assert_eq!(child.get("b"), Some(4.0));
    }

    #[test]
    fn test_average_rejects_mismatched_features() {
        let a = vector(&[("a", 1.0), ("b", 2.0)]);
        let b = vector(&[("a", 3.0), ("c", 6.0)]);
        let err = a.average(&b).unwrap_err();
        assert_eq!(err.missing, vec!["b".to_owned()]);
        assert_eq!(err.unexpected, vec!["c".to_owned()]);
    }

    #[test]
    fn test_same_features_checks_length() {
        let a = vector(&[("a", 1.0)]);
        let b = vector(&[("a", 1.0), ("b", 2.0)]);
        assert!(!a.same_features(&b));
        assert!(!b.same_features(&a));
    }

    #[test]
    fn test_display_with_precision() {
        let v = vector(&[("b", 2.0), ("a", 1.0 / 3.0)]);
        assert_eq!(format!("{v:.2}"), "{a: 0.33, b: 2.00}");
    }
}
