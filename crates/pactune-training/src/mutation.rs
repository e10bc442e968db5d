//! Gaussian mutation of weight vectors.
//!
//! Each weight `w` selected for mutation is replaced by `w + N(0, (w·intensity)²)`: the
//! perturbation is centered on the current value and its standard deviation is proportional
//! to the weight's own magnitude. Large weights move a lot, small weights move a little.
//!
//! A consequence of the proportional scale is that a weight of exactly zero never changes.
//! Features that start at zero in the baseline stay at zero for the whole run.

use pactune_weights::ParameterVector;
use rand::Rng;
use rand_distr::StandardNormal;

/// Per-feature mutation parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MutationPolicy {
    /// Probability of mutating each weight; `1.0` mutates every weight
    pub rate: f64,
    /// Standard deviation of the perturbation relative to the weight's magnitude
    pub intensity: f64,
}

impl Default for MutationPolicy {
    fn default() -> Self {
        Self {
            rate: 1.0,
            intensity: 0.25,
        }
    }
}

impl MutationPolicy {
    /// Mutates `vector` in place.
    ///
    /// Only weights change; the feature set is left untouched.
    ///
    /// # Panics
    ///
    /// Panics if `rate` is outside `[0, 1]`.
    pub fn mutate<R>(&self, vector: &mut ParameterVector, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        for w in vector.weights_mut() {
            if rng.random_bool(self.rate) {
                let z: f64 = rng.sample(StandardNormal);
                *w += z * *w * self.intensity;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    use super::*;

    fn vector() -> ParameterVector {
        [
            ("agentFoodDistance", -5.0),
            ("disperse", 0.0),
            ("dontStop", -100.0),
            ("score", 400.0),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_mutation_keeps_feature_set() {
        let mut rng = Pcg32::seed_from_u64(1);
        let original = vector();
        let mut v = original.clone();
        for _ in 0..50 {
            MutationPolicy::default().mutate(&mut v, &mut rng);
        }
        assert!(v.same_features(&original));
    }

    #[test]
    fn test_zero_weight_stays_zero() {
        let mut rng = Pcg32::seed_from_u64(2);
        let mut v = vector();
        for _ in 0..100 {
            MutationPolicy::default().mutate(&mut v, &mut rng);
            assert_eq!(v.get("disperse"), Some(0.0));
        }
    }

    #[test]
    fn test_full_rate_changes_nonzero_weights() {
        let mut rng = Pcg32::seed_from_u64(3);
        let original = vector();
        let mut v = original.clone();
        MutationPolicy::default().mutate(&mut v, &mut rng);
        for feature in ["agentFoodDistance", "dontStop", "score"] {
            assert_ne!(v.get(feature), original.get(feature), "{feature}");
        }
    }

    #[test]
    fn test_zero_rate_is_identity() {
        let mut rng = Pcg32::seed_from_u64(4);
        let policy = MutationPolicy {
            rate: 0.0,
            intensity: 0.25,
        };
        let mut v = vector();
        policy.mutate(&mut v, &mut rng);
        assert_eq!(v, vector());
    }

    #[test]
    fn test_zero_intensity_is_identity() {
        let mut rng = Pcg32::seed_from_u64(5);
        let policy = MutationPolicy {
            rate: 1.0,
            intensity: 0.0,
        };
        let mut v = vector();
        policy.mutate(&mut v, &mut rng);
        assert_eq!(v, vector());
    }

    #[test]
    fn test_seeded_mutation_is_reproducible() {
        let mut a = vector();
        let mut b = vector();
        MutationPolicy::default().mutate(&mut a, &mut Pcg32::seed_from_u64(42));
        MutationPolicy::default().mutate(&mut b, &mut Pcg32::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_perturbation_scales_with_magnitude() {
        // Over many draws the spread around `w` should be close to `|w|·intensity`.
        let mut rng = Pcg32::seed_from_u64(6);
        let policy = MutationPolicy::default();
        let n = 20_000;
        let mut sum_sq = 0.0;
        for _ in 0..n {
            let mut v: ParameterVector = [("score", 400.0)].into_iter().collect();
            policy.mutate(&mut v, &mut rng);
            let d = v.get("score").unwrap() - 400.0;
            sum_sq += d * d;
        }
        let std_dev = (sum_sq / f64::from(n)).sqrt();
        assert!((std_dev - 100.0).abs() < 5.0, "std_dev = {std_dev}");
    }
}
