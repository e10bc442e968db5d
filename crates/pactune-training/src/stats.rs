//! Summary statistics of a generation's fitness values.

/// Descriptive statistics of the fitness values of one generation.
///
/// Only successful trials contribute; failed trials are counted separately by
/// [`Ranking::failure_count`](crate::population::Ranking::failure_count).
#[derive(Debug, Clone, PartialEq)]
pub struct FitnessStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Upper median for even-length inputs.
    pub median: f64,
    pub std_dev: f64,
}

impl FitnessStats {
    /// Computes statistics from unsorted values.
    ///
    /// Returns `None` if `values` is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// # use pactune_training::stats::FitnessStats;
    /// let stats = FitnessStats::new([3.0, 7.0, 1.0, 7.0]).unwrap();
    /// assert_eq!(stats.min, 1.0);
    /// assert_eq!(stats.max, 7.0);
    /// assert_eq!(stats.mean, 4.5);
    /// assert_eq!(stats.median, 7.0);
    /// ```
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut values = values.into_iter().collect::<Vec<_>>();
        values.sort_by(f64::total_cmp);
        Self::from_sorted(&values)
    }

    /// Computes statistics from values sorted in ascending order.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_sorted(sorted_values: &[f64]) -> Option<Self> {
        assert!(
            sorted_values.is_sorted_by(|a, b| a <= b),
            "values must be sorted in ascending order"
        );

        let min = *sorted_values.first()?;
        let max = *sorted_values.last()?;
        let n = sorted_values.len() as f64;
        let mean = sorted_values.iter().sum::<f64>() / n;
        let median = sorted_values[sorted_values.len() / 2];
        let variance = sorted_values
            .iter()
            .map(|v| (v - mean).powi(2))
            .sum::<f64>()
            / n;

        Some(Self {
            min,
            max,
            mean,
            median,
            std_dev: variance.sqrt(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        assert_eq!(FitnessStats::new(Vec::<f64>::new()), None);
    }

    #[test]
    fn test_single_value() {
        let stats = FitnessStats::new([-12.0]).unwrap();
        assert_eq!(stats.min, -12.0);
        assert_eq!(stats.max, -12.0);
        assert_eq!(stats.median, -12.0);
        assert_eq!(stats.std_dev, 0.0);
    }

    #[test]
    fn test_std_dev() {
        let stats = FitnessStats::new([2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(stats.mean, 5.0);
        assert_eq!(stats.std_dev, 2.0);
    }
}
