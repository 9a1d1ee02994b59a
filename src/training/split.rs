//! Deterministic shuffled train/test split.

use crate::error::{PhytoError, Result};
use crate::models::TrainingSet;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

/// Shuffle row indices with a seeded generator and hold out `ceil(n * fraction)` rows
///
/// The same seed always yields the same partition. Both halves must be
/// non-empty, so at least two rows are required.
pub fn train_test_split(
    set: &TrainingSet,
    test_fraction: f64,
    seed: u64,
) -> Result<(TrainingSet, TrainingSet)> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(PhytoError::model(format!(
            "test fraction {test_fraction} is outside (0, 1)"
        )));
    }
    let n_samples = set.len();
    if n_samples < 2 {
        return Err(PhytoError::model(format!(
            "need at least 2 rows to split, have {n_samples}"
        )));
    }

    let n_test = ((n_samples as f64) * test_fraction).ceil() as usize;
    let n_test = n_test.clamp(1, n_samples - 1);

    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let (test_indices, train_indices) = indices.split_at(n_test);
    debug!(
        "Split {} rows into {} train / {} test (seed {})",
        n_samples,
        train_indices.len(),
        test_indices.len(),
        seed
    );

    Ok((set.subset(train_indices), set.subset(test_indices)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(n: usize) -> TrainingSet {
        TrainingSet::new(
            vec!["x".into()],
            (0..n).map(|i| vec![i as f64]).collect(),
            (0..n).map(|i| i as f64).collect(),
        )
    }

    #[test]
    fn test_split_sizes() {
        let (train, test) = train_test_split(&numbered(10), 0.2, 42).unwrap();
        assert_eq!(train.len(), 8);
        assert_eq!(test.len(), 2);

        let (train, test) = train_test_split(&numbered(11), 0.2, 42).unwrap();
        assert_eq!(test.len(), 3);
        assert_eq!(train.len(), 8);
    }

    #[test]
    fn test_split_is_deterministic_partition() {
        let set = numbered(25);
        let (train_a, test_a) = train_test_split(&set, 0.2, 42).unwrap();
        let (train_b, test_b) = train_test_split(&set, 0.2, 42).unwrap();
        assert_eq!(train_a, train_b);
        assert_eq!(test_a, test_b);

        let mut all: Vec<f64> = train_a.target.iter().chain(&test_a.target).copied().collect();
        all.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(all, set.target);

        // rows stay aligned with their targets
        for (row, target) in train_a.features.iter().zip(&train_a.target) {
            assert_eq!(row[0], *target);
        }
    }

    #[test]
    fn test_split_rejects_bad_input() {
        assert!(train_test_split(&numbered(1), 0.2, 42).is_err());
        assert!(train_test_split(&numbered(10), 0.0, 42).is_err());
        assert!(train_test_split(&numbered(10), 1.0, 42).is_err());
    }
}
