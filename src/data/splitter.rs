// ============================================================
// Layer 4 — Train/Test Splitter
// ============================================================
// Shuffles samples with a seeded RNG and splits them into:
//   - Training set: used to update adapter and head weights
//   - Test set:     used for the per-epoch evaluation
//
// The shuffle is seeded so two runs on the same CSV see the
// same split, which keeps epoch metrics comparable across runs.
//
// Test size is ceil(n * test_fraction); training gets the rest.
// With the default 0.2 and 1001 samples that is 201 test and
// 800 train.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Shuffle `samples` deterministically and split into (train, test).
///
/// # Arguments
/// * `samples`       - All available samples (consumed)
/// * `test_fraction` - Proportion held out, clamped to [0, 1]
/// * `seed`          - RNG seed for the shuffle
pub fn split_train_test<T>(mut samples: Vec<T>, test_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let total     = samples.len();
    let fraction  = test_fraction.clamp(0.0, 1.0);
    let test_size = ((total as f64) * fraction).ceil() as usize;
    let split_at  = total - test_size.min(total);

    // After this: samples = [0..split_at], test = [split_at..total]
    let test = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} train, {} test (seed {})",
        samples.len(),
        test.len(),
        seed,
    );

    (samples, test)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_split_sizes() {
        let items: Vec<usize> = (0..100).collect();
        let (train, test)     = split_train_test(items, 0.2, 42);
        assert_eq!(train.len(), 80);
        assert_eq!(test.len(),  20);
    }

    #[test]
    fn test_test_size_rounds_up() {
        let items: Vec<usize> = (0..11).collect();
        let (train, test)     = split_train_test(items, 0.2, 42);
        // 11 * 0.2 = 2.2 → 3
        assert_eq!(test.len(),  3);
        assert_eq!(train.len(), 8);
    }

    #[test]
    fn test_all_items_preserved() {
        let items: Vec<usize> = (0..50).collect();
        let (train, test)     = split_train_test(items, 0.3, 7);
        let mut all: Vec<usize> = train.into_iter().chain(test).collect();
        all.sort_unstable();
        assert_eq!(all, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_same_seed_same_split() {
        let a = split_train_test((0..40).collect::<Vec<usize>>(), 0.25, 42);
        let b = split_train_test((0..40).collect::<Vec<usize>>(), 0.25, 42);
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_dataset() {
        let items: Vec<usize> = Vec::new();
        let (train, test)     = split_train_test(items, 0.2, 42);
        assert!(train.is_empty());
        assert!(test.is_empty());
    }

    #[test]
    fn test_zero_fraction_keeps_everything_for_training() {
        let items: Vec<usize> = (0..10).collect();
        let (train, test)     = split_train_test(items, 0.0, 42);
        assert_eq!(train.len(), 10);
        assert!(test.is_empty());
    }
}
