// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Shuffles the labelled crops and splits them into a training set
// and a validation set. The crops arrive grouped by folder (all
// crossed, then all empty), so splitting without shuffling would
// hand the validation set a single class.
//
// Uses Fisher-Yates via rand::seq::SliceRandom.
//
// Reference: rand crate documentation

use rand::seq::SliceRandom;

/// Shuffle `samples` and split into (train, validation).
///
/// `train_fraction` is the training share, e.g. 0.75 keeps 75% of
/// the crops for weight updates and holds out the remaining 25%
/// to measure accuracy on unseen boxes.
pub fn split_train_val<T>(mut samples: Vec<T>, train_fraction: f64) -> (Vec<T>, Vec<T>) {
    let mut rng = rand::thread_rng();
    samples.shuffle(&mut rng);

    let total = samples.len();
    let split_at = (((total as f64) * train_fraction).round() as usize).min(total);

    // split_off(n) keeps [0, n) in place and returns [n, total)
    let val = samples.split_off(split_at);

    tracing::debug!("Dataset split: {} training, {} validation", samples.len(), val.len());

    (samples, val)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_fraction_splits_three_to_one() {
        let crops: Vec<usize> = (0..200).collect();
        let (train, val) = split_train_val(crops, 0.75);
        assert_eq!(train.len(), 150);
        assert_eq!(val.len(), 50);
    }

    #[test]
    fn test_no_crop_is_lost_or_duplicated() {
        let crops: Vec<usize> = (0..81).collect();
        let (train, val) = split_train_val(crops, 0.75);
        let mut all: Vec<usize> = train.into_iter().chain(val).collect();
        all.sort_unstable();
        assert_eq!(all, (0..81).collect::<Vec<_>>());
    }

    #[test]
    fn test_empty_input_splits_into_empties() {
        let (train, val) = split_train_val(Vec::<usize>::new(), 0.75);
        assert!(train.is_empty());
        assert!(val.is_empty());
    }

    #[test]
    fn test_fraction_one_keeps_everything_for_training() {
        let (train, val) = split_train_val((0..7).collect::<Vec<_>>(), 1.0);
        assert_eq!(train.len(), 7);
        assert!(val.is_empty());
    }
}
