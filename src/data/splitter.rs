// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Shuffles labelled digits and cuts them into a training part and
// a held-out validation part. IDX files are often ordered by
// writer or by label, so the shuffle happens before the cut.
//
// The RNG is passed in: training seeds it from TrainConfig so a
// run can be repeated exactly.
//
// Reference: rand crate documentation (SliceRandom)

use rand::{seq::SliceRandom, Rng};

/// Shuffle `samples` and split into (train, validation).
///
/// `train_fraction` is clamped to [0, 1]; 0.9 keeps 90% for
/// training.
pub fn split_train_val<T, R>(mut samples: Vec<T>, train_fraction: f64, rng: &mut R) -> (Vec<T>, Vec<T>)
where
    R: Rng + ?Sized,
{
    samples.shuffle(rng);

    let total    = samples.len();
    let fraction = train_fraction.clamp(0.0, 1.0);
    let split_at = ((total as f64) * fraction).round() as usize;
    let val      = samples.split_off(split_at.min(total));

    tracing::debug!(
        "Dataset split: {} training, {} validation",
        samples.len(),
        val.len(),
    );

    (samples, val)
}
