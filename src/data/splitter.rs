// ============================================================
// Layer 4: Train/Validation Splitter
// ============================================================
// Partitions the indices 0..N into two disjoint sets:
//   - Training set:   used to fit statistics and models
//   - Validation set: held out to measure generalisation
//
// The indices are shuffled first so record order in the catalog
// (often grouped by class or acquisition date) does not leak
// into one side of the split.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom on a
// ChaCha8 stream seeded from the caller's seed, so the same
// (N, seed, ratio) always yields the same partition.
//
// Split ratio: 80% training, 20% validation (configurable)
//
// Reference: rand crate documentation

use std::fmt;

use ndarray::{Array2, Axis};
use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::domain::error::{PipelineError, PipelineResult};

/// Default share of indices that go to training.
pub const DEFAULT_TRAIN_RATIO: f64 = 0.8;

// ─── Ratio ────────────────────────────────────────────────────────────────────
/// Share of indices that go to training, validated to [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Ratio(f64);

impl Ratio {
    pub fn new(value: f64) -> PipelineResult<Self> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(PipelineError::InvalidRatio(value))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for Ratio {
    fn default() -> Self {
        Self(DEFAULT_TRAIN_RATIO)
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<f64> for Ratio {
    type Error = PipelineError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Ratio> for f64 {
    fn from(r: Ratio) -> Self {
        r.0
    }
}

// ─── IndexPartition ───────────────────────────────────────────────────────────
/// Two disjoint index sets covering 0..N, in permutation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexPartition {
    pub train: Vec<usize>,
    pub val:   Vec<usize>,
}

impl IndexPartition {
    /// Total number of indices covered.
    pub fn len(&self) -> usize {
        self.train.len() + self.val.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Gather the rows of `matrix` listed in `indices`, keeping their order.
    pub fn select_rows(matrix: &Array2<f64>, indices: &[usize]) -> Array2<f64> {
        let mut out = Array2::from_elem((indices.len(), matrix.ncols()), f64::NAN);
        for (mut dst, &i) in out.axis_iter_mut(Axis(0)).zip(indices) {
            dst.assign(&matrix.row(i));
        }
        out
    }

    /// Gather the items listed in `indices`, keeping their order.
    pub fn select_items<T: Clone>(items: &[T], indices: &[usize]) -> Vec<T> {
        indices.iter().map(|&i| items[i].clone()).collect()
    }
}

/// Shuffle `0..n` with a stream derived from `seed` and split it.
///
/// # Arguments
/// * `n`     - Number of items
/// * `seed`  - Seed for the permutation
/// * `ratio` - Share for training, e.g. 0.8 = 80%
///
/// The first `floor(n * ratio)` permuted indices are the training set.
/// Ratios 0 and 1 are valid and leave one side empty.
///
/// # Example
/// ```ignore
/// let parts = split_indices(100, 1001, Ratio::new(0.8)?);
/// // parts.train has 80 indices, parts.val has 20
/// ```
pub fn split_indices(n: usize, seed: u64, ratio: Ratio) -> IndexPartition {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut permuted: Vec<usize> = (0..n).collect();
    permuted.shuffle(&mut rng);

    // floor, then clamp against float rounding at ratio == 1.0
    let split_at = ((n as f64) * ratio.value()).floor() as usize;
    let split_at = split_at.min(n);

    // split_off(n) removes elements [n..] and returns them
    let val = permuted.split_off(split_at);

    tracing::debug!(
        "Index split: {} training, {} validation",
        permuted.len(),
        val.len(),
    );

    IndexPartition { train: permuted, val }
}
