// ============================================================
// Layer 4: Missingness Generator (MCAR)
// ============================================================
// Simulates "missing completely at random" data: every element
// is replaced by the missing marker with the same probability,
// independently of its value, its neighbours and other records.
//
// Randomness comes from an explicitly passed stream. A pipeline
// run creates one ChaCha8 stream from its seed and threads it
// through every call, so the same seed reproduces the same
// missingness pattern on every machine.
//
// Reference: rand / rand_chacha crate documentation

use ndarray::{Array2, Axis};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::domain::{
    error::{PipelineError, PipelineResult},
    sequence::{MissingMarker, Sample, Sequence},
    traits::SequenceTransform,
};

/// The random stream type threaded through a pipeline run.
pub type RandomStream = ChaCha8Rng;

/// Build the stream for a run. Call once per run, never mid-run.
pub fn seeded_stream(seed: u64) -> RandomStream {
    ChaCha8Rng::seed_from_u64(seed)
}

// ─── Proportion ───────────────────────────────────────────────────────────────
/// Per-element probability of going missing, validated to [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Proportion(f64);

impl Proportion {
    pub fn new(value: f64) -> PipelineResult<Self> {
        // NaN fails `contains` as well
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(PipelineError::InvalidProportion(value))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Proportion {
    type Error = PipelineError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Proportion> for f64 {
    fn from(p: Proportion) -> Self {
        p.0
    }
}

// ─── Generation ───────────────────────────────────────────────────────────────
/// Return a copy of `values` with each element independently replaced
/// by the marker with probability `proportion`.
pub fn generate_missing<T, R>(
    values:     &[T],
    proportion: Proportion,
    marker:     MissingMarker,
    rng:        &mut R,
) -> PipelineResult<Vec<T>>
where
    T: Sample,
    R: Rng,
{
    let mut out = values.to_vec();
    generate_missing_in_place(&mut out, proportion, marker, rng)?;
    Ok(out)
}

/// Mutating variant of [`generate_missing`] for callers that own the
/// buffer and explicitly want it overwritten.
pub fn generate_missing_in_place<T, R>(
    values:     &mut [T],
    proportion: Proportion,
    marker:     MissingMarker,
    rng:        &mut R,
) -> PipelineResult<()>
where
    T: Sample,
    R: Rng,
{
    let missing = T::missing(marker)?;
    let p       = proportion.value();

    for v in values.iter_mut() {
        if rng.gen_bool(p) {
            *v = missing;
        }
    }
    Ok(())
}

/// Corrupt each row of a padded matrix, touching only the first
/// `cuts[i]` entries of row `i`. Padding past the cut stays as it is
/// and consumes no randomness. Rows are visited in order.
///
/// `cuts` must hold exactly one entry per row.
pub fn generate_missing_rows<R: Rng>(
    matrix:     &Array2<f64>,
    cuts:       &[usize],
    proportion: Proportion,
    rng:        &mut R,
) -> PipelineResult<Array2<f64>> {
    if cuts.len() != matrix.nrows() {
        return Err(PipelineError::ShapeMismatch {
            expected: matrix.nrows(),
            actual:   cuts.len(),
        });
    }

    let mut out = matrix.clone();
    for (mut row, &cut) in out.axis_iter_mut(Axis(0)).zip(cuts) {
        let mut observed: Vec<f64> = row.iter().take(cut).copied().collect();
        generate_missing_in_place(&mut observed, proportion, MissingMarker::NotANumber, rng)?;
        for (dst, v) in row.iter_mut().zip(observed) {
            *dst = v;
        }
    }
    Ok(out)
}

// ─── MissingnessGenerator ─────────────────────────────────────────────────────
/// Corruption step usable wherever a [`SequenceTransform`] is expected.
/// Owns the run's random stream.
pub struct MissingnessGenerator {
    proportion: Proportion,
    marker:     MissingMarker,
    rng:        RandomStream,
}

impl MissingnessGenerator {
    pub fn new(proportion: Proportion, marker: MissingMarker, rng: RandomStream) -> Self {
        Self { proportion, marker, rng }
    }
}

impl SequenceTransform for MissingnessGenerator {
    fn name(&self) -> &'static str {
        "mcar"
    }

    fn apply(&mut self, sequence: &Sequence) -> PipelineResult<Sequence> {
        Ok(match sequence {
            Sequence::Int(v) => Sequence::Int(
                generate_missing(v, self.proportion, self.marker, &mut self.rng)?,
            ),
            Sequence::Float(v) => Sequence::Float(
                generate_missing(v, self.proportion, self.marker, &mut self.rng)?,
            ),
        })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    const SENTINEL: MissingMarker = MissingMarker::Sentinel(-9999);

    fn p(v: f64) -> Proportion {
        Proportion::new(v).unwrap()
    }

    #[test]
    fn test_proportion_bounds() {
        assert!(Proportion::new(0.0).is_ok());
        assert!(Proportion::new(1.0).is_ok());
        assert_eq!(Proportion::new(1.5), Err(PipelineError::InvalidProportion(1.5)));
        assert!(Proportion::new(-0.1).is_err());
        assert!(Proportion::new(f64::NAN).is_err());
    }

    #[test]
    fn test_zero_proportion_is_identity() {
        let values: Vec<i64> = (0..500).collect();
        let mut rng = seeded_stream(1001);
        let out = generate_missing(&values, p(0.0), SENTINEL, &mut rng).unwrap();
        assert_eq!(out, values);
    }

    #[test]
    fn test_full_proportion_marks_everything() {
        let values: Vec<i64> = (0..500).collect();
        let mut rng = seeded_stream(1001);
        let out = generate_missing(&values, p(1.0), SENTINEL, &mut rng).unwrap();
        assert!(out.iter().all(|&v| v == -9999));

        let floats = vec![1.0, 2.0, 3.0];
        let out = generate_missing(&floats, p(1.0), MissingMarker::NotANumber, &mut rng).unwrap();
        assert!(out.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_same_seed_same_pattern() {
        let values: Vec<f64> = (0..1000).map(|i| i as f64).collect();
        let a = generate_missing(&values, p(0.2), MissingMarker::NotANumber, &mut seeded_stream(7)).unwrap();
        let b = generate_missing(&values, p(0.2), MissingMarker::NotANumber, &mut seeded_stream(7)).unwrap();
        let mask_a: Vec<bool> = a.iter().map(|v| v.is_nan()).collect();
        let mask_b: Vec<bool> = b.iter().map(|v| v.is_nan()).collect();
        assert_eq!(mask_a, mask_b);
    }

    #[test]
    fn test_rate_is_roughly_the_proportion() {
        let values = vec![1i64; 20_000];
        let out = generate_missing(&values, p(0.1), SENTINEL, &mut seeded_stream(3)).unwrap();
        let rate = out.iter().filter(|&&v| v == -9999).count() as f64 / values.len() as f64;
        assert!((rate - 0.1).abs() < 0.01, "rate was {rate}");
    }

    #[test]
    fn test_input_is_not_modified() {
        let values = vec![1i64, 2, 3];
        let _ = generate_missing(&values, p(1.0), SENTINEL, &mut seeded_stream(0)).unwrap();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn test_in_place_variant_overwrites() {
        let mut values = vec![1i64, 2, 3];
        generate_missing_in_place(&mut values, p(1.0), SENTINEL, &mut seeded_stream(0)).unwrap();
        assert_eq!(values, vec![-9999; 3]);
    }

    #[test]
    fn test_marker_mismatch_is_rejected() {
        let values = vec![1i64, 2, 3];
        let err = generate_missing(&values, p(0.5), MissingMarker::NotANumber, &mut seeded_stream(0));
        assert!(matches!(err, Err(PipelineError::MarkerMismatch { .. })));
    }

    #[test]
    fn test_rows_are_corrupted_only_up_to_their_cut() {
        let mut m = Array2::from_elem((2, 4), 1.0);
        m[[0, 2]] = f64::NAN;
        m[[0, 3]] = f64::NAN;

        let out = generate_missing_rows(&m, &[2, 4], p(1.0), &mut seeded_stream(5)).unwrap();
        assert!(out.iter().all(|v| v.is_nan()));

        let out = generate_missing_rows(&m, &[2, 4], p(0.0), &mut seeded_stream(5)).unwrap();
        assert_eq!(out.row(1).to_vec(), vec![1.0; 4]);
        assert!(out[[0, 3]].is_nan());
        assert_eq!(out[[0, 0]], 1.0);
    }

    #[test]
    fn test_rows_need_one_cut_each() {
        let m   = Array2::from_elem((3, 4), 1.0);
        let err = generate_missing_rows(&m, &[2], p(1.0), &mut seeded_stream(5));
        assert_eq!(err, Err(PipelineError::ShapeMismatch { expected: 3, actual: 1 }));
    }

    #[test]
    fn test_generator_as_transform() {
        let mut corrupt = MissingnessGenerator::new(p(1.0), SENTINEL, seeded_stream(1));
        let out = corrupt.apply(&Sequence::Int(vec![4, 5])).unwrap();
        assert_eq!(out, Sequence::Int(vec![-9999, -9999]));
        assert_eq!(corrupt.name(), "mcar");
    }
}
