// ============================================================
// Layer 4: Rectangularizer
// ============================================================
// Records have different lengths; batch processing wants one
// matrix. Rows are right-padded with NaN up to the longest
// record:
//
//   [1, 2, 3]          →  [1, 2, 3, NaN, NaN]
//   [4, 5, 6, 7, 8]    →  [4, 5, 6, 7,   8  ]
//
// The original length of each row (its "cut") is returned next
// to the matrix. Without it the padding cannot be told apart
// from real missing values and could not be stripped again.
//
// Integer records cannot hold NaN, so they go through `widen`
// first: values become f64 and the integer sentinel becomes NaN.
//
// Reference: ndarray crate documentation

use ndarray::Array2;

use crate::domain::{
    error::PipelineResult,
    sequence::{MissingMarker, Sample, Sequence},
};

/// Explicit integer → float widening.
///
/// Float records are copied unchanged. Integer records are cast to
/// f64 with every sentinel entry mapped to NaN, so after widening the
/// whole pipeline speaks the NaN convention.
pub fn widen(sequence: &Sequence, marker: MissingMarker) -> PipelineResult<Vec<f64>> {
    sequence.check_marker(marker)?;
    Ok(match sequence {
        Sequence::Float(v) => v.clone(),
        Sequence::Int(v) => v
            .iter()
            .map(|&x| if x.is_missing(marker) { f64::NAN } else { x as f64 })
            .collect(),
    })
}

/// A padded matrix together with the original row lengths.
#[derive(Debug, Clone)]
pub struct Rectangular {
    /// Shape: [count, max_length]
    pub matrix: Array2<f64>,

    /// Original length of each row, aligned with row order
    pub cuts: Vec<usize>,
}

impl Rectangular {
    pub fn max_length(&self) -> usize {
        self.matrix.ncols()
    }
}

/// Pad every sequence with NaN to the longest length in `collection`.
/// An empty collection yields a 0 × 0 matrix.
pub fn rectangularize(collection: &[Vec<f64>]) -> Rectangular {
    let max_length = collection.iter().map(Vec::len).max().unwrap_or(0);
    let mut matrix = Array2::from_elem((collection.len(), max_length), f64::NAN);

    for (i, row) in collection.iter().enumerate() {
        for (j, &v) in row.iter().enumerate() {
            matrix[[i, j]] = v;
        }
    }

    tracing::debug!(
        "Rectangularized {} sequences to width {}",
        collection.len(),
        max_length
    );

    Rectangular {
        matrix,
        cuts: collection.iter().map(Vec::len).collect(),
    }
}
