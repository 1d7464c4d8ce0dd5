// ============================================================
// Layer 3: Sequence, Sample and MissingMarker
// ============================================================
// A Sequence is one record's observations over time. Records
// come in two flavours:
//
//   Int(Vec<i64>)    raw ADC counts, missing = integer sentinel
//   Float(Vec<f64>)  physical units, missing = NaN
//
// The MissingMarker is picked once per pipeline run and every
// core function checks that it fits the data before touching it,
// so one sequence can never carry both conventions.
//
// Reference: Rust Book §6 (Enums), §10 (Traits and Generics)

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::domain::error::{PipelineError, PipelineResult};

/// Sentinel used for integer records when none is configured.
pub const DEFAULT_SENTINEL: i64 = -9999;

// ─── MissingMarker ────────────────────────────────────────────────────────────
/// How "missing" is encoded in-band for a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingMarker {
    /// An out-of-domain integer constant, for integer records.
    Sentinel(i64),
    /// The floating point not-a-number value, for float records.
    NotANumber,
}

impl fmt::Display for MissingMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sentinel(v) => write!(f, "{v}"),
            Self::NotANumber  => write!(f, "nan"),
        }
    }
}

/// Parses `nan` (any case) or an integer such as `-9999`.
impl FromStr for MissingMarker {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("nan") {
            return Ok(Self::NotANumber);
        }
        s.parse::<i64>()
            .map(Self::Sentinel)
            .map_err(|_| PipelineError::InvalidMarker(s.to_string()))
    }
}

// ─── Sample ───────────────────────────────────────────────────────────────────
/// Element type of a sequence.
///
/// Implemented for `i64` and `f64`. Each implementation decides which
/// marker convention it accepts and how its mean is computed.
pub trait Sample: Copy + PartialEq + fmt::Debug {
    /// Human readable type name, used in error messages.
    const DTYPE: &'static str;

    /// Additive identity, used by zero-fill and as the LOCF seed.
    const ZERO: Self;

    /// The in-band value for `marker`, or `MarkerMismatch` if this
    /// sample type cannot hold it.
    fn missing(marker: MissingMarker) -> PipelineResult<Self>;

    /// Whether this value is the missing marker.
    fn is_missing(self, marker: MissingMarker) -> bool;

    /// Arithmetic mean of `observed`, `None` when it is empty.
    fn mean_of(observed: &[Self]) -> Option<Self>;
}

impl Sample for i64 {
    const DTYPE: &'static str = "int";
    const ZERO: Self = 0;

    fn missing(marker: MissingMarker) -> PipelineResult<Self> {
        match marker {
            MissingMarker::Sentinel(v) => Ok(v),
            MissingMarker::NotANumber  => Err(PipelineError::MarkerMismatch {
                marker: marker.to_string(),
                dtype:  Self::DTYPE,
            }),
        }
    }

    fn is_missing(self, marker: MissingMarker) -> bool {
        matches!(marker, MissingMarker::Sentinel(v) if v == self)
    }

    /// Integer mean with floor division.
    ///
    /// The result keeps the integer type of the record, so the
    /// fractional part is discarded: mean([1, 2]) == 1 and
    /// mean([-1, -2]) == -2. This loses up to one unit of precision
    /// per filled value. The sum is taken in i128 so long records
    /// cannot overflow.
    fn mean_of(observed: &[Self]) -> Option<Self> {
        if observed.is_empty() {
            return None;
        }
        let sum: i128 = observed.iter().map(|&v| v as i128).sum();
        Some(sum.div_euclid(observed.len() as i128) as i64)
    }
}

impl Sample for f64 {
    const DTYPE: &'static str = "float";
    const ZERO: Self = 0.0;

    fn missing(marker: MissingMarker) -> PipelineResult<Self> {
        match marker {
            MissingMarker::NotANumber  => Ok(f64::NAN),
            MissingMarker::Sentinel(_) => Err(PipelineError::MarkerMismatch {
                marker: marker.to_string(),
                dtype:  Self::DTYPE,
            }),
        }
    }

    fn is_missing(self, marker: MissingMarker) -> bool {
        marker == MissingMarker::NotANumber && self.is_nan()
    }

    fn mean_of(observed: &[Self]) -> Option<Self> {
        if observed.is_empty() {
            return None;
        }
        Some(observed.iter().sum::<f64>() / observed.len() as f64)
    }
}

// ─── Sequence ─────────────────────────────────────────────────────────────────
/// One record's samples, tagged with their element type.
#[derive(Debug, Clone, PartialEq)]
pub enum Sequence {
    Int(Vec<i64>),
    Float(Vec<f64>),
}

impl Sequence {
    pub fn len(&self) -> usize {
        match self {
            Self::Int(v)   => v.len(),
            Self::Float(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dtype(&self) -> &'static str {
        match self {
            Self::Int(_)   => i64::DTYPE,
            Self::Float(_) => f64::DTYPE,
        }
    }

    /// Fails with `MarkerMismatch` if `marker` does not fit this data.
    pub fn check_marker(&self, marker: MissingMarker) -> PipelineResult<()> {
        match self {
            Self::Int(_)   => i64::missing(marker).map(|_| ()),
            Self::Float(_) => f64::missing(marker).map(|_| ()),
        }
    }

    /// Number of entries equal to the missing marker.
    pub fn count_missing(&self, marker: MissingMarker) -> PipelineResult<usize> {
        self.check_marker(marker)?;
        Ok(match self {
            Self::Int(v)   => v.iter().filter(|x| x.is_missing(marker)).count(),
            Self::Float(v) => v.iter().filter(|x| x.is_missing(marker)).count(),
        })
    }
}
