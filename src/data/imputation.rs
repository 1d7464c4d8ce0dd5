// ============================================================
// Layer 4: Imputation Strategies
// ============================================================
// Four ways of dealing with marked-missing entries:
//
//   zero  → replace each missing entry with 0
//   mean  → replace with the mean of the observed entries
//   locf  → carry the last observed value forward (0 before
//           the first observation)
//   drop  → remove missing entries, shortening the sequence
//
// Every function takes a slice and returns a new Vec; the input
// is never touched. ImputeStrategy wraps the four behind the
// SequenceTransform trait so the orchestrator can apply any of
// them to whole records.
//
// Reference: Rust Book §13 (Iterators and Closures)

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::domain::{
    error::{PipelineError, PipelineResult},
    sequence::{MissingMarker, Sample, Sequence},
    traits::SequenceTransform,
};

/// Replace every missing entry with zero.
pub fn impute_zero<T: Sample>(values: &[T], marker: MissingMarker) -> PipelineResult<Vec<T>> {
    T::missing(marker)?;
    Ok(values
        .iter()
        .map(|&v| if v.is_missing(marker) { T::ZERO } else { v })
        .collect())
}

/// Replace every missing entry with the mean of the observed entries.
///
/// Fails with `NoObservedValues` when nothing is observed. Integer
/// records use the floor-division mean described on [`Sample::mean_of`].
pub fn impute_mean<T: Sample>(values: &[T], marker: MissingMarker) -> PipelineResult<Vec<T>> {
    T::missing(marker)?;

    let observed: Vec<T> = values
        .iter()
        .copied()
        .filter(|v| !v.is_missing(marker))
        .collect();
    let mean = T::mean_of(&observed).ok_or(PipelineError::NoObservedValues)?;

    Ok(values
        .iter()
        .map(|&v| if v.is_missing(marker) { mean } else { v })
        .collect())
}

/// Last observation carried forward.
///
/// Entries before the first observation become 0; nothing is ever
/// carried backwards.
pub fn impute_locf<T: Sample>(values: &[T], marker: MissingMarker) -> PipelineResult<Vec<T>> {
    T::missing(marker)?;

    let mut last = T::ZERO;
    Ok(values
        .iter()
        .map(|&v| {
            if v.is_missing(marker) {
                last
            } else {
                last = v;
                v
            }
        })
        .collect())
}

/// Keep only the observed entries, in their original order.
pub fn delete_missing<T: Sample>(values: &[T], marker: MissingMarker) -> PipelineResult<Vec<T>> {
    T::missing(marker)?;
    Ok(values
        .iter()
        .copied()
        .filter(|v| !v.is_missing(marker))
        .collect())
}

// ─── ImputeStrategy ───────────────────────────────────────────────────────────
/// The closed set of imputation strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImputeStrategy {
    Zero,
    Mean,
    Locf,
    #[serde(rename = "drop")]
    DropMissing,
}

impl ImputeStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Zero        => "zero",
            Self::Mean        => "mean",
            Self::Locf        => "locf",
            Self::DropMissing => "drop",
        }
    }

    /// Apply this strategy to one slice.
    pub fn impute<T: Sample>(self, values: &[T], marker: MissingMarker) -> PipelineResult<Vec<T>> {
        match self {
            Self::Zero        => impute_zero(values, marker),
            Self::Mean        => impute_mean(values, marker),
            Self::Locf        => impute_locf(values, marker),
            Self::DropMissing => delete_missing(values, marker),
        }
    }

    /// Bind a marker so the strategy can run as a [`SequenceTransform`].
    pub fn with_marker(self, marker: MissingMarker) -> Imputer {
        Imputer { strategy: self, marker }
    }
}

impl fmt::Display for ImputeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImputeStrategy {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zero" | "0"        => Ok(Self::Zero),
            "mean"              => Ok(Self::Mean),
            "locf" | "forward"  => Ok(Self::Locf),
            "drop" | "delete"   => Ok(Self::DropMissing),
            other => Err(PipelineError::UnknownStrategy(other.to_string())),
        }
    }
}

/// An [`ImputeStrategy`] paired with the run's missing marker.
#[derive(Debug, Clone, Copy)]
pub struct Imputer {
    strategy: ImputeStrategy,
    marker:   MissingMarker,
}

impl SequenceTransform for Imputer {
    fn name(&self) -> &'static str {
        self.strategy.as_str()
    }

    fn apply(&mut self, sequence: &Sequence) -> PipelineResult<Sequence> {
        Ok(match sequence {
            Sequence::Int(v)   => Sequence::Int(self.strategy.impute(v, self.marker)?),
            Sequence::Float(v) => Sequence::Float(self.strategy.impute(v, self.marker)?),
        })
    }
}
