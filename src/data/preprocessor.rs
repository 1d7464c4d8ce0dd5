// ============================================================
// Layer 4: Series Preprocessor (standard scaling)
// ============================================================
// Learns per-column statistics on the training matrix and uses
// them to normalise and de-normalise data:
//
//   fit          mean, standard deviation, min and max per column
//   preprocess   (x - mean) / std
//   postprocess  x * std + mean, then clip to [min, max]
//
// Clipping on the way back keeps reconstructed values inside the
// range seen at fit time.
//
// Two layouts are supported, chosen by type parameter:
//
//   Normal      Array2 [samples, features]
//   Sequential  Array3 [samples, time, features], flattened to
//               [samples, time * features] for every operation
//               and reshaped back afterwards
//
// NaN entries (missing values, padding) are ignored when fitting
// and stay NaN through both transforms.
//
// Reference: ndarray crate documentation

use std::{fmt, marker::PhantomData, str::FromStr};

use ndarray::{Array2, Array3, ArrayView1, Axis};
use serde::Serialize;

use crate::domain::error::{PipelineError, PipelineResult};

// ─── Layouts ──────────────────────────────────────────────────────────────────
/// How a preprocessor's input is laid out and flattened into columns.
pub trait Layout {
    /// Array type accepted by fit / preprocess / postprocess.
    type Data;

    const FORMAT: PreprocessorFormat;

    /// View `data` as [samples, columns].
    fn flatten(data: &Self::Data) -> Array2<f64>;

    /// Undo `flatten`, using `like` for the original shape.
    fn restore(flat: Array2<f64>, like: &Self::Data) -> PipelineResult<Self::Data>;
}

/// Rows are samples, columns are features.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normal;

/// Samples × time steps × features.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sequential;

impl Layout for Normal {
    type Data = Array2<f64>;

    const FORMAT: PreprocessorFormat = PreprocessorFormat::Normal;

    fn flatten(data: &Array2<f64>) -> Array2<f64> {
        data.to_owned()
    }

    fn restore(flat: Array2<f64>, _like: &Array2<f64>) -> PipelineResult<Array2<f64>> {
        Ok(flat)
    }
}

impl Layout for Sequential {
    type Data = Array3<f64>;

    const FORMAT: PreprocessorFormat = PreprocessorFormat::Sequential;

    fn flatten(data: &Array3<f64>) -> Array2<f64> {
        let (n, steps, features) = data.dim();
        // iter() walks in logical row-major order whatever the memory layout
        let mut flat = Array2::zeros((n, steps * features));
        for (dst, &v) in flat.iter_mut().zip(data.iter()) {
            *dst = v;
        }
        flat
    }

    fn restore(flat: Array2<f64>, like: &Array3<f64>) -> PipelineResult<Array3<f64>> {
        let (n, steps, features) = like.dim();
        let actual = flat.ncols();
        Array3::from_shape_vec((n, steps, features), flat.iter().copied().collect())
            .map_err(|_| PipelineError::ShapeMismatch {
                expected: steps * features,
                actual,
            })
    }
}

// ─── PreprocessorFormat ───────────────────────────────────────────────────────
/// Runtime name of a layout, used in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreprocessorFormat {
    Normal,
    Sequential,
}

impl fmt::Display for PreprocessorFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal     => f.write_str("normal"),
            Self::Sequential => f.write_str("sequential"),
        }
    }
}

impl FromStr for PreprocessorFormat {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "normal"     => Ok(Self::Normal),
            "sequential" => Ok(Self::Sequential),
            other        => Err(PipelineError::UnsupportedFormat(other.to_string())),
        }
    }
}

// ─── NormalizationStats ───────────────────────────────────────────────────────
/// Per-column statistics learned by `fit`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizationStats {
    pub mean:  Vec<f64>,
    /// Population standard deviation, 1.0 where it is zero
    pub scale: Vec<f64>,
    pub min:   Vec<f64>,
    pub max:   Vec<f64>,
}

impl NormalizationStats {
    /// Compute NaN-ignoring statistics for every column of `data`.
    ///
    /// A column without any observed value gets mean 0, scale 1 and
    /// unbounded clipping, so both transforms leave it untouched.
    pub fn from_columns(data: &Array2<f64>) -> Self {
        let cols = data.ncols();
        let mut stats = Self {
            mean:  Vec::with_capacity(cols),
            scale: Vec::with_capacity(cols),
            min:   Vec::with_capacity(cols),
            max:   Vec::with_capacity(cols),
        };

        for column in data.axis_iter(Axis(1)) {
            let (mean, scale, min, max) = column_stats(column);
            stats.mean.push(mean);
            stats.scale.push(scale);
            stats.min.push(min);
            stats.max.push(max);
        }
        stats
    }

    pub fn columns(&self) -> usize {
        self.mean.len()
    }
}

fn column_stats(column: ArrayView1<f64>) -> (f64, f64, f64, f64) {
    let observed: Vec<f64> = column.iter().copied().filter(|v| !v.is_nan()).collect();
    if observed.is_empty() {
        return (0.0, 1.0, f64::NEG_INFINITY, f64::INFINITY);
    }

    let n    = observed.len() as f64;
    let mean = observed.iter().sum::<f64>() / n;
    let var  = observed.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std  = var.sqrt();

    let min = observed.iter().copied().fold(f64::INFINITY, f64::min);
    let max = observed.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let scale = if std > f64::EPSILON { std } else { 1.0 };
    (mean, scale, min, max)
}

// ─── Preprocessor ─────────────────────────────────────────────────────────────
/// Stateful standard scaler for one layout.
///
/// `fit` must be called exactly once before either transform.
#[derive(Debug, Clone)]
pub struct Preprocessor<L: Layout> {
    stats:  Option<NormalizationStats>,
    layout: PhantomData<L>,
}

impl<L: Layout> Preprocessor<L> {
    pub fn new() -> Self {
        Self { stats: None, layout: PhantomData }
    }

    pub fn format(&self) -> PreprocessorFormat {
        L::FORMAT
    }

    pub fn is_fitted(&self) -> bool {
        self.stats.is_some()
    }

    /// Fitted statistics, or `NotFitted`.
    pub fn stats(&self) -> PipelineResult<&NormalizationStats> {
        self.stats.as_ref().ok_or(PipelineError::NotFitted)
    }

    /// Learn per-column statistics from `data`.
    pub fn fit(&mut self, data: &L::Data) -> PipelineResult<()> {
        if self.is_fitted() {
            return Err(PipelineError::AlreadyFitted);
        }

        let flat  = L::flatten(data);
        let stats = NormalizationStats::from_columns(&flat);
        tracing::debug!(
            "Fitted {} preprocessor on {} samples x {} columns",
            L::FORMAT,
            flat.nrows(),
            stats.columns()
        );

        self.stats = Some(stats);
        Ok(())
    }

    /// Standardise `data` with the fitted statistics. Returns a new array.
    pub fn preprocess(&self, data: &L::Data) -> PipelineResult<L::Data> {
        let stats    = self.stats()?;
        let mut flat = self.flatten_checked(data, stats)?;

        for (j, mut column) in flat.axis_iter_mut(Axis(1)).enumerate() {
            let (mean, scale) = (stats.mean[j], stats.scale[j]);
            column.mapv_inplace(|v| (v - mean) / scale);
        }
        L::restore(flat, data)
    }

    /// Undo `preprocess` and clip every column to its fitted range.
    pub fn postprocess(&self, data: &L::Data) -> PipelineResult<L::Data> {
        let stats    = self.stats()?;
        let mut flat = self.flatten_checked(data, stats)?;

        for (j, mut column) in flat.axis_iter_mut(Axis(1)).enumerate() {
            let (mean, scale) = (stats.mean[j], stats.scale[j]);
            let (lo, hi)      = (stats.min[j], stats.max[j]);
            column.mapv_inplace(|v| (v * scale + mean).clamp(lo, hi));
        }
        L::restore(flat, data)
    }

    fn flatten_checked(
        &self,
        data:  &L::Data,
        stats: &NormalizationStats,
    ) -> PipelineResult<Array2<f64>> {
        let flat = L::flatten(data);
        if flat.ncols() != stats.columns() {
            return Err(PipelineError::ShapeMismatch {
                expected: stats.columns(),
                actual:   flat.ncols(),
            });
        }
        Ok(flat)
    }
}

impl<L: Layout> Default for Preprocessor<L> {
    fn default() -> Self {
        Self::new()
    }
}
