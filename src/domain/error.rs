// ============================================================
// Layer 3: Pipeline Error Taxonomy
// ============================================================
// Every failure the core can produce, grouped into four kinds:
//
//   Configuration: bad parameters, detected when a value is built
//   State:         preprocessor used in the wrong order
//   Data:          inputs that make an operation undefined
//   Resource:      storage conditions (only ever warnings here)
//
// The application layer wraps these in anyhow::Error with
// extra context (record id, collection name) on the way up.
//
// Reference: thiserror crate documentation
//            Rust Book §9 (Recoverable Errors with Result)

use thiserror::Error;

/// Broad classification of a [`PipelineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    State,
    Data,
}

/// Errors raised by the missing-data simulation and imputation core.
#[derive(Debug, Error, PartialEq)]
pub enum PipelineError {
    /// Missingness proportion outside [0, 1].
    #[error("Invalid missingness proportion {0}: must lie in [0, 1]")]
    InvalidProportion(f64),

    /// Train/validation ratio outside [0, 1].
    #[error("Invalid train ratio {0}: must lie in [0, 1]")]
    InvalidRatio(f64),

    /// Destination collection names the source collection.
    #[error("Destination collection '{0}' must differ from the source collection")]
    SameCollection(String),

    /// Preprocessor format string not in {normal, sequential}.
    #[error("Unsupported preprocessor format '{0}'")]
    UnsupportedFormat(String),

    /// Imputation strategy name not recognised.
    #[error("Unknown imputation strategy '{0}' (expected zero, mean, locf or drop)")]
    UnknownStrategy(String),

    /// Missing marker text could not be parsed.
    #[error("Invalid missing marker '{0}' (expected 'nan' or an integer sentinel)")]
    InvalidMarker(String),

    /// Marker convention does not fit the sample type of the data.
    #[error("Missing marker {marker} cannot be used with {dtype} data")]
    MarkerMismatch {
        marker: String,
        dtype:  &'static str,
    },

    /// Transform requested before `fit`.
    #[error("Preprocessor is not fitted: call fit() before transforming data")]
    NotFitted,

    /// `fit` called a second time on the same preprocessor.
    #[error("Preprocessor is already fitted")]
    AlreadyFitted,

    /// Mean-fill on a sequence with no observed entries.
    #[error("Cannot compute a mean: sequence has no observed values")]
    NoObservedValues,

    /// Record id missing from the store.
    #[error("Record '{id}' not found in collection '{collection}'")]
    RecordNotFound {
        collection: String,
        id:         String,
    },

    /// Collection missing from the store.
    #[error("Collection '{0}' not found")]
    CollectionNotFound(String),

    /// Record id listed twice in a catalog.
    #[error("Record '{0}' is listed more than once in the catalog")]
    DuplicateRecord(String),

    /// Matrix extent does not match what an operation expects
    /// (fitted width, one cut per row).
    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch {
        expected: usize,
        actual:   usize,
    },

    /// Infinite sample, which the record format cannot hold.
    #[error("Record '{id}' holds a non-finite sample {value} at position {index}")]
    NonFiniteSample {
        id:    String,
        index: usize,
        value: f64,
    },
}

impl PipelineError {
    /// Which family of failure this is.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidProportion(_)
            | Self::InvalidRatio(_)
            | Self::SameCollection(_)
            | Self::UnsupportedFormat(_)
            | Self::UnknownStrategy(_)
            | Self::InvalidMarker(_)
            | Self::MarkerMismatch { .. } => ErrorKind::Configuration,

            Self::NotFitted | Self::AlreadyFitted => ErrorKind::State,

            Self::NoObservedValues
            | Self::RecordNotFound { .. }
            | Self::CollectionNotFound(_)
            | Self::DuplicateRecord(_)
            | Self::ShapeMismatch { .. }
            | Self::NonFiniteSample { .. } => ErrorKind::Data,
        }
    }
}

/// Shorthand used throughout the core layers.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_are_distinct() {
        assert_eq!(PipelineError::InvalidRatio(2.0).kind(), ErrorKind::Configuration);
        assert_eq!(PipelineError::SameCollection("raw".into()).kind(), ErrorKind::Configuration);
        assert_eq!(PipelineError::NotFitted.kind(),         ErrorKind::State);
        assert_eq!(PipelineError::NoObservedValues.kind(),  ErrorKind::Data);
    }

    #[test]
    fn test_messages_name_the_problem() {
        let e = PipelineError::RecordNotFound {
            collection: "training2017".into(),
            id:         "A00001".into(),
        };
        assert_eq!(e.to_string(), "Record 'A00001' not found in collection 'training2017'");
        assert!(PipelineError::NotFitted.to_string().contains("not fitted"));
    }
}
