// ============================================================
// Layer 2: InspectUseCase
// ============================================================
// Walks a collection and reports, for each record, its length
// and how many entries carry the missing marker. Handy for
// checking a corrupted or imputed collection before using it.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::domain::{
    sequence::MissingMarker,
    traits::{RecordCatalog, RecordStore},
};

/// Length and missing count of one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordSummary {
    pub id:      String,
    pub dtype:   &'static str,
    pub length:  usize,
    pub missing: usize,
}

/// Per-record summaries plus collection totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CollectionSummary {
    pub records:       Vec<RecordSummary>,
    pub total_samples: usize,
    pub total_missing: usize,
}

impl CollectionSummary {
    /// Share of all samples that are missing (0 for an empty collection).
    pub fn missing_rate(&self) -> f64 {
        if self.total_samples == 0 {
            0.0
        } else {
            self.total_missing as f64 / self.total_samples as f64
        }
    }
}

pub struct InspectUseCase<S> {
    store: S,
}

impl<S: RecordCatalog + RecordStore> InspectUseCase<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn summarize(&self, collection: &str, marker: MissingMarker) -> Result<CollectionSummary> {
        let mut summary = CollectionSummary::default();

        for id in self.store.record_ids(collection)? {
            let seq     = self.store.load(collection, &id)?;
            let missing = seq
                .count_missing(marker)
                .with_context(|| format!("Inspecting record '{id}'"))?;

            summary.total_samples += seq.len();
            summary.total_missing += missing;
            summary.records.push(RecordSummary {
                id,
                dtype: seq.dtype(),
                length: seq.len(),
                missing,
            });
        }

        tracing::debug!(
            "Inspected {} records in '{}'",
            summary.records.len(),
            collection
        );
        Ok(summary)
    }
}
