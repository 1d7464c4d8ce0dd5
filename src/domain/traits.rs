// ============================================================
// Layer 3: Core Traits (Abstractions)
// ============================================================
// The pipeline core never touches the filesystem. It talks to
// storage through two traits and to transforms through a third:
//
//   RecordCatalog     → enumerates record ids in a collection
//   RecordStore       → loads / stores sequences and metadata
//   SequenceTransform → "Sequence in, Sequence out", implemented
//                       by every imputation strategy and by the
//                       missingness generator
//
// Implementations:
//   - FileRecordStore (infra) implements both storage traits
//   - ImputeStrategy and MissingnessGenerator (data) implement
//     SequenceTransform
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::{error::PipelineResult, sequence::Sequence};

// ─── RecordCatalog ────────────────────────────────────────────────────────────
/// Anything that can list the records of a collection.
pub trait RecordCatalog {
    /// Record ids in catalog order, without duplicates.
    fn record_ids(&self, collection: &str) -> Result<Vec<String>>;
}

// ─── RecordStore ──────────────────────────────────────────────────────────────
/// Anything that can persist sequences grouped into named collections.
///
/// Each call is atomic from the caller's point of view: a failed
/// `store` leaves no partially written record behind.
pub trait RecordStore {
    /// Whether `collection` exists.
    fn collection_exists(&self, collection: &str) -> bool;

    /// Create `collection`. Returns `false` when it already existed.
    fn create_collection(&self, collection: &str) -> Result<bool>;

    /// Load one record. Fails with `RecordNotFound` when absent.
    fn load(&self, collection: &str, id: &str) -> Result<Sequence>;

    /// Store one record, replacing any previous version.
    fn store(&self, collection: &str, id: &str, sequence: &Sequence) -> Result<()>;

    /// Copy non-numeric companion data (e.g. headers) verbatim.
    fn copy_metadata(&self, id: &str, source: &str, dest: &str) -> Result<()>;

    /// Replace the catalog of `collection` with `ids`.
    fn write_catalog(&self, collection: &str, ids: &[String]) -> Result<()>;
}

// ─── SequenceTransform ────────────────────────────────────────────────────────
/// One step that turns a sequence into a new sequence.
///
/// `&mut self` lets stateful transforms (the missingness generator
/// owns its random stream) share the same interface as pure ones.
pub trait SequenceTransform {
    /// Short name for logs and saved configs.
    fn name(&self) -> &'static str;

    /// Produce a new sequence. The input is never modified.
    fn apply(&mut self, sequence: &Sequence) -> PipelineResult<Sequence>;
}
