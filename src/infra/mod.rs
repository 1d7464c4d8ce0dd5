// ============================================================
// Layer 6: Infrastructure Layer
// ============================================================
// Everything that touches the filesystem:
//
//   record_store.rs: Collections of records on disk.
//                     Implements RecordCatalog and RecordStore
//                     from the domain layer: RECORDS catalogs,
//                     JSON record files, verbatim header copies.
//
//   artifacts.rs:    Pretty JSON outputs of a run: configs,
//                     prepared splits, fitted statistics.
//
// The core layers only see the domain traits, so another
// storage backend can be dropped in without touching them.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)

/// Directory-backed record catalog and store
pub mod record_store;

/// JSON artifact persistence
pub mod artifacts;
