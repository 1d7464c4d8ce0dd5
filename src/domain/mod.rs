// ============================================================
// Layer 3: Domain Layer
// ============================================================
// Plain Rust types and traits describing what the pipeline
// works on. No file I/O, no CLI types.
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Error taxonomy shared by every core module
pub mod error;

// Sequence, Sample and the missing-value marker
pub mod sequence;

// Storage and transform abstractions
pub mod traits;
