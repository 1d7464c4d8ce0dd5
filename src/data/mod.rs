// ============================================================
// Layer 4: Data Pipeline
// ============================================================
// Everything between raw sequences and normalised matrices.
//
// Generation flow (per record):
//
//   Sequence
//       │
//       ▼
//   missingness     → marks entries missing at random (MCAR)
//       │
//       ▼
//   imputation      → zero / mean / LOCF / drop
//       │
//       ▼
//   Sequence (stored by the infra layer)
//
// Preparation flow (whole collection):
//
//   Vec<Sequence>
//       │
//       ▼
//   rectangularizer → widen to f64, pad with NaN, keep cuts
//       │
//       ▼
//   missingness     → corrupt each row up to its cut
//       │
//       ▼
//   splitter        → seeded train / validation indices
//       │
//       ▼
//   preprocessor    → fit on train, scale train and validation
//
// Each module does exactly one step and is tested on its own.

/// MCAR missing-value simulation
pub mod missingness;

/// Zero, mean, LOCF and drop imputation
pub mod imputation;

/// NaN padding of variable-length sequences
pub mod rectangularizer;

/// Seeded train/validation index partitioning
pub mod splitter;

/// Standard scaling with clipping on the inverse
pub mod preprocessor;
