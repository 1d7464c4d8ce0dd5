// ============================================================
// Layer 2: Application / Use Cases
// ============================================================
// Orchestrates the other layers to accomplish one goal per
// CLI command.
//
// Rules for this layer:
//   - No numeric algorithms here (that's Layer 4)
//   - No printing here (that's Layer 1)
//   - Storage only through the domain traits or Layer 6
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Collection → collection corruption or imputation
pub mod generate_use_case;

// Rectangularize, corrupt, split and normalise for modelling
pub mod prepare_use_case;

// Per-record length / missing-count report
pub mod inspect_use_case;
