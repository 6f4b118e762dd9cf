// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// one goal per command (train, evaluate, preprocess).
//
// Rules for this layer:
//   - No ML math or model code here
//   - No clap types (the CLI converts its args first)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern

// The training workflow
pub mod train_use_case;

// Scoring a saved checkpoint
pub mod evaluate_use_case;

// Writing a cleaned copy of the corpus
pub mod preprocess_use_case;
