// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// File and network concerns shared by the other layers:
//
//   hub.rs             — Resolves model ids to local files,
//                        downloading from the Hugging Face Hub
//                        when the source isn't a local directory.
//
//   tokenizer_store.rs — Builds the tokenizer from the resolved
//                        files and keeps a copy next to the
//                        checkpoints for evaluation.
//
//   checkpoint.rs      — Model records via Burn's CompactRecorder,
//                        plus the JSON configs and epoch pointers
//                        needed to rebuild the model.
//
//   metrics.rs         — Per-epoch loss / accuracy / F1 rows in
//                        metrics.csv.
//
// Reference: Burn Book §5 (Checkpointing)

/// Hugging Face Hub / local directory model resolution
pub mod hub;

/// Tokenizer building, saving, and loading
pub mod tokenizer_store;

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;
