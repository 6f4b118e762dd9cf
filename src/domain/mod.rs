// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust structs and traits describing the classification
// problem itself.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O or network calls
//   - Only plain Rust structs, enums, and traits
//
// Everything in here can be unit tested without a GPU and
// without any model weights on disk.

// A labelled social-media post
pub mod post;

// The two prediction tasks and their class names
pub mod task;

// Precision / recall / F1 reporting
pub mod report;

// Core abstractions (traits) that other layers implement
pub mod traits;
