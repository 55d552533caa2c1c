// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types and traits that define what the system talks
// about: samples, batches, the error taxonomy and the abstract
// contracts (corpus, padding, input pipeline).
//
// Rules for this layer:
//   - NO burn types
//   - NO file I/O
//   - NO knowledge of the configuration document

/// Typed error taxonomy shared by every library layer
pub mod error;

/// Sample, EncodedSample and Batch
pub mod sample;

/// Abstract contracts implemented by the data layer
pub mod traits;
