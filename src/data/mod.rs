// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from text files to fixed-shape id batches.
//
//   vocabulary file
//       │
//       ▼
//   Vocabulary      → word ↔ id tables, optional embedding matrix
//       │
//   corpus file     │
//       │           │
//       ▼           ▼
//   Corpus          → Monolingual / Parallel lines
//       │
//       ▼
//   Padding         → encode + per-segment preparation
//       │
//       ▼
//   InputPipeline   → segment, shuffle, batch (MemoryInput / FileInput)
//       │
//       ▼
//   Language        → identifier + vocabulary + train/dev/test pipelines
//       │
//       ▼
//   TensorBatcher   → burn tensors for a trainable unit

/// Word ↔ id tables built from a vocabulary file
pub mod vocabulary;

/// Monolingual and parallel corpora
pub mod corpora;

/// PostPadding and PrePadding strategies
pub mod padding;

/// Segment shuffling and full-batch slicing
pub mod segment;

/// MemoryInput and FileInput pipelines
pub mod input_pipeline;

/// A language with its train/dev/test pipelines
pub mod language;

/// Converts id batches into burn tensors
pub mod batcher;
