// ============================================================
// Layer 7 — ML Layer (Burn)
// ============================================================
// The seam between the data pipeline and neural code. All burn
// model code lives here:
//
//   unit.rs       — TrainableUnit contract and its lifecycle
//                   (init_parameters, init_optimizer, forward,
//                   step, zero_grad)
//
//   embedding.rs  — burn Embedding sized and filled from a
//                   Vocabulary, plus EmbeddingUnit, the smallest
//                   concrete encoder/decoder
//
//   seq2seq.rs    — SeqToSeq, an encoder and a decoder unit
//                   composed into one model
//
// Architectures beyond embeddings are supplied by the embedding
// application through `Registry::register`.

/// Trainable unit contract
pub mod unit;

/// Vocabulary-backed embeddings
pub mod embedding;

/// Encoder/decoder composition
pub mod seq2seq;
