// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Workflows the CLI dispatches to. Each one coordinates the
// component, data and infra layers and hands plain results back
// to Layer 1 for printing.
//
// Rules for this layer:
//   - No printing (that's Layer 1)
//   - No parsing of files or configuration trees (Layers 4-6)
//   - anyhow::Result with context at every step

/// Resolve every language (and the model) of an experiment
pub mod assemble_use_case;

/// Render the first batches of one language split
pub mod inspect_use_case;

/// Build or rebuild the id cache of a corpus
pub mod cache_use_case;
