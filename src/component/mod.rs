// ============================================================
// Layer 5 — Component Resolution
// ============================================================
// Turns the JSON configuration document into live components.
//
//   config.json
//       │
//       ▼
//   ConfigDocument  → parsed tree, addressed by ConfigPath
//       │
//       ▼
//   Resolver        → looks up each tagged node in the Registry,
//       │             fills its Interface (locals, references,
//       │             children), calls the constructor
//       ▼
//   Component       → Vocabulary / Language / Corpus / Pipeline / Unit

/// Paths and the configuration document
pub mod config;

/// Reference path syntax (`Experiment:Policy:cuda`, `:Vocabulary$`)
pub mod path;

/// One named input of a component and where it comes from
pub mod parameter;

/// Interface declarations and abstract contracts
pub mod interface;

/// Resolved values and constructor arguments
pub mod value;

/// Name → variant table
pub mod registry;

/// Variants shipped with the crate
pub mod builtins;

/// Dependency-ordered construction with cycle detection
pub mod resolver;
