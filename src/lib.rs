// ============================================================
// nmt-assembler
// ============================================================
// Configuration-driven assembly of the data side of a seq2seq
// NMT experiment:
//
//   Layer 1  cli          — clap commands
//   Layer 2  application  — assemble / inspect / cache workflows
//   Layer 3  domain       — errors, samples, abstract contracts
//   Layer 4  data         — vocabularies, corpora, padding, pipelines
//   Layer 5  component    — registry and resolver
//   Layer 6  infra        — on-disk id cache
//   Layer 7  ml           — burn-backed trainable units

pub mod cli;
pub mod application;
pub mod domain;
pub mod data;
pub mod component;
pub mod infra;
pub mod ml;

#[cfg(test)]
mod test_support;
