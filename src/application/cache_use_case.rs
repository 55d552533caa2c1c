// ============================================================
// Layer 2 — CacheUseCase
// ============================================================
// Prepares the id cache of a large monolingual corpus ahead of a
// FileInput run:
//
//   Step 1: Load the vocabulary          (Layer 4 - data)
//   Step 2: Bind the corpus to it        (Layer 4 - data)
//   Step 3: Open / build the id cache    (Layer 6 - infra)
//   Step 4: Rebuild it when forced       (Layer 6 - infra)

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::corpora::Monolingual;
use crate::data::vocabulary::Vocabulary;
use crate::infra::id_cache::{id_path_for, DataQueue, DEFAULT_MAX_SEGMENT_SIZE};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub corpus_path:          String,
    pub vocab_path:           String,
    /// Must match the identifiers of the experiment, since they shift
    /// the ids of the reserved tokens.
    pub language_identifiers: Vec<String>,
    pub force:                bool,
}

/// Outcome of one cache run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheReport {
    pub id_path:  PathBuf,
    pub rebuilt:  bool,
    pub samples:  usize,
    pub segments: usize,
}

pub struct CacheUseCase {
    config: CacheConfig,
}

impl CacheUseCase {
    pub fn new(config: CacheConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<CacheReport> {
        let cfg = &self.config;

        // ── Step 1: Vocabulary ────────────────────────────────────────────────
        let vocabulary = Vocabulary::from_file(&cfg.vocab_path, &cfg.language_identifiers, false, false, false)
            .with_context(|| format!("Failed to load vocabulary '{}'", cfg.vocab_path))?;

        // ── Step 2: Corpus ────────────────────────────────────────────────────
        let corpus = Monolingual::new(&cfg.corpus_path, Some(Arc::new(vocabulary)), false)
            .with_context(|| format!("Failed to open corpus '{}'", cfg.corpus_path))?;

        // ── Step 3: Open or build ─────────────────────────────────────────────
        let existed = id_path_for(Path::new(&cfg.corpus_path), 0).exists();
        let queue = DataQueue::new(&corpus, 0, DEFAULT_MAX_SEGMENT_SIZE)
            .context("Failed to open id cache")?;

        // ── Step 4: Forced rebuild ────────────────────────────────────────────
        let rebuilt = if existed && cfg.force {
            queue.regenerate(&corpus).context("Failed to rebuild id cache")?;
            true
        } else {
            !existed
        };

        let mut samples  = 0;
        let mut segments = 0;
        for segment in queue.generator()? {
            samples += segment?.len();
            segments += 1;
        }

        Ok(CacheReport { id_path: queue.id_path().to_path_buf(), rebuilt, samples, segments })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use crate::test_support::write_file;

    fn config(dir: &std::path::Path, force: bool) -> CacheConfig {
        CacheConfig {
            corpus_path:          dir.join("corpus.txt").to_string_lossy().into_owned(),
            vocab_path:           dir.join("vocab.txt").to_string_lossy().into_owned(),
            language_identifiers: vec!["<en>".to_string()],
            force,
        }
    }

    #[test]
    fn test_builds_then_reuses_then_forces() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "vocab.txt", "2 1\nhello 0\nworld 0\n");
        write_file(dir.path(), "corpus.txt", "hello world\nworld\nhello there\n");

        let first = CacheUseCase::new(config(dir.path(), false)).execute().unwrap();
        assert!(first.rebuilt);
        assert_eq!(first.samples, 3);
        assert_eq!(first.segments, 1);
        assert_eq!(first.id_path, dir.path().join("corpus_id.txt"));

        // "there" is unknown: <UNK> = 2 words + 1 identifier + 2
        let cached = fs::read_to_string(&first.id_path).unwrap();
        assert_eq!(cached.lines().nth(2), Some("0 5 2"));

        let second = CacheUseCase::new(config(dir.path(), false)).execute().unwrap();
        assert!(!second.rebuilt);

        let forced = CacheUseCase::new(config(dir.path(), true)).execute().unwrap();
        assert!(forced.rebuilt);
        assert_eq!(forced.samples, 3);
    }

    #[test]
    fn test_missing_corpus() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "vocab.txt", "1 1\nhello 0\n");
        assert!(CacheUseCase::new(config(dir.path(), false)).execute().is_err());
    }
}
