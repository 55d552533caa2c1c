// ============================================================
// Layer 4 — Corpora
// ============================================================
// File-backed datasets. Two variants:
//
//   Monolingual  — one sentence per line
//   Parallel     — one line holds the same sentence in several
//                  languages, joined by a separator:
//                    "hello world ||| bonjour le monde"
//
// A corpus only checks at construction that its file exists; the
// file is read by `initialize_corpus`, which the in-memory pipeline
// calls and the file-backed pipeline skips (it streams through the
// id cache instead).
//
// Vocabularies are shared: the corpus holds an Arc to the same
// instance the experiment's Language component owns.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::data::vocabulary::Vocabulary;
use crate::domain::error::{NmtError, Result};
use crate::domain::sample::Sample;
use crate::domain::traits::Corpus;

/// Read every line of `path`, newline stripped.
fn read_lines(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).map_err(|e| NmtError::io(path, e))?;
    BufReader::new(file)
        .lines()
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| NmtError::io(path, e))
}

fn require_file(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(NmtError::MissingDataFile { path: path.to_path_buf() })
    }
}

// ─── Monolingual ──────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct Monolingual {
    data_path:  PathBuf,
    vocabulary: Option<Arc<Vocabulary>>,
    cuda:       bool,
    data:       Option<Vec<Sample>>,
}

impl Monolingual {
    pub fn new(
        data_path:  impl Into<PathBuf>,
        vocabulary: Option<Arc<Vocabulary>>,
        cuda:       bool,
    ) -> Result<Self> {
        let data_path = data_path.into();
        require_file(&data_path)?;

        Ok(Self { data_path, vocabulary, cuda, data: None })
    }
}

impl Corpus for Monolingual {
    fn kind(&self) -> &'static str {
        "Monolingual"
    }

    fn data_path(&self) -> &Path {
        &self.data_path
    }

    fn initialize_corpus(&mut self) -> Result<()> {
        let samples: Vec<Sample> = read_lines(&self.data_path)?
            .into_iter()
            .map(Sample::Monolingual)
            .collect();

        if samples.is_empty() {
            return Err(NmtError::EmptyCorpus { path: self.data_path.clone() });
        }

        tracing::debug!("Loaded {} lines from '{}'", samples.len(), self.data_path.display());
        self.data = Some(samples);
        Ok(())
    }

    fn data(&self) -> Result<&[Sample]> {
        self.data
            .as_deref()
            .ok_or_else(|| NmtError::uninitialized(format!("corpus '{}'", self.data_path.display())))
    }

    fn vocabulary(&self) -> Result<&Arc<Vocabulary>> {
        self.vocabulary
            .as_ref()
            .ok_or_else(|| NmtError::UnresolvedVocabulary { path: self.data_path.clone() })
    }

    fn sides(&self) -> usize {
        1
    }

    fn side_vocabulary(&self, side: usize) -> Result<&Arc<Vocabulary>> {
        if side != 0 {
            return Err(NmtError::configuration(
                "side",
                format!("monolingual corpus '{}' has no side {side}", self.data_path.display()),
            ));
        }
        self.vocabulary()
    }

    fn extract_side<'a>(&self, line: &'a str, side: usize) -> Option<&'a str> {
        (side == 0).then_some(line)
    }

    fn cuda(&self) -> bool {
        self.cuda
    }
}

// ─── Parallel ─────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct Parallel {
    data_path:    PathBuf,
    separator:    String,
    /// `[vocabulary, second_vocabulary]`, whichever were resolved.
    vocabularies: Vec<Arc<Vocabulary>>,
    cuda:         bool,
    data:         Option<Vec<Sample>>,
}

impl Parallel {
    pub fn new(
        data_path:         impl Into<PathBuf>,
        separator:         impl Into<String>,
        vocabulary:        Option<Arc<Vocabulary>>,
        second_vocabulary: Option<Arc<Vocabulary>>,
        cuda:              bool,
    ) -> Result<Self> {
        let data_path = data_path.into();
        require_file(&data_path)?;

        let separator = separator.into();
        if separator.is_empty() {
            return Err(NmtError::configuration("separator", "separator must not be empty"));
        }

        Ok(Self {
            data_path,
            separator,
            vocabularies: vocabulary.into_iter().chain(second_vocabulary).collect(),
            cuda,
            data: None,
        })
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    pub fn source_vocabulary(&self) -> Result<&Arc<Vocabulary>> {
        self.vocabularies
            .first()
            .ok_or_else(|| NmtError::UnresolvedVocabulary { path: self.data_path.clone() })
    }

    pub fn target_vocabulary(&self) -> Result<&Arc<Vocabulary>> {
        self.vocabularies
            .last()
            .ok_or_else(|| NmtError::UnresolvedVocabulary { path: self.data_path.clone() })
    }

    pub fn source_vocab_size(&self) -> Result<usize> {
        Ok(self.source_vocabulary()?.vocab_size())
    }

    pub fn target_vocab_size(&self) -> Result<usize> {
        Ok(self.target_vocabulary()?.vocab_size())
    }
}

impl Corpus for Parallel {
    fn kind(&self) -> &'static str {
        "Parallel"
    }

    fn data_path(&self) -> &Path {
        &self.data_path
    }

    fn initialize_corpus(&mut self) -> Result<()> {
        let samples: Vec<Sample> = read_lines(&self.data_path)?
            .iter()
            .map(|line| {
                Sample::Parallel(line.split(self.separator.as_str()).map(str::to_string).collect())
            })
            .collect();

        if samples.is_empty() {
            return Err(NmtError::EmptyCorpus { path: self.data_path.clone() });
        }

        tracing::debug!(
            "Loaded {} sentence pairs from '{}'",
            samples.len(),
            self.data_path.display()
        );
        self.data = Some(samples);
        Ok(())
    }

    fn data(&self) -> Result<&[Sample]> {
        self.data
            .as_deref()
            .ok_or_else(|| NmtError::uninitialized(format!("corpus '{}'", self.data_path.display())))
    }

    fn vocabulary(&self) -> Result<&Arc<Vocabulary>> {
        self.source_vocabulary()
    }

    fn sides(&self) -> usize {
        self.vocabularies.len().max(2)
    }

    /// Side 0 reads with the source vocabulary, every later side
    /// with the target vocabulary.
    fn side_vocabulary(&self, side: usize) -> Result<&Arc<Vocabulary>> {
        if side >= self.sides() {
            return Err(NmtError::configuration(
                "side",
                format!("parallel corpus '{}' has no side {side}", self.data_path.display()),
            ));
        }
        match self.vocabularies.get(side) {
            Some(vocabulary) => Ok(vocabulary),
            None => self.target_vocabulary(),
        }
    }

    fn extract_side<'a>(&self, line: &'a str, side: usize) -> Option<&'a str> {
        line.split(self.separator.as_str()).nth(side)
    }

    fn cuda(&self) -> bool {
        self.cuda
    }
}
