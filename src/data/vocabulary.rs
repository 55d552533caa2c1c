// ============================================================
// Layer 4 — Vocabulary
// ============================================================
// Word ↔ id lookup tables and an optional embedding matrix, built
// once from a text file:
//
//   2 3                    ← "<num_words> <embedding_dim>"
//   hello 0.1 0.2 0.3      ← "<word> <w1> ... <wD>"
//   world 0.4 0.5 0.6
//
// Id layout (insertion order):
//
//   0 .. N-1         words from the file
//   N .. N+k-1       language identifier tokens (e.g. "<2>")
//   N+k .. N+k+3     <SOS>, <EOS>, <UNK>, <PAD>
//
// Embedding rows: file words take their weights from the file,
// language identifiers get random vectors, reserved tokens are 0.
//
// A Vocabulary is shared through Arc between a corpus, its
// pipelines and the model layer; it is never mutated after
// construction.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use ndarray::Array2;
use rand::Rng;
use serde_json::Value;

use crate::domain::error::{NmtError, Result};

pub const SOS: &str = "<SOS>";
pub const EOS: &str = "<EOS>";
pub const UNK: &str = "<UNK>";
pub const PAD: &str = "<PAD>";

/// Reserved tokens in the order they are appended.
pub const RESERVED_TOKENS: [&str; 4] = [SOS, EOS, UNK, PAD];

/// Ids of the four reserved tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialTokens {
    pub sos: u32,
    pub eos: u32,
    pub unk: u32,
    pub pad: u32,
}

/// Key for a two-way lookup: a word translates to its id and an id
/// translates to its word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    Word(String),
    Id(u32),
}

impl From<&str> for Expression {
    fn from(word: &str) -> Self {
        Expression::Word(word.to_string())
    }
}

impl From<u32> for Expression {
    fn from(id: u32) -> Self {
        Expression::Id(id)
    }
}

/// Configuration values arrive as JSON: only strings and
/// non-negative integers are usable keys.
impl TryFrom<&Value> for Expression {
    type Error = NmtError;

    fn try_from(value: &Value) -> Result<Self> {
        match value {
            Value::String(word) => Ok(Expression::Word(word.clone())),
            Value::Number(n) => n
                .as_u64()
                .and_then(|id| u32::try_from(id).ok())
                .map(Expression::Id)
                .ok_or_else(|| NmtError::InvalidKey(format!("{n} is not a valid id"))),
            other => Err(NmtError::InvalidKey(format!(
                "expression must be a string or an integer, got {other}"
            ))),
        }
    }
}

#[derive(Debug)]
pub struct Vocabulary {
    path:                 PathBuf,
    word_to_id:           HashMap<String, u32>,
    id_to_word:           HashMap<u32, String>,
    word_to_count:        HashMap<String, usize>,
    language_identifiers: Vec<String>,
    vocab_size:           usize,
    embedding_size:       usize,
    embedding_weights:    Option<Array2<f32>>,
    requires_grad:        bool,
    cuda:                 bool,
}

impl Vocabulary {
    /// Build a vocabulary from a vocabulary file.
    ///
    /// * `language_identifiers` - extra tokens appended after the file words
    /// * `provided_embeddings`  - read the weight columns into a matrix
    /// * `fixed_embeddings`     - the embedding built from it is not trainable
    /// * `cuda`                 - device acceleration flag, carried for consumers
    pub fn from_file(
        path:                 impl AsRef<Path>,
        language_identifiers: &[String],
        provided_embeddings:  bool,
        fixed_embeddings:     bool,
        cuda:                 bool,
    ) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| NmtError::io(path, e))?;

        let vocabulary = Self::from_reader(
            BufReader::new(file),
            path,
            language_identifiers,
            provided_embeddings,
            fixed_embeddings,
            cuda,
        )?;

        tracing::info!(
            "Vocabulary '{}' loaded: {} entries, embedding size {}{}",
            path.display(),
            vocabulary.vocab_size,
            vocabulary.embedding_size,
            if provided_embeddings { " (pretrained)" } else { "" },
        );

        Ok(vocabulary)
    }

    /// Same as `from_file`, reading from any buffered source.
    /// `path` is only used in error messages.
    pub fn from_reader<R: BufRead>(
        reader:               R,
        path:                 &Path,
        language_identifiers: &[String],
        provided_embeddings:  bool,
        fixed_embeddings:     bool,
        cuda:                 bool,
    ) -> Result<Self> {
        let mut lines = reader.lines();

        // ── Header: "<num_words> <embedding_dim>" ────────────────────────────
        let header = lines
            .next()
            .ok_or_else(|| NmtError::malformed(path, 1, "missing header line"))?
            .map_err(|e| NmtError::io(path, e))?;
        let (base_size, embedding_size) = parse_header(&header)
            .ok_or_else(|| NmtError::malformed(path, 1, format!("bad header '{header}'")))?;

        let vocab_size = base_size + language_identifiers.len() + RESERVED_TOKENS.len();

        let mut word_to_id    = HashMap::with_capacity(vocab_size);
        let mut word_to_count = HashMap::with_capacity(base_size);
        let mut weights = provided_embeddings.then(|| Array2::<f32>::zeros((vocab_size, embedding_size)));

        // ── Word lines ───────────────────────────────────────────────────────
        let mut next_id = 0usize;
        for (index, line) in lines.enumerate() {
            let line_no = index + 2;
            let line    = line.map_err(|e| NmtError::io(path, e))?;
            let mut fields = line.split_whitespace();

            let Some(word) = fields.next() else { continue };

            if next_id >= base_size {
                return Err(NmtError::malformed(
                    path,
                    line_no,
                    format!("more words than the {base_size} declared in the header"),
                ));
            }
            if RESERVED_TOKENS.contains(&word) || word_to_id.contains_key(word) {
                return Err(NmtError::malformed(path, line_no, format!("duplicate word '{word}'")));
            }

            if let Some(matrix) = weights.as_mut() {
                let row: Vec<f32> = fields
                    .map(|f| f.parse::<f32>())
                    .collect::<std::result::Result<_, _>>()
                    .map_err(|e| NmtError::malformed(path, line_no, format!("bad weight: {e}")))?;

                if row.len() != embedding_size {
                    return Err(NmtError::malformed(
                        path,
                        line_no,
                        format!("expected {embedding_size} weights, found {}", row.len()),
                    ));
                }
                for (col, value) in row.into_iter().enumerate() {
                    matrix[[next_id, col]] = value;
                }
            }

            word_to_id.insert(word.to_string(), next_id as u32);
            word_to_count.insert(word.to_string(), 0);
            next_id += 1;
        }

        if next_id != base_size {
            return Err(NmtError::malformed(
                path,
                1,
                format!("header declares {base_size} words, file lists {next_id}"),
            ));
        }

        // ── Language identifiers, then reserved tokens ───────────────────────
        for identifier in language_identifiers {
            if word_to_id.contains_key(identifier) {
                return Err(NmtError::configuration(
                    "Experiment:language_identifiers",
                    format!(
                        "language identifier '{identifier}' collides with an entry of '{}'",
                        path.display()
                    ),
                ));
            }
            let id = word_to_id.len() as u32;
            word_to_id.insert(identifier.clone(), id);
        }
        for token in RESERVED_TOKENS {
            let id = word_to_id.len() as u32;
            word_to_id.insert(token.to_string(), id);
        }

        // Reserved rows stay zero; identifier rows are random.
        if let Some(matrix) = weights.as_mut() {
            let mut rng = rand::thread_rng();
            for row in base_size..base_size + language_identifiers.len() {
                for col in 0..embedding_size {
                    matrix[[row, col]] = rng.gen::<f32>();
                }
            }
        }

        let id_to_word = word_to_id.iter().map(|(w, &id)| (id, w.clone())).collect();

        Ok(Self {
            path: path.to_path_buf(),
            word_to_id,
            id_to_word,
            word_to_count,
            language_identifiers: language_identifiers.to_vec(),
            vocab_size,
            embedding_size,
            embedding_weights: weights,
            requires_grad: !fixed_embeddings,
            cuda,
        })
    }

    /// Translate a word to its id or an id to its word.
    pub fn lookup(&self, expression: &Expression) -> Result<Expression> {
        match expression {
            Expression::Word(word) => self.word_to_id(word).map(Expression::Id),
            Expression::Id(id) => self.id_to_word(*id).map(|w| Expression::Word(w.to_string())),
        }
    }

    /// Lookup driven by a configuration value; non string/integer keys
    /// fail with InvalidKey.
    pub fn lookup_value(&self, value: &Value) -> Result<Expression> {
        self.lookup(&Expression::try_from(value)?)
    }

    pub fn word_to_id(&self, word: &str) -> Result<u32> {
        self.word_to_id
            .get(word)
            .copied()
            .ok_or_else(|| NmtError::InvalidKey(format!("word '{word}' is not in the vocabulary")))
    }

    pub fn id_to_word(&self, id: u32) -> Result<&str> {
        self.id_to_word
            .get(&id)
            .map(String::as_str)
            .ok_or_else(|| NmtError::InvalidKey(format!("id {id} is not in the vocabulary")))
    }

    pub fn contains(&self, word: &str) -> bool {
        self.word_to_id.contains_key(word)
    }

    pub fn word_count(&self, word: &str) -> Option<usize> {
        self.word_to_count.get(word).copied()
    }

    /// Whitespace-tokenise a sentence; unknown words map to `<UNK>`.
    pub fn encode(&self, sentence: &str) -> Vec<u32> {
        let unk = self.tokens().unk;
        sentence
            .split_whitespace()
            .map(|word| self.word_to_id.get(word).copied().unwrap_or(unk))
            .collect()
    }

    /// Map ids back to words. Unknown ids fail with InvalidKey.
    pub fn decode(&self, ids: impl IntoIterator<Item = u32>) -> Result<Vec<&str>> {
        ids.into_iter().map(|id| self.id_to_word(id)).collect()
    }

    pub fn tokens(&self) -> SpecialTokens {
        // The four reserved tokens are always the last ids.
        let base = (self.vocab_size - RESERVED_TOKENS.len()) as u32;
        SpecialTokens {
            sos: base,
            eos: base + 1,
            unk: base + 2,
            pad: base + 3,
        }
    }

    /// Id of a language identifier token such as "<2>".
    pub fn language_token(&self, identifier: &str) -> Result<u32> {
        if !self.language_identifiers.iter().any(|l| l == identifier) {
            return Err(NmtError::InvalidKey(format!(
                "'{identifier}' is not a language identifier"
            )));
        }
        self.word_to_id(identifier)
    }

    /// Size reported to the model layer: the raw entry count minus one.
    pub fn vocab_size(&self) -> usize {
        self.vocab_size - 1
    }

    /// Number of entries actually stored (words + identifiers + reserved).
    pub fn raw_vocab_size(&self) -> usize {
        self.vocab_size
    }

    pub fn embedding_size(&self) -> usize {
        self.embedding_size
    }

    /// The (raw_vocab_size, embedding_size) matrix, when embeddings
    /// were provided in the vocabulary file.
    pub fn embedding_weights(&self) -> Option<&Array2<f32>> {
        self.embedding_weights.as_ref()
    }

    pub fn requires_grad(&self) -> bool {
        self.requires_grad
    }

    pub fn cuda(&self) -> bool {
        self.cuda
    }

    pub fn language_identifiers(&self) -> &[String] {
        &self.language_identifiers
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn parse_header(line: &str) -> Option<(usize, usize)> {
    let mut fields = line.split_whitespace();
    let words = fields.next()?.parse().ok()?;
    let dims  = fields.next()?.parse().ok()?;
    fields.next().is_none().then_some((words, dims))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::write_file;

    const TWO_WORDS: &str = "2 3\nhello 0.1 0.2 0.3\nworld 0.4 0.5 0.6\n";

    fn identifiers(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_end_to_end_layout() {
        let dir  = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "vocab.txt", TWO_WORDS);
        let v    = Vocabulary::from_file(&path, &identifiers(&["<2>"]), true, true, false).unwrap();

        let expected = [
            ("hello", 0), ("world", 1), ("<2>", 2),
            ("<SOS>", 3), ("<EOS>", 4), ("<UNK>", 5), ("<PAD>", 6),
        ];
        for (word, id) in expected {
            assert_eq!(v.word_to_id(word).unwrap(), id, "{word}");
        }
        assert_eq!(v.raw_vocab_size(), 7);
        assert_eq!(v.vocab_size(), 6);
        assert!(!v.requires_grad());

        let weights = v.embedding_weights().unwrap();
        assert_eq!(weights.dim(), (7, 3));
        assert!((weights[[1, 2]] - 0.6).abs() < 1e-6);
        for row in 3..7 {
            assert!(weights.row(row).iter().all(|&x| x == 0.0), "row {row} should be zero");
        }
        assert!(weights.row(2).iter().all(|&x| (0.0..1.0).contains(&x)));
    }

    #[test]
    fn test_size_is_words_plus_identifiers_plus_reserved() {
        let dir  = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "vocab.txt", "3 1\na 1\nb 2\nc 3\n");

        for k in 0..4 {
            let ids: Vec<String> = (0..k).map(|i| format!("<L{i}>")).collect();
            let v = Vocabulary::from_file(&path, &ids, false, false, false).unwrap();
            assert_eq!(v.raw_vocab_size(), 3 + k + 4);
            assert_eq!(v.vocab_size(), 3 + k + 3);
        }
    }

    #[test]
    fn test_reserved_tokens_take_highest_ids() {
        let dir  = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "vocab.txt", TWO_WORDS);
        let v    = Vocabulary::from_file(&path, &identifiers(&["<en>", "<fr>"]), false, false, false).unwrap();

        let t = v.tokens();
        let top = v.raw_vocab_size() as u32;
        assert_eq!((t.sos, t.eos, t.unk, t.pad), (top - 4, top - 3, top - 2, top - 1));
        assert_eq!(v.language_token("<en>").unwrap(), 2);
        assert_eq!(v.language_token("<fr>").unwrap(), 3);
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let dir  = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "vocab.txt", TWO_WORDS);
        let v    = Vocabulary::from_file(&path, &[], false, false, false).unwrap();

        let ids = v.encode("hello world hello");
        assert_eq!(v.decode(ids).unwrap(), vec!["hello", "world", "hello"]);

        let ids = v.encode("hello stranger");
        assert_eq!(ids, vec![0, v.tokens().unk]);
        assert_eq!(v.decode(ids).unwrap(), vec!["hello", "<UNK>"]);
    }

    #[test]
    fn test_lookup_both_directions() {
        let dir  = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "vocab.txt", TWO_WORDS);
        let v    = Vocabulary::from_file(&path, &[], false, false, false).unwrap();

        assert_eq!(v.lookup(&"world".into()).unwrap(), Expression::Id(1));
        assert_eq!(v.lookup(&1u32.into()).unwrap(), Expression::Word("world".into()));
        assert_eq!(v.lookup_value(&serde_json::json!(0)).unwrap(), Expression::Word("hello".into()));
    }

    #[test]
    fn test_invalid_keys() {
        let dir  = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "vocab.txt", TWO_WORDS);
        let v    = Vocabulary::from_file(&path, &[], false, false, false).unwrap();

        assert!(matches!(v.lookup(&"missing".into()), Err(NmtError::InvalidKey(_))));
        assert!(matches!(v.lookup(&99u32.into()), Err(NmtError::InvalidKey(_))));
        assert!(matches!(v.lookup_value(&serde_json::json!(1.5)), Err(NmtError::InvalidKey(_))));
        assert!(matches!(v.lookup_value(&serde_json::json!(true)), Err(NmtError::InvalidKey(_))));
        assert!(matches!(v.lookup_value(&serde_json::json!(-1)), Err(NmtError::InvalidKey(_))));
    }

    #[test]
    fn test_no_weights_unless_provided() {
        let dir  = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "vocab.txt", TWO_WORDS);
        let v    = Vocabulary::from_file(&path, &[], false, false, false).unwrap();
        assert!(v.embedding_weights().is_none());
        assert!(v.requires_grad());
        assert_eq!(v.embedding_size(), 3);
        assert_eq!(v.word_count("hello"), Some(0));
    }

    #[test]
    fn test_malformed_files() {
        let dir = tempfile::tempdir().unwrap();

        let bad_header = write_file(dir.path(), "a.txt", "two 3\nhello 1 2 3\n");
        assert!(matches!(
            Vocabulary::from_file(&bad_header, &[], false, false, false),
            Err(NmtError::Malformed { line: 1, .. })
        ));

        let short_row = write_file(dir.path(), "b.txt", "1 3\nhello 0.1 0.2\n");
        assert!(matches!(
            Vocabulary::from_file(&short_row, &[], true, false, false),
            Err(NmtError::Malformed { line: 2, .. })
        ));

        let miscounted = write_file(dir.path(), "c.txt", "3 1\nhello 1\n");
        assert!(Vocabulary::from_file(&miscounted, &[], false, false, false).is_err());

        let missing = dir.path().join("nope.txt");
        assert!(matches!(
            Vocabulary::from_file(&missing, &[], false, false, false),
            Err(NmtError::Io { .. })
        ));
    }

    #[test]
    fn test_identifier_collision_is_configuration_error() {
        let dir  = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "vocab.txt", TWO_WORDS);
        let err  = Vocabulary::from_file(&path, &identifiers(&["hello"]), false, false, false)
            .unwrap_err();
        assert!(err.is_configuration());
    }
}
