// ============================================================
// Layer 3 — Core Traits (Abstract Contracts)
// ============================================================
// The abstract contracts of the data pipeline. Each has several
// concrete variants in the data layer, picked by name from the
// configuration document:
//
//   Corpus         — Monolingual, Parallel
//   Padding        — PostPadding, PrePadding
//   InputPipeline  — MemoryInput, FileInput
//
// The resolver only ever sees these as trait objects, so a new
// variant is one more impl plus one registry entry. All three are
// Send + Sync so a built Language can be shared across threads.
//
// Trainable units (encoders, decoders, models) carry burn types
// and live with the rest of the burn code in `ml::unit`.

use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;

use ndarray::Array2;

use crate::data::vocabulary::Vocabulary;
use crate::domain::error::{NmtError, Result};
use crate::domain::sample::{Batch, EncodedSample, Sample};

// ─── Corpus ───────────────────────────────────────────────────────────────────
/// A file-backed dataset bound to one or more shared vocabularies.
///
/// Implementations:
///   - Monolingual → one sentence per line
///   - Parallel    → one sentence per language per line, separator-joined
pub trait Corpus: Debug + Send + Sync {
    /// Registry name of the concrete variant.
    fn kind(&self) -> &'static str;

    fn data_path(&self) -> &Path;

    /// Load the file into memory. Every call reloads from disk.
    fn initialize_corpus(&mut self) -> Result<()>;

    /// The loaded samples; UninitializedState before `initialize_corpus`.
    fn data(&self) -> Result<&[Sample]>;

    /// The primary (source) vocabulary.
    fn vocabulary(&self) -> Result<&Arc<Vocabulary>>;

    /// Number of languages per line.
    fn sides(&self) -> usize;

    /// Vocabulary used to encode one side of the corpus.
    fn side_vocabulary(&self, side: usize) -> Result<&Arc<Vocabulary>>;

    /// Pick one side out of a raw line read straight from the file.
    /// None when the line has no such side.
    fn extract_side<'a>(&self, line: &'a str, side: usize) -> Option<&'a str>;

    /// Device acceleration flag resolved from the experiment policy.
    fn cuda(&self) -> bool;

    fn vocab_size(&self) -> Result<usize> {
        Ok(self.vocabulary()?.vocab_size())
    }

    fn embedding_size(&self) -> Result<usize> {
        Ok(self.vocabulary()?.embedding_size())
    }

    /// Text of one side of every loaded sample, in file order.
    fn text_lines(&self, side: usize) -> Result<Vec<&str>> {
        self.data()?
            .iter()
            .enumerate()
            .map(|(index, sample)| {
                sample.side(side).ok_or_else(|| {
                    NmtError::malformed(
                        self.data_path(),
                        index + 1,
                        format!("sample has no side {side}"),
                    )
                })
            })
            .collect()
    }
}

// ─── Padding ──────────────────────────────────────────────────────────────────
/// Policy for equalising sequence lengths.
///
/// Implementations:
///   - PostPadding → pad per batch, to the longest row of the batch
///   - PrePadding  → pad per segment at conversion time
pub trait Padding: Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Vocabulary supplying token ids and the `<PAD>` id.
    fn vocabulary(&self) -> &Arc<Vocabulary>;

    fn max_segment_size(&self) -> usize;

    /// Encode raw lines segment by segment, applying `prepare_segment`
    /// to each chunk of `max_segment_size` samples.
    fn convert(&self, lines: &[&str]) -> Vec<EncodedSample> {
        let vocabulary = self.vocabulary();
        let mut converted = Vec::with_capacity(lines.len());

        for chunk in lines.chunks(self.max_segment_size().max(1)) {
            let segment = chunk
                .iter()
                .map(|line| EncodedSample::new(vocabulary.encode(line)))
                .collect();
            converted.extend(self.prepare_segment(segment));
        }

        converted
    }

    /// Segment-level step applied to freshly encoded samples.
    fn prepare_segment(&self, segment: Vec<EncodedSample>) -> Vec<EncodedSample>;

    /// Turn a slice of a segment into a fixed-shape batch sorted by
    /// true length, longest first.
    fn create_batch(&self, samples: Vec<EncodedSample>) -> Result<Batch>;
}

/// Boxed stream of batches returned by `InputPipeline::batch_generator`.
pub type BatchIter<'a> = Box<dyn Iterator<Item = Result<Batch>> + 'a>;

// ─── InputPipeline ────────────────────────────────────────────────────────────
/// Produces shuffled, length-segmented, padded mini-batches.
///
/// Implementations:
///   - MemoryInput → the whole corpus converted once and kept in memory
///   - FileInput   → segments streamed from an on-disk id cache
pub trait InputPipeline: Debug + Send + Sync {
    fn kind(&self) -> &'static str;

    /// A fresh, full pass over the data. Each call starts from the beginning.
    fn batch_generator(&self) -> BatchIter<'_>;

    fn corpora(&self) -> &dyn Corpus;

    /// Vocabulary of the side this pipeline reads.
    fn vocabulary(&self) -> Result<&Arc<Vocabulary>>;

    fn batch_size(&self) -> usize;

    fn max_segment_size(&self) -> usize;

    fn padding_type(&self) -> &'static str;

    /// Render named id matrices (same row count) back to text, one block
    /// per row index:
    ///
    /// ```text
    /// {0}:
    /// > [inputs]:   the   cat   <PAD>
    /// > [targets]:  le    chat  <PAD>
    /// ```
    fn render_validation_format(&self, named: &[(&str, &Array2<u32>)]) -> Result<String> {
        let vocabulary = self.vocabulary()?;
        let rows = named.iter().map(|(_, ids)| ids.nrows()).min().unwrap_or(0);
        let mut out = String::new();

        for index in 0..rows {
            out.push_str(&format!("{{{index}}}:\n"));
            for (name, ids) in named {
                let words = vocabulary.decode(ids.row(index).iter().copied())?;
                out.push_str(&format!("> [{name}]:\t{}\n", words.join("\t")));
            }
            out.push('\n');
        }

        Ok(out)
    }

    /// Diagnostic rendering of a single batch.
    fn render_batch(&self, batch: &Batch) -> Result<String> {
        self.render_validation_format(&[("ids", &batch.ids)])
    }
}
