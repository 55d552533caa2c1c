// ============================================================
// Layer 4 — Input Pipelines
// ============================================================
// Turn a corpus into a stream of padded mini-batches.
//
//   MemoryInput
//     corpus lines ──convert──▶ Vec<EncodedSample> (kept in memory)
//     per pass:  segment ─▶ shuffle ─▶ full batches
//
//   FileInput
//     corpus file ──DataQueue──▶ id cache on disk
//     per pass:  cache segment ─▶ re-segment ─▶ prepare ─▶ shuffle ─▶ full batches
//
// Every call to `batch_generator()` starts a new, independent pass.
// A pipeline reads one side of its corpus (`side`, default 0), so a
// parallel corpus needs one pipeline per language it feeds.

use std::sync::Arc;

use crate::data::padding;
use crate::data::segment::{full_batches, shuffle_segment, Shuffler};
use crate::data::vocabulary::Vocabulary;
use crate::domain::error::{NmtError, Result};
use crate::domain::sample::EncodedSample;
use crate::domain::traits::{BatchIter, Corpus, InputPipeline, Padding};
use crate::infra::id_cache::{block_size_for, DataQueue};

/// Settings shared by both pipeline variants.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub batch_size:       usize,
    pub max_segment_size: usize,
    pub padding_type:     String,
    pub shuffle:          bool,
    pub seed:             Option<u64>,
    pub side:             usize,
    pub cuda:             bool,
}

impl PipelineSettings {
    pub fn new(batch_size: usize, max_segment_size: usize) -> Self {
        Self {
            batch_size,
            max_segment_size,
            padding_type: padding::POST_PADDING.to_string(),
            shuffle:      true,
            seed:         None,
            side:         0,
            cuda:         false,
        }
    }

    fn validate(&self, corpora: &dyn Corpus) -> Result<()> {
        if self.batch_size == 0 {
            return Err(NmtError::configuration("batch_size", "batch size must be at least 1"));
        }
        if self.max_segment_size == 0 {
            return Err(NmtError::configuration(
                "max_segment_size",
                "segment size must be at least 1",
            ));
        }
        if self.side >= corpora.sides() {
            return Err(NmtError::configuration(
                "side",
                format!("{} corpus has {} side(s), got side {}", corpora.kind(), corpora.sides(), self.side),
            ));
        }
        if self.batch_size > self.max_segment_size {
            tracing::warn!(
                "batch_size {} exceeds max_segment_size {}: no batch will ever be produced",
                self.batch_size,
                self.max_segment_size
            );
        }
        Ok(())
    }
}

/// Build the padder for the side of the corpus the pipeline reads.
fn padder_for(corpora: &dyn Corpus, settings: &PipelineSettings) -> Result<Box<dyn Padding>> {
    let vocabulary = corpora.side_vocabulary(settings.side)?.clone();
    padding::build(&settings.padding_type, vocabulary, settings.max_segment_size)
}

// ─── MemoryInput ──────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct MemoryInput {
    corpora:  Box<dyn Corpus>,
    padder:   Box<dyn Padding>,
    data:     Vec<EncodedSample>,
    settings: PipelineSettings,
    shuffler: Shuffler,
}

impl MemoryInput {
    /// Load the corpus and convert it once; later passes only reshuffle.
    pub fn new(mut corpora: Box<dyn Corpus>, settings: PipelineSettings) -> Result<Self> {
        settings.validate(corpora.as_ref())?;
        let padder = padder_for(corpora.as_ref(), &settings)?;

        corpora.initialize_corpus()?;
        let data = padder.convert(&corpora.text_lines(settings.side)?);

        tracing::info!(
            "MemoryInput over '{}': {} samples, batch_size={}, max_segment_size={}, {}",
            corpora.data_path().display(),
            data.len(),
            settings.batch_size,
            settings.max_segment_size,
            padder.name(),
        );

        let shuffler = Shuffler::new(settings.shuffle, settings.seed);
        Ok(Self { corpora, padder, data, settings, shuffler })
    }

    /// Number of converted samples held in memory.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl InputPipeline for MemoryInput {
    fn kind(&self) -> &'static str {
        "MemoryInput"
    }

    fn batch_generator(&self) -> BatchIter<'_> {
        let padder     = self.padder.as_ref();
        let batch_size = self.settings.batch_size;
        let mut rng    = self.shuffler.next_pass();

        Box::new(self.data.chunks(self.settings.max_segment_size).flat_map(move |chunk| {
            let mut segment = chunk.to_vec();
            shuffle_segment(&mut segment, rng.as_mut());
            full_batches(padder, segment, batch_size)
        }))
    }

    fn corpora(&self) -> &dyn Corpus {
        self.corpora.as_ref()
    }

    fn vocabulary(&self) -> Result<&Arc<Vocabulary>> {
        Ok(self.padder.vocabulary())
    }

    fn batch_size(&self) -> usize {
        self.settings.batch_size
    }

    fn max_segment_size(&self) -> usize {
        self.settings.max_segment_size
    }

    fn padding_type(&self) -> &'static str {
        self.padder.name()
    }
}

// ─── FileInput ────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct FileInput {
    corpora:  Box<dyn Corpus>,
    padder:   Box<dyn Padding>,
    queue:    DataQueue,
    settings: PipelineSettings,
    shuffler: Shuffler,
}

impl FileInput {
    /// Open (or build) the id cache of the corpus side. The corpus
    /// itself is never loaded into memory.
    pub fn new(corpora: Box<dyn Corpus>, settings: PipelineSettings) -> Result<Self> {
        settings.validate(corpora.as_ref())?;
        let padder = padder_for(corpora.as_ref(), &settings)?;
        let block  = block_size_for(settings.max_segment_size);
        let queue  = DataQueue::new(corpora.as_ref(), settings.side, block)?;

        tracing::info!(
            "FileInput over '{}' (cache '{}'): batch_size={}, max_segment_size={}, {}",
            corpora.data_path().display(),
            queue.id_path().display(),
            settings.batch_size,
            settings.max_segment_size,
            padder.name(),
        );

        let shuffler = Shuffler::new(settings.shuffle, settings.seed);
        Ok(Self { corpora, padder, queue, settings, shuffler })
    }

    /// Rebuild the id cache from the corpus file.
    pub fn regenerate_cache(&self) -> Result<()> {
        self.queue.regenerate(self.corpora.as_ref())
    }

    pub fn queue(&self) -> &DataQueue {
        &self.queue
    }
}

impl InputPipeline for FileInput {
    fn kind(&self) -> &'static str {
        "FileInput"
    }

    fn batch_generator<'a>(&'a self) -> BatchIter<'a> {
        let segments = match self.queue.generator() {
            Ok(segments) => segments,
            Err(e) => return Box::new(std::iter::once(Err(e))),
        };

        let padder       = self.padder.as_ref();
        let batch_size   = self.settings.batch_size;
        let segment_size = self.settings.max_segment_size;
        let mut rng      = self.shuffler.next_pass();

        Box::new(segments.flat_map(move |cached| -> BatchIter<'a> {
            let cached = match cached {
                Ok(cached) => cached,
                Err(e) => return Box::new(std::iter::once(Err(e))),
            };

            let mut prepared = Vec::with_capacity(cached.len().div_ceil(segment_size));
            for chunk in cached.chunks(segment_size) {
                let mut segment = padder.prepare_segment(chunk.to_vec());
                shuffle_segment(&mut segment, rng.as_mut());
                prepared.push(segment);
            }

            Box::new(
                prepared
                    .into_iter()
                    .flat_map(move |segment| full_batches(padder, segment, batch_size)),
            )
        }))
    }

    fn corpora(&self) -> &dyn Corpus {
        self.corpora.as_ref()
    }

    fn vocabulary(&self) -> Result<&Arc<Vocabulary>> {
        Ok(self.padder.vocabulary())
    }

    fn batch_size(&self) -> usize {
        self.settings.batch_size
    }

    fn max_segment_size(&self) -> usize {
        self.settings.max_segment_size
    }

    fn padding_type(&self) -> &'static str {
        self.padder.name()
    }
}
