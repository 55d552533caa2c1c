// ============================================================
// Layer 4 — Padding Strategies
// ============================================================
// Two ways of equalising sequence lengths inside a batch:
//
//   PostPadding (default)
//     prepare_segment : nothing
//     create_batch    : sort by length (longest first), then pad
//                       every row with <PAD> up to the longest row
//
//   PrePadding
//     prepare_segment : pad (or truncate) every sample of the
//                       segment to the length of its first sample
//     create_batch    : sort by length only, rows already match
//
// The true length of each row is kept next to the ids, so sorting
// and padding never lose it.

use std::sync::Arc;

use crate::data::vocabulary::Vocabulary;
use crate::domain::error::{NmtError, Result};
use crate::domain::sample::{Batch, EncodedSample};
use crate::domain::traits::Padding;

pub const POST_PADDING: &str = "PostPadding";
pub const PRE_PADDING: &str = "PrePadding";

/// Names accepted by `build`.
pub const PADDING_TYPES: [&str; 2] = [POST_PADDING, PRE_PADDING];

/// Pick a padding strategy by name.
pub fn build(
    name:             &str,
    vocabulary:       Arc<Vocabulary>,
    max_segment_size: usize,
) -> Result<Box<dyn Padding>> {
    match name {
        POST_PADDING => Ok(Box::new(PostPadding::new(vocabulary, max_segment_size))),
        PRE_PADDING => Ok(Box::new(PrePadding::new(vocabulary, max_segment_size))),
        other => Err(NmtError::configuration(
            "padding_type",
            format!("unknown padding type '{other}', expected one of {PADDING_TYPES:?}"),
        )),
    }
}

/// Stable sort, longest first: equal lengths keep segment order.
fn sort_by_length(samples: &mut [EncodedSample]) {
    samples.sort_by(|a, b| b.length.cmp(&a.length));
}

// ─── PostPadding ──────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct PostPadding {
    vocabulary:       Arc<Vocabulary>,
    max_segment_size: usize,
}

impl PostPadding {
    pub fn new(vocabulary: Arc<Vocabulary>, max_segment_size: usize) -> Self {
        Self { vocabulary, max_segment_size }
    }
}

impl Padding for PostPadding {
    fn name(&self) -> &'static str {
        POST_PADDING
    }

    fn vocabulary(&self) -> &Arc<Vocabulary> {
        &self.vocabulary
    }

    fn max_segment_size(&self) -> usize {
        self.max_segment_size
    }

    fn prepare_segment(&self, segment: Vec<EncodedSample>) -> Vec<EncodedSample> {
        segment
    }

    fn create_batch(&self, mut samples: Vec<EncodedSample>) -> Result<Batch> {
        sort_by_length(&mut samples);

        let pad   = self.vocabulary.tokens().pad;
        let width = samples.iter().map(|s| s.ids.len()).max().unwrap_or(0);

        for sample in &mut samples {
            sample.ids.resize(width, pad);
        }

        Batch::from_rows(samples)
    }
}

// ─── PrePadding ───────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct PrePadding {
    vocabulary:       Arc<Vocabulary>,
    max_segment_size: usize,
}

impl PrePadding {
    pub fn new(vocabulary: Arc<Vocabulary>, max_segment_size: usize) -> Self {
        Self { vocabulary, max_segment_size }
    }
}

impl Padding for PrePadding {
    fn name(&self) -> &'static str {
        PRE_PADDING
    }

    fn vocabulary(&self) -> &Arc<Vocabulary> {
        &self.vocabulary
    }

    fn max_segment_size(&self) -> usize {
        self.max_segment_size
    }

    /// Every sample takes the width of the first one. Longer samples
    /// are cut and their length clamped to that width.
    fn prepare_segment(&self, mut segment: Vec<EncodedSample>) -> Vec<EncodedSample> {
        let Some(width) = segment.first().map(|s| s.ids.len()) else {
            return segment;
        };
        let pad = self.vocabulary.tokens().pad;

        for sample in &mut segment {
            sample.ids.resize(width, pad);
            sample.length = sample.length.min(width);
        }

        segment
    }

    fn create_batch(&self, mut samples: Vec<EncodedSample>) -> Result<Batch> {
        sort_by_length(&mut samples);
        Batch::from_rows(samples)
    }
}
