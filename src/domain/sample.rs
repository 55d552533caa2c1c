// ============================================================
// Layer 3 — Sample and Batch Domain Types
// ============================================================
// The three shapes data takes on its way to the model:
//
//   Sample         — one raw line of a corpus (one or more languages)
//   EncodedSample  — the line as vocabulary ids plus its true length
//   Batch          — a fixed-shape id matrix built from encoded samples
//
// The true length travels next to the ids instead of being appended
// to them, so a pre-padded row can carry pad cells and still report
// how many of its ids are real.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::domain::error::{NmtError, Result};

/// One raw line of a corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sample {
    /// A single-language line.
    Monolingual(String),
    /// A line split on the corpus separator, one entry per language.
    Parallel(Vec<String>),
}

impl Sample {
    /// Text of one side of the sample. Side 0 is the only side of a
    /// monolingual line.
    pub fn side(&self, side: usize) -> Option<&str> {
        match self {
            Sample::Monolingual(text) if side == 0 => Some(text.as_str()),
            Sample::Monolingual(_) => None,
            Sample::Parallel(parts) => parts.get(side).map(String::as_str),
        }
    }
}

/// A sample converted to ids. `ids` may be longer than `length`
/// when it has been padded ahead of batching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedSample {
    pub ids:    Vec<u32>,
    pub length: usize,
}

impl EncodedSample {
    /// An unpadded sample: every id is real.
    pub fn new(ids: Vec<u32>) -> Self {
        let length = ids.len();
        Self { ids, length }
    }

    /// The ids that belong to the sentence, without padding.
    pub fn real_ids(&self) -> &[u32] {
        &self.ids[..self.length.min(self.ids.len())]
    }
}

/// A mini-batch: `ids` has one row per sample, all rows the same
/// width; `lengths[i]` is the true length of row `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub ids:     Array2<u32>,
    pub lengths: Vec<usize>,
}

impl Batch {
    /// Stack equally wide rows into a batch.
    /// Fails with RaggedBatch if the row widths differ.
    pub fn from_rows(rows: Vec<EncodedSample>) -> Result<Self> {
        let width = rows.first().map(|r| r.ids.len()).unwrap_or(0);

        if rows.iter().any(|r| r.ids.len() != width) {
            return Err(NmtError::RaggedBatch {
                widths: rows.iter().map(|r| r.ids.len()).collect(),
            });
        }

        let count   = rows.len();
        let lengths = rows.iter().map(|r| r.length).collect();
        let flat: Vec<u32> = rows.into_iter().flat_map(|r| r.ids).collect();

        let ids = Array2::from_shape_vec((count, width), flat)
            .map_err(|_| NmtError::RaggedBatch { widths: vec![width; count] })?;

        Ok(Self { ids, lengths })
    }

    pub fn batch_size(&self) -> usize {
        self.ids.nrows()
    }

    /// Width of every row (the padded sequence length).
    pub fn width(&self) -> usize {
        self.ids.ncols()
    }

    /// Row `index` trimmed to its true length; None past the last row.
    pub fn row(&self, index: usize) -> Option<Vec<u32>> {
        let length = (*self.lengths.get(index)?).min(self.width());
        Some(self.ids.row(index).iter().take(length).copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_sides() {
        let mono = Sample::Monolingual("hello world".into());
        assert_eq!(mono.side(0), Some("hello world"));
        assert_eq!(mono.side(1), None);

        let pair = Sample::Parallel(vec!["hello".into(), "bonjour".into()]);
        assert_eq!(pair.side(1), Some("bonjour"));
        assert_eq!(pair.side(2), None);
    }

    #[test]
    fn test_batch_from_equal_rows() {
        let rows = vec![
            EncodedSample { ids: vec![1, 2, 9], length: 2 },
            EncodedSample { ids: vec![3, 4, 5], length: 3 },
        ];
        let batch = Batch::from_rows(rows).unwrap();
        assert_eq!(batch.batch_size(), 2);
        assert_eq!(batch.width(), 3);
        assert_eq!(batch.row(0), Some(vec![1, 2]));
        assert_eq!(batch.lengths, vec![2, 3]);
        assert_eq!(batch.row(2), None);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let rows = vec![EncodedSample::new(vec![1, 2]), EncodedSample::new(vec![3])];
        assert!(matches!(Batch::from_rows(rows), Err(NmtError::RaggedBatch { .. })));
    }
}
