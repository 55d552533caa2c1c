// ============================================================
// Layer 6 — Id Cache (DataQueue)
// ============================================================
// Streams a large corpus in fixed-size segments without holding
// it in memory. The first time a corpus is seen, every line is
// encoded with the vocabulary and written next to the source:
//
//   data/train.en      → data/train_id.en        (side 0)
//   data/train.en-fr   → data/train_1_id.en-fr   (side 1 of a parallel corpus)
//
// One cache line per source line, "<id> <id> ... <length>":
//
//   12 7 88 3
//   5 2
//
// Later runs reuse the cache as it is. There is no staleness
// check: a changed source or vocabulary needs `regenerate()`
// (the `cache --force` command).
//
// The cache is written to "<name>.partial" and renamed once
// complete.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::data::vocabulary::Vocabulary;
use crate::domain::error::{NmtError, Result};
use crate::domain::sample::EncodedSample;
use crate::domain::traits::Corpus;

/// Samples per segment when the caller does not choose.
pub const DEFAULT_MAX_SEGMENT_SIZE: usize = 50_000;

/// Cache block size for a pipeline cutting segments of
/// `segment_size`: the smallest multiple of it that is at least
/// `DEFAULT_MAX_SEGMENT_SIZE`. Re-chunking such blocks gives the
/// same segment boundaries as chunking the whole corpus.
pub fn block_size_for(segment_size: usize) -> usize {
    let segment_size = segment_size.max(1);
    DEFAULT_MAX_SEGMENT_SIZE.div_ceil(segment_size) * segment_size
}

const PROGRESS_EVERY: usize = 100_000;

#[derive(Debug)]
pub struct DataQueue {
    source_path:      PathBuf,
    id_path:          PathBuf,
    side:             usize,
    max_segment_size: usize,
    vocabulary:       Arc<Vocabulary>,
}

impl DataQueue {
    /// Open the cache for one side of `corpus`, building it if it
    /// does not exist yet.
    pub fn new(corpus: &dyn Corpus, side: usize, max_segment_size: usize) -> Result<Self> {
        if max_segment_size == 0 {
            return Err(NmtError::configuration(
                "max_segment_size",
                "segment size must be at least 1",
            ));
        }

        let source_path = corpus.data_path().to_path_buf();
        let queue = Self {
            id_path: id_path_for(&source_path, side),
            source_path,
            side,
            max_segment_size,
            vocabulary: corpus.side_vocabulary(side)?.clone(),
        };

        if queue.id_path.exists() {
            tracing::info!("Reusing id cache '{}'", queue.id_path.display());
        } else {
            queue.build(corpus)?;
        }

        Ok(queue)
    }

    /// Rebuild the cache from the source file, replacing any existing one.
    pub fn regenerate(&self, corpus: &dyn Corpus) -> Result<()> {
        tracing::info!("Regenerating id cache '{}'", self.id_path.display());
        self.build(corpus)
    }

    /// A fresh pass over the cache, one segment at a time.
    pub fn generator(&self) -> Result<SegmentIter> {
        let file = File::open(&self.id_path).map_err(|e| NmtError::io(&self.id_path, e))?;

        Ok(SegmentIter {
            lines:        BufReader::new(file).lines(),
            path:         self.id_path.clone(),
            line_no:      0,
            segment_size: self.max_segment_size,
            finished:     false,
        })
    }

    pub fn id_path(&self) -> &Path {
        &self.id_path
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn side(&self) -> usize {
        self.side
    }

    pub fn max_segment_size(&self) -> usize {
        self.max_segment_size
    }

    pub fn vocabulary(&self) -> &Arc<Vocabulary> {
        &self.vocabulary
    }

    fn build(&self, corpus: &dyn Corpus) -> Result<()> {
        tracing::info!(
            "Building id cache '{}' from '{}'",
            self.id_path.display(),
            self.source_path.display()
        );

        let source = File::open(&self.source_path).map_err(|e| NmtError::io(&self.source_path, e))?;
        let partial = partial_path(&self.id_path);
        let out = File::create(&partial).map_err(|e| NmtError::io(&partial, e))?;
        let mut writer = BufWriter::new(out);

        let mut count = 0usize;
        for (index, line) in BufReader::new(source).lines().enumerate() {
            let line = line.map_err(|e| NmtError::io(&self.source_path, e))?;
            let text = corpus.extract_side(&line, self.side).ok_or_else(|| {
                NmtError::malformed(&self.source_path, index + 1, format!("line has no side {}", self.side))
            })?;

            let ids = self.vocabulary.encode(text);
            let mut fields: Vec<String> = ids.iter().map(u32::to_string).collect();
            fields.push(ids.len().to_string());
            writeln!(writer, "{}", fields.join(" ")).map_err(|e| NmtError::io(&partial, e))?;

            count += 1;
            if count % PROGRESS_EVERY == 0 {
                tracing::info!("  {} lines encoded", count);
            }
        }

        writer.flush().map_err(|e| NmtError::io(&partial, e))?;
        drop(writer);
        fs::rename(&partial, &self.id_path).map_err(|e| NmtError::io(&self.id_path, e))?;

        tracing::info!("Id cache '{}' holds {} lines", self.id_path.display(), count);
        Ok(())
    }
}

/// `<dir>/<stem>_id<.ext>`, or `<dir>/<stem>_<side>_id<.ext>` for side > 0.
pub fn id_path_for(source: &Path, side: usize) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut name = if side == 0 {
        format!("{stem}_id")
    } else {
        format!("{stem}_{side}_id")
    };
    if let Some(ext) = source.extension() {
        name.push('.');
        name.push_str(&ext.to_string_lossy());
    }

    source.with_file_name(name)
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

fn parse_cache_line(line: &str, path: &Path, line_no: usize) -> Result<EncodedSample> {
    let fields: Vec<u64> = line
        .split_whitespace()
        .map(|f| f.parse::<u64>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| NmtError::malformed(path, line_no, format!("bad id: {e}")))?;

    let (length, ids) = fields
        .split_last()
        .ok_or_else(|| NmtError::malformed(path, line_no, "empty cache line"))?;

    if *length as usize != ids.len() {
        return Err(NmtError::malformed(
            path,
            line_no,
            format!("length field {length} does not match {} ids", ids.len()),
        ));
    }

    let ids = ids
        .iter()
        .map(|&id| u32::try_from(id))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| NmtError::malformed(path, line_no, format!("id out of range: {e}")))?;

    Ok(EncodedSample::new(ids))
}

// ─── SegmentIter ──────────────────────────────────────────────────────────────

/// Yields segments of exactly `segment_size` samples, then one final
/// shorter segment if lines remain. Stops after the first error.
pub struct SegmentIter {
    lines:        Lines<BufReader<File>>,
    path:         PathBuf,
    line_no:      usize,
    segment_size: usize,
    finished:     bool,
}

impl Iterator for SegmentIter {
    type Item = Result<Vec<EncodedSample>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let mut segment = Vec::with_capacity(self.segment_size.min(PROGRESS_EVERY));
        while segment.len() < self.segment_size {
            let Some(line) = self.lines.next() else {
                self.finished = true;
                break;
            };
            self.line_no += 1;

            let parsed = line
                .map_err(|e| NmtError::io(&self.path, e))
                .and_then(|line| parse_cache_line(&line, &self.path, self.line_no));
            match parsed {
                Ok(sample) => segment.push(sample),
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }

        (!segment.is_empty()).then_some(Ok(segment))
    }
}
