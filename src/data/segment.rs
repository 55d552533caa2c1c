// ============================================================
// Layer 4 — Segment Shuffling and Batching
// ============================================================
// Shared by both input pipelines. A segment is a run of at most
// `max_segment_size` encoded samples; it is the unit of shuffling:
//
//   segment  [s0 s1 s2 s3 s4 s5 s6]   batch_size = 3
//   shuffle  [s4 s0 s6 s2 s1 s5 s3]
//   batches  [s4 s0 s6] [s2 s1 s5]    s3 dropped (no full batch)
//
// Samples never move between segments, so memory stays bounded by
// the segment size no matter how large the corpus is.
//
// Shuffling uses Fisher-Yates via rand::seq::SliceRandom. With a
// seed, pass N shuffles with seed + N: runs are reproducible and
// passes still differ from each other.

use std::sync::atomic::{AtomicU64, Ordering};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::domain::error::Result;
use crate::domain::sample::{Batch, EncodedSample};
use crate::domain::traits::Padding;

/// Hands out one RNG per pass over the data.
#[derive(Debug)]
pub struct Shuffler {
    enabled: bool,
    seed:    Option<u64>,
    passes:  AtomicU64,
}

impl Shuffler {
    pub fn new(enabled: bool, seed: Option<u64>) -> Self {
        Self { enabled, seed, passes: AtomicU64::new(0) }
    }

    /// RNG for the next pass; None when shuffling is off.
    pub fn next_pass(&self) -> Option<StdRng> {
        if !self.enabled {
            return None;
        }

        let pass = self.passes.fetch_add(1, Ordering::Relaxed);

        Some(match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(pass)),
            None => StdRng::from_entropy(),
        })
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }
}

/// Shuffle in place when an RNG is given.
pub fn shuffle_segment(segment: &mut [EncodedSample], rng: Option<&mut StdRng>) {
    if let Some(rng) = rng {
        segment.shuffle(rng);
    }
}

/// Cut a segment into consecutive full batches of `batch_size`.
/// The remainder (fewer than `batch_size` samples) is dropped.
pub fn full_batches<'a>(
    padder:     &'a dyn Padding,
    segment:    Vec<EncodedSample>,
    batch_size: usize,
) -> impl Iterator<Item = Result<Batch>> + 'a {
    let count = if batch_size == 0 { 0 } else { segment.len() / batch_size };

    if count * batch_size < segment.len() {
        tracing::debug!(
            "Dropping {} samples left over after {} batches",
            segment.len() - count * batch_size,
            count
        );
    }

    let mut samples = segment.into_iter();
    (0..count).map(move |_| padder.create_batch(samples.by_ref().take(batch_size).collect()))
}
