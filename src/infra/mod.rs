// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Persistence concerns that sit beside the data pipeline:
//
//   id_cache.rs  — DataQueue
//                  Encodes a corpus once into an id file next to
//                  the source and streams it back in fixed-size
//                  segments, so FileInput never holds the whole
//                  corpus in memory.

/// On-disk id cache streamed segment by segment
pub mod id_cache;
