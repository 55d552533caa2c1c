// ============================================================
// Layer 4 — Tensor Batcher
// ============================================================
// Converts a `Batch` (ndarray ids + true lengths) into burn
// tensors for a trainable unit.
//
//   Batch.ids      [N, S] u32  → ids      Tensor<B, 2, Int>
//   Batch.lengths  [N]         → lengths  Tensor<B, 1, Int>
//                              → mask     Tensor<B, 2, Int>  (1 = real id, 0 = pad)
//
// Burn Int tensors are built from i32, so ids are flattened into
// one Vec<i32> and reshaped to [N, S].

use burn::data::dataloader::batcher::Batcher;
use burn::prelude::*;

use crate::domain::sample::{Batch, EncodedSample};

/// A batch on the device.
#[derive(Debug, Clone)]
pub struct BatchTensors<B: Backend> {
    /// Token ids, shape [batch_size, seq_len]
    pub ids: Tensor<B, 2, Int>,

    /// 1 for real ids, 0 for padding, shape [batch_size, seq_len]
    pub mask: Tensor<B, 2, Int>,

    /// True length of every row, shape [batch_size]
    pub lengths: Tensor<B, 1, Int>,
}

#[derive(Clone, Debug)]
pub struct TensorBatcher<B: Backend> {
    pub device: B::Device,

    /// Fills ragged rows when batching loose samples
    pub pad_id: u32,
}

impl<B: Backend> TensorBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device, pad_id: 0 }
    }

    pub fn with_pad_id(self, pad_id: u32) -> Self {
        Self { pad_id, ..self }
    }

    /// Tensors of an already padded batch.
    pub fn tensors(&self, batch: &Batch) -> BatchTensors<B> {
        let ids_flat: Vec<i32> = batch.ids.iter().map(|&id| id as i32).collect();
        self.build(ids_flat, batch.lengths.clone(), batch.batch_size(), batch.width())
    }

    fn build(&self, ids_flat: Vec<i32>, lengths: Vec<usize>, rows: usize, seq_len: usize) -> BatchTensors<B> {
        let mask_flat: Vec<i32> = lengths
            .iter()
            .flat_map(|&length| (0..seq_len).map(move |col| i32::from(col < length)))
            .collect();

        let lengths: Vec<i32> = lengths.iter().map(|&l| l as i32).collect();

        BatchTensors {
            ids: Tensor::<B, 1, Int>::from_ints(ids_flat.as_slice(), &self.device)
                .reshape([rows, seq_len]),
            mask: Tensor::<B, 1, Int>::from_ints(mask_flat.as_slice(), &self.device)
                .reshape([rows, seq_len]),
            lengths: Tensor::<B, 1, Int>::from_ints(lengths.as_slice(), &self.device),
        }
    }
}

// ─── Burn Batcher Trait Implementation ───
// Lets a burn DataLoader feed encoded samples straight to a unit.
// Rows shorter than the longest are post-padded with `pad_id`.
impl<B: Backend> Batcher<EncodedSample, BatchTensors<B>> for TensorBatcher<B> {
    fn batch(&self, items: Vec<EncodedSample>) -> BatchTensors<B> {
        let rows    = items.len();
        let seq_len = items.iter().map(|s| s.ids.len()).max().unwrap_or(0);

        let ids_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| {
                let pad = seq_len - s.ids.len();
                s.ids.iter().copied().chain(std::iter::repeat(self.pad_id).take(pad))
            })
            .map(|id| id as i32)
            .collect();

        let lengths = items.iter().map(|s| s.length.min(s.ids.len())).collect();

        self.build(ids_flat, lengths, rows, seq_len)
    }
}
