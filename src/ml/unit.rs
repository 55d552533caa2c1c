// ============================================================
// Layer 7 — Trainable Unit Contract
// ============================================================
// Encoders, decoders and whole models are trainable units. The
// resolver drives their lifecycle before handing them to the
// component that declared them:
//
//   construct ─▶ init_parameters() ─▶ init_optimizer() ─▶ parent
//
// Units run on the CPU ndarray backend; device placement is not
// managed here.

use std::fmt::Debug;

use burn::prelude::*;

use crate::data::batcher::BatchTensors;
use crate::domain::error::Result;

/// Backend every unit runs on.
pub type UnitBackend = burn::backend::NdArray;

/// Where a unit is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Constructed,
    ParametersInitialized,
    Ready,
}

/// Input to a forward pass.
#[derive(Debug, Clone)]
pub struct UnitInput {
    /// Token ids, shape [batch_size, seq_len]
    pub ids: Tensor<UnitBackend, 2, Int>,

    /// 1 = real id, 0 = padding, shape [batch_size, seq_len]
    pub mask: Tensor<UnitBackend, 2, Int>,

    /// Output of an upstream unit (the encoder, for a decoder)
    pub context: Option<Tensor<UnitBackend, 3>>,
}

impl From<BatchTensors<UnitBackend>> for UnitInput {
    fn from(batch: BatchTensors<UnitBackend>) -> Self {
        Self { ids: batch.ids, mask: batch.mask, context: None }
    }
}

pub trait TrainableUnit: Debug + Send {
    /// Registry name of the concrete variant.
    fn kind(&self) -> &'static str;

    fn lifecycle(&self) -> Lifecycle;

    /// Allocate parameters. Called once, right after construction.
    fn init_parameters(&mut self) -> Result<()>;

    /// Set up the optimizer over the allocated parameters.
    fn init_optimizer(&mut self) -> Result<()>;

    /// Hidden states, shape [batch_size, seq_len, hidden].
    fn forward(&self, input: UnitInput) -> Result<Tensor<UnitBackend, 3>>;

    fn step(&mut self) -> Result<()>;

    fn zero_grad(&mut self) -> Result<()>;
}
