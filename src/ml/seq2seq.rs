// ============================================================
// Layer 7 — Sequence-to-Sequence Model
// ============================================================
// Composes an encoder and a decoder unit:
//
//   source ids ─▶ encoder ─▶ hidden states ─┐
//                                           ▼ (context)
//   target ids ─────────────▶ decoder ─▶ output
//
// Both children arrive fully initialised from the resolver, so the
// model's own lifecycle hooks only track its own state.

use burn::prelude::*;

use crate::domain::error::{NmtError, Result};
use crate::ml::unit::{Lifecycle, TrainableUnit, UnitBackend, UnitInput};

#[derive(Debug)]
pub struct SeqToSeq {
    encoder:   Box<dyn TrainableUnit>,
    decoder:   Box<dyn TrainableUnit>,
    lifecycle: Lifecycle,
}

impl SeqToSeq {
    pub fn new(encoder: Box<dyn TrainableUnit>, decoder: Box<dyn TrainableUnit>) -> Result<Self> {
        for (name, unit) in [("encoder", &encoder), ("decoder", &decoder)] {
            if unit.lifecycle() != Lifecycle::Ready {
                return Err(NmtError::uninitialized(format!(
                    "{name} '{}' of SeqToSeq ({:?})",
                    unit.kind(),
                    unit.lifecycle()
                )));
            }
        }

        tracing::debug!("SeqToSeq: {} → {}", encoder.kind(), decoder.kind());
        Ok(Self { encoder, decoder, lifecycle: Lifecycle::Constructed })
    }

    pub fn encoder(&self) -> &dyn TrainableUnit {
        self.encoder.as_ref()
    }

    pub fn decoder(&self) -> &dyn TrainableUnit {
        self.decoder.as_ref()
    }

    /// Encode `source`, then decode `target` with the encoder states
    /// as context.
    pub fn translate(&self, source: UnitInput, target: UnitInput) -> Result<Tensor<UnitBackend, 3>> {
        let context = self.encoder.forward(source)?;
        self.decoder.forward(UnitInput { context: Some(context), ..target })
    }
}

impl TrainableUnit for SeqToSeq {
    fn kind(&self) -> &'static str {
        "SeqToSeq"
    }

    fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    fn init_parameters(&mut self) -> Result<()> {
        self.lifecycle = Lifecycle::ParametersInitialized;
        Ok(())
    }

    fn init_optimizer(&mut self) -> Result<()> {
        if self.lifecycle == Lifecycle::Constructed {
            return Err(NmtError::uninitialized("parameters of SeqToSeq"));
        }
        self.lifecycle = Lifecycle::Ready;
        Ok(())
    }

    /// Autoencoding pass: the same ids feed encoder and decoder.
    fn forward(&self, input: UnitInput) -> Result<Tensor<UnitBackend, 3>> {
        self.translate(input.clone(), input)
    }

    fn step(&mut self) -> Result<()> {
        self.encoder.step()?;
        self.decoder.step()
    }

    fn zero_grad(&mut self) -> Result<()> {
        self.encoder.zero_grad()?;
        self.decoder.zero_grad()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::batcher::TensorBatcher;
    use crate::domain::sample::{Batch, EncodedSample};
    use crate::ml::embedding::{EmbeddingUnit, Role};
    use crate::test_support::small_vocabulary;

    fn ready_unit(role: Role, dir: &std::path::Path) -> Box<dyn TrainableUnit> {
        let mut unit = EmbeddingUnit::new(role, small_vocabulary(dir), 0.1).unwrap();
        unit.init_parameters().unwrap();
        unit.init_optimizer().unwrap();
        Box::new(unit)
    }

    #[test]
    fn test_forward_runs_encoder_then_decoder() {
        let dir = tempfile::tempdir().unwrap();
        let mut model = SeqToSeq::new(ready_unit(Role::Encoder, dir.path()), ready_unit(Role::Decoder, dir.path()))
            .unwrap();
        model.init_parameters().unwrap();
        model.init_optimizer().unwrap();

        let batch = Batch::from_rows(vec![
            EncodedSample::new(vec![0, 1]),
            EncodedSample::new(vec![2, 3]),
        ])
        .unwrap();
        let input = TensorBatcher::<UnitBackend>::new(Default::default()).tensors(&batch);

        let output = model.forward(input.into()).unwrap();
        assert_eq!(output.dims(), [2, 2, 2]);

        model.zero_grad().unwrap();
        model.step().unwrap();
    }

    #[test]
    fn test_children_must_be_ready() {
        let dir = tempfile::tempdir().unwrap();
        let fresh = Box::new(EmbeddingUnit::new(Role::Decoder, small_vocabulary(dir.path()), 0.1).unwrap());
        let err = SeqToSeq::new(ready_unit(Role::Encoder, dir.path()), fresh).unwrap_err();
        assert!(matches!(err, NmtError::UninitializedState { .. }));
    }
}
