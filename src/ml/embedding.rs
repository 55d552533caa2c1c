// ============================================================
// Layer 7 — Vocabulary Embeddings
// ============================================================
// Builds a burn `Embedding` sized from a vocabulary:
//
//   rows    = raw vocabulary size (every id, reserved tokens included)
//   columns = embedding size from the vocabulary file header
//
// When the vocabulary file carried weights, they replace the random
// initialisation; fixed embeddings are excluded from gradients.
//
// `EmbeddingUnit` wraps that layer as the smallest trainable unit:
// a lookup of ids into vectors, registered as both an encoder and a
// decoder variant so a SeqToSeq model can be assembled from the
// configuration document alone.

use std::sync::Arc;

use burn::module::Param;
use burn::nn::{Embedding, EmbeddingConfig};
use burn::prelude::*;

use crate::data::vocabulary::Vocabulary;
use crate::domain::error::{NmtError, Result};
use crate::ml::unit::{Lifecycle, TrainableUnit, UnitBackend, UnitInput};

pub fn embedding_from_vocabulary<B: Backend>(vocabulary: &Vocabulary, device: &B::Device) -> Embedding<B> {
    let rows    = vocabulary.raw_vocab_size();
    let columns = vocabulary.embedding_size();
    let mut embedding = EmbeddingConfig::new(rows, columns).init(device);

    if let Some(weights) = vocabulary.embedding_weights() {
        let flat: Vec<f32> = weights.iter().copied().collect();
        let tensor = Tensor::<B, 1>::from_floats(flat.as_slice(), device).reshape([rows, columns]);
        embedding.weight = Param::from_tensor(tensor);
        tracing::debug!("Loaded pretrained embedding weights [{}, {}]", rows, columns);
    }

    if !vocabulary.requires_grad() {
        embedding.weight = embedding.weight.set_require_grad(false);
    }

    embedding
}

// ─── EmbeddingUnit ────────────────────────────────────────────────────────────

/// Role an embedding unit was registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Encoder,
    Decoder,
}

impl Role {
    fn kind(self) -> &'static str {
        match self {
            Role::Encoder => "EmbeddingEncoder",
            Role::Decoder => "EmbeddingDecoder",
        }
    }
}

/// Optimizer settings fixed by `init_optimizer`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizerState {
    pub learning_rate: f64,
    pub steps:         u64,
}

#[derive(Debug)]
pub struct EmbeddingUnit {
    role:          Role,
    vocabulary:    Arc<Vocabulary>,
    learning_rate: f64,
    embedding:     Option<Embedding<UnitBackend>>,
    optimizer:     Option<OptimizerState>,
}

impl EmbeddingUnit {
    pub fn new(role: Role, vocabulary: Arc<Vocabulary>, learning_rate: f64) -> Result<Self> {
        if learning_rate.is_nan() || learning_rate <= 0.0 {
            return Err(NmtError::configuration(
                "learning_rate",
                format!("learning rate must be positive, got {learning_rate}"),
            ));
        }
        Ok(Self { role, vocabulary, learning_rate, embedding: None, optimizer: None })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn vocabulary(&self) -> &Arc<Vocabulary> {
        &self.vocabulary
    }

    pub fn optimizer(&self) -> Option<&OptimizerState> {
        self.optimizer.as_ref()
    }

    fn optimizer_mut(&mut self) -> Result<&mut OptimizerState> {
        let kind = self.role.kind();
        self.optimizer
            .as_mut()
            .ok_or_else(|| NmtError::uninitialized(format!("optimizer of {kind}")))
    }
}

impl TrainableUnit for EmbeddingUnit {
    fn kind(&self) -> &'static str {
        self.role.kind()
    }

    fn lifecycle(&self) -> Lifecycle {
        match (&self.embedding, &self.optimizer) {
            (None, _) => Lifecycle::Constructed,
            (Some(_), None) => Lifecycle::ParametersInitialized,
            (Some(_), Some(_)) => Lifecycle::Ready,
        }
    }

    fn init_parameters(&mut self) -> Result<()> {
        let device = Default::default();
        self.embedding = Some(embedding_from_vocabulary::<UnitBackend>(&self.vocabulary, &device));
        Ok(())
    }

    fn init_optimizer(&mut self) -> Result<()> {
        if self.embedding.is_none() {
            return Err(NmtError::uninitialized(format!("parameters of {}", self.kind())));
        }
        self.optimizer = Some(OptimizerState { learning_rate: self.learning_rate, steps: 0 });
        Ok(())
    }

    fn forward(&self, input: UnitInput) -> Result<Tensor<UnitBackend, 3>> {
        let embedding = self
            .embedding
            .as_ref()
            .ok_or_else(|| NmtError::uninitialized(format!("parameters of {}", self.kind())))?;
        Ok(embedding.forward(input.ids))
    }

    fn step(&mut self) -> Result<()> {
        self.optimizer_mut()?.steps += 1;
        Ok(())
    }

    fn zero_grad(&mut self) -> Result<()> {
        self.optimizer_mut().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::batcher::TensorBatcher;
    use crate::domain::sample::{Batch, EncodedSample};
    use crate::test_support::{small_vocabulary, write_file};

    #[test]
    fn test_embedding_shape_from_vocabulary() {
        let dir  = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "v.txt", "2 3\nhello 0.1 0.2 0.3\nworld 0.4 0.5 0.6\n");
        let vocab = Vocabulary::from_file(&path, &["<2>".to_string()], true, true, false).unwrap();

        let embedding = embedding_from_vocabulary::<UnitBackend>(&vocab, &Default::default());
        assert_eq!(embedding.weight.val().dims(), [7, 3]);
    }

    #[test]
    fn test_random_embedding_without_weights() {
        let dir   = tempfile::tempdir().unwrap();
        let vocab = small_vocabulary(dir.path());

        let embedding = embedding_from_vocabulary::<UnitBackend>(&vocab, &Default::default());
        assert_eq!(embedding.weight.val().dims(), [9, 2]);
    }

    #[test]
    fn test_unit_lifecycle_and_forward() {
        let dir  = tempfile::tempdir().unwrap();
        let mut unit = EmbeddingUnit::new(Role::Encoder, small_vocabulary(dir.path()), 0.01).unwrap();
        assert_eq!(unit.lifecycle(), Lifecycle::Constructed);
        assert!(unit.init_optimizer().is_err());

        unit.init_parameters().unwrap();
        unit.init_optimizer().unwrap();
        assert_eq!(unit.lifecycle(), Lifecycle::Ready);

        let batch = Batch::from_rows(vec![EncodedSample::new(vec![0, 1, 2])]).unwrap();
        let input = TensorBatcher::<UnitBackend>::new(Default::default()).tensors(&batch);
        let hidden = unit.forward(input.into()).unwrap();
        assert_eq!(hidden.dims(), [1, 3, 2]);

        unit.zero_grad().unwrap();
        unit.step().unwrap();
        assert_eq!(unit.optimizer().unwrap().steps, 1);
    }

    #[test]
    fn test_forward_before_parameters() {
        let dir  = tempfile::tempdir().unwrap();
        let unit = EmbeddingUnit::new(Role::Decoder, small_vocabulary(dir.path()), 0.01).unwrap();
        let batch = Batch::from_rows(vec![EncodedSample::new(vec![0])]).unwrap();
        let input = TensorBatcher::<UnitBackend>::new(Default::default()).tensors(&batch);
        assert!(matches!(unit.forward(input.into()), Err(NmtError::UninitializedState { .. })));
    }

    #[test]
    fn test_rejects_non_positive_learning_rate() {
        let dir = tempfile::tempdir().unwrap();
        let err = EmbeddingUnit::new(Role::Encoder, small_vocabulary(dir.path()), 0.0).unwrap_err();
        assert!(err.is_configuration());
    }
}
