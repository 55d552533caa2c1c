// ============================================================
// Layer 4 — Language
// ============================================================
// One language of an experiment: its identifier, its vocabulary
// and exactly three input pipelines named "train", "dev" and "test".

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::data::vocabulary::Vocabulary;
use crate::domain::error::{NmtError, Result};
use crate::domain::traits::InputPipeline;

/// Pipeline names every language must define.
pub const SPLITS: [&str; 3] = ["train", "dev", "test"];

#[derive(Debug)]
pub struct Language {
    identifier:      String,
    vocabulary:      Arc<Vocabulary>,
    input_pipelines: BTreeMap<String, Box<dyn InputPipeline>>,
}

impl Language {
    pub fn new(
        identifier:      impl Into<String>,
        vocabulary:      Arc<Vocabulary>,
        input_pipelines: BTreeMap<String, Box<dyn InputPipeline>>,
    ) -> Result<Self> {
        let identifier = identifier.into();

        let missing: Vec<&str> = SPLITS
            .iter()
            .copied()
            .filter(|split| !input_pipelines.contains_key(*split))
            .collect();
        let extra: Vec<&str> = input_pipelines
            .keys()
            .map(String::as_str)
            .filter(|name| !SPLITS.contains(name))
            .collect();

        if !missing.is_empty() || !extra.is_empty() {
            return Err(NmtError::configuration(
                format!("Experiment:languages:{identifier}:input_pipelines"),
                format!(
                    "input pipelines must be exactly {SPLITS:?} (missing {missing:?}, unexpected {extra:?})"
                ),
            ));
        }

        for (name, pipeline) in &input_pipelines {
            let shared = pipeline
                .vocabulary()
                .map(|v| Arc::ptr_eq(v, &vocabulary))
                .unwrap_or(false);
            if !shared {
                tracing::warn!(
                    "Language '{}': pipeline '{}' does not use the language vocabulary",
                    identifier,
                    name
                );
            }
        }

        tracing::info!(
            "Language '{}' ready ({} vocabulary entries)",
            identifier,
            vocabulary.vocab_size()
        );

        Ok(Self { identifier, vocabulary, input_pipelines })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn vocabulary(&self) -> &Arc<Vocabulary> {
        &self.vocabulary
    }

    pub fn input_pipelines(&self) -> &BTreeMap<String, Box<dyn InputPipeline>> {
        &self.input_pipelines
    }

    /// One of "train", "dev" or "test".
    pub fn pipeline(&self, split: &str) -> Result<&dyn InputPipeline> {
        self.input_pipelines
            .get(split)
            .map(|p| p.as_ref())
            .ok_or_else(|| {
                NmtError::configuration(
                    format!("Experiment:languages:{}:input_pipelines", self.identifier),
                    format!("no pipeline named '{split}', expected one of {SPLITS:?}"),
                )
            })
    }

    pub fn train(&self) -> Result<&dyn InputPipeline> {
        self.pipeline("train")
    }

    pub fn dev(&self) -> Result<&dyn InputPipeline> {
        self.pipeline("dev")
    }

    pub fn test(&self) -> Result<&dyn InputPipeline> {
        self.pipeline("test")
    }
}
