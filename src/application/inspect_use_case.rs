// ============================================================
// Layer 2 — InspectUseCase
// ============================================================
// Assembles an experiment, then renders the first batches of one
// language split back to words:
//
//   {0}:
//   > [ids]:   the   cat
//
//   {1}:
//   > [ids]:   cat   <PAD>

use anyhow::{Context, Result};

use crate::application::assemble_use_case::{AssembleConfig, AssembleUseCase};

#[derive(Debug, Clone)]
pub struct InspectConfig {
    pub assemble: AssembleConfig,
    /// Key of the language under `Experiment:languages`.
    pub language: String,
    pub split:    String,
    pub batches:  usize,
}

pub struct InspectUseCase {
    config: InspectConfig,
}

impl InspectUseCase {
    pub fn new(config: InspectConfig) -> Self {
        Self { config }
    }

    /// Rendered text of up to `batches` batches, in generation order.
    pub fn execute(&self) -> Result<Vec<String>> {
        let cfg = &self.config;

        let assembly = AssembleUseCase::new(cfg.assemble.clone()).execute()?;
        let language = assembly.language(&cfg.language)?;
        let pipeline = language
            .pipeline(&cfg.split)
            .with_context(|| format!("Language '{}' has no '{}' pipeline", cfg.language, cfg.split))?;

        tracing::info!(
            "Inspecting {} '{}' of language '{}'",
            pipeline.kind(),
            cfg.split,
            cfg.language
        );

        let mut rendered = Vec::with_capacity(cfg.batches);
        for (index, batch) in pipeline.batch_generator().take(cfg.batches).enumerate() {
            let batch = batch.with_context(|| format!("Failed to produce batch {index}"))?;
            rendered.push(pipeline.render_batch(&batch)?);
        }

        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::assemble_use_case::tests::write_experiment;

    fn inspect(dir: &std::path::Path, split: &str, batches: usize) -> Result<Vec<String>> {
        let path = write_experiment(dir);
        InspectUseCase::new(InspectConfig {
            assemble: AssembleConfig::new(path.to_string_lossy()),
            language: "en".to_string(),
            split:    split.to_string(),
            batches,
        })
        .execute()
    }

    #[test]
    fn test_renders_sorted_padded_batches() {
        let dir = tempfile::tempdir().unwrap();
        let rendered = inspect(dir.path(), "train", 5).unwrap();

        // 4 lines, batch size 2, one segment → 2 batches
        assert_eq!(rendered.len(), 2);
        assert_eq!(rendered[0], "{0}:\n> [ids]:\tthe\tcat\n\n{1}:\n> [ids]:\tcat\t<PAD>\n\n");
    }

    #[test]
    fn test_file_input_split_and_limit() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(inspect(dir.path(), "test", 1).unwrap().len(), 1);
        assert!(dir.path().join("en_id.txt").exists());
    }

    #[test]
    fn test_unknown_split() {
        let dir = tempfile::tempdir().unwrap();
        assert!(inspect(dir.path(), "valid", 1).is_err());
    }
}
