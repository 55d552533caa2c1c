// ============================================================
// Layer 2 — AssembleUseCase
// ============================================================
// Builds an experiment from its configuration document:
//
//   Step 1: Read the JSON document          (Layer 5 - component)
//   Step 2: Resolve Experiment:languages    (Layer 5 → Layer 4)
//   Step 3: Resolve Experiment:Model, if any (Layer 5 → Layer 7)
//
// Relative paths inside the document are read against the
// directory of the configuration file unless `base_dir` is set.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::component::config::{ConfigDocument, ConfigPath};
use crate::component::interface::Contract;
use crate::component::registry::Registry;
use crate::component::resolver::Resolver;
use crate::component::value::Component;
use crate::data::language::{Language, SPLITS};
use crate::ml::unit::TrainableUnit;

pub const LANGUAGES_PATH: &str = "Experiment:languages";
pub const MODEL_PATH: &str = "Experiment:Model";

// ─── Assembly Configuration ──────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssembleConfig {
    pub config_path: String,
    /// Directory relative data paths are read from.
    pub base_dir:    Option<String>,
}

impl AssembleConfig {
    pub fn new(config_path: impl Into<String>) -> Self {
        Self { config_path: config_path.into(), base_dir: None }
    }

    fn resolved_base_dir(&self) -> PathBuf {
        match &self.base_dir {
            Some(dir) => PathBuf::from(dir),
            None => Path::new(&self.config_path)
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        }
    }
}

// ─── Assembly ─────────────────────────────────────────────────────────────────
/// Everything resolved from one configuration document.
#[derive(Debug)]
pub struct Assembly {
    pub languages: BTreeMap<String, Arc<Language>>,
    pub model:     Option<Box<dyn TrainableUnit>>,
}

impl Assembly {
    pub fn language(&self, key: &str) -> Result<&Arc<Language>> {
        match self.languages.get(key) {
            Some(language) => Ok(language),
            None => bail!(
                "no language '{}' in {} (configured: {:?})",
                key,
                LANGUAGES_PATH,
                self.languages.keys().collect::<Vec<_>>()
            ),
        }
    }

    /// One line per language and pipeline.
    pub fn summary(&self) -> Vec<String> {
        let mut lines = Vec::new();

        for (key, language) in &self.languages {
            let vocabulary = language.vocabulary();
            lines.push(format!(
                "{key} ({}): vocabulary '{}', {} words, embedding size {}",
                language.identifier(),
                vocabulary.path().display(),
                vocabulary.vocab_size(),
                vocabulary.embedding_size(),
            ));

            for split in SPLITS {
                if let Ok(pipeline) = language.pipeline(split) {
                    lines.push(format!(
                        "  {split:<5} {} over {} '{}' (batch {}, segment {}, {})",
                        pipeline.kind(),
                        pipeline.corpora().kind(),
                        pipeline.corpora().data_path().display(),
                        pipeline.batch_size(),
                        pipeline.max_segment_size(),
                        pipeline.padding_type(),
                    ));
                }
            }
        }

        if let Some(model) = &self.model {
            lines.push(format!("model: {} ({:?})", model.kind(), model.lifecycle()));
        }

        lines
    }
}

// ─── AssembleUseCase ──────────────────────────────────────────────────────────
pub struct AssembleUseCase {
    config:   AssembleConfig,
    registry: Registry,
}

impl AssembleUseCase {
    /// Uses the built-in component variants.
    pub fn new(config: AssembleConfig) -> Self {
        Self::with_registry(config, Registry::with_defaults())
    }

    /// Uses a registry extended with externally defined variants.
    pub fn with_registry(config: AssembleConfig, registry: Registry) -> Self {
        Self { config, registry }
    }

    pub fn execute(&self) -> Result<Assembly> {
        let cfg = &self.config;

        // ── Step 1: Read the configuration document ──────────────────────────
        tracing::info!("Loading configuration '{}'", cfg.config_path);
        let document = ConfigDocument::from_file(&cfg.config_path)
            .with_context(|| format!("Failed to read configuration '{}'", cfg.config_path))?;

        let mut resolver = Resolver::new(&self.registry, &document).with_base_dir(cfg.resolved_base_dir());

        // ── Step 2: Languages ─────────────────────────────────────────────────
        let resolved = resolver
            .resolve_children(&ConfigPath::parse(LANGUAGES_PATH), Contract::Language)
            .context("Failed to assemble languages")?;

        let mut languages = BTreeMap::new();
        for (key, component) in resolved {
            match component {
                Component::Language(language) => {
                    languages.insert(key, language);
                }
                other => bail!("{LANGUAGES_PATH}:{key} resolved to a {}", other.describe()),
            }
        }
        tracing::info!("Assembled {} languages", languages.len());

        // ── Step 3: Model (optional) ──────────────────────────────────────────
        let model_path = ConfigPath::parse(MODEL_PATH);
        let model = if document.get(&model_path).is_some() {
            match resolver.resolve(&model_path, Contract::Model).context("Failed to assemble model")? {
                Component::Unit(unit) => {
                    tracing::info!("Model {} ready", unit.kind());
                    Some(unit)
                }
                other => bail!("{MODEL_PATH} resolved to a {}", other.describe()),
            }
        } else {
            None
        };

        Ok(Assembly { languages, model })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::test_support::write_file;

    /// Two languages sharing one vocabulary file, written to `dir`.
    pub(crate) fn write_experiment(dir: &Path) -> PathBuf {
        write_file(dir, "vocab.txt", "4 2\nthe 0 0\ncat 0 0\nle 0 0\nchat 0 0\n");
        write_file(dir, "en.txt", "the cat\ncat\nthe\nthe cat cat\n");
        write_file(dir, "fr.txt", "le chat\nchat\nle\nle chat chat\n");

        let language = |id: &str, file: &str| {
            let pipeline = |kind: &str| {
                serde_json::json!({ kind: {
                    "max_segment_size": 4,
                    "batch_size": 2,
                    "shuffle": false,
                    "corpora": { "Monolingual": { "data_path": file } }
                }})
            };
            serde_json::json!({ "Language": {
                "identifier": id,
                "vocabulary": { "Vocabulary": { "vocab_path": "vocab.txt" } },
                "input_pipelines": {
                    "train": pipeline("MemoryInput"),
                    "dev": pipeline("MemoryInput"),
                    "test": pipeline("FileInput")
                }
            }})
        };

        let config = serde_json::json!({ "Experiment": {
            "Policy": { "cuda": false },
            "language_identifiers": ["<en>", "<fr>"],
            "languages": {
                "en": language("<en>", "en.txt"),
                "fr": language("<fr>", "fr.txt")
            }
        }});
        write_file(dir, "experiment.json", &config.to_string())
    }

    #[test]
    fn test_assembles_every_language() {
        let dir  = tempfile::tempdir().unwrap();
        let path = write_experiment(dir.path());

        let assembly = AssembleUseCase::new(AssembleConfig::new(path.to_string_lossy()))
            .execute()
            .unwrap();

        assert_eq!(assembly.languages.len(), 2);
        assert!(assembly.model.is_none());
        assert_eq!(assembly.language("fr").unwrap().identifier(), "<fr>");
        assert!(assembly.language("de").is_err());

        let summary = assembly.summary();
        assert_eq!(summary.len(), 8);
        assert!(summary[0].starts_with("en (<en>)"));
        assert!(summary.iter().any(|l| l.contains("FileInput over Monolingual")));
    }

    #[test]
    fn test_missing_configuration_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = AssembleConfig::new(dir.path().join("absent.json").to_string_lossy());
        assert!(AssembleUseCase::new(config).execute().is_err());
    }
}
