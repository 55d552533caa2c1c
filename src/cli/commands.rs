// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `assemble`, `inspect` and `cache`
// and all their configurable flags.
//
// Each Args struct converts into its application-layer config with
// `From`, so Layer 2 never sees clap types.

use clap::{Args, Subcommand};

use crate::application::assemble_use_case::AssembleConfig;
use crate::application::cache_use_case::CacheConfig;
use crate::application::inspect_use_case::InspectConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve every language of an experiment and print a summary
    Assemble(AssembleArgs),

    /// Render the first batches of one language split as text
    Inspect(InspectArgs),

    /// Build (or rebuild) the id cache of a monolingual corpus
    Cache(CacheArgs),
}

#[derive(Args, Debug)]
pub struct AssembleArgs {
    /// JSON experiment configuration
    #[arg(long)]
    pub config: String,

    /// Directory relative data paths are read from
    /// (defaults to the directory of the configuration file)
    #[arg(long)]
    pub base_dir: Option<String>,
}

impl From<AssembleArgs> for AssembleConfig {
    fn from(a: AssembleArgs) -> Self {
        AssembleConfig {
            config_path: a.config,
            base_dir:    a.base_dir,
        }
    }
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    #[command(flatten)]
    pub assemble: AssembleArgs,

    /// Key of the language under Experiment:languages
    #[arg(long)]
    pub language: String,

    /// train, dev or test
    #[arg(long, default_value = "train")]
    pub split: String,

    /// Number of batches to render
    #[arg(long, default_value_t = 1)]
    pub batches: usize,
}

impl From<InspectArgs> for InspectConfig {
    fn from(a: InspectArgs) -> Self {
        InspectConfig {
            assemble: a.assemble.into(),
            language: a.language,
            split:    a.split,
            batches:  a.batches,
        }
    }
}

#[derive(Args, Debug)]
pub struct CacheArgs {
    /// Corpus file, one sentence per line
    #[arg(long)]
    pub corpus: String,

    /// Vocabulary file the ids come from
    #[arg(long)]
    pub vocab: String,

    /// Language identifier tokens of the experiment, in order
    #[arg(long = "language-identifier")]
    pub language_identifiers: Vec<String>,

    /// Rebuild the cache even if one exists
    #[arg(long)]
    pub force: bool,
}

impl From<CacheArgs> for CacheConfig {
    fn from(a: CacheArgs) -> Self {
        CacheConfig {
            corpus_path:          a.corpus,
            vocab_path:           a.vocab,
            language_identifiers: a.language_identifiers,
            force:                a.force,
        }
    }
}
