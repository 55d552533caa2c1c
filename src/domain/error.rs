// ============================================================
// Layer 3 — Error Taxonomy
// ============================================================
// Every fallible operation in the library returns NmtError.
// Nothing here is retried: a configuration or data error is a
// defect to surface immediately, so errors carry the offending
// configuration path or file path for the report.
//
// The application and CLI layers wrap these in anyhow with
// extra context; the library itself stays typed.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the library layers.
pub type Result<T> = std::result::Result<T, NmtError>;

#[derive(Error, Debug)]
pub enum NmtError {
    /// Missing key, unknown or abstract variant, bad parameter type.
    #[error("configuration error at '{path}': {message}")]
    Configuration { path: String, message: String },

    /// A component path was reached again while it was still being resolved.
    #[error("circular component reference: {}", chain.join(" -> "))]
    CircularReference { chain: Vec<String> },

    /// A data file with zero samples.
    #[error("corpus '{}' contains no samples", path.display())]
    EmptyCorpus { path: PathBuf },

    /// The data path given to a corpus is not a file.
    #[error("'{}' is not a file", path.display())]
    MissingDataFile { path: PathBuf },

    /// Vocabulary-derived property read from a corpus with no vocabulary attached.
    #[error("no vocabulary has been attached to corpus '{}'", path.display())]
    UnresolvedVocabulary { path: PathBuf },

    /// A value was read before the component owning it assigned it.
    #[error("{what} has not been initialized")]
    UninitializedState { what: String },

    /// Vocabulary lookup with an absent key or an unsupported key type.
    #[error("invalid vocabulary key: {0}")]
    InvalidKey(String),

    /// A vocabulary file, corpus or id-cache line that cannot be parsed.
    #[error("malformed '{}' at line {line}: {message}", path.display())]
    Malformed {
        path:    PathBuf,
        line:    usize,
        message: String,
    },

    /// Rows handed to a batch do not share one width.
    #[error("batch rows have inconsistent widths: {widths:?}")]
    RaggedBatch { widths: Vec<usize> },

    #[error("i/o error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl NmtError {
    pub fn configuration(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            path:    path.into(),
            message: message.into(),
        }
    }

    pub fn uninitialized(what: impl Into<String>) -> Self {
        Self::UninitializedState { what: what.into() }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    pub fn malformed(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self::Malformed {
            path:    path.into(),
            line,
            message: message.into(),
        }
    }

    /// True for the fatal configuration class (bad keys, variants, cycles).
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. } | Self::CircularReference { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_class() {
        assert!(NmtError::configuration("Experiment:x", "missing").is_configuration());
        assert!(NmtError::CircularReference { chain: vec!["a".into(), "b".into()] }
            .is_configuration());
        assert!(!NmtError::InvalidKey("x".into()).is_configuration());
    }

    #[test]
    fn test_messages_name_the_offender() {
        let err = NmtError::configuration("Experiment:Policy:cuda", "unresolvable");
        assert!(err.to_string().contains("Experiment:Policy:cuda"));

        let err = NmtError::CircularReference { chain: vec!["a".into(), "b".into(), "a".into()] };
        assert_eq!(err.to_string(), "circular component reference: a -> b -> a");

        let err = NmtError::EmptyCorpus { path: PathBuf::from("/tmp/empty.txt") };
        assert!(err.to_string().contains("/tmp/empty.txt"));
    }
}
