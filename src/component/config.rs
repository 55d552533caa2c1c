// ============================================================
// Layer 5 — Configuration Document
// ============================================================
// The JSON document components are assembled from. A component
// node is an object with a single key naming its variant:
//
//   {
//     "Experiment": {
//       "Policy": { "cuda": false },
//       "language_identifiers": ["<en>", "<fr>"],
//       "languages": {
//         "en": {
//           "Language": {
//             "identifier": "<en>",
//             "vocabulary": { "Vocabulary": { "vocab_path": "vocab.en" } },
//             "input_pipelines": {
//               "train": { "MemoryInput": { ... } },
//               ...
//
// Paths address nodes by key, e.g.
// `Experiment:languages:en:Language:vocabulary`.

use std::fmt;
use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::domain::error::{NmtError, Result};

/// Location in the document, as the list of keys from the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ConfigPath(Vec<String>);

impl ConfigPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn parse(text: &str) -> Self {
        Self(text.split(':').filter(|s| !s.is_empty()).map(str::to_string).collect())
    }

    pub fn join(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.0.split_last()?;
        Some(Self(rest.to_vec()))
    }

    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ConfigPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "<root>")
        } else {
            write!(f, "{}", self.0.join(":"))
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigDocument {
    root: Value,
}

impl ConfigDocument {
    pub fn new(root: Value) -> Result<Self> {
        if !root.is_object() {
            return Err(NmtError::configuration("<root>", "configuration must be a JSON object"));
        }
        Ok(Self { root })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| NmtError::io(path, e))?;
        let document = Self::parse(&text)?;
        tracing::debug!("Configuration loaded from '{}'", path.display());
        Ok(document)
    }

    pub fn parse(text: &str) -> Result<Self> {
        Self::new(serde_json::from_str(text)?)
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Value at an exact path, no transparent descent.
    pub fn get(&self, path: &ConfigPath) -> Option<&Value> {
        path.segments()
            .iter()
            .try_fold(&self.root, |value, segment| value.as_object()?.get(segment))
    }

    pub fn object(&self, path: &ConfigPath) -> Option<&Map<String, Value>> {
        self.get(path)?.as_object()
    }
}

/// `{"Variant": {...}}` → ("Variant", params). A null or missing
/// params value reads as an empty object.
pub fn as_component_node(value: &Value) -> Option<(&str, Option<&Map<String, Value>>)> {
    let object = value.as_object()?;
    if object.len() != 1 {
        return None;
    }
    let (tag, params) = object.iter().next()?;
    match params {
        Value::Object(params) => Some((tag.as_str(), Some(params))),
        Value::Null => Some((tag.as_str(), None)),
        _ => None,
    }
}
