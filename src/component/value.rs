// ============================================================
// Layer 5 — Resolved Components
// ============================================================
// Everything the resolver can produce for one interface entry,
// and the argument table a constructor reads its inputs from.
//
//   Value        — a plain configuration value (string, number, list...)
//   Absent       — an optional reference that found nothing
//   Vocabulary   ┐
//   Language     ┘ shared: one instance per configuration path
//   Corpus       ┐
//   Pipeline     │ owned: handed to exactly one parent
//   Unit         ┘
//   Map          — a named group of children ("input_pipelines")

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;

use crate::component::parameter::ParameterDescriptor;
use crate::data::language::Language;
use crate::data::vocabulary::Vocabulary;
use crate::domain::error::{NmtError, Result};
use crate::domain::traits::{Corpus, InputPipeline};
use crate::ml::unit::TrainableUnit;

#[derive(Debug)]
pub enum Component {
    Value(Value),
    Absent,
    Vocabulary(Arc<Vocabulary>),
    Language(Arc<Language>),
    Corpus(Box<dyn Corpus>),
    Pipeline(Box<dyn InputPipeline>),
    Unit(Box<dyn TrainableUnit>),
    Map(BTreeMap<String, Component>),
}

impl Component {
    /// Short description used in error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            Component::Value(_) => "value",
            Component::Absent => "absent",
            Component::Vocabulary(_) => "Vocabulary",
            Component::Language(_) => "Language",
            Component::Corpus(_) => "Corpora",
            Component::Pipeline(_) => "InputPipeline",
            Component::Unit(_) => "trainable unit",
            Component::Map(_) => "map",
        }
    }

    /// A second handle to the same instance, for components that can
    /// be referenced from several places. None for owned components.
    pub fn share(&self) -> Option<Component> {
        match self {
            Component::Value(v) => Some(Component::Value(v.clone())),
            Component::Absent => Some(Component::Absent),
            Component::Vocabulary(v) => Some(Component::Vocabulary(Arc::clone(v))),
            Component::Language(l) => Some(Component::Language(Arc::clone(l))),
            Component::Corpus(_) | Component::Pipeline(_) | Component::Unit(_) => None,
            Component::Map(entries) => entries
                .iter()
                .map(|(k, v)| v.share().map(|v| (k.clone(), v)))
                .collect::<Option<BTreeMap<_, _>>>()
                .map(Component::Map),
        }
    }
}

// ─── Arguments ────────────────────────────────────────────────────────────────

/// Resolved interface of one component, in declaration order.
/// Constructors take their inputs out by name.
#[derive(Debug)]
pub struct Arguments {
    /// Configuration path of the component being built.
    path:       String,
    parameters: Vec<ParameterDescriptor>,
    /// Relative file paths are read against this directory.
    base_dir:   Option<PathBuf>,
}

impl Arguments {
    pub fn new(path: impl Into<String>, parameters: Vec<ParameterDescriptor>) -> Self {
        Self { path: path.into(), parameters, base_dir: None }
    }

    pub fn with_base_dir(mut self, base_dir: Option<PathBuf>) -> Self {
        self.base_dir = base_dir;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.parameters
    }

    fn param_path(&self, name: &str) -> String {
        format!("{}:{}", self.path, name)
    }

    fn descriptor(&self, name: &str) -> Result<&ParameterDescriptor> {
        self.parameters
            .iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| NmtError::configuration(self.param_path(name), "not declared in the interface"))
    }

    fn descriptor_mut(&mut self, name: &str) -> Result<&mut ParameterDescriptor> {
        let path = self.param_path(name);
        self.parameters
            .iter_mut()
            .find(|p| p.name() == name)
            .ok_or_else(|| NmtError::configuration(path, "not declared in the interface"))
    }

    fn type_error(&self, name: &str, expected: &str, found: &Component) -> NmtError {
        NmtError::configuration(
            self.param_path(name),
            format!("expected {expected}, found {}", found_text(found)),
        )
    }

    /// The plain value of a parameter; None when it resolved to Absent or null.
    pub fn value(&self, name: &str) -> Result<Option<&Value>> {
        match self.descriptor(name)?.value()? {
            Component::Value(Value::Null) | Component::Absent => Ok(None),
            Component::Value(v) => Ok(Some(v)),
            other => Err(self.type_error(name, "a plain value", other)),
        }
    }

    fn required(&self, name: &str) -> Result<&Value> {
        self.value(name)?
            .ok_or_else(|| NmtError::configuration(self.param_path(name), "a value is required"))
    }

    pub fn string(&self, name: &str) -> Result<String> {
        match self.required(name)? {
            Value::String(s) => Ok(s.clone()),
            other => Err(NmtError::configuration(
                self.param_path(name),
                format!("expected a string, found {other}"),
            )),
        }
    }

    /// A file path, joined onto the base directory when relative.
    pub fn path_buf(&self, name: &str) -> Result<PathBuf> {
        let path = PathBuf::from(self.string(name)?);
        Ok(match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path,
        })
    }

    pub fn bool(&self, name: &str) -> Result<bool> {
        match self.required(name)? {
            Value::Bool(b) => Ok(*b),
            other => Err(NmtError::configuration(
                self.param_path(name),
                format!("expected true or false, found {other}"),
            )),
        }
    }

    /// Absent or null reads as false.
    pub fn flag(&self, name: &str) -> Result<bool> {
        match self.value(name)? {
            None => Ok(false),
            Some(_) => self.bool(name),
        }
    }

    pub fn usize(&self, name: &str) -> Result<usize> {
        self.required(name)?
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| {
                NmtError::configuration(self.param_path(name), "expected a non-negative integer")
            })
    }

    pub fn optional_u64(&self, name: &str) -> Result<Option<u64>> {
        match self.value(name)? {
            None => Ok(None),
            Some(v) => v.as_u64().map(Some).ok_or_else(|| {
                NmtError::configuration(self.param_path(name), "expected a non-negative integer")
            }),
        }
    }

    pub fn f64(&self, name: &str) -> Result<f64> {
        self.required(name)?
            .as_f64()
            .ok_or_else(|| NmtError::configuration(self.param_path(name), "expected a number"))
    }

    /// A list of strings; Absent or null reads as an empty list.
    pub fn string_list(&self, name: &str) -> Result<Vec<String>> {
        let Some(value) = self.value(name)? else {
            return Ok(Vec::new());
        };
        value
            .as_array()
            .and_then(|items| items.iter().map(|i| i.as_str().map(str::to_string)).collect())
            .ok_or_else(|| {
                NmtError::configuration(self.param_path(name), "expected a list of strings")
            })
    }

    /// A shared vocabulary, or None when an optional reference found nothing.
    pub fn optional_vocabulary(&self, name: &str) -> Result<Option<Arc<Vocabulary>>> {
        match self.descriptor(name)?.value()? {
            Component::Vocabulary(v) => Ok(Some(Arc::clone(v))),
            Component::Absent | Component::Value(Value::Null) => Ok(None),
            other => Err(self.type_error(name, "a Vocabulary", other)),
        }
    }

    pub fn vocabulary(&self, name: &str) -> Result<Arc<Vocabulary>> {
        self.optional_vocabulary(name)?
            .ok_or_else(|| NmtError::configuration(self.param_path(name), "a Vocabulary is required"))
    }

    fn take(&mut self, name: &str) -> Result<Component> {
        self.descriptor_mut(name)?.take()
    }

    pub fn take_corpus(&mut self, name: &str) -> Result<Box<dyn Corpus>> {
        match self.take(name)? {
            Component::Corpus(c) => Ok(c),
            other => Err(self.type_error(name, "a Corpora component", &other)),
        }
    }

    pub fn take_unit(&mut self, name: &str) -> Result<Box<dyn TrainableUnit>> {
        match self.take(name)? {
            Component::Unit(u) => Ok(u),
            other => Err(self.type_error(name, "a trainable unit", &other)),
        }
    }

    pub fn take_pipelines(&mut self, name: &str) -> Result<BTreeMap<String, Box<dyn InputPipeline>>> {
        let entries = match self.take(name)? {
            Component::Map(entries) => entries,
            other => return Err(self.type_error(name, "a map of InputPipeline components", &other)),
        };

        entries
            .into_iter()
            .map(|(key, component)| match component {
                Component::Pipeline(p) => Ok((key, p)),
                other => Err(self.type_error(name, "InputPipeline components", &other)),
            })
            .collect()
    }
}

fn found_text(found: &Component) -> String {
    match found {
        Component::Value(v) => format!("the value {v}"),
        other => format!("a {} component", other.describe()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::interface::Source;
    use serde_json::json;

    fn args(values: Vec<(&str, Component)>) -> Arguments {
        let parameters = values
            .into_iter()
            .map(|(name, value)| {
                let mut p = ParameterDescriptor::new(name, "", Source::Local { default: None });
                p.assign(value);
                p
            })
            .collect();
        Arguments::new("Experiment:Thing", parameters)
    }

    #[test]
    fn test_typed_getters() {
        let a = args(vec![
            ("name", Component::Value(json!("x"))),
            ("size", Component::Value(json!(4))),
            ("on", Component::Value(json!(true))),
            ("list", Component::Value(json!(["<a>", "<b>"]))),
            ("rate", Component::Value(json!(0.5))),
            ("seed", Component::Value(Value::Null)),
            ("soft", Component::Absent),
        ]);

        assert_eq!(a.string("name").unwrap(), "x");
        assert_eq!(a.usize("size").unwrap(), 4);
        assert!(a.bool("on").unwrap());
        assert_eq!(a.string_list("list").unwrap(), vec!["<a>", "<b>"]);
        assert_eq!(a.f64("rate").unwrap(), 0.5);
        assert_eq!(a.optional_u64("seed").unwrap(), None);
        assert!(!a.flag("soft").unwrap());
        assert!(a.string_list("soft").unwrap().is_empty());
        assert!(a.optional_vocabulary("soft").unwrap().is_none());
    }

    #[test]
    fn test_relative_paths_use_base_dir() {
        let a = args(vec![
            ("rel", Component::Value(json!("data/train.txt"))),
            ("abs", Component::Value(json!("/corpora/train.txt"))),
        ])
        .with_base_dir(Some(PathBuf::from("/experiments/run1")));

        assert_eq!(a.path_buf("rel").unwrap(), PathBuf::from("/experiments/run1/data/train.txt"));
        assert_eq!(a.path_buf("abs").unwrap(), PathBuf::from("/corpora/train.txt"));
    }

    #[test]
    fn test_type_mismatch_names_the_parameter() {
        let a = args(vec![("size", Component::Value(json!("four")))]);
        let err = a.usize("size").unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("Experiment:Thing:size"));

        assert!(a.string("missing").unwrap_err().is_configuration());
    }

    #[test]
    fn test_share_only_shareable() {
        assert!(Component::Value(json!(1)).share().is_some());
        assert!(Component::Absent.share().is_some());

        let mut map = BTreeMap::new();
        map.insert("a".to_string(), Component::Value(json!(1)));
        assert!(Component::Map(map).share().is_some());
    }
}
