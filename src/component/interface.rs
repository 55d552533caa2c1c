// ============================================================
// Layer 5 — Component Interfaces
// ============================================================
// Every resolvable variant declares, in order, the inputs its
// constructor needs and where each one comes from:
//
//   Local      — the component's own configuration object,
//                optionally with a default
//   Reference  — a path elsewhere in the document
//   Child      — a nested component node of a given contract
//   Children   — a map of names to nested component nodes
//
// The resolver fills the entries in exactly this order.

use std::fmt;

use serde_json::Value;

use crate::component::parameter::ParameterDescriptor;
use crate::component::path::ReferencePath;

/// The abstract role a variant fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Contract {
    Vocabulary,
    Corpora,
    InputPipeline,
    Language,
    Encoder,
    Decoder,
    Model,
}

impl fmt::Display for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Local { default: Option<Value> },
    Reference(ReferencePath),
    Child(Contract),
    Children(Contract),
}

/// Ordered interface declaration, built with chained calls:
///
/// ```text
/// Interface::new()
///     .local("data_path", "corpus file")
///     .reference("vocabulary", "shared vocabulary", ":Vocabulary$")
///     .child("corpora", "data source", Contract::Corpora)
/// ```
#[derive(Debug, Default)]
pub struct Interface {
    parameters: Vec<ParameterDescriptor>,
}

impl Interface {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, name: &str, documentation: &str, source: Source) -> Self {
        self.parameters.push(ParameterDescriptor::new(name, documentation, source));
        self
    }

    /// Required local value.
    pub fn local(self, name: &str, documentation: &str) -> Self {
        self.push(name, documentation, Source::Local { default: None })
    }

    /// Local value with a default used when the key is missing.
    pub fn local_or(self, name: &str, documentation: &str, default: Value) -> Self {
        self.push(name, documentation, Source::Local { default: Some(default) })
    }

    /// Reference path. Panics on a malformed literal; every built-in
    /// interface is built once under test in the registry.
    pub fn reference(self, name: &str, documentation: &str, path: &str) -> Self {
        let path = path
            .parse::<ReferencePath>()
            .unwrap_or_else(|e| panic!("invalid reference path in interface of '{name}': {e}"));
        self.push(name, documentation, Source::Reference(path))
    }

    pub fn child(self, name: &str, documentation: &str, contract: Contract) -> Self {
        self.push(name, documentation, Source::Child(contract))
    }

    pub fn children(self, name: &str, documentation: &str, contract: Contract) -> Self {
        self.push(name, documentation, Source::Children(contract))
    }

    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.parameters
    }

    pub fn names(&self) -> Vec<&str> {
        self.parameters.iter().map(ParameterDescriptor::name).collect()
    }

    pub fn into_parameters(self) -> Vec<ParameterDescriptor> {
        self.parameters
    }
}
