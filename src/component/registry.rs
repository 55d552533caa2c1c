// ============================================================
// Layer 5 — Component Registry
// ============================================================
// Explicit table of every variant the resolver can build, keyed by
// the name used as the tag of a component node:
//
//   "MemoryInput" → ComponentSpec {
//       contract:    InputPipeline,
//       interface:   max_segment_size, batch_size, ..., corpora,
//       constructor: Some(build_memory_input),
//   }
//
// Abstract contracts are registered too (without a constructor) so
// a configuration naming one gets a precise error.
//
// Variants defined outside this crate (concrete encoders and
// decoders) are added with `register`.

use std::collections::BTreeMap;

use crate::component::builtins;
use crate::component::interface::{Contract, Interface};
use crate::component::value::{Arguments, Component};
use crate::domain::error::{NmtError, Result};

/// Builds a component from its resolved arguments.
pub type Constructor = fn(&mut Arguments) -> Result<Component>;

#[derive(Debug, Clone)]
pub struct ComponentSpec {
    pub name:        &'static str,
    pub contract:    Contract,
    /// Shared components are built once per path and may be referenced.
    pub shareable:   bool,
    pub interface:   fn() -> Interface,
    /// None for abstract contracts.
    pub constructor: Option<Constructor>,
}

impl ComponentSpec {
    pub fn concrete(
        name:        &'static str,
        contract:    Contract,
        interface:   fn() -> Interface,
        constructor: Constructor,
    ) -> Self {
        Self { name, contract, shareable: false, interface, constructor: Some(constructor) }
    }

    pub fn abstract_contract(name: &'static str, contract: Contract) -> Self {
        Self { name, contract, shareable: false, interface: Interface::new, constructor: None }
    }

    pub fn shared(mut self) -> Self {
        self.shareable = true;
        self
    }

    pub fn is_abstract(&self) -> bool {
        self.constructor.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    specs: BTreeMap<&'static str, ComponentSpec>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in variant and abstract contract.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for spec in builtins::specs() {
            registry.specs.insert(spec.name, spec);
        }
        registry
    }

    /// Add a variant. Names are unique across contracts.
    pub fn register(&mut self, spec: ComponentSpec) -> Result<()> {
        if self.specs.contains_key(spec.name) {
            return Err(NmtError::configuration(
                spec.name,
                "a component variant with this name is already registered",
            ));
        }
        tracing::debug!("Registered component '{}' ({})", spec.name, spec.contract);
        self.specs.insert(spec.name, spec);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ComponentSpec> {
        self.specs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.specs.contains_key(name)
    }

    /// Concrete variant names implementing `contract`, sorted.
    pub fn variants(&self, contract: Contract) -> Vec<&'static str> {
        self.specs
            .values()
            .filter(|spec| spec.contract == contract && !spec.is_abstract())
            .map(|spec| spec.name)
            .collect()
    }

    /// The variant to build `name` as a `contract`, or a configuration
    /// error listing the variants that would have been accepted.
    pub fn concrete_for(&self, name: &str, contract: Contract, path: &str) -> Result<&ComponentSpec> {
        let problem = match self.specs.get(name) {
            Some(spec) if spec.contract != contract => {
                format!("'{name}' is a {} variant, not a {contract}", spec.contract)
            }
            Some(spec) if spec.is_abstract() => format!("'{name}' is abstract"),
            Some(spec) => return Ok(spec),
            None => format!("unknown component '{name}'"),
        };

        Err(NmtError::configuration(
            path,
            format!("{problem}; concrete {contract} variants: {:?}", self.variants(contract)),
        ))
    }
}
