// ============================================================
// Layer 5 — Component Resolver
// ============================================================
// Builds components from the configuration document.
//
// For a component node at path P, e.g.
//   Experiment:languages:en  =  {"Language": {...}}
//
//   1. look up the variant named by the tag in the registry and
//      check it is a concrete variant of the requested contract
//   2. fail with CircularReference if P is already being built
//   3. resolve every interface entry, in declared order:
//        Local      → the key in P's params (or its default)
//        Reference  → walk the document; a component node found
//                     there is built on demand
//        Child      → resolve the nested node
//        Children   → resolve every node of the nested map
//   4. call the constructor
//   5. trainable units: init_parameters(), then init_optimizer()
//   6. shareable results are cached by P, so every reference to
//      P receives the same instance
//
// References walk tagged nodes transparently: with
//   {"vocabulary": {"Vocabulary": {"vocab_path": "v.txt"}}}
// both `...:vocabulary:vocab_path` and
// `...:vocabulary:Vocabulary:vocab_path` reach "v.txt".

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use serde_json::Value;

use crate::component::config::{as_component_node, ConfigDocument, ConfigPath};
use crate::component::interface::{Contract, Source};
use crate::component::path::ReferencePath;
use crate::component::registry::{ComponentSpec, Registry};
use crate::component::value::{Arguments, Component};
use crate::domain::error::{NmtError, Result};

pub struct Resolver<'a> {
    registry:    &'a Registry,
    document:    &'a ConfigDocument,
    base_dir:    Option<PathBuf>,
    in_progress: Vec<ConfigPath>,
    cache:       HashMap<ConfigPath, Component>,
}

impl<'a> Resolver<'a> {
    pub fn new(registry: &'a Registry, document: &'a ConfigDocument) -> Self {
        Self {
            registry,
            document,
            base_dir: None,
            in_progress: Vec::new(),
            cache: HashMap::new(),
        }
    }

    /// Relative file paths in the document are read against `dir`.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Build the component node at `path` as a `contract`.
    pub fn resolve(&mut self, path: &ConfigPath, contract: Contract) -> Result<Component> {
        let node = self
            .document
            .get(path)
            .ok_or_else(|| NmtError::configuration(path.to_string(), "no component configured here"))?;

        let (tag, _) = as_component_node(node).ok_or_else(|| {
            NmtError::configuration(
                path.to_string(),
                format!("expected a component node {{\"<{contract} variant>\": {{...}}}}"),
            )
        })?;

        let spec = self.registry.concrete_for(tag, contract, &path.to_string())?.clone();
        self.build(path, &spec)
    }

    /// Build every component node of the map at `path`, keyed as in the document.
    pub fn resolve_children(
        &mut self,
        path:     &ConfigPath,
        contract: Contract,
    ) -> Result<BTreeMap<String, Component>> {
        let document = self.document;
        let entries = document.object(path).ok_or_else(|| {
            NmtError::configuration(path.to_string(), "expected a map of component nodes")
        })?;

        let mut children = BTreeMap::new();
        for key in entries.keys() {
            let child = self.resolve(&path.join(key.as_str()), contract)?;
            children.insert(key.clone(), child);
        }
        Ok(children)
    }

    /// Resolve `reference` as seen from the params object at `from`.
    pub fn resolve_reference(&mut self, reference: &ReferencePath, from: &ConfigPath) -> Result<Component> {
        match self.locate(reference, from) {
            Some(target) => self.materialize(&target),
            None if reference.is_optional() => {
                tracing::debug!("Optional reference '{}' from '{}' is absent", reference, from);
                Ok(Component::Absent)
            }
            None => Err(NmtError::configuration(
                from.to_string(),
                format!("cannot resolve reference '{reference}'"),
            )),
        }
    }

    // ─── Construction ─────────────────────────────────────────────────────────

    fn build(&mut self, path: &ConfigPath, spec: &ComponentSpec) -> Result<Component> {
        if let Some(cached) = self.cache.get(path).and_then(Component::share) {
            return Ok(cached);
        }

        if let Some(start) = self.in_progress.iter().position(|p| p == path) {
            let chain = self.in_progress[start..]
                .iter()
                .chain(std::iter::once(path))
                .map(ConfigPath::to_string)
                .collect();
            return Err(NmtError::CircularReference { chain });
        }

        self.in_progress.push(path.clone());
        let built = self.construct(path, spec);
        self.in_progress.pop();
        let component = built?;

        if spec.shareable {
            if let Some(shared) = component.share() {
                self.cache.insert(path.clone(), shared);
            }
        }

        Ok(component)
    }

    fn construct(&mut self, path: &ConfigPath, spec: &ComponentSpec) -> Result<Component> {
        tracing::debug!("Resolving {} at '{}'", spec.name, path);

        let constructor = spec.constructor.ok_or_else(|| {
            NmtError::configuration(path.to_string(), format!("'{}' is abstract", spec.name))
        })?;

        let params_path = path.join(spec.name);
        let mut parameters = (spec.interface)().into_parameters();
        for parameter in &mut parameters {
            let value = self.resolve_parameter(parameter.name(), parameter.source(), &params_path)?;
            parameter.assign(value);
        }

        let mut arguments = Arguments::new(path.to_string(), parameters).with_base_dir(self.base_dir.clone());
        let mut component = constructor(&mut arguments)?;

        if let Component::Unit(unit) = &mut component {
            unit.init_parameters()?;
            unit.init_optimizer()?;
            tracing::debug!("{} at '{}' initialised", unit.kind(), path);
        }

        Ok(component)
    }

    fn resolve_parameter(&mut self, name: &str, source: &Source, params_path: &ConfigPath) -> Result<Component> {
        let document = self.document;
        let local = document
            .get(params_path)
            .and_then(Value::as_object)
            .and_then(|params| params.get(name));

        match source {
            Source::Local { default } => local
                .or(default.as_ref())
                .map(|value| Component::Value(value.clone()))
                .ok_or_else(|| {
                    NmtError::configuration(params_path.join(name).to_string(), "missing required parameter")
                }),

            Source::Reference(reference) => self.resolve_reference(reference, params_path),

            Source::Child(contract) => {
                if local.is_none() {
                    return Err(NmtError::configuration(
                        params_path.join(name).to_string(),
                        format!("missing required {contract} component"),
                    ));
                }
                self.resolve(&params_path.join(name), *contract)
            }

            Source::Children(contract) => {
                let children = self.resolve_children(&params_path.join(name), *contract)?;
                Ok(Component::Map(children))
            }
        }
    }

    // ─── References ───────────────────────────────────────────────────────────

    fn is_node(&self, value: &Value) -> Option<String> {
        as_component_node(value)
            .map(|(tag, _)| tag)
            .filter(|tag| self.registry.contains(tag))
            .map(str::to_string)
    }

    /// Path the reference points at, if anything is there.
    fn locate(&self, reference: &ReferencePath, from: &ConfigPath) -> Option<ConfigPath> {
        let segments = reference.segments();

        if reference.is_scoped() {
            let (first, rest) = segments.split_first()?;
            let start = self.find_in_scope(first, from)?;
            self.walk(start, rest)
        } else {
            self.walk(ConfigPath::root(), segments)
        }
    }

    /// Search `from` and then each enclosing object for a key named
    /// `name` or a child node tagged `name`.
    fn find_in_scope(&self, name: &str, from: &ConfigPath) -> Option<ConfigPath> {
        let mut scope = Some(from.clone());

        while let Some(current) = scope {
            if let Some(object) = self.document.object(&current) {
                if object.contains_key(name) {
                    return Some(current.join(name));
                }
                let tagged = object
                    .iter()
                    .find(|(_, value)| self.is_node(value).as_deref() == Some(name));
                if let Some((key, _)) = tagged {
                    return Some(current.join(key.as_str()));
                }
            }
            scope = current.parent();
        }

        None
    }

    fn walk(&self, start: ConfigPath, segments: &[String]) -> Option<ConfigPath> {
        let mut current = start;

        for segment in segments {
            let value = self.document.get(&current)?;
            let object = value.as_object()?;

            if object.contains_key(segment) {
                current = current.join(segment.as_str());
                continue;
            }

            match (self.is_node(value), as_component_node(value)) {
                (Some(tag), Some((_, Some(params)))) if params.contains_key(segment) => {
                    current = current.join(tag).join(segment.as_str());
                }
                _ => return None,
            }
        }

        Some(current)
    }

    /// Turn a located path into a component: nodes (or the params
    /// object of a node) are built, anything else is a plain value.
    fn materialize(&mut self, target: &ConfigPath) -> Result<Component> {
        let document = self.document;
        let value = document
            .get(target)
            .ok_or_else(|| NmtError::configuration(target.to_string(), "nothing configured here"))?;

        if let Some(tag) = self.is_node(value) {
            return self.resolve_shared(target, &tag);
        }

        if let (Some(parent), Some(last)) = (target.parent(), target.last()) {
            let parent_tag = document.get(&parent).and_then(|v| self.is_node(v));
            if parent_tag.as_deref() == Some(last) {
                return self.resolve_shared(&parent, last);
            }
        }

        Ok(Component::Value(value.clone()))
    }

    fn resolve_shared(&mut self, node_path: &ConfigPath, tag: &str) -> Result<Component> {
        let spec = self
            .registry
            .get(tag)
            .ok_or_else(|| NmtError::configuration(node_path.to_string(), format!("unknown component '{tag}'")))?;
        let spec = self.registry.concrete_for(tag, spec.contract, &node_path.to_string())?.clone();

        if !spec.shareable {
            return Err(NmtError::configuration(
                node_path.to_string(),
                format!("a {} component belongs to its parent and cannot be referenced", spec.contract),
            ));
        }

        self.build(node_path, &spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Arc;

    use serde_json::json;

    use crate::component::interface::Interface;
    use crate::ml::unit::Lifecycle;
    use crate::test_support::write_file;

    fn fixture(dir: &Path) {
        write_file(dir, "vocab.txt", "3 2\nhello 0.1 0.2\nworld 0.3 0.4\nagain 0.5 0.6\n");
        write_file(dir, "train.txt", "hello world\nworld\nhello again world\nagain\nhello\n");
        write_file(dir, "dev.txt", "hello\nworld\n");
        write_file(dir, "test.txt", "again\nhello world\n");
    }

    fn pipeline(kind: &str, file: &str) -> Value {
        json!({ kind: {
            "max_segment_size": 2,
            "batch_size": 2,
            "shuffle": false,
            "corpora": { "Monolingual": { "data_path": file } }
        }})
    }

    fn experiment() -> Value {
        json!({ "Experiment": {
            "Policy": { "cuda": false },
            "language_identifiers": ["<en>"],
            "languages": {
                "en": { "Language": {
                    "identifier": "<en>",
                    "vocabulary": { "Vocabulary": {
                        "vocab_path": "vocab.txt",
                        "provided_embeddings": true
                    }},
                    "input_pipelines": {
                        "train": pipeline("MemoryInput", "train.txt"),
                        "dev": pipeline("FileInput", "dev.txt"),
                        "test": pipeline("MemoryInput", "test.txt")
                    }
                }}
            }
        }})
    }

    fn resolve_languages(dir: &Path, config: Value) -> Result<BTreeMap<String, Component>> {
        let registry = Registry::with_defaults();
        let document = ConfigDocument::new(config).unwrap();
        let mut resolver = Resolver::new(&registry, &document).with_base_dir(dir);
        resolver.resolve_children(&ConfigPath::parse("Experiment:languages"), Contract::Language)
    }

    #[test]
    fn test_resolves_full_language() {
        let dir = tempfile::tempdir().unwrap();
        fixture(dir.path());

        let languages = resolve_languages(dir.path(), experiment()).unwrap();
        let Some(Component::Language(en)) = languages.get("en") else {
            panic!("expected a Language, got {languages:?}");
        };

        assert_eq!(en.identifier(), "<en>");
        assert_eq!(en.vocabulary().word_to_id("<en>").unwrap(), 3);
        assert!(en.vocabulary().embedding_weights().is_some());

        // one canonical vocabulary shared by every pipeline and corpus
        for split in ["train", "dev", "test"] {
            let pipeline = en.pipeline(split).unwrap();
            assert!(Arc::ptr_eq(pipeline.vocabulary().unwrap(), en.vocabulary()));
            assert!(Arc::ptr_eq(pipeline.corpora().vocabulary().unwrap(), en.vocabulary()));
        }

        let train = en.train().unwrap();
        assert_eq!(train.padding_type(), "PostPadding");
        assert_eq!(train.batch_generator().count(), 2);
        assert_eq!(en.dev().unwrap().kind(), "FileInput");
    }

    #[test]
    fn test_missing_split_fails_resolution() {
        let dir = tempfile::tempdir().unwrap();
        fixture(dir.path());

        let mut config = experiment();
        config["Experiment"]["languages"]["en"]["Language"]["input_pipelines"]
            .as_object_mut()
            .unwrap()
            .remove("test");

        let err = resolve_languages(dir.path(), config).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_unknown_and_abstract_variants() {
        let dir = tempfile::tempdir().unwrap();
        fixture(dir.path());

        let mut config = experiment();
        let train = &mut config["Experiment"]["languages"]["en"]["Language"]["input_pipelines"]["train"];
        *train = pipeline("StreamInput", "train.txt");
        let err = resolve_languages(dir.path(), config).unwrap_err();
        assert!(err.to_string().contains("FileInput"));
        assert!(err.to_string().contains("MemoryInput"));

        let mut config = experiment();
        let train = &mut config["Experiment"]["languages"]["en"]["Language"]["input_pipelines"]["train"];
        *train = pipeline("InputPipeline", "train.txt");
        let err = resolve_languages(dir.path(), config).unwrap_err();
        assert!(err.to_string().contains("abstract"));
    }

    #[test]
    fn test_missing_required_reference() {
        let dir = tempfile::tempdir().unwrap();
        fixture(dir.path());

        let mut config = experiment();
        config["Experiment"].as_object_mut().unwrap().remove("Policy");

        let err = resolve_languages(dir.path(), config).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("Experiment:Policy:cuda"));
    }

    #[test]
    fn test_missing_required_local() {
        let dir = tempfile::tempdir().unwrap();
        fixture(dir.path());

        let mut config = experiment();
        config["Experiment"]["languages"]["en"]["Language"]["input_pipelines"]["dev"]["FileInput"]
            .as_object_mut()
            .unwrap()
            .remove("batch_size");

        let err = resolve_languages(dir.path(), config).unwrap_err();
        assert!(err.to_string().contains("batch_size"));
    }

    #[test]
    fn test_optional_reference_resolves_to_absent() {
        let dir = tempfile::tempdir().unwrap();
        fixture(dir.path());

        let registry = Registry::with_defaults();
        let document = ConfigDocument::new(json!({ "Experiment": {
            "corpus": { "Monolingual": { "data_path": "train.txt" } }
        }}))
        .unwrap();
        let mut resolver = Resolver::new(&registry, &document).with_base_dir(dir.path());

        let Component::Corpus(corpus) = resolver
            .resolve(&ConfigPath::parse("Experiment:corpus"), Contract::Corpora)
            .unwrap()
        else {
            panic!("expected a corpus");
        };
        assert!(!corpus.cuda());
        assert!(matches!(corpus.vocab_size(), Err(NmtError::UnresolvedVocabulary { .. })));
    }

    #[test]
    fn test_parallel_second_vocabulary_is_its_own_key() {
        let dir = tempfile::tempdir().unwrap();
        fixture(dir.path());
        write_file(dir.path(), "vocab_fr.txt", "2 2\nbonjour 0.1 0.2\nmonde 0.3 0.4\n");
        write_file(dir.path(), "parallel.txt", "hello world ||| bonjour monde\n");

        let registry = Registry::with_defaults();
        let document = ConfigDocument::new(json!({ "Experiment": {
            "vocabulary": { "Vocabulary": { "vocab_path": "vocab.txt" } },
            "Policy": { "cuda": false },
            "language_identifiers": [],
            "second_vocabulary": { "Vocabulary": { "vocab_path": "vocab_fr.txt" } },
            "corpus": { "Parallel": { "data_path": "parallel.txt" } }
        }}))
        .unwrap();
        let mut resolver = Resolver::new(&registry, &document).with_base_dir(dir.path());

        let Component::Corpus(corpus) = resolver
            .resolve(&ConfigPath::parse("Experiment:corpus"), Contract::Corpora)
            .unwrap()
        else {
            panic!("expected a corpus");
        };

        let source = corpus.side_vocabulary(0).unwrap();
        let target = corpus.side_vocabulary(1).unwrap();
        assert!(!Arc::ptr_eq(source, target));
        assert_eq!(source.vocab_size(), target.vocab_size() + 1);
    }

    #[test]
    fn test_reference_walks_through_component_nodes() {
        let registry = Registry::with_defaults();
        let document = ConfigDocument::new(experiment()).unwrap();
        let mut resolver = Resolver::new(&registry, &document);
        let from = ConfigPath::parse("Experiment:languages:en:Language");

        for path in [
            "Experiment:languages:en:identifier",
            "Experiment:languages:en:Language:identifier",
            ":identifier",
        ] {
            let reference: ReferencePath = path.parse().unwrap();
            let Component::Value(value) = resolver.resolve_reference(&reference, &from).unwrap() else {
                panic!("expected a value for {path}");
            };
            assert_eq!(value, json!("<en>"));
        }
    }

    // ─── Test-only variants ───────────────────────────────────────────────────

    fn ping_interface() -> Interface {
        Interface::new().reference("other", "", "Experiment:pong")
    }

    fn pong_interface() -> Interface {
        Interface::new().reference("other", "", "Experiment:ping")
    }

    fn borrower_interface() -> Interface {
        Interface::new().reference("target", "", "Experiment:corpus")
    }

    fn build_value(_: &mut Arguments) -> Result<Component> {
        Ok(Component::Value(json!("built")))
    }

    #[test]
    fn test_circular_reference_is_detected() {
        let mut registry = Registry::with_defaults();
        registry
            .register(ComponentSpec::concrete("Ping", Contract::Model, ping_interface, build_value).shared())
            .unwrap();
        registry
            .register(ComponentSpec::concrete("Pong", Contract::Model, pong_interface, build_value).shared())
            .unwrap();

        let document = ConfigDocument::new(json!({ "Experiment": {
            "ping": { "Ping": {} },
            "pong": { "Pong": {} }
        }}))
        .unwrap();
        let mut resolver = Resolver::new(&registry, &document);

        let err = resolver.resolve(&ConfigPath::parse("Experiment:ping"), Contract::Model).unwrap_err();
        match err {
            NmtError::CircularReference { chain } => {
                assert_eq!(chain, vec!["Experiment:ping", "Experiment:pong", "Experiment:ping"]);
            }
            other => panic!("expected a circular reference, got {other}"),
        }
    }

    #[test]
    fn test_owned_components_cannot_be_referenced() {
        let dir = tempfile::tempdir().unwrap();
        fixture(dir.path());

        let mut registry = Registry::with_defaults();
        registry
            .register(ComponentSpec::concrete("Borrower", Contract::Model, borrower_interface, build_value))
            .unwrap();

        let document = ConfigDocument::new(json!({ "Experiment": {
            "corpus": { "Monolingual": { "data_path": "train.txt" } },
            "borrower": { "Borrower": {} }
        }}))
        .unwrap();
        let mut resolver = Resolver::new(&registry, &document).with_base_dir(dir.path());

        let err = resolver.resolve(&ConfigPath::parse("Experiment:borrower"), Contract::Model).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("cannot be referenced"));
    }

    #[test]
    fn test_model_units_are_initialised_before_parent() {
        let dir = tempfile::tempdir().unwrap();
        fixture(dir.path());

        let mut config = experiment();
        config["Experiment"]["Model"] = json!({ "SeqToSeq": {
            "shared": { "Vocabulary": { "vocab_path": "vocab.txt" } },
            "encoder": { "EmbeddingEncoder": {} },
            "decoder": { "EmbeddingDecoder": { "learning_rate": 0.5 } }
        }});

        let registry = Registry::with_defaults();
        let document = ConfigDocument::new(config).unwrap();
        let mut resolver = Resolver::new(&registry, &document).with_base_dir(dir.path());

        let Component::Unit(model) = resolver
            .resolve(&ConfigPath::parse("Experiment:Model"), Contract::Model)
            .unwrap()
        else {
            panic!("expected a trainable unit");
        };
        assert_eq!(model.kind(), "SeqToSeq");
        assert_eq!(model.lifecycle(), Lifecycle::Ready);
    }
}
