// ============================================================
// Layer 5 — Built-in Components
// ============================================================
// Interface declarations and constructors for the variants that
// ship with the crate. Each constructor only reads its Arguments
// and calls the plain Rust constructor of the data or ml layer.

use std::sync::Arc;

use serde_json::json;

use crate::component::interface::{Contract, Interface};
use crate::component::registry::ComponentSpec;
use crate::component::value::{Arguments, Component};
use crate::data::corpora::{Monolingual, Parallel};
use crate::data::input_pipeline::{FileInput, MemoryInput, PipelineSettings};
use crate::data::language::Language;
use crate::data::padding::POST_PADDING;
use crate::data::vocabulary::Vocabulary;
use crate::domain::error::Result;
use crate::ml::embedding::{EmbeddingUnit, Role};
use crate::ml::seq2seq::SeqToSeq;

const CUDA_POLICY: &str = "Experiment:Policy:cuda";

pub fn specs() -> Vec<ComponentSpec> {
    vec![
        ComponentSpec::abstract_contract("Corpora", Contract::Corpora),
        ComponentSpec::abstract_contract("InputPipeline", Contract::InputPipeline),
        ComponentSpec::abstract_contract("Encoder", Contract::Encoder),
        ComponentSpec::abstract_contract("Decoder", Contract::Decoder),
        ComponentSpec::abstract_contract("Model", Contract::Model),
        ComponentSpec::concrete("Vocabulary", Contract::Vocabulary, vocabulary_interface, build_vocabulary)
            .shared(),
        ComponentSpec::concrete("Monolingual", Contract::Corpora, monolingual_interface, build_monolingual),
        ComponentSpec::concrete("Parallel", Contract::Corpora, parallel_interface, build_parallel),
        ComponentSpec::concrete("MemoryInput", Contract::InputPipeline, pipeline_interface, build_memory_input),
        ComponentSpec::concrete("FileInput", Contract::InputPipeline, pipeline_interface, build_file_input),
        ComponentSpec::concrete("Language", Contract::Language, language_interface, build_language).shared(),
        ComponentSpec::concrete("SeqToSeq", Contract::Model, seq2seq_interface, build_seq2seq),
        ComponentSpec::concrete("EmbeddingEncoder", Contract::Encoder, embedding_unit_interface, build_embedding_encoder),
        ComponentSpec::concrete("EmbeddingDecoder", Contract::Decoder, embedding_unit_interface, build_embedding_decoder),
    ]
}

// ─── Vocabulary ───────────────────────────────────────────────────────────────

fn vocabulary_interface() -> Interface {
    Interface::new()
        .local("vocab_path", "vocabulary file: '<N> <D>' header, then '<word> <w1> .. <wD>' lines")
        .local_or("provided_embeddings", "load the weight columns as the embedding matrix", json!(false))
        .local_or("fixed_embeddings", "exclude the embedding from training", json!(false))
        .reference("cuda", "device acceleration flag", CUDA_POLICY)
        .reference("language_identifiers", "tokens appended after the file words", "Experiment:language_identifiers")
}

fn build_vocabulary(args: &mut Arguments) -> Result<Component> {
    let vocabulary = Vocabulary::from_file(
        args.path_buf("vocab_path")?,
        &args.string_list("language_identifiers")?,
        args.flag("provided_embeddings")?,
        args.flag("fixed_embeddings")?,
        args.flag("cuda")?,
    )?;
    Ok(Component::Vocabulary(Arc::new(vocabulary)))
}

// ─── Corpora ──────────────────────────────────────────────────────────────────

fn monolingual_interface() -> Interface {
    Interface::new()
        .local("data_path", "corpus file, one sentence per line")
        .reference("vocabulary", "vocabulary of the enclosing component", ":Vocabulary$")
        .reference("cuda", "device acceleration flag", "Experiment:Policy:cuda$")
}

fn build_monolingual(args: &mut Arguments) -> Result<Component> {
    let corpus = Monolingual::new(
        args.path_buf("data_path")?,
        args.optional_vocabulary("vocabulary")?,
        args.flag("cuda")?,
    )?;
    Ok(Component::Corpus(Box::new(corpus)))
}

fn parallel_interface() -> Interface {
    Interface::new()
        .local("data_path", "corpus file, one separator-joined sentence tuple per line")
        .local_or("separator", "token between the languages of a line", json!(" ||| "))
        .reference("vocabulary", "source vocabulary", ":Vocabulary$")
        .reference("second_vocabulary", "target vocabulary, defaults to the source one", ":second_vocabulary$")
        .reference("cuda", "device acceleration flag", "Experiment:Policy:cuda$")
}

fn build_parallel(args: &mut Arguments) -> Result<Component> {
    let corpus = Parallel::new(
        args.path_buf("data_path")?,
        args.string("separator")?,
        args.optional_vocabulary("vocabulary")?,
        args.optional_vocabulary("second_vocabulary")?,
        args.flag("cuda")?,
    )?;
    Ok(Component::Corpus(Box::new(corpus)))
}

// ─── Input pipelines ──────────────────────────────────────────────────────────

fn pipeline_interface() -> Interface {
    Interface::new()
        .local("max_segment_size", "samples per shuffling segment")
        .local("batch_size", "samples per batch")
        .local_or("padding_type", "PostPadding or PrePadding", json!(POST_PADDING))
        .local_or("shuffle", "shuffle every segment", json!(true))
        .reference("cuda", "device acceleration flag", "Experiment:Policy:cuda$")
        .child("corpora", "data source", Contract::Corpora)
        .local_or("seed", "fixed shuffling seed", serde_json::Value::Null)
        .local_or("side", "side of a parallel corpus to read", json!(0))
}

fn pipeline_settings(args: &Arguments) -> Result<PipelineSettings> {
    Ok(PipelineSettings {
        batch_size:       args.usize("batch_size")?,
        max_segment_size: args.usize("max_segment_size")?,
        padding_type:     args.string("padding_type")?,
        shuffle:          args.bool("shuffle")?,
        seed:             args.optional_u64("seed")?,
        side:             args.usize("side")?,
        cuda:             args.flag("cuda")?,
    })
}

fn build_memory_input(args: &mut Arguments) -> Result<Component> {
    let settings = pipeline_settings(args)?;
    let corpora  = args.take_corpus("corpora")?;
    Ok(Component::Pipeline(Box::new(MemoryInput::new(corpora, settings)?)))
}

fn build_file_input(args: &mut Arguments) -> Result<Component> {
    let settings = pipeline_settings(args)?;
    let corpora  = args.take_corpus("corpora")?;
    Ok(Component::Pipeline(Box::new(FileInput::new(corpora, settings)?)))
}

// ─── Language ─────────────────────────────────────────────────────────────────

fn language_interface() -> Interface {
    Interface::new()
        .local("identifier", "language identifier token")
        .child("vocabulary", "vocabulary of the language", Contract::Vocabulary)
        .children("input_pipelines", "exactly train, dev and test", Contract::InputPipeline)
}

fn build_language(args: &mut Arguments) -> Result<Component> {
    let language = Language::new(
        args.string("identifier")?,
        args.vocabulary("vocabulary")?,
        args.take_pipelines("input_pipelines")?,
    )?;
    Ok(Component::Language(Arc::new(language)))
}

// ─── Models ───────────────────────────────────────────────────────────────────

fn seq2seq_interface() -> Interface {
    Interface::new()
        .child("encoder", "source-side unit", Contract::Encoder)
        .child("decoder", "target-side unit", Contract::Decoder)
}

fn build_seq2seq(args: &mut Arguments) -> Result<Component> {
    let encoder = args.take_unit("encoder")?;
    let decoder = args.take_unit("decoder")?;
    Ok(Component::Unit(Box::new(SeqToSeq::new(encoder, decoder)?)))
}

fn embedding_unit_interface() -> Interface {
    Interface::new()
        .reference("vocabulary", "vocabulary the ids come from", ":Vocabulary")
        .local_or("learning_rate", "optimizer step size", json!(0.001))
}

fn build_embedding_encoder(args: &mut Arguments) -> Result<Component> {
    let unit = EmbeddingUnit::new(Role::Encoder, args.vocabulary("vocabulary")?, args.f64("learning_rate")?)?;
    Ok(Component::Unit(Box::new(unit)))
}

fn build_embedding_decoder(args: &mut Arguments) -> Result<Component> {
    let unit = EmbeddingUnit::new(Role::Decoder, args.vocabulary("vocabulary")?, args.f64("learning_rate")?)?;
    Ok(Component::Unit(Box::new(unit)))
}
