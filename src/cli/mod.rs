// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// clap and delegates every workflow to Layer 2 (application):
//
//   1. `assemble` — resolve an experiment configuration
//   2. `inspect`  — show what a pipeline feeds the model
//   3. `cache`    — prepare the id cache of a large corpus

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{AssembleArgs, CacheArgs, Commands, InspectArgs};

#[derive(Parser, Debug)]
#[command(
    name = "nmt-assembler",
    version,
    about = "Assemble vocabularies, corpora and batch pipelines from an NMT experiment configuration."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Routes to the use case; never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Assemble(args) => run_assemble(args),
            Commands::Inspect(args)  => run_inspect(args),
            Commands::Cache(args)    => run_cache(args),
        }
    }
}

fn run_assemble(args: AssembleArgs) -> Result<()> {
    use crate::application::assemble_use_case::AssembleUseCase;

    let assembly = AssembleUseCase::new(args.into()).execute()?;
    for line in assembly.summary() {
        println!("{line}");
    }
    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    use crate::application::inspect_use_case::InspectUseCase;

    let rendered = InspectUseCase::new(args.into()).execute()?;
    if rendered.is_empty() {
        println!("No full batch could be produced.");
    }
    for (index, batch) in rendered.iter().enumerate() {
        println!("── batch {index} ──");
        print!("{batch}");
    }
    Ok(())
}

fn run_cache(args: CacheArgs) -> Result<()> {
    use crate::application::cache_use_case::CacheUseCase;

    let report = CacheUseCase::new(args.into()).execute()?;
    let action = if report.rebuilt { "Built" } else { "Reused" };
    println!(
        "{action} '{}': {} samples in {} segments",
        report.id_path.display(),
        report.samples,
        report.segments
    );
    Ok(())
}
