// ============================================================
// Layer 1: CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// clap, converts them into application configs and prints the
// results. All work is delegated to Layer 2.
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, CorruptArgs, ImputeArgs, InspectArgs, PrepareArgs};

use crate::application::{
    generate_use_case, inspect_use_case::InspectUseCase, prepare_use_case,
};
use crate::infra::record_store::FileRecordStore;

#[derive(Parser, Debug)]
#[command(
    name = "physio-impute",
    version,
    about = "Simulate missing data in physiological records and rebuild it with imputation strategies."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Route the subcommand to its use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Corrupt(args) => run_corrupt(args),
            Commands::Impute(args)  => run_impute(args),
            Commands::Prepare(args) => run_prepare(args),
            Commands::Inspect(args) => run_inspect(args),
        }
    }
}

fn run_corrupt(args: CorruptArgs) -> Result<()> {
    tracing::info!(
        "Corrupting '{}' with proportion {}",
        args.src.source,
        args.proportion.value()
    );
    let report = generate_use_case::run(args.into())?;
    println!(
        "Corrupted {} records: {} of {} samples now missing.",
        report.records, report.missing_out, report.samples_out
    );
    Ok(())
}

fn run_impute(args: ImputeArgs) -> Result<()> {
    tracing::info!("Imputing '{}' with strategy '{}'", args.src.source, args.strategy);
    let report = generate_use_case::run(args.into())?;
    println!(
        "Imputed {} records: {} missing samples in, {} out ({} → {} samples).",
        report.records, report.missing_in, report.missing_out, report.samples_in, report.samples_out
    );
    Ok(())
}

fn run_prepare(args: PrepareArgs) -> Result<()> {
    let output   = args.output.clone();
    let prepared = prepare_use_case::run(args.into())?;
    println!(
        "Prepared {} train / {} validation records of width {} in '{}'.",
        prepared.train.ids.len(),
        prepared.val.ids.len(),
        prepared.max_length,
        output
    );
    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    let store   = FileRecordStore::new(&args.src.root);
    let summary = InspectUseCase::new(store).summarize(&args.src.source, args.src.marker)?;

    for r in &summary.records {
        println!("{} {} {} {}", r.id, r.dtype, r.length, r.missing);
    }
    println!(
        "{} records, {} samples, {} missing ({:.2}%)",
        summary.records.len(),
        summary.total_samples,
        summary.total_missing,
        summary.missing_rate() * 100.0
    );
    Ok(())
}
