// ============================================================
// Layer 1: CLI Commands and Arguments
// ============================================================
// Four subcommands:
//
//   corrupt  → mark entries of a collection missing at random
//   impute   → fill or drop missing entries of a collection
//   prepare  → build normalised train/validation matrices
//   inspect  → list length and missing count per record
//
// Every knob (collections, strategy, proportion, seed, marker)
// is an explicit flag. The missingness proportion has no
// default and must always be given.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::application::{
    generate_use_case::{GenerateConfig, Operation, DEFAULT_PROGRESS_EVERY},
    prepare_use_case::PrepareConfig,
};
use crate::data::{
    imputation::ImputeStrategy,
    missingness::Proportion,
    preprocessor::PreprocessorFormat,
    splitter::Ratio,
};
use crate::domain::sequence::MissingMarker;

/// Seed used when none is given.
pub const DEFAULT_SEED: u64 = 1001;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a copy of a collection with entries marked missing at random
    Corrupt(CorruptArgs),

    /// Write a copy of a collection with missing entries imputed
    Impute(ImputeArgs),

    /// Build normalised train/validation splits for imputation models
    Prepare(PrepareArgs),

    /// Print length and missing count of every record
    Inspect(InspectArgs),
}

/// Flags shared by every command that reads a collection.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Directory holding the collections
    #[arg(long, default_value = "data")]
    pub root: String,

    /// Collection to read
    #[arg(long)]
    pub source: String,

    /// Missing marker: `nan` for float records or an integer sentinel
    #[arg(long, default_value = "nan", allow_hyphen_values = true)]
    pub marker: MissingMarker,
}

#[derive(Args, Debug)]
pub struct CorruptArgs {
    #[command(flatten)]
    pub src: SourceArgs,

    /// Collection to write
    #[arg(long)]
    pub dest: String,

    /// Probability that each entry goes missing, in [0, 1]
    #[arg(long, value_parser = parse_proportion)]
    pub proportion: Proportion,

    /// Seed of the random stream
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Log progress every N records (0 disables)
    #[arg(long, default_value_t = DEFAULT_PROGRESS_EVERY)]
    pub progress_every: usize,
}

#[derive(Args, Debug)]
pub struct ImputeArgs {
    #[command(flatten)]
    pub src: SourceArgs,

    /// Collection to write
    #[arg(long)]
    pub dest: String,

    /// Imputation strategy: zero, mean, locf or drop
    #[arg(long)]
    pub strategy: ImputeStrategy,

    /// Log progress every N records (0 disables)
    #[arg(long, default_value_t = DEFAULT_PROGRESS_EVERY)]
    pub progress_every: usize,
}

#[derive(Args, Debug)]
pub struct PrepareArgs {
    #[command(flatten)]
    pub src: SourceArgs,

    /// Directory for the prepared splits and statistics
    #[arg(long, default_value = "prepared")]
    pub output: String,

    /// Probability that each entry goes missing, in [0, 1]
    #[arg(long, value_parser = parse_proportion)]
    pub proportion: Proportion,

    /// Seed for missingness and for the split
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Share of records used for training, in [0, 1]
    #[arg(long, value_parser = parse_ratio, default_value_t = Ratio::default())]
    pub ratio: Ratio,

    /// Preprocessor layout: normal or sequential
    #[arg(long, default_value = "normal")]
    pub format: PreprocessorFormat,

    /// Features per time step (sequential format only)
    #[arg(long, default_value_t = 1)]
    pub features: usize,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    #[command(flatten)]
    pub src: SourceArgs,
}

fn parse_proportion(s: &str) -> Result<Proportion, String> {
    let value: f64 = s.parse().map_err(|e| format!("'{s}' is not a number: {e}"))?;
    Proportion::new(value).map_err(|e| e.to_string())
}

fn parse_ratio(s: &str) -> Result<Ratio, String> {
    let value: f64 = s.parse().map_err(|e| format!("'{s}' is not a number: {e}"))?;
    Ratio::new(value).map_err(|e| e.to_string())
}

/// CLI args → application config. The application layer never
/// sees clap types.
impl From<CorruptArgs> for GenerateConfig {
    fn from(a: CorruptArgs) -> Self {
        GenerateConfig {
            root:           a.src.root,
            source:         a.src.source,
            dest:           a.dest,
            operation:      Operation::Corrupt { proportion: a.proportion },
            marker:         a.src.marker,
            seed:           a.seed,
            progress_every: a.progress_every,
        }
    }
}

impl From<ImputeArgs> for GenerateConfig {
    fn from(a: ImputeArgs) -> Self {
        GenerateConfig {
            root:           a.src.root,
            source:         a.src.source,
            dest:           a.dest,
            operation:      Operation::Impute { strategy: a.strategy },
            marker:         a.src.marker,
            // imputation is deterministic; the seed is recorded for completeness
            seed:           DEFAULT_SEED,
            progress_every: a.progress_every,
        }
    }
}

impl From<PrepareArgs> for PrepareConfig {
    fn from(a: PrepareArgs) -> Self {
        PrepareConfig {
            root:       a.src.root,
            source:     a.src.source,
            output:     a.output,
            marker:     a.src.marker,
            proportion: a.proportion,
            seed:       a.seed,
            ratio:      a.ratio,
            format:     a.format,
            features:   a.features,
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_proportion_is_required() {
        let res = Cli::try_parse_from(["physio-impute", "corrupt", "--source", "a", "--dest", "b"]);
        assert!(res.is_err());
    }

    #[test]
    fn test_proportion_out_of_range() {
        let res = Cli::try_parse_from([
            "physio-impute", "corrupt", "--source", "a", "--dest", "b", "--proportion", "1.5",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn test_ratio_out_of_range() {
        let res = Cli::try_parse_from([
            "physio-impute", "prepare", "--source", "a", "--proportion", "0.1", "--ratio", "1.5",
        ]);
        assert!(res.is_err());

        let cli = Cli::try_parse_from([
            "physio-impute", "prepare", "--source", "a", "--proportion", "0.1", "--ratio", "0.5",
        ])
        .unwrap();
        let Commands::Prepare(args) = cli.command else { panic!("wrong subcommand") };
        assert_eq!(args.ratio.value(), 0.5);
    }

    #[test]
    fn test_corrupt_args_to_config() {
        let cli = Cli::try_parse_from([
            "physio-impute", "corrupt", "--source", "a", "--dest", "b",
            "--proportion", "0.2", "--marker", "-9999", "--seed", "7",
        ])
        .unwrap();

        let Commands::Corrupt(args) = cli.command else { panic!("wrong subcommand") };
        let cfg = GenerateConfig::from(args);
        assert_eq!(cfg.marker, MissingMarker::Sentinel(-9999));
        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.operation, Operation::Corrupt { proportion: Proportion::new(0.2).unwrap() });
    }

    #[test]
    fn test_unknown_strategy_and_format_are_rejected() {
        assert!(Cli::try_parse_from([
            "physio-impute", "impute", "--source", "a", "--dest", "b", "--strategy", "median",
        ])
        .is_err());

        assert!(Cli::try_parse_from([
            "physio-impute", "prepare", "--source", "a", "--proportion", "0.1", "--format", "tabular",
        ])
        .is_err());
    }

    #[test]
    fn test_prepare_defaults() {
        let cli = Cli::try_parse_from([
            "physio-impute", "prepare", "--source", "a", "--proportion", "0.1",
        ])
        .unwrap();

        let Commands::Prepare(args) = cli.command else { panic!("wrong subcommand") };
        let cfg = PrepareConfig::from(args);
        assert_eq!(cfg.ratio.value(), 0.8);
        assert_eq!(cfg.seed, 1001);
        assert_eq!(cfg.format, PreprocessorFormat::Normal);
        assert_eq!(cfg.marker, MissingMarker::NotANumber);
    }
}
