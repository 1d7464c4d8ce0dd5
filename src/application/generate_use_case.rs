// ============================================================
// Layer 2: GenerateUseCase (collection → collection)
// ============================================================
// Produces one processed collection from a source collection:
//
//   Step 1: Check the source collection exists and differs
//           from the destination
//   Step 2: Read its catalog                     (Layer 6 - infra)
//   Step 3: Create the destination collection    (Layer 6 - infra)
//   Step 4: For every record:
//             load → transform → store → copy metadata
//   Step 5: Write the destination catalog
//
// The transform is either MCAR corruption or one imputation
// strategy. Both implement SequenceTransform, so the loop does
// not care which one it runs.
//
// A destination that already exists is reused with a warning.
// Any per-record failure aborts the run with the record id in
// the error context; nothing is skipped silently.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::{
    imputation::ImputeStrategy,
    missingness::{seeded_stream, MissingnessGenerator, Proportion},
};
use crate::domain::{
    error::PipelineError,
    sequence::MissingMarker,
    traits::{RecordCatalog, RecordStore, SequenceTransform},
};
use crate::infra::{artifacts::ArtifactWriter, record_store::FileRecordStore};

/// Records between two progress log lines.
pub const DEFAULT_PROGRESS_EVERY: usize = 100;

// ─── Configuration ────────────────────────────────────────────────────────────
/// What to do with each record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Operation {
    /// Mark entries missing at random.
    Corrupt { proportion: Proportion },
    /// Fill or drop entries already marked missing.
    Impute { strategy: ImputeStrategy },
}

/// Everything a collection run needs. Saved next to its output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateConfig {
    pub root:           String,
    pub source:         String,
    pub dest:           String,
    pub operation:      Operation,
    pub marker:         MissingMarker,
    pub seed:           u64,
    pub progress_every: usize,
}

/// Counts gathered over a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerateReport {
    pub records:         usize,
    pub samples_in:      usize,
    pub samples_out:     usize,
    pub missing_in:      usize,
    pub missing_out:     usize,
    pub dest_preexisted: bool,
}

// ─── GenerateUseCase ──────────────────────────────────────────────────────────
pub struct GenerateUseCase<S> {
    config: GenerateConfig,
    store:  S,
}

impl<S: RecordCatalog + RecordStore> GenerateUseCase<S> {
    pub fn new(config: GenerateConfig, store: S) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &GenerateConfig {
        &self.config
    }

    /// Build the per-record transform. The random stream is created
    /// here, once per run.
    fn build_transform(&self) -> Box<dyn SequenceTransform> {
        let cfg = &self.config;
        match cfg.operation {
            Operation::Corrupt { proportion } => Box::new(MissingnessGenerator::new(
                proportion,
                cfg.marker,
                seeded_stream(cfg.seed),
            )),
            Operation::Impute { strategy } => Box::new(strategy.with_marker(cfg.marker)),
        }
    }

    /// Run the whole collection.
    pub fn execute(&self) -> Result<GenerateReport> {
        let cfg = &self.config;

        // ── Step 1: Source must exist and differ from the destination ─────────
        if cfg.dest == cfg.source {
            return Err(PipelineError::SameCollection(cfg.dest.clone()).into());
        }
        if !self.store.collection_exists(&cfg.source) {
            return Err(PipelineError::CollectionNotFound(cfg.source.clone()).into());
        }

        // ── Step 2: Read the catalog ──────────────────────────────────────────
        let ids = self.store.record_ids(&cfg.source)?;
        tracing::info!("Found {} records in '{}'", ids.len(), cfg.source);

        // ── Step 3: Destination (idempotent) ──────────────────────────────────
        let mut report = GenerateReport::default();
        if !self.store.create_collection(&cfg.dest)? {
            report.dest_preexisted = true;
            tracing::warn!(
                "Destination collection '{}' already exists; records will be overwritten",
                cfg.dest
            );
        }

        // ── Step 4: Transform every record ────────────────────────────────────
        let mut transform = self.build_transform();
        tracing::info!(
            "Applying '{}' from '{}' to '{}'",
            transform.name(),
            cfg.source,
            cfg.dest
        );

        for (i, id) in ids.iter().enumerate() {
            let input = self.store.load(&cfg.source, id)?;
            let output = transform
                .apply(&input)
                .with_context(|| format!("Processing record '{id}'"))?;

            report.samples_in  += input.len();
            report.samples_out += output.len();
            report.missing_in  += input.count_missing(cfg.marker)?;
            report.missing_out += output.count_missing(cfg.marker)?;

            self.store
                .store(&cfg.dest, id, &output)
                .with_context(|| format!("Storing record '{id}'"))?;
            self.store.copy_metadata(id, &cfg.source, &cfg.dest)?;
            report.records += 1;

            if cfg.progress_every > 0 && (i + 1) % cfg.progress_every == 0 {
                tracing::info!("Processed {}/{} records", i + 1, ids.len());
            }
        }

        // ── Step 5: Destination catalog ───────────────────────────────────────
        self.store.write_catalog(&cfg.dest, &ids)?;

        tracing::info!(
            "Done: {} records, missing entries {} → {}",
            report.records,
            report.missing_in,
            report.missing_out
        );
        Ok(report)
    }
}

/// Run against a file store rooted at `config.root` and save the
/// config and report next to the produced records.
pub fn run(config: GenerateConfig) -> Result<GenerateReport> {
    let store  = FileRecordStore::new(&config.root);
    let outdir = store.collection_dir(&config.dest);

    let use_case = GenerateUseCase::new(config, store);
    let report   = use_case.execute()?;

    let writer = ArtifactWriter::new(outdir)?;
    writer.save_json("generate_config", use_case.config())?;
    writer.save_json("generate_report", &report)?;
    Ok(report)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sequence::Sequence;
    use std::fs;
    use tempfile::TempDir;

    const S: i64 = -9999;

    fn config(operation: Operation) -> GenerateConfig {
        GenerateConfig {
            root:           String::new(),
            source:         "raw".into(),
            dest:           "out".into(),
            operation,
            marker:         MissingMarker::Sentinel(S),
            seed:           1001,
            progress_every: DEFAULT_PROGRESS_EVERY,
        }
    }

    fn seeded_store(records: &[(&str, Vec<i64>)]) -> (TempDir, FileRecordStore) {
        let tmp   = TempDir::new().unwrap();
        let store = FileRecordStore::new(tmp.path());
        store.create_collection("raw").unwrap();

        let mut ids = Vec::new();
        for (id, values) in records {
            store.store("raw", id, &Sequence::Int(values.clone())).unwrap();
            fs::write(store.collection_dir("raw").join(format!("{id}.hea")), format!("{id} header")).unwrap();
            ids.push(id.to_string());
        }
        store.write_catalog("raw", &ids).unwrap();
        (tmp, store)
    }

    fn impute(strategy: ImputeStrategy) -> Operation {
        Operation::Impute { strategy }
    }

    #[test]
    fn test_impute_collection() {
        let (tmp, store) = seeded_store(&[("A1", vec![S, 2, S, 4]), ("A2", vec![5, S])]);
        let report = GenerateUseCase::new(config(impute(ImputeStrategy::Locf)), store)
            .execute()
            .unwrap();

        assert_eq!(report.records, 2);
        assert_eq!(report.missing_in, 3);
        assert_eq!(report.missing_out, 0);
        assert!(!report.dest_preexisted);

        let store = FileRecordStore::new(tmp.path());
        assert_eq!(store.load("out", "A1").unwrap(), Sequence::Int(vec![0, 2, 2, 4]));
        assert_eq!(store.load("out", "A2").unwrap(), Sequence::Int(vec![5, 5]));
        assert_eq!(store.record_ids("out").unwrap(), vec!["A1", "A2"]);

        let header = fs::read_to_string(store.collection_dir("out").join("A1.hea")).unwrap();
        assert_eq!(header, "A1 header");
    }

    #[test]
    fn test_drop_strategy_shortens_records() {
        let (_tmp, store) = seeded_store(&[("A1", vec![1, S, 2, S, 3])]);
        let report = GenerateUseCase::new(config(impute(ImputeStrategy::DropMissing)), store)
            .execute()
            .unwrap();
        assert_eq!(report.samples_in, 5);
        assert_eq!(report.samples_out, 3);
    }

    #[test]
    fn test_corruption_is_reproducible() {
        let values: Vec<i64> = (0..200).collect();
        let op = Operation::Corrupt { proportion: Proportion::new(0.2).unwrap() };

        let (tmp_a, a) = seeded_store(&[("A1", values.clone())]);
        GenerateUseCase::new(config(op), a).execute().unwrap();
        let (tmp_b, b) = seeded_store(&[("A1", values)]);
        GenerateUseCase::new(config(op), b).execute().unwrap();

        let first  = FileRecordStore::new(tmp_a.path()).load("out", "A1").unwrap();
        let second = FileRecordStore::new(tmp_b.path()).load("out", "A1").unwrap();
        assert_eq!(first, second);
        assert!(first.count_missing(MissingMarker::Sentinel(S)).unwrap() > 0);
    }

    #[test]
    fn test_existing_destination_is_only_a_warning() {
        let (_tmp, store) = seeded_store(&[("A1", vec![1, S])]);
        store.create_collection("out").unwrap();

        let report = GenerateUseCase::new(config(impute(ImputeStrategy::Zero)), store)
            .execute()
            .unwrap();
        assert!(report.dest_preexisted);
        assert_eq!(report.records, 1);
    }

    #[test]
    fn test_missing_source_collection() {
        let tmp   = TempDir::new().unwrap();
        let store = FileRecordStore::new(tmp.path());
        let err   = GenerateUseCase::new(config(impute(ImputeStrategy::Zero)), store)
            .execute()
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<PipelineError>(),
            Some(&PipelineError::CollectionNotFound("raw".into()))
        );
    }

    #[test]
    fn test_dest_must_differ_from_source() {
        let (tmp, store) = seeded_store(&[("A1", vec![1, S, 3])]);
        let mut cfg = config(impute(ImputeStrategy::Zero));
        cfg.dest = "raw".into();

        let err = GenerateUseCase::new(cfg, store).execute().unwrap_err();
        assert_eq!(
            err.downcast_ref::<PipelineError>(),
            Some(&PipelineError::SameCollection("raw".into()))
        );

        // source record and header untouched
        let store = FileRecordStore::new(tmp.path());
        assert_eq!(store.load("raw", "A1").unwrap(), Sequence::Int(vec![1, S, 3]));
        let header = fs::read_to_string(store.collection_dir("raw").join("A1.hea")).unwrap();
        assert_eq!(header, "A1 header");
    }

    #[test]
    fn test_mean_fill_failure_aborts_the_run() {
        let (_tmp, store) = seeded_store(&[("A1", vec![1, S]), ("A2", vec![S, S])]);
        let err = GenerateUseCase::new(config(impute(ImputeStrategy::Mean)), store)
            .execute()
            .unwrap_err();

        assert_eq!(
            err.downcast_ref::<PipelineError>(),
            Some(&PipelineError::NoObservedValues)
        );
        assert!(format!("{err:#}").contains("A2"));
    }

    #[test]
    fn test_run_saves_config() {
        let (tmp, _store) = seeded_store(&[("A1", vec![1, S])]);
        let mut cfg = config(impute(ImputeStrategy::Zero));
        cfg.root = tmp.path().to_string_lossy().into_owned();

        run(cfg).unwrap();
        let saved = fs::read_to_string(tmp.path().join("out/generate_config.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&saved).unwrap();
        assert_eq!(value["operation"]["kind"], "impute");
        assert_eq!(value["operation"]["strategy"], "zero");
    }
}
