// ============================================================
// Layer 2: PrepareUseCase
// ============================================================
// Builds normalised train/validation matrices for imputation
// models from one collection:
//
//   Step 1: Load every record and widen it to f64     (Layer 4)
//   Step 2: Rectangularize, keeping the cuts          (Layer 4)
//   Step 3: Keep the clean matrix as labels
//   Step 4: Corrupt each row (MCAR) as model input    (Layer 4)
//   Step 5: Seeded train / validation split           (Layer 4)
//   Step 6: Fit the preprocessor on train inputs,
//           scale inputs and labels of both splits    (Layer 4)
//   Step 7: Save config, splits and statistics        (Layer 6)
//
// The random stream for Step 4 is seeded once from the run seed.
// The split derives its own stream from the same seed.

use anyhow::{ensure, Context, Result};
use ndarray::{s, Array2, Array3};
use serde::{Deserialize, Serialize};

use crate::data::{
    missingness::{generate_missing_rows, seeded_stream, Proportion},
    preprocessor::{
        Layout, Normal, NormalizationStats, Preprocessor, PreprocessorFormat, Sequential,
    },
    rectangularizer::{rectangularize, widen},
    splitter::{split_indices, IndexPartition, Ratio},
};
use crate::domain::{
    sequence::MissingMarker,
    traits::{RecordCatalog, RecordStore},
};
use crate::infra::{
    artifacts::{matrix_rows, ArtifactWriter},
    record_store::FileRecordStore,
};

// ─── Configuration ────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepareConfig {
    pub root:       String,
    pub source:     String,
    pub output:     String,
    pub marker:     MissingMarker,
    pub proportion: Proportion,
    pub seed:       u64,
    pub ratio:      Ratio,
    pub format:     PreprocessorFormat,
    /// Features per time step in sequential format
    pub features:   usize,
}

// ─── Outputs ──────────────────────────────────────────────────────────────────
/// One side of the split, normalised.
#[derive(Debug, Clone, Serialize)]
pub struct SplitArtifact {
    pub ids:   Vec<String>,
    pub cuts:  Vec<usize>,
    /// Corrupted, normalised inputs (one row per record)
    pub data:  Vec<Vec<f64>>,
    /// Clean, normalised targets
    pub label: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreprocessorArtifact {
    pub format:   PreprocessorFormat,
    pub features: usize,
    pub stats:    NormalizationStats,
}

/// Everything produced by a preparation run.
#[derive(Debug, Clone, Serialize)]
pub struct PreparedData {
    pub max_length:    usize,
    pub missing_added: usize,
    pub partition:     IndexPartition,
    pub train:         SplitArtifact,
    pub val:           SplitArtifact,
    pub preprocessor:  PreprocessorArtifact,
}

/// The four matrices one preprocessor is applied to.
struct Splits {
    train_data:  Array2<f64>,
    train_label: Array2<f64>,
    val_data:    Array2<f64>,
    val_label:   Array2<f64>,
}

// ─── PrepareUseCase ───────────────────────────────────────────────────────────
pub struct PrepareUseCase<S> {
    config: PrepareConfig,
    store:  S,
}

impl<S: RecordCatalog + RecordStore> PrepareUseCase<S> {
    pub fn new(config: PrepareConfig, store: S) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &PrepareConfig {
        &self.config
    }

    pub fn execute(&self) -> Result<PreparedData> {
        let cfg = &self.config;
        ensure!(cfg.features > 0, "features per time step must be at least 1");

        // ── Step 1: Load and widen ────────────────────────────────────────────
        let ids = self.store.record_ids(&cfg.source)?;
        tracing::info!("Preparing {} records from '{}'", ids.len(), cfg.source);

        let mut rows = Vec::with_capacity(ids.len());
        for id in &ids {
            let seq = self.store.load(&cfg.source, id)?;
            rows.push(widen(&seq, cfg.marker).with_context(|| format!("Widening record '{id}'"))?);
        }

        // ── Step 2: Rectangularize ────────────────────────────────────────────
        let rect   = rectangularize(&rows);
        let labels = rect.matrix;
        let cuts   = rect.cuts;

        // ── Step 3/4: Labels stay clean, inputs get corrupted ─────────────────
        let mut rng = seeded_stream(cfg.seed);
        let data    = generate_missing_rows(&labels, &cuts, cfg.proportion, &mut rng)?;
        let missing_added = count_nan(&data) - count_nan(&labels);
        tracing::info!(
            "Matrix {} x {}, {} entries marked missing",
            labels.nrows(),
            labels.ncols(),
            missing_added
        );

        // ── Step 5: Split ─────────────────────────────────────────────────────
        let partition = split_indices(ids.len(), cfg.seed, cfg.ratio);
        tracing::info!(
            "Split: {} train, {} validation",
            partition.train.len(),
            partition.val.len()
        );

        let mut splits = Splits {
            train_data:  IndexPartition::select_rows(&data,   &partition.train),
            train_label: IndexPartition::select_rows(&labels, &partition.train),
            val_data:    IndexPartition::select_rows(&data,   &partition.val),
            val_label:   IndexPartition::select_rows(&labels, &partition.val),
        };

        // ── Step 6: Normalise ─────────────────────────────────────────────────
        let stats = match cfg.format {
            PreprocessorFormat::Normal => scale_splits::<Normal>(
                &mut splits,
                |m| m.clone(),
                |d| d,
            )?,
            PreprocessorFormat::Sequential => {
                let width    = labels.ncols();
                let features = cfg.features;
                scale_splits::<Sequential>(
                    &mut splits,
                    |m| to_time_steps(m, features),
                    |d| from_time_steps(&d, width),
                )?
            }
        };

        let side = |indices: &[usize], data: &Array2<f64>, label: &Array2<f64>| SplitArtifact {
            ids:   IndexPartition::select_items(&ids, indices),
            cuts:  IndexPartition::select_items(&cuts, indices),
            data:  matrix_rows(data),
            label: matrix_rows(label),
        };

        Ok(PreparedData {
            max_length:    labels.ncols(),
            missing_added,
            train:         side(&partition.train, &splits.train_data, &splits.train_label),
            val:           side(&partition.val,   &splits.val_data,   &splits.val_label),
            partition,
            preprocessor:  PreprocessorArtifact {
                format:   cfg.format,
                features: cfg.features,
                stats,
            },
        })
    }
}

/// Fit on the training inputs, then scale all four matrices in place.
fn scale_splits<L: Layout>(
    splits:  &mut Splits,
    to:      impl Fn(&Array2<f64>) -> L::Data,
    back:    impl Fn(L::Data) -> Array2<f64>,
) -> Result<NormalizationStats> {
    let mut preprocessor = Preprocessor::<L>::new();
    preprocessor.fit(&to(&splits.train_data))?;

    for m in [
        &mut splits.train_data,
        &mut splits.train_label,
        &mut splits.val_data,
        &mut splits.val_label,
    ] {
        *m = back(preprocessor.preprocess(&to(&*m))?);
    }

    Ok(preprocessor.stats()?.clone())
}

/// [records, width] → [records, ceil(width / features), features],
/// padding the tail of the last time step with NaN.
fn to_time_steps(matrix: &Array2<f64>, features: usize) -> Array3<f64> {
    let (n, width) = matrix.dim();
    let steps      = width.div_ceil(features);
    let mut out    = Array3::from_elem((n, steps, features), f64::NAN);

    for ((i, j), &v) in matrix.indexed_iter() {
        out[[i, j / features, j % features]] = v;
    }
    out
}

/// Inverse of [`to_time_steps`]: flatten and drop the tail padding.
fn from_time_steps(data: &Array3<f64>, width: usize) -> Array2<f64> {
    Sequential::flatten(data).slice(s![.., ..width]).to_owned()
}

fn count_nan(matrix: &Array2<f64>) -> usize {
    matrix.iter().filter(|v| v.is_nan()).count()
}

/// Run against a file store and write every artifact to `config.output`.
pub fn run(config: PrepareConfig) -> Result<PreparedData> {
    let store    = FileRecordStore::new(&config.root);
    let use_case = PrepareUseCase::new(config, store);
    let prepared = use_case.execute()?;

    let writer = ArtifactWriter::new(&use_case.config().output)?;
    writer.save_json("prepare_config", use_case.config())?;
    writer.save_json("train", &prepared.train)?;
    writer.save_json("val", &prepared.val)?;
    writer.save_json("preprocessor", &prepared.preprocessor)?;

    tracing::info!("Artifacts written to '{}'", writer.dir().display());
    Ok(prepared)
}
