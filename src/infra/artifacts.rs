// ============================================================
// Layer 6: Artifact Writer
// ============================================================
// Saves run outputs as pretty-printed JSON into one directory:
//
//   prepared/
//     prepare_config.json   ← the configuration of the run
//     train.json            ← ids, cuts, corrupted data, labels
//     val.json
//     preprocessor.json     ← fitted normalisation statistics
//
// Collection runs use the same writer to drop their config
// next to the records they produced.
//
// NaN and infinite values are written as JSON null.
//
// Reference: serde_json crate documentation

use anyhow::{Context, Result};
use ndarray::Array2;
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::infra::record_store::write_atomic;

/// Writes serialisable artifacts into a fixed directory.
pub struct ArtifactWriter {
    dir: PathBuf,
}

impl ArtifactWriter {
    /// Create the writer, creating the directory like `mkdir -p`.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create output directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Serialise `value` to `{dir}/{name}.json`.
    pub fn save_json<T: Serialize>(&self, name: &str, value: &T) -> Result<PathBuf> {
        let path = self.dir.join(format!("{name}.json"));
        let json = serde_json::to_string_pretty(value)
            .with_context(|| format!("Cannot serialise '{name}'"))?;

        write_atomic(&path, json.as_bytes())?;
        tracing::debug!("Saved '{}'", path.display());
        Ok(path)
    }
}

/// Matrix as a list of rows, ready for serialisation.
pub fn matrix_rows(matrix: &Array2<f64>) -> Vec<Vec<f64>> {
    matrix.rows().into_iter().map(|row| row.to_vec()).collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use tempfile::TempDir;

    #[test]
    fn test_save_json_writes_nan_as_null() {
        let tmp    = TempDir::new().unwrap();
        let writer = ArtifactWriter::new(tmp.path().join("nested/out")).unwrap();

        let rows = matrix_rows(&array![[1.0, f64::NAN], [3.0, 4.0]]);
        let path = writer.save_json("matrix", &rows).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(value, serde_json::json!([[1.0, null], [3.0, 4.0]]));
    }
}
