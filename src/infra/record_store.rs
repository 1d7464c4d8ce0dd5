// ============================================================
// Layer 6: File Record Store
// ============================================================
// A directory-backed implementation of RecordCatalog and
// RecordStore. Every collection is a sub-directory of the root:
//
//   data/
//     training2017/
//       RECORDS          ← catalog: one record id per line
//       A00001.json      ← samples
//       A00001.hea       ← header, copied verbatim
//       A00002.json
//       A00002.hea
//       ...
//
// Record files carry their element type next to the samples:
//
//   {"dtype": "int",   "val": [12, -9999, 40]}
//   {"dtype": "float", "val": [0.12, null, 0.40]}
//
// JSON has no NaN, so float missing values are written as null.
// Infinite samples have no encoding and are refused on store.
//
// Writes go to a temporary file that is renamed into place, so a
// failed write never leaves a half-written record behind.
//
// Reference: serde_json crate documentation
//            Rust Book §9 (Error Handling), §12 (I/O)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use crate::domain::{
    error::PipelineError,
    sequence::Sequence,
    traits::{RecordCatalog, RecordStore},
};

/// Name of the catalog file inside each collection.
pub const CATALOG_FILE: &str = "RECORDS";

const RECORD_EXT:   &str = "json";
const METADATA_EXT: &str = "hea";

/// On-disk shape of one record.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "dtype", content = "val", rename_all = "lowercase")]
enum RecordFile {
    Int(Vec<i64>),
    Float(Vec<Option<f64>>),
}

impl From<&Sequence> for RecordFile {
    fn from(seq: &Sequence) -> Self {
        match seq {
            Sequence::Int(v)   => Self::Int(v.clone()),
            Sequence::Float(v) => Self::Float(
                v.iter().map(|x| if x.is_nan() { None } else { Some(*x) }).collect(),
            ),
        }
    }
}

impl From<RecordFile> for Sequence {
    fn from(file: RecordFile) -> Self {
        match file {
            RecordFile::Int(v)   => Self::Int(v),
            RecordFile::Float(v) => Self::Float(
                v.into_iter().map(|x| x.unwrap_or(f64::NAN)).collect(),
            ),
        }
    }
}

/// Collections stored as directories below a root path.
pub struct FileRecordStore {
    root: PathBuf,
}

impl FileRecordStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding `collection`.
    pub fn collection_dir(&self, collection: &str) -> PathBuf {
        self.root.join(collection)
    }

    fn record_path(&self, collection: &str, id: &str) -> PathBuf {
        self.collection_dir(collection).join(format!("{id}.{RECORD_EXT}"))
    }

    fn metadata_path(&self, collection: &str, id: &str) -> PathBuf {
        self.collection_dir(collection).join(format!("{id}.{METADATA_EXT}"))
    }
}

/// Write `contents` to `path` through a temporary sibling file.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, contents)
        .with_context(|| format!("Cannot write '{}'", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("Cannot move '{}' into place", path.display()))?;
    Ok(())
}

impl RecordCatalog for FileRecordStore {
    fn record_ids(&self, collection: &str) -> Result<Vec<String>> {
        if !self.collection_exists(collection) {
            return Err(PipelineError::CollectionNotFound(collection.to_string()).into());
        }

        let path = self.collection_dir(collection).join(CATALOG_FILE);
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read catalog '{}'", path.display()))?;

        let mut seen = HashSet::new();
        let mut ids  = Vec::new();
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if !seen.insert(line) {
                return Err(PipelineError::DuplicateRecord(line.to_string()).into());
            }
            ids.push(line.to_string());
        }

        tracing::debug!("Catalog '{}' lists {} records", collection, ids.len());
        Ok(ids)
    }
}

impl RecordStore for FileRecordStore {
    fn collection_exists(&self, collection: &str) -> bool {
        self.collection_dir(collection).is_dir()
    }

    fn create_collection(&self, collection: &str) -> Result<bool> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("Cannot create root '{}'", self.root.display()))?;

        let dir = self.collection_dir(collection);
        match fs::create_dir(&dir) {
            Ok(())                                          => Ok(true),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e)
                .with_context(|| format!("Cannot create collection '{}'", dir.display())),
        }
    }

    fn load(&self, collection: &str, id: &str) -> Result<Sequence> {
        let path = self.record_path(collection, id);
        if !path.is_file() {
            return Err(PipelineError::RecordNotFound {
                collection: collection.to_string(),
                id:         id.to_string(),
            }
            .into());
        }

        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read record '{}'", path.display()))?;
        let file: RecordFile = serde_json::from_str(&json)
            .with_context(|| format!("Malformed record '{}'", path.display()))?;

        Ok(file.into())
    }

    fn store(&self, collection: &str, id: &str, sequence: &Sequence) -> Result<()> {
        if let Sequence::Float(values) = sequence {
            if let Some((index, &value)) =
                values.iter().enumerate().find(|(_, v)| v.is_infinite())
            {
                return Err(PipelineError::NonFiniteSample {
                    id: id.to_string(),
                    index,
                    value,
                }
                .into());
            }
        }

        let path = self.record_path(collection, id);
        let json = serde_json::to_vec(&RecordFile::from(sequence))?;
        write_atomic(&path, &json)
    }

    fn copy_metadata(&self, id: &str, source: &str, dest: &str) -> Result<()> {
        let from = self.metadata_path(source, id);
        if !from.is_file() {
            tracing::debug!("No metadata for '{}' in '{}'", id, source);
            return Ok(());
        }

        let to = self.metadata_path(dest, id);
        fs::copy(&from, &to).with_context(|| {
            format!("Cannot copy '{}' to '{}'", from.display(), to.display())
        })?;
        Ok(())
    }

    fn write_catalog(&self, collection: &str, ids: &[String]) -> Result<()> {
        let path = self.collection_dir(collection).join(CATALOG_FILE);
        let mut text = ids.join("\n");
        text.push('\n');
        write_atomic(&path, text.as_bytes())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_with_collection(name: &str) -> (TempDir, FileRecordStore) {
        let tmp   = TempDir::new().unwrap();
        let store = FileRecordStore::new(tmp.path());
        assert!(store.create_collection(name).unwrap());
        (tmp, store)
    }

    #[test]
    fn test_int_record_round_trip() {
        let (_tmp, store) = store_with_collection("raw");
        let seq = Sequence::Int(vec![1, -9999, 3]);
        store.store("raw", "A00001", &seq).unwrap();
        assert_eq!(store.load("raw", "A00001").unwrap(), seq);
    }

    #[test]
    fn test_float_nan_survives_storage() {
        let (_tmp, store) = store_with_collection("raw");
        store.store("raw", "A00002", &Sequence::Float(vec![0.5, f64::NAN])).unwrap();

        match store.load("raw", "A00002").unwrap() {
            Sequence::Float(v) => {
                assert_eq!(v[0], 0.5);
                assert!(v[1].is_nan());
            }
            other => panic!("expected float record, got {other:?}"),
        }
    }

    #[test]
    fn test_infinite_sample_is_refused() {
        let (_tmp, store) = store_with_collection("raw");
        let err = store
            .store("raw", "A00003", &Sequence::Float(vec![f64::INFINITY, 1.0]))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::NonFiniteSample { index: 0, .. })
        ));
        assert!(!store.collection_dir("raw").join("A00003.json").exists());
    }

    #[test]
    fn test_missing_record() {
        let (_tmp, store) = store_with_collection("raw");
        let err = store.load("raw", "nope").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::RecordNotFound { .. })
        ));
    }

    #[test]
    fn test_create_collection_is_idempotent() {
        let (_tmp, store) = store_with_collection("out");
        assert!(!store.create_collection("out").unwrap());
        assert!(store.collection_exists("out"));
    }

    #[test]
    fn test_catalog_round_trip() {
        let (_tmp, store) = store_with_collection("raw");
        let ids = vec!["A00001".to_string(), "A00002".to_string()];
        store.write_catalog("raw", &ids).unwrap();
        assert_eq!(store.record_ids("raw").unwrap(), ids);
    }

    #[test]
    fn test_catalog_skips_blank_lines_and_rejects_duplicates() {
        let (_tmp, store) = store_with_collection("raw");
        let path = store.collection_dir("raw").join(CATALOG_FILE);

        fs::write(&path, "A1\n\n  A2  \n").unwrap();
        assert_eq!(store.record_ids("raw").unwrap(), vec!["A1", "A2"]);

        fs::write(&path, "A1\nA1\n").unwrap();
        let err = store.record_ids("raw").unwrap_err();
        assert_eq!(
            err.downcast_ref::<PipelineError>(),
            Some(&PipelineError::DuplicateRecord("A1".into()))
        );
    }

    #[test]
    fn test_catalog_of_missing_collection() {
        let tmp   = TempDir::new().unwrap();
        let store = FileRecordStore::new(tmp.path());
        let err   = store.record_ids("ghost").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::CollectionNotFound(_))
        ));
    }

    #[test]
    fn test_metadata_copied_verbatim() {
        let (_tmp, store) = store_with_collection("raw");
        store.create_collection("out").unwrap();

        let header = "A00001 1 300 9000\nA00001.mat 16+24 1000/mV 16 0 -127 0 0 ECG\n";
        fs::write(store.collection_dir("raw").join("A00001.hea"), header).unwrap();

        store.copy_metadata("A00001", "raw", "out").unwrap();
        let copied = fs::read_to_string(store.collection_dir("out").join("A00001.hea")).unwrap();
        assert_eq!(copied, header);

        // absent metadata is not an error
        store.copy_metadata("A00002", "raw", "out").unwrap();
    }
}
