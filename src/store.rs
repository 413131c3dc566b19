//! Session persistence: the last uploaded file and the edits made since.

use crate::error::{SurveyError, SurveyResult};
use crate::model::EditRecord;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

const FILE_META: &str = "current.json";
const FILE_BYTES: &str = "current.bin";
const EDITS: &str = "edits.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub name: String,
    pub bytes: Vec<u8>,
    pub saved_at: Option<String>,
}

/// Key/value store behind session restore. Single file slot, edits keyed `"{row}-{column}"`.
pub trait SessionStore: Send {
    fn save_file(&mut self, name: &str, bytes: &[u8]) -> SurveyResult<()>;

    fn load_file(&self) -> SurveyResult<Option<StoredFile>>;

    /// Insert or overwrite the record for its cell.
    fn put_edit(&mut self, record: &EditRecord) -> SurveyResult<()>;

    fn edits(&self) -> SurveyResult<Vec<EditRecord>>;

    /// Drop the file and every edit.
    fn clear(&mut self) -> SurveyResult<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct FileMeta {
    name: String,
    saved_at: Option<String>,
}

/// Store kept in a directory on disk. Every write replaces its target atomically.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn open(root: impl Into<PathBuf>) -> SurveyResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn write_atomic(&self, name: &str, bytes: &[u8]) -> SurveyResult<()> {
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(bytes)?;
        tmp.persist(self.path(name))
            .map_err(|e| SurveyError::storage(e.error))?;
        Ok(())
    }

    fn read_edits(&self) -> SurveyResult<BTreeMap<String, EditRecord>> {
        let path = self.path(EDITS);
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = fs::read(&path)?;
        Ok(serde_json::from_slice(&contents)?)
    }

    fn remove_if_present(&self, name: &str) -> SurveyResult<()> {
        match fs::remove_file(self.path(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl SessionStore for DirectoryStore {
    fn save_file(&mut self, name: &str, bytes: &[u8]) -> SurveyResult<()> {
        self.write_atomic(FILE_BYTES, bytes)?;
        let meta = FileMeta {
            name: name.to_string(),
            saved_at: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
        };
        self.write_atomic(FILE_META, &serde_json::to_vec_pretty(&meta)?)?;
        debug!(file = name, bytes = bytes.len(), "session file saved");
        Ok(())
    }

    fn load_file(&self) -> SurveyResult<Option<StoredFile>> {
        let meta_path = self.path(FILE_META);
        let bytes_path = self.path(FILE_BYTES);
        if !meta_path.exists() || !bytes_path.exists() {
            return Ok(None);
        }
        let meta: FileMeta = serde_json::from_slice(&fs::read(meta_path)?)?;
        let bytes = fs::read(bytes_path)?;
        Ok(Some(StoredFile {
            name: meta.name,
            bytes,
            saved_at: meta.saved_at,
        }))
    }

    fn put_edit(&mut self, record: &EditRecord) -> SurveyResult<()> {
        let mut edits = self.read_edits()?;
        edits.insert(record.key(), record.clone());
        self.write_atomic(EDITS, &serde_json::to_vec(&edits)?)
    }

    fn edits(&self) -> SurveyResult<Vec<EditRecord>> {
        Ok(self.read_edits()?.into_values().collect())
    }

    fn clear(&mut self) -> SurveyResult<()> {
        self.remove_if_present(FILE_META)?;
        self.remove_if_present(FILE_BYTES)?;
        self.remove_if_present(EDITS)
    }
}

/// Stand-in when no storage is available: nothing is kept, nothing is restored.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStore;

impl SessionStore for NullStore {
    fn save_file(&mut self, _name: &str, _bytes: &[u8]) -> SurveyResult<()> {
        Ok(())
    }

    fn load_file(&self) -> SurveyResult<Option<StoredFile>> {
        Ok(None)
    }

    fn put_edit(&mut self, _record: &EditRecord) -> SurveyResult<()> {
        Ok(())
    }

    fn edits(&self) -> SurveyResult<Vec<EditRecord>> {
        Ok(Vec::new())
    }

    fn clear(&mut self) -> SurveyResult<()> {
        Ok(())
    }
}

/// Open a directory store, or fall back to [`NullStore`] when the directory is unusable.
pub fn open_or_null(root: Option<&Path>) -> Box<dyn SessionStore> {
    match root.map(DirectoryStore::open) {
        Some(Ok(store)) => Box::new(store),
        Some(Err(error)) => {
            tracing::warn!(%error, "session store unavailable, restore disabled");
            Box::new(NullStore)
        }
        None => Box::new(NullStore),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellInput;

    #[test]
    fn edits_are_keyed_by_cell() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = DirectoryStore::open(dir.path()).expect("open");
        let first = EditRecord {
            row: 6,
            column: 4,
            value: Some(CellInput::text("o")),
            exempted: false,
        };
        let second = EditRecord {
            value: Some(CellInput::text("n")),
            ..first.clone()
        };
        store.put_edit(&first).expect("put");
        store.put_edit(&second).expect("put");

        let edits = store.edits().expect("edits");
        assert_eq!(edits, vec![second]);
    }

    #[test]
    fn file_slot_is_overwritten_and_cleared() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = DirectoryStore::open(dir.path()).expect("open");
        assert!(store.load_file().expect("load").is_none());

        store.save_file("a.xlsx", b"one").expect("save");
        store.save_file("b.xlsx", b"two").expect("save");
        let stored = store.load_file().expect("load").expect("present");
        assert_eq!(stored.name, "b.xlsx");
        assert_eq!(stored.bytes, b"two");
        assert!(stored.saved_at.is_some());

        store.clear().expect("clear");
        assert!(store.load_file().expect("load").is_none());
        assert!(store.edits().expect("edits").is_empty());
    }

    #[test]
    fn unusable_directory_degrades_to_null_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"x").expect("write");
        let store = open_or_null(Some(&blocker.join("store")));
        assert!(store.load_file().expect("load").is_none());
    }
}
