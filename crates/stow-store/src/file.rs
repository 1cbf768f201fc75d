//! Filesystem-backed record store.
//!
//! [`FileStore`] keeps one pretty-printed JSON document per record under a
//! root directory, named `<id>.<extension>`. The stow for a record is the
//! BLAKE3 hash of the bytes on disk, so any out-of-band edit to a file is
//! detected as a conflict on the next guarded write.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stow_types::{ObjectId, SerializedRecord};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::pattern::{keep, IdPattern};
use crate::traits::{Store, Stowed};

/// Configuration for a [`FileStore`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStoreConfig {
    /// Directory holding one file per record.
    pub root: PathBuf,
    /// File extension for record files, without the dot.
    pub extension: String,
    /// Create `root` on open if it does not exist.
    pub create_dirs: bool,
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(".stow"),
            extension: "json".into(),
            create_dirs: true,
        }
    }
}

impl FileStoreConfig {
    /// Default configuration rooted at `root`.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }
}

/// BLAKE3 hex digest of a record file's bytes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(String);

impl ContentHash {
    /// Hash the given bytes.
    pub fn of(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).to_hex().to_string())
    }

    /// Hex form of the digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0[..12.min(self.0.len())])
    }
}

/// One-file-per-record store rooted at a directory.
pub struct FileStore {
    config: FileStoreConfig,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open a store, creating the root directory when configured to.
    pub fn open(config: FileStoreConfig) -> StoreResult<Self> {
        if config.create_dirs {
            std::fs::create_dir_all(&config.root)?;
        } else if !config.root.is_dir() {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("store root {} does not exist", config.root.display()),
            )));
        }
        debug!(root = %config.root.display(), "file store opened");
        Ok(Self {
            config,
            write_lock: Mutex::new(()),
        })
    }

    /// The configuration this store was opened with.
    pub fn config(&self) -> &FileStoreConfig {
        &self.config
    }

    /// Path of the file that holds `id`.
    pub fn path_for(&self, id: &ObjectId) -> StoreResult<PathBuf> {
        validate_file_id(id)?;
        Ok(self
            .config
            .root
            .join(format!("{}.{}", id.as_str(), self.config.extension)))
    }

    fn id_from_file_name(&self, name: &str) -> Option<ObjectId> {
        if name.starts_with('.') {
            return None;
        }
        let stem = name.strip_suffix(&format!(".{}", self.config.extension))?;
        ObjectId::new(stem).ok()
    }
}

#[async_trait]
impl Store for FileStore {
    type Stow = ContentHash;

    async fn get(&self, id: &ObjectId) -> StoreResult<Stowed<ContentHash>> {
        let path = self.path_for(id)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id.clone()))
            }
            Err(e) => return Err(e.into()),
        };
        let record = SerializedRecord::from_json_bytes(&bytes).map_err(|e| StoreError::Corrupt {
            id: id.clone(),
            reason: e.to_string(),
        })?;
        let stow = ContentHash::of(&bytes);
        debug!(id = %id, stow = %stow, "record read");
        Ok(Stowed { record, stow })
    }

    async fn put(
        &self,
        record: &SerializedRecord,
        stow: Option<ContentHash>,
    ) -> StoreResult<ContentHash> {
        let path = self.path_for(&record.id)?;
        let bytes = serde_json::to_vec_pretty(record)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let _guard = self.write_lock.lock().await;
        if let Some(expected) = stow {
            match tokio::fs::read(&path).await {
                Ok(current) => {
                    let actual = ContentHash::of(&current);
                    if actual != expected {
                        return Err(StoreError::Conflict {
                            id: record.id.clone(),
                            expected: expected.to_string(),
                            actual: actual.to_string(),
                        });
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        let hash = ContentHash::of(&bytes);
        let dir = self.config.root.clone();
        tokio::task::spawn_blocking(move || write_atomically(&dir, &path, &bytes))
            .await
            .map_err(|e| StoreError::Backend(format!("write task failed: {e}")))??;

        debug!(id = %record.id, stow = %hash, "record written");
        Ok(hash)
    }

    async fn get_ids(&self, pattern: Option<&IdPattern>) -> StoreResult<Vec<ObjectId>> {
        let mut entries = tokio::fs::read_dir(&self.config.root).await?;
        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(id) = name.to_str().and_then(|n| self.id_from_file_name(n)) else {
                continue;
            };
            if keep(pattern, &id) {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }

    async fn contains(&self, id: &ObjectId) -> StoreResult<bool> {
        let path = self.path_for(id)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }
}

impl fmt::Debug for FileStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileStore")
            .field("root", &self.config.root)
            .field("extension", &self.config.extension)
            .finish()
    }
}

/// Reject ids that would escape the root or collide with temp files.
fn validate_file_id(id: &ObjectId) -> StoreResult<()> {
    let s = id.as_str();
    let reason = if s.starts_with('.') {
        Some("must not start with '.'")
    } else if s.contains(['/', '\\']) {
        Some("must not contain path separators")
    } else if s.contains('\0') {
        Some("must not contain NUL")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(StoreError::InvalidId {
            id: id.clone(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

/// Write via a temp file in the same directory, then rename into place.
fn write_atomically(dir: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, label: &str) -> SerializedRecord {
        SerializedRecord::new("node", ObjectId::new(id).unwrap(), "v1")
            .with_field("label", label)
            .unwrap()
    }

    fn id(s: &str) -> ObjectId {
        ObjectId::new(s).unwrap()
    }

    fn open(dir: &tempfile::TempDir) -> FileStore {
        FileStore::open(FileStoreConfig::at(dir.path())).unwrap()
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir);
        let written = store.put(&record("a", "hello"), None).await.unwrap();

        let stowed = store.get(&id("a")).await.unwrap();
        assert_eq!(stowed.record, record("a", "hello"));
        assert_eq!(stowed.stow, written);
        assert!(dir.path().join("a.json").is_file());
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir);
        let err = store.get(&id("ghost")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn identical_content_keeps_identical_stow() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir);
        let first = store.put(&record("a", "x"), None).await.unwrap();
        let second = store.put(&record("a", "x"), Some(first.clone())).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn out_of_band_edit_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir);
        let stow = store.put(&record("a", "x"), None).await.unwrap();

        let edited = serde_json::to_vec(&record("a", "edited")).unwrap();
        std::fs::write(dir.path().join("a.json"), edited).unwrap();

        let err = store.put(&record("a", "y"), Some(stow)).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir);
        std::fs::write(dir.path().join("bad.json"), b"{not json").unwrap();
        let err = store.get(&id("bad")).await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn unsafe_ids_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir);
        for bad in ["../escape", ".hidden", "a\\b"] {
            let err = store.put(&record(bad, "x"), None).await.unwrap_err();
            assert!(matches!(err, StoreError::InvalidId { .. }), "{bad}");
        }
    }

    #[tokio::test]
    async fn get_ids_skips_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir);
        store.put(&record("model_1_a", "m"), None).await.unwrap();
        store.put(&record("person_1_a", "p"), None).await.unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"ignore me").unwrap();
        std::fs::write(dir.path().join(".tmpXYZ"), b"partial").unwrap();
        std::fs::create_dir(dir.path().join("nested.json")).unwrap();

        let all = store.get_ids(None).await.unwrap();
        assert_eq!(all, vec![id("model_1_a"), id("person_1_a")]);

        let pattern = IdPattern::new("model*").unwrap();
        assert_eq!(store.get_ids(Some(&pattern)).await.unwrap(), vec![id("model_1_a")]);
    }

    #[tokio::test]
    async fn contains_checks_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir);
        store.put(&record("a", "x"), None).await.unwrap();
        assert!(store.contains(&id("a")).await.unwrap());
        assert!(!store.contains(&id("b")).await.unwrap());
    }

    #[test]
    fn open_without_create_requires_root() {
        let dir = tempfile::tempdir().unwrap();
        let config = FileStoreConfig {
            root: dir.path().join("missing"),
            create_dirs: false,
            ..Default::default()
        };
        assert!(FileStore::open(config).is_err());
    }

    #[test]
    fn config_defaults() {
        let config = FileStoreConfig::default();
        assert_eq!(config.extension, "json");
        assert!(config.create_dirs);
        assert_eq!(config.root, PathBuf::from(".stow"));
    }
}
