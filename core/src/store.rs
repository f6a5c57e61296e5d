use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::StoreError;

pub const USERS_FILE: &str = "users.json";
pub const FOODS_FILE: &str = "foods.json";
pub const ENTRIES_FILE: &str = "entries.json";

/// Flat-file JSON store. Each named file holds one whole collection as a JSON
/// array and is rewritten in full on every save.
///
/// A single lock guards all files of the store: loads share it, saves take it
/// exclusively.
pub struct JsonStore {
    root: PathBuf,
    lock: RwLock<()>,
}

impl JsonStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock: RwLock::new(()),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ensure_dir(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root).map_err(|source| StoreError::Io {
            path: self.root.clone(),
            source,
        })
    }

    /// Load a collection. A missing or blank file (or a literal `null`) is an
    /// empty collection.
    pub fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Vec<T>, StoreError> {
        let _guard = self.lock.read().unwrap_or_else(PoisonError::into_inner);
        self.read_collection(name)
    }

    /// Replace a collection on disk. The new contents go to a sibling temp file
    /// first and are renamed over the target.
    pub fn save<T: Serialize>(&self, name: &str, items: &[T]) -> Result<(), StoreError> {
        let _guard = self.lock.write().unwrap_or_else(PoisonError::into_inner);
        self.write_collection(name, items)
    }

    /// Load, mutate and save a collection under one exclusive lock, so
    /// concurrent updates never overwrite each other. When `f` fails nothing is
    /// written.
    pub fn update<T, R, E>(
        &self,
        name: &str,
        f: impl FnOnce(&mut Vec<T>) -> Result<R, E>,
    ) -> Result<R, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<StoreError>,
    {
        let _guard = self.lock.write().unwrap_or_else(PoisonError::into_inner);
        let mut items = self.read_collection(name)?;
        let result = f(&mut items)?;
        self.write_collection(name, &items)?;
        Ok(result)
    }

    fn read_collection<T: DeserializeOwned>(&self, name: &str) -> Result<Vec<T>, StoreError> {
        let path = self.root.join(name);
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        let items: Option<Vec<T>> =
            serde_json::from_slice(&data).map_err(|source| StoreError::Parse {
                path: path.clone(),
                source,
            })?;
        let items = items.unwrap_or_default();
        debug!(file = name, count = items.len(), "loaded collection");
        Ok(items)
    }

    fn write_collection<T: Serialize>(&self, name: &str, items: &[T]) -> Result<(), StoreError> {
        let path = self.root.join(name);
        let data = serde_json::to_vec_pretty(items).map_err(|source| StoreError::Serialize {
            path: path.clone(),
            source,
        })?;

        let tmp = self.root.join(format!(".{name}.tmp"));
        fs::write(&tmp, &data).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(file = name, count = items.len(), "saved collection");
        Ok(())
    }
}
