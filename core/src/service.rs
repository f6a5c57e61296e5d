use std::path::Path;

use crate::error::Result;
use crate::store::JsonStore;

/// The nutrition tracker: every resource operation, evaluated on behalf of an
/// explicit caller.
///
/// Each operation reloads the collections it touches from disk, works on them
/// in memory, and rewrites a collection in full when it changes. Nothing is
/// cached between calls, so concurrent writers are last-writer-wins.
///
/// Operations are split by resource across the `auth`, `foods`, `entries` and
/// `nutrition` modules.
pub struct Tracker {
    pub(crate) store: JsonStore,
}

impl Tracker {
    /// Open (and create if needed) a data directory.
    pub fn open(data_dir: &Path) -> Result<Self> {
        let store = JsonStore::new(data_dir);
        store.ensure_dir()?;
        Ok(Self { store })
    }

    #[must_use]
    pub fn data_dir(&self) -> &Path {
        self.store.root()
    }
}
