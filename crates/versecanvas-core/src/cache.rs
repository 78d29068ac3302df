//! Process-wide cache of loaded datasets.
//!
//! A dataset is parsed the first time its path is requested and shared
//! afterwards. Entries live until the process exits.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use lazy_static::lazy_static;
use tracing::debug;

use crate::{LoadError, VerseStore};

lazy_static! {
    static ref STORES: Mutex<HashMap<PathBuf, Arc<VerseStore>>> = Mutex::new(HashMap::new());
}

/// Return the store for `path`, loading it on first access.
///
/// The lock is held while loading so concurrent first callers parse once.
pub fn shared_store(path: &Path) -> Result<Arc<VerseStore>, LoadError> {
    let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let mut stores = STORES.lock().unwrap_or_else(PoisonError::into_inner);

    if let Some(store) = stores.get(&key) {
        debug!(path = %key.display(), "Reusing cached verse dataset");
        return Ok(Arc::clone(store));
    }

    let store = Arc::new(VerseStore::load(path)?);
    stores.insert(key, Arc::clone(&store));
    Ok(store)
}
