// src/store.rs
//
// Disk-backed memo of provider answers: one JSON object per provider,
// `query -> result | null`. `null` means "asked, nothing there"; a missing
// key means "never asked". Loaded whole at start, written whole once at
// the end of a run.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Serialize, de::DeserializeOwned};

use crate::error::Result;
use crate::file::write_atomic;

#[derive(Clone, Debug)]
pub struct DiskCache<V> {
    path: PathBuf,
    entries: BTreeMap<String, Option<V>>,
}

impl<V> DiskCache<V>
where
    V: Serialize + DeserializeOwned,
{
    /// Never fails. A missing file gives an empty cache; an unreadable or
    /// unparsable one is logged, moved aside to `<file>.corrupt`, and also
    /// gives an empty cache.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<BTreeMap<String, Option<V>>>(&text) {
                Ok(map) => {
                    logd!("cache {}: {} entries", path.display(), map.len());
                    map
                }
                Err(e) => {
                    loge!("cache {} is corrupt ({e}); starting empty", path.display());
                    quarantine(&path);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                loge!("cache {} unreadable ({e}); starting empty", path.display());
                quarantine(&path);
                BTreeMap::new()
            }
        };
        Self { path, entries }
    }

    /// Write the whole mapping back, replacing the file atomically.
    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        write_atomic(&self.path, json.as_bytes())?;
        logd!("cache {}: saved {} entries", self.path.display(), self.entries.len());
        Ok(())
    }
}

impl<V> DiskCache<V> {
    /// An empty cache that will save to `path`.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), entries: BTreeMap::new() }
    }

    /// `None`: never looked up. `Some(None)`: looked up, nothing found.
    pub fn get(&self, query: &str) -> Option<&Option<V>> {
        self.entries.get(query)
    }

    pub fn contains(&self, query: &str) -> bool {
        self.entries.contains_key(query)
    }

    pub fn insert(&mut self, query: impl Into<String>, value: Option<V>) {
        self.entries.insert(query.into(), value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// (entries with a result, explicit nulls)
    pub fn counts(&self) -> (usize, usize) {
        let absent = self.entries.values().filter(|v| v.is_none()).count();
        (self.entries.len() - absent, absent)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&V>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }
}

/// Keep the broken file for inspection; the next save would overwrite it.
fn quarantine(path: &Path) {
    let mut aside = path.as_os_str().to_owned();
    aside.push(".corrupt");
    if let Err(e) = fs::rename(path, &aside) {
        logw!("could not move {} aside: {e}", path.display());
    }
}
