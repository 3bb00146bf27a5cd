use anyhow::Context;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Remembers which map file each archive id resolved to, so archives are fetched and
/// extracted only once. An empty filename records an archive with nothing playable.
///
/// Every `set` rewrites the whole JSON file.
#[derive(Debug, Clone)]
pub struct ResolutionCache {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl ResolutionCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: BTreeMap::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted mapping; a missing file leaves the cache empty.
    pub fn load(&mut self) -> anyhow::Result<()> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("reading cache file: {}", self.path.display()));
            }
        };

        let persisted: BTreeMap<String, String> = serde_json::from_slice(&raw)
            .with_context(|| format!("parsing cache file: {}", self.path.display()))?;
        self.entries.extend(persisted);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }

    /// Existing entries are never overwritten.
    pub fn set(&mut self, id: &str, filename: &str) -> anyhow::Result<()> {
        if self.entries.contains_key(id) {
            return Ok(());
        }
        self.entries.insert(id.to_string(), filename.to_string());
        self.persist()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn persist(&self) -> anyhow::Result<()> {
        let serialized = serde_json::to_vec(&self.entries)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("writing cache file: {}", self.path.display()))
    }
}
