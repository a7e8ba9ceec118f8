//! Durable key/value storage for session state
//!
//! The session layer only needs "persist key → value, survive reload".
//! [`TomlFileStore`] keeps a flat TOML table on disk; [`MemoryStore`] is
//! used for tests and throwaway sessions.

use crate::{Error, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

/// Storage key for the active user identifier
pub const USER_ID_KEY: &str = "graph_user_id";

/// Storage key for the ranking strategy label
pub const ALGORITHM_KEY: &str = "graph_algorithm";

/// Scalar key/value storage that survives a client restart
pub trait DurableStore: Send + Sync {
    /// Read a value; `None` if absent or unreadable
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a value (no-op if absent)
    fn remove(&self, key: &str) -> Result<()>;
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// In-memory store
///
/// Clones share the same map, so a second client built from a clone sees
/// what the first one persisted (a simulated reload).
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `entries`
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let values = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            values: Arc::new(Mutex::new(values)),
        }
    }
}

impl DurableStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.values).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        lock(&self.values).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        lock(&self.values).remove(key);
        Ok(())
    }
}

/// File-backed store holding a flat TOML table of strings
///
/// Every write rewrites the whole file atomically (temp file + rename).
/// On Unix the file is created with 0600 permissions.
#[derive(Debug)]
pub struct TomlFileStore {
    path: PathBuf,
    cache: Mutex<BTreeMap<String, String>>,
}

impl TomlFileStore {
    /// Open (or lazily create) the store at `path`
    ///
    /// A missing file is an empty store. A file that cannot be parsed is
    /// logged and treated as empty; it is overwritten on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let cache = match std::fs::read_to_string(&path) {
            Ok(content) => match parse_table(&content) {
                Ok(table) => table,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Ignoring unreadable session file");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(Error::Io(e)),
        };

        debug!(path = %path.display(), keys = cache.len(), "Opened session store");

        Ok(Self {
            path,
            cache: Mutex::new(cache),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, table: &BTreeMap<String, String>) -> Result<()> {
        let content = toml::to_string(table)?;
        write_atomic(&self.path, &content)
    }
}

impl DurableStore for TomlFileStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.cache).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut cache = lock(&self.cache);
        let previous = cache.insert(key.to_string(), value.to_string());
        if let Err(e) = self.persist(&cache) {
            // Keep memory and disk in agreement
            match previous {
                Some(old) => cache.insert(key.to_string(), old),
                None => cache.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut cache = lock(&self.cache);
        let Some(previous) = cache.remove(key) else {
            return Ok(());
        };
        if let Err(e) = self.persist(&cache) {
            cache.insert(key.to_string(), previous);
            return Err(e);
        }
        Ok(())
    }
}

fn parse_table(content: &str) -> Result<BTreeMap<String, String>> {
    let value: toml::Table = toml::from_str(content)?;
    let mut table = BTreeMap::new();
    for (key, value) in value {
        let text = match value {
            toml::Value::String(s) => s,
            // Hand-edited files may hold `graph_user_id = 42`
            toml::Value::Integer(n) => n.to_string(),
            other => {
                return Err(Error::Storage(format!(
                    "unsupported value for '{}': {}",
                    key, other
                )))
            }
        };
        table.insert(key, text);
    }
    Ok(table)
}

/// Write `content` to `target` via a sibling temp file and rename
pub fn write_atomic(target: &Path, content: &str) -> Result<()> {
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut tmp_name = target
        .file_name()
        .ok_or_else(|| Error::Storage(format!("not a file path: {}", target.display())))?
        .to_os_string();
    tmp_name.push(".tmp");
    let tmp = target.with_file_name(tmp_name);

    std::fs::write(&tmp, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600))?;
    }

    if let Err(e) = std::fs::rename(&tmp, target) {
        let _ = std::fs::remove_file(&tmp);
        return Err(Error::Io(e));
    }
    Ok(())
}
