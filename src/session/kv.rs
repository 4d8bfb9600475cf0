//! Key-value stores with expiry
//!
//! The history backend only needs `get` and `put` with a TTL. Two stores:
//! - [`MemoryKv`]: process memory, gone on restart
//! - [`FileKv`]: one JSON record per key in a directory
//!
//! Expired records read as missing.

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Store errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store can't be reached
    Unavailable(String),
    /// Value couldn't be encoded or decoded
    Serialize(String),
    /// I/O error
    Io(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable(s) => write!(f, "store unavailable: {}", s),
            StoreError::Serialize(s) => write!(f, "serialize error: {}", s),
            StoreError::Io(s) => write!(f, "I/O error: {}", s),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        StoreError::Io(e.to_string())
    }
}

/// A string key-value store with per-key expiry
pub trait KvStore {
    /// Value for `key`, `None` if missing or expired
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Store `value`, replacing any previous one, for `ttl`
    fn put(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()>;
}

/// In-process store. Expired entries are dropped on read and swept on
/// every write.
#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live (unexpired) keys
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .map(|entries| entries.values().filter(|(_, exp)| *exp > now).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KvStore for MemoryKv {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Unavailable("lock poisoned".into()))?;
        match entries.get(key) {
            Some((value, expires)) if *expires > Instant::now() => Ok(Some(value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn put(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Unavailable("lock poisoned".into()))?;
        let now = Instant::now();
        entries.retain(|_, (_, expires)| *expires > now);
        entries.insert(key.to_string(), (value.to_string(), now + ttl));
        Ok(())
    }
}

/// On-disk record
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Record {
    value: String,
    /// Unix seconds
    expires_at: i64,
}

/// Directory-backed store
#[derive(Debug, Clone)]
pub struct FileKv {
    dir: PathBuf,
}

impl FileKv {
    /// Open (creating if needed) a store directory
    pub fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Keys contain `:`; encode them into safe file names
    fn path_for(&self, key: &str) -> PathBuf {
        let name = utf8_percent_encode(key, NON_ALPHANUMERIC).to_string();
        self.dir.join(format!("{}.json", name))
    }
}

impl KvStore for FileKv {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let path = self.path_for(key);
        let data = match std::fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let record: Record =
            serde_json::from_slice(&data).map_err(|e| StoreError::Serialize(e.to_string()))?;
        if record.expires_at <= chrono::Utc::now().timestamp() {
            std::fs::remove_file(&path).ok(); // Another request may have beaten us to it
            return Ok(None);
        }
        Ok(Some(record.value))
    }

    fn put(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()> {
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let record = Record {
            value: value.to_string(),
            expires_at: chrono::Utc::now().timestamp().saturating_add(ttl_secs),
        };
        let data = serde_json::to_vec(&record).map_err(|e| StoreError::Serialize(e.to_string()))?;

        // Write then rename, so readers never see half a record
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, data)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEEK: Duration = Duration::from_secs(60 * 60 * 24 * 7);

    #[test]
    fn test_memory_put_get() {
        let kv = MemoryKv::new();
        assert_eq!(kv.get("k").unwrap(), None);
        kv.put("k", "v", WEEK).unwrap();
        assert_eq!(kv.get("k").unwrap(), Some("v".to_string()));
        kv.put("k", "w", WEEK).unwrap();
        assert_eq!(kv.get("k").unwrap(), Some("w".to_string()));
        assert_eq!(kv.len(), 1);
    }

    #[test]
    fn test_memory_expiry() {
        let kv = MemoryKv::new();
        kv.put("k", "v", Duration::ZERO).unwrap();
        assert_eq!(kv.get("k").unwrap(), None);
        assert!(kv.is_empty());
    }

    #[test]
    fn test_memory_put_sweeps_expired() {
        let kv = MemoryKv::new();
        kv.put("history:gone-1", "a", Duration::ZERO).unwrap();
        kv.put("history:gone-2", "b", Duration::ZERO).unwrap();
        kv.put("history:live", "c", WEEK).unwrap();
        assert_eq!(kv.entries.lock().unwrap().len(), 1);
        assert_eq!(kv.get("history:live").unwrap(), Some("c".to_string()));
    }

    #[test]
    fn test_file_put_get() {
        let dir = tempfile::tempdir().unwrap();
        let kv = FileKv::open(dir.path().join("kv")).unwrap();
        kv.put("history:abc", "[1,2]", WEEK).unwrap();
        assert_eq!(kv.get("history:abc").unwrap(), Some("[1,2]".to_string()));
        assert_eq!(kv.get("history:other").unwrap(), None);
    }

    #[test]
    fn test_file_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        FileKv::open(dir.path()).unwrap().put("k", "v", WEEK).unwrap();
        let kv = FileKv::open(dir.path()).unwrap();
        assert_eq!(kv.get("k").unwrap(), Some("v".to_string()));
    }

    #[test]
    fn test_file_expiry_removes_record() {
        let dir = tempfile::tempdir().unwrap();
        let kv = FileKv::open(dir.path()).unwrap();
        kv.put("k", "v", Duration::ZERO).unwrap();
        assert_eq!(kv.get("k").unwrap(), None);
        assert!(!kv.path_for("k").exists());
    }

    #[test]
    fn test_file_corrupt_record() {
        let dir = tempfile::tempdir().unwrap();
        let kv = FileKv::open(dir.path()).unwrap();
        std::fs::write(kv.path_for("k"), "garbage").unwrap();
        assert!(matches!(kv.get("k"), Err(StoreError::Serialize(_))));
    }

    #[test]
    fn test_file_names_are_safe() {
        let dir = tempfile::tempdir().unwrap();
        let kv = FileKv::open(dir.path()).unwrap();
        let path = kv.path_for("history:../../etc");
        assert_eq!(path.parent(), Some(dir.path()));
    }
}
