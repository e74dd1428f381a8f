//! Secure key-value storage for session credentials
//!
//! The auth client keeps its bearer token and the cached session here so a
//! restarted app can resume without asking for credentials again.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

/// Store error types
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Corruption detected
    #[error("Corruption detected: {0}")]
    Corruption(String),

    /// Version mismatch
    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Expected version
        expected: u32,
        /// Found version
        found: u32,
    },

    /// Invalid key
    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Async key-value store for secrets
///
/// Keys are plain strings; values are opaque strings (usually JSON or tokens).
#[async_trait]
pub trait SecureStore: Send + Sync {
    /// Read a value, `None` when the key was never written or was deleted
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value; removing a missing key is not an error
    async fn delete(&self, key: &str) -> Result<()>;
}

fn check_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(StoreError::InvalidKey("key must not be empty".to_string()));
    }
    Ok(())
}

// =============================================================================
// In-memory store
// =============================================================================

/// Volatile store, used for tests and for sessions that must not outlive the process
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the store holds no keys
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl SecureStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        check_key(key)?;
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        check_key(key)?;
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        check_key(key)?;
        self.entries.write().await.remove(key);
        Ok(())
    }
}

// =============================================================================
// File-backed store
// =============================================================================

/// On-disk document: versioned entries plus a checksum over them
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreDocument {
    version: u32,
    checksum: String,
    entries: BTreeMap<String, String>,
}

impl StoreDocument {
    fn new(version: u32, entries: BTreeMap<String, String>) -> Result<Self> {
        let checksum = checksum_of(&entries)?;
        Ok(Self { version, checksum, entries })
    }

    fn verify_checksum(&self) -> Result<()> {
        let computed = checksum_of(&self.entries)?;
        if computed != self.checksum {
            return Err(StoreError::Corruption(format!(
                "Checksum mismatch: expected {}, got {}",
                self.checksum, computed
            )));
        }
        Ok(())
    }
}

fn checksum_of(entries: &BTreeMap<String, String>) -> Result<String> {
    let json = serde_json::to_string(entries)?;
    Ok(format!("{:x}", md5::compute(json)))
}

/// File store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path to the store file
    pub path: PathBuf,
    /// Current document version
    pub version: u32,
    /// Write through a temp file and rename
    pub atomic_writes: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("secure_store.json"),
            version: 1,
            atomic_writes: true,
        }
    }
}

impl StoreConfig {
    /// Create a new configuration
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), ..Default::default() }
    }

    /// Set document version
    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Enable or disable atomic writes
    pub fn atomic_writes(mut self, enabled: bool) -> Self {
        self.atomic_writes = enabled;
        self
    }
}

/// JSON file store with corruption detection
///
/// The whole document is loaded on open and rewritten on every mutation. A
/// missing file is an empty store; a corrupted or foreign-version file is an
/// error and is left untouched on disk. A mutation whose write fails leaves
/// the in-memory entries as they were, matching the file.
pub struct FileStore {
    config: StoreConfig,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at the configured path, loading existing entries
    pub async fn open(config: StoreConfig) -> Result<Self> {
        let entries = match Self::load(&config).await {
            Ok(entries) => entries,
            Err(StoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %config.path.display(), "secure store file missing, starting empty");
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };

        Ok(Self { config, entries: RwLock::new(entries) })
    }

    /// Path of the backing file
    pub fn path(&self) -> &std::path::Path {
        &self.config.path
    }

    async fn load(config: &StoreConfig) -> Result<BTreeMap<String, String>> {
        let contents = fs::read_to_string(&config.path).await?;
        let document: StoreDocument = serde_json::from_str(&contents)?;

        document.verify_checksum()?;

        if document.version != config.version {
            return Err(StoreError::VersionMismatch {
                expected: config.version,
                found: document.version,
            });
        }

        Ok(document.entries)
    }

    async fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let document = StoreDocument::new(self.config.version, entries.clone())?;
        let json = serde_json::to_string_pretty(&document)?;

        if self.config.atomic_writes {
            self.write_atomic(&json).await
        } else {
            fs::write(&self.config.path, json).await?;
            Ok(())
        }
    }

    async fn write_atomic(&self, contents: &str) -> Result<()> {
        let temp_path = self.config.path.with_extension("tmp");

        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(contents.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &self.config.path).await?;
        Ok(())
    }
}

#[async_trait]
impl SecureStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        check_key(key)?;
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        check_key(key)?;
        let mut entries = self.entries.write().await;
        let mut next = entries.clone();
        next.insert(key.to_string(), value.to_string());
        self.persist(&next).await?;
        *entries = next;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        check_key(key)?;
        let mut entries = self.entries.write().await;
        if !entries.contains_key(key) {
            return Ok(());
        }

        let mut next = entries.clone();
        next.remove(key);
        self.persist(&next).await?;
        *entries = next;
        Ok(())
    }
}
