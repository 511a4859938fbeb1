//! # File I/O Module
//!
//! Handles record-store file operations with safety features:
//! - **Atomic saves**: Write to .tmp, sync, rename to prevent corruption
//! - **File locking**: Prevent concurrent writers on shared drives
//! - **Version validation**: Ensure schema compatibility
//!
//! ## File Format
//!
//! Stores are saved as JSON (conventionally `.json`). Lock files append
//! `.lock` to the extension and carry metadata about who holds the lock.
//!
//! ## Example
//!
//! ```rust,no_run
//! use forest_core::file_io::{save_store, load_or_create_store, FileLock};
//! use std::path::Path;
//!
//! let path = Path::new("measurements.json");
//!
//! // Acquire lock before modifying
//! let lock = FileLock::acquire(path, "forester@example.com").unwrap();
//!
//! let store = load_or_create_store(path).unwrap();
//! save_store(&store, path).unwrap();
//!
//! // Lock is released when dropped
//! drop(lock);
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::errors::{MetricsError, MetricsResult};
use crate::records::{MeasurementStore, SCHEMA_VERSION};

/// Lock file metadata stored in .lock files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// User identifier (email or username)
    pub user_id: String,
    /// Machine name where lock was acquired
    pub machine: String,
    /// Process ID that holds the lock
    pub pid: u32,
    /// When the lock was acquired
    pub locked_at: DateTime<Utc>,
}

impl LockInfo {
    /// Create new lock info for the current process
    pub fn new(user_id: impl Into<String>) -> Self {
        LockInfo {
            user_id: user_id.into(),
            machine: hostname().unwrap_or_else(|| "unknown".to_string()),
            pid: std::process::id(),
            locked_at: Utc::now(),
        }
    }
}

/// Get the hostname of the current machine
fn hostname() -> Option<String> {
    #[cfg(windows)]
    {
        std::env::var("COMPUTERNAME").ok()
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOSTNAME")
            .ok()
            .or_else(|| std::env::var("HOST").ok())
    }
}

/// File lock guard that releases the lock when dropped.
///
/// Uses both:
/// 1. OS-level file locking (via fs2) for process safety
/// 2. .lock file with metadata for user visibility
pub struct FileLock {
    /// Path to the lock file
    lock_path: PathBuf,
    /// The underlying file handle (keeps OS lock)
    _lock_file: File,
    /// Lock metadata
    pub info: LockInfo,
}

impl FileLock {
    /// Acquire an exclusive lock on a store file.
    ///
    /// # Returns
    ///
    /// * `Ok(FileLock)` - Lock acquired successfully
    /// * `Err(MetricsError::FileLocked)` - Another process holds the lock
    pub fn acquire(path: &Path, user_id: impl Into<String>) -> MetricsResult<Self> {
        let lock_path = lock_path_for(path);
        let info = LockInfo::new(user_id);

        if lock_path.exists() {
            if let Ok(existing) = read_lock_info(&lock_path) {
                if !is_lock_stale(&existing) {
                    return Err(MetricsError::file_locked(
                        path.display().to_string(),
                        format!("{} ({})", existing.user_id, existing.machine),
                        existing.locked_at.to_rfc3339(),
                    ));
                }
                tracing::warn!(
                    holder = %existing.user_id,
                    pid = existing.pid,
                    "taking over stale lock on {}",
                    path.display()
                );
            }
        }

        let mut lock_file = OpenOptions::new()
            .write(true)
            .read(true)
            .create(true)
            .truncate(true)
            .open(&lock_path)
            .map_err(|e| MetricsError::file_error("create lock", lock_path.display().to_string(), e.to_string()))?;

        // Non-blocking exclusive OS-level lock
        lock_file.try_lock_exclusive().map_err(|_| {
            MetricsError::file_locked(
                path.display().to_string(),
                "another process".to_string(),
                "unknown".to_string(),
            )
        })?;

        let lock_json = serde_json::to_string_pretty(&info).map_err(MetricsError::serialization)?;

        lock_file
            .write_all(lock_json.as_bytes())
            .map_err(|e| MetricsError::file_error("write lock", lock_path.display().to_string(), e.to_string()))?;

        lock_file
            .sync_all()
            .map_err(|e| MetricsError::file_error("sync lock", lock_path.display().to_string(), e.to_string()))?;

        tracing::debug!(user = %info.user_id, "acquired lock {}", lock_path.display());

        Ok(FileLock {
            lock_path,
            _lock_file: lock_file,
            info,
        })
    }

    /// Check if a file is locked without acquiring the lock.
    ///
    /// Returns `Some(LockInfo)` if locked, `None` if available.
    pub fn check(path: &Path) -> Option<LockInfo> {
        let lock_path = lock_path_for(path);
        if lock_path.exists() {
            if let Ok(info) = read_lock_info(&lock_path) {
                if !is_lock_stale(&info) {
                    return Some(info);
                }
            }
        }
        None
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // OS lock is released when _lock_file is dropped
        let _ = fs::remove_file(&self.lock_path);
    }
}

/// Get the lock file path for a store file
fn lock_path_for(store_path: &Path) -> PathBuf {
    let mut lock_path = store_path.to_path_buf();
    let extension = lock_path
        .extension()
        .map(|e| format!("{}.lock", e.to_string_lossy()))
        .unwrap_or_else(|| "lock".to_string());
    lock_path.set_extension(extension);
    lock_path
}

/// Get the temp file path used during atomic saves
fn tmp_path_for(store_path: &Path) -> PathBuf {
    let mut tmp_path = store_path.to_path_buf();
    let extension = tmp_path
        .extension()
        .map(|e| format!("{}.tmp", e.to_string_lossy()))
        .unwrap_or_else(|| "tmp".to_string());
    tmp_path.set_extension(extension);
    tmp_path
}

fn read_to_string(path: &Path, operation: &str) -> MetricsResult<String> {
    let mut file = File::open(path)
        .map_err(|e| MetricsError::file_error(operation, path.display().to_string(), e.to_string()))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| MetricsError::file_error(operation, path.display().to_string(), e.to_string()))?;
    Ok(contents)
}

/// Read lock info from a lock file
fn read_lock_info(lock_path: &Path) -> MetricsResult<LockInfo> {
    let contents = read_to_string(lock_path, "read lock")?;
    serde_json::from_str(&contents).map_err(MetricsError::serialization)
}

/// Check if a lock is stale (the process that created it is no longer running)
fn is_lock_stale(info: &LockInfo) -> bool {
    if let Some(our_machine) = hostname() {
        if info.machine == our_machine {
            #[cfg(windows)]
            {
                use std::process::Command;
                let output = Command::new("tasklist")
                    .args(["/FI", &format!("PID eq {}", info.pid), "/NH"])
                    .output();
                if let Ok(output) = output {
                    let stdout = String::from_utf8_lossy(&output.stdout);
                    if stdout.contains("No tasks") || !stdout.contains(&info.pid.to_string()) {
                        return true;
                    }
                }
            }
            #[cfg(unix)]
            {
                if fs::metadata(format!("/proc/{}", info.pid)).is_err() {
                    return true;
                }
            }
        }
    }

    // Locks older than 24 hours are considered abandoned
    let age = Utc::now() - info.locked_at;
    age.num_hours() > 24
}

/// Save a store to a file with atomic write semantics.
///
/// The save process:
/// 1. Serialize store to JSON
/// 2. Write to a temporary file (.tmp)
/// 3. Sync to disk (fsync)
/// 4. Rename .tmp over the target (atomic on most filesystems)
pub fn save_store(store: &MeasurementStore, path: &Path) -> MetricsResult<()> {
    let json = serde_json::to_string_pretty(store).map_err(MetricsError::serialization)?;

    let tmp_path = tmp_path_for(path);

    let mut tmp_file = File::create(&tmp_path).map_err(|e| {
        MetricsError::file_error("create temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.write_all(json.as_bytes()).map_err(|e| {
        MetricsError::file_error("write temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.sync_all().map_err(|e| {
        MetricsError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        MetricsError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    tracing::debug!(records = store.record_count(), "saved store to {}", path.display());
    Ok(())
}

/// Load a store from a file.
///
/// # Returns
///
/// * `Ok(MeasurementStore)` - Successfully loaded store
/// * `Err(MetricsError::VersionMismatch)` - File version is incompatible
/// * `Err(MetricsError::SerializationError)` - Invalid JSON
/// * `Err(MetricsError::FileError)` - I/O error
pub fn load_store(path: &Path) -> MetricsResult<MeasurementStore> {
    let contents = read_to_string(path, "read")?;

    let store: MeasurementStore = serde_json::from_str(&contents).map_err(|e| MetricsError::SerializationError {
        reason: format!("Invalid JSON in {}: {}", path.display(), e),
    })?;

    validate_version(&store.meta.version)?;

    tracing::debug!(records = store.record_count(), "loaded store from {}", path.display());
    Ok(store)
}

/// Load a store, or start a new empty one if the file does not exist yet.
pub fn load_or_create_store(path: &Path) -> MetricsResult<MeasurementStore> {
    if path.exists() {
        load_store(path)
    } else {
        tracing::info!("no store at {}, starting a new one", path.display());
        Ok(MeasurementStore::new())
    }
}

/// Load a store, also reporting whether another user holds its lock.
pub fn load_store_with_lock_check(path: &Path) -> MetricsResult<(MeasurementStore, Option<LockInfo>)> {
    let store = load_store(path)?;
    let lock_info = FileLock::check(path);
    Ok((store, lock_info))
}

/// Validate that a file version is compatible with the current schema.
fn validate_version(file_version: &str) -> MetricsResult<()> {
    let mismatch = || MetricsError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };

    let file_parts: Vec<u32> = file_version.split('.').filter_map(|p| p.parse().ok()).collect();
    let current_parts: Vec<u32> = SCHEMA_VERSION.split('.').filter_map(|p| p.parse().ok()).collect();

    if file_parts.is_empty() || current_parts.is_empty() {
        return Err(mismatch());
    }

    // Major version must match
    if file_parts[0] != current_parts[0] {
        return Err(mismatch());
    }

    // For 0.x versions a newer minor may carry breaking changes
    if current_parts[0] == 0
        && file_parts.len() > 1
        && current_parts.len() > 1
        && file_parts[1] > current_parts[1]
    {
        return Err(mismatch());
    }

    Ok(())
}
