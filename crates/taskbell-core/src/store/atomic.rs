//! Atomic JSON file replacement.
//!
//! Write protocol: copy the current file to `.bak`, stage the new content
//! in `.tmp`, rename `.tmp` over the target in one step, then delete the
//! `.bak`. After any failure either the previous committed version or the
//! full new version is observable, never a partial write. Both side files
//! are transient and absent after a successful write.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::StoreError;

/// `path` with an extra suffix appended (`tasks.json` -> `tasks.json.bak`).
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(suffix);
    PathBuf::from(os)
}

/// Serialize `data` and commit it to `path` atomically.
pub(crate) fn write_json<T: Serialize>(path: &Path, data: &T) -> Result<(), StoreError> {
    let bak = sibling(path, ".bak");
    let tmp = sibling(path, ".tmp");

    // A stale backup with no primary means a previous run crashed between
    // the rename and the backup cleanup, or lost the primary entirely.
    // Restore it before staging; failure here is non-fatal.
    if bak.exists() && !path.exists() {
        match fs::copy(&bak, path) {
            Ok(_) => warn!(path = %path.display(), "restored collection from stale backup"),
            Err(e) => warn!(path = %path.display(), error = %e, "stale backup restore failed"),
        }
    }

    let bytes = serde_json::to_vec_pretty(data).map_err(|source| StoreError::Encode {
        path: path.to_path_buf(),
        source,
    })?;

    if path.exists() {
        if let Err(e) = fs::copy(path, &bak) {
            // Continue without a rollback point rather than refusing the
            // write; the rename below is still all-or-nothing.
            warn!(path = %path.display(), error = %e, "backup creation failed");
        }
    }

    let staged = fs::write(&tmp, &bytes).and_then(|()| fs::rename(&tmp, path));
    match staged {
        Ok(()) => {
            debug!(path = %path.display(), "collection committed");
            if bak.exists() {
                if let Err(e) = fs::remove_file(&bak) {
                    warn!(path = %bak.display(), error = %e, "backup cleanup failed");
                }
            }
            Ok(())
        }
        Err(source) => {
            if tmp.exists() {
                let _ = fs::remove_file(&tmp);
            }
            if bak.exists() {
                match fs::copy(&bak, path) {
                    Ok(_) => warn!(path = %path.display(), "restored collection from backup"),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "backup restore failed")
                    }
                }
            }
            Err(StoreError::Write {
                path: path.to_path_buf(),
                source,
            })
        }
    }
}

/// Read the last committed version of `path`.
///
/// A missing file yields `default()`. An undecodable primary falls back to
/// the `.bak` side file; if that also fails the default is returned with a
/// warning rather than failing startup. I/O errors other than "not found"
/// are surfaced.
pub(crate) fn read_json_or<T, F>(path: &Path, default: F) -> Result<T, StoreError>
where
    T: DeserializeOwned,
    F: FnOnce() -> T,
{
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "collection file missing, using default");
            return Ok(default());
        }
        Err(source) => {
            return Err(StoreError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    match serde_json::from_str(&content) {
        Ok(value) => Ok(value),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "collection undecodable, trying backup");
            let bak = sibling(path, ".bak");
            match fs::read_to_string(&bak)
                .ok()
                .and_then(|s| serde_json::from_str(&s).ok())
            {
                Some(value) => {
                    warn!(path = %bak.display(), "recovered collection from backup");
                    Ok(value)
                }
                None => {
                    warn!(path = %path.display(), "backup unusable, using default");
                    Ok(default())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Doc {
        value: u32,
    }

    fn doc(value: u32) -> Doc {
        Doc { value }
    }

    #[test]
    fn write_then_read_roundtrips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.json");
        write_json(&path, &doc(7)).unwrap();
        let read: Doc = read_json_or(&path, || doc(0)).unwrap();
        assert_eq!(read, doc(7));
    }

    #[test]
    fn missing_file_yields_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.json");
        let read: Doc = read_json_or(&path, || doc(42)).unwrap();
        assert_eq!(read, doc(42));
    }

    #[test]
    fn repeated_writes_leave_no_side_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.json");
        write_json(&path, &doc(1)).unwrap();
        write_json(&path, &doc(1)).unwrap();

        let read: Doc = read_json_or(&path, || doc(0)).unwrap();
        assert_eq!(read, doc(1));
        assert!(!sibling(&path, ".tmp").exists());
        assert!(!sibling(&path, ".bak").exists());
    }

    #[test]
    fn stale_tmp_does_not_shadow_committed_data() {
        // Simulates a crash after staging but before the rename: the .tmp
        // artifact exists but the primary was never replaced.
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.json");
        write_json(&path, &doc(1)).unwrap();
        fs::write(sibling(&path, ".tmp"), b"{\"value\":2").unwrap();

        let read: Doc = read_json_or(&path, || doc(0)).unwrap();
        assert_eq!(read, doc(1));
    }

    #[test]
    fn corrupt_primary_recovers_from_backup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.json");
        write_json(&path, &doc(3)).unwrap();
        fs::copy(&path, sibling(&path, ".bak")).unwrap();
        fs::write(&path, b"{ not json").unwrap();

        let read: Doc = read_json_or(&path, || doc(0)).unwrap();
        assert_eq!(read, doc(3));
    }

    #[test]
    fn corrupt_primary_and_backup_yield_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.json");
        fs::write(&path, b"garbage").unwrap();
        fs::write(sibling(&path, ".bak"), b"more garbage").unwrap();

        let read: Doc = read_json_or(&path, || doc(9)).unwrap();
        assert_eq!(read, doc(9));
    }

    #[test]
    fn stale_backup_without_primary_is_restored_on_write() {
        // Crash left only a .bak behind; the next write restores it first,
        // then commits the new version over it.
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.json");
        write_json(&path, &doc(5)).unwrap();
        fs::rename(&path, sibling(&path, ".bak")).unwrap();

        write_json(&path, &doc(6)).unwrap();
        let read: Doc = read_json_or(&path, || doc(0)).unwrap();
        assert_eq!(read, doc(6));
        assert!(!sibling(&path, ".bak").exists());
    }
}
