//! Root-scoped report storage service.
//!
//! [`ReportStore`] owns a single directory of uploaded report binaries. Object
//! keys are generated (never caller-supplied names), and every read path is
//! validated against the canonicalised root so a crafted key like
//! `../../etc/passwd` cannot escape it.

use crate::{FilesError, FilesResult};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Outcome of storing one uploaded file.
///
/// Everything the metadata row needs: the opaque key the bytes were stored
/// under, the content checksum, and the size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Generated opaque object key (`<uuid-hex><extension>`)
    pub object_key: String,
    /// Hex SHA-256 digest of the stored bytes
    pub checksum_sha256: String,
    /// Size of the stored file in bytes
    pub size_bytes: u64,
}

/// Service for storing and retrieving report binaries under one root.
///
/// The root is canonicalised at construction; all later path work is relative
/// to it. The store is stateless beyond the root path and is cheap to clone.
#[derive(Debug, Clone)]
pub struct ReportStore {
    root: PathBuf,
}

impl ReportStore {
    /// Creates a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::InvalidRootDirectory` if the path exists but is
    /// not a directory, or if it cannot be created or canonicalised.
    pub fn new(root: &Path) -> FilesResult<Self> {
        if !root.exists() {
            fs::create_dir_all(root).map_err(|e| {
                FilesError::InvalidRootDirectory(format!(
                    "cannot create {}: {}",
                    root.display(),
                    e
                ))
            })?;
        }

        if !root.is_dir() {
            return Err(FilesError::InvalidRootDirectory(format!(
                "path is not a directory: {}",
                root.display()
            )));
        }

        let root = root.canonicalize().map_err(|e| {
            FilesError::InvalidRootDirectory(format!(
                "cannot canonicalize {}: {}",
                root.display(),
                e
            ))
        })?;

        Ok(Self { root })
    }

    /// Stores `bytes` under a freshly generated object key.
    ///
    /// The key keeps the extension of `original_name` (defaulting to `.pdf`
    /// when there is none, matching the upload flow's document bias) so
    /// downloads can be served with a sensible filename.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::Io` if the write fails.
    pub fn save(&self, bytes: &[u8], original_name: &str) -> FilesResult<StoredFile> {
        let ext = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_else(|| ".pdf".to_string());
        let object_key = format!("{}{}", uuid::Uuid::new_v4().simple(), ext);

        let dest = self.root.join(&object_key);
        fs::write(&dest, bytes).map_err(|e| {
            FilesError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to write {}: {}", dest.display(), e),
            ))
        })?;

        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let checksum_sha256 = hex::encode(hasher.finalize());

        Ok(StoredFile {
            object_key,
            checksum_sha256,
            size_bytes: bytes.len() as u64,
        })
    }

    /// Reads a stored file back by its object key.
    ///
    /// # Errors
    ///
    /// - `FilesError::InvalidKey` if the key would resolve outside the root
    /// - `FilesError::NotFound` if no file exists for the key
    /// - `FilesError::Io` if the read fails
    pub fn open(&self, object_key: &str) -> FilesResult<Vec<u8>> {
        let path = self.resolve(object_key)?;

        if !path.is_file() {
            return Err(FilesError::NotFound(object_key.to_string()));
        }

        fs::read(&path).map_err(|e| {
            FilesError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to read {}: {}", path.display(), e),
            ))
        })
    }

    /// Deletes a stored file by its object key.
    ///
    /// Used when the metadata write for an upload fails after the bytes have
    /// already landed, so the store does not accumulate orphans.
    ///
    /// # Errors
    ///
    /// - `FilesError::InvalidKey` if the key would resolve outside the root
    /// - `FilesError::NotFound` if no file exists for the key
    /// - `FilesError::Io` if the delete fails
    pub fn remove(&self, object_key: &str) -> FilesResult<()> {
        let path = self.resolve(object_key)?;

        if !path.is_file() {
            return Err(FilesError::NotFound(object_key.to_string()));
        }

        fs::remove_file(&path).map_err(|e| {
            FilesError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to remove {}: {}", path.display(), e),
            ))
        })
    }

    /// Returns the canonicalised storage root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validates an object key and resolves it to an absolute path.
    ///
    /// Keys must be a single normal path component — no separators, no `..`,
    /// no absolute paths. The resolved path is additionally checked against
    /// the canonicalised root, so symlinked entries cannot escape it either.
    fn resolve(&self, object_key: &str) -> FilesResult<PathBuf> {
        if object_key.is_empty() {
            return Err(FilesError::InvalidKey("empty key".into()));
        }

        let key_path = Path::new(object_key);
        let mut components = key_path.components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => {}
            _ => {
                return Err(FilesError::InvalidKey(object_key.to_string()));
            }
        }

        let candidate = self.root.join(key_path);
        // canonicalize fails for missing files; the component check above
        // already rules out traversal for those, so fall back to the joined
        // path and let `open` report NotFound.
        let resolved = candidate.canonicalize().unwrap_or(candidate);
        if !resolved.starts_with(&self.root) {
            return Err(FilesError::InvalidKey(object_key.to_string()));
        }

        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, ReportStore) {
        let dir = TempDir::new().expect("tempdir");
        let store = ReportStore::new(dir.path()).expect("store");
        (dir, store)
    }

    #[test]
    fn save_then_open_round_trips_bytes() {
        let (_dir, store) = store();
        let stored = store.save(b"report body", "scan.pdf").expect("save");

        assert!(stored.object_key.ends_with(".pdf"));
        assert_eq!(stored.size_bytes, 11);
        // sha256("report body")
        assert_eq!(stored.checksum_sha256.len(), 64);

        let bytes = store.open(&stored.object_key).expect("open");
        assert_eq!(bytes, b"report body");
    }

    #[test]
    fn key_keeps_original_extension() {
        let (_dir, store) = store();
        let stored = store.save(b"x", "photo.jpeg").expect("save");
        assert!(stored.object_key.ends_with(".jpeg"));

        let stored = store.save(b"x", "no_extension").expect("save");
        assert!(stored.object_key.ends_with(".pdf"));
    }

    #[test]
    fn distinct_saves_get_distinct_keys() {
        let (_dir, store) = store();
        let a = store.save(b"same", "a.txt").expect("save");
        let b = store.save(b"same", "a.txt").expect("save");
        assert_ne!(a.object_key, b.object_key);
    }

    #[test]
    fn remove_deletes_the_stored_file() {
        let (_dir, store) = store();
        let stored = store.save(b"transient", "tmp.pdf").expect("save");

        store.remove(&stored.object_key).expect("remove");
        assert!(matches!(
            store.open(&stored.object_key),
            Err(FilesError::NotFound(_))
        ));
        assert!(matches!(
            store.remove(&stored.object_key),
            Err(FilesError::NotFound(_))
        ));
    }

    #[test]
    fn traversal_keys_are_rejected() {
        let (_dir, store) = store();

        for key in ["../outside.txt", "a/../../b", "/etc/passwd", "", "a/b.txt"] {
            match store.open(key) {
                Err(FilesError::InvalidKey(_)) => {}
                other => panic!("expected InvalidKey for {key:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn missing_key_is_not_found() {
        let (_dir, store) = store();
        match store.open("deadbeef.pdf") {
            Err(FilesError::NotFound(k)) => assert_eq!(k, "deadbeef.pdf"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn root_must_be_a_directory() {
        let dir = TempDir::new().expect("tempdir");
        let file_path = dir.path().join("not_a_dir");
        std::fs::write(&file_path, b"x").unwrap();

        match ReportStore::new(&file_path) {
            Err(FilesError::InvalidRootDirectory(_)) => {}
            other => panic!("expected InvalidRootDirectory, got {other:?}"),
        }
    }
}
