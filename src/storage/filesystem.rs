use crate::storage::layout::relative_path;
use crate::storage::{Storage, StorageError, StorageResult};
use crate::url::ResourceKind;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use url::Url;

/// Filesystem-backed mirror of the crawled site
///
/// Every payload is written to a temporary file in its target directory and
/// then renamed over the target, so a reader never sees a partial file and
/// a failed write leaves nothing behind.
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    /// Opens (creating if needed) the mirror root and checks it is writable
    ///
    /// # Returns
    ///
    /// * `Ok(FsStorage)` - The root exists and accepted a probe file
    /// * `Err(StorageError::Unwritable)` - The root cannot be created or written
    pub fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();

        std::fs::create_dir_all(&root).map_err(|source| StorageError::Unwritable {
            path: root.clone(),
            source,
        })?;

        // dropped immediately; NamedTempFile removes itself
        NamedTempFile::new_in(&root).map_err(|source| StorageError::Unwritable {
            path: root.clone(),
            source,
        })?;

        Ok(Self { root })
    }

    /// Absolute path a URL would be stored at
    pub fn path_for(&self, url: &Url, kind: ResourceKind) -> StorageResult<PathBuf> {
        Ok(self.root.join(relative_path(url, kind)?))
    }
}

impl Storage for FsStorage {
    fn save(&self, url: &Url, bytes: &[u8], kind: ResourceKind) -> StorageResult<PathBuf> {
        let target = self.path_for(url, kind)?;
        let parent = target.parent().unwrap_or(&self.root);

        std::fs::create_dir_all(parent).map_err(|source| StorageError::Io {
            path: parent.to_path_buf(),
            source,
        })?;

        if target.is_dir() {
            return Err(StorageError::PathConflict { path: target });
        }

        let io_err = |source: std::io::Error| StorageError::Io {
            path: target.clone(),
            source,
        };

        let mut tmp = NamedTempFile::new_in(parent).map_err(io_err)?;
        tmp.write_all(bytes).map_err(io_err)?;
        tmp.flush().map_err(io_err)?;
        tmp.persist(&target).map_err(|e| io_err(e.error))?;

        tracing::trace!("Stored {} -> {}", url, target.display());
        Ok(target)
    }

    fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn file_count(dir: &Path) -> usize {
        let mut count = 0;
        for entry in std::fs::read_dir(dir).unwrap() {
            let entry = entry.unwrap();
            if entry.file_type().unwrap().is_dir() {
                count += file_count(&entry.path());
            } else {
                count += 1;
            }
        }
        count
    }

    #[test]
    fn test_open_creates_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("mirror/nested");
        let storage = FsStorage::open(&root).unwrap();
        assert!(root.is_dir());
        assert_eq!(storage.root(), root.as_path());
        // the probe file is gone
        assert_eq!(file_count(&root), 0);
    }

    #[test]
    fn test_open_under_regular_file_fails() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let result = FsStorage::open(blocker.join("mirror"));
        assert!(matches!(result, Err(StorageError::Unwritable { .. })));
    }

    #[test]
    fn test_save_writes_bytes() {
        let dir = TempDir::new().unwrap();
        let storage = FsStorage::open(dir.path()).unwrap();

        let path = storage
            .save(&url("https://example.com/docs/a.html"), b"<p>a</p>", ResourceKind::Page)
            .unwrap();

        assert_eq!(path, dir.path().join("example.com/docs/a.html"));
        assert_eq!(std::fs::read(&path).unwrap(), b"<p>a</p>");
    }

    #[test]
    fn test_save_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let storage = FsStorage::open(dir.path()).unwrap();
        let u = url("https://example.com/");

        let first = storage.save(&u, b"one", ResourceKind::Page).unwrap();
        let second = storage.save(&u, b"two", ResourceKind::Page).unwrap();

        assert_eq!(first, second);
        assert_eq!(std::fs::read(&second).unwrap(), b"two");
        assert_eq!(file_count(dir.path()), 1);
    }

    #[test]
    fn test_save_directory_conflict() {
        let dir = TempDir::new().unwrap();
        let storage = FsStorage::open(dir.path()).unwrap();

        storage
            .save(&url("https://example.com/a.html/b.html"), b"child", ResourceKind::Page)
            .unwrap();
        let result = storage.save(&url("https://example.com/a.html"), b"parent", ResourceKind::Page);

        assert!(matches!(result, Err(StorageError::PathConflict { .. })));
        // no temporary files left behind
        assert_eq!(file_count(dir.path()), 1);
    }

    #[test]
    fn test_save_file_blocks_directory() {
        let dir = TempDir::new().unwrap();
        let storage = FsStorage::open(dir.path()).unwrap();

        storage
            .save(&url("https://example.com/a.html"), b"parent", ResourceKind::Page)
            .unwrap();
        let result = storage.save(&url("https://example.com/a.html/b.html"), b"child", ResourceKind::Page);

        assert!(matches!(result, Err(StorageError::Io { .. })));
    }
}
