use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use affix_core::constants::FILE_PERMISSIONS;
use affix_core::FileSource;
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage implementation
#[derive(Debug, Clone)]
pub struct FilesystemStorage {
    root: PathBuf,
}

impl FilesystemStorage {
    /// Create a new FilesystemStorage rooted at `root`.
    ///
    /// The root does not have to exist yet; directories are created on write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a storage path below the root.
    ///
    /// A leading `/` is ignored. Parent-directory segments are rejected so a
    /// path can never resolve outside the root.
    fn key_to_path(&self, path: &str) -> StorageResult<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));

        let escapes = relative.components().any(|component| {
            matches!(
                component,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if relative.as_os_str().is_empty() || escapes {
            return Err(StorageError::InvalidPath(path.to_string()));
        }

        Ok(self.root.join(relative))
    }

    async fn ensure_parent_dir(&self, path: &str, target: &Path) -> StorageResult<()> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| StorageError::WriteFailed {
                    path: path.to_string(),
                    source,
                })?;
        }
        Ok(())
    }

    async fn write_bytes(target: &Path, data: &[u8]) -> std::io::Result<()> {
        let mut file = fs::File::create(target).await?;
        file.write_all(data).await?;
        file.sync_all().await
    }

    /// Move a temp file into place, copying when it cannot be renamed
    /// (e.g. across filesystems).
    async fn move_temp(temp: tempfile::TempPath, target: &Path) -> std::io::Result<()> {
        match fs::rename(&temp, target).await {
            Ok(()) => {
                // Already moved; nothing left for the guard to remove.
                let _ = temp.keep();
                Ok(())
            }
            Err(_) => fs::copy(&temp, target).await.map(|_| ()),
        }
    }

    #[cfg(unix)]
    async fn set_permissions(target: &Path) -> std::io::Result<()> {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(target, std::fs::Permissions::from_mode(FILE_PERMISSIONS)).await
    }

    #[cfg(not(unix))]
    async fn set_permissions(_target: &Path) -> std::io::Result<()> {
        Ok(())
    }

    /// Remove empty directories from `dir` upward, stopping at the root or at
    /// the first directory that cannot be removed.
    async fn prune_empty_dirs(&self, dir: Option<&Path>) {
        let mut current = dir.map(Path::to_path_buf);
        while let Some(dir) = current {
            if dir == self.root || !dir.starts_with(&self.root) {
                break;
            }
            if fs::remove_dir(&dir).await.is_err() {
                break;
            }
            tracing::debug!(dir = %dir.display(), "Removed empty directory");
            current = dir.parent().map(Path::to_path_buf);
        }
    }
}

#[async_trait]
impl Storage for FilesystemStorage {
    async fn write(
        &self,
        path: &str,
        data: FileSource,
        _content_type: Option<&str>,
    ) -> StorageResult<()> {
        let target = self.key_to_path(path)?;
        self.ensure_parent_dir(path, &target).await?;

        let start = std::time::Instant::now();

        let result = match data {
            FileSource::Temp(temp) => match Arc::try_unwrap(temp) {
                Ok(temp) => Self::move_temp(temp, &target).await,
                Err(shared) => fs::copy(&*shared, &target).await.map(|_| ()),
            },
            FileSource::Path(source) => fs::copy(&source, &target).await.map(|_| ()),
            FileSource::Memory(bytes) => Self::write_bytes(&target, &bytes).await,
        };
        result.map_err(|source| StorageError::WriteFailed {
            path: path.to_string(),
            source,
        })?;

        Self::set_permissions(&target)
            .await
            .map_err(|source| StorageError::WriteFailed {
                path: path.to_string(),
                source,
            })?;

        let size = fs::metadata(&target).await.map(|m| m.len()).unwrap_or(0);

        tracing::info!(
            path = %target.display(),
            key = %path,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Filesystem storage write successful"
        );

        Ok(())
    }

    async fn delete(&self, path: &str) -> StorageResult<()> {
        let target = self.key_to_path(path)?;
        let start = std::time::Instant::now();

        match fs::remove_file(&target).await {
            Ok(()) => {
                tracing::info!(
                    path = %target.display(),
                    key = %path,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Filesystem storage delete successful"
                );
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(key = %path, "Nothing to delete");
            }
            Err(source) => {
                return Err(StorageError::DeleteFailed {
                    path: path.to_string(),
                    source,
                });
            }
        }

        self.prune_empty_dirs(target.parent()).await;

        Ok(())
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        let target = self.key_to_path(path)?;
        Ok(fs::try_exists(&target).await.unwrap_or(false))
    }

    async fn to_readable_file(&self, path: &str) -> StorageResult<Option<FileSource>> {
        let target = self.key_to_path(path)?;
        if !fs::try_exists(&target).await.unwrap_or(false) {
            return Ok(None);
        }
        Ok(Some(FileSource::Path(target)))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Filesystem
    }
}

#[cfg(all(test, feature = "storage-filesystem"))]
mod tests {
    use super::*;
    use bytes::Bytes;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_write_creates_directories() {
        let dir = tempdir().unwrap();
        let storage = FilesystemStorage::new(dir.path());

        storage
            .write(
                "/users/avatars/000/000/001/small/me.png",
                FileSource::Memory(Bytes::from_static(b"png")),
                Some("image/png"),
            )
            .await
            .unwrap();

        let stored = dir.path().join("users/avatars/000/000/001/small/me.png");
        assert_eq!(std::fs::read(&stored).unwrap(), b"png");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_written_files_are_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let storage = FilesystemStorage::new(dir.path());
        storage
            .write("a/b.txt", FileSource::from(b"x".to_vec()), None)
            .await
            .unwrap();

        let mode = std::fs::metadata(dir.path().join("a/b.txt"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[tokio::test]
    async fn test_write_moves_owned_temp_file() {
        let dir = tempdir().unwrap();
        let storage = FilesystemStorage::new(dir.path().join("store"));

        let temp = affix_core::file_source::new_temp_path(Some("txt")).unwrap();
        std::fs::write(&temp, b"temp data").unwrap();
        let temp_location = temp.to_path_buf();

        storage
            .write("moved.txt", FileSource::Temp(Arc::new(temp)), None)
            .await
            .unwrap();

        assert_eq!(
            std::fs::read(dir.path().join("store/moved.txt")).unwrap(),
            b"temp data"
        );
        assert!(!temp_location.exists());
    }

    #[tokio::test]
    async fn test_write_copies_shared_temp_file() {
        let dir = tempdir().unwrap();
        let storage = FilesystemStorage::new(dir.path());

        let temp = affix_core::file_source::new_temp_path(None).unwrap();
        std::fs::write(&temp, b"shared").unwrap();
        let shared = Arc::new(temp);

        storage
            .write("one.bin", FileSource::Temp(shared.clone()), None)
            .await
            .unwrap();

        assert!(shared.exists());
        assert_eq!(std::fs::read(dir.path().join("one.bin")).unwrap(), b"shared");
    }

    #[tokio::test]
    async fn test_delete_prunes_empty_directories() {
        let dir = tempdir().unwrap();
        let storage = FilesystemStorage::new(dir.path());

        storage
            .write("a/b/c/one.txt", FileSource::from(b"1".to_vec()), None)
            .await
            .unwrap();
        storage
            .write("a/other.txt", FileSource::from(b"2".to_vec()), None)
            .await
            .unwrap();

        storage.delete("a/b/c/one.txt").await.unwrap();

        assert!(!dir.path().join("a/b").exists());
        assert!(dir.path().join("a/other.txt").exists());
        assert!(dir.path().exists());
    }

    #[tokio::test]
    async fn test_delete_missing_file_is_ok() {
        let dir = tempdir().unwrap();
        let storage = FilesystemStorage::new(dir.path());

        storage.delete("never/written.txt").await.unwrap();
        assert!(dir.path().exists());
    }

    #[tokio::test]
    async fn test_rename_moves_file() {
        let dir = tempdir().unwrap();
        let storage = FilesystemStorage::new(dir.path());

        storage
            .write("old/name.txt", FileSource::from(b"data".to_vec()), None)
            .await
            .unwrap();
        storage
            .rename("old/name.txt", "new/name.txt", None)
            .await
            .unwrap();

        assert!(!storage.exists("old/name.txt").await.unwrap());
        assert!(!dir.path().join("old").exists());
        assert_eq!(
            std::fs::read(dir.path().join("new/name.txt")).unwrap(),
            b"data"
        );
    }

    #[tokio::test]
    async fn test_rename_missing_source_fails() {
        let dir = tempdir().unwrap();
        let storage = FilesystemStorage::new(dir.path());

        let result = storage.rename("missing.txt", "other.txt", None).await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_to_readable_file() {
        let dir = tempdir().unwrap();
        let storage = FilesystemStorage::new(dir.path());

        assert!(storage.to_readable_file("x.txt").await.unwrap().is_none());

        storage
            .write("x.txt", FileSource::from(b"hello".to_vec()), None)
            .await
            .unwrap();
        let source = storage.to_readable_file("x.txt").await.unwrap().unwrap();
        assert_eq!(source.read().await.unwrap(), Bytes::from_static(b"hello"));
    }

    #[test]
    fn test_path_traversal_rejected() {
        let storage = FilesystemStorage::new("/var/lib/affix");

        assert!(matches!(
            storage.key_to_path("../etc/passwd"),
            Err(StorageError::InvalidPath(_))
        ));
        assert!(matches!(
            storage.key_to_path("a/../../b"),
            Err(StorageError::InvalidPath(_))
        ));
        assert!(storage.key_to_path("").is_err());
        assert_eq!(
            storage.key_to_path("/a/b.txt").unwrap(),
            PathBuf::from("/var/lib/affix/a/b.txt")
        );
    }
}
