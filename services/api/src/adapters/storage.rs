//! services/api/src/adapters/storage.rs
//!
//! A filesystem-backed implementation of the `FileStore` port. Blobs live
//! under a configured root directory; the logical path (e.g.
//! `inspections/<id>/photo.jpg`) maps directly onto the directory layout.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use firesafe_core::ports::{FileStore, PortError, PortResult};

fn wrap(action: &str, cause: impl std::fmt::Display) -> PortError {
    PortError::Unexpected(format!("Failed to {}: {}", action, cause))
}

pub struct FsFileStore {
    root: PathBuf,
}

impl FsFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves a logical path under the storage root, rejecting any
    /// component that would escape it.
    fn resolve(&self, path: &str) -> PortResult<PathBuf> {
        let relative = Path::new(path);
        let escapes = relative.components().any(|c| {
            matches!(
                c,
                std::path::Component::ParentDir | std::path::Component::RootDir
            )
        });
        if escapes || relative.as_os_str().is_empty() {
            return Err(PortError::Unexpected(format!(
                "Failed to resolve storage path: {:?}",
                path
            )));
        }
        Ok(self.root.join(relative))
    }

    /// Walks `dir` recursively, collecting logical paths relative to the root.
    fn collect<'a>(
        &'a self,
        dir: PathBuf,
        out: &'a mut Vec<String>,
    ) -> futures::future::BoxFuture<'a, PortResult<()>> {
        Box::pin(async move {
            let mut entries = tokio::fs::read_dir(&dir)
                .await
                .map_err(|e| wrap("list stored files", e))?;
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| wrap("list stored files", e))?
            {
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| wrap("list stored files", e))?;
                if file_type.is_dir() {
                    self.collect(entry.path(), out).await?;
                } else if let Ok(relative) = entry.path().strip_prefix(&self.root) {
                    out.push(relative.to_string_lossy().replace('\\', "/"));
                }
            }
            Ok(())
        })
    }
}

#[async_trait]
impl FileStore for FsFileStore {
    async fn upload(&self, path: &str, bytes: &[u8]) -> PortResult<String> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| wrap("upload file", e))?;
        }
        tokio::fs::write(&full, bytes)
            .await
            .map_err(|e| wrap("upload file", e))?;
        Ok(path.to_string())
    }

    async fn list(&self, prefix: &str) -> PortResult<Vec<String>> {
        let dir = self.resolve(prefix)?;
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut paths = Vec::new();
        self.collect(dir, &mut paths).await?;
        paths.sort();
        Ok(paths)
    }

    async fn remove(&self, paths: &[String]) -> PortResult<()> {
        for path in paths {
            let full = self.resolve(path)?;
            match tokio::fs::remove_file(&full).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(wrap("remove file", e)),
            }
        }
        Ok(())
    }

    async fn download(&self, path: &str) -> PortResult<Vec<u8>> {
        let full = self.resolve(path)?;
        match tokio::fs::read(&full).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(PortError::NotFound(format!("File {} not found", path)))
            }
            Err(e) => Err(wrap("download file", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(tag: &str) -> FsFileStore {
        let dir = std::env::temp_dir().join(format!("firesafe-storage-{}", tag));
        let _ = std::fs::remove_dir_all(&dir);
        FsFileStore::new(dir)
    }

    #[tokio::test]
    async fn upload_then_download_round_trips() {
        let store = temp_store("roundtrip");
        let path = "inspections/abc/photo.jpg";
        let stored = store.upload(path, b"jpeg bytes").await.unwrap();
        assert_eq!(stored, path);
        assert_eq!(store.download(path).await.unwrap(), b"jpeg bytes");
    }

    #[tokio::test]
    async fn list_returns_paths_under_prefix_only() {
        let store = temp_store("list");
        store.upload("inspections/a/one.jpg", b"1").await.unwrap();
        store.upload("inspections/a/two.jpg", b"2").await.unwrap();
        store.upload("inspections/b/other.jpg", b"3").await.unwrap();

        let listed = store.list("inspections/a").await.unwrap();
        assert_eq!(
            listed,
            vec![
                "inspections/a/one.jpg".to_string(),
                "inspections/a/two.jpg".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn list_of_missing_prefix_is_empty() {
        let store = temp_store("missing");
        assert!(store.list("inspections/nope").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn remove_tolerates_already_deleted_files() {
        let store = temp_store("remove");
        store.upload("inspections/a/one.jpg", b"1").await.unwrap();
        let paths = vec![
            "inspections/a/one.jpg".to_string(),
            "inspections/a/ghost.jpg".to_string(),
        ];
        store.remove(&paths).await.unwrap();
        assert!(store.download("inspections/a/one.jpg").await.is_err());
    }

    #[tokio::test]
    async fn rejects_paths_that_escape_the_root() {
        let store = temp_store("escape");
        assert!(store.upload("../outside.txt", b"x").await.is_err());
        assert!(store.download("/etc/passwd").await.is_err());
    }
}
