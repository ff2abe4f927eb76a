//! Filesystem document store.
//!
//! Documents are written under a root directory at their relative store
//! path, with the metadata in a `<path>.meta.json` sidecar. Writing an
//! existing path replaces both files. Listing skips sidecars.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::error::StoreError;
use crate::pipeline::types::{DocMetadata, DocumentStore};

const SIDECAR_SUFFIX: &str = ".meta.json";

pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root directory.
    pub async fn ensure_root(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Map a relative store path onto the root. Absolute paths and `..`
    /// components are rejected.
    pub fn resolve_path(&self, relative: &str) -> Result<PathBuf, StoreError> {
        let path = Path::new(relative);
        if relative.trim().is_empty() {
            return Err(StoreError::InvalidPath(relative.to_string()));
        }
        for component in path.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                _ => return Err(StoreError::InvalidPath(relative.to_string())),
            }
        }
        Ok(self.root.join(path))
    }

    async fn write_document(
        &self,
        target: &Path,
        content: &str,
        metadata: &DocMetadata,
    ) -> Result<(), StoreError> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }

        let sidecar = serde_json::to_string_pretty(metadata)?;
        fs::write(target, content).await?;
        fs::write(sidecar_path(target), sidecar).await?;

        tracing::debug!(path = %target.display(), bytes = content.len(), "Wrote document");
        Ok(())
    }

    /// Store-relative, `/`-separated form of a path under the root.
    fn relative(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<_> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect();
        Some(parts.join("/"))
    }
}

fn sidecar_path(document: &Path) -> PathBuf {
    let mut name = document.as_os_str().to_owned();
    name.push(SIDECAR_SUFFIX);
    PathBuf::from(name)
}

fn not_found(path: &str, e: std::io::Error) -> StoreError {
    if e.kind() == ErrorKind::NotFound {
        StoreError::NotFound(path.to_string())
    } else {
        StoreError::Io(e)
    }
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
    async fn store(
        &self,
        path: &str,
        content: &str,
        metadata: &DocMetadata,
    ) -> Result<(), StoreError> {
        let target = self.resolve_path(path)?;
        self.write_document(&target, content, metadata).await
    }

    async fn get(&self, path: &str) -> Result<String, StoreError> {
        let target = self.resolve_path(path)?;
        fs::read_to_string(&target)
            .await
            .map_err(|e| not_found(path, e))
    }

    async fn update(
        &self,
        path: &str,
        content: &str,
        metadata: &DocMetadata,
    ) -> Result<(), StoreError> {
        let target = self.resolve_path(path)?;
        if !fs::try_exists(&target).await? {
            return Err(StoreError::NotFound(path.to_string()));
        }
        self.write_document(&target, content, metadata).await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let start = if prefix.trim_matches('/').is_empty() {
            self.root.clone()
        } else {
            self.resolve_path(prefix.trim_end_matches('/'))?
        };

        let mut documents = Vec::new();
        let mut pending = vec![start];
        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                } else if !path.to_string_lossy().ends_with(SIDECAR_SUFFIX)
                    && let Some(relative) = self.relative(&path)
                {
                    documents.push(relative);
                }
            }
        }

        documents.sort();
        Ok(documents)
    }
}
