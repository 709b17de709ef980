use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use tokio::sync::Mutex;

use crate::errors::{AppError, Result};

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

lazy_static! {
    static ref IMAGE_MIME: Regex = Regex::new(r"^image/").unwrap();
}

/// Upload pre-check: an `image/*` type no larger than [`MAX_IMAGE_BYTES`].
pub fn check_image(mime: &str, size: usize) -> Result<()> {
    if !IMAGE_MIME.is_match(mime) {
        return Err(AppError::Validation("Please select an image file".to_string()));
    }
    if size > MAX_IMAGE_BYTES {
        return Err(AppError::Validation("Image must be less than 5MB".to_string()));
    }

    Ok(())
}

#[async_trait]
pub trait ObjectStorage {
    async fn upload(&self, key: &str, bytes: Vec<u8>, mime: &str) -> anyhow::Result<()>;
    async fn download_url(&self, key: &str) -> anyhow::Result<String>;
}

#[derive(Debug, Default)]
pub struct InMemoryObjectStorage {
    objects: Mutex<HashMap<String, (String, Vec<u8>)>>,
}

impl InMemoryObjectStorage {
    pub fn new() -> Self { Self::default() }

    pub async fn get(&self, key: &str) -> Option<(String, Vec<u8>)> {
        self.objects.lock().await.get(key).cloned()
    }
}

#[async_trait]
impl ObjectStorage for InMemoryObjectStorage {
    async fn upload(&self, key: &str, bytes: Vec<u8>, mime: &str) -> anyhow::Result<()> {
        self.objects
            .lock()
            .await
            .insert(key.to_string(), (mime.to_string(), bytes));

        Ok(())
    }

    async fn download_url(&self, key: &str) -> anyhow::Result<String> {
        match self.objects.lock().await.contains_key(key) {
            true => Ok(format!("memory://{}", key)),
            false => anyhow::bail!("no object at `{}`", key),
        }
    }
}

/// Objects as plain files below `root`.
#[derive(Debug, Clone)]
pub struct FsObjectStorage {
    root: PathBuf,
}

impl FsObjectStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

    fn path_of(&self, key: &str) -> PathBuf { self.root.join(key) }
}

#[async_trait]
impl ObjectStorage for FsObjectStorage {
    async fn upload(&self, key: &str, bytes: Vec<u8>, mime: &str) -> anyhow::Result<()> {
        let path = self.path_of(key);
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("cannot create `{}`", dir.display()))?;
        }

        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("cannot write `{}`", path.display()))?;
        tracing::debug!("stored `{}` ({})", key, mime);

        Ok(())
    }

    async fn download_url(&self, key: &str) -> anyhow::Result<String> {
        let path = self.path_of(key);
        let path = tokio::fs::canonicalize(&path)
            .await
            .with_context(|| format!("no object at `{}`", key))?;

        Ok(format!("file://{}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_small_images_pass() {
        assert!(check_image("image/png", 1024).is_ok());
        assert!(check_image("image/jpeg", MAX_IMAGE_BYTES).is_ok());
        assert!(check_image("image/png", MAX_IMAGE_BYTES + 1).is_err());
        assert!(check_image("application/pdf", 10).is_err());
    }

    #[tokio::test]
    async fn fs_storage_hands_out_file_urls() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsObjectStorage::new(dir.path());

        assert!(storage.download_url("posts/u1/a").await.is_err());

        storage
            .upload("posts/u1/a", vec![1, 2, 3], "image/png")
            .await
            .unwrap();
        let url = storage.download_url("posts/u1/a").await.unwrap();

        assert!(url.starts_with("file://"));
        assert!(url.ends_with("posts/u1/a"));
        assert_eq!(std::fs::read(dir.path().join("posts/u1/a")).unwrap(), vec![1, 2, 3]);
    }
}
