//! Uploaded asset storage
//!
//! Files land on local disk under the configured upload directory and
//! are served back under `/uploads/`. Stored names are fresh UUIDs so
//! client-supplied filenames never touch the filesystem.

use std::path::PathBuf;

use anyhow::Context;
use thiserror::Error;
use uuid::Uuid;

use crate::config::UploadConfig;

#[derive(Debug, Error)]
pub enum AssetServiceError {
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),
    #[error("File too large: {size} bytes (limit {limit})")]
    TooLarge { size: u64, limit: u64 },
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct AssetService {
    config: UploadConfig,
}

impl AssetService {
    pub fn new(config: UploadConfig) -> Self {
        Self { config }
    }

    /// Store an uploaded image, returning its public URL path
    pub async fn store_image(
        &self,
        content_type: &str,
        data: &[u8],
    ) -> Result<String, AssetServiceError> {
        if !self.config.is_image_allowed(content_type) {
            return Err(AssetServiceError::UnsupportedType(content_type.to_string()));
        }
        if data.len() as u64 > self.config.max_image_size {
            return Err(AssetServiceError::TooLarge {
                size: data.len() as u64,
                limit: self.config.max_image_size,
            });
        }
        self.write(self.config.extension_for(content_type), data)
            .await
    }

    /// Store an uploaded PDF, returning its public URL path
    pub async fn store_pdf(
        &self,
        content_type: &str,
        data: &[u8],
    ) -> Result<String, AssetServiceError> {
        if content_type != "application/pdf" {
            return Err(AssetServiceError::UnsupportedType(content_type.to_string()));
        }
        if data.len() as u64 > self.config.max_pdf_size {
            return Err(AssetServiceError::TooLarge {
                size: data.len() as u64,
                limit: self.config.max_pdf_size,
            });
        }
        self.write("pdf", data).await
    }

    /// Remove a stored asset given its public URL path.
    ///
    /// A URL outside `/uploads/` or one that walks the directory tree
    /// is ignored.
    pub async fn remove(&self, url: &str) -> Result<(), AssetServiceError> {
        let Some(name) = url.strip_prefix("/uploads/") else {
            return Ok(());
        };
        if name.is_empty() || name.contains('/') || name.contains("..") {
            return Ok(());
        }
        let path = self.config.path.join(name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AssetServiceError::InternalError(
                anyhow::Error::new(e).context(format!("Failed to remove {}", path.display())),
            )),
        }
    }

    /// Remove freshly stored files after a rejected write, best effort
    pub async fn discard<'a, I>(&self, urls: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for url in urls {
            let _ = self.remove(url).await;
        }
    }

    async fn write(&self, extension: &str, data: &[u8]) -> Result<String, AssetServiceError> {
        tokio::fs::create_dir_all(&self.config.path)
            .await
            .context("Failed to create upload directory")?;

        let name = format!("{}.{extension}", Uuid::new_v4().simple());
        let path: PathBuf = self.config.path.join(&name);
        tokio::fs::write(&path, data)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(format!("/uploads/{name}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service(dir: &tempfile::TempDir) -> AssetService {
        AssetService::new(UploadConfig {
            path: dir.path().to_path_buf(),
            max_image_size: 1024,
            max_pdf_size: 2048,
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_store_image_returns_uploads_url() {
        let dir = tempfile::tempdir().unwrap();
        let service = test_service(&dir);

        let url = service.store_image("image/png", b"png-bytes").await.unwrap();
        assert!(url.starts_with("/uploads/"));
        assert!(url.ends_with(".png"));

        let name = url.strip_prefix("/uploads/").unwrap();
        let stored = std::fs::read(dir.path().join(name)).unwrap();
        assert_eq!(stored, b"png-bytes");
    }

    #[tokio::test]
    async fn test_rejects_disallowed_type_and_oversize() {
        let dir = tempfile::tempdir().unwrap();
        let service = test_service(&dir);

        assert!(matches!(
            service.store_image("application/x-msdownload", b"x").await,
            Err(AssetServiceError::UnsupportedType(_))
        ));
        assert!(matches!(
            service.store_image("image/png", &[0u8; 2048]).await,
            Err(AssetServiceError::TooLarge { .. })
        ));
        assert!(matches!(
            service.store_pdf("image/png", b"x").await,
            Err(AssetServiceError::UnsupportedType(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_ignores_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let service = test_service(&dir);

        let url = service.store_image("image/jpeg", b"jpg").await.unwrap();
        service.remove("/uploads/../etc/passwd").await.unwrap();
        service.remove("/elsewhere/file.png").await.unwrap();
        service.remove(&url).await.unwrap();
        service.remove(&url).await.unwrap(); // idempotent
    }
}
