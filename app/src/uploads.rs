//! Image uploads.
//!
//! Uploaded images are written through an [`ImageStore`] before the event
//! that references them. The store returns the public path the image is
//! served under; the event keeps only that path.

use axum::body::Bytes;
use evently_core::environment::Clock;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// URL prefix uploaded files are served under.
pub const UPLOADS_ROUTE: &str = "/uploads";

/// Message returned when a non-image file is uploaded.
pub const IMAGES_ONLY: &str = "Only image files are allowed!";

/// A file received in a multipart request.
#[derive(Clone, Debug)]
pub struct Upload {
    /// File name as sent by the client
    pub file_name: String,
    /// Declared media type
    pub content_type: String,
    /// File contents
    pub bytes: Bytes,
}

impl Upload {
    /// Whether the declared media type is an image type.
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.content_type
            .split(';')
            .next()
            .is_some_and(|essence| essence.trim().to_ascii_lowercase().starts_with("image/"))
    }
}

/// Image storage failures.
#[derive(Error, Debug)]
pub enum UploadError {
    /// Writing the file failed
    #[error("failed to write {path}: {source}")]
    Io {
        /// Target path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

/// Blob storage for uploaded images.
pub trait ImageStore: Clone + Send + Sync + 'static {
    /// Persist `upload` and return the public path it is served under.
    fn store(&self, upload: Upload) -> impl Future<Output = Result<String, UploadError>> + Send;
}

/// Writes images to a local directory served at [`UPLOADS_ROUTE`].
///
/// Files are named `{unix_millis}_{sanitized_original_name}`.
#[derive(Clone)]
pub struct LocalImageStore {
    dir: PathBuf,
    clock: Arc<dyn Clock>,
}

impl LocalImageStore {
    /// Create a store writing into `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            dir: dir.into(),
            clock,
        }
    }

    /// Directory files are written to.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the upload directory if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created.
    pub async fn ensure_dir(&self) -> Result<(), UploadError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| UploadError::Io {
                path: self.dir.clone(),
                source,
            })
    }

    /// `{unix_millis}_{8 hex digits}_{sanitized name}`. The random tag keeps
    /// two same-named uploads in one millisecond apart.
    fn file_name_for(&self, original: &str) -> String {
        format!(
            "{}_{:08x}_{}",
            self.clock.now().timestamp_millis(),
            rand::random::<u32>(),
            sanitize_file_name(original)
        )
    }
}

impl std::fmt::Debug for LocalImageStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalImageStore")
            .field("dir", &self.dir)
            .finish_non_exhaustive()
    }
}

impl ImageStore for LocalImageStore {
    async fn store(&self, upload: Upload) -> Result<String, UploadError> {
        self.ensure_dir().await?;

        let file_name = self.file_name_for(&upload.file_name);
        let path = self.dir.join(&file_name);
        tokio::fs::write(&path, &upload.bytes)
            .await
            .map_err(|source| UploadError::Io {
                path: path.clone(),
                source,
            })?;

        tracing::info!(file = %file_name, bytes = upload.bytes.len(), "Image stored");
        Ok(format!("{UPLOADS_ROUTE}/{file_name}"))
    }
}

/// Reduce a client-supplied file name to `[A-Za-z0-9._-]`.
///
/// Directory components are dropped and leading dots stripped, so the result
/// can never escape the upload directory or become a hidden file.
///
/// ```
/// use evently::uploads::sanitize_file_name;
///
/// assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
/// assert_eq!(sanitize_file_name("my photo (1).png"), "my_photo__1_.png");
/// assert_eq!(sanitize_file_name(""), "image");
/// ```
#[must_use]
pub fn sanitize_file_name(original: &str) -> String {
    let base = original
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use evently_testing::test_clock;

    fn upload(name: &str, content_type: &str) -> Upload {
        Upload {
            file_name: name.to_string(),
            content_type: content_type.to_string(),
            bytes: Bytes::from_static(b"\x89PNG\r\n"),
        }
    }

    #[test]
    fn image_media_types() {
        assert!(upload("a.png", "image/png").is_image());
        assert!(upload("a.svg", "IMAGE/svg+xml; charset=utf-8").is_image());
        assert!(!upload("a.pdf", "application/pdf").is_image());
        assert!(!upload("a.png", "").is_image());
    }

    #[test]
    fn sanitizes_names() {
        assert_eq!(sanitize_file_name("C:\\Users\\me\\cat.jpg"), "cat.jpg");
        assert_eq!(sanitize_file_name(".hidden"), "hidden");
        assert_eq!(sanitize_file_name("..."), "image");
    }

    #[tokio::test]
    async fn stores_file_under_timestamped_name() {
        let dir = tempfile::tempdir().unwrap();
        let clock = test_clock();
        let store = LocalImageStore::new(dir.path().join("uploads"), Arc::new(clock));

        let url = store.store(upload("my cat.png", "image/png")).await.unwrap();

        let file_name = url.strip_prefix("/uploads/").unwrap();
        let prefix = format!("{}_", clock.now().timestamp_millis());
        let tag = file_name.strip_prefix(&prefix).unwrap();
        assert_eq!(tag.len(), "0123abcd_my_cat.png".len());
        assert!(tag.ends_with("_my_cat.png"));
        let written = std::fs::read(dir.path().join("uploads").join(file_name)).unwrap();
        assert_eq!(written, b"\x89PNG\r\n");
    }

    #[tokio::test]
    async fn same_name_in_same_millisecond_keeps_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalImageStore::new(dir.path().to_path_buf(), Arc::new(test_clock()));

        let mut first = upload("poster.png", "image/png");
        first.bytes = Bytes::from_static(b"first");
        let mut second = upload("poster.png", "image/png");
        second.bytes = Bytes::from_static(b"second");

        let first_url = store.store(first).await.unwrap();
        let second_url = store.store(second).await.unwrap();
        assert_ne!(first_url, second_url);

        let read = |url: &str| {
            std::fs::read(dir.path().join(url.strip_prefix("/uploads/").unwrap())).unwrap()
        };
        assert_eq!(read(&first_url), b"first");
        assert_eq!(read(&second_url), b"second");
    }
}
