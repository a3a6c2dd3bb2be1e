//! Image storage for uploaded category and brand pictures
//!
//! Files are written to `<directory>/<plural>/<entity>-<uuid>-<millis>.jpeg`
//! (for example `uploads/categories/category-<uuid>-<millis>.jpeg`) and the
//! bare file name is returned for storage in the document.

use std::path::{Path, PathBuf};

use crate::handlers::{ApiError, ApiErrorKind, ApiOperation, UploadedFile};
use crate::query::EntityKind;

/// Writes accepted image uploads to disk
#[derive(Debug, Clone)]
pub struct ImageStore {
    directory: PathBuf,
    max_bytes: usize,
}

impl ImageStore {
    /// Store images below `directory`, rejecting files over `max_bytes`
    pub fn new(directory: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            directory: directory.into(),
            max_bytes,
        }
    }

    /// Root upload directory
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Check that `file` is an image within the size limit
    pub fn accept(&self, file: &UploadedFile) -> Result<(), ApiError> {
        let is_image = file
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("image"));
        if !is_image {
            return Err(ApiError::bad_request(ApiOperation::Create, "Only Images allowed"));
        }
        if file.bytes.len() > self.max_bytes {
            return Err(ApiError::bad_request(
                ApiOperation::Create,
                format!("Image exceeds the {} byte limit", self.max_bytes),
            ));
        }
        Ok(())
    }

    /// Validate and persist `file` for `kind`, returning the stored file name
    pub async fn save(&self, kind: EntityKind, file: &UploadedFile) -> Result<String, ApiError> {
        self.accept(file)?;

        let entity = kind.as_str().to_lowercase();
        let folder = self.directory.join(kind.plural());
        let file_name = format!(
            "{entity}-{}-{}.jpeg",
            uuid::Uuid::new_v4(),
            chrono::Utc::now().timestamp_millis()
        );
        let path = folder.join(&file_name);

        let write = async {
            tokio::fs::create_dir_all(&folder).await?;
            tokio::fs::write(&path, &file.bytes).await
        };
        write.await.map_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "failed to store image");
            ApiError::new(ApiOperation::Create, ApiErrorKind::InternalError, "Failed to store image")
        })?;

        tracing::info!(%kind, file = %file_name, bytes = file.bytes.len(), "image stored");
        Ok(file_name)
    }
}
