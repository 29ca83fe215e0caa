//! Multipart upload handling for book covers and pages.
//!
//! Files are validated against a MIME/extension allow-list and a per-file
//! size cap, then written into the upload directory under generated names.
//! The stored path recorded for each file is the public `/uploads/...` path
//! the static file server exposes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use axum::extract::Multipart;
use uuid::Uuid;

use hkids_core::MAX_PAGE_FILES;

use crate::error::ApiError;

/// MIME types accepted for covers and pages.
pub const ALLOWED_MIME_TYPES: [&str; 4] =
    ["image/jpeg", "image/png", "image/gif", "application/pdf"];

/// File extensions accepted for covers and pages.
const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "pdf"];

/// A file persisted to the upload directory.
#[derive(Debug, Clone)]
pub struct StoredFile {
    /// The multipart field the file arrived on ("cover" or "pages").
    pub field: String,

    /// Client-supplied file name.
    pub original_name: String,

    /// Public path under `/uploads`.
    pub path: String,

    /// Size in bytes.
    pub size: usize,
}

/// Everything extracted from a book create/update request.
#[derive(Debug, Default)]
pub struct BookUpload {
    /// Text fields by name.
    pub fields: HashMap<String, String>,

    /// The cover file, if one was uploaded.
    pub cover: Option<StoredFile>,

    /// Page files in submission order.
    pub pages: Vec<StoredFile>,
}

/// Upload validation failures, each with its own client-facing message.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// A file exceeded the per-file size limit.
    #[error("file too large on field '{field}': limit is {limit_bytes} bytes")]
    FileTooLarge {
        /// Offending field.
        field: String,
        /// Configured limit.
        limit_bytes: usize,
    },

    /// More page files than allowed.
    #[error("too many page files: at most {limit} are allowed")]
    TooManyPages {
        /// Configured limit.
        limit: usize,
    },

    /// A file with a MIME type or extension outside the allow-list.
    #[error("unsupported file type on field '{field}': {detail}")]
    UnsupportedType {
        /// Offending field.
        field: String,
        /// What was rejected (MIME type or extension).
        detail: String,
    },

    /// A file arrived on a field that does not accept files.
    #[error("unexpected file field '{0}'")]
    UnexpectedField(String),

    /// The multipart stream itself could not be read.
    #[error("malformed multipart request: {0}")]
    Malformed(String),

    /// Writing a file to the upload directory failed.
    #[error("failed to store uploaded file: {0}")]
    Io(String),
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Io(msg) => ApiError::Internal(msg),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

/// Drain a multipart stream into text fields and stored files.
///
/// On any rejection, files already written to disk are removed
/// (best-effort) before the error is returned.
pub async fn collect_book_upload(
    multipart: Multipart,
    upload_dir: &Path,
    max_file_bytes: usize,
) -> Result<BookUpload, UploadError> {
    let mut written: Vec<PathBuf> = Vec::new();

    match collect_inner(multipart, upload_dir, max_file_bytes, &mut written).await {
        Ok(upload) => Ok(upload),
        Err(err) => {
            for path in written {
                if let Err(io) = tokio::fs::remove_file(&path).await {
                    tracing::debug!(path = %path.display(), error = %io, "upload cleanup failed");
                }
            }
            Err(err)
        }
    }
}

async fn collect_inner(
    mut multipart: Multipart,
    upload_dir: &Path,
    max_file_bytes: usize,
    written: &mut Vec<PathBuf>,
) -> Result<BookUpload, UploadError> {
    let mut upload = BookUpload::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadError::Malformed(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();

        // A missing file name marks a plain text field.
        let Some(file_name) = field.file_name().map(ToString::to_string) else {
            let value = field
                .text()
                .await
                .map_err(|e| UploadError::Malformed(e.to_string()))?;
            upload.fields.insert(name, value);
            continue;
        };

        match name.as_str() {
            "cover" if upload.cover.is_some() => {
                return Err(UploadError::UnexpectedField(
                    "cover (only one cover file is accepted)".into(),
                ));
            }
            "cover" | "pages" => {}
            other => return Err(UploadError::UnexpectedField(other.to_string())),
        }

        if name == "pages" && upload.pages.len() >= MAX_PAGE_FILES {
            return Err(UploadError::TooManyPages {
                limit: MAX_PAGE_FILES,
            });
        }

        let mime = field.content_type().unwrap_or_default().to_string();
        if !ALLOWED_MIME_TYPES.contains(&mime.as_str()) {
            return Err(UploadError::UnsupportedType {
                field: name,
                detail: format!("MIME type {mime:?}"),
            });
        }

        let extension = file_extension(&file_name);
        if !ALLOWED_EXTENSIONS.contains(&extension.to_ascii_lowercase().as_str()) {
            return Err(UploadError::UnsupportedType {
                field: name,
                detail: format!("extension {extension:?}"),
            });
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| UploadError::Malformed(e.to_string()))?;

        if bytes.len() > max_file_bytes {
            return Err(UploadError::FileTooLarge {
                field: name,
                limit_bytes: max_file_bytes,
            });
        }

        let stored_name = format!("{}-{}.{}", name, Uuid::new_v4(), extension.to_ascii_lowercase());
        let disk_path = upload_dir.join(&stored_name);

        tokio::fs::write(&disk_path, &bytes)
            .await
            .map_err(|e| UploadError::Io(e.to_string()))?;
        written.push(disk_path);

        let stored = StoredFile {
            field: name.clone(),
            original_name: file_name,
            path: format!("/uploads/{stored_name}"),
            size: bytes.len(),
        };

        if name == "cover" {
            upload.cover = Some(stored);
        } else {
            upload.pages.push(stored);
        }
    }

    Ok(upload)
}

fn file_extension(file_name: &str) -> &str {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_extraction() {
        assert_eq!(file_extension("cover.PNG"), "PNG");
        assert_eq!(file_extension("archive.tar.gz"), "gz");
        assert_eq!(file_extension("no-extension"), "");
    }

    #[test]
    fn upload_errors_have_distinct_messages() {
        let size = UploadError::FileTooLarge {
            field: "cover".into(),
            limit_bytes: 100,
        };
        let count = UploadError::TooManyPages { limit: 50 };
        let field = UploadError::UnexpectedField("poster".into());

        assert!(size.to_string().contains("file too large"));
        assert!(count.to_string().contains("too many page files"));
        assert!(field.to_string().contains("unexpected file field"));
    }
}
