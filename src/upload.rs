//! Multipart folder upload handler.

use axum::extract::{Extension, Multipart};
use axum::response::Json as JsonResponse;
use serde::Serialize;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::config::UPLOAD_FIELD_NAME;
use crate::error::ApiError;
use crate::storage::Storage;

pub const UPLOAD_SUCCESS_MESSAGE: &str = "Folder uploaded successfully";
pub const NO_FILES_MESSAGE: &str = "No files uploaded";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub original_name: String,
    pub size: u64,
    pub path: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    pub file_count: usize,
    pub files: Vec<UploadedFile>,
}

/// Streams every `files` part to its destination under the upload root,
/// preserving the relative folder structure the client declared in the part
/// filename. Existing files at the same path are overwritten. Files written
/// before a failing part remain on disk.
pub async fn upload_files(
    Extension(storage): Extension<Arc<Storage>>,
    mut multipart: Multipart,
) -> Result<JsonResponse<UploadResponse>, ApiError> {
    let mut files = Vec::new();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::BadRequest(err.to_string()))?
    {
        if field.name() != Some(UPLOAD_FIELD_NAME) {
            debug!(field = field.name().unwrap_or(""), "skipping unknown field");
            continue;
        }
        let Some(declared) = field.file_name().map(str::to_string) else {
            continue;
        };
        let normalized = declared.trim().trim_start_matches(['/', '\\']).to_string();
        if normalized.is_empty() {
            continue;
        }

        let target = storage.prepare_destination(&normalized).await?;
        let mut file = File::create(&target)
            .await
            .map_err(|err| ApiError::Internal(err.to_string()))?;
        let mut size: u64 = 0;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|err| ApiError::BadRequest(err.to_string()))?
        {
            size += chunk.len() as u64;
            file.write_all(&chunk)
                .await
                .map_err(|err| ApiError::Internal(err.to_string()))?;
        }
        file.flush()
            .await
            .map_err(|err| ApiError::Internal(err.to_string()))?;

        info!(name = declared, size, "file stored");
        files.push(UploadedFile {
            original_name: declared,
            size,
            path: target.display().to_string(),
        });
    }

    if files.is_empty() {
        return Err(ApiError::BadRequest(NO_FILES_MESSAGE.into()));
    }

    info!(file_count = files.len(), "upload complete");
    Ok(JsonResponse(UploadResponse {
        message: UPLOAD_SUCCESS_MESSAGE.into(),
        file_count: files.len(),
        files,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body as AxumBody;
    use axum::extract::FromRequest;
    use axum::http::{Request, header};
    use std::sync::Arc;
    use tempfile::tempdir;

    const BOUNDARY: &str = "updrop-test-boundary";

    fn make_storage() -> (tempfile::TempDir, Arc<Storage>) {
        let temp = tempdir().expect("tempdir");
        let root = temp.path().join("uploads");
        std::fs::create_dir_all(&root).expect("create upload root");
        (temp, Arc::new(Storage::new(root)))
    }

    async fn multipart_from(parts: &[(&str, &str, &str)]) -> Multipart {
        let mut body = String::new();
        for (field, filename, content) in parts {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; \
                 filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n\
                 {content}\r\n"
            ));
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));

        let request = Request::builder()
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(AxumBody::from(body))
            .expect("build request");
        Multipart::from_request(request, &())
            .await
            .expect("multipart extractor")
    }

    #[tokio::test]
    async fn upload_writes_nested_files_and_reports_metadata() {
        let (_temp, storage) = make_storage();
        let multipart = multipart_from(&[
            ("files", "docs/readme.md", "hello"),
            ("files", "docs/sub/notes.txt", "abc"),
        ])
        .await;

        let JsonResponse(response) = upload_files(Extension(storage.clone()), multipart)
            .await
            .unwrap_or_else(|_| panic!("upload failed"));

        assert_eq!(response.message, UPLOAD_SUCCESS_MESSAGE);
        assert_eq!(response.file_count, 2);
        assert_eq!(response.files[0].original_name, "docs/readme.md");
        assert_eq!(response.files[0].size, 5);

        let stored = std::fs::read(storage.root_path().join("docs/readme.md")).expect("read");
        assert_eq!(stored, b"hello");
        let stored = std::fs::read(storage.root_path().join("docs/sub/notes.txt")).expect("read");
        assert_eq!(stored, b"abc");
    }

    #[tokio::test]
    async fn upload_without_file_parts_is_rejected() {
        let (_temp, storage) = make_storage();
        let multipart = multipart_from(&[]).await;

        let result = upload_files(Extension(storage.clone()), multipart).await;
        assert!(matches!(result, Err(ApiError::BadRequest(msg)) if msg == NO_FILES_MESSAGE));

        let entries: Vec<_> = std::fs::read_dir(storage.root_path())
            .expect("read root")
            .collect();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn upload_ignores_parts_under_other_field_names() {
        let (_temp, storage) = make_storage();
        let multipart = multipart_from(&[("attachment", "stray.txt", "nope")]).await;

        let result = upload_files(Extension(storage), multipart).await;
        assert!(matches!(result, Err(ApiError::BadRequest(msg)) if msg == NO_FILES_MESSAGE));
    }

    #[tokio::test]
    async fn upload_rejects_traversal_filename() {
        let (temp, storage) = make_storage();
        let multipart = multipart_from(&[("files", "../escape.txt", "data")]).await;

        let result = upload_files(Extension(storage), multipart).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
        assert!(!temp.path().join("escape.txt").exists());
    }

    #[tokio::test]
    async fn reupload_overwrites_and_reports_new_size() {
        let (_temp, storage) = make_storage();

        let multipart = multipart_from(&[("files", "file.txt", "first-content")]).await;
        upload_files(Extension(storage.clone()), multipart)
            .await
            .unwrap_or_else(|_| panic!("first upload failed"));

        let multipart = multipart_from(&[("files", "file.txt", "second")]).await;
        let JsonResponse(response) = upload_files(Extension(storage.clone()), multipart)
            .await
            .unwrap_or_else(|_| panic!("second upload failed"));

        assert_eq!(response.files[0].size, 6);
        let stored = std::fs::read(storage.root_path().join("file.txt")).expect("read");
        assert_eq!(stored, b"second");
    }
}
