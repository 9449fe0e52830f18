//! Uploaded file listing handler.

use axum::extract::Extension;
use axum::response::Json as JsonResponse;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::storage::{Storage, StorageError, StoredFile};

pub const LISTING_ERROR_MESSAGE: &str = "Error reading uploads directory";

#[derive(Serialize)]
pub struct ListResponse {
    pub files: Vec<StoredFile>,
}

/// Walks the upload root and returns every stored file with its size and
/// modification time. A missing upload root is an empty listing, not an
/// error; any read failure during the walk surfaces as a 500 with no
/// partial list.
pub async fn list_uploads(
    Extension(storage): Extension<Arc<Storage>>,
) -> Result<JsonResponse<ListResponse>, ApiError> {
    let files = storage.walk_files().await.map_err(|err| {
        if let StorageError::Io(err) = &err {
            warn!(error = %err, "uploads walk failed");
        }
        ApiError::Internal(LISTING_ERROR_MESSAGE.into())
    })?;

    info!(count = files.len(), "list uploads");
    Ok(JsonResponse(ListResponse { files }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[tokio::test]
    async fn listing_missing_root_is_empty() {
        let temp = tempdir().expect("tempdir");
        let storage = Arc::new(Storage::new(temp.path().join("uploads")));

        let JsonResponse(response) = list_uploads(Extension(storage))
            .await
            .unwrap_or_else(|_| panic!("list failed"));
        assert!(response.files.is_empty());
    }

    #[tokio::test]
    async fn listing_reports_stored_files() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path().join("uploads");
        std::fs::create_dir_all(root.join("nested")).expect("dirs");
        std::fs::write(root.join("a.txt"), b"1234").expect("write");
        std::fs::write(root.join("nested/b.txt"), b"56").expect("write");
        let storage = Arc::new(Storage::new(root));

        let JsonResponse(mut response) = list_uploads(Extension(storage))
            .await
            .unwrap_or_else(|_| panic!("list failed"));
        response.files.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(response.files.len(), 2);
        assert_eq!(response.files[0].name, "a.txt");
        assert_eq!(response.files[0].size, 4);
        assert_eq!(response.files[1].name, "nested/b.txt");
        assert_eq!(response.files[1].size, 2);
        assert!(response.files.iter().all(|file| file.modified.ends_with('Z')));
    }
}
