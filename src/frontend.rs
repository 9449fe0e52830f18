//! Embedded front-end asset delivery.

use axum::body::Body as AxumBody;
use axum::http::{HeaderMap, HeaderValue, Request, header};
use axum::response::{IntoResponse, Response};
use rust_embed::RustEmbed;

use crate::error::ApiError;

#[derive(RustEmbed)]
#[folder = "public"]
pub struct FrontendAssets;

/// Fallback handler serving the bundled front-end. The root path maps to
/// `index.html`; anything not bundled is a 404.
pub async fn serve_frontend(req: Request<AxumBody>) -> Result<Response, ApiError> {
    let path = req.uri().path().trim_start_matches('/');
    let requested = if path.is_empty() { "index.html" } else { path };
    load_embedded_asset(requested)?.ok_or_else(|| ApiError::NotFound("not found".into()))
}

fn load_embedded_asset(path: &str) -> Result<Option<Response>, ApiError> {
    let Some(asset) = FrontendAssets::get(path) else {
        return Ok(None);
    };
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(mime.essence_str())
            .map_err(|_| ApiError::Internal("invalid mime type".into()))?,
    );
    Ok(Some(
        (headers, AxumBody::from(asset.data.into_owned())).into_response(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn root_serves_index() {
        let req = Request::builder()
            .uri("/")
            .body(AxumBody::empty())
            .expect("request");
        let response = serve_frontend(req).await.expect("serve index");
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");
        assert_eq!(content_type, "text/html");
    }

    #[tokio::test]
    async fn missing_asset_is_not_found() {
        let req = Request::builder()
            .uri("/no-such-asset.bin")
            .body(AxumBody::empty())
            .expect("request");
        let result = serve_frontend(req).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }
}
