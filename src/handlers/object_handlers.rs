//! HTTP handler serving stored objects back at their public URLs.
//! Streams payloads instead of buffering them and delegates storage concerns
//! to the blob service.

use crate::{errors::AppError, handlers::AppState, models::object::StoredObject};
use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::Response,
};
use tokio_util::io::ReaderStream;

/// GET `/{container}/{*key}` — stream an object with its recorded metadata.
///
/// This is the read side of the upload contract: the URL returned by a
/// successful upload resolves here. Containers are public-read, so there is
/// no caller authentication on this route.
pub async fn get_object(
    State(state): State<AppState>,
    Path((container, key)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let (meta, reader) = state.blobs.open_object(&container, &key).await?;
    let body = Body::from_stream(ReaderStream::new(reader));

    let mut response = Response::new(body);
    *response.status_mut() = StatusCode::OK;
    set_object_headers(response.headers_mut(), &meta);
    Ok(response)
}

fn set_object_headers(headers: &mut HeaderMap, meta: &StoredObject) {
    let content_type = meta
        .content_type
        .clone()
        .unwrap_or_else(|| "application/octet-stream".into());
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );

    headers.insert(
        header::CONTENT_LENGTH,
        HeaderValue::from_str(&meta.size_bytes.max(0).to_string())
            .unwrap_or_else(|_| HeaderValue::from_static("0")),
    );

    let quoted = format!("\"{}\"", meta.etag);
    if let Ok(value) = HeaderValue::from_str(&quoted) {
        headers.insert(header::ETAG, value);
    }

    headers.insert(
        header::LAST_MODIFIED,
        HeaderValue::from_str(&meta.created_at.to_rfc2822())
            .unwrap_or_else(|_| HeaderValue::from_static("")),
    );
}

#[cfg(test)]
mod tests {
    use crate::{
        handlers::AppState,
        routes::routes::routes,
        services::{blob_service::BlobService, memory_blob_store::MemoryBlobStore},
    };
    use axum_test::TestServer;
    use bytes::Bytes;
    use std::sync::Arc;

    fn server_with(store: MemoryBlobStore) -> TestServer {
        let state = AppState {
            blobs: Arc::new(store),
            container: "profilepics".into(),
        };
        TestServer::new(routes().with_state(state)).expect("test server")
    }

    #[tokio::test]
    async fn served_object_round_trips_bytes_and_content_type() {
        let store = MemoryBlobStore::new();
        let url = store
            .upload(
                "profilepics",
                "a.jpg",
                Bytes::from_static(b"jpeg bytes"),
                Some("image/jpeg"),
            )
            .await
            .expect("seed upload");
        let server = server_with(store);

        let path = url
            .strip_prefix("https://blobs.test")
            .expect("deterministic fake url")
            .to_string();
        let res = server.get(&path).await;

        res.assert_status_ok();
        assert_eq!(res.header("content-type"), "image/jpeg");
        assert_eq!(res.as_bytes().to_vec(), b"jpeg bytes".to_vec());
    }

    #[tokio::test]
    async fn missing_object_is_not_found() {
        let store = MemoryBlobStore::new();
        store
            .ensure_container("profilepics")
            .await
            .expect("container");
        let server = server_with(store);

        let res = server.get("/profilepics/missing.jpg").await;
        res.assert_status_not_found();
    }
}
