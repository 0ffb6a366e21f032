//! HTTP handler for the image upload endpoint.
//!
//! One request, one storage call: buffer the first file part, generate a
//! fresh object name, delegate to the blob service, answer with the public
//! URL. Every failure on that path collapses to an opaque empty 500.

use crate::{errors::UploadFailed, handlers::AppState};
use axum::{
    Json,
    extract::{
        State,
        multipart::{Multipart, MultipartRejection},
    },
};
use bytes::Bytes;
use serde::Serialize;
use uuid::Uuid;

/// Extension appended to every generated object name. The service accepts
/// image uploads; the client's filename and extension are ignored.
const OBJECT_EXTENSION: &str = "jpg";

/// JSON body returned on a successful upload.
#[derive(Debug, Serialize)]
pub struct UploadImageResponse {
    #[serde(rename = "fullPath")]
    pub full_path: String,
}

/// `POST /UploadImageAndGetUrl` (GET tolerated for historical routing).
///
/// Consumes the first file part of the multipart body, stores it under a
/// generated `<uuid>.jpg` key in the configured container, and returns
/// `{"fullPath": "<url>"}`. The declared content-type passes through
/// unmodified; the bytes are never sniffed or validated here.
pub async fn upload_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadImageResponse>, UploadFailed> {
    let mut multipart = multipart
        .map_err(|err| UploadFailed::invalid_content(format!("not a multipart body: {}", err)))?;

    let (content, content_type) = first_file_part(&mut multipart).await?;

    // Name uniqueness rests on the randomness source alone; no coordination
    // with the backend, so concurrent requests cannot collide.
    let object_name = format!("{}.{}", Uuid::new_v4(), OBJECT_EXTENSION);

    tracing::info!(
        container = %state.container,
        object = %object_name,
        size = content.len(),
        content_type = content_type.as_deref().unwrap_or("-"),
        "handling image upload"
    );

    let full_path = state
        .blobs
        .upload(
            &state.container,
            &object_name,
            content,
            content_type.as_deref(),
        )
        .await?;

    Ok(Json(UploadImageResponse { full_path }))
}

/// Buffer the first file part of the form, with its declared content-type.
/// Non-file fields are skipped; a form without any file part is a failure.
async fn first_file_part(
    multipart: &mut Multipart,
) -> Result<(Bytes, Option<String>), UploadFailed> {
    loop {
        let field = multipart.next_field().await.map_err(|err| {
            UploadFailed::invalid_content(format!("reading multipart field: {}", err))
        })?;
        let Some(field) = field else {
            return Err(UploadFailed::invalid_content("no file part in request"));
        };
        if field.file_name().is_none() {
            continue;
        }

        let content_type = field.content_type().map(|v| v.to_string());
        let content = field.bytes().await.map_err(|err| {
            UploadFailed::invalid_content(format!("buffering file part: {}", err))
        })?;
        return Ok((content, content_type));
    }
}
