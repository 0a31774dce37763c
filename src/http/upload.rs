//! Product image upload.

use axum::extract::{Multipart, State};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use crate::auth::AdminUser;
use crate::error::{AppError, Result};
use crate::state::AppState;

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
/// Request body cap; leaves room for multipart framing around a full-size image.
pub const BODY_LIMIT: usize = MAX_IMAGE_BYTES + 64 * 1024;

const ALLOWED_TYPES: [&str; 5] = ["image/jpeg", "image/jpg", "image/png", "image/webp", "image/gif"];

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImage {
    pub success: bool,
    /// Public path, e.g. `/uploads/product_1700000000000.png`
    pub image_url: String,
    pub filename: String,
}

#[derive(ToSchema)]
#[allow(dead_code)]
pub struct ImageUpload {
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
}

/// Extension taken from the client file name, falling back to `jpg`.
fn extension(file_name: Option<&str>) -> String {
    file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "jpg".to_string())
}

#[utoipa::path(
    post,
    path = "/api/upload/image",
    tag = "Admin",
    request_body(content = ImageUpload, content_type = "multipart/form-data"),
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    responses(
        (status = 200, description = "Image stored", body = UploadedImage),
        (status = 400, description = "Missing, oversized or unsupported file", body = crate::error::ErrorResponse),
        (status = 403, description = "Not an administrator", body = crate::error::ErrorResponse)
    )
)]
pub async fn upload_image(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    mut multipart: Multipart,
) -> Result<Json<UploadedImage>> {
    let bad_form = |e: axum::extract::multipart::MultipartError| AppError::BadRequest(e.body_text());

    while let Some(field) = multipart.next_field().await.map_err(bad_form)? {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_ascii_lowercase();
        if !ALLOWED_TYPES.contains(&content_type.as_str()) {
            return Err(AppError::BadRequest(
                "Invalid file type. Only JPEG, PNG, WebP, and GIF are allowed.".to_string(),
            ));
        }
        let ext = extension(field.file_name());
        let bytes = field.bytes().await.map_err(bad_form)?;
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(AppError::BadRequest("File too large. Maximum size is 5MB.".to_string()));
        }

        let filename = format!("product_{}.{ext}", Utc::now().timestamp_millis());
        tokio::fs::create_dir_all(&state.config.upload_dir).await?;
        tokio::fs::write(state.config.upload_dir.join(&filename), &bytes).await?;
        info!(%filename, size = bytes.len(), admin = %admin.email, "image uploaded");

        return Ok(Json(UploadedImage { success: true, image_url: format!("/uploads/{filename}"), filename }));
    }

    Err(AppError::BadRequest("No file uploaded".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension() {
        assert_eq!(extension(Some("duck.PNG")), "png");
        assert_eq!(extension(Some("archive.tar.gz")), "gz");
        assert_eq!(extension(Some("noext")), "jpg");
        assert_eq!(extension(Some("evil./../x")), "jpg");
        assert_eq!(extension(None), "jpg");
    }
}
