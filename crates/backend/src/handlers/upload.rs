use axum::{
    extract::Multipart,
    http::header,
    response::{IntoResponse, Response},
};

use crate::shared::error::{AppError, AppResult};

/// Reads the first file field of a multipart form as UTF-8 text
pub async fn read_text_field(multipart: &mut Multipart) -> AppResult<String> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Invalid upload: {}", e)))?
    {
        if field.file_name().is_none() && field.name() != Some("file") {
            continue;
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::validation(format!("Invalid upload: {}", e)))?;
        let text = String::from_utf8(bytes.to_vec())
            .map_err(|_| AppError::validation("Uploaded file is not UTF-8 text"))?;
        // Excel saves CSV with a BOM
        return Ok(text.trim_start_matches('\u{feff}').to_string());
    }
    Err(AppError::validation("No file was uploaded"))
}

/// File download response with a `Content-Disposition: attachment` header
pub fn attachment(content_type: &'static str, filename: &str, body: impl Into<axum::body::Body>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename.replace('"', "")),
            ),
        ],
        body.into(),
    )
        .into_response()
}

pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
