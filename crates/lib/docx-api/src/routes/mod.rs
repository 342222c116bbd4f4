//! Route groups under `/api/v1`.

mod batch;
mod documents;
mod exports;
mod formatting;
mod layout;
mod media;
mod review;
mod tables;
mod templates;
mod text;
mod versions;

use axum::Router;
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use surrealdb::Connection;

use crate::{ApiError, AppState};

pub(crate) fn api_routes<C>() -> Router<AppState<C>>
where
    C: Connection + Send + Sync + 'static,
{
    Router::new()
        .merge(documents::routes())
        .merge(batch::routes())
        .merge(templates::routes())
        .merge(text::routes())
        .merge(tables::routes())
        .merge(formatting::routes())
        .merge(media::routes())
        .merge(layout::routes())
        .merge(review::routes())
        .merge(versions::routes())
        .merge(exports::routes())
}

/// A binary response with a content type and a download file name.
fn attachment(bytes: Vec<u8>, content_type: &str, file_name: &str) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", file_name.replace('"', ""));
    let mut response = bytes.into_response();
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(content_type) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    response
}

/// File name for a download, built from a title.
fn file_stem(title: &str) -> String {
    let stem: String = title
        .chars()
        .map(|ch| if ch.is_alphanumeric() || ch == '-' || ch == '_' { ch } else { '_' })
        .collect();
    let stem = stem.trim_matches('_');
    if stem.is_empty() {
        "document".to_string()
    } else {
        stem.to_string()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn decode_base64(field: &str, value: &str) -> Result<Vec<u8>, ApiError> {
    let value = value.trim();
    let payload = match value.split_once(";base64,") {
        Some((prefix, payload)) if prefix.starts_with("data:") => payload,
        _ => value,
    };
    STANDARD
        .decode(payload)
        .map_err(|err| ApiError::bad_request(format!("{field} is not valid base64: {err}")))
}

fn decode_optional(field: &str, value: Option<&str>) -> Result<Option<Vec<u8>>, ApiError> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| decode_base64(field, value))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_stems_are_header_safe() {
        assert_eq!(file_stem("Q3 Report: Final"), "Q3_Report__Final");
        assert_eq!(file_stem("\"\""), "document");
    }

    #[test]
    fn base64_accepts_data_uris() {
        let bytes = decode_base64("image", "data:image/png;base64,iVBORw==").expect("valid");
        assert_eq!(bytes, vec![0x89, 0x50, 0x4e, 0x47]);
        assert!(decode_optional("image", Some("  ")).expect("blank").is_none());
        assert!(decode_base64("image", "%%%").is_err());
    }
}
