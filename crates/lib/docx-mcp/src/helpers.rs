use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use docx_core::control::ControlError;
use rmcp::ErrorData;
use rmcp::model::{CallToolResult, Content, ErrorCode};
use serde::Serialize;

pub fn mcp_err(code: ErrorCode, message: impl Into<Cow<'static, str>>) -> ErrorData {
    ErrorData {
        code,
        message: message.into(),
        data: None,
    }
}

/// Maps control-plane failures onto MCP error codes.
pub fn map_err(err: ControlError) -> ErrorData {
    let code = if err.is_not_found() {
        ErrorCode::RESOURCE_NOT_FOUND
    } else if err.is_client_error() {
        ErrorCode::INVALID_PARAMS
    } else if matches!(err, ControlError::Conflict(_)) {
        ErrorCode::INVALID_REQUEST
    } else {
        ErrorCode::INTERNAL_ERROR
    };
    mcp_err(code, err.to_string())
}

pub fn invalid_params(message: impl Into<Cow<'static, str>>) -> ErrorData {
    mcp_err(ErrorCode::INVALID_PARAMS, message)
}

pub fn json_result<T: Serialize>(value: T) -> Result<CallToolResult, ErrorData> {
    Ok(CallToolResult::success(vec![Content::json(value)?]))
}

pub fn text_result(text: impl Into<String>) -> CallToolResult {
    CallToolResult::success(vec![Content::text(text.into())])
}

/// Parses an enum-valued parameter such as an alignment or list type.
pub fn parse<T>(value: &str) -> Result<T, ErrorData>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.parse().map_err(|err: T::Err| invalid_params(err.to_string()))
}

pub fn parse_opt<T>(value: Option<&str>) -> Result<Option<T>, ErrorData>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(parse)
        .transpose()
}

/// Decodes a base64 payload. A `data:` URI prefix is accepted.
pub fn decode_base64(field: &str, value: &str) -> Result<Vec<u8>, ErrorData> {
    let value = value.trim();
    let payload = match value.split_once(";base64,") {
        Some((prefix, payload)) if prefix.starts_with("data:") => payload,
        _ => value,
    };
    STANDARD
        .decode(payload)
        .map_err(|err| invalid_params(format!("{field} is not valid base64: {err}")))
}

pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use docx_core::document::Alignment;
    use docx_core::editor::DocumentError;
    use docx_store::models::DocumentStatus;

    use super::*;

    #[test]
    fn control_errors_map_to_mcp_codes() {
        let not_found = map_err(ControlError::NotFound("Document not found: x".to_string()));
        assert_eq!(not_found.code, ErrorCode::RESOURCE_NOT_FOUND);

        let out_of_range = map_err(ControlError::Document(DocumentError::IndexOutOfRange {
            what: "Paragraph",
            index: 4,
            len: 1,
        }));
        assert_eq!(out_of_range.code, ErrorCode::INVALID_PARAMS);

        let conflict = map_err(ControlError::Conflict("already accepted".to_string()));
        assert_eq!(conflict.code, ErrorCode::INVALID_REQUEST);
    }

    #[test]
    fn base64_accepts_data_uris() {
        let encoded = encode_base64(b"hello");
        assert_eq!(decode_base64("content", &encoded).unwrap(), b"hello");
        let uri = format!("data:application/octet-stream;base64,{encoded}");
        assert_eq!(decode_base64("content", &uri).unwrap(), b"hello");
        let err = decode_base64("content", "%%%").unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
    }

    #[test]
    fn enum_parameters_parse() {
        assert_eq!(parse::<Alignment>("Center").unwrap(), Alignment::Center);
        assert_eq!(parse_opt::<Alignment>(Some("  ")).unwrap(), None);
        assert!(parse::<Alignment>("sideways").is_err());
        assert_eq!(parse::<DocumentStatus>("Pending_Review").unwrap(), DocumentStatus::PendingReview);
    }
}
