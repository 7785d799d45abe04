//! Response classification and decoding.
//!
//! # Design
//! Every received response goes through [`classify`] exactly once. Branches
//! are tried in a fixed order:
//! 1. tabular content types (CSV, Excel) are returned as raw text;
//! 2. a JSON content type with either `Content-Length: 0` on a 2xx status or
//!    a 204 status is an empty success;
//! 3. everything else is parsed as JSON, and a top-level `error` object is
//!    turned into a `ServiceError`.
//!
//! The outcome depends only on the content type, status, content length and
//! body, so the same response always lands in the same branch. A 204 without
//! a JSON content type is parsed like any other body and fails as a format
//! error.

use serde_json::Value;

use crate::error::ServiceError;
use crate::http::HttpResponse;

const TABULAR_CONTENT_TYPES: &[&str] = &[
    "text/csv",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
];

const JSON_CONTENT_TYPE: &str = "application/json";

const STATUS_NO_CONTENT: u16 = 204;

/// Message carried by format errors.
pub const FORMAT_ERROR_MESSAGE: &str = "The server returned a response in an unexpected format";

/// Raw text of a tabular response, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextResponse {
    status: u16,
    content_type: String,
    text: String,
}

impl TextResponse {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// Successful classification outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum Classified {
    Tabular(TextResponse),
    Empty,
    Data(Value),
}

/// Which branch handled a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    Tabular,
    Empty,
    Structured,
}

impl Branch {
    pub fn of(response: &HttpResponse) -> Branch {
        let content_type = response
            .content_type()
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if TABULAR_CONTENT_TYPES.iter().any(|t| content_type.starts_with(t)) {
            return Branch::Tabular;
        }
        let empty_body = response.content_length() == Some(0) && response.is_success();
        if content_type.contains(JSON_CONTENT_TYPE)
            && (empty_body || response.status == STATUS_NO_CONTENT)
        {
            return Branch::Empty;
        }
        Branch::Structured
    }
}

/// Decide how to interpret `response` and decode its body accordingly.
pub fn classify(response: &HttpResponse) -> Result<Classified, ServiceError> {
    let branch = Branch::of(response);
    tracing::debug!(status = response.status, ?branch, "classifying response");
    match branch {
        Branch::Tabular => {
            let text = response
                .text()
                .map_err(|e| ServiceError::format(FORMAT_ERROR_MESSAGE, e))?;
            Ok(Classified::Tabular(TextResponse {
                status: response.status,
                content_type: response.content_type().unwrap_or_default().to_string(),
                text: text.to_string(),
            }))
        }
        Branch::Empty => Ok(Classified::Empty),
        Branch::Structured => decode_structured(response).map(Classified::Data),
    }
}

fn decode_structured(response: &HttpResponse) -> Result<Value, ServiceError> {
    let text = response
        .text()
        .map_err(|e| ServiceError::format(FORMAT_ERROR_MESSAGE, e))?;
    let value: Value =
        serde_json::from_str(text).map_err(|e| ServiceError::format(FORMAT_ERROR_MESSAGE, e))?;
    match value.get("error") {
        Some(error) if error.is_object() => Err(ServiceError::from_envelope(error)),
        _ => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(content_type: Option<&str>, status: u16, length: Option<&str>, body: &[u8]) -> HttpResponse {
        let mut headers = Vec::new();
        if let Some(ct) = content_type {
            headers.push(("content-type".to_string(), ct.to_string()));
        }
        if let Some(len) = length {
            headers.push(("content-length".to_string(), len.to_string()));
        }
        HttpResponse {
            status,
            headers,
            body: body.to_vec(),
        }
    }

    #[test]
    fn no_content_is_empty_success() {
        let resp = response(Some("application/json"), 204, Some("0"), b"");
        assert_eq!(classify(&resp).unwrap(), Classified::Empty);
    }

    #[test]
    fn zero_length_2xx_is_empty_success() {
        let resp = response(Some("application/json; charset=utf-8"), 200, Some("0"), b"");
        assert_eq!(Branch::of(&resp), Branch::Empty);
    }

    #[test]
    fn zero_length_error_status_is_parsed() {
        let resp = response(Some("application/json"), 500, Some("0"), b"");
        let err = classify(&resp).unwrap_err();
        assert!(err.is_format_error());
    }

    #[test]
    fn no_content_without_json_type_is_a_format_error() {
        let resp = response(None, 204, None, b"");
        assert_eq!(Branch::of(&resp), Branch::Structured);
        assert!(classify(&resp).unwrap_err().is_format_error());
    }

    #[test]
    fn error_envelope_becomes_service_error() {
        let body = br#"{"error":{"message":"bad","code":"X1","target":"field","details":"d"}}"#;
        let resp = response(Some("application/json"), 200, None, body);
        let err = classify(&resp).unwrap_err();
        assert_eq!(
            err,
            ServiceError {
                message: "bad".into(),
                code: "X1".into(),
                target: Some("field".into()),
                details: json!("d"),
            }
        );
    }

    #[test]
    fn non_object_error_field_is_data() {
        let resp = response(Some("application/json"), 200, None, br#"{"error":null,"value":1}"#);
        assert_eq!(classify(&resp).unwrap(), Classified::Data(json!({"error": null, "value": 1})));
    }

    #[test]
    fn csv_is_returned_verbatim() {
        let resp = response(Some("text/csv"), 200, None, b"a,b\n1,2");
        match classify(&resp).unwrap() {
            Classified::Tabular(text) => {
                assert_eq!(text.text(), "a,b\n1,2");
                assert_eq!(text.status(), 200);
                assert_eq!(text.content_type(), "text/csv");
            }
            other => panic!("expected tabular, got {other:?}"),
        }
    }

    #[test]
    fn excel_types_are_tabular() {
        for ct in [
            "application/vnd.ms-excel",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            "TEXT/CSV; charset=utf-8",
        ] {
            assert_eq!(Branch::of(&response(Some(ct), 200, None, b"")), Branch::Tabular, "{ct}");
        }
    }

    #[test]
    fn unreadable_tabular_body_is_a_format_error() {
        let resp = response(Some("text/csv"), 200, None, &[0xff, 0xfe]);
        let err = classify(&resp).unwrap_err();
        assert!(err.is_format_error());
        assert!(err.details.as_str().unwrap().contains("utf-8"));
    }

    #[test]
    fn malformed_json_is_a_format_error() {
        let resp = response(Some("application/json"), 200, None, b"{not json");
        let err = classify(&resp).unwrap_err();
        assert_eq!(err.code, "FormatException");
        assert_eq!(err.message, FORMAT_ERROR_MESSAGE);
        assert!(err.details.is_string());
    }

    #[test]
    fn unknown_content_type_falls_through_to_json() {
        let resp = response(Some("text/plain"), 200, None, br#""Pong""#);
        assert_eq!(classify(&resp).unwrap(), Classified::Data(json!("Pong")));
    }

    #[test]
    fn classification_is_repeatable() {
        let resp = response(Some("application/json"), 200, None, br#"{"id":5}"#);
        assert_eq!(classify(&resp).unwrap(), classify(&resp).unwrap());
    }
}
