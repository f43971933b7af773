//! Wire types for the job server protocol.

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{JobError, JobResult};

/// A named binary attachment of the multipart request.
#[derive(Debug, Clone)]
pub struct FilePart {
    /// Multipart field name (fixed per variant, e.g. `model_img_buffer`).
    pub name: &'static str,
    /// Filename declared for the part.
    pub filename: &'static str,
    /// Declared MIME type.
    pub content_type: &'static str,
    /// Encoded image bytes. May be empty where the variant permits an
    /// absent image (the try-on mask slot).
    pub bytes: Vec<u8>,
}

/// The encoded transmission payload for one job request.
#[derive(Debug, Clone, Default)]
pub struct Payload {
    /// Binary attachments, in the order they are sent.
    pub parts: Vec<FilePart>,
    /// JSON object carried in the `generation_data` form field, when the
    /// variant has one.
    pub metadata: Option<Value>,
}

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a PNG attachment.
    pub fn attach(&mut self, name: &'static str, filename: &'static str, bytes: Vec<u8>) {
        self.parts.push(FilePart {
            name,
            filename,
            content_type: "image/png",
            bytes,
        });
    }

    /// Set the `generation_data` metadata object.
    pub fn set_metadata(&mut self, metadata: Value) {
        self.metadata = Some(metadata);
    }

    /// Build the multipart form for one transmission attempt.
    ///
    /// Forms are consumed on send, so each attempt rebuilds one from the
    /// cached payload bytes.
    pub fn to_form(&self) -> JobResult<Form> {
        let mut form = Form::new();
        for part in &self.parts {
            let file = Part::bytes(part.bytes.clone())
                .file_name(part.filename)
                .mime_str(part.content_type)?;
            form = form.part(part.name, file);
        }
        if let Some(metadata) = &self.metadata {
            form = form.text("generation_data", metadata.to_string());
        }
        Ok(form)
    }
}

/// Body of a successful job response.
#[derive(Debug, Clone, Deserialize)]
pub struct SuccessBody {
    /// Base64-encoded result image bytes.
    pub result: Option<String>,
}

/// Structured error information extracted from a failure response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorEnvelope {
    /// Server-provided error message.
    pub error: Option<String>,
    /// Server-side stack trace, when the server includes one.
    pub stack_trace: Option<String>,
}

impl ErrorEnvelope {
    /// Extract an envelope from a failure body.
    ///
    /// Non-JSON bodies never fail classification: the raw text becomes the
    /// error message.
    pub fn from_body(body: &[u8]) -> Self {
        match serde_json::from_slice::<ErrorEnvelope>(body) {
            Ok(envelope) => envelope,
            Err(_) => {
                let text = String::from_utf8_lossy(body).trim().to_string();
                Self {
                    error: (!text.is_empty()).then_some(text),
                    stack_trace: None,
                }
            }
        }
    }

    pub fn message(&self) -> &str {
        self.error.as_deref().unwrap_or("unknown error")
    }
}

impl std::fmt::Display for ErrorEnvelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// Classify a raw response as success or failure.
///
/// Status 200 parses the body as a [`SuccessBody`]; anything else yields a
/// [`JobError::Server`] carrying whatever error information the body holds.
pub fn validate_response(status: u16, body: &[u8]) -> JobResult<SuccessBody> {
    if status != 200 {
        return Err(JobError::Server {
            status,
            envelope: ErrorEnvelope::from_body(body),
        });
    }
    serde_json::from_slice(body)
        .map_err(|e| JobError::decode(format!("success body is not valid JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_from_json_body() {
        let body = br#"{"error": "inference failed", "stack_trace": "Traceback..."}"#;
        let envelope = ErrorEnvelope::from_body(body);
        assert_eq!(envelope.error.as_deref(), Some("inference failed"));
        assert_eq!(envelope.stack_trace.as_deref(), Some("Traceback..."));
    }

    #[test]
    fn test_envelope_from_partial_json_body() {
        let envelope = ErrorEnvelope::from_body(br#"{"error": "boom"}"#);
        assert_eq!(envelope.error.as_deref(), Some("boom"));
        assert!(envelope.stack_trace.is_none());
    }

    #[test]
    fn test_envelope_from_raw_text_body() {
        let envelope = ErrorEnvelope::from_body(b"502 Bad Gateway");
        assert_eq!(envelope.error.as_deref(), Some("502 Bad Gateway"));
        assert!(envelope.stack_trace.is_none());
    }

    #[test]
    fn test_envelope_from_empty_body() {
        let envelope = ErrorEnvelope::from_body(b"");
        assert!(envelope.error.is_none());
        assert_eq!(envelope.message(), "unknown error");
    }

    #[test]
    fn test_validate_success() {
        let body = br#"{"result": "aGVsbG8="}"#;
        let success = validate_response(200, body).unwrap();
        assert_eq!(success.result.as_deref(), Some("aGVsbG8="));
    }

    #[test]
    fn test_validate_non_200_is_server_error() {
        let err = validate_response(500, br#"{"error": "boom"}"#).unwrap_err();
        match err {
            JobError::Server { status, envelope } => {
                assert_eq!(status, 500);
                assert_eq!(envelope.error.as_deref(), Some("boom"));
            }
            other => panic!("expected server error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_malformed_success_body_is_decode_error() {
        let err = validate_response(200, b"<html>gateway</html>").unwrap_err();
        assert!(matches!(err, JobError::Decode(_)));
        assert!(err.is_retryable());
    }
}
