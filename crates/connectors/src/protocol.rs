//! Companion-process wire protocol.
//!
//! Out-of-process connectors speak line-delimited JSON over stdio: one
//! request object per line in, one response object per line out. Only
//! the boundary types and the line codec live here; the companion
//! process itself is a separate concern.

use std::io::{BufRead, Write};

use relay_common::ConnectorError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors crossing the wire boundary.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("io failure: {0}")]
    Io(#[from] std::io::Error),
}

/// What the host is asking the companion to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    /// Liveness probe; no payload.
    Health,
    /// Execute one operation described by the payload.
    Exec,
    /// Drain and exit.
    Shutdown,
}

/// One request frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginRequest {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: RequestKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl PluginRequest {
    pub fn new(id: impl Into<String>, kind: RequestKind) -> Self {
        Self { id: id.into(), kind, payload: None }
    }

    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Ok,
    Error,
}

/// One response frame, correlated to its request by `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginResponse {
    pub id: String,
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl PluginResponse {
    pub fn ok(id: impl Into<String>, body: Value) -> Self {
        Self { id: id.into(), status: ResponseStatus::Ok, code: None, message: None, body: Some(body) }
    }

    pub fn error(id: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: ResponseStatus::Error,
            code: Some(code.into()),
            message: Some(message.into()),
            body: None,
        }
    }

    /// Fold an executed call into a response frame. Attempt counts and
    /// status codes travel inside the rendered message; the stable `code`
    /// field is what remote callers branch on.
    pub fn from_result(id: impl Into<String>, result: Result<Value, ConnectorError>) -> Self {
        match result {
            Ok(body) => Self::ok(id, body),
            Err(err) => {
                let code = match &err {
                    ConnectorError::Configuration { .. } => "configuration",
                    ConnectorError::Unauthorized { .. } => "unauthorized",
                    ConnectorError::Permanent { .. } => "permanent",
                    ConnectorError::RetriesExhausted { .. } => "retries_exhausted",
                };
                Self::error(id, code, err.to_string())
            }
        }
    }
}

/// Read the next request frame. Blank lines are skipped; `Ok(None)`
/// means the peer closed the stream.
pub fn read_request<R: BufRead>(reader: &mut R) -> Result<Option<PluginRequest>, ProtocolError> {
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        if line.trim().is_empty() {
            continue;
        }
        return Ok(Some(serde_json::from_str(line.trim())?));
    }
}

/// Write one response frame followed by a newline and flush, so the peer
/// never stalls on a buffered partial line.
pub fn write_response<W: Write>(
    writer: &mut W,
    response: &PluginResponse,
) -> Result<(), ProtocolError> {
    serde_json::to_writer(&mut *writer, response)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use relay_common::{Category, FailureDetail};
    use serde_json::json;

    use super::*;

    /// Request frames parse from their canonical wire shape.
    #[test]
    fn test_request_wire_shape() {
        let frame = r#"{"id":"r1","type":"exec","payload":{"connector":"http"}}"#;
        let request: PluginRequest = serde_json::from_str(frame).unwrap();
        assert_eq!(request.id, "r1");
        assert_eq!(request.kind, RequestKind::Exec);
        assert_eq!(request.payload, Some(json!({"connector": "http"})));

        let health: PluginRequest = serde_json::from_str(r#"{"id":"r2","type":"health"}"#).unwrap();
        assert_eq!(health.kind, RequestKind::Health);
        assert!(health.payload.is_none());
    }

    /// A success response carries the body and omits error fields.
    #[test]
    fn test_ok_response_omits_error_fields() {
        let response = PluginResponse::ok("r1", json!({"rows": 3}));
        let rendered = serde_json::to_value(&response).unwrap();
        assert_eq!(rendered, json!({"id": "r1", "status": "ok", "body": {"rows": 3}}));
    }

    /// Terminal errors map onto stable code strings.
    #[test]
    fn test_from_result_error_codes() {
        let exhausted = ConnectorError::RetriesExhausted {
            detail: FailureDetail::from_message("status 503").with_status(503),
            last_category: Category::Transient,
            attempts: 4,
        };
        let response = PluginResponse::from_result("r1", Err(exhausted));
        assert_eq!(response.status, ResponseStatus::Error);
        assert_eq!(response.code.as_deref(), Some("retries_exhausted"));
        let message = response.message.unwrap();
        assert!(message.contains("4"), "attempt count travels in the message: {message}");

        let config_err = ConnectorError::configuration("bad jitter");
        let response = PluginResponse::from_result("r2", Err(config_err));
        assert_eq!(response.code.as_deref(), Some("configuration"));
    }

    /// The line codec round-trips frames and skips blank lines.
    #[test]
    fn test_line_codec() {
        let input = "\n{\"id\":\"r1\",\"type\":\"health\"}\n{\"id\":\"r2\",\"type\":\"shutdown\"}\n";
        let mut reader = Cursor::new(input);

        let first = read_request(&mut reader).unwrap().unwrap();
        assert_eq!(first.kind, RequestKind::Health);
        let second = read_request(&mut reader).unwrap().unwrap();
        assert_eq!(second.kind, RequestKind::Shutdown);
        assert!(read_request(&mut reader).unwrap().is_none());

        let mut out = Vec::new();
        write_response(&mut out, &PluginResponse::ok("r1", json!(null))).unwrap();
        let written = String::from_utf8(out).unwrap();
        assert!(written.ends_with('\n'));
        let parsed: PluginResponse = serde_json::from_str(written.trim()).unwrap();
        assert_eq!(parsed.id, "r1");
    }

    /// Garbage on the wire is a malformed-frame error, not a panic.
    #[test]
    fn test_malformed_frame() {
        let mut reader = Cursor::new("not json\n");
        assert!(matches!(read_request(&mut reader), Err(ProtocolError::Malformed(_))));
    }
}
