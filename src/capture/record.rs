//! The per-request log record and its rendering.

use std::collections::BTreeMap;

use axum::http::{HeaderMap, Method, StatusCode};
use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;

use crate::capture::form::FormData;

const INDENT: &[u8] = b"    ";

/// Logged request body: the decoded JSON value when the body is JSON,
/// the raw text otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LoggedBody {
    Json(Value),
    Text(String),
}

impl LoggedBody {
    /// Decode a raw body. An empty body is JSON `null`.
    pub fn decode(raw: &[u8]) -> Self {
        if raw.is_empty() {
            return LoggedBody::Json(Value::Null);
        }
        match serde_json::from_slice(raw) {
            Ok(value) => LoggedBody::Json(value),
            Err(_) => LoggedBody::Text(String::from_utf8_lossy(raw).into_owned()),
        }
    }
}

/// One structured record per request.
#[derive(Debug, Clone, Serialize)]
pub struct RequestLog {
    pub timestamp: DateTime<Local>,
    pub method: String,
    pub path: String,
    pub headers: BTreeMap<String, Vec<String>>,
    pub body: LoggedBody,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub form_data: FormData,
    pub status: u16,
}

impl RequestLog {
    pub fn new(
        timestamp: DateTime<Local>,
        method: &Method,
        path: &str,
        headers: &HeaderMap,
        body: LoggedBody,
        form_data: FormData,
        status: StatusCode,
    ) -> Self {
        Self {
            timestamp,
            method: method.as_str().to_string(),
            path: path.to_string(),
            headers: collect_headers(headers),
            body,
            form_data,
            status: status.as_u16(),
        }
    }

    /// Render as indented JSON (4 spaces).
    pub fn render(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut buf = Vec::with_capacity(256);
        let mut ser =
            serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(INDENT));
        self.serialize(&mut ser)?;
        Ok(buf)
    }
}

/// Group header values by canonical name, keeping arrival order per name.
pub fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, Vec<String>> {
    let mut out: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in headers {
        out.entry(canonical_header_name(name.as_str()))
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    out
}

/// `content-type` → `Content-Type`.
pub fn canonical_header_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = true;
    for c in name.chars() {
        if upper {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c.to_ascii_lowercase());
        }
        upper = c == '-';
    }
    out
}
