//! Form value extraction from query strings, URL-encoded bodies and
//! multipart bodies.
//!
//! Works on the already-buffered body, so parsing never consumes what the
//! next stage reads.

use std::collections::BTreeMap;

use axum::http::{header, HeaderMap, Method};
use axum::body::Bytes;
use futures_util::stream;
use multer::Multipart;
use thiserror::Error;

/// Field name → values in arrival order.
pub type FormData = BTreeMap<String, Vec<String>>;

/// A body that claimed to be form data but could not be parsed.
#[derive(Debug, Error)]
pub enum FormError {
    #[error("multipart: {0}")]
    Multipart(#[from] multer::Error),

    #[error("multipart: non-file values exceed the {limit} byte memory budget")]
    TooLarge { limit: usize },

    #[error("multipart: value of field `{0}` is not valid UTF-8")]
    InvalidUtf8(String),

    #[error("urlencoded: invalid URL escape {escape:?}")]
    InvalidEscape { escape: String },

    #[error("urlencoded: invalid semicolon separator")]
    Semicolon,
}

/// How the request body is encoded, as far as form parsing cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEncoding {
    UrlEncoded,
    /// Carries the full Content-Type value; the boundary is parsed from it.
    Multipart(String),
    NotForm,
}

impl FormEncoding {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let Some(content_type) = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        else {
            return FormEncoding::NotForm;
        };

        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "application/x-www-form-urlencoded" => FormEncoding::UrlEncoded,
            "multipart/form-data" => FormEncoding::Multipart(content_type.to_string()),
            _ => FormEncoding::NotForm,
        }
    }
}

/// Values from a URL query string, plus the first malformed pair if any.
pub fn query_values(query: Option<&str>) -> (FormData, Option<FormError>) {
    match query {
        Some(q) => parse_urlencoded(q.as_bytes()),
        None => (FormData::new(), None),
    }
}

/// Parse `application/x-www-form-urlencoded` pairs.
///
/// Pairs with a bad `%` escape or a `;` separator are dropped; the first such
/// problem is returned next to the values that did parse.
pub fn parse_urlencoded(raw: &[u8]) -> (FormData, Option<FormError>) {
    let mut values = FormData::new();
    let mut first_error = None;

    for pair in raw.split(|&b| b == b'&') {
        if pair.is_empty() {
            continue;
        }
        if let Err(e) = check_pair(pair) {
            first_error.get_or_insert(e);
            continue;
        }
        if let Some((name, value)) = url::form_urlencoded::parse(pair).next() {
            values
                .entry(name.into_owned())
                .or_default()
                .push(value.into_owned());
        }
    }

    (values, first_error)
}

fn check_pair(pair: &[u8]) -> Result<(), FormError> {
    if pair.contains(&b';') {
        return Err(FormError::Semicolon);
    }
    let mut i = 0;
    while i < pair.len() {
        if pair[i] == b'%' {
            let valid = pair.len() > i + 2
                && pair[i + 1].is_ascii_hexdigit()
                && pair[i + 2].is_ascii_hexdigit();
            if !valid {
                let end = (i + 3).min(pair.len());
                return Err(FormError::InvalidEscape {
                    escape: String::from_utf8_lossy(&pair[i..end]).into_owned(),
                });
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    Ok(())
}

/// Parse a `multipart/form-data` body.
///
/// Text fields are collected; file parts are skipped without being held.
/// Text bytes beyond `max_memory` fail the parse.
pub async fn parse_multipart(
    content_type: &str,
    raw: Bytes,
    max_memory: usize,
) -> Result<FormData, FormError> {
    let boundary = multer::parse_boundary(content_type)?;
    let body = stream::once(async move { Ok::<Bytes, std::io::Error>(raw) });
    let mut multipart = Multipart::new(body, boundary);

    let mut values = FormData::new();
    let mut held = 0usize;

    while let Some(mut field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        if field.file_name().is_some_and(|f| !f.is_empty()) {
            continue;
        }

        let mut buf = Vec::new();
        while let Some(chunk) = field.chunk().await? {
            held += chunk.len();
            if held > max_memory {
                return Err(FormError::TooLarge { limit: max_memory });
            }
            buf.extend_from_slice(&chunk);
        }

        let text = String::from_utf8(buf).map_err(|_| FormError::InvalidUtf8(name.clone()))?;
        values.entry(name).or_default().push(text);
    }

    Ok(values)
}

/// Merge the body's form values into `form`.
///
/// URL-encoded bodies are read only for POST, PUT and PATCH and their values
/// go before existing (query) values; multipart values go after them. A body
/// that is not form-encoded leaves `form` untouched and is not an error.
/// Well-formed urlencoded pairs are merged even when others are rejected.
pub async fn merge_body_values(
    form: &mut FormData,
    method: &Method,
    headers: &HeaderMap,
    raw: Bytes,
    max_memory: usize,
) -> Result<(), FormError> {
    match FormEncoding::from_headers(headers) {
        FormEncoding::UrlEncoded => {
            if !matches!(*method, Method::POST | Method::PUT | Method::PATCH) {
                return Ok(());
            }
            let (parsed, error) = parse_urlencoded(&raw);
            for (name, mut body_values) in parsed {
                let existing = form.entry(name).or_default();
                body_values.append(existing);
                *existing = body_values;
            }
            error.map_or(Ok(()), Err)
        }
        FormEncoding::Multipart(content_type) => {
            let parsed = parse_multipart(&content_type, raw, max_memory).await?;
            for (name, mut values) in parsed {
                form.entry(name).or_default().append(&mut values);
            }
            Ok(())
        }
        FormEncoding::NotForm => Ok(()),
    }
}
