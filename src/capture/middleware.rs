//! Capture middleware.
//!
//! # Responsibilities
//! - Buffer the request body and hand the next stage an identical one
//! - Extract form values and the JSON-or-text body from the buffer
//! - Read the status of the response the next stage produced
//! - Emit exactly one record per request to the configured sink

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use chrono::Local;
use percent_encoding::percent_decode_str;

use crate::capture::form::{self, FormData, FormError};
use crate::capture::record::{LoggedBody, RequestLog};
use crate::capture::sink::LogSink;
use crate::config::CaptureConfig;

/// State shared by every invocation of the capture middleware.
#[derive(Clone)]
pub struct CaptureState {
    sink: Arc<dyn LogSink>,
    config: CaptureConfig,
}

impl CaptureState {
    pub fn new(sink: Arc<dyn LogSink>, config: CaptureConfig) -> Self {
        Self { sink, config }
    }
}

/// Log every request passing through, leaving request and response as they were.
pub async fn capture_requests(
    State(state): State<CaptureState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let started = Local::now();
    let (parts, body) = request.into_parts();
    let path = decoded_path(parts.uri.path());

    let limit = state.config.max_body_bytes.unwrap_or(usize::MAX);
    let raw = match axum::body::to_bytes(body, limit).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(
                method = %parts.method,
                path = %path,
                error = %e,
                "Failed to read request body"
            );
            Bytes::new()
        }
    };

    let mut form_data = FormData::new();
    if state.config.include_query {
        let (query, error) = form::query_values(parts.uri.query());
        form_data = query;
        if let Some(e) = error {
            warn_form_error(&parts.method, &path, &e);
        }
    }
    if let Err(e) = form::merge_body_values(
        &mut form_data,
        &parts.method,
        &parts.headers,
        raw.clone(),
        state.config.max_memory_bytes,
    )
    .await
    {
        warn_form_error(&parts.method, &path, &e);
    }

    let body = LoggedBody::decode(&raw);
    let method = parts.method.clone();
    let headers = parts.headers.clone();

    let response = next.run(Request::from_parts(parts, Body::from(raw))).await;

    let record = RequestLog::new(
        started,
        &method,
        &path,
        &headers,
        body,
        form_data,
        response.status(),
    );
    emit(state.sink.as_ref(), &record);

    response
}

/// `/a%20b` → `/a b`. Invalid UTF-8 after decoding is replaced lossily.
fn decoded_path(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

fn warn_form_error(method: &axum::http::Method, path: &str, error: &FormError) {
    tracing::warn!(method = %method, path = %path, error = %error, "Form parse error");
}

fn emit(sink: &dyn LogSink, record: &RequestLog) {
    match record.render() {
        Ok(rendered) => sink.write_record(&rendered),
        Err(e) => {
            tracing::error!(path = %record.path, error = %e, "Failed to render request record");
            sink.write_error(&format!("Error serializing request log: {}", e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::sink::MemorySink;
    use axum::{
        http::{header, Method, StatusCode},
        routing::any,
        Router,
    };
    use serde_json::json;
    use tower::ServiceExt;

    fn app(sink: &MemorySink, config: CaptureConfig) -> Router {
        let state = CaptureState::new(Arc::new(sink.clone()), config);
        Router::new()
            .route("/echo-body", any(|body: Bytes| async move { body }))
            .route("/teapot", any(|| async { StatusCode::IM_A_TEAPOT }))
            .layer(axum::middleware::from_fn_with_state(state, capture_requests))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Bytes) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body)
    }

    #[tokio::test]
    async fn test_next_stage_reads_identical_body() {
        let sink = MemorySink::new();
        let payload = "x=1&y=2&blob=%00%ff";
        let request = Request::builder()
            .method(Method::POST)
            .uri("/echo-body")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(payload))
            .unwrap();

        let (status, body) = send(app(&sink, CaptureConfig::default()), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Bytes::from(payload));
        let record = &sink.json_records()[0];
        assert_eq!(record["body"], json!(payload));
        assert_eq!(record["form_data"]["x"], json!(["1"]));
    }

    #[tokio::test]
    async fn test_records_status_written_by_handler() {
        let sink = MemorySink::new();
        let request = Request::builder()
            .uri("/teapot")
            .body(Body::empty())
            .unwrap();

        let (status, _) = send(app(&sink, CaptureConfig::default()), request).await;

        assert_eq!(status, StatusCode::IM_A_TEAPOT);
        assert_eq!(sink.json_records()[0]["status"], json!(418));
    }

    #[tokio::test]
    async fn test_unmatched_route_is_still_recorded() {
        let sink = MemorySink::new();
        let request = Request::builder()
            .uri("/missing?debug=1")
            .body(Body::empty())
            .unwrap();

        let (status, _) = send(app(&sink, CaptureConfig::default()), request).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        let record = &sink.json_records()[0];
        assert_eq!(record["status"], json!(404));
        assert_eq!(record["path"], json!("/missing"));
        assert_eq!(record["form_data"], json!({"debug": ["1"]}));
    }

    #[tokio::test]
    async fn test_query_can_be_excluded() {
        let sink = MemorySink::new();
        let config = CaptureConfig {
            include_query: false,
            ..CaptureConfig::default()
        };
        let request = Request::builder()
            .uri("/teapot?debug=1")
            .body(Body::empty())
            .unwrap();

        send(app(&sink, config), request).await;

        let record = &sink.json_records()[0];
        assert!(record.get("form_data").is_none());
        assert_eq!(record["body"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_body_over_limit_is_logged_and_dropped() {
        let sink = MemorySink::new();
        let config = CaptureConfig {
            max_body_bytes: Some(4),
            ..CaptureConfig::default()
        };
        let request = Request::builder()
            .method(Method::POST)
            .uri("/echo-body")
            .body(Body::from("0123456789"))
            .unwrap();

        let (status, body) = send(app(&sink, config), request).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());
        assert_eq!(sink.json_records()[0]["body"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_path_is_logged_decoded() {
        let sink = MemorySink::new();
        let request = Request::builder()
            .uri("/a%20b/c%2Fd?q=%20")
            .body(Body::empty())
            .unwrap();

        send(app(&sink, CaptureConfig::default()), request).await;

        let record = &sink.json_records()[0];
        assert_eq!(record["path"], json!("/a b/c/d"));
        assert_eq!(record["form_data"]["q"], json!([" "]));
    }

    #[test]
    fn test_decoded_path_is_lossy_on_bad_utf8() {
        assert_eq!(decoded_path("/plain"), "/plain");
        assert_eq!(decoded_path("/x%FFy"), "/x\u{fffd}y");
    }
}
