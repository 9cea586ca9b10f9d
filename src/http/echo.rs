//! Terminal handler: acknowledges every request with a fixed JSON body.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Serialize)]
struct Ack {
    msg: &'static str,
}

/// Reply `200 {"msg":"ok"}` regardless of the request.
pub async fn echo_handler() -> Response {
    acknowledge(&Ack { msg: "ok" })
}

fn acknowledge<T: Serialize>(payload: &T) -> Response {
    match serde_json::to_vec(payload) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}
