// Response envelope: every body leaves the service as
// `{status, code, data, messages, date}`

use axum::{
    body::Body,
    http::{header, HeaderValue, Request, Response, StatusCode},
    middleware::Next,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use http_body_util::{BodyExt, Limited};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

// Bare bodies are short rejection texts; anything longer is not worth echoing
const MAX_BARE_BODY_BYTES: usize = 4 * 1024;

/// Serialized body of every response
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub status: String,
    pub code: u16,
    pub data: Value,
    pub messages: Vec<String>,
    pub date: String,
}

impl Envelope {
    pub fn new(status_code: StatusCode, data: Value, messages: Vec<String>) -> Self {
        Self {
            status: status_label(status_code),
            code: status_code.as_u16(),
            data,
            messages,
            date: Utc::now().to_rfc3339(),
        }
    }
}

/// `404 Not Found` -> `NOT_FOUND`
fn status_label(status_code: StatusCode) -> String {
    status_code
        .canonical_reason()
        .unwrap_or("UNKNOWN STATUS")
        .to_uppercase()
        .replace(' ', "_")
}

/// Marks a response whose body is already an envelope
#[derive(Debug, Clone, Copy)]
struct Enveloped;

/// Builder handlers return; renders straight into an envelope
#[derive(Debug, Clone)]
pub struct HandlerResponse {
    pub status_code: StatusCode,
    pub data: Value,
    pub messages: Vec<String>,
}

impl HandlerResponse {
    pub fn new(status_code: StatusCode) -> Self {
        Self {
            status_code,
            data: Value::Null,
            messages: Vec::new(),
        }
    }

    pub fn data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// Serializes a typed payload into `data`
    pub fn payload<T: Serialize>(self, payload: &T) -> Self {
        match serde_json::to_value(payload) {
            Ok(data) => self.data(data),
            Err(e) => {
                error!("Failed to serialize response payload: {}", e);
                self
            }
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.messages.push(message.into());
        self
    }
}

impl IntoResponse for HandlerResponse {
    fn into_response(self) -> axum::response::Response {
        let envelope: Envelope = Envelope::new(self.status_code, self.data, self.messages);
        log_envelope(&envelope);

        let mut response: Response<Body> = (self.status_code, Json(envelope)).into_response();
        response.extensions_mut().insert(Enveloped);
        response
    }
}

fn log_envelope(envelope: &Envelope) {
    match serde_json::to_string(envelope) {
        Ok(body) => debug!(code = envelope.code, %body, "Final response"),
        Err(e) => error!("Failed to render response for logging: {}", e),
    }
}

/// Wraps responses that did not come from a `HandlerResponse` (router
/// fallbacks, extractor rejections, layer errors). A plain-text body
/// becomes the single message.
pub async fn wrap_response(response: Response<Body>) -> Response<Body> {
    if response.extensions().get::<Enveloped>().is_some() {
        return response;
    }

    let (mut parts, body) = response.into_parts();

    let mut messages: Vec<String> = Vec::new();
    match Limited::new(body, MAX_BARE_BODY_BYTES).collect().await {
        Ok(collected) => {
            let text: String = String::from_utf8_lossy(&collected.to_bytes()).trim().to_owned();
            if !text.is_empty() {
                messages.push(text);
            }
        }
        Err(e) => debug!("Dropping unreadable response body: {}", e),
    }

    let envelope: Envelope = Envelope::new(parts.status, Value::Null, messages);
    log_envelope(&envelope);

    let body: Vec<u8> = match serde_json::to_vec(&envelope) {
        Ok(body) => body,
        Err(e) => {
            error!("Failed to serialize envelope: {}", e);
            b"{}".to_vec()
        }
    };

    parts.headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    // The body was replaced, so any inner length is stale
    parts.headers.remove(header::CONTENT_LENGTH);

    Response::from_parts(parts, Body::from(body))
}

/// Middleware applying `wrap_response` to everything the router returns
pub async fn response_wrapper(req: Request<Body>, next: Next) -> Response<Body> {
    let response: Response<Body> = next.run(req).await;
    wrap_response(response).await
}
