//! Single-invocation entry point.
//!
//! Adapts an API-gateway proxy event into a request against the same actix
//! `App` the HTTP server runs, and the response back into a response event.
//! Both `headers` and `multiValueHeaders` are read; a name present in
//! `multiValueHeaders` takes all of its values from there. Every event gets a
//! response event back, including events that cannot be turned into a request.

use std::collections::HashMap;

use actix_web::body::MessageBody;
use actix_web::dev::Service;
use actix_web::http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use actix_web::http::{Method, StatusCode, Uri};
use actix_web::{test as actix_test, web, ResponseError};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::{build_app, AppError, AppState, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerlessEvent {
    pub http_method: String,
    pub path: String,
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
    #[serde(default)]
    pub multi_value_headers: Option<HashMap<String, Vec<String>>>,
    #[serde(default)]
    pub query_string_parameters: Option<HashMap<String, String>>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerlessResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub multi_value_headers: HashMap<String, Vec<String>>,
    pub body: String,
    pub is_base64_encoded: bool,
}

impl ServerlessEvent {
    /// Path plus the urlencoded query string.
    fn uri(&self) -> Result<Uri> {
        let uri = match &self.query_string_parameters {
            Some(params) if !params.is_empty() => {
                let query = serde_urlencoded::to_string(params)
                    .map_err(|e| AppError::ValidationError(format!("Invalid query string: {}", e)))?;
                format!("{}?{}", self.path, query)
            }
            _ => self.path.clone(),
        };

        Uri::try_from(uri.as_str())
            .map_err(|e| AppError::ValidationError(format!("Invalid request path: {}", e)))
    }

    fn payload(&self) -> Result<Vec<u8>> {
        match &self.body {
            None => Ok(Vec::new()),
            Some(body) if self.is_base64_encoded => BASE64
                .decode(body)
                .map_err(|e| AppError::ValidationError(format!("Invalid base64 body: {}", e))),
            Some(body) => Ok(body.clone().into_bytes()),
        }
    }

    /// Header pairs in the order they are applied to the request.
    fn header_pairs(&self) -> Vec<(&str, &str)> {
        let multi = self.multi_value_headers.as_ref();
        let mut pairs: Vec<(&str, &str)> = self
            .headers
            .iter()
            .flatten()
            .filter(|(name, _)| {
                !multi.map_or(false, |m| m.keys().any(|k| k.eq_ignore_ascii_case(name)))
            })
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .collect();

        for (name, values) in multi.into_iter().flatten() {
            pairs.extend(values.iter().map(|value| (name.as_str(), value.as_str())));
        }
        pairs
    }
}

/// Run one event through the application.
pub async fn handle_event(state: web::Data<AppState>, event: ServerlessEvent) -> ServerlessResponse {
    match dispatch(state, &event).await {
        Ok(resp) => resp,
        Err(err) => {
            warn!("Serverless event rejected: {}", err);
            error_event(&err)
        }
    }
}

async fn dispatch(state: web::Data<AppState>, event: &ServerlessEvent) -> Result<ServerlessResponse> {
    let method = Method::from_bytes(event.http_method.as_bytes())
        .map_err(|_| AppError::ValidationError(format!("Invalid HTTP method: {}", event.http_method)))?;
    let uri = event.uri()?;
    let payload = event.payload()?;

    info!("Serverless invocation: {} {}", method, uri);

    let mut req = actix_test::TestRequest::default().method(method).uri(&uri.to_string());
    for (name, value) in event.header_pairs() {
        match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
            (Ok(name), Ok(value)) => req = req.append_header((name, value)),
            _ => warn!("Dropping invalid header {}", name),
        }
    }

    let app = actix_test::init_service(build_app(state)).await;
    match app.call(req.set_payload(payload).to_request()).await {
        Ok(resp) => {
            let status = resp.status();
            let headers = resp.headers().clone();
            into_response(status, &headers, resp.into_body()).await
        }
        Err(err) => {
            let resp = err.error_response();
            let status = resp.status();
            let headers = resp.headers().clone();
            into_response(status, &headers, resp.into_body()).await
        }
    }
}

/// Response event for an error raised outside the application.
fn error_event(err: &AppError) -> ServerlessResponse {
    let status = err.status_code();
    if status.is_server_error() {
        error!("Serverless invocation failed: {}", err);
    }

    let body = serde_json::json!({ "error": err.client_message() }).to_string();
    let content_type = "application/json".to_string();

    ServerlessResponse {
        status_code: status.as_u16(),
        headers: HashMap::from([(CONTENT_TYPE.to_string(), content_type.clone())]),
        multi_value_headers: HashMap::from([(CONTENT_TYPE.to_string(), vec![content_type])]),
        body,
        is_base64_encoded: false,
    }
}

fn flatten_headers(headers: &HeaderMap) -> (HashMap<String, String>, HashMap<String, Vec<String>>) {
    let mut single = HashMap::new();
    let mut multi: HashMap<String, Vec<String>> = HashMap::new();

    for (name, value) in headers.iter() {
        let Ok(value) = value.to_str() else {
            warn!("Dropping non-text response header {}", name);
            continue;
        };
        single
            .entry(name.as_str().to_string())
            .or_insert_with(|| value.to_string());
        multi
            .entry(name.as_str().to_string())
            .or_default()
            .push(value.to_string());
    }

    (single, multi)
}

async fn into_response<B: MessageBody>(
    status: StatusCode,
    headers: &HeaderMap,
    body: B,
) -> Result<ServerlessResponse> {
    let bytes = actix_web::body::to_bytes(body).await.map_err(|e| {
        let e: Box<dyn std::error::Error> = e.into();
        AppError::InternalError(format!("failed to read response body: {}", e))
    })?;

    let (body, is_base64_encoded) = match String::from_utf8(bytes.to_vec()) {
        Ok(text) => (text, false),
        Err(_) => (BASE64.encode(&bytes), true),
    };
    let (headers, multi_value_headers) = flatten_headers(headers);

    Ok(ServerlessResponse {
        status_code: status.as_u16(),
        headers,
        multi_value_headers,
        body,
        is_base64_encoded,
    })
}
