// src/api/request.rs
//! Turning endpoint calls into wire requests and responses into objects.
//!
//! These are plain functions so that the async and blocking clients share
//! every byte of request construction and response interpretation, and
//! differ only in how they wait for the transport.

use super::transport::{HttpRequest, Method, RawResponse};
use crate::config::ClientConfig;
use crate::error::{preview, AppError, NotionErrorCode};
use crate::model::{decode, TaggedObject};
use serde::Deserialize;
use serde_json::Value;

/// An endpoint call before authentication and URL resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base, e.g. `pages/{id}`.
    pub endpoint: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            endpoint: endpoint.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn post(endpoint: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            endpoint: endpoint.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    pub fn patch(endpoint: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Patch,
            endpoint: endpoint.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }
}

/// Resolves the URL and attaches authentication and version headers.
pub fn prepare(config: &ClientConfig, request: &ApiRequest) -> Result<HttpRequest, AppError> {
    let url = config.base_url.join(&request.endpoint)?;

    let mut headers = vec![
        ("Authorization".to_string(), config.api_key.bearer()),
        ("Notion-Version".to_string(), config.api_version.clone()),
    ];
    let body = match &request.body {
        Some(body) => {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
            Some(serde_json::to_vec(body)?)
        }
        None => None,
    };

    Ok(HttpRequest {
        method: request.method,
        url: url.to_string(),
        headers,
        query: request.query.clone(),
        body,
    })
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Decodes a response body, or turns any status other than 200 into `RequestFailed`.
///
/// `None` means the body was an object kind this client skips.
pub fn interpret(url: &str, response: RawResponse) -> Result<Option<TaggedObject>, AppError> {
    if !response.is_success() {
        return Err(request_failed(url, &response));
    }

    let raw: Value = serde_json::from_slice(&response.body).map_err(|e| {
        AppError::MalformedResponse(format!(
            "{} returned invalid JSON: {} ({})",
            url,
            e,
            preview(&response.text())
        ))
    })?;
    decode::<TaggedObject>(&raw)
}

fn request_failed(url: &str, response: &RawResponse) -> AppError {
    let text = response.text();
    let parsed = serde_json::from_str::<ErrorBody>(&text).ok();

    let code = parsed
        .as_ref()
        .and_then(|body| body.code.as_deref())
        .map(NotionErrorCode::from_api_response)
        .unwrap_or_else(|| NotionErrorCode::from_http_status(response.status));
    let message = parsed
        .and_then(|body| body.message)
        .unwrap_or_else(|| format!("HTTP {}", response.status));
    let body = preview(&text);

    log::error!(
        "Request to {} failed with status {}: {}",
        url,
        response.status,
        body
    );

    AppError::RequestFailed {
        url: url.to_string(),
        status: response.status,
        code,
        message,
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ApiKey;
    use serde_json::json;

    fn config() -> ClientConfig {
        ClientConfig::new(ApiKey::new("secret_abcdefghijklmnopqrstuvwxyz").unwrap()).unwrap()
    }

    #[test]
    fn test_prepare_sets_headers_and_url() {
        let request = ApiRequest::get("pages/abc").with_query("page_size", 20);
        let prepared = prepare(&config(), &request).unwrap();

        assert_eq!(prepared.url, "https://api.notion.com/v1/pages/abc");
        assert_eq!(
            prepared.header("authorization"),
            Some("Bearer secret_abcdefghijklmnopqrstuvwxyz")
        );
        assert_eq!(prepared.header("Notion-Version"), Some("2022-06-28"));
        assert_eq!(prepared.header("Content-Type"), None);
        assert_eq!(prepared.query_param("page_size"), Some("20"));
        assert!(prepared.body.is_none());
    }

    #[test]
    fn test_prepare_serializes_body() {
        let request = ApiRequest::patch("pages/abc", json!({"archived": true}));
        let prepared = prepare(&config(), &request).unwrap();
        assert_eq!(prepared.method, Method::Patch);
        assert_eq!(prepared.header("Content-Type"), Some("application/json"));
        assert_eq!(prepared.json_body(), Some(json!({"archived": true})));
    }

    #[test]
    fn test_interpret_decodes_user() {
        let body = r#"{"object": "user", "id": "6794760a-1f15-45cd-9c65-0dfe42f5135a", "name": "Bot", "type": "bot"}"#;
        let object = interpret("u", RawResponse::new(200, body)).unwrap().unwrap();
        let user = object.into_user().unwrap();
        assert_eq!(user.name.as_deref(), Some("Bot"));
    }

    #[test]
    fn test_interpret_reports_api_error() {
        let body = r#"{"object": "error", "status": 404, "code": "object_not_found", "message": "Could not find page"}"#;
        let err = interpret("https://api.notion.com/v1/pages/x", RawResponse::new(404, body))
            .unwrap_err();
        match err {
            AppError::RequestFailed {
                status,
                code,
                message,
                ..
            } => {
                assert_eq!(status, 404);
                assert!(code.is_not_found());
                assert_eq!(message, "Could not find page");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_interpret_falls_back_to_status_code() {
        let err = interpret("u", RawResponse::new(502, "<html>bad gateway</html>")).unwrap_err();
        assert!(matches!(
            err,
            AppError::RequestFailed { code: NotionErrorCode::HttpStatus(502), .. }
        ));
    }

    #[test]
    fn test_interpret_rejects_other_success_statuses() {
        let err = interpret("u", RawResponse::new(204, "")).unwrap_err();
        assert!(matches!(
            err,
            AppError::RequestFailed { status: 204, code: NotionErrorCode::HttpStatus(204), .. }
        ));
    }

    #[test]
    fn test_interpret_rejects_invalid_json() {
        let err = interpret("u", RawResponse::new(200, "not json")).unwrap_err();
        assert!(matches!(err, AppError::MalformedResponse(_)));
    }
}
