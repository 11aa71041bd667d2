// src/api/client.rs
//! HTTP dispatch for the Feishu open platform.
//!
//! Attaches the tenant credential, unwraps the `{code, msg, data}` envelope
//! and retries exactly once when the server reports the credential as stale.
//! No parsing of resource shapes happens here.

use super::token::{Credential, TokenManager};
use crate::config::ClientConfig;
use crate::constants::ERROR_BODY_PREVIEW_LENGTH;
use crate::error::{AppError, ErrorClass, ErrorCodePolicy};
use reqwest::{multipart, Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// A file sent as a multipart form.
///
/// Bytes are owned so the form can be rebuilt if the request is retried.
#[derive(Debug, Clone)]
pub struct MultipartUpload {
    pub fields: Vec<(String, String)>,
    pub file_field: String,
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl MultipartUpload {
    fn to_form(&self) -> Result<multipart::Form, AppError> {
        let part = multipart::Part::bytes(self.bytes.clone())
            .file_name(self.file_name.clone())
            .mime_str(&self.mime_type)?;
        let form = self
            .fields
            .iter()
            .fold(multipart::Form::new(), |form, (name, value)| {
                form.text(name.clone(), value.clone())
            })
            .part(self.file_field.clone(), part);
        Ok(form)
    }
}

#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    Json(Value),
    Multipart(MultipartUpload),
}

/// Everything needed to (re)issue one API call.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, name: &str, value: impl ToString) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    pub fn query_opt(self, name: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.query(name, value),
            None => self,
        }
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn multipart(mut self, upload: MultipartUpload) -> Self {
        self.body = RequestBody::Multipart(upload);
        self
    }
}

/// The `{code, msg, data}` envelope every endpoint answers with.
#[derive(Debug, serde::Deserialize)]
struct Envelope {
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: Option<Value>,
}

enum Outcome {
    Data(Value),
    Failed { code: i64, message: String },
}

/// Issues requests against the API, authenticated or anonymous.
#[derive(Clone)]
pub struct FeishuHttpClient {
    http: Client,
    config: ClientConfig,
    tokens: Option<Arc<TokenManager>>,
}

impl FeishuHttpClient {
    /// A client that sends `Authorization: Bearer <credential>` on every call.
    pub fn authenticated(config: ClientConfig, tokens: Arc<TokenManager>) -> Result<Self, AppError> {
        Self::build(config, Some(tokens))
    }

    /// A client for the public endpoints: no credential, no retry.
    pub fn anonymous(config: ClientConfig) -> Result<Self, AppError> {
        Self::build(config, None)
    }

    fn build(config: ClientConfig, tokens: Option<Arc<TokenManager>>) -> Result<Self, AppError> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            http,
            config,
            tokens,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn error_codes(&self) -> &ErrorCodePolicy {
        &self.config.error_codes
    }

    /// Sends the request and returns `data` (`{}` when absent or null).
    pub async fn send(&self, request: ApiRequest) -> Result<Value, AppError> {
        let Some(tokens) = &self.tokens else {
            return match self.attempt(&request, None).await? {
                Outcome::Data(data) => Ok(data),
                Outcome::Failed { code, message } => Err(AppError::Api { code, message }),
            };
        };

        let credential = tokens.get_valid_credential().await?;
        let (code, message) = match self.attempt(&request, Some(&credential)).await? {
            Outcome::Data(data) => return Ok(data),
            Outcome::Failed { code, message } => (code, message),
        };
        if self.error_codes().classify(code) != ErrorClass::StaleCredential {
            return Err(AppError::Api { code, message });
        }

        log::warn!(
            "Credential reported stale ({}) on {} {}, refreshing and retrying once",
            code,
            request.method,
            request.path
        );
        tokens.invalidate_if_current(&credential).await;
        let fresh = tokens.get_valid_credential().await?;
        match self.attempt(&request, Some(&fresh)).await? {
            Outcome::Data(data) => Ok(data),
            Outcome::Failed { code, message } => Err(AppError::Api { code, message }),
        }
    }

    /// Sends the request and deserializes `data` into `T`.
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, AppError> {
        let data = self.send(request).await?;
        Ok(serde_json::from_value(data)?)
    }

    async fn attempt(
        &self,
        request: &ApiRequest,
        credential: Option<&Credential>,
    ) -> Result<Outcome, AppError> {
        let url = self.config.url(&request.path);
        log::debug!("{} {}", request.method, url);

        let mut builder = self.http.request(request.method.clone(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(credential) = credential {
            builder = builder.bearer_auth(credential.value());
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(body),
            RequestBody::Multipart(upload) => builder.multipart(upload.to_form()?),
        };

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        decode_envelope(status, &text)
    }
}

/// Maps a raw response onto the envelope vocabulary.
fn decode_envelope(status: StatusCode, text: &str) -> Result<Outcome, AppError> {
    match serde_json::from_str::<Envelope>(text) {
        Ok(envelope) if envelope.code == 0 => Ok(Outcome::Data(
            envelope
                .data
                .filter(|data| !data.is_null())
                .unwrap_or_else(|| Value::Object(Default::default())),
        )),
        Ok(envelope) => Ok(Outcome::Failed {
            code: envelope.code,
            message: envelope.msg,
        }),
        Err(_) if !status.is_success() => Ok(Outcome::Failed {
            code: i64::from(status.as_u16()),
            message: format!("HTTP {}: {}", status, preview(text)),
        }),
        Err(e) => Err(AppError::Protocol(format!(
            "response is not a {{code, msg, data}} envelope ({}): {}",
            e,
            preview(text)
        ))),
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() <= ERROR_BODY_PREVIEW_LENGTH {
        return text.to_string();
    }
    let cut: String = text.chars().take(ERROR_BODY_PREVIEW_LENGTH).collect();
    format!("{}...", cut)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_of(outcome: Outcome) -> Value {
        match outcome {
            Outcome::Data(data) => data,
            Outcome::Failed { code, .. } => panic!("unexpected failure {}", code),
        }
    }

    #[test]
    fn test_success_without_data_is_empty_object() {
        let data = data_of(decode_envelope(StatusCode::OK, r#"{"code":0,"msg":"ok"}"#).unwrap());
        assert_eq!(data, serde_json::json!({}));
        let data =
            data_of(decode_envelope(StatusCode::OK, r#"{"code":0,"data":null}"#).unwrap());
        assert_eq!(data, serde_json::json!({}));
    }

    #[test]
    fn test_non_json_error_status_keeps_http_code() {
        match decode_envelope(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>").unwrap() {
            Outcome::Failed { code, message } => {
                assert_eq!(code, 502);
                assert!(message.contains("bad gateway"));
            }
            Outcome::Data(_) => panic!("expected failure"),
        }
    }

    #[test]
    fn test_non_envelope_success_is_protocol_error() {
        let err = decode_envelope(StatusCode::OK, "not json").err().unwrap();
        assert!(matches!(err, AppError::Protocol(_)));
    }

    #[test]
    fn test_preview_truncates_long_bodies() {
        let long = "x".repeat(ERROR_BODY_PREVIEW_LENGTH + 50);
        assert_eq!(preview(&long).len(), ERROR_BODY_PREVIEW_LENGTH + 3);
        assert_eq!(preview("short"), "short");
    }

    #[test]
    fn test_request_builder_collects_query() {
        let request = ApiRequest::get("/wiki/v2/spaces")
            .query("page_size", 50)
            .query_opt("page_token", None::<String>)
            .query_opt("parent_node_token", Some("wikcn1"));
        assert_eq!(
            request.query,
            vec![
                ("page_size".to_string(), "50".to_string()),
                ("parent_node_token".to_string(), "wikcn1".to_string())
            ]
        );
    }
}
