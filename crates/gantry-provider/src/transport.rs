//! HTTP plumbing shared by all provider adapters.
//!
//! Adapters describe each call as an [`ApiCall`] and hand it to a
//! [`Transport`]. The production transport is [`HttpTransport`] (reqwest);
//! tests swap in [`ScriptedTransport`] to replay canned replies and capture
//! the outgoing traffic for assertions.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};

/// Client marker sent on every provider request.
pub const CLIENT_MARKER: &str = concat!("gantry/", env!("CARGO_PKG_VERSION"));

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
        }
    }
}

/// One provider API call, path relative to the adapter's base URL.
#[derive(Debug, Clone)]
pub struct ApiCall {
    pub verb: Verb,
    pub path: String,
    pub body: Option<Value>,
}

impl ApiCall {
    pub fn get(path: impl Into<String>) -> Self {
        Self { verb: Verb::Get, path: path.into(), body: None }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self { verb: Verb::Post, path: path.into(), body: Some(body) }
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self { verb: Verb::Put, path: path.into(), body: Some(body) }
    }

    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self { verb: Verb::Patch, path: path.into(), body: Some(body) }
    }
}

/// A successful (2xx) provider reply.
#[derive(Debug, Clone)]
pub struct ApiReply {
    pub status: u16,
    pub body: Value,
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, call: ApiCall) -> ProviderResult<ApiReply>;
}

/// Map an HTTP status onto the provider error taxonomy. 2xx passes through,
/// 404 is a miss, other 4xx is a rejection, everything else is the
/// provider's problem.
pub(crate) fn classify(status: u16, body: Value) -> ProviderResult<ApiReply> {
    match status {
        200..=299 => Ok(ApiReply { status, body }),
        404 => Err(ProviderError::NotFound(reply_message(&body))),
        400..=499 => Err(ProviderError::Rejected { status, message: reply_message(&body) }),
        _ => Err(ProviderError::Provider(format!("HTTP {status}: {}", reply_message(&body)))),
    }
}

/// Pull a human-readable message out of whatever error body came back.
fn reply_message(body: &Value) -> String {
    for key in ["message", "error", "error_message"] {
        if let Some(text) = body.get(key).and_then(Value::as_str) {
            return text.to_string();
        }
    }
    if let Some(text) = body.as_str() {
        return text.to_string();
    }
    if body.is_null() {
        return "no response body".to_string();
    }
    body.to_string()
}

/// Deserialize a reply body, folding shape mismatches into the provider
/// error class.
pub(crate) fn parse_reply<T: DeserializeOwned>(body: Value, context: &str) -> ProviderResult<T> {
    serde_json::from_value(body)
        .map_err(|e| ProviderError::Provider(format!("{context}: unexpected response shape: {e}")))
}

/// Production transport: one authenticated reqwest client per provider.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    auth_header: String,
    auth_value: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, auth_header: &str, auth_value: String) -> ProviderResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(CLIENT_MARKER)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::Transport(format!("client build failed: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_header: auth_header.to_string(),
            auth_value,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, call: ApiCall) -> ProviderResult<ApiReply> {
        let url = format!("{}{}", self.base_url, call.path);
        debug!(verb = call.verb.as_str(), %url, "provider request");

        let mut request = match call.verb {
            Verb::Get => self.client.get(&url),
            Verb::Post => self.client.post(&url),
            Verb::Put => self.client.put(&url),
            Verb::Patch => self.client.patch(&url),
            Verb::Delete => self.client.delete(&url),
        }
        .header(&self.auth_header, &self.auth_value);
        if let Some(body) = &call.body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::Transport(format!("reading body: {e}")))?;
        let body = if text.is_empty() {
            Value::Null
        } else {
            // Some endpoints answer with plain text; keep it as a string.
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };
        classify(status, body)
    }
}

/// Test transport fed from a fixed script of replies. Calls are recorded so
/// tests can assert on the exact traffic an adapter produces.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<ApiCall>>,
}

enum Scripted {
    Reply { status: u16, body: Value },
    Error(ProviderError),
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_reply(&self, status: u16, body: Value) {
        self.lock_script().push_back(Scripted::Reply { status, body });
    }

    pub fn push_error(&self, err: ProviderError) {
        self.lock_script().push_back(Scripted::Error(err));
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn lock_script(&self) -> std::sync::MutexGuard<'_, VecDeque<Scripted>> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, call: ApiCall) -> ProviderResult<ApiReply> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
        match self.lock_script().pop_front() {
            Some(Scripted::Reply { status, body }) => classify(status, body),
            Some(Scripted::Error(err)) => Err(err),
            None => Err(ProviderError::Transport("transport script exhausted".into())),
        }
    }
}
