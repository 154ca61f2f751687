#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

//! Common test utilities for native interceptor integration tests

use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, HeaderValue, StatusCode};
use interceptor_sdk::{CancelSignal, InterceptorRequest, RawResponse, Transport, TransportError};
use native_interceptor_plugin::NativeInterceptorPlugin;
use native_interceptor_plugin::config::NativeInterceptorPluginConfig;
use sealed_payload::{SessionKey, Value, codec};

pub const TOKEN: &str = "0123456789abcdef";

/// How the mock transport answers.
#[derive(Clone)]
pub enum Behavior {
    /// 2xx response
    Respond(RawResponse),
    /// Non-2xx response
    Status(RawResponse),
    /// Connection refused
    Network,
    /// Never answers; honors cancellation
    Hang,
}

pub struct MockTransport {
    behavior: Behavior,
    seen: Mutex<Vec<InterceptorRequest>>,
}

impl MockTransport {
    pub fn new(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            seen: Mutex::new(Vec::new()),
        })
    }

    /// Requests received so far, as handed over by the interceptor.
    pub fn seen(&self) -> Vec<InterceptorRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(
        &self,
        request: InterceptorRequest,
        cancel: CancelSignal,
    ) -> Result<RawResponse, TransportError> {
        self.seen.lock().unwrap().push(request);

        match &self.behavior {
            Behavior::Respond(raw) => Ok(raw.clone()),
            Behavior::Status(raw) => Err(TransportError::Status(raw.clone())),
            Behavior::Network => Err(TransportError::network(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))),
            Behavior::Hang => {
                cancel.cancelled().await;
                Err(TransportError::Cancelled)
            }
        }
    }
}

pub fn plugin_with(transport: Arc<MockTransport>) -> NativeInterceptorPlugin {
    NativeInterceptorPlugin::with_transport(&NativeInterceptorPluginConfig::default(), transport)
}

pub fn raw(status: StatusCode, body: impl Into<Bytes>) -> RawResponse {
    let mut headers = HeaderMap::new();
    headers.insert(
        http::header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    RawResponse {
        status,
        headers,
        body: body.into(),
    }
}

pub fn pack(value: &Value) -> Vec<u8> {
    codec::serialize(value).unwrap()
}

/// Encrypt `value` the way the server does for [`TOKEN`].
pub fn seal(value: &Value) -> Vec<u8> {
    seal_for(TOKEN, value)
}

pub fn seal_for(token: &str, value: &Value) -> Vec<u8> {
    SessionKey::from_bearer_token(token)
        .unwrap()
        .seal_random(&pack(value))
        .unwrap()
}

pub fn map(entries: &[(&str, Value)]) -> Value {
    Value::Map(
        entries
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect(),
    )
}

/// `Bearer <token>` header value; non-ASCII tokens are sent as raw UTF-8 bytes.
pub fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_bytes(format!("Bearer {token}").as_bytes()).unwrap()
}
