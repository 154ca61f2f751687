//! Request and response models exchanged with interceptors and transports.

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};

/// Content type forced on outgoing requests.
pub const CONTENT_TYPE_BINARY: &str = "application/octet-stream";

/// Content type declared on responses after the body has been unpacked.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Ordered query parameters. Keys may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pair, keeping earlier pairs with the same key.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push((key.into(), value.into()));
    }

    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A request handed to an interceptor.
///
/// Interceptors never mutate the caller's value; they work on a clone.
/// Header lookup is case-insensitive.
#[derive(Debug, Clone)]
pub struct InterceptorRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    /// Structured query parameters, flattened into `url` before transmission
    pub params: Option<QueryParams>,
}

impl InterceptorRequest {
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
            params: None,
        }
    }

    /// Append a header.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    #[must_use]
    pub fn with_params(mut self, params: QueryParams) -> Self {
        self.params = Some(params);
        self
    }
}

/// Response exactly as produced by the transport.
///
/// The body is the untransformed binary payload.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Start/end of the transport call in milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeData {
    pub start_time: i64,
    pub end_time: i64,
}

impl TimeData {
    /// Elapsed milliseconds, clamped at zero if the wall clock went backwards.
    #[must_use]
    pub fn duration_ms(&self) -> i64 {
        (self.end_time - self.start_time).max(0)
    }
}

/// Response returned to callers after the body has been unpacked.
#[derive(Debug, Clone)]
pub struct NetworkResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub time_data: TimeData,
}
