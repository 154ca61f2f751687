//! Request execution: normalize, transport, unpack.

use std::sync::Arc;

use http::HeaderValue;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use interceptor_sdk::{
    CONTENT_TYPE_JSON, CancelSignal, InterceptorError, InterceptorErrorKind, InterceptorFailure,
    InterceptorRequest, MissingBearerToken, NetworkResponse, RawResponse, RequestRunResult,
    TimeData, Transport, TransportError,
};
use sealed_payload::{UnpackError, UnpackStage};

use super::request;

/// Executes requests over a [`Transport`] and unpacks their bodies.
///
/// Holds no per-request state; one instance serves concurrent requests.
pub struct Service {
    transport: Arc<dyn Transport>,
}

impl Service {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Run one request to completion.
    ///
    /// Success responses are decrypted with the request's bearer token;
    /// error responses are decoded as plain MessagePack and returned as
    /// successes carrying the error status.
    ///
    /// # Errors
    ///
    /// * `Cancellation` - the transport observed `cancel` before settling
    /// * `Network` - no response was obtained
    /// * `MissingToken` - a success response arrived for a request without a bearer token
    /// * `Decryption` / `Deserialization` - the body could not be unpacked
    #[tracing::instrument(
        name = "interceptor.request",
        skip_all,
        fields(method = %request.method, url = %request.url)
    )]
    pub async fn execute(
        &self,
        request: InterceptorRequest,
        cancel: CancelSignal,
    ) -> RequestRunResult {
        let request = request::normalize(request);
        let token = request::bearer_token(&request.headers);

        let start_time = now_millis();
        let outcome = self.transport.execute(request, cancel).await;
        let time_data = TimeData {
            start_time,
            end_time: now_millis(),
        };

        match outcome {
            Ok(raw) => {
                let Some(token) = token else {
                    tracing::warn!(
                        status = %raw.status,
                        "success response for a request without bearer token"
                    );
                    return Err(
                        InterceptorError::new(InterceptorErrorKind::MissingToken, MissingBearerToken)
                            .into(),
                    );
                };
                into_network_response(raw, Some(&token), time_data)
            }
            Err(TransportError::Status(raw)) => {
                tracing::debug!(status = %raw.status, "server returned error response");
                into_network_response(raw, None, time_data)
            }
            Err(TransportError::Cancelled) => {
                tracing::debug!("request cancelled");
                Err(InterceptorFailure::Cancellation)
            }
            Err(TransportError::Network(source)) => {
                tracing::warn!(error = %source, "request failed without response");
                Err(InterceptorError::new(InterceptorErrorKind::Network, source).into())
            }
            Err(other) => {
                tracing::warn!(error = %other, "request failed without response");
                Err(InterceptorError::new(InterceptorErrorKind::Network, other).into())
            }
        }
    }
}

fn into_network_response(
    raw: RawResponse,
    token: Option<&str>,
    time_data: TimeData,
) -> RequestRunResult {
    let body = sealed_payload::unpack(&raw.body, token).map_err(|e| {
        tracing::warn!(status = %raw.status, error = %e, "failed to unpack response body");
        unpack_failure(e)
    })?;

    let mut headers = raw.headers;
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON));
    headers.remove(CONTENT_LENGTH);

    Ok(NetworkResponse {
        status: raw.status,
        headers,
        body,
        time_data,
    })
}

fn unpack_failure(err: UnpackError) -> InterceptorFailure {
    let kind = match err.stage() {
        UnpackStage::Decryption => InterceptorErrorKind::Decryption,
        UnpackStage::Deserialization => InterceptorErrorKind::Deserialization,
    };
    InterceptorError::new(kind, err).into()
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
