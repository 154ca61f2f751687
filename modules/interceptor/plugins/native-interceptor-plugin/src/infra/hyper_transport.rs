//! [`Transport`] implementation over a pooled hyper client.

use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::{TokioExecutor, TokioTimer};
use interceptor_sdk::{CancelSignal, InterceptorRequest, RawResponse, Transport, TransportError};
use thiserror::Error;
use tower::ServiceExt;
use tower_http::follow_redirect::FollowRedirect;

use crate::config::TransportConfig;
use crate::infra::redirect::SecureRedirectPolicy;

type HyperClient = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;
type RedirectingClient = FollowRedirect<HyperClient, SecureRedirectPolicy>;

/// Failures of a single exchange, reported as [`TransportError::Network`].
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HyperTransportError {
    #[error("TLS initialization failed: {0}")]
    Tls(#[source] rustls::Error),

    #[error("invalid request: {0}")]
    InvalidRequest(#[from] http::Error),

    #[error("request failed: {0}")]
    Request(#[from] hyper_util::client::legacy::Error),

    #[error("failed to read response body: {0}")]
    Body(#[source] Box<dyn StdError + Send + Sync>),

    #[error("response body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

/// HTTP(S) transport with connection pooling, a per-request timeout, a
/// response size cap and redirect following.
///
/// The timeout covers the whole redirect chain.
pub struct HyperTransport {
    client: RedirectingClient,
    request_timeout: Duration,
    max_body_size: usize,
}

impl HyperTransport {
    /// Build the transport.
    ///
    /// # Errors
    ///
    /// Returns [`HyperTransportError::Tls`] if the TLS connector cannot be
    /// initialized.
    pub fn new(config: &TransportConfig) -> Result<Self, HyperTransportError> {
        if config.allow_insecure_http {
            tracing::warn!("insecure HTTP enabled; use only for testing with local servers");
        }

        let builder = hyper_rustls::HttpsConnectorBuilder::new()
            .with_provider_and_webpki_roots(crypto_provider())
            .map_err(HyperTransportError::Tls)?;
        let https = if config.allow_insecure_http {
            builder.https_or_http().enable_all_versions().build()
        } else {
            builder.https_only().enable_all_versions().build()
        };

        // pool_timer is required for pool_idle_timeout to take effect
        let client: HyperClient = Client::builder(TokioExecutor::new())
            .pool_timer(TokioTimer::new())
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(config.pool_idle_timeout)
            .build(https);
        let client = FollowRedirect::with_policy(
            client,
            SecureRedirectPolicy::new(config.redirect.clone()),
        );

        Ok(Self {
            client,
            request_timeout: config.request_timeout,
            max_body_size: config.max_body_size,
        })
    }

    async fn send(&self, request: InterceptorRequest) -> Result<RawResponse, HyperTransportError> {
        let mut builder = http::Request::builder()
            .method(request.method)
            .uri(request.url.as_str());
        if let Some(headers) = builder.headers_mut() {
            headers.extend(request.headers);
        }
        let req = builder.body(Full::new(request.body.unwrap_or_default()))?;

        let response: hyper::Response<hyper::body::Incoming> =
            self.client.clone().oneshot(req).await?;
        let (parts, body) = response.into_parts();

        let limit = self.max_body_size;
        let body = Limited::new(body, limit)
            .collect()
            .await
            .map_err(|e| {
                if e.is::<LengthLimitError>() {
                    HyperTransportError::BodyTooLarge { limit }
                } else {
                    HyperTransportError::Body(e)
                }
            })?
            .to_bytes();

        tracing::debug!(status = %parts.status, body_len = body.len(), "received response");
        Ok(RawResponse {
            status: parts.status,
            headers: parts.headers,
            body,
        })
    }
}

#[async_trait]
impl Transport for HyperTransport {
    async fn execute(
        &self,
        request: InterceptorRequest,
        cancel: CancelSignal,
    ) -> Result<RawResponse, TransportError> {
        let exchange = tokio::time::timeout(self.request_timeout, self.send(request));

        tokio::select! {
            biased;

            () = cancel.cancelled() => Err(TransportError::Cancelled),
            outcome = exchange => match outcome {
                Ok(Ok(raw)) if raw.status.is_success() => Ok(raw),
                Ok(Ok(raw)) => Err(TransportError::Status(raw)),
                Ok(Err(e)) => Err(TransportError::network(e)),
                Err(_elapsed) => Err(TransportError::network(HyperTransportError::Timeout(
                    self.request_timeout,
                ))),
            },
        }
    }
}

fn crypto_provider() -> Arc<rustls::crypto::CryptoProvider> {
    rustls::crypto::CryptoProvider::get_default()
        .cloned()
        .unwrap_or_else(|| Arc::new(rustls::crypto::aws_lc_rs::default_provider()))
}
