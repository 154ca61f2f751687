//! Request normalization and bearer token extraction.

use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue};
use interceptor_sdk::{CONTENT_TYPE_BINARY, InterceptorRequest, QueryParams};
use url::Url;

const BEARER_PREFIX: &str = "Bearer ";

/// Prepare a request for the transport.
///
/// Structured params are appended to the URL's query and cleared, and the
/// content type is forced to binary. A URL that cannot be parsed is left as
/// is; the params are dropped either way.
#[must_use]
pub fn normalize(mut request: InterceptorRequest) -> InterceptorRequest {
    if let Some(params) = request.params.take()
        && !params.is_empty()
    {
        match append_params(&request.url, &params) {
            Ok(url) => request.url = url,
            Err(e) => tracing::warn!(
                url = %request.url,
                dropped_params = params.len(),
                error = %e,
                "failed to append query params; sending URL unchanged"
            ),
        }
    }

    request
        .headers
        .insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_BINARY));
    request
}

fn append_params(url: &str, params: &QueryParams) -> Result<String, url::ParseError> {
    let mut parsed = Url::parse(url)?;
    {
        let mut query = parsed.query_pairs_mut();
        for (key, value) in params.iter() {
            query.append_pair(key, value);
        }
    }
    Ok(parsed.into())
}

/// Token from an `Authorization: Bearer <token>` header, trimmed.
///
/// The value is read as UTF-8, so multi-byte tokens are kept. Returns `None`
/// for other schemes, values that are not UTF-8 or an empty token.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = std::str::from_utf8(headers.get(AUTHORIZATION)?.as_bytes()).ok()?;
    let token = value.strip_prefix(BEARER_PREFIX)?.trim();
    (!token.is_empty()).then(|| token.to_owned())
}
