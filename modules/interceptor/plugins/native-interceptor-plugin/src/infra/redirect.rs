//! Redirect policy for the hyper transport.
//!
//! Same-origin hops are followed up to a limit. Cross-origin hops are refused
//! by default, `https` to `http` downgrades are always refused unless
//! enabled, and credentials are dropped once a chain leaves the original
//! origin.

use http::{Request, Uri, header};
use tower_http::follow_redirect::policy::{Action, Attempt, Policy};

use crate::config::RedirectConfig;

/// Headers removed once a redirect chain leaves the original origin
const SENSITIVE_HEADERS: &[header::HeaderName] = &[
    header::AUTHORIZATION,
    header::COOKIE,
    header::PROXY_AUTHORIZATION,
];

/// [`Policy`] applying a [`RedirectConfig`].
///
/// State is per request: the transport clones a fresh policy for every
/// exchange.
#[derive(Debug, Clone)]
pub struct SecureRedirectPolicy {
    config: RedirectConfig,
    hops: usize,
    left_origin: bool,
}

impl SecureRedirectPolicy {
    #[must_use]
    pub fn new(config: RedirectConfig) -> Self {
        Self {
            config,
            hops: 0,
            left_origin: false,
        }
    }

    /// Scheme, host and port match. A missing scheme counts as `https`.
    fn is_same_origin(from: &Uri, to: &Uri) -> bool {
        let from_scheme = from.scheme_str().unwrap_or("https");
        let to_scheme = to.scheme_str().unwrap_or("https");

        let from_port = from.port_u16().unwrap_or_else(|| default_port(from_scheme));
        let to_port = to.port_u16().unwrap_or_else(|| default_port(to_scheme));

        from_scheme == to_scheme
            && from.host().unwrap_or("") == to.host().unwrap_or("")
            && from_port == to_port
    }

    fn is_downgrade(from: &Uri, to: &Uri) -> bool {
        from.scheme_str().unwrap_or("https") == "https" && to.scheme_str() == Some("http")
    }
}

fn default_port(scheme: &str) -> u16 {
    match scheme {
        "http" => 80,
        "https" => 443,
        _ => 0,
    }
}

impl<B: Clone, E> Policy<B, E> for SecureRedirectPolicy {
    fn redirect(&mut self, attempt: &Attempt<'_>) -> Result<Action, E> {
        self.hops += 1;
        if self.hops > self.config.max_redirects {
            tracing::debug!(
                hops = self.hops,
                max = self.config.max_redirects,
                "redirect limit reached"
            );
            return Ok(Action::Stop);
        }

        let from = attempt.previous();
        let to = attempt.location();

        if !self.config.allow_https_downgrade && Self::is_downgrade(from, to) {
            tracing::warn!(from = %from, to = %to, "refusing https to http redirect");
            return Ok(Action::Stop);
        }

        let same_origin = Self::is_same_origin(from, to);
        if !same_origin {
            if self.config.same_origin_only {
                tracing::warn!(from = %from, to = %to, "refusing cross-origin redirect");
                return Ok(Action::Stop);
            }
            self.left_origin = true;
        }

        tracing::debug!(from = %from, to = %to, status = %attempt.status(), "following redirect");
        Ok(Action::Follow)
    }

    fn on_request(&mut self, request: &mut Request<B>) {
        if self.left_origin && self.config.strip_sensitive_headers {
            let headers = request.headers_mut();
            for name in SENSITIVE_HEADERS {
                if headers.remove(name).is_some() {
                    tracing::debug!(header = %name, "dropped credential header after leaving origin");
                }
            }
        }
    }

    fn clone_body(&self, body: &B) -> Option<B> {
        // 307/308 replay the original body
        Some(body.clone())
    }
}
