//! Configuration for the native interceptor plugin.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Native interceptor plugin configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NativeInterceptorPluginConfig {
    /// Identifier the interceptor is registered under.
    #[serde(default = "default_interceptor_id")]
    pub interceptor_id: String,

    /// Localization key of the display name.
    #[serde(default = "default_name_key")]
    pub name_key: String,

    /// Whether users may pick this interceptor.
    #[serde(default = "default_selectable")]
    pub selectable: bool,

    /// Localization key explaining why the interceptor is unavailable.
    /// Only used when `selectable` is false.
    #[serde(default = "default_unselectable_reason_key")]
    pub unselectable_reason_key: String,

    /// HTTP transport settings.
    pub transport: TransportConfig,
}

fn default_interceptor_id() -> String {
    "native".to_owned()
}

fn default_name_key() -> String {
    "state.none".to_owned()
}

fn default_selectable() -> bool {
    true
}

fn default_unselectable_reason_key() -> String {
    "interceptor.native.unavailable".to_owned()
}

impl Default for NativeInterceptorPluginConfig {
    fn default() -> Self {
        Self {
            interceptor_id: default_interceptor_id(),
            name_key: default_name_key(),
            selectable: default_selectable(),
            unselectable_reason_key: default_unselectable_reason_key(),
            transport: TransportConfig::default(),
        }
    }
}

/// Settings of the hyper-based HTTP transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransportConfig {
    /// Upper bound for one exchange, including reading the body.
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Largest response body accepted, in bytes.
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,

    /// Allow plain `http://` URLs. Intended for tests against local servers.
    #[serde(default)]
    pub allow_insecure_http: bool,

    /// How long an idle pooled connection is kept.
    #[serde(default = "default_pool_idle_timeout", with = "humantime_serde")]
    pub pool_idle_timeout: Duration,

    #[serde(default = "default_pool_max_idle_per_host")]
    pub pool_max_idle_per_host: usize,

    /// Redirect following.
    pub redirect: RedirectConfig,
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_body_size() -> usize {
    10 * 1024 * 1024
}

fn default_pool_idle_timeout() -> Duration {
    Duration::from_secs(90)
}

fn default_pool_max_idle_per_host() -> usize {
    32
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            request_timeout: default_request_timeout(),
            max_body_size: default_max_body_size(),
            allow_insecure_http: false,
            pool_idle_timeout: default_pool_idle_timeout(),
            pool_max_idle_per_host: default_pool_max_idle_per_host(),
            redirect: RedirectConfig::default(),
        }
    }
}

/// How 3xx responses are followed.
///
/// Redirects to another origin are refused unless `same_origin_only` is off,
/// and even then credentials are not forwarded when `strip_sensitive_headers`
/// is on. A redirect that is refused surfaces as the 3xx response itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RedirectConfig {
    /// Hops followed per request. `0` disables redirect following.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    #[serde(default = "default_true")]
    pub same_origin_only: bool,

    /// Drop `Authorization`, `Cookie` and `Proxy-Authorization` after
    /// leaving the original origin.
    #[serde(default = "default_true")]
    pub strip_sensitive_headers: bool,

    /// Follow `https` to `http` redirects.
    #[serde(default)]
    pub allow_https_downgrade: bool,
}

fn default_max_redirects() -> usize {
    10
}

fn default_true() -> bool {
    true
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            max_redirects: default_max_redirects(),
            same_origin_only: true,
            strip_sensitive_headers: true,
            allow_https_downgrade: false,
        }
    }
}

impl RedirectConfig {
    /// Never follow redirects; 3xx responses reach the caller as is.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            max_redirects: 0,
            ..Self::default()
        }
    }
}

/// Serde support for `Duration` in humantime form (`"30s"`, `"5m"`).
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer, de};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&humantime::format_duration(*d))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(d)?;
        humantime::parse_duration(&raw).map_err(de::Error::custom)
    }
}
