//! Error types for interceptors and transports.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

use crate::i18n::Translator;
use crate::models::{NetworkResponse, RawResponse};

type BoxError = Box<dyn StdError + Send + Sync>;

/// Outcome of a single request run.
pub type RequestRunResult = Result<NetworkResponse, InterceptorFailure>;

/// Classification of a failed request run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum InterceptorErrorKind {
    /// No HTTP response was obtained
    Network,
    /// A response arrived but its body could not be decrypted
    Decryption,
    /// The body (decrypted or plain) was not valid MessagePack
    Deserialization,
    /// A success response arrived but the request carried no bearer token
    MissingToken,
    /// The request task itself failed
    Internal,
}

impl InterceptorErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Decryption => "decryption",
            Self::Deserialization => "deserialization",
            Self::MissingToken => "missing_token",
            Self::Internal => "internal",
        }
    }

    /// Localization keys describing this kind of failure to a user.
    #[must_use]
    pub fn human_message(self) -> HumanMessage {
        let (heading, description) = match self {
            Self::Network => ("error.network_fail", "helpers.network_fail"),
            Self::Decryption => ("error.decryption_fail", "helpers.decryption_fail"),
            Self::Deserialization => ("error.deserialization_fail", "helpers.deserialization_fail"),
            Self::MissingToken => ("error.missing_token", "helpers.missing_token"),
            Self::Internal => ("error.something_went_wrong", "helpers.something_went_wrong"),
        };
        HumanMessage {
            heading,
            description,
        }
    }
}

impl fmt::Display for InterceptorErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pair of localization keys for a user-facing error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HumanMessage {
    pub heading: &'static str,
    pub description: &'static str,
}

impl HumanMessage {
    #[must_use]
    pub fn resolve(&self, translator: &dyn Translator) -> ResolvedMessage {
        ResolvedMessage {
            heading: translator.translate(self.heading),
            description: translator.translate(self.description),
        }
    }
}

/// A [`HumanMessage`] after translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMessage {
    pub heading: String,
    pub description: String,
}

/// A request run that failed for a reason other than cancellation.
///
/// The underlying error is preserved as the [`std::error::Error::source`].
#[derive(Error, Debug)]
#[error("{kind} failure: {source}")]
pub struct InterceptorError {
    kind: InterceptorErrorKind,
    #[source]
    source: BoxError,
}

impl InterceptorError {
    #[must_use]
    pub fn new(kind: InterceptorErrorKind, source: impl Into<BoxError>) -> Self {
        Self {
            kind,
            source: source.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> InterceptorErrorKind {
        self.kind
    }

    /// The underlying error.
    #[must_use]
    pub fn inner(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.source.as_ref()
    }

    #[must_use]
    pub fn into_inner(self) -> BoxError {
        self.source
    }
}

/// Failure side of [`RequestRunResult`].
#[derive(Error, Debug)]
pub enum InterceptorFailure {
    /// The caller cancelled the request before it settled
    #[error("request cancelled")]
    Cancellation,

    #[error(transparent)]
    Error(#[from] InterceptorError),
}

impl InterceptorFailure {
    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancellation)
    }

    #[must_use]
    pub fn kind(&self) -> Option<InterceptorErrorKind> {
        match self {
            Self::Cancellation => None,
            Self::Error(e) => Some(e.kind()),
        }
    }
}

/// A success response could not be decrypted because no key was supplied.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("request has no `Authorization: Bearer <token>` header; cannot decrypt the response body")]
pub struct MissingBearerToken;

/// Errors reported by a [`crate::Transport`].
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TransportError {
    /// The server answered with a non-success status; the raw response is kept
    #[error("server responded with HTTP {}", .0.status)]
    Status(RawResponse),

    /// The cancel signal fired before a response was obtained
    #[error("request cancelled")]
    Cancelled,

    /// No response: connection, TLS, timeout or protocol failure
    #[error("network failure: {0}")]
    Network(#[source] BoxError),
}

impl TransportError {
    #[must_use]
    pub fn network(err: impl Into<BoxError>) -> Self {
        Self::Network(err.into())
    }
}
