#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Interceptor SDK
//!
//! This crate provides the public contract shared by interceptor
//! implementations and the code that selects and drives them:
//!
//! - [`Interceptor`] - Executes one request and normalizes its outcome
//! - [`Transport`] - The HTTP client an interceptor delegates to
//! - [`InterceptorRegistry`] - Lookup of interceptors by identifier
//! - [`InterceptorRequest`], [`RawResponse`], [`NetworkResponse`] - Models
//! - [`InterceptorFailure`], [`InterceptorError`], [`InterceptorErrorKind`] - Errors
//!
//! ## Usage
//!
//! ```ignore
//! use interceptor_sdk::{Interceptor, InterceptorFailure};
//!
//! let run = interceptor.run_request(&request);
//!
//! // The cancel handle is usable immediately
//! let cancel = run.cancel.clone();
//!
//! match run.response.await {
//!     Ok(response) => println!("{} in {}ms", response.status, response.time_data.duration_ms()),
//!     Err(InterceptorFailure::Cancellation) => println!("cancelled"),
//!     Err(InterceptorFailure::Error(e)) => {
//!         let message = e.kind().human_message().resolve(&translator);
//!         println!("{}: {}", message.heading, message.description);
//!     }
//! }
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

pub mod api;
pub mod cancel;
pub mod error;
pub mod i18n;
pub mod models;
pub mod registry;
pub mod transport;

pub use api::{Interceptor, PendingResponse, RequestRun, Selectable};
pub use cancel::{CancelHandle, CancelSignal, CancelToken};
pub use error::{
    HumanMessage, InterceptorError, InterceptorErrorKind, InterceptorFailure, MissingBearerToken,
    RequestRunResult, ResolvedMessage, TransportError,
};
pub use i18n::Translator;
pub use models::{
    CONTENT_TYPE_BINARY, CONTENT_TYPE_JSON, InterceptorRequest, NetworkResponse, QueryParams,
    RawResponse, TimeData,
};
pub use registry::{InterceptorRegistry, RegistryError, StaticInterceptorRegistry};
pub use transport::Transport;
