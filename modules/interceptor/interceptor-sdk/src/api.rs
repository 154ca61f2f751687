//! `Interceptor` trait definition.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use tokio::task::JoinHandle;

use crate::cancel::CancelHandle;
use crate::error::{InterceptorError, InterceptorErrorKind, RequestRunResult};
use crate::i18n::Translator;
use crate::models::InterceptorRequest;

/// Whether an interceptor may currently be chosen by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selectable {
    Selectable,
    /// Not selectable; `reason_key` is a localization key explaining why
    Unselectable { reason_key: String },
}

impl Selectable {
    #[must_use]
    pub fn is_selectable(&self) -> bool {
        matches!(self, Self::Selectable)
    }
}

/// A strategy that executes one HTTP request and normalizes its outcome.
///
/// Implementations are shared behind `Arc<dyn Interceptor>` and must be safe
/// to use from multiple concurrent request runs.
pub trait Interceptor: Send + Sync {
    /// Stable identifier, unique within a registry.
    fn interceptor_id(&self) -> &str;

    /// Display name, localized through `translator`.
    fn name(&self, translator: &dyn Translator) -> String;

    fn selectable(&self) -> Selectable;

    /// Start executing `request`.
    ///
    /// Returns immediately; the cancel handle is usable before the response
    /// settles. The caller's request is never mutated.
    ///
    /// Must be called from within a Tokio runtime.
    fn run_request(&self, request: &InterceptorRequest) -> RequestRun;
}

/// Handle to one in-flight request.
#[must_use = "dropping a RequestRun detaches the request; await `response` or keep `cancel`"]
#[derive(Debug)]
pub struct RequestRun {
    pub cancel: CancelHandle,
    pub response: PendingResponse,
}

/// Future resolving to the outcome of a spawned request run.
///
/// Dropping it does not abort the request; use the [`CancelHandle`].
#[derive(Debug)]
pub struct PendingResponse {
    handle: JoinHandle<RequestRunResult>,
}

impl PendingResponse {
    /// Spawn `fut` onto the current Tokio runtime.
    #[must_use]
    pub fn spawn<F>(fut: F) -> Self
    where
        F: Future<Output = RequestRunResult> + Send + 'static,
    {
        Self {
            handle: tokio::spawn(fut),
        }
    }
}

impl Future for PendingResponse {
    type Output = RequestRunResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let joined = ready!(Pin::new(&mut self.handle).poll(cx));
        Poll::Ready(match joined {
            Ok(result) => result,
            Err(join_err) => {
                Err(InterceptorError::new(InterceptorErrorKind::Internal, join_err).into())
            }
        })
    }
}
