use async_trait::async_trait;

use crate::cancel::CancelSignal;
use crate::error::TransportError;
use crate::models::{InterceptorRequest, RawResponse};

/// HTTP client an interceptor delegates the network exchange to.
///
/// The request it receives is already normalized: `params` flattened into
/// `url` and the content type set.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one exchange, returning the body as raw bytes.
    ///
    /// # Errors
    ///
    /// * `Status` - a response arrived with a non-success status
    /// * `Cancelled` - `cancel` fired before a response was obtained
    /// * `Network` - no response was obtained
    async fn execute(
        &self,
        request: InterceptorRequest,
        cancel: CancelSignal,
    ) -> Result<RawResponse, TransportError>;
}
