//! Client implementation of the interceptor trait.

use std::sync::Arc;

use interceptor_sdk::{
    CancelToken, Interceptor, InterceptorRequest, PendingResponse, RequestRun, Selectable,
    Translator,
};

use super::service::Service;
use crate::config::NativeInterceptorPluginConfig;

/// Interceptor handed out to registries.
///
/// Each [`Interceptor::run_request`] spawns its own task; the client itself
/// is immutable and cheap to share.
pub struct Client {
    service: Arc<Service>,
    interceptor_id: String,
    name_key: String,
    selectable: Selectable,
}

impl Client {
    /// Create a new client wrapping the service.
    #[must_use]
    pub fn new(service: Arc<Service>, config: &NativeInterceptorPluginConfig) -> Self {
        let selectable = if config.selectable {
            Selectable::Selectable
        } else {
            Selectable::Unselectable {
                reason_key: config.unselectable_reason_key.clone(),
            }
        };

        Self {
            service,
            interceptor_id: config.interceptor_id.clone(),
            name_key: config.name_key.clone(),
            selectable,
        }
    }
}

impl Interceptor for Client {
    fn interceptor_id(&self) -> &str {
        &self.interceptor_id
    }

    fn name(&self, translator: &dyn Translator) -> String {
        translator.translate(&self.name_key)
    }

    fn selectable(&self) -> Selectable {
        self.selectable.clone()
    }

    fn run_request(&self, request: &InterceptorRequest) -> RequestRun {
        let token = CancelToken::new();
        let signal = token.signal();
        let service = Arc::clone(&self.service);
        let request = request.clone();

        RequestRun {
            cancel: token.handle(),
            response: PendingResponse::spawn(async move { service.execute(request, signal).await }),
        }
    }
}
