//! Native interceptor plugin module.

use std::sync::Arc;

use anyhow::Context;
use interceptor_sdk::{Interceptor, Transport};
use tracing::info;

use crate::config::NativeInterceptorPluginConfig;
use crate::domain::{Client, Service};
use crate::infra::HyperTransport;

/// Native interceptor plugin.
///
/// Executes requests over its own HTTP transport and unpacks sealed
/// MessagePack responses into JSON.
pub struct NativeInterceptorPlugin {
    client: Arc<Client>,
}

impl NativeInterceptorPlugin {
    /// Build the plugin with the hyper transport described by `cfg`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP transport cannot be initialized.
    pub fn init(cfg: &NativeInterceptorPluginConfig) -> anyhow::Result<Self> {
        info!(
            interceptor_id = %cfg.interceptor_id,
            selectable = cfg.selectable,
            request_timeout_ms = cfg.transport.request_timeout.as_millis(),
            max_body_size = cfg.transport.max_body_size,
            "Initializing native interceptor plugin"
        );

        let transport =
            HyperTransport::new(&cfg.transport).context("failed to build HTTP transport")?;
        Ok(Self::with_transport(cfg, Arc::new(transport)))
    }

    /// Build the plugin on top of an existing transport.
    #[must_use]
    pub fn with_transport(cfg: &NativeInterceptorPluginConfig, transport: Arc<dyn Transport>) -> Self {
        let service = Arc::new(Service::new(transport));
        let client = Arc::new(Client::new(service, cfg));

        info!(interceptor_id = %cfg.interceptor_id, "Native interceptor plugin initialized");
        Self { client }
    }

    /// The interceptor to register.
    #[must_use]
    pub fn interceptor(&self) -> Arc<dyn Interceptor> {
        self.client.clone()
    }
}
