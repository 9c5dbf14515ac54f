//! Shared collaborators handed to every request handler

use crate::config::{NetworkConfig, ProxyConfig};
use crate::proxy::handler::RequestHandler;
use crate::proxy::registry::SequenceRegistry;
use crate::transport::Transport;
use crate::translator::CommandTranslator;
use std::sync::Arc;
use std::time::Duration;

/// Header identifiers stamped on every outgoing command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub local_id: i32,
    pub remote_id: i32,
    pub service_class: i32,
}

impl From<&NetworkConfig> for Endpoint {
    fn from(network: &NetworkConfig) -> Self {
        Self {
            local_id: network.local_id,
            remote_id: network.remote_id,
            service_class: network.service_class,
        }
    }
}

/// Everything a [`RequestHandler`] needs besides its own command and session
pub struct ProxyContext {
    pub registry: Arc<SequenceRegistry<RequestHandler>>,
    pub translator: Arc<dyn CommandTranslator>,
    pub transport: Arc<dyn Transport>,
    pub endpoint: Endpoint,
    pub proxy: ProxyConfig,
}

impl ProxyContext {
    pub fn new(
        registry: Arc<SequenceRegistry<RequestHandler>>,
        translator: Arc<dyn CommandTranslator>,
        transport: Arc<dyn Transport>,
        endpoint: Endpoint,
        proxy: ProxyConfig,
    ) -> Self {
        Self {
            registry,
            translator,
            transport,
            endpoint,
            proxy,
        }
    }

    /// Configured handling time for a command type
    pub fn handling_time(&self, command_type: &str) -> Duration {
        self.proxy.handling_time(command_type)
    }
}
