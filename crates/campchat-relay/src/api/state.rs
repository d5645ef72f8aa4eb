use campchat_contracts::{CatalogProvider, render_system_prompt};
use std::sync::Arc;

use crate::config::RelayConfig;
use crate::error::Result;
use crate::gateway::GatewayClient;
use crate::middleware::ClientTokens;

/// Shared state for relay handlers. Holds configuration only; nothing here
/// changes between requests.
#[derive(Clone)]
pub struct RelayState {
    pub gateway: Arc<GatewayClient>,
    /// Rendered once at start-up and prepended to every conversation
    pub system_prompt: Arc<str>,
    pub client_tokens: Arc<ClientTokens>,
}

impl RelayState {
    pub fn new(config: &RelayConfig, catalog: &dyn CatalogProvider) -> Result<Self> {
        Ok(Self {
            gateway: Arc::new(GatewayClient::new(config)?),
            system_prompt: Arc::from(render_system_prompt(catalog)),
            client_tokens: Arc::new(ClientTokens::new(&config.client_tokens)),
        })
    }
}
