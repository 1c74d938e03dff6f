//! Shared application state.

use crate::config::Config;
use std::sync::Arc;
use toolhub_core::{DocumentClient, InteractionLog, PromptRegistry, ToolRegistry};

/// Shared application state.
pub struct AppState {
    pub client: Arc<DocumentClient>,
    pub log: Arc<InteractionLog>,
    pub tools: ToolRegistry,
    pub prompts: PromptRegistry,
    pub config: Config,
}

impl AppState {
    /// Connect to the configured store. A store that cannot be opened is
    /// logged and left unavailable rather than failing startup.
    pub fn new(config: Config) -> Self {
        let client = Arc::new(DocumentClient::connect(&config.db_path));
        Self::with_client(config, client)
    }

    /// Build state over an existing client.
    pub fn with_client(config: Config, client: Arc<DocumentClient>) -> Self {
        let log = Arc::new(InteractionLog::new(Arc::new(
            client.collection(&config.collection),
        )));
        let tools = ToolRegistry::new(log.clone());
        Self {
            client,
            log,
            tools,
            prompts: PromptRegistry::new(),
            config,
        }
    }
}
