use anyhow::Result;
use std::sync::Arc;

use crate::Config;

/// Plugin provider trait for extending the service with blocks
pub trait PluginProvider: Send + Sync {
    /// Unique identifier for this plugin
    fn id(&self) -> &str;

    /// Human-readable name
    fn name(&self) -> &str;

    /// Initialize the plugin with the given context
    fn initialize(&mut self, ctx: &PluginContext) -> Result<()>;

    /// Shutdown the plugin gracefully
    fn shutdown(&mut self) -> Result<()>;

    /// Block types provided by this plugin
    fn blocks(&self) -> Vec<BlockDefinition>;
}

/// Context provided to plugins during initialization
pub struct PluginContext {
    pub config: Arc<Config>,
}

impl PluginContext {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

/// A block type that can be placed on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDefinition {
    /// Plugin id of the block type, e.g. `weather_block`
    pub id: String,
    /// Label shown in the block listing
    pub admin_label: String,
    /// Template used to render the block
    pub theme: String,
}
