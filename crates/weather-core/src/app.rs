use anyhow::Result;
use std::sync::Arc;

use crate::{BlockDefinition, Config, PluginContext, PluginProvider};

/// Application state and plugin lifecycle manager
pub struct App {
    plugins: Vec<Box<dyn PluginProvider>>,
    context: PluginContext,
}

impl App {
    /// Create a new application instance around an already loaded config
    pub fn new(config: Config) -> Self {
        let context = PluginContext::new(Arc::new(config));

        Self {
            plugins: Vec::new(),
            context,
        }
    }

    /// Register a plugin with the application
    pub fn register_plugin(&mut self, plugin: Box<dyn PluginProvider>) {
        tracing::info!("Registering plugin: {}", plugin.name());
        self.plugins.push(plugin);
    }

    /// Initialize all registered plugins
    pub fn initialize(&mut self) -> Result<()> {
        tracing::info!(
            "Initializing application with {} plugins",
            self.plugins.len()
        );

        for plugin in &mut self.plugins {
            tracing::debug!("Initializing plugin: {}", plugin.name());
            plugin.initialize(&self.context)?;
        }

        tracing::info!("Application initialized successfully");
        Ok(())
    }

    /// Shutdown the application and all plugins
    pub fn shutdown(&mut self) -> Result<()> {
        tracing::info!("Shutting down application");

        for plugin in &mut self.plugins {
            tracing::debug!("Shutting down plugin: {}", plugin.name());
            if let Err(e) = plugin.shutdown() {
                tracing::error!("Error shutting down plugin {}: {}", plugin.name(), e);
            }
        }

        Ok(())
    }

    /// All block types offered by the registered plugins
    pub fn block_definitions(&self) -> Vec<BlockDefinition> {
        self.plugins.iter().flat_map(|p| p.blocks()).collect()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    struct CountingPlugin {
        initialized: bool,
    }

    impl PluginProvider for CountingPlugin {
        fn id(&self) -> &str {
            "counting"
        }

        fn name(&self) -> &str {
            "Counting"
        }

        fn initialize(&mut self, ctx: &PluginContext) -> Result<()> {
            assert_eq!(ctx.config.weather.country, "UA");
            self.initialized = true;
            Ok(())
        }

        fn shutdown(&mut self) -> Result<()> {
            anyhow::bail!("shutdown errors are logged, not returned")
        }

        fn blocks(&self) -> Vec<BlockDefinition> {
            vec![BlockDefinition {
                id: "counting_block".into(),
                admin_label: "Counting".into(),
                theme: "counting".into(),
            }]
        }
    }

    #[test]
    fn test_plugin_lifecycle() {
        let mut app = App::new(Config::default());
        app.register_plugin(Box::new(CountingPlugin { initialized: false }));

        app.initialize().unwrap();
        let blocks = app.block_definitions();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].id, "counting_block");

        assert!(app.shutdown().is_ok());
    }
}
