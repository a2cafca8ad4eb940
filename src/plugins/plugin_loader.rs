//! Plugin Loader - Builds platform publishers from configuration
//!
//! All publishers created by one loader share its [`ApiClient`].
//!
//! # Example
//!
//! ```no_run
//! use mod_publisher::core::config_loader::{ConfigLoadOptions, ConfigLoader};
//! use mod_publisher::plugins::PluginLoader;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ConfigLoader::load(ConfigLoadOptions::new(".")).await?;
//! let loader = PluginLoader::new()?;
//! let publishers = loader.load_publishers(&config, &[])?;
//!
//! println!("Loaded {} platform publishers", publishers.len());
//! # Ok(())
//! # }
//! ```

use crate::core::config::PublishConfig;
use crate::core::error::PublishError;
use crate::core::http::ApiClient;
use crate::core::traits::PlatformPublisher;
use crate::core::types::Platform;
use crate::plugins::curseforge_plugin::CurseforgePublisher;
use crate::plugins::modrinth_plugin::ModrinthPublisher;
use std::sync::Arc;

/// Plugin loader for platform publishers
pub struct PluginLoader {
    client: ApiClient,
}

impl PluginLoader {
    /// Create a loader with a freshly built HTTP client
    pub fn new() -> Result<Self, PublishError> {
        Ok(Self::with_client(ApiClient::new()?))
    }

    /// Create a loader around an existing client
    pub fn with_client(client: ApiClient) -> Self {
        Self { client }
    }

    /// Load the publisher for one platform
    ///
    /// The platform needs a section in the configuration; its `enabled`
    /// flag is not consulted here.
    pub fn load_publisher(
        &self,
        platform: Platform,
        config: &PublishConfig,
    ) -> Result<Arc<dyn PlatformPublisher>, PublishError> {
        let not_configured = || {
            PublishError::Config(format!(
                "platforms.{} is not configured",
                platform.as_str()
            ))
        };

        match platform {
            Platform::Curseforge => {
                let section = config
                    .platforms
                    .curseforge
                    .clone()
                    .ok_or_else(not_configured)?;
                Ok(Arc::new(CurseforgePublisher::new(
                    config.release(),
                    section,
                    self.client.clone(),
                )))
            }
            Platform::Modrinth => {
                let section = config
                    .platforms
                    .modrinth
                    .clone()
                    .ok_or_else(not_configured)?;
                Ok(Arc::new(ModrinthPublisher::new(
                    config.release(),
                    section,
                    self.client.clone(),
                )))
            }
        }
    }

    /// Load publishers for `selection`, or every enabled platform when empty
    pub fn load_publishers(
        &self,
        config: &PublishConfig,
        selection: &[Platform],
    ) -> Result<Vec<Arc<dyn PlatformPublisher>>, PublishError> {
        let platforms = if selection.is_empty() {
            config.enabled_platforms()
        } else {
            let mut unique = Vec::new();
            for platform in selection {
                if !unique.contains(platform) {
                    unique.push(*platform);
                }
            }
            unique
        };

        platforms
            .into_iter()
            .map(|platform| self.load_publisher(platform, config))
            .collect()
    }
}
