//! Configuration structures for mod-publisher
//!
//! This module provides the `.mod-publisher.yaml` schema with serde support.
//! Release-type and status values stay strings here; publishers parse them
//! during validation so a typo aborts one platform instead of the whole load.

use crate::core::dependencies::{CurseforgeDependency, DependencySet, ModrinthDependency};
use crate::core::types::{ChangelogType, Environment, LoaderType, Platform};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublishConfig {
    /// Schema version
    #[serde(default)]
    pub version: String,

    /// What is being released (optional in a single file, required overall)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release: Option<ReleaseConfig>,

    /// Platform-specific configurations
    #[serde(default)]
    pub platforms: PlatformConfigs,
}

impl PublishConfig {
    /// The release section, or an empty one when no source defined it
    pub fn release(&self) -> ReleaseConfig {
        self.release.clone().unwrap_or_default()
    }

    /// Platforms that have a section and are not disabled
    pub fn enabled_platforms(&self) -> Vec<Platform> {
        let mut platforms = Vec::new();
        if self.platforms.curseforge.as_ref().is_some_and(|c| c.is_enabled()) {
            platforms.push(Platform::Curseforge);
        }
        if self.platforms.modrinth.as_ref().is_some_and(|c| c.is_enabled()) {
            platforms.push(Platform::Modrinth);
        }
        platforms
    }
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            release: None,
            platforms: PlatformConfigs::default(),
        }
    }
}

/// Release information shared by every platform
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseConfig {
    /// Display name (optional, platforms derive one when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Version number
    #[serde(default)]
    pub version: String,

    /// Release channel (default: "release")
    #[serde(default = "default_release_type")]
    pub release_type: String,

    /// Changelog text (default: empty)
    #[serde(default)]
    pub changelog: String,

    /// Desired game versions, in order
    #[serde(default)]
    pub game_versions: Vec<String>,

    /// Targeted loaders, in order
    #[serde(default)]
    pub loaders: Vec<LoaderType>,

    /// Artifact files or directories containing `*.jar` files
    #[serde(default)]
    pub files: Vec<PathBuf>,
}

fn default_release_type() -> String {
    "release".to_string()
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            display_name: None,
            version: String::new(),
            release_type: default_release_type(),
            changelog: String::new(),
            game_versions: Vec::new(),
            loaders: Vec::new(),
            files: Vec::new(),
        }
    }
}

impl ReleaseConfig {
    /// Desired game versions, trimmed, with blank entries dropped
    pub fn desired_game_versions(&self) -> Vec<String> {
        self.game_versions
            .iter()
            .map(|version| version.trim())
            .filter(|version| !version.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Loaders with repeats removed, first occurrence kept
    pub fn unique_loaders(&self) -> Vec<LoaderType> {
        let mut loaders = Vec::with_capacity(self.loaders.len());
        for loader in &self.loaders {
            if !loaders.contains(loader) {
                loaders.push(*loader);
            }
        }
        loaders
    }
}

/// Platform configurations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PlatformConfigs {
    /// CurseForge configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub curseforge: Option<CurseforgeConfig>,

    /// Modrinth configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modrinth: Option<ModrinthConfig>,
}

/// CurseForge configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CurseforgeConfig {
    /// Enable this platform (default: true if defined)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// API token; `${VAR}` placeholders are expanded on load
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Numeric project id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    /// API base URL override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,

    /// Changelog markup (default: markdown)
    #[serde(default)]
    pub changelog_type: ChangelogType,

    /// Runtime sides (default: client and server)
    #[serde(default = "default_environments")]
    pub environments: Vec<Environment>,

    /// Hold the file for manual release (default: false)
    #[serde(default)]
    pub manual_release: bool,

    /// Related projects, keyed by slug
    #[serde(default, skip_serializing_if = "DependencySet::is_empty")]
    pub dependencies: DependencySet<CurseforgeDependency>,
}

fn default_environments() -> Vec<Environment> {
    vec![Environment::Client, Environment::Server]
}

impl Default for CurseforgeConfig {
    fn default() -> Self {
        Self {
            enabled: None,
            token: None,
            project_id: None,
            api_base: None,
            changelog_type: ChangelogType::default(),
            environments: default_environments(),
            manual_release: false,
            dependencies: DependencySet::new(),
        }
    }
}

impl CurseforgeConfig {
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }
}

/// Modrinth configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModrinthConfig {
    /// Enable this platform (default: true if defined)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// API token; `${VAR}` placeholders are expanded on load
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Project id or slug
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    /// API base URL override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,

    /// Feature the version on the project page (default: true)
    #[serde(default = "default_featured")]
    pub featured: bool,

    /// Visibility status (default: "listed")
    #[serde(default = "default_status")]
    pub status: String,

    /// Related projects, keyed by project id
    #[serde(default, skip_serializing_if = "DependencySet::is_empty")]
    pub dependencies: DependencySet<ModrinthDependency>,
}

fn default_featured() -> bool {
    true
}

fn default_status() -> String {
    "listed".to_string()
}

impl Default for ModrinthConfig {
    fn default() -> Self {
        Self {
            enabled: None,
            token: None,
            project_id: None,
            api_base: None,
            featured: default_featured(),
            status: default_status(),
            dependencies: DependencySet::new(),
        }
    }
}

impl ModrinthConfig {
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }
}
