//! Configuration file loader for mod-publisher
//!
//! This module provides configuration loading, validation, and merging capabilities.

use super::config::*;
use crate::core::artifacts::resolve_artifacts;
use crate::core::error::PublishError;
use crate::core::types::Platform;
use crate::security::SecureTokenManager;
use regex::Regex;
use secrecy::ExposeSecret;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Configuration file name
pub const CONFIG_FILENAME: &str = ".mod-publisher.yaml";

/// Schema version understood by this release
const SUPPORTED_SCHEMA_VERSION: &str = "1.0";

/// Environment variable pattern (${VAR_NAME})
const ENV_VAR_PATTERN: &str = r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}";

/// Configuration load options
#[derive(Debug, Clone)]
pub struct ConfigLoadOptions {
    /// Project path to load config from
    pub project_path: PathBuf,

    /// Explicit config file, replacing the project file lookup
    pub config_path: Option<PathBuf>,

    /// Environment variables
    pub env: HashMap<String, String>,
}

impl ConfigLoadOptions {
    /// Options for `project_path` using the process environment
    pub fn new(project_path: impl Into<PathBuf>) -> Self {
        Self {
            project_path: project_path.into(),
            config_path: None,
            env: std::env::vars().collect(),
        }
    }
}

/// Configuration validation result
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationResult {
    /// Is configuration valid?
    pub valid: bool,

    /// Validation errors
    pub errors: Vec<ConfigValidationError>,

    /// Validation warnings
    pub warnings: Vec<ConfigValidationWarning>,
}

/// Configuration validation error
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationError {
    /// Field path (e.g., "release.files[0]")
    pub field: String,

    /// Error message
    pub message: String,

    /// Expected type/value
    pub expected: Option<String>,

    /// Actual type/value
    pub actual: Option<String>,
}

/// Configuration validation warning
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationWarning {
    /// Field path
    pub field: String,

    /// Warning message
    pub message: String,

    /// Suggestion
    pub suggestion: Option<String>,
}

/// Configuration file loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from multiple sources with priority
    ///
    /// Priority (high to low):
    /// 1. Environment variables (`CURSEFORGE_TOKEN`, `MODRINTH_TOKEN`)
    /// 2. Project config (./.mod-publisher.yaml, or the explicit `config_path`)
    /// 3. Global config (~/.mod-publisher.yaml)
    /// 4. Default values
    ///
    /// `${VAR}` placeholders are expanded and `release.files` is resolved to
    /// concrete artifact paths before returning.
    pub async fn load(options: ConfigLoadOptions) -> Result<PublishConfig, PublishError> {
        let mut configs: Vec<PublishConfig> = Vec::new();

        // 4. Default values (lowest priority)
        configs.push(PublishConfig::default());

        // 3. Global config
        if let Some(global_config) = Self::load_global_config(&options.env).await? {
            configs.push(global_config);
        }

        // 2. Project config
        let project_config = match &options.config_path {
            Some(path) => Some(Self::load_explicit_config(path).await?),
            None => Self::load_project_config(&options.project_path).await?,
        };
        if let Some(project_config) = project_config {
            configs.push(project_config);
        }

        let mut config = Self::merge_configs(configs);

        // 1. Environment variables (highest priority)
        Self::apply_env_tokens(&mut config, &options.env);

        let mut config = Self::expand_env_vars(config, &options.env)?;

        if let Some(release) = &mut config.release {
            release.files = resolve_artifacts(&options.project_path, &release.files);
        }

        Ok(config)
    }

    /// Load global configuration from ~/.mod-publisher.yaml
    async fn load_global_config(
        env: &HashMap<String, String>,
    ) -> Result<Option<PublishConfig>, PublishError> {
        let Some(home_dir) = env.get("HOME") else {
            debug!("HOME is not set, skipping global configuration");
            return Ok(None);
        };

        Self::load_config_file(&PathBuf::from(home_dir).join(CONFIG_FILENAME)).await
    }

    /// Load project configuration from ./.mod-publisher.yaml
    async fn load_project_config(
        project_path: &Path,
    ) -> Result<Option<PublishConfig>, PublishError> {
        Self::load_config_file(&project_path.join(CONFIG_FILENAME)).await
    }

    /// Load a file named on the command line, which must exist
    async fn load_explicit_config(path: &Path) -> Result<PublishConfig, PublishError> {
        Self::load_config_file(path).await?.ok_or_else(|| {
            PublishError::Config(format!("Config file not found: {}", path.display()))
        })
    }

    /// Load configuration from a YAML or TOML file
    async fn load_config_file(file_path: &Path) -> Result<Option<PublishConfig>, PublishError> {
        if !file_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(file_path).await.map_err(|e| {
            PublishError::Config(format!(
                "Failed to read config file {}: {}",
                file_path.display(),
                e
            ))
        })?;

        let config = Self::parse_config(file_path, &content)?;
        debug!("loaded configuration from {}", file_path.display());

        Ok(Some(config))
    }

    /// Parse by extension: `.toml` with toml, everything else as YAML
    fn parse_config(file_path: &Path, content: &str) -> Result<PublishConfig, PublishError> {
        let is_toml = file_path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        if is_toml {
            toml::from_str(content).map_err(|e| {
                PublishError::Config(format!("Failed to parse TOML config: {}", e))
            })
        } else {
            serde_yaml::from_str(content).map_err(|e| {
                PublishError::Config(format!("Failed to parse YAML config: {}", e))
            })
        }
    }

    /// Override tokens of configured platforms from their environment variables
    ///
    /// A variable never creates a platform section on its own.
    fn apply_env_tokens(config: &mut PublishConfig, env: &HashMap<String, String>) {
        let manager = SecureTokenManager::new();

        for platform in manager.get_supported_platforms() {
            let Some(token) = manager.token_from_env(platform, env) else {
                continue;
            };

            let slot = match platform {
                Platform::Curseforge => config.platforms.curseforge.as_mut().map(|c| &mut c.token),
                Platform::Modrinth => config.platforms.modrinth.as_mut().map(|c| &mut c.token),
            };

            if let Some(slot) = slot {
                debug!(
                    platform = %platform,
                    "token taken from {} ({})",
                    manager.get_token_name(platform).unwrap_or_default(),
                    manager.mask_token(token.expose_secret())
                );
                *slot = Some(token.expose_secret().to_string());
            }
        }
    }

    /// Merge multiple configurations with priority
    fn merge_configs(configs: Vec<PublishConfig>) -> PublishConfig {
        let mut result = PublishConfig::default();

        for config in configs {
            Self::merge_into(&mut result, config);
        }

        result
    }

    /// Merge source config into target, section by section
    fn merge_into(target: &mut PublishConfig, source: PublishConfig) {
        // Version
        if !source.version.is_empty() {
            target.version = source.version;
        }

        // Release
        if source.release.is_some() {
            target.release = source.release;
        }

        // Platforms (simplified merge)
        if source.platforms.curseforge.is_some() {
            target.platforms.curseforge = source.platforms.curseforge;
        }
        if source.platforms.modrinth.is_some() {
            target.platforms.modrinth = source.platforms.modrinth;
        }
    }

    /// Expand environment variables in tokens, project ids and api bases
    fn expand_env_vars(
        mut config: PublishConfig,
        env: &HashMap<String, String>,
    ) -> Result<PublishConfig, PublishError> {
        let env_var_regex = Regex::new(ENV_VAR_PATTERN)
            .map_err(|e| PublishError::Config(format!("Invalid variable pattern: {}", e)))?;

        if let Some(curseforge) = &mut config.platforms.curseforge {
            for value in [
                &mut curseforge.token,
                &mut curseforge.project_id,
                &mut curseforge.api_base,
            ]
            .into_iter()
            .flatten()
            {
                *value = Self::expand_string(&env_var_regex, value, env);
            }
        }

        if let Some(modrinth) = &mut config.platforms.modrinth {
            for value in [
                &mut modrinth.token,
                &mut modrinth.project_id,
                &mut modrinth.api_base,
            ]
            .into_iter()
            .flatten()
            {
                *value = Self::expand_string(&env_var_regex, value, env);
            }
        }

        Ok(config)
    }

    /// Expand environment variables in a single string
    ///
    /// Unknown variables are left in place.
    fn expand_string(pattern: &Regex, input: &str, env: &HashMap<String, String>) -> String {
        pattern
            .replace_all(input, |caps: &regex::Captures<'_>| {
                let var_name = &caps[1];
                match env.get(var_name) {
                    Some(value) => value.clone(),
                    None => {
                        warn!("Environment variable {} not found", var_name);
                        caps[0].to_string()
                    }
                }
            })
            .into_owned()
    }

    /// Validate configuration
    pub fn validate(config: &PublishConfig) -> ConfigValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        // 1. Check schema version (required)
        if config.version.is_empty() {
            errors.push(ConfigValidationError {
                field: "version".to_string(),
                message: "Version is required".to_string(),
                expected: Some("string (e.g., \"1.0\")".to_string()),
                actual: Some("empty".to_string()),
            });
        } else if config.version != SUPPORTED_SCHEMA_VERSION {
            warnings.push(ConfigValidationWarning {
                field: "version".to_string(),
                message: format!("Unknown version: {}", config.version),
                suggestion: Some("Currently supported version is \"1.0\" only".to_string()),
            });
        }

        // 2. Validate release
        Self::validate_release(&config.release(), &mut errors, &mut warnings);

        // 3. Validate platforms
        if config.enabled_platforms().is_empty() {
            warnings.push(ConfigValidationWarning {
                field: "platforms".to_string(),
                message: "No platform is configured".to_string(),
                suggestion: Some("Add a platforms.curseforge or platforms.modrinth section".to_string()),
            });
        }

        ConfigValidationResult {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Validate the release section
    fn validate_release(
        release: &ReleaseConfig,
        errors: &mut Vec<ConfigValidationError>,
        warnings: &mut Vec<ConfigValidationWarning>,
    ) {
        let version = release.version.trim();
        if version.is_empty() {
            warnings.push(ConfigValidationWarning {
                field: "release.version".to_string(),
                message: "Release version is not set".to_string(),
                suggestion: Some("Modrinth requires a version number".to_string()),
            });
        } else if let Err(e) = semver::Version::parse(version) {
            warnings.push(ConfigValidationWarning {
                field: "release.version".to_string(),
                message: format!("Version '{}' is not SemVer: {}", version, e),
                suggestion: Some("Use MAJOR.MINOR.PATCH, e.g. 1.2.0".to_string()),
            });
        }

        if release.desired_game_versions().is_empty() {
            warnings.push(ConfigValidationWarning {
                field: "release.gameVersions".to_string(),
                message: "No game versions are listed".to_string(),
                suggestion: Some("Add at least one game version, e.g. \"1.21\"".to_string()),
            });
        }

        if release.files.is_empty() {
            warnings.push(ConfigValidationWarning {
                field: "release.files".to_string(),
                message: "No artifact files are listed".to_string(),
                suggestion: Some("Point files at the built jar or its directory".to_string()),
            });
        }

        for (i, file) in release.files.iter().enumerate() {
            if !file.is_file() {
                errors.push(ConfigValidationError {
                    field: format!("release.files[{}]", i),
                    message: "File does not exist".to_string(),
                    expected: Some("existing file".to_string()),
                    actual: Some(file.display().to_string()),
                });
            }
        }
    }

    /// Format validation result as human-readable string
    pub fn format_validation_result(result: &ConfigValidationResult) -> String {
        let mut lines = Vec::new();

        if result.valid {
            lines.push("✅ Configuration validation succeeded".to_string());
        } else {
            lines.push("❌ Configuration has errors".to_string());
        }

        if !result.errors.is_empty() {
            lines.push("\n🔴 Errors:".to_string());
            for error in &result.errors {
                lines.push(format!("  - [{}] {}", error.field, error.message));
                if let (Some(expected), Some(actual)) = (&error.expected, &error.actual) {
                    lines.push(format!("    Expected: {}", expected));
                    lines.push(format!("    Actual: {}", actual));
                }
            }
        }

        if !result.warnings.is_empty() {
            lines.push("\n🟡 Warnings:".to_string());
            for warning in &result.warnings {
                lines.push(format!("  - [{}] {}", warning.field, warning.message));
                if let Some(suggestion) = &warning.suggestion {
                    lines.push(format!("    Suggestion: {}", suggestion));
                }
            }
        }

        lines.join("\n")
    }
}
