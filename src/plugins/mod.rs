pub mod curseforge_plugin;
pub mod modrinth_plugin;
pub mod plugin_loader;

pub use curseforge_plugin::CurseforgePublisher;
pub use modrinth_plugin::ModrinthPublisher;
pub use plugin_loader::PluginLoader;

use crate::core::traits::{ValidationError, ValidationResult};
use crate::core::types::Platform;
use tracing::{error, warn};

/// Logged when resolution leaves nothing to publish against
pub(crate) const NO_VALID_VERSIONS: &str =
    "No valid game versions found. Please check your game versions in the configuration.";

/// Where a publish run stands once everything before the upload is done
pub(crate) enum Stage<T> {
    /// Configuration problems, already logged
    Aborted(Vec<String>),
    Ready(T),
}

/// Logs warnings and errors of a validation run
pub(crate) fn log_validation(platform: Platform, result: &ValidationResult) {
    for warning in &result.warnings {
        warn!(platform = %platform, "{}: {}", warning.field, warning.message);
    }
    for error in &result.errors {
        error!(platform = %platform, "{}: {}", error.field, error.message);
    }
}

/// Logs a single abort reason and wraps it
pub(crate) fn abort<T>(platform: Platform, reason: &str) -> Stage<T> {
    error!(platform = %platform, "{}", reason);
    Stage::Aborted(vec![reason.to_string()])
}

/// Adds an error for a blank required field and returns the trimmed value
pub(crate) fn required_field(
    value: Option<&str>,
    field: &str,
    message: &str,
    errors: &mut Vec<ValidationError>,
) -> Option<String> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => Some(v.to_string()),
        None => {
            errors.push(ValidationError {
                field: field.to_string(),
                message: message.to_string(),
            });
            None
        }
    }
}

/// Desired versions no remote tag carries, in input order
pub(crate) fn unknown_versions<'a>(
    desired: &'a [String],
    known: impl Fn(&str) -> bool,
) -> Vec<&'a str> {
    desired
        .iter()
        .map(String::as_str)
        .filter(|version| !known(version))
        .collect()
}

/// Joins a configured base URL and an API path without doubling slashes
pub(crate) fn endpoint(api_base: &str, path: &str) -> String {
    format!("{}{}", api_base.trim_end_matches('/'), path)
}
