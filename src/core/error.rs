//! Error handling for platform publishing
//!
//! Configuration problems are recoverable: publishers log them and abort
//! cleanly. Everything else (listing versions, uploading, reading artifacts)
//! propagates to the caller as a `PublishError`.

use crate::core::types::Platform;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for publishing operations
#[derive(Error, Debug)]
pub enum PublishError {
    // Configuration errors
    #[error("[{platform}] invalid configuration: {message}")]
    InvalidConfig { platform: Platform, message: String },

    #[error("configuration error: {0}")]
    Config(String),

    // Remote errors
    #[error("[{platform}] failed to fetch game versions: {}", http_detail(.status, .message, .body))]
    FetchVersions {
        platform: Platform,
        status: Option<u16>,
        message: String,
        body: Option<String>,
    },

    #[error("[{platform}] failed to upload file: {}", http_detail(.status, .message, .body))]
    Upload {
        platform: Platform,
        status: Option<u16>,
        message: String,
        body: Option<String>,
    },

    // Payload errors
    #[error("[{platform}] malformed game version list: {source}")]
    Deserialize {
        platform: Platform,
        #[source]
        source: serde_json::Error,
    },

    #[error("[{platform}] failed to serialize upload metadata: {source}")]
    Serialize {
        platform: Platform,
        #[source]
        source: serde_json::Error,
    },

    // Local errors
    #[error("[{platform}] failed to read {}: {source}", .path.display())]
    FileRead {
        platform: Platform,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to initialise HTTP client: {0}")]
    ClientInit(#[source] reqwest::Error),
}

/// Formats `<status> <message> - BODY: <body>`, leaving out the parts that are absent
fn http_detail(status: &Option<u16>, message: &str, body: &Option<String>) -> String {
    let mut detail = match *status {
        Some(code) if message.is_empty() => code.to_string(),
        Some(code) => format!("{} {}", code, message),
        None => message.to_string(),
    };

    if let Some(body) = body.as_deref().filter(|b| !b.trim().is_empty()) {
        detail.push_str(" - BODY: ");
        detail.push_str(body);
    }

    detail
}

impl PublishError {
    /// Get the platform associated with this error, if any
    pub fn platform(&self) -> Option<Platform> {
        match self {
            Self::InvalidConfig { platform, .. }
            | Self::FetchVersions { platform, .. }
            | Self::Upload { platform, .. }
            | Self::Deserialize { platform, .. }
            | Self::Serialize { platform, .. }
            | Self::FileRead { platform, .. } => Some(*platform),
            Self::Config(_) | Self::ClientInit(_) => None,
        }
    }

    /// HTTP status of the failed call, when the platform answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::FetchVersions { status, .. } | Self::Upload { status, .. } => *status,
            _ => None,
        }
    }

    /// Check if this error is recoverable by fixing configuration
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::InvalidConfig { .. } | Self::Config(_))
    }

    /// Get suggested actions for this error
    pub fn suggested_actions(&self) -> Vec<&'static str> {
        match self {
            Self::InvalidConfig { .. } | Self::Config(_) => vec![
                "Check .mod-publisher.yaml",
                "Run `mod-publisher check` to list every configuration problem",
            ],
            Self::FetchVersions { status: Some(401 | 403), .. }
            | Self::Upload { status: Some(401 | 403), .. } => vec![
                "Check that the API token is valid and has upload permission",
                "Check that CURSEFORGE_TOKEN / MODRINTH_TOKEN are exported",
            ],
            Self::FetchVersions { .. } => vec![
                "Check your network connection",
                "Check the platform status page and try again later",
            ],
            Self::Upload { .. } => vec![
                "Read the response body above for the platform's reason",
                "Check the project id and that the version does not already exist",
            ],
            Self::Deserialize { .. } => {
                vec!["The platform API may have changed; check for a newer release"]
            }
            Self::Serialize { .. } => vec!["Report this as a bug"],
            Self::FileRead { .. } => vec![
                "Build the artifact before publishing",
                "Check the `files` entries in the configuration",
            ],
            Self::ClientInit(_) => vec!["Check the system TLS configuration"],
        }
    }

    /// Get error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "INVALID_CONFIG",
            Self::Config(_) => "CONFIG_ERROR",
            Self::FetchVersions { .. } => "FETCH_VERSIONS_FAILED",
            Self::Upload { .. } => "UPLOAD_FAILED",
            Self::Deserialize { .. } => "MALFORMED_RESPONSE",
            Self::Serialize { .. } => "SERIALIZE_FAILED",
            Self::FileRead { .. } => "FILE_READ_FAILED",
            Self::ClientInit(_) => "CLIENT_INIT_FAILED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_error_display_contains_status_and_body() {
        let error = PublishError::Upload {
            platform: Platform::Modrinth,
            status: Some(500),
            message: "Internal Server Error".to_string(),
            body: Some("server error".to_string()),
        };

        let display = error.to_string();
        assert!(display.contains("[modrinth]"));
        assert!(display.contains("500 Internal Server Error"));
        assert!(display.contains("BODY: server error"));
        assert_eq!(error.code(), "UPLOAD_FAILED");
        assert_eq!(error.status(), Some(500));
        assert!(!error.is_recoverable());
    }

    #[test]
    fn test_transport_failure_display_has_no_status() {
        let error = PublishError::FetchVersions {
            platform: Platform::Curseforge,
            status: None,
            message: "operation timed out".to_string(),
            body: None,
        };

        assert_eq!(
            error.to_string(),
            "[curseforge] failed to fetch game versions: operation timed out"
        );
        assert_eq!(error.status(), None);
    }

    #[test]
    fn test_blank_body_is_left_out() {
        assert_eq!(
            http_detail(&Some(404), "Not Found", &Some("  ".to_string())),
            "404 Not Found"
        );
        assert_eq!(http_detail(&Some(599), "", &None), "599");
    }

    #[test]
    fn test_invalid_config_is_recoverable() {
        let error = PublishError::InvalidConfig {
            platform: Platform::Curseforge,
            message: "Invalid release type: 'nightly'".to_string(),
        };

        assert!(error.is_recoverable());
        assert_eq!(error.platform(), Some(Platform::Curseforge));
        assert_eq!(error.code(), "INVALID_CONFIG");
        assert!(!error.suggested_actions().is_empty());
    }

    #[test]
    fn test_auth_failures_suggest_checking_the_token() {
        let error = PublishError::Upload {
            platform: Platform::Curseforge,
            status: Some(403),
            message: "Forbidden".to_string(),
            body: None,
        };

        let actions = error.suggested_actions();
        assert!(actions.iter().any(|a| a.contains("token")));
    }

    #[test]
    fn test_file_read_error() {
        let error = PublishError::FileRead {
            platform: Platform::Modrinth,
            path: PathBuf::from("build/libs/missing.jar"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };

        assert!(error.to_string().contains("missing.jar"));
        assert_eq!(error.code(), "FILE_READ_FAILED");
    }
}
