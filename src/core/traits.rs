//! Core traits and types for platform publishing
//!
//! This module defines the publish contract shared by every platform
//! implementation together with the validation and outcome types it returns.

use crate::core::error::PublishError;
use crate::core::types::Platform;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Validation
// ============================================================================

/// Validation error with field information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

/// Validation warning with field information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
}

/// Result of configuration validation for one platform
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    /// Builds a result from collected problems; valid when `errors` is empty
    pub fn new(errors: Vec<ValidationError>, warnings: Vec<ValidationWarning>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Error messages in `field: message` form
    pub fn reasons(&self) -> Vec<String> {
        self.errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect()
    }
}

// ============================================================================
// Dry Run
// ============================================================================

/// Result of a publish run that stops before uploading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DryRunResult {
    pub platform: Platform,
    /// Identifiers the platform would receive as game versions
    pub resolved_versions: Vec<String>,
    /// Serialized upload metadata, absent when the run aborted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
    /// Files that would be attached
    pub files: Vec<PathBuf>,
    /// Configuration problems that would abort the publish
    pub aborted: Vec<String>,
}

// ============================================================================
// Publishing
// ============================================================================

/// How a publish invocation ended when no failure was raised
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The platform accepted the upload
    Published {
        /// Response body, when the platform sent one
        response: Option<String>,
    },
    /// A configuration problem stopped the publish before anything was uploaded
    Aborted { reasons: Vec<String> },
}

impl PublishOutcome {
    pub fn is_published(&self) -> bool {
        matches!(self, Self::Published { .. })
    }
}

// ============================================================================
// Platform Publisher Trait
// ============================================================================

/// Publish contract implemented once per distribution platform
///
/// Implementations hold their configuration, endpoint constants and HTTP
/// client; nothing is shared or mutated between invocations.
#[async_trait]
pub trait PlatformPublisher: Send + Sync {
    /// Platform this publisher targets
    fn platform(&self) -> Platform;

    /// Check the configuration without touching the network
    fn validate(&self) -> ValidationResult;

    /// Resolve versions and build the metadata payload without uploading
    async fn dry_run(&self) -> Result<DryRunResult, PublishError>;

    /// Validate, resolve game versions, build metadata and upload
    ///
    /// Configuration problems are logged and reported as
    /// [`PublishOutcome::Aborted`]; network, payload and file failures are
    /// returned as errors.
    async fn publish(&self) -> Result<PublishOutcome, PublishError>;
}
