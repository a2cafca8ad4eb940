//! Modrinth Plugin - Modrinth v2 API publishing implementation
//!
//! Game versions are matched by version string against `/v2/tag/game_version`.
//! Loaders are not remote tags on Modrinth and go out exactly as configured.
//! Every artifact is attached to one `POST /v2/version` request.

use super::{NO_VALID_VERSIONS, Stage, abort, endpoint, log_validation, required_field, unknown_versions};
use crate::core::config::{ModrinthConfig, ReleaseConfig};
use crate::core::dependencies::{DependencySet, DependencyType, ModrinthDependency};
use crate::core::error::PublishError;
use crate::core::http::{ApiClient, AuthHeader};
use crate::core::traits::{
    DryRunResult, PlatformPublisher, PublishOutcome, ValidationError, ValidationResult,
    ValidationWarning,
};
use crate::core::types::{LoaderType, Platform, ReleaseType, list_variants, wire_enum};
use crate::core::upload::{FilePart, UploadRequest, file_part_names};
use crate::security::SecureTokenManager;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

/// Default Modrinth API base URL
pub const DEFAULT_API_BASE: &str = "https://api.modrinth.com";

const GAME_VERSIONS_PATH: &str = "/v2/tag/game_version";
const UPLOAD_PATH: &str = "/v2/version";
const AUTH_HEADER: &str = "authorization";
const METADATA_FIELD: &str = "data";

wire_enum! {
    /// Visibility of a published version
    pub enum VersionStatus: "status" {
        Listed => "listed",
        Archived => "archived",
        Draft => "draft",
        Unlisted => "unlisted",
        Scheduled => "scheduled",
    }
}

/// Game version tag as returned by `/v2/tag/game_version`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameVersionTag {
    pub version: String,
    #[serde(default)]
    pub version_type: String,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub major: bool,
}

/// Remote version strings contained in `desired`, in remote order
pub fn filter_game_versions(tags: &[GameVersionTag], desired: &[String]) -> Vec<String> {
    tags.iter()
        .filter(|tag| desired.contains(&tag.version))
        .map(|tag| tag.version.clone())
        .collect()
}

/// One entry of the `dependencies` list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDependency {
    pub project_id: String,
    pub dependency_type: DependencyType,
}

pub fn map_dependencies(
    dependencies: &DependencySet<ModrinthDependency>,
) -> Vec<VersionDependency> {
    dependencies
        .iter()
        .map(|dependency| VersionDependency {
            project_id: dependency.project_id.trim().to_string(),
            dependency_type: dependency.dependency_type,
        })
        .collect()
}

/// Upload metadata for `POST /v2/version`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModrinthMetadata {
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub version_number: String,
    pub changelog: String,
    pub game_versions: Vec<String>,
    pub loaders: Vec<LoaderType>,
    pub release_channel: ReleaseType,
    /// Always present, empty when nothing is declared
    pub dependencies: Vec<VersionDependency>,
    pub featured: bool,
    pub status: VersionStatus,
    pub file_parts: Vec<String>,
}

/// Values the metadata needs that validation has already checked
pub struct MetadataInputs<'a> {
    pub project_id: &'a str,
    pub version_number: &'a str,
    pub release_channel: ReleaseType,
    pub status: VersionStatus,
    pub game_versions: Vec<String>,
    pub dependencies: Vec<VersionDependency>,
    pub file_parts: Vec<String>,
}

impl ModrinthMetadata {
    pub fn build(release: &ReleaseConfig, config: &ModrinthConfig, inputs: MetadataInputs<'_>) -> Self {
        Self {
            project_id: inputs.project_id.to_string(),
            name: release.display_name.clone(),
            version_number: inputs.version_number.to_string(),
            changelog: release.changelog.clone(),
            game_versions: inputs.game_versions,
            loaders: release.unique_loaders(),
            release_channel: inputs.release_channel,
            dependencies: inputs.dependencies,
            featured: config.featured,
            status: inputs.status,
            file_parts: inputs.file_parts,
        }
    }
}

struct Prepared {
    auth: AuthHeader,
    project_id: String,
    version_number: String,
    release_type: ReleaseType,
    status: VersionStatus,
}

struct Staged {
    prepared: Prepared,
    game_versions: Vec<String>,
    metadata: String,
}

/// Modrinth publisher
pub struct ModrinthPublisher {
    release: ReleaseConfig,
    config: ModrinthConfig,
    client: ApiClient,
    api_base: String,
}

impl ModrinthPublisher {
    pub fn new(release: ReleaseConfig, config: ModrinthConfig, client: ApiClient) -> Self {
        let api_base = config
            .api_base
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        Self {
            release,
            config,
            client,
            api_base,
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn inspect(&self) -> (Option<Prepared>, ValidationResult) {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let token = SecureTokenManager::secret_from(self.config.token.as_deref());
        if token.is_none() {
            errors.push(ValidationError {
                field: "token".to_string(),
                message: "Modrinth token is required".to_string(),
            });
        }
        let auth = token.and_then(|token| match AuthHeader::new(AUTH_HEADER, &token) {
            Ok(auth) => Some(auth),
            Err(_) => {
                errors.push(ValidationError {
                    field: "token".to_string(),
                    message: "Modrinth token contains characters not allowed in a header"
                        .to_string(),
                });
                None
            }
        });

        let project_id = required_field(
            self.config.project_id.as_deref(),
            "projectId",
            "Modrinth project id is required",
            &mut errors,
        );
        let version_number = required_field(
            Some(self.release.version.as_str()),
            "version",
            "Version number is required",
            &mut errors,
        );

        let release_type = match self.release.release_type.parse::<ReleaseType>() {
            Ok(release_type) => Some(release_type),
            Err(_) => {
                errors.push(ValidationError {
                    field: "releaseType".to_string(),
                    message: format!(
                        "Invalid release type '{}'. Allowed values: {}",
                        self.release.release_type,
                        list_variants(ReleaseType::ALL)
                    ),
                });
                None
            }
        };

        let status = match self.config.status.parse::<VersionStatus>() {
            Ok(status) => Some(status),
            Err(_) => {
                errors.push(ValidationError {
                    field: "status".to_string(),
                    message: format!(
                        "Invalid status '{}'. Allowed values: {}",
                        self.config.status,
                        list_variants(VersionStatus::ALL)
                    ),
                });
                None
            }
        };

        if self.release.files.is_empty() {
            errors.push(ValidationError {
                field: "files".to_string(),
                message: "No file to upload".to_string(),
            });
        }

        if self.release.loaders.is_empty() {
            warnings.push(ValidationWarning {
                field: "loaders".to_string(),
                message: "No loaders are listed; Modrinth will reject the version".to_string(),
            });
        }

        let prepared = match (auth, project_id, version_number, release_type, status) {
            (Some(auth), Some(project_id), Some(version_number), Some(release_type), Some(status)) => {
                Some(Prepared {
                    auth,
                    project_id,
                    version_number,
                    release_type,
                    status,
                })
            }
            _ => None,
        };

        (prepared, ValidationResult::new(errors, warnings))
    }

    async fn fetch_game_versions(
        &self,
        auth: &AuthHeader,
    ) -> Result<Vec<GameVersionTag>, PublishError> {
        let url = endpoint(&self.api_base, GAME_VERSIONS_PATH);
        self.client.get_json(Platform::Modrinth, &url, auth).await
    }

    async fn stage(&self) -> Result<Stage<Staged>, PublishError> {
        let platform = Platform::Modrinth;
        let (prepared, validation) = self.inspect();
        log_validation(platform, &validation);

        let Some(prepared) = prepared else {
            return Ok(Stage::Aborted(validation.reasons()));
        };

        let tags = self.fetch_game_versions(&prepared.auth).await?;

        let desired = self.release.desired_game_versions();
        let unknown = unknown_versions(&desired, |version| {
            tags.iter().any(|tag| tag.version == version)
        });
        if !unknown.is_empty() {
            warn!(
                platform = %platform,
                "Modrinth does not know game version(s): {}",
                unknown.join(", ")
            );
        }

        let game_versions = filter_game_versions(&tags, &desired);
        if game_versions.is_empty() {
            return Ok(abort(platform, NO_VALID_VERSIONS));
        }

        let metadata = ModrinthMetadata::build(
            &self.release,
            &self.config,
            MetadataInputs {
                project_id: &prepared.project_id,
                version_number: &prepared.version_number,
                release_channel: prepared.release_type,
                status: prepared.status,
                game_versions: game_versions.clone(),
                dependencies: map_dependencies(&self.config.dependencies),
                file_parts: file_part_names(self.release.files.len()),
            },
        );
        let metadata = serde_json::to_string(&metadata)
            .map_err(|source| PublishError::Serialize { platform, source })?;
        info!(platform = %platform, "Modrinth metadata: {}", metadata);

        Ok(Stage::Ready(Staged {
            prepared,
            game_versions,
            metadata,
        }))
    }

    fn files(&self) -> Vec<PathBuf> {
        self.release.files.clone()
    }
}

#[async_trait]
impl PlatformPublisher for ModrinthPublisher {
    fn platform(&self) -> Platform {
        Platform::Modrinth
    }

    fn validate(&self) -> ValidationResult {
        self.inspect().1
    }

    async fn dry_run(&self) -> Result<DryRunResult, PublishError> {
        let result = match self.stage().await? {
            Stage::Aborted(reasons) => DryRunResult {
                platform: Platform::Modrinth,
                resolved_versions: Vec::new(),
                metadata: None,
                files: Vec::new(),
                aborted: reasons,
            },
            Stage::Ready(staged) => DryRunResult {
                platform: Platform::Modrinth,
                resolved_versions: staged.game_versions,
                metadata: Some(staged.metadata),
                files: self.files(),
                aborted: Vec::new(),
            },
        };

        Ok(result)
    }

    async fn publish(&self) -> Result<PublishOutcome, PublishError> {
        let staged = match self.stage().await? {
            Stage::Aborted(reasons) => return Ok(PublishOutcome::Aborted { reasons }),
            Stage::Ready(staged) => staged,
        };

        info!(platform = %Platform::Modrinth, "Publishing to Modrinth...");

        let response = UploadRequest {
            platform: Platform::Modrinth,
            url: endpoint(&self.api_base, UPLOAD_PATH),
            auth: &staged.prepared.auth,
            metadata_field: METADATA_FIELD,
            metadata: staged.metadata,
            files: FilePart::plan(&self.release.files),
        }
        .execute(&self.client)
        .await?;

        info!(platform = %Platform::Modrinth, "Successfully uploaded mod to Modrinth!");
        Ok(PublishOutcome::Published { response })
    }
}
