//! CurseForge Plugin - CurseForge upload API publishing implementation
//!
//! This module provides:
//! - Game version tag fetching and classification filtering
//! - Loader and environment mapping onto CurseForge tag names
//! - Relation mapping for project dependencies
//! - Single-file multipart upload to `/api/projects/{id}/upload-file`

use super::{NO_VALID_VERSIONS, Stage, abort, endpoint, log_validation, required_field, unknown_versions};
use crate::core::config::{CurseforgeConfig, ReleaseConfig};
use crate::core::dependencies::{CurseforgeDependency, DependencySet, RelationType};
use crate::core::error::PublishError;
use crate::core::http::{ApiClient, AuthHeader};
use crate::core::traits::{
    DryRunResult, PlatformPublisher, PublishOutcome, ValidationError, ValidationResult,
    ValidationWarning,
};
use crate::core::types::{ChangelogType, Environment, LoaderType, Platform, ReleaseType, list_variants};
use crate::core::upload::{FilePart, UploadRequest};
use crate::security::SecureTokenManager;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

/// Default CurseForge API base URL
pub const DEFAULT_API_BASE: &str = "https://minecraft.curseforge.com";

const GAME_VERSIONS_PATH: &str = "/api/game/versions";
const AUTH_HEADER: &str = "x-api-token";
const METADATA_FIELD: &str = "metadata";

/// `gameVersionTypeID` of Minecraft version tags
pub const MINECRAFT_VERSION_TYPE_ID: u32 = 77784;
/// `gameVersionTypeID` of mod loader tags
pub const LOADER_TYPE_ID: u32 = 68441;
/// `gameVersionTypeID` of client/server environment tags
pub const ENVIRONMENT_TYPE_ID: u32 = 75208;

/// Game version tag as returned by `/api/game/versions`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameVersionTag {
    pub id: u64,
    #[serde(rename = "gameVersionTypeID")]
    pub game_version_type_id: u32,
    pub name: String,
    #[serde(default)]
    pub slug: String,
}

impl GameVersionTag {
    /// Tags outside the three known classifications are ignored entirely
    pub fn is_recognised(&self) -> bool {
        matches!(
            self.game_version_type_id,
            MINECRAFT_VERSION_TYPE_ID | LOADER_TYPE_ID | ENVIRONMENT_TYPE_ID
        )
    }
}

/// Tag name CurseForge uses for a loader
pub fn loader_tag_name(loader: LoaderType) -> &'static str {
    match loader {
        LoaderType::Fabric => "Fabric",
        LoaderType::Quilt => "Quilt",
        LoaderType::Forge => "Forge",
        LoaderType::NeoForge => "NeoForge",
    }
}

/// Tag name CurseForge uses for an environment
pub fn environment_tag_name(environment: Environment) -> &'static str {
    match environment {
        Environment::Client => "Client",
        Environment::Server => "Server",
    }
}

/// Ids of recognised tags whose name exactly matches a desired version,
/// loader or environment, in remote order
pub fn filter_game_versions(
    tags: &[GameVersionTag],
    versions: &[String],
    loaders: &[LoaderType],
    environments: &[Environment],
) -> Vec<u64> {
    let mut wanted: Vec<&str> = versions.iter().map(String::as_str).collect();
    wanted.extend(loaders.iter().map(|l| loader_tag_name(*l)));
    wanted.extend(environments.iter().map(|e| environment_tag_name(*e)));

    tags.iter()
        .filter(|tag| tag.is_recognised())
        .filter(|tag| wanted.contains(&tag.name.as_str()))
        .map(|tag| tag.id)
        .collect()
}

/// One entry of the `relations.projects` list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRelation {
    pub slug: String,
    #[serde(rename = "type")]
    pub relation_type: RelationType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relations {
    pub projects: Vec<ProjectRelation>,
}

/// Maps every declaration onto its wire relation
pub fn map_relations(dependencies: &DependencySet<CurseforgeDependency>) -> Vec<ProjectRelation> {
    dependencies
        .iter()
        .map(|dependency| ProjectRelation {
            slug: dependency.slug.trim().to_string(),
            relation_type: dependency.relation.into(),
        })
        .collect()
}

/// Upload metadata for `/api/projects/{id}/upload-file`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurseforgeMetadata {
    pub changelog: String,
    pub changelog_type: ChangelogType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub game_versions: Vec<u64>,
    pub release_type: ReleaseType,
    pub is_marked_for_manual_release: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relations: Option<Relations>,
}

impl CurseforgeMetadata {
    /// Relations are left out entirely when there are none
    pub fn build(
        release: &ReleaseConfig,
        release_type: ReleaseType,
        config: &CurseforgeConfig,
        game_versions: Vec<u64>,
        relations: Vec<ProjectRelation>,
    ) -> Self {
        let relations = if relations.is_empty() {
            None
        } else {
            Some(Relations { projects: relations })
        };

        Self {
            changelog: release.changelog.clone(),
            changelog_type: config.changelog_type,
            display_name: release.display_name.clone(),
            game_versions,
            release_type,
            is_marked_for_manual_release: config.manual_release,
            relations,
        }
    }
}

/// Everything validation proved present
struct Prepared {
    auth: AuthHeader,
    project_id: String,
    release_type: ReleaseType,
    file: PathBuf,
}

/// Ready to upload
struct Staged {
    prepared: Prepared,
    game_versions: Vec<u64>,
    metadata: String,
}

/// CurseForge publisher
pub struct CurseforgePublisher {
    release: ReleaseConfig,
    config: CurseforgeConfig,
    client: ApiClient,
    api_base: String,
}

impl CurseforgePublisher {
    /// Create a publisher; the API base comes from `config.api_base` when set
    pub fn new(release: ReleaseConfig, config: CurseforgeConfig, client: ApiClient) -> Self {
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

    /// Point the publisher at another API host
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn upload_url(&self, project_id: &str) -> String {
        endpoint(
            &self.api_base,
            &format!("/api/projects/{}/upload-file", project_id),
        )
    }

    /// Runs every offline check, yielding the parsed values when none fail
    fn inspect(&self) -> (Option<Prepared>, ValidationResult) {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let token = SecureTokenManager::secret_from(self.config.token.as_deref());
        if token.is_none() {
            errors.push(ValidationError {
                field: "token".to_string(),
                message: "CurseForge token is required".to_string(),
            });
        }
        let auth = token.and_then(|token| match AuthHeader::new(AUTH_HEADER, &token) {
            Ok(auth) => Some(auth),
            Err(_) => {
                errors.push(ValidationError {
                    field: "token".to_string(),
                    message: "CurseForge token contains characters not allowed in a header"
                        .to_string(),
                });
                None
            }
        });

        let project_id = required_field(
            self.config.project_id.as_deref(),
            "projectId",
            "CurseForge project id is required",
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

        let file = self.release.files.first().cloned();
        if file.is_none() {
            errors.push(ValidationError {
                field: "files".to_string(),
                message: "No file to upload".to_string(),
            });
        }
        if self.release.files.len() > 1 {
            warnings.push(ValidationWarning {
                field: "files".to_string(),
                message: format!(
                    "CurseForge accepts one file per upload; {} extra file(s) will be ignored",
                    self.release.files.len() - 1
                ),
            });
        }

        let prepared = match (auth, project_id, release_type, file) {
            (Some(auth), Some(project_id), Some(release_type), Some(file)) => Some(Prepared {
                auth,
                project_id,
                release_type,
                file,
            }),
            _ => None,
        };

        (prepared, ValidationResult::new(errors, warnings))
    }

    /// Fetch the full game version tag list
    async fn fetch_game_versions(
        &self,
        auth: &AuthHeader,
    ) -> Result<Vec<GameVersionTag>, PublishError> {
        let url = endpoint(&self.api_base, GAME_VERSIONS_PATH);
        self.client.get_json(Platform::Curseforge, &url, auth).await
    }

    /// Validate, resolve and build metadata; everything short of uploading
    async fn stage(&self) -> Result<Stage<Staged>, PublishError> {
        let platform = Platform::Curseforge;
        let (prepared, validation) = self.inspect();
        log_validation(platform, &validation);

        let Some(prepared) = prepared else {
            return Ok(Stage::Aborted(validation.reasons()));
        };

        let tags = self.fetch_game_versions(&prepared.auth).await?;

        let desired = self.release.desired_game_versions();
        let unknown = unknown_versions(&desired, |version| {
            tags.iter()
                .any(|tag| tag.is_recognised() && tag.name == version)
        });
        if !unknown.is_empty() {
            warn!(
                platform = %platform,
                "CurseForge does not know game version(s): {}",
                unknown.join(", ")
            );
        }

        let game_versions = filter_game_versions(
            &tags,
            &desired,
            &self.release.unique_loaders(),
            &self.config.environments,
        );
        if game_versions.is_empty() {
            return Ok(abort(platform, NO_VALID_VERSIONS));
        }

        let metadata = CurseforgeMetadata::build(
            &self.release,
            prepared.release_type,
            &self.config,
            game_versions.clone(),
            map_relations(&self.config.dependencies),
        );
        let metadata = serde_json::to_string(&metadata)
            .map_err(|source| PublishError::Serialize { platform, source })?;
        info!(platform = %platform, "CurseForge metadata: {}", metadata);

        Ok(Stage::Ready(Staged {
            prepared,
            game_versions,
            metadata,
        }))
    }
}

#[async_trait]
impl PlatformPublisher for CurseforgePublisher {
    fn platform(&self) -> Platform {
        Platform::Curseforge
    }

    fn validate(&self) -> ValidationResult {
        self.inspect().1
    }

    async fn dry_run(&self) -> Result<DryRunResult, PublishError> {
        let result = match self.stage().await? {
            Stage::Aborted(reasons) => DryRunResult {
                platform: Platform::Curseforge,
                resolved_versions: Vec::new(),
                metadata: None,
                files: Vec::new(),
                aborted: reasons,
            },
            Stage::Ready(staged) => DryRunResult {
                platform: Platform::Curseforge,
                resolved_versions: staged.game_versions.iter().map(u64::to_string).collect(),
                metadata: Some(staged.metadata),
                files: vec![staged.prepared.file],
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

        info!(platform = %Platform::Curseforge, "Publishing to CurseForge...");
        let Staged {
            prepared, metadata, ..
        } = staged;

        let response = UploadRequest {
            platform: Platform::Curseforge,
            url: self.upload_url(&prepared.project_id),
            auth: &prepared.auth,
            metadata_field: METADATA_FIELD,
            metadata,
            files: FilePart::plan(std::slice::from_ref(&prepared.file)),
        }
        .execute(&self.client)
        .await?;

        info!(platform = %Platform::Curseforge, "Successfully uploaded mod to CurseForge!");
        Ok(PublishOutcome::Published { response })
    }
}
